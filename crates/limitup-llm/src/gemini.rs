use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::prompts::with_document;
use crate::provider::{check_status, http_client, non_empty, read_pdf_base64, GenerationSettings, LlmProvider};

const NAME: &str = "gemini";

/// Tried after the configured base URL, in order.
pub const FALLBACK_BASES: [&str; 2] = [
    "https://generativelanguage.googleapis.com/v1",
    "https://generativelanguage.googleapis.com/v1beta",
];

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Google Gemini `generateContent` over plain HTTP.
///
/// Each attempt walks the endpoint list until one answers; failed attempts
/// are retried after `retry_delay * 2^attempt`. Proxies are taken from the
/// standard `HTTP(S)_PROXY` variables.
pub struct GeminiProvider {
    api_key: String,
    bases: Vec<String>,
    settings: GenerationSettings,
    max_attempts: u32,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        settings: GenerationSettings,
        max_attempts: u32,
    ) -> Result<Self, LlmError> {
        let mut bases = vec![base_url.into().trim_end_matches('/').to_string()];
        for fallback in FALLBACK_BASES {
            if !bases.iter().any(|b| b == fallback) {
                bases.push(fallback.to_string());
            }
        }
        Ok(Self {
            api_key: api_key.into(),
            bases,
            settings,
            max_attempts: max_attempts.max(1),
            retry_delay: Duration::from_secs(1),
            client: http_client()?,
        })
    }

    /// Only try the configured base URL.
    pub fn without_fallbacks(mut self) -> Self {
        self.bases.truncate(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn request(&self, parts: Vec<Part>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                max_output_tokens: self.settings.max_tokens,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }

    async fn call_endpoint(
        &self,
        base: &str,
        request: &GenerateContentRequest,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let url = format!("{base}/models/{}:generateContent", self.settings.model);
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(timeout)
            .json(request)
            .send()
            .await?;
        let body: GenerateContentResponse = check_status(NAME, response).await?.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text));
        non_empty(NAME, text)
    }

    async fn call_any_endpoint(
        &self,
        request: &GenerateContentRequest,
        timeout: Duration,
    ) -> Result<String, LlmError> {
        let mut last_error = LlmError::EmptyResponse(NAME.to_string());
        for base in &self.bases {
            match self.call_endpoint(base, request, timeout).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(endpoint = %base, error = %e, "Gemini endpoint failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn generate(
        &self,
        request: GenerateContentRequest,
        timeout: Duration,
        attempts: u32,
    ) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            match self.call_any_endpoint(&request, timeout).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt + 1 >= attempts => return Err(e),
                Err(e) => {
                    let delay = self.retry_delay * 2u32.pow(attempt);
                    warn!(attempt = attempt + 1, attempts, delay_ms = delay.as_millis() as u64, error = %e, "Gemini request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn analyze_text(&self, text: &str, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.settings.model, "Calling Gemini generateContent");
        let request = self.request(vec![Part::Text {
            text: with_document(prompt, text),
        }]);
        self.generate(request, self.settings.timeout, self.max_attempts)
            .await
    }

    async fn analyze_pdf(&self, path: &Path, prompt: &str) -> Result<String, LlmError> {
        let data = read_pdf_base64(path).await?;
        let request = self.request(vec![
            Part::Text {
                text: prompt.to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: "application/pdf",
                    data,
                },
            },
        ]);
        self.generate(request, self.settings.pdf_timeout, 1).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GenerationSettings {
        GenerationSettings {
            model: "gemini-1.5-pro".to_string(),
            temperature: 0.1,
            max_tokens: 4000,
            timeout: Duration::from_secs(120),
            pdf_timeout: Duration::from_secs(180),
        }
    }

    #[test]
    fn endpoint_list_skips_duplicate_base() {
        let provider = GeminiProvider::new(
            "k",
            "https://generativelanguage.googleapis.com/v1beta/",
            settings(),
            3,
        )
        .unwrap();
        assert_eq!(provider.bases.len(), 2);
        assert_eq!(provider.bases[0], "https://generativelanguage.googleapis.com/v1beta");
        assert_eq!(provider.bases[1], FALLBACK_BASES[0]);
    }

    #[test]
    fn request_body_shape() {
        let provider = GeminiProvider::new("k", "http://x", settings(), 3).unwrap();
        let request = provider.request(vec![
            Part::Text {
                text: "hi".to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: "application/pdf",
                    data: "AAAA".to_string(),
                },
            },
        ]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(
            value["contents"][0]["parts"][1]["inline_data"]["mime_type"],
            "application/pdf"
        );
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 4000);
        assert_eq!(value["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(value["safetySettings"][0]["threshold"], "BLOCK_NONE");
    }
}
