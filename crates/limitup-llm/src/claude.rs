use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::prompts::with_document;
use crate::provider::{check_status, http_client, non_empty, GenerationSettings, LlmProvider};

const NAME: &str = "claude";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic Messages API. Text only.
pub struct ClaudeProvider {
    api_key: String,
    base_url: String,
    settings: GenerationSettings,
    client: reqwest::Client,
}

impl ClaudeProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        settings: GenerationSettings,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
            client: http_client()?,
        })
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn analyze_text(&self, text: &str, prompt: &str) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: vec![Message {
                role: "user",
                content: with_document(prompt, text),
            }],
        };
        debug!(model = %self.settings.model, "Calling Claude messages API");

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(self.settings.timeout)
            .json(&request)
            .send()
            .await?;
        let body: MessagesResponse = check_status(NAME, response).await?.json().await?;

        non_empty(NAME, body.content.into_iter().find_map(|block| block.text))
    }

    async fn analyze_pdf(&self, _path: &Path, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::PdfUnsupported {
            provider: NAME.to_string(),
        })
    }
}
