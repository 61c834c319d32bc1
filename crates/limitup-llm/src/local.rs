use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::prompts::with_document;
use crate::provider::{check_status, http_client, non_empty, GenerationSettings, LlmProvider};

const NAME: &str = "local";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// An Ollama server on this machine or the local network.
pub struct LocalProvider {
    base_url: String,
    settings: GenerationSettings,
    client: reqwest::Client,
}

impl LocalProvider {
    pub fn new(base_url: impl Into<String>, settings: GenerationSettings) -> Result<Self, LlmError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
            client: http_client()?,
        })
    }

    /// Whether an Ollama server answers at `base_url`.
    pub async fn probe(base_url: &str) -> bool {
        let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
        let Ok(client) = http_client() else {
            return false;
        };
        match client
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "No local model server");
                false
            }
        }
    }
}

#[async_trait]
impl LlmProvider for LocalProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn analyze_text(&self, text: &str, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model: &self.settings.model,
            prompt: with_document(prompt, text),
            stream: false,
            options: GenerateOptions {
                temperature: self.settings.temperature,
                num_predict: self.settings.max_tokens,
            },
        };
        debug!(model = %self.settings.model, "Calling local model");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.settings.timeout)
            .json(&request)
            .send()
            .await?;
        let body: GenerateResponse = check_status(NAME, response).await?.json().await?;

        non_empty(NAME, body.response)
    }

    async fn analyze_pdf(&self, _path: &Path, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::PdfUnsupported {
            provider: NAME.to_string(),
        })
    }
}
