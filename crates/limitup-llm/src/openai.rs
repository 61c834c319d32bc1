use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::LlmError;
use crate::provider::{check_status, http_client, non_empty, read_pdf_base64, GenerationSettings, LlmProvider};

const NAME: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI chat completions, or any server speaking the same protocol.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    settings: GenerationSettings,
    client: reqwest::Client,
}

impl OpenAiProvider {
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

    async fn complete(
        &self,
        messages: Vec<Value>,
        timeout: std::time::Duration,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };
        debug!(model = %self.settings.model, "Calling OpenAI chat completions");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&request)
            .send()
            .await?;
        let body: ChatResponse = check_status(NAME, response).await?.json().await?;

        non_empty(
            NAME,
            body.choices.into_iter().next().and_then(|c| c.message.content),
        )
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn analyze_text(&self, text: &str, prompt: &str) -> Result<String, LlmError> {
        let messages = vec![
            json!({"role": "system", "content": prompt}),
            json!({"role": "user", "content": text}),
        ];
        self.complete(messages, self.settings.timeout).await
    }

    async fn analyze_pdf(&self, path: &Path, prompt: &str) -> Result<String, LlmError> {
        let encoded = read_pdf_base64(path).await?;
        let messages = vec![json!({
            "role": "user",
            "content": [
                {"type": "text", "text": prompt},
                {
                    "type": "image_url",
                    "image_url": {"url": format!("data:application/pdf;base64,{encoded}")}
                }
            ]
        })];
        self.complete(messages, self.settings.pdf_timeout).await
    }
}
