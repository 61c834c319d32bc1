use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use crate::error::LlmError;

/// One language model backend. Mockable for testing.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier used to select the provider (`openai`, `claude`, ...).
    fn name(&self) -> &str;

    async fn analyze_text(&self, text: &str, prompt: &str) -> Result<String, LlmError>;

    /// Send the PDF itself to the model.
    ///
    /// Providers that cannot accept documents return `PdfUnsupported`.
    async fn analyze_pdf(&self, path: &Path, prompt: &str) -> Result<String, LlmError>;
}

/// Generation settings shared by every provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub pdf_timeout: Duration,
}

pub(crate) fn http_client() -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

/// Turn a non-success response into `LlmError::Api`.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(provider, status = status.as_u16(), "LLM API request failed");
    Err(LlmError::Api {
        provider: provider.to_string(),
        status: status.as_u16(),
        body,
    })
}

pub(crate) fn non_empty(provider: &str, text: Option<String>) -> Result<String, LlmError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(LlmError::EmptyResponse(provider.to_string())),
    }
}

pub(crate) async fn read_pdf_base64(path: &Path) -> Result<String, LlmError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(STANDARD.encode(bytes))
}
