use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("No LLM provider configured; set an API key")]
    NotConfigured,

    #[error("{provider} does not support direct PDF analysis")]
    PdfUnsupported { provider: String },

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{0} returned an empty response")]
    EmptyResponse(String),

    #[error("LLM response parse error: {0}")]
    Parse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] limitup_pdf::PdfError),
}
