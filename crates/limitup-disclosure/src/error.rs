use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisclosureError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Downloaded file is not a PDF: {0}")]
    NotPdf(String),
}
