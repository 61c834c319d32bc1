use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF file not found: {0}")]
    NotFound(PathBuf),

    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),

    #[error("No text could be extracted from {0}")]
    AllMethodsFailed(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
