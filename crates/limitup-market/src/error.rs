use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("TUSHARE_TOKEN is not set")]
    MissingToken,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tushare returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Tushare API error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid date (expected YYYYMMDD): {0}")]
    InvalidDate(String),

    #[error("{0} is not a trading day")]
    NotTradingDay(String),

    #[error("Not enough trading days: need {needed}, found {found}")]
    InsufficientHistory { needed: usize, found: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
