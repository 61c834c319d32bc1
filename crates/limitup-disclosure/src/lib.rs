//! cninfo disclosure portal client and announcement title classification.

pub mod category;
pub mod classify;
pub mod cninfo;
pub mod error;
pub mod mapping;
pub mod source;

pub use category::ReportCategory;
pub use classify::{classify, classify_kind, is_positive, POSITIVE_KEYWORDS};
pub use cninfo::{sanitize_filename, CninfoClient};
pub use error::DisclosureError;
pub use mapping::{Exchange, StockInfo};
pub use source::DisclosureSource;
