//! Tushare Pro market data and the daily screens built on it.

pub mod analyzer;
pub mod csv_out;
pub mod error;
pub mod screens;
pub mod source;
pub mod tushare;

pub use analyzer::{MarketAnalyzer, ScreenKind};
pub use csv_out::{csv_file_name, write_csv};
pub use error::MarketError;
pub use source::MarketDataSource;
pub use tushare::{TushareClient, TushareTable};
