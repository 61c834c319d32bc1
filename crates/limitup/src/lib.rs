//! limitup - daily A-share screens and limit-up deep dives.
//!
//! Pulls quotes from Tushare Pro, filings from cninfo, and asks a language
//! model to summarize the latest periodic report of each limit-up stock.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use limitup::models::LimitUpReport;
//! use limitup::market::{MarketAnalyzer, MarketDataSource};
//! use limitup::disclosure::{CninfoClient, DisclosureSource};
//! use limitup::llm::{FilingAnalyzer, FinancialReportAnalyzer, LlmClient};
//! use limitup::models::config::LimitupConfig;
//! ```

pub mod analyzer;
pub mod display;
pub mod market_report;
pub mod output;

pub use limitup_disclosure as disclosure;
pub use limitup_llm as llm;
pub use limitup_market as market;
pub use limitup_models as models;
pub use limitup_pdf as pdf;

pub use analyzer::ComprehensiveAnalyzer;
pub use market_report::{run_market_report, MarketReportCounts};

use std::sync::Arc;

use limitup_disclosure::CninfoClient;
use limitup_llm::{FinancialReportAnalyzer, LlmClient, ProviderKeys};
use limitup_market::{MarketAnalyzer, TushareClient};
use limitup_models::config::LimitupConfig;

/// Build a market analyzer over Tushare. Fails when `TUSHARE_TOKEN` is unset.
pub fn build_market_analyzer(config: &LimitupConfig) -> Result<MarketAnalyzer, anyhow::Error> {
    let client = TushareClient::from_env(&config.market)?;
    Ok(MarketAnalyzer::new(Arc::new(client), config.market.clone()))
}

/// Build the limit-up analyzer from configuration and the environment.
pub async fn build_comprehensive_analyzer(
    config: &LimitupConfig,
) -> Result<ComprehensiveAnalyzer, anyhow::Error> {
    let market = build_market_analyzer(config)?;
    let disclosure = CninfoClient::connect(config.disclosure.clone()).await?;
    let llm = LlmClient::connect(&config.llm, ProviderKeys::from_env()).await?;
    let filings = FinancialReportAnalyzer::new(llm, config.llm.max_text_chars);

    Ok(ComprehensiveAnalyzer::new(
        market,
        Arc::new(disclosure),
        Arc::new(filings),
        config.analysis.clone(),
        &config.output.analysis_dir,
    ))
}
