//! Language model providers and the financial report analyzer built on them.

pub mod analyzer;
pub mod claude;
pub mod client;
pub mod error;
pub mod gemini;
pub mod local;
pub mod openai;
pub mod parser;
pub mod prompts;
pub mod provider;

pub use analyzer::{
    analysis_summary, extract_business_info, extract_financial_data, FilingAnalyzer,
    FinancialReportAnalyzer, ReportSummary,
};
pub use claude::ClaudeProvider;
pub use client::{LlmClient, ProviderKeys};
pub use error::LlmError;
pub use gemini::GeminiProvider;
pub use local::LocalProvider;
pub use openai::OpenAiProvider;
pub use parser::{extract_json, parse_json_object};
pub use prompts::financial_report_prompt;
pub use provider::{GenerationSettings, LlmProvider};
