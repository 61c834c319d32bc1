use serde::{Deserialize, Serialize};

/// Top-level configuration for limitup.
///
/// Every section and field has a default, so an empty file (or no file)
/// is a valid configuration. API keys and tokens are read from the
/// environment, never from this file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LimitupConfig {
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub disclosure: DisclosureConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Tushare client settings and screening thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketConfig {
    #[serde(default = "default_tushare_url")]
    pub base_url: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
    /// Pause between successive requests inside one screen.
    #[serde(default = "default_request_interval")]
    pub request_interval_ms: u64,
    /// Minimum `pct_chg` counted as limit-up.
    #[serde(default = "default_limit_up_pct")]
    pub limit_up_pct: f64,
    /// `pct_chg` a high-turnover stock must exceed to count as a big gain.
    #[serde(default = "default_move_pct")]
    pub gain_pct: f64,
    /// `pct_chg` a high-turnover stock must fall below to count as a big decline.
    #[serde(default = "default_decline_pct")]
    pub decline_pct: f64,
    /// Turnover threshold in thousand CNY (千元).
    #[serde(default = "default_min_amount")]
    pub min_amount: f64,
    /// Number of trading days the new-high screen looks back over.
    #[serde(default = "default_new_high_days")]
    pub new_high_trading_days: usize,
    /// Calendar days fetched to find `new_high_trading_days` open days.
    #[serde(default = "default_new_high_calendar_days")]
    pub new_high_calendar_days: i64,
    /// Market cap floor for the new-high screen in ten-thousand CNY (万元).
    #[serde(default = "default_min_total_mv")]
    pub min_total_mv: f64,
    /// Rows kept for ranking tables.
    #[serde(default = "default_top_n")]
    pub ranking_top_n: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: default_tushare_url(),
            timeout_seconds: default_http_timeout(),
            request_interval_ms: default_request_interval(),
            limit_up_pct: default_limit_up_pct(),
            gain_pct: default_move_pct(),
            decline_pct: default_decline_pct(),
            min_amount: default_min_amount(),
            new_high_trading_days: default_new_high_days(),
            new_high_calendar_days: default_new_high_calendar_days(),
            min_total_mv: default_min_total_mv(),
            ranking_top_n: default_top_n(),
        }
    }
}

/// cninfo client settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisclosureConfig {
    #[serde(default = "default_cninfo_url")]
    pub base_url: String,
    #[serde(default = "default_cninfo_static_url")]
    pub static_url: String,
    #[serde(default = "default_download_dir")]
    pub download_dir: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
    /// Pause between report categories in a financial-report download.
    #[serde(default = "default_category_interval")]
    pub category_interval_ms: u64,
    /// Pause between result pages in a bulk download.
    #[serde(default = "default_page_interval")]
    pub page_interval_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for DisclosureConfig {
    fn default() -> Self {
        Self {
            base_url: default_cninfo_url(),
            static_url: default_cninfo_static_url(),
            download_dir: default_download_dir(),
            timeout_seconds: default_http_timeout(),
            category_interval_ms: default_category_interval(),
            page_interval_ms: default_page_interval(),
            page_size: default_page_size(),
        }
    }
}

/// Language model provider settings. Keys come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Provider to activate instead of the first configured one
    /// (`openai`, `gemini`, `claude` or `local`).
    #[serde(default)]
    pub preferred_provider: Option<String>,
    #[serde(default = "default_openai_url")]
    pub openai_base_url: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_claude_url")]
    pub claude_base_url: String,
    #[serde(default = "default_claude_model")]
    pub claude_model: String,
    #[serde(default = "default_gemini_url")]
    pub gemini_base_url: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_local_url")]
    pub local_base_url: String,
    #[serde(default = "default_local_model")]
    pub local_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Timeout for text requests to hosted providers.
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
    /// Timeout for requests that upload a whole PDF, and for the local model.
    #[serde(default = "default_llm_long_timeout")]
    pub long_timeout_seconds: u64,
    /// Gemini PDF uploads are slower than the other providers'.
    #[serde(default = "default_gemini_pdf_timeout")]
    pub gemini_pdf_timeout_seconds: u64,
    /// Attempts per Gemini text request; PDF requests are tried once.
    #[serde(default = "default_gemini_attempts")]
    pub gemini_max_attempts: u32,
    /// Characters of full report text sent when no target section is found.
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            preferred_provider: None,
            openai_base_url: default_openai_url(),
            openai_model: default_openai_model(),
            claude_base_url: default_claude_url(),
            claude_model: default_claude_model(),
            gemini_base_url: default_gemini_url(),
            gemini_model: default_gemini_model(),
            local_base_url: default_local_url(),
            local_model: default_local_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_llm_timeout(),
            long_timeout_seconds: default_llm_long_timeout(),
            gemini_pdf_timeout_seconds: default_gemini_pdf_timeout(),
            gemini_max_attempts: default_gemini_attempts(),
            max_text_chars: default_max_text_chars(),
        }
    }
}

/// Limit-up deep analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_stocks")]
    pub max_stocks: usize,
    /// Upper bound accepted from the command line.
    #[serde(default = "default_max_stocks_cap")]
    pub max_stocks_cap: usize,
    /// Pause between stocks.
    #[serde(default = "default_stock_interval")]
    pub stock_interval_ms: u64,
    /// Calendar days of announcements inspected before the trade date.
    #[serde(default = "default_announcement_days")]
    pub announcement_days: i64,
    #[serde(default = "default_announcement_page_size")]
    pub announcement_page_size: u32,
    /// Announcements kept per stock.
    #[serde(default = "default_announcements_kept")]
    pub announcements_kept: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_stocks: default_max_stocks(),
            max_stocks_cap: default_max_stocks_cap(),
            stock_interval_ms: default_stock_interval(),
            announcement_days: default_announcement_days(),
            announcement_page_size: default_announcement_page_size(),
            announcements_kept: default_announcements_kept(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Directory for screen CSV files.
    #[serde(default = "default_csv_dir")]
    pub csv_dir: String,
    /// Directory for the limit-up JSON report and workbook.
    #[serde(default = "default_analysis_dir")]
    pub analysis_dir: String,
    /// Rows printed per screen.
    #[serde(default = "default_display_rows")]
    pub display_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_dir: default_csv_dir(),
            analysis_dir: default_analysis_dir(),
            display_rows: default_display_rows(),
        }
    }
}

fn default_tushare_url() -> String {
    "http://api.tushare.pro".to_string()
}
fn default_http_timeout() -> u64 {
    30
}
fn default_request_interval() -> u64 {
    200
}
fn default_limit_up_pct() -> f64 {
    9.5
}
fn default_move_pct() -> f64 {
    5.0
}
fn default_decline_pct() -> f64 {
    -5.0
}
fn default_min_amount() -> f64 {
    400_000.0
}
fn default_new_high_days() -> usize {
    60
}
fn default_new_high_calendar_days() -> i64 {
    120
}
fn default_min_total_mv() -> f64 {
    30_000_000.0
}
fn default_top_n() -> usize {
    30
}
fn default_cninfo_url() -> String {
    "http://www.cninfo.com.cn".to_string()
}
fn default_cninfo_static_url() -> String {
    "https://static.cninfo.com.cn".to_string()
}
fn default_download_dir() -> String {
    "downloads/cninfo".to_string()
}
fn default_category_interval() -> u64 {
    1000
}
fn default_page_interval() -> u64 {
    2000
}
fn default_page_size() -> u32 {
    30
}
fn default_openai_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_openai_model() -> String {
    "gpt-4o".to_string()
}
fn default_claude_url() -> String {
    "https://api.anthropic.com".to_string()
}
fn default_claude_model() -> String {
    "claude-3-sonnet-20240229".to_string()
}
fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}
fn default_local_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_local_model() -> String {
    "qwen2.5:14b".to_string()
}
fn default_temperature() -> f64 {
    0.1
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_llm_timeout() -> u64 {
    60
}
fn default_llm_long_timeout() -> u64 {
    120
}
fn default_gemini_pdf_timeout() -> u64 {
    180
}
fn default_gemini_attempts() -> u32 {
    3
}
fn default_max_text_chars() -> usize {
    50_000
}
fn default_max_stocks() -> usize {
    5
}
fn default_max_stocks_cap() -> usize {
    20
}
fn default_stock_interval() -> u64 {
    2000
}
fn default_announcement_days() -> i64 {
    30
}
fn default_announcement_page_size() -> u32 {
    10
}
fn default_announcements_kept() -> usize {
    5
}
fn default_csv_dir() -> String {
    ".".to_string()
}
fn default_analysis_dir() -> String {
    "analysis_output".to_string()
}
fn default_display_rows() -> usize {
    30
}
