use serde::{Deserialize, Serialize};

use crate::announcement::{AnnouncementKind, ClassifiedAnnouncement};
use crate::financial::{BusinessInfo, FinancialData};
use crate::quote::QuoteRecord;

/// Quote figures carried into the per-stock analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MarketSnapshot {
    pub close_price: f64,
    pub change_pct: f64,
    /// Lots (手).
    pub volume: f64,
    /// Thousand CNY (千元).
    pub amount: f64,
}

impl From<&QuoteRecord> for MarketSnapshot {
    fn from(quote: &QuoteRecord) -> Self {
        Self {
            close_price: quote.close,
            change_pct: quote.pct_chg,
            volume: quote.vol,
            amount: quote.amount,
        }
    }
}

/// A positive announcement among the most recent ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentEvent {
    pub event: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
}

/// Heuristic explanation of a limit-up move.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnalysisInsights {
    pub possible_reasons: Vec<String>,
    pub announcement_correlation: bool,
    pub positive_news_count: usize,
    pub recent_events: Vec<RecentEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockAnalysis {
    pub stock_code: String,
    pub stock_name: String,
    pub market_data: MarketSnapshot,
    pub business_info: BusinessInfo,
    pub financial_data: FinancialData,
    pub recent_announcements: Vec<ClassifiedAnnouncement>,
    pub analysis_insights: AnalysisInsights,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StockAnalysis {
    pub fn new(stock_code: impl Into<String>, stock_name: impl Into<String>, market_data: MarketSnapshot) -> Self {
        Self {
            stock_code: stock_code.into(),
            stock_name: stock_name.into(),
            market_data,
            business_info: BusinessInfo::default(),
            financial_data: FinancialData::default(),
            recent_announcements: Vec::new(),
            analysis_insights: AnalysisInsights::default(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AnalysisSummary {
    pub total_stocks: usize,
    /// Rounded to two decimals.
    pub avg_change_pct: f64,
    pub total_amount: f64,
    pub with_positive_news: usize,
    /// Share of stocks with positive news, in percent, rounded to one decimal.
    pub business_correlation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndustryCount {
    pub industry: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeCount {
    pub theme: AnnouncementKind,
    pub count: usize,
}

/// The full output of one limit-up analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitUpReport {
    pub trade_date: String,
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub analysis_time: String,
    pub limit_up_stocks: Vec<StockAnalysis>,
    pub summary: AnalysisSummary,
    pub industry_analysis: Vec<IndustryCount>,
    pub announcement_themes: Vec<ThemeCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LimitUpReport {
    pub fn new(trade_date: impl Into<String>) -> Self {
        Self {
            trade_date: trade_date.into(),
            analysis_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            limit_up_stocks: Vec::new(),
            summary: AnalysisSummary::default(),
            industry_analysis: Vec::new(),
            announcement_themes: Vec::new(),
            error: None,
        }
    }
}
