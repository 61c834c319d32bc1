pub mod announcement;
pub mod config;
pub mod financial;
pub mod quote;
pub mod report;

pub use announcement::{Announcement, AnnouncementKind, ClassifiedAnnouncement};
pub use config::{
    AnalysisConfig, DisclosureConfig, LimitupConfig, LlmConfig, MarketConfig, OutputConfig,
};
pub use financial::{BusinessInfo, FinancialData, ReportAnalysis};
pub use quote::{
    DailyBar, DailyBasic, NewHighRecord, PeriodReturn, PeriodWindow, QuoteRecord, StockBasic,
    TabularRecord, TradeCalDay,
};
pub use report::{
    AnalysisInsights, AnalysisSummary, IndustryCount, LimitUpReport, MarketSnapshot, RecentEvent,
    StockAnalysis, ThemeCount,
};
