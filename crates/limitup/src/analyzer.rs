use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use limitup_disclosure::{classify, DisclosureError, DisclosureSource, ReportCategory};
use limitup_llm::{extract_business_info, extract_financial_data, FilingAnalyzer};
use limitup_market::MarketAnalyzer;
use limitup_models::{
    AnalysisConfig, AnalysisInsights, AnalysisSummary, AnnouncementKind, BusinessInfo,
    ClassifiedAnnouncement, FinancialData, IndustryCount, LimitUpReport, MarketSnapshot,
    QuoteRecord, RecentEvent, StockAnalysis, ThemeCount,
};
use limitup_pdf::PdfTextExtractor;
use regex::Regex;
use tracing::{info, warn};

use crate::output;

pub const UNKNOWN_INDUSTRY: &str = "未知行业";

static COMPANY_SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^。]*是一家[^。]*专注于[^。]*。)").expect("valid company sentence regex")
});
static INDUSTRY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"所属行业[：:]\s*([^\n。]{1,50})").expect("valid industry regex"));

/// Explains each limit-up stock of a day from its filings and announcements.
///
/// Stocks are processed one after another with a fixed pause in between.
/// Any step that fails leaves its part of the report empty.
pub struct ComprehensiveAnalyzer {
    market: MarketAnalyzer,
    disclosure: Arc<dyn DisclosureSource>,
    filings: Arc<dyn FilingAnalyzer>,
    text: PdfTextExtractor,
    config: AnalysisConfig,
    output_dir: PathBuf,
}

impl ComprehensiveAnalyzer {
    pub fn new(
        market: MarketAnalyzer,
        disclosure: Arc<dyn DisclosureSource>,
        filings: Arc<dyn FilingAnalyzer>,
        config: AnalysisConfig,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            market,
            disclosure,
            filings,
            text: PdfTextExtractor::new(),
            config,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Analyze up to `max_stocks` of the day's limit-up stocks and write the
    /// JSON report and workbook. Nothing is written when the day has no
    /// limit-up stocks or the list cannot be fetched.
    pub async fn analyze_limit_up_stocks(&self, trade_date: &str, max_stocks: usize) -> LimitUpReport {
        let mut report = LimitUpReport::new(trade_date);

        let quotes = match self.market.daily_limit_up(trade_date).await {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!(trade_date, error = %e, "Failed to fetch limit-up stocks");
                report.error = Some(e.to_string());
                return report;
            }
        };
        if quotes.is_empty() {
            info!(trade_date, "No limit-up stocks");
            return report;
        }
        info!(trade_date, found = quotes.len(), analyzing = quotes.len().min(max_stocks), "Analyzing limit-up stocks");

        // The pause separates consecutive stocks; none follows the last one.
        for (i, quote) in quotes.iter().take(max_stocks).enumerate() {
            if i > 0 && self.config.stock_interval_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.stock_interval_ms)).await;
            }
            report
                .limit_up_stocks
                .push(self.analyze_stock(quote, trade_date).await);
        }

        report.summary = generate_summary(&report.limit_up_stocks);
        report.industry_analysis = analyze_industries(&report.limit_up_stocks);
        report.announcement_themes = analyze_announcement_themes(&report.limit_up_stocks);

        if let Err(e) = output::save_report(&report, &self.output_dir) {
            warn!(error = %e, "Failed to save analysis result");
        }
        info!(trade_date, analyzed = report.limit_up_stocks.len(), "Limit-up analysis complete");
        report
    }

    async fn analyze_stock(&self, quote: &QuoteRecord, trade_date: &str) -> StockAnalysis {
        let code = quote.bare_code();
        info!(code, name = %quote.name, "Analyzing stock");
        let mut analysis = StockAnalysis::new(code, quote.name.clone(), MarketSnapshot::from(quote));

        let (business_info, financial_data) = self.financial_info(code).await;
        analysis.business_info = business_info;
        analysis.financial_data = financial_data;

        match self.recent_announcements(code, trade_date).await {
            Ok(announcements) => analysis.recent_announcements = announcements,
            Err(e) => {
                warn!(code, error = %e, "Failed to fetch recent announcements");
                analysis.error = Some(e.to_string());
            }
        }

        analysis.analysis_insights = analyze_limit_up_reasons(&analysis.recent_announcements);
        analysis
    }

    /// Business description and figures from the latest annual or interim
    /// report, falling back to last year's annual report.
    async fn financial_info(&self, code: &str) -> (BusinessInfo, FinancialData) {
        let year = Local::now().year();
        let mut files = self
            .disclosure
            .download_financial_reports(
                code,
                year,
                &[ReportCategory::AnnualReport, ReportCategory::InterimReport],
            )
            .await;
        if files.is_empty() {
            files = self
                .disclosure
                .download_financial_reports(code, year - 1, &[ReportCategory::AnnualReport])
                .await;
        }
        let Some(latest) = files.first() else {
            info!(code, "No periodic report available");
            return Default::default();
        };

        let analysis = self.filings.analyze_report(latest).await;
        if analysis.success {
            let business = extract_business_info(&analysis);
            let financial = extract_financial_data(&analysis);
            info!(
                code,
                business_fields = business.len(),
                indicators = financial.key_indicators.len(),
                "Report analysis complete"
            );
            return (business, financial);
        }

        warn!(code, error = analysis.error.as_deref().unwrap_or("unknown"), "Report analysis failed, using keyword extraction");
        let business = match self.text.extract_text(latest) {
            Ok(text) => fallback_business_info(&text),
            Err(e) => {
                warn!(code, error = %e, "Fallback text extraction failed");
                BusinessInfo::default()
            }
        };
        (business, FinancialData::default())
    }

    async fn recent_announcements(
        &self,
        code: &str,
        trade_date: &str,
    ) -> Result<Vec<ClassifiedAnnouncement>, DisclosureError> {
        let Ok(end) = NaiveDate::parse_from_str(trade_date, "%Y%m%d") else {
            warn!(trade_date, "Invalid trade date, skipping announcements");
            return Ok(Vec::new());
        };
        let start = end - chrono::Duration::days(self.config.announcement_days);
        let (start, end) = (
            start.format("%Y-%m-%d").to_string(),
            end.format("%Y-%m-%d").to_string(),
        );

        let (announcements, _) = self
            .disclosure
            .query_announcements(
                code,
                Some(start.as_str()),
                Some(end.as_str()),
                ReportCategory::All,
                1,
                self.config.announcement_page_size,
            )
            .await?;
        Ok(announcements
            .iter()
            .take(self.config.announcements_kept)
            .map(classify)
            .collect())
    }
}

/// Keyword extraction used when the language model produced nothing.
pub fn fallback_business_info(text: &str) -> BusinessInfo {
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };
    BusinessInfo {
        main_business: capture(&COMPANY_SENTENCE),
        industry: capture(&INDUSTRY_LINE),
        ..BusinessInfo::default()
    }
}

/// Guess why a stock hit the limit from its most recent announcements.
pub fn analyze_limit_up_reasons(announcements: &[ClassifiedAnnouncement]) -> AnalysisInsights {
    let mut insights = AnalysisInsights {
        positive_news_count: announcements.iter().filter(|a| a.is_positive).count(),
        ..AnalysisInsights::default()
    };

    insights.recent_events = announcements
        .iter()
        .take(3)
        .filter(|a| a.is_positive)
        .map(|a| RecentEvent {
            event: a.title.clone(),
            date: a.date.clone(),
            kind: a.kind,
        })
        .collect();
    if !insights.recent_events.is_empty() {
        insights.announcement_correlation = true;
        insights.possible_reasons.push("近期有利好公告发布".to_string());
    }

    let has_kind = |kind: AnnouncementKind| announcements.iter().any(|a| a.kind == kind);
    for (kind, reason) in [
        (AnnouncementKind::Business, "业务拓展或重大合同"),
        (AnnouncementKind::Investment, "投资并购活动"),
        (AnnouncementKind::Performance, "业绩超预期"),
    ] {
        if has_kind(kind) {
            insights.possible_reasons.push(reason.to_string());
        }
    }

    if insights.positive_news_count == 0 {
        insights.possible_reasons.push("可能为题材炒作或跟风上涨".to_string());
    }
    insights
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn generate_summary(stocks: &[StockAnalysis]) -> AnalysisSummary {
    if stocks.is_empty() {
        return AnalysisSummary::default();
    }
    let total = stocks.len() as f64;
    let with_positive_news = stocks
        .iter()
        .filter(|s| s.analysis_insights.positive_news_count > 0)
        .count();

    AnalysisSummary {
        total_stocks: stocks.len(),
        avg_change_pct: round_to(
            stocks.iter().map(|s| s.market_data.change_pct).sum::<f64>() / total,
            2,
        ),
        total_amount: stocks.iter().map(|s| s.market_data.amount).sum(),
        with_positive_news,
        business_correlation: round_to(with_positive_news as f64 / total * 100.0, 1),
    }
}

/// Occurrences per key, most frequent first; ties keep first-seen order.
fn count_desc<K: PartialEq>(keys: impl IntoIterator<Item = K>) -> Vec<(K, usize)> {
    let mut counts: Vec<(K, usize)> = Vec::new();
    for key in keys {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn analyze_industries(stocks: &[StockAnalysis]) -> Vec<IndustryCount> {
    count_desc(stocks.iter().map(|s| {
        s.business_info
            .industry
            .clone()
            .unwrap_or_else(|| UNKNOWN_INDUSTRY.to_string())
    }))
    .into_iter()
    .map(|(industry, count)| IndustryCount { industry, count })
    .collect()
}

pub fn analyze_announcement_themes(stocks: &[StockAnalysis]) -> Vec<ThemeCount> {
    count_desc(
        stocks
            .iter()
            .flat_map(|s| s.analysis_insights.recent_events.iter().map(|e| e.kind)),
    )
    .into_iter()
    .map(|(theme, count)| ThemeCount { theme, count })
    .collect()
}
