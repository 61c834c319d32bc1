use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use limitup_models::config::MarketConfig;
use limitup_models::quote::{DailyBar, NewHighRecord, PeriodReturn, PeriodWindow, QuoteRecord};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::MarketError;
use crate::screens::{
    attach_names, filter_quotes, historical_highs, join_period_returns, new_highs, open_days,
    SortOrder,
};
use crate::source::MarketDataSource;

const DATE_FORMAT: &str = "%Y%m%d";

/// The nine daily screens, in the order the market report runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenKind {
    LimitUp,
    HighVolumeHighGain,
    HighVolumeLimitUp,
    FiveDayRanking,
    TenDayRanking,
    TwentyDayRanking,
    YtdRanking,
    HighVolumeHighDecline,
    NewHighLargeCap,
}

impl ScreenKind {
    pub const ALL: [ScreenKind; 9] = [
        Self::LimitUp,
        Self::HighVolumeHighGain,
        Self::HighVolumeLimitUp,
        Self::FiveDayRanking,
        Self::TenDayRanking,
        Self::TwentyDayRanking,
        Self::YtdRanking,
        Self::HighVolumeHighDecline,
        Self::NewHighLargeCap,
    ];

    /// Stem of the CSV file written for this screen.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::LimitUp => "limit_up_stocks",
            Self::HighVolumeHighGain => "high_volume_high_gain",
            Self::HighVolumeLimitUp => "high_volume_limit_up",
            Self::FiveDayRanking => "5day_ranking",
            Self::TenDayRanking => "10day_ranking",
            Self::TwentyDayRanking => "20day_ranking",
            Self::YtdRanking => "ytd_ranking",
            Self::HighVolumeHighDecline => "high_volume_high_decline",
            Self::NewHighLargeCap => "new_high_large_cap",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::LimitUp => "每日涨停股票",
            Self::HighVolumeHighGain => "成交额大于4亿且涨幅大于5%的股票",
            Self::HighVolumeLimitUp => "成交额大于4亿的涨停股票",
            Self::FiveDayRanking => "近5日涨幅排名",
            Self::TenDayRanking => "近10日涨幅排名",
            Self::TwentyDayRanking => "近20日涨幅排名",
            Self::YtdRanking => "年度涨幅排行",
            Self::HighVolumeHighDecline => "成交额大于4亿且跌幅大于5%的股票",
            Self::NewHighLargeCap => "创新高且市值大于3000亿的股票",
        }
    }

    /// Ranking tables are cut to the configured top N before output.
    pub fn is_truncated(&self) -> bool {
        matches!(
            self,
            Self::FiveDayRanking
                | Self::TenDayRanking
                | Self::TwentyDayRanking
                | Self::YtdRanking
                | Self::NewHighLargeCap
        )
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, MarketError> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|_| MarketError::InvalidDate(date.to_string()))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Runs the daily screens against a market data source.
///
/// The code-to-name table is fetched on first use and kept for the
/// analyzer's lifetime.
pub struct MarketAnalyzer {
    source: Arc<dyn MarketDataSource>,
    config: MarketConfig,
    names: OnceCell<HashMap<String, String>>,
}

impl MarketAnalyzer {
    pub fn new(source: Arc<dyn MarketDataSource>, config: MarketConfig) -> Self {
        Self {
            source,
            config,
            names: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    async fn names(&self) -> Result<&HashMap<String, String>, MarketError> {
        self.names
            .get_or_try_init(|| async {
                let basics = self.source.stock_basic().await?;
                info!(count = basics.len(), "Loaded stock names");
                Ok::<_, MarketError>(
                    basics
                        .into_iter()
                        .map(|b| (b.ts_code, b.name))
                        .collect::<HashMap<_, _>>(),
                )
            })
            .await
    }

    async fn screen_day(
        &self,
        trade_date: &str,
        keep: impl Fn(&QuoteRecord) -> bool,
        order: SortOrder,
    ) -> Result<Vec<QuoteRecord>, MarketError> {
        let bars = self.source.daily(trade_date).await?;
        let mut records = filter_quotes(&bars, keep, order);
        if !records.is_empty() {
            attach_names(&mut records, self.names().await?);
        }
        debug!(trade_date, total = bars.len(), kept = records.len(), "Screened daily bars");
        Ok(records)
    }

    async fn is_trading_day(&self, date: &str) -> Result<bool, MarketError> {
        let calendar = self.source.trade_cal(date, date).await?;
        Ok(open_days(&calendar).iter().any(|d| d == date))
    }

    async fn pause(&self) {
        if self.config.request_interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.request_interval_ms)).await;
        }
    }

    /// Stocks whose `pct_chg` reaches the limit-up threshold, biggest move first.
    pub async fn daily_limit_up(&self, trade_date: &str) -> Result<Vec<QuoteRecord>, MarketError> {
        let threshold = self.config.limit_up_pct;
        self.screen_day(trade_date, |q| q.pct_chg >= threshold, SortOrder::Descending)
            .await
    }

    pub async fn high_volume_high_gain(
        &self,
        trade_date: &str,
    ) -> Result<Vec<QuoteRecord>, MarketError> {
        let (min_amount, gain) = (self.config.min_amount, self.config.gain_pct);
        self.screen_day(
            trade_date,
            |q| q.amount > min_amount && q.pct_chg > gain,
            SortOrder::Descending,
        )
        .await
    }

    pub async fn high_volume_limit_up(
        &self,
        trade_date: &str,
    ) -> Result<Vec<QuoteRecord>, MarketError> {
        let (min_amount, limit) = (self.config.min_amount, self.config.limit_up_pct);
        self.screen_day(
            trade_date,
            |q| q.amount > min_amount && q.pct_chg >= limit,
            SortOrder::Descending,
        )
        .await
    }

    /// High-turnover decliners, biggest drop first.
    pub async fn high_volume_high_decline(
        &self,
        trade_date: &str,
    ) -> Result<Vec<QuoteRecord>, MarketError> {
        let (min_amount, decline) = (self.config.min_amount, self.config.decline_pct);
        self.screen_day(
            trade_date,
            |q| q.amount > min_amount && q.pct_chg < decline,
            SortOrder::Ascending,
        )
        .await
    }

    /// Close-to-close return over the last `days` trading days ending on `end_date`.
    ///
    /// `end_date` must be a trading day. The start is the trading day `days`
    /// sessions before it, found within a `2 * days` calendar-day window.
    pub async fn period_return_ranking(
        &self,
        days: u32,
        end_date: &str,
    ) -> Result<Vec<PeriodReturn>, MarketError> {
        let end = parse_date(end_date)?;
        if !self.is_trading_day(end_date).await? {
            return Err(MarketError::NotTradingDay(end_date.to_string()));
        }

        let window_start = format_date(end - chrono::Duration::days(i64::from(days) * 2));
        let trade_days = open_days(&self.source.trade_cal(&window_start, end_date).await?);
        let needed = days as usize + 1;
        if trade_days.len() < needed {
            return Err(MarketError::InsufficientHistory {
                needed,
                found: trade_days.len(),
            });
        }

        let start_day = &trade_days[trade_days.len() - needed];
        let end_day = &trade_days[trade_days.len() - 1];
        self.returns_between(start_day, end_day, PeriodWindow::Days(days))
            .await
    }

    pub async fn five_day_ranking(&self, end_date: &str) -> Result<Vec<PeriodReturn>, MarketError> {
        self.period_return_ranking(5, end_date).await
    }

    pub async fn ten_day_ranking(&self, end_date: &str) -> Result<Vec<PeriodReturn>, MarketError> {
        self.period_return_ranking(10, end_date).await
    }

    pub async fn twenty_day_ranking(
        &self,
        end_date: &str,
    ) -> Result<Vec<PeriodReturn>, MarketError> {
        self.period_return_ranking(20, end_date).await
    }

    /// Return from the year's first trading day (searched in January) to `end_date`.
    pub async fn ytd_ranking(&self, end_date: &str) -> Result<Vec<PeriodReturn>, MarketError> {
        let year = parse_date(end_date)?.year();
        let january = open_days(
            &self
                .source
                .trade_cal(&format!("{year}0101"), &format!("{year}0131"))
                .await?,
        );
        let first_day = january.first().ok_or(MarketError::InsufficientHistory {
            needed: 1,
            found: 0,
        })?;
        self.returns_between(first_day, end_date, PeriodWindow::YearToDate)
            .await
    }

    async fn returns_between(
        &self,
        start_day: &str,
        end_day: &str,
        window: PeriodWindow,
    ) -> Result<Vec<PeriodReturn>, MarketError> {
        let start_bars = self.source.daily(start_day).await?;
        self.pause().await;
        let end_bars = self.source.daily(end_day).await?;
        if start_bars.is_empty() || end_bars.is_empty() {
            return Ok(Vec::new());
        }

        let mut returns = join_period_returns(&start_bars, &end_bars, window);
        if !returns.is_empty() {
            attach_names(&mut returns, self.names().await?);
        }
        debug!(start_day, end_day, count = returns.len(), "Computed period returns");
        Ok(returns)
    }

    /// Large caps whose intraday high reached the maximum of the preceding
    /// trading days, largest market value first.
    pub async fn new_high_large_cap(
        &self,
        trade_date: &str,
    ) -> Result<Vec<NewHighRecord>, MarketError> {
        let today = self.source.daily(trade_date).await?;
        if today.is_empty() {
            return Ok(Vec::new());
        }
        if !self.is_trading_day(trade_date).await? {
            return Err(MarketError::NotTradingDay(trade_date.to_string()));
        }

        let end = parse_date(trade_date)?;
        let window_start = format_date(end - chrono::Duration::days(self.config.new_high_calendar_days));
        let trade_days = open_days(&self.source.trade_cal(&window_start, trade_date).await?);
        let recent = &trade_days[trade_days.len().saturating_sub(self.config.new_high_trading_days)..];
        let history_days = &recent[..recent.len().saturating_sub(1)];

        let mut history: Vec<Vec<DailyBar>> = Vec::with_capacity(history_days.len());
        for day in history_days {
            self.pause().await;
            match self.source.daily(day).await {
                Ok(bars) if !bars.is_empty() => history.push(bars),
                Ok(_) => {}
                Err(e) => warn!(day = %day, error = %e, "Skipping history day"),
            }
        }
        if history.is_empty() {
            return Ok(Vec::new());
        }

        let hist_highs = historical_highs(history.iter().map(Vec::as_slice));
        let basics = self.source.daily_basic(trade_date).await?;
        let mut records = new_highs(&today, &hist_highs, &basics, self.config.min_total_mv);
        if !records.is_empty() {
            attach_names(&mut records, self.names().await?);
        }
        info!(trade_date, history_days = history.len(), count = records.len(), "New-high screen complete");
        Ok(records)
    }
}
