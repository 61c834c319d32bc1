use async_trait::async_trait;
use limitup_models::quote::{DailyBar, DailyBasic, StockBasic, TradeCalDay};
use serde_json::json;

use crate::error::MarketError;
use crate::tushare::TushareClient;

const DAILY_FIELDS: &[&str] = &[
    "ts_code",
    "trade_date",
    "open",
    "high",
    "low",
    "close",
    "pre_close",
    "pct_chg",
    "vol",
    "amount",
];
const TRADE_CAL_FIELDS: &[&str] = &["exchange", "cal_date", "is_open"];
const STOCK_BASIC_FIELDS: &[&str] = &["ts_code", "symbol", "name", "industry", "market", "list_date"];
const DAILY_BASIC_FIELDS: &[&str] = &["ts_code", "trade_date", "total_mv"];

/// The four market-data queries the screens need. Mockable for testing.
///
/// Dates are `YYYYMMDD` strings.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// All stocks' bars for one trading day.
    async fn daily(&self, trade_date: &str) -> Result<Vec<DailyBar>, MarketError>;

    /// Calendar days in `[start_date, end_date]`, open and closed, in any order.
    async fn trade_cal(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<TradeCalDay>, MarketError>;

    /// Currently listed stocks on all exchanges.
    async fn stock_basic(&self) -> Result<Vec<StockBasic>, MarketError>;

    async fn daily_basic(&self, trade_date: &str) -> Result<Vec<DailyBasic>, MarketError>;
}

#[async_trait]
impl MarketDataSource for TushareClient {
    async fn daily(&self, trade_date: &str) -> Result<Vec<DailyBar>, MarketError> {
        self.call("daily", json!({ "trade_date": trade_date }), DAILY_FIELDS)
            .await?
            .rows()
    }

    async fn trade_cal(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<TradeCalDay>, MarketError> {
        self.call(
            "trade_cal",
            json!({ "start_date": start_date, "end_date": end_date }),
            TRADE_CAL_FIELDS,
        )
        .await?
        .rows()
    }

    async fn stock_basic(&self) -> Result<Vec<StockBasic>, MarketError> {
        self.call(
            "stock_basic",
            json!({ "exchange": "", "list_status": "L" }),
            STOCK_BASIC_FIELDS,
        )
        .await?
        .rows()
    }

    async fn daily_basic(&self, trade_date: &str) -> Result<Vec<DailyBasic>, MarketError> {
        self.call(
            "daily_basic",
            json!({ "trade_date": trade_date }),
            DAILY_BASIC_FIELDS,
        )
        .await?
        .rows()
    }
}
