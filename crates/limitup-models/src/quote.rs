use serde::{Deserialize, Deserializer, Serialize};

/// A row of the tabular outputs (console tables and CSV files).
///
/// Headers are per-record because some tables label their columns with the
/// window they were computed over.
pub trait TabularRecord {
    fn headers(&self) -> Vec<String>;
    fn cells(&self) -> Vec<String>;
}

/// One row of the Tushare `daily` endpoint.
///
/// Prices are CNY, `vol` is in lots (手) and `amount` in thousand CNY (千元).
/// Numeric columns can be null for suspended stocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyBar {
    pub ts_code: String,
    pub trade_date: String,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub pre_close: Option<f64>,
    #[serde(default)]
    pub pct_chg: Option<f64>,
    #[serde(default)]
    pub vol: Option<f64>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// One row of the Tushare `stock_basic` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockBasic {
    pub ts_code: String,
    #[serde(default)]
    pub symbol: Option<String>,
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub list_date: Option<String>,
}

/// One row of the Tushare `trade_cal` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeCalDay {
    #[serde(default)]
    pub exchange: Option<String>,
    pub cal_date: String,
    #[serde(deserialize_with = "flag_from_int_or_str")]
    pub is_open: bool,
}

/// One row of the Tushare `daily_basic` endpoint. `total_mv` is in ten-thousand CNY (万元).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyBasic {
    pub ts_code: String,
    #[serde(default)]
    pub trade_date: Option<String>,
    #[serde(default)]
    pub total_mv: Option<f64>,
}

fn flag_from_int_or_str<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_i64() == Some(1),
        serde_json::Value::String(s) => s.trim() == "1",
        _ => false,
    })
}

/// A screened daily quote joined with the stock name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteRecord {
    pub ts_code: String,
    pub name: String,
    pub close: f64,
    pub pct_chg: f64,
    pub vol: f64,
    pub amount: f64,
}

impl QuoteRecord {
    /// Build from a bar whose screened columns are present.
    pub fn from_bar(bar: &DailyBar, name: impl Into<String>) -> Option<Self> {
        Some(Self {
            ts_code: bar.ts_code.clone(),
            name: name.into(),
            close: bar.close?,
            pct_chg: bar.pct_chg?,
            vol: bar.vol.unwrap_or_default(),
            amount: bar.amount?,
        })
    }

    /// Code without the exchange suffix (`000001.SZ` -> `000001`).
    pub fn bare_code(&self) -> &str {
        self.ts_code
            .split_once('.')
            .map(|(code, _)| code)
            .unwrap_or(&self.ts_code)
    }
}

impl TabularRecord for QuoteRecord {
    fn headers(&self) -> Vec<String> {
        ["股票代码", "股票名称", "收盘价", "涨跌幅(%)", "成交量(手)", "成交额(千元)"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.ts_code.clone(),
            self.name.clone(),
            self.close.to_string(),
            self.pct_chg.to_string(),
            self.vol.to_string(),
            self.amount.to_string(),
        ]
    }
}

/// The window a period return was measured over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PeriodWindow {
    /// The last `n` trading days.
    Days(u32),
    /// From the first trading day of the year.
    YearToDate,
}

/// Close-to-close return of one stock over a window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodReturn {
    pub ts_code: String,
    pub name: String,
    pub start_close: f64,
    pub end_close: f64,
    pub return_pct: f64,
    pub window: PeriodWindow,
}

impl TabularRecord for PeriodReturn {
    fn headers(&self) -> Vec<String> {
        let (start, ret) = match self.window {
            PeriodWindow::Days(n) => (format!("{n}日前收盘价"), format!("{n}日涨幅(%)")),
            PeriodWindow::YearToDate => ("年初收盘价".to_string(), "年度涨幅(%)".to_string()),
        };
        vec![
            "股票代码".to_string(),
            "股票名称".to_string(),
            start,
            "最新收盘价".to_string(),
            ret,
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.ts_code.clone(),
            self.name.clone(),
            self.start_close.to_string(),
            self.end_close.to_string(),
            format!("{:.2}", self.return_pct),
        ]
    }
}

/// A large-cap stock whose intraday high reached its recent maximum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewHighRecord {
    pub ts_code: String,
    pub name: String,
    pub close: f64,
    pub high: f64,
    pub hist_high: f64,
    /// Ten-thousand CNY.
    pub total_mv: f64,
}

impl TabularRecord for NewHighRecord {
    fn headers(&self) -> Vec<String> {
        ["股票代码", "股票名称", "收盘价", "当日最高价", "历史最高价", "总市值(万元)"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.ts_code.clone(),
            self.name.clone(),
            self.close.to_string(),
            self.high.to_string(),
            self.hist_high.to_string(),
            self.total_mv.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_cal_accepts_int_and_string_flags() {
        let open: TradeCalDay =
            serde_json::from_str(r#"{"exchange": "SSE", "cal_date": "20240102", "is_open": 1}"#)
                .unwrap();
        assert!(open.is_open);

        let closed: TradeCalDay =
            serde_json::from_str(r#"{"cal_date": "20240101", "is_open": "0"}"#).unwrap();
        assert!(!closed.is_open);
    }

    #[test]
    fn daily_bar_tolerates_nulls() {
        let bar: DailyBar = serde_json::from_str(
            r#"{"ts_code": "000001.SZ", "trade_date": "20241220", "close": null, "pct_chg": 1.2}"#,
        )
        .unwrap();
        assert!(bar.close.is_none());
        assert_eq!(bar.pct_chg, Some(1.2));
        assert!(QuoteRecord::from_bar(&bar, "平安银行").is_none());
    }

    #[test]
    fn quote_record_bare_code() {
        let bar = DailyBar {
            ts_code: "600519.SH".to_string(),
            trade_date: "20241220".to_string(),
            open: None,
            high: None,
            low: None,
            close: Some(1500.0),
            pre_close: None,
            pct_chg: Some(10.0),
            vol: None,
            amount: Some(500000.0),
        };
        let record = QuoteRecord::from_bar(&bar, "贵州茅台").unwrap();
        assert_eq!(record.bare_code(), "600519");
        assert_eq!(record.vol, 0.0);
        assert_eq!(record.cells().len(), record.headers().len());
    }

    #[test]
    fn period_return_headers_follow_window() {
        let mut record = PeriodReturn {
            ts_code: "000001.SZ".to_string(),
            name: "平安银行".to_string(),
            start_close: 10.0,
            end_close: 11.0,
            return_pct: 10.0,
            window: PeriodWindow::Days(5),
        };
        assert_eq!(record.headers()[2], "5日前收盘价");
        assert_eq!(record.headers()[4], "5日涨幅(%)");
        assert_eq!(record.cells()[4], "10.00");

        record.window = PeriodWindow::YearToDate;
        assert_eq!(record.headers()[2], "年初收盘价");
        assert_eq!(record.headers()[4], "年度涨幅(%)");
    }
}
