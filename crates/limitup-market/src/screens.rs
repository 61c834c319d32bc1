//! Pure screening functions over market-data rows.

use std::cmp::Ordering;
use std::collections::HashMap;

use limitup_models::quote::{
    DailyBar, DailyBasic, NewHighRecord, PeriodReturn, PeriodWindow, QuoteRecord, TradeCalDay,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn apply(self, a: f64, b: f64) -> Ordering {
        match self {
            Self::Ascending => a.total_cmp(&b),
            Self::Descending => b.total_cmp(&a),
        }
    }
}

/// Records that carry a stock code and a display name.
pub trait Named {
    fn code(&self) -> &str;
    fn set_name(&mut self, name: String);
}

impl Named for QuoteRecord {
    fn code(&self) -> &str {
        &self.ts_code
    }
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl Named for PeriodReturn {
    fn code(&self) -> &str {
        &self.ts_code
    }
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl Named for NewHighRecord {
    fn code(&self) -> &str {
        &self.ts_code
    }
    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Left-join names by code. Unknown codes get an empty name.
pub fn attach_names<T: Named>(records: &mut [T], names: &HashMap<String, String>) {
    for record in records.iter_mut() {
        let name = names.get(record.code()).cloned().unwrap_or_default();
        record.set_name(name);
    }
}

/// Keep bars passing `keep`, sorted by `pct_chg`.
///
/// Bars missing close, pct_chg or amount never pass.
pub fn filter_quotes(
    bars: &[DailyBar],
    keep: impl Fn(&QuoteRecord) -> bool,
    order: SortOrder,
) -> Vec<QuoteRecord> {
    let mut records: Vec<QuoteRecord> = bars
        .iter()
        .filter_map(|bar| QuoteRecord::from_bar(bar, String::new()))
        .filter(|record| keep(record))
        .collect();
    records.sort_by(|a, b| order.apply(a.pct_chg, b.pct_chg));
    records
}

/// Open trading days from a calendar response, oldest first.
pub fn open_days(calendar: &[TradeCalDay]) -> Vec<String> {
    let mut days: Vec<String> = calendar
        .iter()
        .filter(|day| day.is_open)
        .map(|day| day.cal_date.clone())
        .collect();
    days.sort();
    days.dedup();
    days
}

/// Inner-join two days' bars on code and compute close-to-close returns, best first.
pub fn join_period_returns(
    start: &[DailyBar],
    end: &[DailyBar],
    window: PeriodWindow,
) -> Vec<PeriodReturn> {
    let end_closes: HashMap<&str, f64> = end
        .iter()
        .filter_map(|bar| bar.close.map(|close| (bar.ts_code.as_str(), close)))
        .collect();

    let mut returns: Vec<PeriodReturn> = start
        .iter()
        .filter_map(|bar| {
            let start_close = bar.close.filter(|c| *c != 0.0)?;
            let end_close = *end_closes.get(bar.ts_code.as_str())?;
            Some(PeriodReturn {
                ts_code: bar.ts_code.clone(),
                name: String::new(),
                start_close,
                end_close,
                return_pct: (end_close - start_close) / start_close * 100.0,
                window,
            })
        })
        .collect();
    returns.sort_by(|a, b| SortOrder::Descending.apply(a.return_pct, b.return_pct));
    returns
}

/// Highest `high` per code across several days of bars.
pub fn historical_highs<'a>(days: impl IntoIterator<Item = &'a [DailyBar]>) -> HashMap<String, f64> {
    let mut highs: HashMap<String, f64> = HashMap::new();
    for bars in days {
        for bar in bars {
            if let Some(high) = bar.high {
                highs
                    .entry(bar.ts_code.clone())
                    .and_modify(|h| *h = h.max(high))
                    .or_insert(high);
            }
        }
    }
    highs
}

/// Stocks whose high today reaches their historical high and whose total
/// market value exceeds `min_total_mv`, largest first.
pub fn new_highs(
    today: &[DailyBar],
    hist_highs: &HashMap<String, f64>,
    basics: &[DailyBasic],
    min_total_mv: f64,
) -> Vec<NewHighRecord> {
    let market_values: HashMap<&str, f64> = basics
        .iter()
        .filter_map(|b| b.total_mv.map(|mv| (b.ts_code.as_str(), mv)))
        .collect();

    let mut records: Vec<NewHighRecord> = today
        .iter()
        .filter_map(|bar| {
            let high = bar.high?;
            let hist_high = *hist_highs.get(&bar.ts_code)?;
            if high < hist_high {
                return None;
            }
            let total_mv = *market_values.get(bar.ts_code.as_str())?;
            if total_mv <= min_total_mv {
                return None;
            }
            Some(NewHighRecord {
                ts_code: bar.ts_code.clone(),
                name: String::new(),
                close: bar.close.unwrap_or_default(),
                high,
                hist_high,
                total_mv,
            })
        })
        .collect();
    records.sort_by(|a, b| SortOrder::Descending.apply(a.total_mv, b.total_mv));
    records
}
