use std::path::Path;

use limitup_market::{csv_file_name, write_csv, MarketAnalyzer, MarketError, ScreenKind};
use limitup_models::{OutputConfig, TabularRecord};
use tracing::warn;

use crate::display::{print_separator, print_table};

/// Row counts of the screens listed in the closing summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketReportCounts {
    pub limit_up: usize,
    pub high_volume_high_gain: usize,
    pub high_volume_limit_up: usize,
    pub high_volume_high_decline: usize,
    pub new_high_large_cap: usize,
}

/// Print one screen and write its CSV. Returns the row count before
/// truncation; a failed screen counts as empty.
fn emit<T: TabularRecord>(
    kind: ScreenKind,
    result: Result<Vec<T>, MarketError>,
    trade_date: &str,
    output: &OutputConfig,
    top_n: usize,
) -> usize {
    let mut records = result.unwrap_or_else(|e| {
        warn!(screen = kind.file_stem(), error = %e, "Screen failed");
        Vec::new()
    });
    print_table(&records, kind.title(), output.display_rows);
    let total = records.len();

    if kind.is_truncated() {
        records.truncate(top_n);
    }
    let path = Path::new(&output.csv_dir).join(csv_file_name(kind, trade_date));
    match write_csv(&path, &records) {
        Ok(0) => {}
        Ok(_) => println!("数据已保存到: {}", path.display()),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to write CSV"),
    }
    total
}

/// Run the nine daily screens in order, printing each and writing its CSV.
pub async fn run_market_report(
    analyzer: &MarketAnalyzer,
    trade_date: &str,
    output: &OutputConfig,
) -> MarketReportCounts {
    let top_n = analyzer.config().ranking_top_n;
    let mut counts = MarketReportCounts::default();

    print_separator("股票市场数据综合分析");
    println!("分析日期: {trade_date}");

    for (i, kind) in ScreenKind::ALL.into_iter().enumerate() {
        print_separator(&format!("{}. {}", i + 1, kind.title()));
        let date = trade_date;
        let rows = match kind {
            ScreenKind::LimitUp => {
                emit(kind, analyzer.daily_limit_up(date).await, date, output, top_n)
            }
            ScreenKind::HighVolumeHighGain => {
                emit(kind, analyzer.high_volume_high_gain(date).await, date, output, top_n)
            }
            ScreenKind::HighVolumeLimitUp => {
                emit(kind, analyzer.high_volume_limit_up(date).await, date, output, top_n)
            }
            ScreenKind::FiveDayRanking => {
                emit(kind, analyzer.five_day_ranking(date).await, date, output, top_n)
            }
            ScreenKind::TenDayRanking => {
                emit(kind, analyzer.ten_day_ranking(date).await, date, output, top_n)
            }
            ScreenKind::TwentyDayRanking => {
                emit(kind, analyzer.twenty_day_ranking(date).await, date, output, top_n)
            }
            ScreenKind::YtdRanking => {
                emit(kind, analyzer.ytd_ranking(date).await, date, output, top_n)
            }
            ScreenKind::HighVolumeHighDecline => {
                emit(kind, analyzer.high_volume_high_decline(date).await, date, output, top_n)
            }
            ScreenKind::NewHighLargeCap => {
                emit(kind, analyzer.new_high_large_cap(date).await, date, output, top_n)
            }
        };
        match kind {
            ScreenKind::LimitUp => counts.limit_up = rows,
            ScreenKind::HighVolumeHighGain => counts.high_volume_high_gain = rows,
            ScreenKind::HighVolumeLimitUp => counts.high_volume_limit_up = rows,
            ScreenKind::HighVolumeHighDecline => counts.high_volume_high_decline = rows,
            ScreenKind::NewHighLargeCap => counts.new_high_large_cap = rows,
            _ => {}
        }
    }

    print_separator("分析结果汇总");
    println!("涨停股票数量: {}", counts.limit_up);
    println!("高成交额高涨幅股票数量: {}", counts.high_volume_high_gain);
    println!("高成交额涨停股票数量: {}", counts.high_volume_limit_up);
    println!("高成交额高跌幅股票数量: {}", counts.high_volume_high_decline);
    println!("新高大市值股票数量: {}", counts.new_high_large_cap);
    print_separator("分析完成");
    println!("所有数据已保存为CSV文件，可用于进一步分析");

    counts
}
