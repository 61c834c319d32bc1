use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use limitup_models::LimitUpReport;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

const DETAIL_HEADERS: [&str; 9] = [
    "股票代码",
    "股票名称",
    "收盘价",
    "涨跌幅(%)",
    "成交额(千元)",
    "主营业务",
    "所属行业",
    "利好公告数",
    "可能原因",
];

/// Characters of the main business description kept in the workbook.
const MAIN_BUSINESS_CHARS: usize = 100;

pub fn json_path(output_dir: &Path, trade_date: &str) -> PathBuf {
    output_dir.join(format!("limit_up_analysis_{trade_date}.json"))
}

pub fn excel_path(output_dir: &Path, trade_date: &str) -> PathBuf {
    output_dir.join(format!("limit_up_report_{trade_date}.xlsx"))
}

/// Write both the JSON report and the workbook into `output_dir`.
pub fn save_report(report: &LimitUpReport, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    save_json(report, output_dir)?;
    save_excel(report, output_dir)?;
    Ok(())
}

/// Pretty-printed, with non-ASCII text left unescaped.
pub fn save_json(report: &LimitUpReport, output_dir: &Path) -> Result<PathBuf> {
    let path = json_path(output_dir, &report.trade_date);
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote analysis JSON");
    Ok(path)
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str], format: &Format) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, format)?;
    }
    Ok(())
}

/// Workbook with the sheets 股票详情, 汇总统计 and 行业分布.
pub fn save_excel(report: &LimitUpReport, output_dir: &Path) -> Result<PathBuf> {
    let path = excel_path(output_dir, &report.trade_date);
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let details = workbook.add_worksheet().set_name("股票详情")?;
    write_headers(details, &DETAIL_HEADERS, &bold)?;
    for (i, stock) in report.limit_up_stocks.iter().enumerate() {
        let row = i as u32 + 1;
        let insights = &stock.analysis_insights;
        let main_business: String = stock
            .business_info
            .main_business
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(MAIN_BUSINESS_CHARS)
            .collect();
        details.write_string(row, 0, &stock.stock_code)?;
        details.write_string(row, 1, &stock.stock_name)?;
        details.write_number(row, 2, stock.market_data.close_price)?;
        details.write_number(row, 3, stock.market_data.change_pct)?;
        details.write_number(row, 4, stock.market_data.amount)?;
        details.write_string(row, 5, main_business)?;
        details.write_string(row, 6, stock.business_info.industry.as_deref().unwrap_or_default())?;
        details.write_number(row, 7, insights.positive_news_count as f64)?;
        details.write_string(row, 8, insights.possible_reasons.join("; "))?;
    }

    let summary = &report.summary;
    let stats = workbook.add_worksheet().set_name("汇总统计")?;
    write_headers(stats, &["指标", "数值"], &bold)?;
    let rows = [
        ("涨停股票总数", summary.total_stocks as f64),
        ("平均涨幅(%)", summary.avg_change_pct),
        ("总成交额(千元)", summary.total_amount),
        ("有利好消息股票数", summary.with_positive_news as f64),
        ("利好关联度(%)", summary.business_correlation),
    ];
    for (i, (label, value)) in rows.into_iter().enumerate() {
        let row = i as u32 + 1;
        stats.write_string(row, 0, label)?;
        stats.write_number(row, 1, value)?;
    }

    let industries = workbook.add_worksheet().set_name("行业分布")?;
    write_headers(industries, &["行业", "股票数量"], &bold)?;
    for (i, entry) in report.industry_analysis.iter().enumerate() {
        let row = i as u32 + 1;
        industries.write_string(row, 0, &entry.industry)?;
        industries.write_number(row, 1, entry.count as f64)?;
    }

    workbook
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote analysis workbook");
    Ok(path)
}
