//! Console rendering. Everything here goes to stdout.

use std::path::Path;

use limitup_models::{LimitUpReport, TabularRecord};
use rust_decimal::prelude::ToPrimitive;

use crate::output::{excel_path, json_path};

const RULE_WIDTH: usize = 80;

pub fn print_separator(title: &str) {
    println!("\n{}", "=".repeat(RULE_WIDTH));
    println!("  {title}");
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// First `max_chars` characters, with `...` appended when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// `1234567.8` -> `1,234,568`.
pub fn thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0.0 && rounded != "0" {
        out.insert(0, '-');
    }
    out
}

/// A screen result as an aligned text table, at most `max_rows` rows.
pub fn format_table<T: TabularRecord>(records: &[T], title: &str, max_rows: usize) -> String {
    let Some(first) = records.first() else {
        return format!("{title}: 无数据\n");
    };
    let shown = &records[..records.len().min(max_rows)];
    let headers = first.headers();
    let rows: Vec<Vec<String>> = shown.iter().map(TabularRecord::cells).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:>w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = format!(
        "{title} (共{}条，显示前{}条):\n{}\n",
        records.len(),
        shown.len(),
        "-".repeat(RULE_WIDTH)
    );
    out.push_str(&line(&headers));
    out.push('\n');
    for row in &rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

pub fn print_table<T: TabularRecord>(records: &[T], title: &str, max_rows: usize) {
    println!("{}", format_table(records, title, max_rows));
}

pub fn print_analysis_summary(report: &LimitUpReport) {
    println!("\n{}", "=".repeat(RULE_WIDTH));
    println!("  {} 涨停股票综合分析报告", report.trade_date);
    println!("{}", "=".repeat(RULE_WIDTH));
    if let Some(error) = &report.error {
        println!("分析失败: {error}");
    }

    let summary = &report.summary;
    println!("基本统计:");
    println!("   涨停股票总数: {} 只", summary.total_stocks);
    println!("   平均涨幅: {}%", summary.avg_change_pct);
    println!("   总成交额: {} 千元", thousands(summary.total_amount));
    println!(
        "   有利好消息: {} 只 ({}%)",
        summary.with_positive_news, summary.business_correlation
    );

    println!("\n行业分布:");
    for entry in report.industry_analysis.iter().take(5) {
        println!("   {}: {} 只", entry.industry, entry.count);
    }

    println!("\n主要涨停股票:");
    for (i, stock) in report.limit_up_stocks.iter().take(5).enumerate() {
        println!("   {}. {} {}", i + 1, stock.stock_code, stock.stock_name);
        println!(
            "      涨幅: {}% | 成交额: {}千元",
            stock.market_data.change_pct,
            thousands(stock.market_data.amount)
        );
        let business = stock
            .business_info
            .main_business
            .as_deref()
            .unwrap_or("信息获取中...");
        println!("      主营: {}", truncate_chars(business, 60));
        let reasons = &stock.analysis_insights.possible_reasons;
        if !reasons.is_empty() {
            let head: Vec<&str> = reasons.iter().take(2).map(String::as_str).collect();
            println!("      原因: {}", head.join("; "));
        }
        println!();
    }
    println!("{}", "=".repeat(RULE_WIDTH));
}

pub fn print_stock_details(report: &LimitUpReport, output_dir: &Path) {
    if !report.limit_up_stocks.is_empty() {
        print_separator("详细分析结果");
    }
    for (i, stock) in report.limit_up_stocks.iter().enumerate() {
        println!("\n股票 {}: {} {}", i + 1, stock.stock_code, stock.stock_name);
        println!(
            "   市场表现: 涨幅 {}% | 成交额 {}千元",
            stock.market_data.change_pct,
            thousands(stock.market_data.amount)
        );

        let info = &stock.business_info;
        let business = info.main_business.as_deref().unwrap_or("暂未获取到主营业务信息");
        println!("   主营业务: {}", truncate_chars(business, 200));
        println!("   所属行业: {}", info.industry.as_deref().unwrap_or("未知"));

        let indicators = &stock.financial_data.key_indicators;
        if !indicators.is_empty() {
            println!("   财务指标:");
            if let Some(revenue) = indicators.get("revenue") {
                println!("      营业收入: {}", thousands(revenue.to_f64().unwrap_or_default()));
            }
            if let Some(profit) = indicators.get("net_profit") {
                println!("      净利润: {}", thousands(profit.to_f64().unwrap_or_default()));
            }
        }

        if !stock.recent_announcements.is_empty() {
            println!("   最近公告:");
            for ann in stock.recent_announcements.iter().take(3) {
                let mark = if ann.is_positive { "[利好]" } else { "[公告]" };
                println!("      {mark} {}", truncate_chars(&ann.title, 50));
            }
        }

        let reasons = &stock.analysis_insights.possible_reasons;
        if !reasons.is_empty() {
            println!("   可能原因: {}", reasons.join("; "));
        }
        println!("{}", "-".repeat(RULE_WIDTH));
    }

    println!("\n详细分析结果已保存到 {}/ 目录", output_dir.display());
    println!("   - JSON报告: {}", file_name(&json_path(output_dir, &report.trade_date)));
    println!("   - Excel报告: {}", file_name(&excel_path(output_dir, &report.trade_date)));
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
