use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use dialoguer::{Input, Select};
use limitup::display::{print_analysis_summary, print_separator, print_stock_details};
use limitup::models::config::LimitupConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Run the nine daily screens and write CSV files
    Market,
    /// Analyze limit-up stocks with filings and announcements
    LimitUp,
}

#[derive(Parser, Debug)]
#[command(name = "limitup", about = "A-share market screens and limit-up analysis")]
struct Cli {
    /// Trade date as YYYYMMDD; prompted for when omitted
    date: Option<String>,

    /// Analysis mode; prompted for when omitted
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Number of limit-up stocks to analyze in depth
    #[arg(long)]
    max_stocks: Option<usize>,

    /// Path to configuration file
    #[arg(short, long, default_value = "config/limitup.toml")]
    config: String,
}

fn load_config(path: &str) -> Result<LimitupConfig> {
    if !Path::new(path).exists() {
        info!(path, "No config file, using defaults");
        return Ok(LimitupConfig::default());
    }
    let config_str =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
    toml::from_str(&config_str).with_context(|| format!("Failed to parse config: {path}"))
}

fn prompt_mode() -> Result<Mode> {
    println!("=== 股票市场数据综合分析程序 ===");
    println!("基于tushare pro接口的全方位股票数据分析工具");
    let choice = Select::new()
        .with_prompt("请选择分析模式")
        .items(&["市场数据综合分析", "涨停股票深度分析"])
        .default(0)
        .interact()?;
    Ok(if choice == 1 { Mode::LimitUp } else { Mode::Market })
}

fn prompt_date() -> Result<String> {
    let date: String = Input::new()
        .with_prompt("请输入分析日期 (格式: YYYYMMDD，如 20240801)")
        .interact_text()?;
    Ok(date.trim().to_string())
}

/// Empty or unparseable input falls back to `default`.
fn prompt_max_stocks(default: usize) -> Result<usize> {
    let input: String = Input::new()
        .with_prompt(format!("请输入最大分析股票数量 (默认{default}只，建议不超过10只)"))
        .allow_empty(true)
        .interact_text()?;
    Ok(input.trim().parse().unwrap_or(default))
}

async fn run_market(config: &LimitupConfig, trade_date: &str) -> Result<()> {
    let analyzer =
        limitup::build_market_analyzer(config).context("Failed to build market analyzer")?;
    limitup::run_market_report(&analyzer, trade_date, &config.output).await;
    Ok(())
}

async fn run_limit_up(
    config: &LimitupConfig,
    trade_date: &str,
    max_stocks: Option<usize>,
) -> Result<()> {
    print_separator("涨停股票综合深度分析");
    println!("分析日期: {trade_date}");
    println!("正在整合行情数据、财报信息、公告数据...");
    println!("注意: 此分析需要下载PDF文件，可能需要较长时间");

    let max_stocks = match max_stocks {
        Some(n) => n,
        None => prompt_max_stocks(config.analysis.max_stocks)?,
    }
    .min(config.analysis.max_stocks_cap);

    let analyzer = limitup::build_comprehensive_analyzer(config)
        .await
        .context("Failed to build limit-up analyzer")?;
    let report = analyzer.analyze_limit_up_stocks(trade_date, max_stocks).await;

    print_analysis_summary(&report);
    print_stock_details(&report, analyzer.output_dir());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let mode = match cli.mode {
        Some(mode) => mode,
        None => prompt_mode()?,
    };
    let trade_date = match cli.date {
        Some(date) => date,
        None => prompt_date()?,
    };
    if NaiveDate::parse_from_str(&trade_date, "%Y%m%d").is_err() {
        println!("日期格式错误，请使用 YYYYMMDD 格式，例如: 20240801");
        return Ok(());
    }

    match mode {
        Mode::Market => run_market(&config, &trade_date).await,
        Mode::LimitUp => run_limit_up(&config, &trade_date, cli.max_stocks).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_date_and_flags() {
        let cli = Cli::parse_from(["limitup", "20241220", "--mode", "limit-up", "--max-stocks", "3"]);
        assert_eq!(cli.date.as_deref(), Some("20241220"));
        assert_eq!(cli.mode, Some(Mode::LimitUp));
        assert_eq!(cli.max_stocks, Some(3));
        assert_eq!(cli.config, "config/limitup.toml");
    }

    #[test]
    fn missing_config_file_gives_defaults() {
        let config = load_config("does/not/exist.toml").unwrap();
        assert_eq!(config, LimitupConfig::default());
    }

    #[test]
    fn sample_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/limitup.toml");
        assert_eq!(load_config(path).unwrap(), LimitupConfig::default());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limitup.toml");
        std::fs::write(&path, "[market\nlimit_up_pct = ").unwrap();
        assert!(load_config(path.to_str().unwrap()).is_err());
    }
}
