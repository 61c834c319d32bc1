//! Indicator and ratio extraction from statement tables.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::PdfError;
use crate::tables::{PdfTableExtractor, StatementKind, Table};
use crate::text::PdfTextExtractor;

/// Indicator name and the row labels it may appear under.
pub const INDICATOR_KEYWORDS: &[(&str, &[&str])] = &[
    ("total_assets", &["资产总计", "总资产", "资产合计"]),
    ("total_liabilities", &["负债合计", "负债总计", "总负债"]),
    ("total_equity", &["所有者权益合计", "股东权益合计", "净资产"]),
    ("current_assets", &["流动资产合计", "流动资产"]),
    ("current_liabilities", &["流动负债合计", "流动负债"]),
    ("revenue", &["营业收入", "主营业务收入", "总收入"]),
    ("operating_profit", &["营业利润", "经营利润"]),
    ("net_profit", &["净利润", "归属于母公司股东的净利润"]),
    ("gross_profit", &["毛利润", "营业毛利"]),
    ("operating_cost", &["营业成本", "主营业务成本"]),
    ("operating_cash_flow", &["经营活动产生的现金流量净额", "经营性现金流"]),
    ("investing_cash_flow", &["投资活动产生的现金流量净额", "投资性现金流"]),
    ("financing_cash_flow", &["筹资活动产生的现金流量净额", "筹资性现金流"]),
];

const TREND_INDICATORS: [&str; 3] = ["revenue", "net_profit", "total_assets"];

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid number regex"));
static COMPANY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"公司名称[：:]\s*([^\n\r]+)").expect("valid name regex"));
static STOCK_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"股票代码[：:]\s*(\d+)").expect("valid code regex"));
static REPORT_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}年度|\d{4}年第[一二三四1234]季度|\d{4}年半年度").expect("valid period regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompanyInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisOverview {
    pub company_info: CompanyInfo,
    pub tables_found: Vec<StatementKind>,
    pub indicators_found: Vec<String>,
    pub ratios_calculated: Vec<String>,
}

/// Everything extracted from one financial report PDF.
#[derive(Debug, Clone, Serialize)]
pub struct PdfAnalysis {
    pub pdf_path: PathBuf,
    #[serde(skip)]
    pub text_content: String,
    pub financial_tables: BTreeMap<StatementKind, Table>,
    pub key_indicators: BTreeMap<String, Decimal>,
    pub financial_ratios: BTreeMap<String, Decimal>,
    pub summary: AnalysisOverview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodSnapshot {
    pub period: String,
    pub indicators: BTreeMap<String, Decimal>,
    pub ratios: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportComparison {
    pub periods: Vec<PeriodSnapshot>,
    /// `{indicator}_change` rates between the last two periods.
    pub changes: BTreeMap<String, Decimal>,
    pub trends: BTreeMap<String, Trend>,
}

/// Value on the first row mentioning any keyword.
///
/// Cells are scanned left to right; the first cell holding a number yields
/// the last number in that cell.
pub fn find_indicator_value(table: &Table, keywords: &[&str]) -> Option<Decimal> {
    table
        .rows
        .iter()
        .filter(|row| {
            let text = row.join(" ");
            keywords.iter().any(|k| text.contains(k))
        })
        .find_map(|row| {
            row.iter().find_map(|cell| {
                let plain = cell.replace([',', '，'], "");
                NUMBER
                    .find_iter(&plain)
                    .last()
                    .and_then(|m| Decimal::from_str(m.as_str()).ok())
            })
        })
}

pub fn extract_key_indicators(tables: &BTreeMap<StatementKind, Table>) -> BTreeMap<String, Decimal> {
    let mut indicators = BTreeMap::new();
    for table in tables.values().filter(|t| !t.rows.is_empty()) {
        for (name, keywords) in INDICATOR_KEYWORDS {
            if let Some(value) = find_indicator_value(table, keywords) {
                indicators.insert(name.to_string(), value);
            }
        }
    }
    indicators
}

fn ratio(
    indicators: &BTreeMap<String, Decimal>,
    numerator: &str,
    denominator: &str,
) -> Option<Decimal> {
    let denominator = *indicators.get(denominator)?;
    if denominator.is_zero() {
        return None;
    }
    indicators.get(numerator)?.checked_div(denominator)
}

/// Standard ratios from whatever indicators are present.
///
/// A ratio is omitted when an input is missing or its denominator is zero.
pub fn calculate_ratios(indicators: &BTreeMap<String, Decimal>) -> BTreeMap<String, Decimal> {
    let mut ratios = BTreeMap::new();
    let mut put = |name: &str, value: Option<Decimal>| {
        if let Some(v) = value {
            ratios.insert(name.to_string(), v);
        }
    };

    put("current_ratio", ratio(indicators, "current_assets", "current_liabilities"));
    put("debt_ratio", ratio(indicators, "total_liabilities", "total_assets"));
    put("roe", ratio(indicators, "net_profit", "total_equity"));
    put("roa", ratio(indicators, "net_profit", "total_assets"));
    put(
        "gross_margin",
        indicators
            .get("revenue")
            .zip(indicators.get("operating_cost"))
            .filter(|(revenue, _)| !revenue.is_zero())
            .and_then(|(revenue, cost)| (revenue - cost).checked_div(*revenue)),
    );
    put("net_margin", ratio(indicators, "net_profit", "revenue"));
    ratios
}

pub fn extract_company_info(text: &str) -> CompanyInfo {
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };
    let report_type = if text.contains("半年度报告") || text.contains("中报") {
        Some("中报")
    } else if text.contains("第一季度报告") || text.contains("一季报") {
        Some("一季报")
    } else if text.contains("第三季度报告") || text.contains("三季报") {
        Some("三季报")
    } else if text.contains("年度报告") || text.contains("年报") {
        Some("年报")
    } else {
        None
    };

    CompanyInfo {
        company_name: capture(&COMPANY_NAME),
        stock_code: capture(&STOCK_CODE),
        report_period: REPORT_PERIOD.find(text).map(|m| m.as_str().to_string()),
        report_type: report_type.map(str::to_string),
    }
}

/// Compare reports given oldest first.
///
/// Returns `None` for fewer than two reports.
pub fn compare_reports(analyses: &[PdfAnalysis]) -> Option<ReportComparison> {
    if analyses.len() < 2 {
        return None;
    }

    let periods: Vec<PeriodSnapshot> = analyses
        .iter()
        .map(|a| PeriodSnapshot {
            period: a
                .summary
                .company_info
                .report_period
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            indicators: a.key_indicators.clone(),
            ratios: a.financial_ratios.clone(),
        })
        .collect();

    let current = &periods[periods.len() - 1].indicators;
    let previous = &periods[periods.len() - 2].indicators;
    let changes = current
        .iter()
        .filter_map(|(name, value)| {
            let before = previous.get(name).filter(|b| !b.is_zero())?;
            let rate = (value - before).checked_div(*before)?;
            Some((format!("{name}_change"), rate))
        })
        .collect();

    let trends = TREND_INDICATORS
        .iter()
        .filter_map(|name| {
            let values: Vec<Decimal> = periods
                .iter()
                .filter_map(|p| p.indicators.get(*name).copied())
                .collect();
            let (first, last) = (values.first()?, values.last()?);
            if values.len() < 2 {
                return None;
            }
            let trend = match last.cmp(first) {
                std::cmp::Ordering::Greater => Trend::Increasing,
                std::cmp::Ordering::Less => Trend::Decreasing,
                std::cmp::Ordering::Equal => Trend::Stable,
            };
            Some((name.to_string(), trend))
        })
        .collect();

    Some(ReportComparison {
        periods,
        changes,
        trends,
    })
}

/// Text, tables, indicators and ratios for one report.
#[derive(Debug, Default, Clone, Copy)]
pub struct FinancialPdfAnalyzer {
    text: PdfTextExtractor,
    tables: PdfTableExtractor,
}

impl FinancialPdfAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, path: &Path) -> Result<PdfAnalysis, PdfError> {
        info!(path = %path.display(), "Analyzing financial PDF");
        let text_content = self.text.extract_text(path)?;
        let financial_tables = match self.tables.extract_financial_tables(path) {
            Ok(tables) => tables,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Table extraction failed");
                BTreeMap::new()
            }
        };
        let key_indicators = extract_key_indicators(&financial_tables);
        let financial_ratios = calculate_ratios(&key_indicators);

        let summary = AnalysisOverview {
            company_info: extract_company_info(&text_content),
            tables_found: financial_tables.keys().copied().collect(),
            indicators_found: key_indicators.keys().cloned().collect(),
            ratios_calculated: financial_ratios.keys().cloned().collect(),
        };
        info!(
            path = %path.display(),
            tables = summary.tables_found.len(),
            indicators = summary.indicators_found.len(),
            "Financial PDF analysis complete"
        );

        Ok(PdfAnalysis {
            pdf_path: path.to_path_buf(),
            text_content,
            financial_tables,
            key_indicators,
            financial_ratios,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::tests::table;
    use rust_decimal_macros::dec;

    fn indicators(pairs: &[(&str, Decimal)]) -> BTreeMap<String, Decimal> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn analysis(period: &str, pairs: &[(&str, Decimal)]) -> PdfAnalysis {
        PdfAnalysis {
            pdf_path: PathBuf::from("x.pdf"),
            text_content: String::new(),
            financial_tables: BTreeMap::new(),
            key_indicators: indicators(pairs),
            financial_ratios: BTreeMap::new(),
            summary: AnalysisOverview {
                company_info: CompanyInfo {
                    report_period: Some(period.to_string()),
                    ..CompanyInfo::default()
                },
                ..AnalysisOverview::default()
            },
        }
    }

    #[test]
    fn indicator_value_takes_last_number_of_first_numeric_cell() {
        let t = table(
            &["项目", "期末余额", "期初余额"],
            &[
                &["流动资产合计", "1,200.50", "1,000.00"],
                &["资产总计", "5,000.00", "4,500.00"],
            ],
        );
        assert_eq!(find_indicator_value(&t, &["资产总计"]), Some(dec!(5000.00)));
        assert_eq!(find_indicator_value(&t, &["流动资产"]), Some(dec!(1200.50)));
        assert_eq!(find_indicator_value(&t, &["商誉"]), None);
    }

    #[test]
    fn later_tables_override_earlier_values() {
        let tables = BTreeMap::from([
            (
                StatementKind::BalanceSheet,
                table(&["项目", "金额"], &[&["资产总计", "100"], &["负债合计", "40"]]),
            ),
            (
                StatementKind::IncomeStatement,
                table(&["项目", "金额"], &[&["营业收入", "80"], &["营业成本", "60"], &["净利润", "8"]]),
            ),
        ]);
        let found = extract_key_indicators(&tables);
        assert_eq!(found["total_assets"], dec!(100));
        assert_eq!(found["total_liabilities"], dec!(40));
        assert_eq!(found["revenue"], dec!(80));
        assert_eq!(found["net_profit"], dec!(8));
    }

    #[test]
    fn ratios_skip_zero_denominators() {
        let values = indicators(&[
            ("current_assets", dec!(300)),
            ("current_liabilities", dec!(0)),
            ("total_assets", dec!(1000)),
            ("total_liabilities", dec!(400)),
            ("total_equity", dec!(600)),
            ("net_profit", dec!(60)),
            ("revenue", dec!(500)),
            ("operating_cost", dec!(350)),
        ]);
        let ratios = calculate_ratios(&values);
        assert!(!ratios.contains_key("current_ratio"));
        assert_eq!(ratios["debt_ratio"], dec!(0.4));
        assert_eq!(ratios["roe"], dec!(0.1));
        assert_eq!(ratios["roa"], dec!(0.06));
        assert_eq!(ratios["gross_margin"], dec!(0.3));
        assert_eq!(ratios["net_margin"], dec!(0.12));
    }

    #[test]
    fn company_info_from_cover_text() {
        let text = "平安银行股份有限公司\n2023年年度报告\n公司名称：平安银行股份有限公司\n股票代码：000001\n";
        let info = extract_company_info(text);
        assert_eq!(info.company_name.as_deref(), Some("平安银行股份有限公司"));
        assert_eq!(info.stock_code.as_deref(), Some("000001"));
        assert_eq!(info.report_type.as_deref(), Some("年报"));

        let interim = extract_company_info("2024年半年度报告");
        assert_eq!(interim.report_period.as_deref(), Some("2024年半年度"));
        assert_eq!(interim.report_type.as_deref(), Some("中报"));
    }

    #[test]
    fn comparison_changes_and_trends() {
        let reports = vec![
            analysis("2022年度", &[("revenue", dec!(100)), ("net_profit", dec!(10)), ("total_assets", dec!(0))]),
            analysis("2023年度", &[("revenue", dec!(120)), ("net_profit", dec!(10)), ("total_assets", dec!(50))]),
        ];
        let cmp = compare_reports(&reports).unwrap();
        assert_eq!(cmp.periods[1].period, "2023年度");
        assert_eq!(cmp.changes["revenue_change"], dec!(0.2));
        assert_eq!(cmp.changes["net_profit_change"], dec!(0));
        assert!(!cmp.changes.contains_key("total_assets_change"));
        assert_eq!(cmp.trends["revenue"], Trend::Increasing);
        assert_eq!(cmp.trends["net_profit"], Trend::Stable);

        assert!(compare_reports(&reports[..1]).is_none());
    }
}
