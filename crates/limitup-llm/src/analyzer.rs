use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use limitup_models::{BusinessInfo, FinancialData, ReportAnalysis};
use limitup_pdf::{extract_target_sections, join_sections, PdfTextExtractor};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::client::LlmClient;
use crate::error::LlmError;
use crate::parser::parse_json_object;
use crate::prompts::{
    financial_report_prompt, COMPANY_SECTION, DISCUSSION_SECTION, INDICATOR_SECTION, NOT_FOUND,
};

/// Turns one periodic report PDF into a structured summary. Mockable for testing.
#[async_trait]
pub trait FilingAnalyzer: Send + Sync {
    async fn analyze_report(&self, pdf_path: &Path) -> ReportAnalysis;
}

/// Sends a report to the active LLM, directly as a PDF when the provider
/// accepts one, otherwise as extracted text.
pub struct FinancialReportAnalyzer {
    client: LlmClient,
    text: PdfTextExtractor,
    prompt: String,
    max_text_chars: usize,
}

impl FinancialReportAnalyzer {
    pub fn new(client: LlmClient, max_text_chars: usize) -> Self {
        Self {
            client,
            text: PdfTextExtractor::new(),
            prompt: financial_report_prompt(),
            max_text_chars,
        }
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut LlmClient {
        &mut self.client
    }

    /// Target chapters when present, else the head of the full text.
    fn report_text(&self, pdf_path: &Path) -> Result<String, LlmError> {
        let full_text = self.text.extract_text(pdf_path)?;
        let sections = extract_target_sections(&full_text);
        if sections.is_empty() {
            debug!(path = %pdf_path.display(), "No target sections, sending full text");
            Ok(full_text.chars().take(self.max_text_chars).collect())
        } else {
            Ok(join_sections(&sections))
        }
    }

    async fn llm_response(&self, pdf_path: &Path) -> Result<String, LlmError> {
        match self.client.analyze_pdf(pdf_path, &self.prompt).await {
            Ok(response) if !response.trim().is_empty() => return Ok(response),
            Ok(_) => debug!("Direct PDF analysis returned nothing"),
            Err(e) => debug!(error = %e, "Direct PDF analysis unavailable, using text"),
        }
        let text = self.report_text(pdf_path)?;
        self.client.analyze_text(&text, &self.prompt).await
    }
}

#[async_trait]
impl FilingAnalyzer for FinancialReportAnalyzer {
    async fn analyze_report(&self, pdf_path: &Path) -> ReportAnalysis {
        let path_str = pdf_path.display().to_string();
        if !self.client.is_configured() {
            return ReportAnalysis::failed(path_str, LlmError::NotConfigured.to_string());
        }
        info!(path = %path_str, "Analyzing financial report");

        let raw = match self.llm_response(pdf_path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path_str, error = %e, "Report analysis failed");
                return ReportAnalysis::failed(path_str, e.to_string());
            }
        };

        match parse_json_object(&raw) {
            Ok(object) => ReportAnalysis {
                pdf_path: path_str,
                analyzed_at: Utc::now(),
                success: true,
                error: None,
                raw_llm_response: Some(raw),
                parsed_data: Some(Value::Object(object)),
            },
            Err(e) => {
                warn!(path = %path_str, error = %e, "Could not parse LLM response");
                ReportAnalysis {
                    raw_llm_response: Some(raw),
                    ..ReportAnalysis::failed(path_str, e.to_string())
                }
            }
        }
    }
}

fn parsed_object(analysis: &ReportAnalysis) -> Option<&Map<String, Value>> {
    if !analysis.success {
        return None;
    }
    analysis.parsed_data.as_ref()?.as_object()
}

fn section<'a>(data: &'a Map<String, Value>, name: &str) -> Option<&'a Map<String, Value>> {
    data.get(name)?.as_object()
}

fn text_field(section: Option<&Map<String, Value>>, key: &str) -> Option<String> {
    let value = section?.get(key)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    (!text.is_empty() && text != NOT_FOUND).then_some(text)
}

/// Business description from the company section, with the management
/// discussion's 主要业务情况 standing in for a missing 主营业务.
pub fn extract_business_info(analysis: &ReportAnalysis) -> BusinessInfo {
    let Some(data) = parsed_object(analysis) else {
        return BusinessInfo::default();
    };
    let company = section(data, COMPANY_SECTION);
    let discussion = section(data, DISCUSSION_SECTION);

    BusinessInfo {
        main_business: text_field(company, "主营业务")
            .or_else(|| text_field(discussion, "主要业务情况")),
        industry: text_field(company, "所属行业"),
        main_products: text_field(company, "主要产品及用途"),
        business_model: text_field(company, "主要经营模式"),
    }
}

/// `1,234.5元` style amounts. Anything else is ignored.
fn parse_amount(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let cleaned = raw.replace([',', '元'], "");
    let cleaned = cleaned.trim();
    Decimal::from_str(cleaned)
        .or_else(|_| Decimal::from_scientific(cleaned))
        .ok()
}

const INDICATOR_FIELDS: [(&str, &str); 4] = [
    ("营业收入", "revenue"),
    ("归属于上市公司股东的净利润", "net_profit"),
    ("资产总额", "total_assets"),
    ("归属于上市公司股东的净资产", "total_equity"),
];

/// Headline amounts from 主要财务指标 plus ROE and ROA where computable.
pub fn extract_financial_data(analysis: &ReportAnalysis) -> FinancialData {
    let mut data = FinancialData::default();
    let Some(indicators) = parsed_object(analysis).and_then(|d| section(d, INDICATOR_SECTION))
    else {
        return data;
    };

    for (source, key) in INDICATOR_FIELDS {
        if let Some(amount) = indicators.get(source).and_then(parse_amount) {
            data.key_indicators.insert(key.to_string(), amount);
        }
    }

    let ki = &data.key_indicators;
    let ratio = |numerator: &str, denominator: &str| {
        let n = ki.get(numerator)?;
        let d = ki.get(denominator)?;
        n.checked_div(*d)
    };
    let roe = ratio("net_profit", "total_equity");
    let roa = ratio("net_profit", "total_assets");
    if let Some(roe) = roe {
        data.financial_ratios.insert("roe".to_string(), roe);
    }
    if let Some(roa) = roa {
        data.financial_ratios.insert("roa".to_string(), roa);
    }
    data
}

/// Short description of a report for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReportSummary {
    pub company_name: String,
    pub stock_code: String,
    pub industry: String,
    pub core_competitiveness: String,
    pub future_outlook: String,
}

pub fn analysis_summary(analysis: &ReportAnalysis) -> ReportSummary {
    let Some(data) = parsed_object(analysis) else {
        return ReportSummary::default();
    };
    let company = section(data, COMPANY_SECTION);
    let discussion = section(data, DISCUSSION_SECTION);
    let field = |s: Option<&Map<String, Value>>, key: &str| text_field(s, key).unwrap_or_default();

    ReportSummary {
        company_name: field(company, "公司名称"),
        stock_code: field(company, "股票代码"),
        industry: field(company, "所属行业"),
        core_competitiveness: field(discussion, "核心竞争力"),
        future_outlook: field(discussion, "未来发展展望"),
    }
}
