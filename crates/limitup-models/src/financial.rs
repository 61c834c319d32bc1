use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Business description pulled from an annual or interim report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BusinessInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_business: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_products: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_model: Option<String>,
}

impl BusinessInfo {
    /// Number of populated fields.
    pub fn len(&self) -> usize {
        [
            &self.main_business,
            &self.industry,
            &self.main_products,
            &self.business_model,
        ]
        .iter()
        .filter(|f| f.is_some())
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Headline figures and derived ratios from a report. Amounts are CNY.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FinancialData {
    #[serde(default)]
    pub key_indicators: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub financial_ratios: BTreeMap<String, Decimal>,
}

impl FinancialData {
    pub fn is_empty(&self) -> bool {
        self.key_indicators.is_empty() && self.financial_ratios.is_empty()
    }
}

/// Outcome of asking a language model to summarize one report PDF.
///
/// `parsed_data` holds whatever JSON object the model returned; only its
/// well-formedness is checked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportAnalysis {
    pub pdf_path: String,
    pub analyzed_at: DateTime<Utc>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_llm_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_data: Option<serde_json::Value>,
}

impl ReportAnalysis {
    pub fn failed(pdf_path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            pdf_path: pdf_path.into(),
            analyzed_at: Utc::now(),
            success: false,
            error: Some(error.into()),
            raw_llm_response: None,
            parsed_data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn business_info_counts_fields() {
        let mut info = BusinessInfo::default();
        assert!(info.is_empty());
        info.industry = Some("白酒".to_string());
        info.main_business = Some("白酒生产与销售".to_string());
        assert_eq!(info.len(), 2);

        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("main_products").is_none());
    }

    #[test]
    fn financial_data_decimals_serialize_as_strings() {
        let mut data = FinancialData::default();
        data.key_indicators
            .insert("revenue".to_string(), dec!(1234567.89));
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["key_indicators"]["revenue"], "1234567.89");

        let back: FinancialData = serde_json::from_value(json).unwrap();
        assert_eq!(back.key_indicators["revenue"], dec!(1234567.89));
    }

    #[test]
    fn failed_analysis_has_error() {
        let analysis = ReportAnalysis::failed("a.pdf", "no provider");
        assert!(!analysis.success);
        assert_eq!(analysis.error.as_deref(), Some("no provider"));
        assert!(analysis.parsed_data.is_none());
    }
}
