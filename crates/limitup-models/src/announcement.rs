use std::fmt;

use serde::{Deserialize, Serialize};

/// An announcement returned by the disclosure portal's search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Announcement {
    pub title: String,
    pub sec_code: String,
    pub sec_name: String,
    /// `YYYY-MM-DD`, empty when the portal sent no timestamp.
    pub announcement_date: String,
    pub adjunct_url: String,
    pub adjunct_size: Option<u64>,
    pub adjunct_type: Option<String>,
    pub column_id: Option<String>,
    /// Absolute download URL, empty when the announcement has no attachment.
    pub pdf_url: String,
}

/// Coarse announcement type derived from title keywords.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AnnouncementKind {
    #[serde(rename = "财务报告")]
    FinancialReport,
    #[serde(rename = "治理公告")]
    Governance,
    #[serde(rename = "业务公告")]
    Business,
    #[serde(rename = "投资公告")]
    Investment,
    #[serde(rename = "业绩公告")]
    Performance,
    #[serde(rename = "其他公告")]
    Other,
}

impl AnnouncementKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FinancialReport => "财务报告",
            Self::Governance => "治理公告",
            Self::Business => "业务公告",
            Self::Investment => "投资公告",
            Self::Performance => "业绩公告",
            Self::Other => "其他公告",
        }
    }
}

impl fmt::Display for AnnouncementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An announcement reduced to what the limit-up analysis needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedAnnouncement {
    pub title: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    pub is_positive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_as_label() {
        let json = serde_json::to_string(&AnnouncementKind::Business).unwrap();
        assert_eq!(json, "\"业务公告\"");
        let back: AnnouncementKind = serde_json::from_str("\"其他公告\"").unwrap();
        assert_eq!(back, AnnouncementKind::Other);
        assert_eq!(AnnouncementKind::Investment.to_string(), "投资公告");
    }

    #[test]
    fn classified_announcement_uses_type_key() {
        let ann = ClassifiedAnnouncement {
            title: "关于中标重大项目的公告".to_string(),
            date: "2024-12-18".to_string(),
            kind: AnnouncementKind::Business,
            is_positive: true,
        };
        let value = serde_json::to_value(&ann).unwrap();
        assert_eq!(value["type"], "业务公告");
        assert_eq!(value["is_positive"], true);
    }
}
