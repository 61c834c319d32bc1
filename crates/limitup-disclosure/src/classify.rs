//! Keyword classification of announcement titles.
//!
//! Both checks are plain substring membership. A title can match several
//! type lists; the first list in priority order decides the type.

use limitup_models::announcement::{Announcement, AnnouncementKind, ClassifiedAnnouncement};

/// Title keywords that mark an announcement as good news.
pub const POSITIVE_KEYWORDS: [&str; 18] = [
    "中标",
    "签约",
    "合作",
    "收购",
    "增资",
    "扩产",
    "新品",
    "专利",
    "政策支持",
    "补贴",
    "奖励",
    "业绩预增",
    "分红",
    "股权激励",
    "重组",
    "资产注入",
    "战略合作",
    "技术突破",
];

/// Type keyword lists in priority order.
const KIND_KEYWORDS: [(AnnouncementKind, &[&str]); 5] = [
    (AnnouncementKind::FinancialReport, &["年报", "季报", "中报", "财务"]),
    (AnnouncementKind::Governance, &["董事会", "股东大会", "决议"]),
    (AnnouncementKind::Business, &["中标", "合同", "签约"]),
    (AnnouncementKind::Investment, &["投资", "收购", "增资", "重组"]),
    (AnnouncementKind::Performance, &["业绩", "预告", "修正"]),
];

pub fn classify_kind(title: &str) -> AnnouncementKind {
    KIND_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| title.contains(k)))
        .map(|(kind, _)| *kind)
        .unwrap_or(AnnouncementKind::Other)
}

pub fn is_positive(title: &str) -> bool {
    POSITIVE_KEYWORDS.iter().any(|k| title.contains(k))
}

pub fn classify(announcement: &Announcement) -> ClassifiedAnnouncement {
    ClassifiedAnnouncement {
        title: announcement.title.clone(),
        date: announcement.announcement_date.clone(),
        kind: classify_kind(&announcement.title),
        is_positive: is_positive(&announcement.title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winning_bid_is_positive_business() {
        let title = "关于公司中标国家电网项目的公告";
        assert!(is_positive(title));
        assert_eq!(classify_kind(title), AnnouncementKind::Business);
    }

    #[test]
    fn plain_title_is_other_and_not_positive() {
        let title = "关于公司办公地址变更的公告";
        assert!(!is_positive(title));
        assert_eq!(classify_kind(title), AnnouncementKind::Other);
    }

    #[test]
    fn first_priority_category_wins() {
        // Matches both the financial report list (年报) and the governance list (董事会).
        assert_eq!(
            classify_kind("第八届董事会关于2023年年报的审核意见"),
            AnnouncementKind::FinancialReport
        );
        // Matches both investment (收购) and performance (业绩).
        assert_eq!(
            classify_kind("关于收购资产暨业绩承诺的公告"),
            AnnouncementKind::Investment
        );
    }

    #[test]
    fn kinds_for_each_list() {
        assert_eq!(classify_kind("2024年第一次临时股东大会决议公告"), AnnouncementKind::Governance);
        assert_eq!(classify_kind("关于签订日常经营重大合同的公告"), AnnouncementKind::Business);
        assert_eq!(classify_kind("关于对外投资设立子公司的公告"), AnnouncementKind::Investment);
        assert_eq!(classify_kind("2024年度业绩预告"), AnnouncementKind::Performance);
    }

    #[test]
    fn classify_copies_title_and_date() {
        let ann = Announcement {
            title: "2024年度业绩预增公告".to_string(),
            announcement_date: "2025-01-20".to_string(),
            ..Announcement::default()
        };
        let classified = classify(&ann);
        assert_eq!(classified.date, "2025-01-20");
        assert_eq!(classified.kind, AnnouncementKind::Performance);
        assert!(classified.is_positive);
    }
}
