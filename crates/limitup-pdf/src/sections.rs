//! Locating the two chapters of a periodic report that describe the business.

use std::sync::LazyLock;

use regex::Regex;

pub const COMPANY_PROFILE_SECTION: &str = "第二节_公司简介和主要财务指标";
pub const MANAGEMENT_DISCUSSION_SECTION: &str = "第三节_管理层讨论与分析";

static COMPANY_PROFILE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"公司[^\n]*?简介").expect("valid profile regex"));

/// From the first `start` marker up to (not including) the earliest of the
/// `stops` markers after it, or to the end of the text.
fn span_from<'a>(text: &'a str, start: usize, stops: &[&str]) -> &'a str {
    let rest = &text[start..];
    let end = stops
        .iter()
        .filter_map(|stop| rest.find(stop))
        // A stop at offset zero would only match the start marker itself.
        .filter(|&pos| pos > 0)
        .min()
        .unwrap_or(rest.len());
    &rest[..end]
}

fn chapter(text: &str, marker: &str, stops: &[&str]) -> Option<String> {
    text.find(marker)
        .map(|start| span_from(text, start, stops).to_string())
        .filter(|s| !s.trim().is_empty())
}

/// The company profile and management discussion chapters, in that order.
///
/// Standard reports number them 第二节 and 第三节. Reports without those
/// headings fall back to the first company profile heading and the first
/// mention of 管理层讨论. Chapters that cannot be found are omitted.
pub fn extract_target_sections(text: &str) -> Vec<(String, String)> {
    let profile = chapter(text, "第二节", &["第三节", "第四节"]).or_else(|| {
        COMPANY_PROFILE_HEADING
            .find(text)
            .map(|m| span_from(text, m.start(), &["管理层讨论", "第三节", "主要业务"]).to_string())
            .filter(|s| !s.trim().is_empty())
    });
    let discussion = chapter(text, "第三节", &["第四节", "第五节"])
        .or_else(|| chapter(text, "管理层讨论", &["第四节", "董事会"]));

    [
        (COMPANY_PROFILE_SECTION, profile),
        (MANAGEMENT_DISCUSSION_SECTION, discussion),
    ]
    .into_iter()
    .filter_map(|(name, content)| content.map(|c| (name.to_string(), c)))
    .collect()
}

/// Sections joined as `=== {name} ===\n{content}` blocks.
pub fn join_sections(sections: &[(String, String)]) -> String {
    sections
        .iter()
        .map(|(name, content)| format!("=== {name} ===\n{content}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}
