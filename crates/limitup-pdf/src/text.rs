//! Plain-text extraction from PDF files.
//!
//! `pdf-extract` reads the whole document in one pass and copes with most
//! CJK font encodings. `lopdf` is the page-by-page fallback and backs the
//! page-oriented helpers.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::LazyLock;

use lopdf::Document;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::PdfError;

static PAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=== 第 \d+ 页 ===").expect("valid page marker regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// A line of a page that contains a search keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub page: u32,
    pub line: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Full text of a PDF.
    ///
    /// Fails with `NotFound` for a missing file and `AllMethodsFailed` when
    /// neither backend produces any text.
    pub fn extract_text(&self, path: &Path) -> Result<String, PdfError> {
        if !path.exists() {
            return Err(PdfError::NotFound(path.to_path_buf()));
        }

        let primary = self.extract_whole(path);
        self.with_fallback(path, primary)
    }

    /// Keep the primary text when it has content, else read page by page.
    fn with_fallback(&self, path: &Path, primary: Option<String>) -> Result<String, PdfError> {
        match primary {
            Some(text) if !text.trim().is_empty() => {
                info!(path = %path.display(), chars = text.chars().count(), "Extracted text with pdf-extract");
                return Ok(text);
            }
            _ => debug!(path = %path.display(), "pdf-extract produced nothing, trying lopdf"),
        }

        match self.extract_with_page_markers(path) {
            Ok(text) if !text.trim().is_empty() => {
                info!(path = %path.display(), chars = text.chars().count(), "Extracted text with lopdf");
                Ok(text)
            }
            Ok(_) => Err(PdfError::AllMethodsFailed(path.to_path_buf())),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "lopdf extraction failed");
                Err(PdfError::AllMethodsFailed(path.to_path_buf()))
            }
        }
    }

    fn extract_whole(&self, path: &Path) -> Option<String> {
        // pdf-extract panics on some malformed font tables.
        match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(path))) {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "pdf-extract failed");
                None
            }
            Err(_) => {
                warn!(path = %path.display(), "pdf-extract panicked");
                None
            }
        }
    }

    fn extract_with_page_markers(&self, path: &Path) -> Result<String, PdfError> {
        let pages = self.extract_text_by_pages(path, 1, None)?;
        let mut text = String::new();
        for (page, page_text) in pages {
            text.push_str(&format!("=== 第 {page} 页 ===\n"));
            text.push_str(&page_text);
            text.push_str("\n\n");
        }
        Ok(text)
    }

    /// Text of pages `start..=end` (1-based, clamped to the document).
    ///
    /// Pages that fail to decode or are blank are left out of the map.
    pub fn extract_text_by_pages(
        &self,
        path: &Path,
        start: u32,
        end: Option<u32>,
    ) -> Result<BTreeMap<u32, String>, PdfError> {
        if !path.exists() {
            return Err(PdfError::NotFound(path.to_path_buf()));
        }
        let doc = Document::load(path)?;
        let total = doc.get_pages().len() as u32;
        let start = start.max(1);
        let end = end.unwrap_or(total).min(total);

        let mut pages = BTreeMap::new();
        for page in start..=end {
            match doc.extract_text(&[page]) {
                Ok(text) if !text.trim().is_empty() => {
                    pages.insert(page, text);
                }
                Ok(_) => {}
                Err(e) => debug!(page, error = %e, "Page text extraction failed"),
            }
        }
        Ok(pages)
    }

    /// Every non-blank line containing each keyword, with its page number.
    pub fn search_text(
        &self,
        path: &Path,
        keywords: &[&str],
        case_sensitive: bool,
    ) -> Result<BTreeMap<String, Vec<SearchHit>>, PdfError> {
        let pages = self.extract_text_by_pages(path, 1, None)?;
        Ok(search_pages(&pages, keywords, case_sensitive))
    }
}

pub(crate) fn search_pages(
    pages: &BTreeMap<u32, String>,
    keywords: &[&str],
    case_sensitive: bool,
) -> BTreeMap<String, Vec<SearchHit>> {
    let mut results: BTreeMap<String, Vec<SearchHit>> = keywords
        .iter()
        .map(|k| (k.to_string(), Vec::new()))
        .collect();

    for (&page, text) in pages {
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let haystack = if case_sensitive {
                line.to_string()
            } else {
                line.to_lowercase()
            };
            for keyword in keywords {
                let needle = if case_sensitive {
                    keyword.to_string()
                } else {
                    keyword.to_lowercase()
                };
                if haystack.contains(&needle) {
                    if let Some(hits) = results.get_mut(*keyword) {
                        hits.push(SearchHit {
                            page,
                            line: line.to_string(),
                        });
                    }
                }
            }
        }
    }
    results
}

/// Content after each header up to the next header in the list.
///
/// Headers not present in the text are omitted. The last header runs to
/// the end of the text.
pub fn extract_sections_by_headers(text: &str, headers: &[&str]) -> BTreeMap<String, String> {
    let mut sections = BTreeMap::new();
    for (i, header) in headers.iter().enumerate() {
        let Some(found) = text.find(header) else {
            continue;
        };
        let start = found + header.len();
        let end = headers
            .get(i + 1)
            .and_then(|next| text[start..].find(next).map(|pos| start + pos))
            .unwrap_or(text.len());
        sections.insert(header.to_string(), text[start..end].trim().to_string());
    }
    sections
}

/// Drop page markers and collapse all whitespace runs to single spaces.
pub fn clean_text(text: &str) -> String {
    let without_markers = PAGE_MARKER.replace_all(text, " ");
    WHITESPACE
        .replace_all(&without_markers, " ")
        .trim()
        .to_string()
}

pub fn save_text(text: &str, path: &Path) -> Result<(), PdfError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    info!(path = %path.display(), "Saved text");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_text_pdf;

    #[test]
    fn missing_file_is_not_found() {
        let err = PdfTextExtractor::new()
            .extract_text(Path::new("/nonexistent/report.pdf"))
            .unwrap_err();
        assert!(matches!(err, PdfError::NotFound(_)));
    }

    #[test]
    fn garbage_file_fails_all_methods() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"<html>this is not a pdf</html>").unwrap();

        let err = PdfTextExtractor::new().extract_text(&path).unwrap_err();
        assert!(matches!(err, PdfError::AllMethodsFailed(_)));
    }

    fn two_page_pdf(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("report.pdf");
        write_text_pdf(&path, &["alpha revenue", "bravo profit"]).unwrap();
        path
    }

    #[test]
    fn extracts_text_from_generated_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = two_page_pdf(dir.path());

        let text = PdfTextExtractor::new().extract_text(&path).unwrap();
        assert!(text.contains("alpha"));
        assert!(text.contains("bravo"));
    }

    #[test]
    fn empty_primary_falls_back_to_marked_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = two_page_pdf(dir.path());
        let extractor = PdfTextExtractor::new();

        for primary in [None, Some("  \n".to_string())] {
            let text = extractor.with_fallback(&path, primary).unwrap();
            let first = text.find("=== 第 1 页 ===").unwrap();
            let second = text.find("=== 第 2 页 ===").unwrap();
            let alpha = text.find("alpha").unwrap();
            let bravo = text.find("bravo").unwrap();
            assert!(first < alpha && alpha < second && second < bravo);
        }

        let kept = extractor
            .with_fallback(&path, Some("primary text".to_string()))
            .unwrap();
        assert_eq!(kept, "primary text");
    }

    #[test]
    fn page_range_is_one_based_and_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = two_page_pdf(dir.path());
        let extractor = PdfTextExtractor::new();

        let all = extractor.extract_text_by_pages(&path, 0, Some(99)).unwrap();
        assert_eq!(all.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert!(all[&1].contains("alpha"));
        assert!(all[&2].contains("bravo"));

        let second = extractor.extract_text_by_pages(&path, 2, None).unwrap();
        assert_eq!(second.keys().copied().collect::<Vec<_>>(), vec![2]);

        let hits = extractor.search_text(&path, &["PROFIT"], false).unwrap();
        assert_eq!(hits["PROFIT"].len(), 1);
        assert_eq!(hits["PROFIT"][0].page, 2);
    }

    #[test]
    fn clean_text_strips_markers_and_whitespace() {
        let raw = "=== 第 1 页 ===\n公司简介\n\n\n  主要业务\t制造\n=== 第 2 页 ===\n结束";
        assert_eq!(clean_text(raw), "公司简介 主要业务 制造 结束");
    }

    #[test]
    fn sections_run_to_next_header() {
        let text = "目录\n重要提示 内容A\n公司简介 内容B\n管理层讨论 内容C";
        let sections = extract_sections_by_headers(text, &["公司简介", "管理层讨论", "不存在"]);
        assert_eq!(sections["公司简介"], "内容B");
        assert_eq!(sections["管理层讨论"], "内容C");
        assert!(!sections.contains_key("不存在"));
    }

    #[test]
    fn search_reports_page_and_line() {
        let pages = BTreeMap::from([
            (1, "Revenue grew\n营业收入 100".to_string()),
            (3, "净利润 20\nrevenue note".to_string()),
        ]);
        let hits = search_pages(&pages, &["revenue", "净利润"], false);
        assert_eq!(hits["revenue"].len(), 2);
        assert_eq!(hits["revenue"][1].page, 3);
        assert_eq!(hits["净利润"][0].line, "净利润 20");

        let strict = search_pages(&pages, &["revenue"], true);
        assert_eq!(strict["revenue"].len(), 1);
    }

    #[test]
    fn save_text_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.txt");
        save_text("内容", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "内容");
    }
}
