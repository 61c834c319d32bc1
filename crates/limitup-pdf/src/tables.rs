//! Table detection on extracted page text.
//!
//! Statement tables in A-share reports come out of text extraction as lines
//! whose cells are separated by wide gaps. A run of such lines is treated as
//! one table whose first line is the header.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::PdfError;
use crate::text::PdfTextExtractor;

static CELL_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+|\s{2,}").expect("valid cell gap regex"));
static UNIT_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)单位|币种|currency|unit").expect("valid unit regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// 1-based page the table was found on.
    pub page: u32,
    /// Position of the table on its page.
    pub index: usize,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// All header and body cells joined by spaces, for keyword matching.
    pub fn text(&self) -> String {
        self.header
            .iter()
            .chain(self.rows.iter().flatten())
            .filter(|c| !c.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn contains_any(&self, keywords: &[&str]) -> bool {
        let text = self.text();
        keywords.iter().any(|k| text.contains(k))
    }

    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }
}

/// Kinds of financial statement tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
    EquityStatement,
}

impl StatementKind {
    pub const ALL: [StatementKind; 4] = [
        Self::BalanceSheet,
        Self::IncomeStatement,
        Self::CashFlow,
        Self::EquityStatement,
    ];

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::BalanceSheet => &["资产负债表", "合并资产负债表", "资产", "负债", "所有者权益"],
            Self::IncomeStatement => &["利润表", "合并利润表", "营业收入", "营业成本", "净利润"],
            Self::CashFlow => &["现金流量表", "合并现金流量表", "经营活动", "投资活动", "筹资活动"],
            Self::EquityStatement => &["所有者权益变动表", "股东权益变动表"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "balance_sheet",
            Self::IncomeStatement => "income_statement",
            Self::CashFlow => "cash_flow",
            Self::EquityStatement => "equity_statement",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn split_cells(line: &str) -> Vec<String> {
    CELL_GAP
        .split(line.trim())
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Tables found in one page of text.
///
/// A table is a run of consecutive lines with at least two cells each; runs
/// shorter than a header plus one data row are ignored.
pub fn detect_tables(page_text: &str, page: u32) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut run: Vec<Vec<String>> = Vec::new();

    let flush = |run: &mut Vec<Vec<String>>, tables: &mut Vec<Table>| {
        if run.len() >= 2 {
            let mut rows = std::mem::take(run);
            let header = rows.remove(0);
            tables.push(Table {
                page,
                index: tables.len(),
                header,
                rows,
            });
        } else {
            run.clear();
        }
    };

    for line in page_text.lines() {
        let cells = split_cells(line);
        if cells.len() >= 2 {
            run.push(cells);
        } else {
            flush(&mut run, &mut tables);
        }
    }
    flush(&mut run, &mut tables);
    tables
}

/// First table of each statement kind.
///
/// Each table is checked against the kinds in order and can only ever be
/// the candidate for the first kind it matches.
pub fn label_financial_tables(tables: &[Table]) -> BTreeMap<StatementKind, Table> {
    let mut labelled = BTreeMap::new();
    for table in tables {
        let text = table.text();
        let matched = StatementKind::ALL
            .iter()
            .find(|kind| kind.keywords().iter().any(|k| text.contains(k)));
        if let Some(kind) = matched {
            if !labelled.contains_key(kind) {
                debug!(%kind, page = table.page, rows = table.rows.len(), "Identified statement table");
                labelled.insert(*kind, table.clone());
            }
        }
    }
    labelled
}

fn strip_thousands(cell: &str) -> String {
    let candidate: String = cell.chars().filter(|c| *c != ',' && *c != '，').collect();
    if !candidate.is_empty() && candidate.parse::<f64>().is_ok() {
        candidate
    } else {
        cell.to_string()
    }
}

/// Drop blank rows and columns and unit/currency caption rows, and remove
/// thousands separators from numeric cells.
pub fn clean_table(table: &Table) -> Table {
    let width = table.width();
    let blank = |row: &Vec<String>, i: usize| row.get(i).map_or(true, |c| c.trim().is_empty());
    let keep_columns: Vec<usize> = (0..width)
        .filter(|&i| !(blank(&table.header, i) && table.rows.iter().all(|r| blank(r, i))))
        .collect();

    let project = |row: &Vec<String>| -> Vec<String> {
        keep_columns
            .iter()
            .map(|&i| row.get(i).map(|c| strip_thousands(c.trim())).unwrap_or_default())
            .collect()
    };

    let rows = table
        .rows
        .iter()
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .filter(|row| !row.iter().any(|c| UNIT_ROW.is_match(c)))
        .map(project)
        .collect();

    Table {
        page: table.page,
        index: table.index,
        header: project(&table.header),
        rows,
    }
}

/// The first table containing any keyword, cleaned.
pub fn find_table_by_keywords(tables: &[Table], keywords: &[&str]) -> Option<Table> {
    tables
        .iter()
        .find(|t| t.contains_any(keywords))
        .map(clean_table)
}

/// Write each table to `{dir}/{prefix}_{n}.csv` (1-based, UTF-8 with BOM).
pub fn save_tables_to_csv(
    tables: &[Table],
    dir: &Path,
    prefix: &str,
) -> Result<Vec<PathBuf>, PdfError> {
    std::fs::create_dir_all(dir)?;
    let mut saved = Vec::with_capacity(tables.len());
    for (i, table) in tables.iter().enumerate() {
        let path = dir.join(format!("{prefix}_{}.csv", i + 1));
        let mut file = std::fs::File::create(&path)?;
        std::io::Write::write_all(&mut file, "\u{feff}".as_bytes())?;
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
        writer.write_record(&table.header)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        saved.push(path);
    }
    info!(count = saved.len(), dir = %dir.display(), "Saved tables to CSV");
    Ok(saved)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTableExtractor {
    text: PdfTextExtractor,
}

impl PdfTableExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extract_tables(&self, path: &Path) -> Result<Vec<Table>, PdfError> {
        let pages = self.text.extract_text_by_pages(path, 1, None)?;
        let tables: Vec<Table> = pages
            .iter()
            .flat_map(|(&page, text)| detect_tables(text, page))
            .collect();
        info!(path = %path.display(), count = tables.len(), "Extracted tables");
        Ok(tables)
    }

    pub fn extract_financial_tables(
        &self,
        path: &Path,
    ) -> Result<BTreeMap<StatementKind, Table>, PdfError> {
        Ok(label_financial_tables(&self.extract_tables(path)?))
    }
}
