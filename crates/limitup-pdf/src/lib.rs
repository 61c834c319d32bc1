//! Text and table extraction from financial report PDFs.

pub mod error;
pub mod financial;
pub mod sections;
pub mod tables;
pub mod test_support;
pub mod text;

pub use error::PdfError;
pub use financial::{
    calculate_ratios, compare_reports, extract_company_info, extract_key_indicators,
    CompanyInfo, FinancialPdfAnalyzer, PdfAnalysis, ReportComparison, Trend,
};
pub use sections::{extract_target_sections, join_sections};
pub use tables::{
    clean_table, detect_tables, find_table_by_keywords, label_financial_tables,
    save_tables_to_csv, PdfTableExtractor, StatementKind, Table,
};
pub use text::{clean_text, extract_sections_by_headers, save_text, PdfTextExtractor, SearchHit};
