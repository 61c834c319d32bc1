use std::path::PathBuf;

use async_trait::async_trait;
use limitup_models::announcement::Announcement;

use crate::category::ReportCategory;
use crate::cninfo::CninfoClient;
use crate::error::DisclosureError;

/// The disclosure queries the stock analysis needs. Mockable for testing.
///
/// Dates are `YYYY-MM-DD` strings.
#[async_trait]
pub trait DisclosureSource: Send + Sync {
    async fn query_announcements(
        &self,
        stock_code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        category: ReportCategory,
        page_num: u32,
        page_size: u32,
    ) -> Result<(Vec<Announcement>, u32), DisclosureError>;

    /// Local paths of the reports that were downloaded (or already present).
    async fn download_financial_reports(
        &self,
        stock_code: &str,
        year: i32,
        categories: &[ReportCategory],
    ) -> Vec<PathBuf>;
}

#[async_trait]
impl DisclosureSource for CninfoClient {
    async fn query_announcements(
        &self,
        stock_code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        category: ReportCategory,
        page_num: u32,
        page_size: u32,
    ) -> Result<(Vec<Announcement>, u32), DisclosureError> {
        CninfoClient::query_announcements(
            self, stock_code, start_date, end_date, category, page_num, page_size,
        )
        .await
    }

    async fn download_financial_reports(
        &self,
        stock_code: &str,
        year: i32,
        categories: &[ReportCategory],
    ) -> Vec<PathBuf> {
        CninfoClient::download_financial_reports(self, stock_code, year, categories).await
    }
}
