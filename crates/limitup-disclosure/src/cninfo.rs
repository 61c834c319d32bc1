//! Client for the cninfo (巨潮资讯) announcement search and PDF downloads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use limitup_models::announcement::Announcement;
use limitup_models::config::DisclosureConfig;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::category::ReportCategory;
use crate::error::DisclosureError;
use crate::mapping::{hardcoded_stocks, parse_stock_list, Exchange, StockInfo};

const QUERY_PATH: &str = "/new/hisAnnouncement/query";
const SZSE_LIST_PATH: &str = "/new/data/szse_stock.json";
const SSE_LIST_PATH: &str = "/new/data/sse_stock.json";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
/// Responses smaller than this without a PDF content type are error pages.
const MIN_PDF_BYTES: usize = 1000;
const FORBIDDEN_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryForm<'a> {
    page_num: String,
    page_size: String,
    column: &'a str,
    tab_name: &'a str,
    stock: String,
    category: &'a str,
    se_date: String,
    searchkey: &'a str,
    plate: &'a str,
    trade: &'a str,
    sort_name: &'a str,
    sort_type: &'a str,
    #[serde(rename = "isHLtitle")]
    is_hl_title: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    announcements: Option<Vec<Option<RawAnnouncement>>>,
    #[serde(default)]
    totalpages: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnnouncement {
    #[serde(default)]
    announcement_title: Option<String>,
    #[serde(default)]
    sec_code: Option<String>,
    #[serde(default)]
    sec_name: Option<String>,
    /// Epoch milliseconds.
    #[serde(default)]
    announcement_time: Option<i64>,
    #[serde(default)]
    adjunct_url: Option<String>,
    #[serde(default)]
    adjunct_size: Option<u64>,
    #[serde(default)]
    adjunct_type: Option<String>,
    #[serde(default)]
    column_id: Option<serde_json::Value>,
}

/// Remove characters not allowed in file names and ensure a `.pdf` suffix.
pub fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !FORBIDDEN_FILENAME_CHARS.contains(c))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.ends_with(".pdf") {
        cleaned.to_string()
    } else {
        format!("{cleaned}.pdf")
    }
}

/// Titles come back with search-term highlighting when `isHLtitle` is set.
fn strip_highlight(title: &str) -> String {
    title.replace("<em>", "").replace("</em>", "")
}

/// Portal timestamps are midnight Beijing time.
fn format_announcement_date(millis: i64) -> String {
    let Some(offset) = FixedOffset::east_opt(8 * 3600) else {
        return String::new();
    };
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&offset).format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct CninfoClient {
    client: reqwest::Client,
    config: DisclosureConfig,
    stocks: HashMap<String, StockInfo>,
}

impl CninfoClient {
    fn http_client(config: &DisclosureConfig) -> Result<reqwest::Client, DisclosureError> {
        let base = config.base_url.trim_end_matches('/');
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        if let Ok(origin) = HeaderValue::from_str(base) {
            headers.insert(header::ORIGIN, origin);
        }
        if let Ok(referer) = HeaderValue::from_str(&format!("{base}/new/disclosure/stock")) {
            headers.insert(header::REFERER, referer);
        }

        Ok(reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?)
    }

    /// Build a client with a known stock mapping, skipping the portal's stock lists.
    pub fn with_mapping(
        config: DisclosureConfig,
        stocks: HashMap<String, StockInfo>,
    ) -> Result<Self, DisclosureError> {
        Ok(Self {
            client: Self::http_client(&config)?,
            config,
            stocks,
        })
    }

    /// Build a client and load the code-to-org-id mapping from the portal.
    ///
    /// Falls back to a small built-in table if the lists cannot be fetched.
    pub async fn connect(config: DisclosureConfig) -> Result<Self, DisclosureError> {
        let mut client = Self::with_mapping(config, HashMap::new())?;

        for (path, exchange) in [(SZSE_LIST_PATH, Exchange::Szse), (SSE_LIST_PATH, Exchange::Sse)] {
            match client.fetch_stock_list(path, exchange).await {
                Ok(stocks) => {
                    debug!(%exchange, count = stocks.len(), "Loaded stock list");
                    client
                        .stocks
                        .extend(stocks.into_iter().map(|s| (s.code.clone(), s)));
                }
                Err(e) => warn!(%exchange, error = %e, "Failed to load stock list"),
            }
        }

        if client.stocks.is_empty() {
            warn!("No stock mapping from portal, using built-in table");
            client.stocks = hardcoded_stocks();
        }
        info!(count = client.stocks.len(), "Stock mapping ready");
        Ok(client)
    }

    async fn fetch_stock_list(
        &self,
        path: &str,
        exchange: Exchange,
    ) -> Result<Vec<StockInfo>, DisclosureError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let body: serde_json::Value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(parse_stock_list(&body, exchange))
    }

    pub fn config(&self) -> &DisclosureConfig {
        &self.config
    }

    pub fn org_id(&self, stock_code: &str) -> Option<&str> {
        self.stocks.get(stock_code).map(|s| s.org_id.as_str())
    }

    pub fn stock_info(&self, stock_code: &str) -> Option<&StockInfo> {
        self.stocks.get(stock_code)
    }

    /// All mapped stocks, ordered by code.
    pub fn available_stocks(&self) -> Vec<&StockInfo> {
        let mut stocks: Vec<&StockInfo> = self.stocks.values().collect();
        stocks.sort_by(|a, b| a.code.cmp(&b.code));
        stocks
    }

    /// One page of announcements for a stock and the total page count.
    ///
    /// Dates are `YYYY-MM-DD`; they default to the year up to today.
    pub async fn query_announcements(
        &self,
        stock_code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        category: ReportCategory,
        page_num: u32,
        page_size: u32,
    ) -> Result<(Vec<Announcement>, u32), DisclosureError> {
        let Some(info) = self.stock_info(stock_code) else {
            warn!(stock_code, "No org id for stock code");
            return Ok((Vec::new(), 0));
        };

        let start = start_date
            .map(str::to_string)
            .unwrap_or_else(|| (today() - chrono::Duration::days(365)).format("%Y-%m-%d").to_string());
        let end = end_date
            .map(str::to_string)
            .unwrap_or_else(|| today().format("%Y-%m-%d").to_string());

        let form = QueryForm {
            page_num: page_num.to_string(),
            page_size: page_size.to_string(),
            column: info.exchange.column(),
            tab_name: "fulltext",
            stock: format!("{},{}", info.code, info.org_id),
            category: category.query_value(),
            se_date: format!("{start}~{end}"),
            searchkey: "",
            plate: "",
            trade: "",
            sort_name: "",
            sort_type: "",
            is_hl_title: "true",
        };

        debug!(stock_code, se_date = %form.se_date, %category, page_num, "Querying announcements");
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), QUERY_PATH);
        let response: QueryResponse = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let announcements: Vec<Announcement> = response
            .announcements
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|raw| self.to_announcement(raw))
            .collect();
        let total_pages = response.totalpages.unwrap_or(0);

        info!(stock_code, count = announcements.len(), total_pages, "Announcements found");
        Ok((announcements, total_pages))
    }

    fn to_announcement(&self, raw: RawAnnouncement) -> Announcement {
        let adjunct_url = raw.adjunct_url.unwrap_or_default();
        let pdf_url = if adjunct_url.is_empty() {
            String::new()
        } else {
            format!(
                "{}/{}",
                self.config.static_url.trim_end_matches('/'),
                adjunct_url.trim_start_matches('/')
            )
        };
        let column_id = raw.column_id.and_then(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });

        Announcement {
            title: strip_highlight(&raw.announcement_title.unwrap_or_default()),
            sec_code: raw.sec_code.unwrap_or_default(),
            sec_name: raw.sec_name.unwrap_or_default(),
            announcement_date: raw
                .announcement_time
                .map(format_announcement_date)
                .unwrap_or_default(),
            adjunct_url,
            adjunct_size: raw.adjunct_size,
            adjunct_type: raw.adjunct_type,
            column_id,
            pdf_url,
        }
    }

    /// Download a PDF into `{download_dir}/{stock_code}/{sanitized title}.pdf`.
    ///
    /// An existing file is returned as-is without a request.
    pub async fn download_pdf(
        &self,
        pdf_url: &str,
        title: &str,
        stock_code: Option<&str>,
    ) -> Result<PathBuf, DisclosureError> {
        let mut dir = PathBuf::from(&self.config.download_dir);
        if let Some(code) = stock_code {
            dir.push(code);
        }
        tokio::fs::create_dir_all(&dir).await?;

        let file_path = dir.join(sanitize_filename(title));
        if file_path.exists() {
            debug!(path = %file_path.display(), "File already downloaded");
            return Ok(file_path);
        }

        let response = self.client.get(pdf_url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();
        let bytes = response.bytes().await?;

        if !content_type.contains("pdf") && bytes.len() < MIN_PDF_BYTES {
            return Err(DisclosureError::NotPdf(file_path.display().to_string()));
        }

        tokio::fs::write(&file_path, &bytes).await?;
        info!(path = %file_path.display(), bytes = bytes.len(), "Downloaded PDF");
        Ok(file_path)
    }

    /// Download every announcement with an attachment from a list.
    async fn download_each(&self, stock_code: &str, announcements: &[Announcement]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for announcement in announcements.iter().filter(|a| !a.pdf_url.is_empty()) {
            match self
                .download_pdf(&announcement.pdf_url, &announcement.title, Some(stock_code))
                .await
            {
                Ok(path) => files.push(path),
                Err(e) => warn!(stock_code, title = %announcement.title, error = %e, "Download failed"),
            }
        }
        files
    }

    async fn pause(&self, millis: u64) {
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    /// Download one year's periodic reports of the given categories.
    ///
    /// A failing category is logged and skipped.
    pub async fn download_financial_reports(
        &self,
        stock_code: &str,
        year: i32,
        categories: &[ReportCategory],
    ) -> Vec<PathBuf> {
        let start = format!("{year}-01-01");
        let end = format!("{year}-12-31");
        let mut files = Vec::new();

        for category in categories {
            match self
                .query_announcements(
                    stock_code,
                    Some(&start),
                    Some(&end),
                    *category,
                    1,
                    self.config.page_size,
                )
                .await
            {
                Ok((announcements, _)) => {
                    files.extend(self.download_each(stock_code, &announcements).await);
                }
                Err(e) => warn!(stock_code, %category, error = %e, "Report query failed"),
            }
            self.pause(self.config.category_interval_ms).await;
        }

        info!(stock_code, year, count = files.len(), "Financial reports downloaded");
        files
    }

    /// Download every announcement in a date range, up to `max_pages` result pages.
    pub async fn download_all_announcements(
        &self,
        stock_code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        max_pages: u32,
    ) -> Result<Vec<PathBuf>, DisclosureError> {
        let page_size = self.config.page_size;
        let (first_page, total_pages) = self
            .query_announcements(stock_code, start_date, end_date, ReportCategory::All, 1, page_size)
            .await?;
        let pages = total_pages.min(max_pages);

        let mut files = Vec::new();
        for page in 1..=pages {
            let announcements = if page == 1 {
                first_page.clone()
            } else {
                match self
                    .query_announcements(stock_code, start_date, end_date, ReportCategory::All, page, page_size)
                    .await
                {
                    Ok((announcements, _)) => announcements,
                    Err(e) => {
                        warn!(stock_code, page, error = %e, "Page query failed");
                        break;
                    }
                }
            };
            files.extend(self.download_each(stock_code, &announcements).await);
            self.pause(self.config.page_interval_ms).await;
            debug!(stock_code, page, pages, "Page downloaded");
        }

        info!(stock_code, count = files.len(), "Bulk download complete");
        Ok(files)
    }

    /// Announcements whose title contains any keyword, ignoring case.
    pub async fn search_announcements_by_keyword(
        &self,
        stock_code: &str,
        keywords: &[&str],
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<Announcement>, DisclosureError> {
        let (announcements, _) = self
            .query_announcements(
                stock_code,
                start_date,
                end_date,
                ReportCategory::All,
                1,
                self.config.page_size,
            )
            .await?;
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        Ok(announcements
            .into_iter()
            .filter(|a| {
                let title = a.title.to_lowercase();
                keywords.iter().any(|k| title.contains(k.as_str()))
            })
            .collect())
    }

    pub fn download_dir(&self) -> &Path {
        Path::new(&self.config.download_dir)
    }
}
