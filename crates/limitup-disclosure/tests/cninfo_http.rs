//! HTTP-level tests for the cninfo client against a mock server.
//!
//! The mock server plays both the search endpoint and the static file host.

use std::collections::HashMap;

use limitup_disclosure::{
    CninfoClient, DisclosureError, DisclosureSource, Exchange, ReportCategory, StockInfo,
};
use limitup_models::config::DisclosureConfig;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, download_dir: &std::path::Path) -> DisclosureConfig {
    DisclosureConfig {
        base_url: server.uri(),
        static_url: server.uri(),
        download_dir: download_dir.display().to_string(),
        category_interval_ms: 0,
        page_interval_ms: 0,
        ..DisclosureConfig::default()
    }
}

fn mapping() -> HashMap<String, StockInfo> {
    let info = StockInfo {
        code: "000001".to_string(),
        org_id: "9900001915".to_string(),
        exchange: Exchange::Szse,
        name: "平安银行".to_string(),
    };
    HashMap::from([(info.code.clone(), info)])
}

fn pdf_body() -> Vec<u8> {
    let mut body = b"%PDF-1.4\n".to_vec();
    body.resize(2048, b' ');
    body
}

async fn mount_query(server: &MockServer, announcements: serde_json::Value, total_pages: u32) {
    Mock::given(method("POST"))
        .and(path("/new/hisAnnouncement/query"))
        .and(body_string_contains("stock=000001%2C9900001915"))
        .and(body_string_contains("column=szse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "announcements": announcements,
            "totalpages": total_pages,
            "hasMore": false
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn two_announcements_give_two_sanitized_downloads() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_query(
        &server,
        json!([
            {
                "announcementTitle": "2023年<em>年度</em>报告",
                "secCode": "000001",
                "secName": "平安银行",
                "announcementTime": 1_710_432_000_000_i64,
                "adjunctUrl": "finalpage/2024-03-15/1219340000.PDF",
                "adjunctSize": 2048,
                "adjunctType": "PDF"
            },
            {
                "announcementTitle": "2023年年度报告摘要: 附表/补充?",
                "secCode": "000001",
                "secName": "平安银行",
                "announcementTime": 1_710_432_000_000_i64,
                "adjunctUrl": "finalpage/2024-03-15/1219340001.PDF",
                "adjunctType": "PDF"
            }
        ]),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/finalpage/2024-03-15/1219340000.PDF"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(pdf_body()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/finalpage/2024-03-15/1219340001.PDF"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(pdf_body()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = CninfoClient::with_mapping(config_for(&server, dir.path()), mapping()).unwrap();
    let files = client
        .download_financial_reports("000001", 2024, &[ReportCategory::AnnualReport])
        .await;

    assert_eq!(files.len(), 2);
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names[0], "2023年年度报告.pdf");
    assert_eq!(names[1], "2023年年度报告摘要 附表补充.pdf");
    assert!(files.iter().all(|p| p.starts_with(dir.path().join("000001"))));
    assert!(files.iter().all(|p| p.exists()));
}

#[tokio::test]
async fn query_decodes_dates_and_urls() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_query(
        &server,
        json!([
            {
                "announcementTitle": "关于<em>中标</em>的公告",
                "secCode": "000001",
                "secName": "平安银行",
                "announcementTime": 1_710_432_000_000_i64,
                "adjunctUrl": "finalpage/2024-03-15/1.PDF",
                "columnId": "09020202"
            },
            null
        ]),
        4,
    )
    .await;

    let client = CninfoClient::with_mapping(config_for(&server, dir.path()), mapping()).unwrap();
    let (announcements, pages) = DisclosureSource::query_announcements(
        &client,
        "000001",
        Some("2024-01-01"),
        Some("2024-03-31"),
        ReportCategory::All,
        1,
        10,
    )
    .await
    .unwrap();

    assert_eq!(pages, 4);
    assert_eq!(announcements.len(), 1);
    let ann = &announcements[0];
    assert_eq!(ann.title, "关于中标的公告");
    assert_eq!(ann.announcement_date, "2024-03-15");
    assert_eq!(ann.pdf_url, format!("{}/finalpage/2024-03-15/1.PDF", server.uri()));
    assert_eq!(ann.column_id.as_deref(), Some("09020202"));
}

#[tokio::test]
async fn existing_file_is_not_downloaded_again() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("000001").join("已存在的报告.pdf");
    std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
    std::fs::write(&existing, b"%PDF-1.4 cached").unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf_body()))
        .expect(0)
        .mount(&server)
        .await;

    let client = CninfoClient::with_mapping(config_for(&server, dir.path()), mapping()).unwrap();
    let path = client
        .download_pdf(&format!("{}/x.PDF", server.uri()), "已存在的报告", Some("000001"))
        .await
        .unwrap();

    assert_eq!(path, existing);
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 cached");
}

#[tokio::test]
async fn small_non_pdf_response_is_rejected() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/missing.PDF"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>not found</html>"),
        )
        .mount(&server)
        .await;

    let client = CninfoClient::with_mapping(config_for(&server, dir.path()), mapping()).unwrap();
    let result = client
        .download_pdf(&format!("{}/missing.PDF", server.uri()), "缺失", None)
        .await;

    assert!(matches!(result, Err(DisclosureError::NotPdf(_))));
    assert!(!dir.path().join("缺失.pdf").exists());
}

#[tokio::test]
async fn bulk_download_stops_at_max_pages() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_query(
        &server,
        json!([{
            "announcementTitle": "董事会决议公告",
            "announcementTime": 1_710_432_000_000_i64,
            "adjunctUrl": "finalpage/a.PDF"
        }]),
        5,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/finalpage/a.PDF"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(pdf_body()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = CninfoClient::with_mapping(config_for(&server, dir.path()), mapping()).unwrap();
    let files = client
        .download_all_announcements("000001", None, None, 2)
        .await
        .unwrap();

    // Both pages return the same title, so the second one is served from disk.
    assert_eq!(files.len(), 2);
    let queries = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(queries, 2);
}

#[tokio::test]
async fn keyword_search_ignores_case() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_query(
        &server,
        json!([
            {"announcementTitle": "关于ESG报告的公告", "adjunctUrl": "a.PDF"},
            {"announcementTitle": "关于利润分配的公告", "adjunctUrl": "b.PDF"}
        ]),
        1,
    )
    .await;

    let client = CninfoClient::with_mapping(config_for(&server, dir.path()), mapping()).unwrap();
    let found = client
        .search_announcements_by_keyword("000001", &["esg"], None, None)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "关于ESG报告的公告");
}
