//! HTTP-level tests for the Tushare client against a mock server.
//!
//! Each test mounts the JSON body Tushare would return for one endpoint and
//! checks the request shape and the decoded rows.

use std::time::Duration;

use limitup_market::{MarketDataSource, MarketError, TushareClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> TushareClient {
    TushareClient::new("test-token", server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn daily_decodes_positional_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "api_name": "daily",
            "token": "test-token",
            "params": {"trade_date": "20241220"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "abc",
            "code": 0,
            "msg": "",
            "data": {
                "fields": ["ts_code", "trade_date", "open", "high", "low", "close",
                           "pre_close", "pct_chg", "vol", "amount"],
                "items": [
                    ["000001.SZ", "20241220", 10.0, 11.0, 9.9, 11.0, 10.0, 10.0, 2000000.0, 2100000.0],
                    ["600519.SH", "20241220", 1500.0, 1510.0, 1490.0, 1505.0, 1500.0, 0.33, 30000.0, 4500000.0]
                ],
                "has_more": false
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let bars = client.daily("20241220").await.unwrap();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].ts_code, "000001.SZ");
    assert_eq!(bars[0].pct_chg, Some(10.0));
    assert_eq!(bars[1].amount, Some(4500000.0));
}

#[tokio::test]
async fn trade_cal_accepts_integer_flags() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"api_name": "trade_cal"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "",
            "data": {
                "fields": ["exchange", "cal_date", "is_open"],
                "items": [["SSE", "20241221", 0], ["SSE", "20241220", 1]]
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let days = client.trade_cal("20241220", "20241221").await.unwrap();
    assert_eq!(days.len(), 2);
    assert!(!days[0].is_open);
    assert!(days[1].is_open);
}

#[tokio::test]
async fn nonzero_code_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 40101,
            "msg": "token invalid",
            "data": null
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.stock_basic().await.unwrap_err();
    match err {
        MarketError::Api { code, msg } => {
            assert_eq!(code, 40101);
            assert_eq!(msg, "token invalid");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn http_failure_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.daily_basic("20241220").await.unwrap_err();
    assert!(matches!(err, MarketError::Status { status: 502, .. }));
}

#[tokio::test]
async fn null_data_is_empty_table() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "msg": ""})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let bars = client.daily("20241221").await.unwrap();
    assert!(bars.is_empty());
}
