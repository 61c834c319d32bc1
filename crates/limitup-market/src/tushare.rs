//! Tushare Pro HTTP client.
//!
//! Every endpoint is a POST of `{api_name, token, params, fields}` to the
//! same URL. Responses carry a column list plus positional rows:
//!
//! ```json
//! {"code": 0, "msg": "", "data": {"fields": ["ts_code", "close"], "items": [["000001.SZ", 10.5]]}}
//! ```

use std::time::Duration;

use limitup_models::config::MarketConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MarketError;

pub const TOKEN_ENV: &str = "TUSHARE_TOKEN";

#[derive(Debug, Serialize)]
struct TushareRequest<'a> {
    api_name: &'a str,
    token: &'a str,
    params: &'a serde_json::Value,
    fields: String,
}

#[derive(Debug, Deserialize)]
struct TushareResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<TushareTable>,
}

/// Column names plus positional rows, as returned by every endpoint.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TushareTable {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub items: Vec<Vec<serde_json::Value>>,
}

impl TushareTable {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Deserialize each row by pairing it with the column names.
    pub fn rows<T: DeserializeOwned>(&self) -> Result<Vec<T>, MarketError> {
        self.items
            .iter()
            .map(|item| {
                let object: serde_json::Map<String, serde_json::Value> = self
                    .fields
                    .iter()
                    .cloned()
                    .zip(item.iter().cloned())
                    .collect();
                serde_json::from_value(serde_json::Value::Object(object)).map_err(MarketError::from)
            })
            .collect()
    }
}

pub struct TushareClient {
    token: String,
    client: reqwest::Client,
    base_url: String,
}

impl TushareClient {
    pub fn new(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MarketError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            token: token.into(),
            client,
            base_url: base_url.into(),
        })
    }

    /// Build a client from `TUSHARE_TOKEN`. A missing or blank token is fatal.
    pub fn from_env(config: &MarketConfig) -> Result<Self, MarketError> {
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or(MarketError::MissingToken)?;
        Self::new(
            token,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Call one endpoint. `params` must be a JSON object.
    pub async fn call(
        &self,
        api_name: &str,
        params: serde_json::Value,
        fields: &[&str],
    ) -> Result<TushareTable, MarketError> {
        let request = TushareRequest {
            api_name,
            token: &self.token,
            params: &params,
            fields: fields.join(","),
        };

        debug!(api_name, "Calling Tushare");
        let response = self.client.post(&self.base_url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: TushareResponse = response.json().await?;
        if result.code != 0 {
            return Err(MarketError::Api {
                code: result.code,
                msg: result.msg.unwrap_or_default(),
            });
        }

        let table = result.data.unwrap_or_default();
        debug!(api_name, rows = table.len(), "Tushare call complete");
        Ok(table)
    }
}
