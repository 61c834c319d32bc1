//! Stock code to cninfo organisation id mapping.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Szse,
    Sse,
}

impl Exchange {
    /// Value of the `column` form field.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Szse => "szse",
            Self::Sse => "sse",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockInfo {
    pub code: String,
    pub org_id: String,
    pub exchange: Exchange,
    pub name: String,
}

impl StockInfo {
    fn new(code: &str, org_id: &str, exchange: Exchange, name: &str) -> Self {
        Self {
            code: code.to_string(),
            org_id: org_id.to_string(),
            exchange,
            name: name.to_string(),
        }
    }
}

/// Used when the portal's stock lists cannot be loaded.
pub fn hardcoded_stocks() -> HashMap<String, StockInfo> {
    [
        StockInfo::new("000001", "9900001915", Exchange::Szse, "平安银行"),
        StockInfo::new("000002", "9900000088", Exchange::Szse, "万科A"),
        StockInfo::new("000858", "9900002306", Exchange::Szse, "五粮液"),
        StockInfo::new("002415", "9900006464", Exchange::Szse, "海康威视"),
        StockInfo::new("300059", "9900013208", Exchange::Szse, "东方财富"),
        StockInfo::new("600000", "9900000018", Exchange::Sse, "浦发银行"),
        StockInfo::new("600036", "9900000054", Exchange::Sse, "招商银行"),
        StockInfo::new("600519", "9900000657", Exchange::Sse, "贵州茅台"),
        StockInfo::new("600887", "9900000825", Exchange::Sse, "伊利股份"),
        StockInfo::new("601318", "9900001431", Exchange::Sse, "中国平安"),
    ]
    .into_iter()
    .map(|info| (info.code.clone(), info))
    .collect()
}

/// Parse one of the portal's stock list documents.
///
/// The body is either a bare list or an object with the list under some key
/// (`stockList` in practice). Entries without a code or org id are skipped.
pub fn parse_stock_list(body: &serde_json::Value, exchange: Exchange) -> Vec<StockInfo> {
    let list = match body {
        serde_json::Value::Array(items) => Some(items),
        serde_json::Value::Object(map) => map.values().find_map(|v| match v {
            serde_json::Value::Array(items) if !items.is_empty() => Some(items),
            _ => None,
        }),
        _ => None,
    };

    list.map(|items| {
        items
            .iter()
            .filter_map(|item| {
                let code = item.get("code")?.as_str()?;
                let org_id = item.get("orgId")?.as_str()?;
                if code.is_empty() || org_id.is_empty() {
                    return None;
                }
                let name = item.get("zwjc").and_then(|v| v.as_str()).unwrap_or_default();
                Some(StockInfo::new(code, org_id, exchange, name))
            })
            .collect()
    })
    .unwrap_or_default()
}
