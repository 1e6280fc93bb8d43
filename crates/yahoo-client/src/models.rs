//! Yahoo Finance quoteSummary response models.
//!
//! Module payloads are kept as raw JSON objects: each module is a flat map of
//! field name to either `{"raw": n, "fmt": "..."}`, an empty `{}`, a bare
//! number, or a string.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResponse {
    pub quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
pub struct QuoteSummary {
    #[serde(default)]
    pub result: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub error: Option<QuoteSummaryError>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteSummaryError {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// Modules requested, in precedence order for duplicate field names
pub const MODULES: &[&str] = &[
    "price",
    "summaryDetail",
    "financialData",
    "defaultKeyStatistics",
    "assetProfile",
];

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Object(obj) => obj.get("raw").and_then(Value::as_f64),
        _ => None,
    }
}

/// Flatten every numeric field across the requested modules into one map.
///
/// A field present in several modules keeps the value from the first module
/// in [`MODULES`] order.
pub fn flatten_modules(result: &Map<String, Value>) -> HashMap<String, f64> {
    let mut fields = HashMap::new();
    for module in MODULES {
        let Some(Value::Object(entries)) = result.get(*module) else {
            continue;
        };
        for (name, value) in entries {
            if let Some(n) = numeric(value) {
                fields.entry(name.clone()).or_insert(n);
            }
        }
    }
    fields
}

/// Sector label from `assetProfile`, if the provider has one
pub fn sector_label(result: &Map<String, Value>) -> Option<String> {
    result
        .get("assetProfile")
        .and_then(|profile| profile.get("sector"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
