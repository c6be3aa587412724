// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Result payloads returned by the search engine.
//!
//! Two shapes reach the hydrator:
//!
//! ```text
//! Object hits   {"hits": {"total": 2, "hits": [{"_id": 7, "_source": {...}, "highlight": {...}}]},
//!                "aggregations": {"by_country": {"buckets": [{"key": "PT", "doc_count": 3}]}}}
//!
//! Array rows    {"hits": {"total": 2, "hits": [{"_id": 7, "_source": {...}}]}}
//!               [{"columns": [...], "data": [{"id": 7, "countryiso": "PT"}], "total": 1}]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::traits::SqlMode;
use crate::error::SearchError;

/// Accessors the hydrator needs from an object hit.
pub trait HitAccess {
    fn id(&self) -> Option<Value>;

    fn data(&self) -> Map<String, Value>;

    /// Highlight snippets; failures are treated as "no highlight".
    fn highlight(&self) -> Result<Option<Value>, SearchError> {
        Ok(None)
    }
}

/// One object hit
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id", default)]
    pub id: Option<Value>,
    #[serde(rename = "_score", default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Value>,
}

impl HitAccess for Hit {
    fn id(&self) -> Option<Value> {
        self.id.clone()
    }

    fn data(&self) -> Map<String, Value> {
        self.source.clone()
    }

    fn highlight(&self) -> Result<Option<Value>, SearchError> {
        Ok(self.highlight.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub key: Value,
    pub doc_count: u64,
}

/// Buckets for one named aggregation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Facet {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

/// Object-hit search response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResponse {
    pub total: u64,
    pub hits: Vec<Hit>,
    pub facets: BTreeMap<String, Facet>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    hits: WireHits,
    #[serde(default)]
    aggregations: BTreeMap<String, Facet>,
}

#[derive(Deserialize, Default)]
struct WireHits {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    hits: Vec<Hit>,
}

impl SearchResponse {
    pub fn from_json(value: Value) -> Result<Self, SearchError> {
        if let Some(message) = engine_error(&value) {
            return Err(SearchError::Transport(message));
        }
        if !value.is_object() {
            return Err(SearchError::MalformedPayload("expected an object hits payload".to_string()));
        }
        let wire: WireResponse = serde_json::from_value(value)?;
        Ok(Self {
            total: wire.hits.total,
            hits: wire.hits.hits,
            facets: wire.aggregations,
        })
    }

    /// Decode a response body; decode failure is fatal.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SearchError> {
        Self::from_json(serde_json::from_slice(bytes)?)
    }
}

/// Payload of an SQL execution
#[derive(Debug, Clone, PartialEq)]
pub enum ResultPayload {
    /// Object hits (`SqlMode::Object`)
    Hits(SearchResponse),
    /// Array-shaped payload (`SqlMode::Array`)
    Rows(Value),
}

impl ResultPayload {
    pub fn from_value(value: Value, mode: SqlMode) -> Result<Self, SearchError> {
        match mode {
            SqlMode::Object => Ok(ResultPayload::Hits(SearchResponse::from_json(value)?)),
            SqlMode::Array => {
                if let Some(message) = engine_error(&value) {
                    return Err(SearchError::Transport(message));
                }
                match &value {
                    Value::Object(_) | Value::Array(_) => Ok(ResultPayload::Rows(value)),
                    other => Err(SearchError::MalformedPayload(format!(
                        "expected an object or array payload, got {}",
                        other
                    ))),
                }
            }
        }
    }

    pub fn from_slice(bytes: &[u8], mode: SqlMode) -> Result<Self, SearchError> {
        Self::from_value(serde_json::from_slice(bytes)?, mode)
    }

    /// Total reported by the engine, if the payload carries one
    pub fn total(&self) -> Option<u64> {
        match self {
            ResultPayload::Hits(response) => Some(response.total),
            ResultPayload::Rows(value) => rows_total(value),
        }
    }

    /// Array-shaped entries, each an object with `_id`/`_source`.
    ///
    /// Tabular result sets (`[{"data": [rows]}]`) are normalised to
    /// `{"_source": row}` entries.
    pub fn entries(value: &Value) -> Vec<Value> {
        if let Some(hits) = value.pointer("/hits/hits").and_then(Value::as_array) {
            return hits.clone();
        }
        match value {
            Value::Array(sets) => sets
                .iter()
                .filter_map(|set| set.get("data").and_then(Value::as_array))
                .flatten()
                .map(|row| {
                    let mut entry = Map::new();
                    entry.insert("_source".to_string(), row.clone());
                    Value::Object(entry)
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn rows_total(value: &Value) -> Option<u64> {
    if let Some(total) = value.pointer("/hits/total").and_then(Value::as_u64) {
        return Some(total);
    }
    match value {
        Value::Array(sets) => {
            let totals: Vec<u64> = sets.iter().filter_map(|s| s.get("total").and_then(Value::as_u64)).collect();
            if totals.is_empty() {
                None
            } else {
                Some(totals.iter().sum())
            }
        }
        _ => None,
    }
}

/// Engine-level error object: `{"error": "..."}`
fn engine_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::String(message) if !message.is_empty() => Some(message.clone()),
        Value::Null => None,
        Value::String(_) => None,
        other => Some(other.to_string()),
    }
}
