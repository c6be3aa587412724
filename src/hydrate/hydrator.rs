// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Hit → record hydration.
//!
//! # Pipeline
//!
//! ```text
//! hit ──→ identifier (_id → accessor → id)
//!     ──→ payload + {"id": identifier}          identifier overrides payload id
//!     ──→ FieldMapper::build / apply            source keys → attribute names
//!     ──→ id → primary key                      when the pk is still blank
//!     ──→ casts                                  datetime, boolean
//!     ──→ highlight (non-empty only)
//!     ──→ prototype.clone().fill(..), exists = true
//! ```
//!
//! Both payload shapes go through [`Hydrator::normalize`], so the same
//! logical hit yields the same record whichever shape carried it.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use super::field_map::FieldMapper;
use super::record::{is_blank, Cast, FieldValue, NormalizedRecord, Record};
use crate::transport::{HitAccess, ResultPayload};

pub struct Hydrator<'a, R: Record> {
    prototype: &'a R,
    primary_key: String,
    fillable: Vec<String>,
    overrides: Vec<(String, String)>,
    casts: Vec<(String, Cast)>,
}

impl<'a, R: Record> Hydrator<'a, R> {
    pub fn new(prototype: &'a R) -> Self {
        Self {
            prototype,
            primary_key: prototype.primary_key(),
            fillable: prototype.fillable(),
            overrides: prototype.attribute_map(),
            casts: prototype.casts(),
        }
    }

    pub fn hydrate(&self, payload: &ResultPayload) -> Vec<R> {
        match payload {
            ResultPayload::Hits(response) => self.hydrate_hits(&response.hits),
            ResultPayload::Rows(value) => self.hydrate_entries(value),
        }
    }

    /// Object hits exposing id/data/highlight accessors
    pub fn hydrate_hits<H: HitAccess>(&self, hits: &[H]) -> Vec<R> {
        let records: Vec<R> = hits
            .iter()
            .map(|hit| {
                let highlight = match hit.highlight() {
                    Ok(h) => h,
                    Err(e) => {
                        debug!(error = %e, "Ignoring unreadable highlight");
                        None
                    }
                };
                self.build(self.normalize(hit.id(), hit.data(), highlight))
            })
            .collect();
        debug!(count = records.len(), shape = "hits", "Hydrated records");
        records
    }

    /// Array payload: `hits.hits[]` entries or tabular result sets
    pub fn hydrate_entries(&self, payload: &Value) -> Vec<R> {
        let records: Vec<R> = ResultPayload::entries(payload)
            .into_iter()
            .map(|entry| {
                let id = ["_id", "id"].iter().find_map(|k| entry.get(*k).filter(|v| !is_blank(v)).cloned());
                let data = match entry.get("_source") {
                    Some(Value::Object(source)) => source.clone(),
                    _ => Map::new(),
                };
                let highlight = entry.get("highlight").cloned();
                self.build(self.normalize(id, data, highlight))
            })
            .collect();
        debug!(count = records.len(), shape = "rows", "Hydrated records");
        records
    }

    /// Map one hit's identifier and payload onto the record's attributes.
    pub fn normalize(&self, id: Option<Value>, data: Map<String, Value>, highlight: Option<Value>) -> NormalizedRecord {
        let mut raw = data;
        if let Some(id) = id.filter(|v| !is_blank(v)) {
            raw.insert("id".to_string(), id);
        }

        let keys: Vec<String> = raw.keys().cloned().collect();
        let correspondence = FieldMapper::build(
            keys.iter().map(String::as_str),
            &self.primary_key,
            &self.fillable,
            &self.overrides,
        );
        let mut mapped = correspondence.apply(raw);

        if self.primary_key != "id" {
            let pk_blank = mapped.get(&self.primary_key).map_or(true, is_blank);
            let id_filled = mapped.get("id").is_some_and(|v| !is_blank(v));
            if pk_blank && id_filled {
                if let Some(id) = mapped.remove("id") {
                    mapped.insert(self.primary_key.clone(), id);
                }
            }
        }

        let attributes = mapped
            .into_iter()
            .map(|(name, value)| {
                let cast = self.casts.iter().find(|(attr, _)| *attr == name).map(|(_, c)| *c);
                let value = apply_cast(cast, value);
                (name, value)
            })
            .collect();

        NormalizedRecord {
            attributes,
            highlight: highlight.filter(has_content),
        }
    }

    fn build(&self, normalized: NormalizedRecord) -> R {
        let mut record = self.prototype.clone();
        record.fill(normalized);
        record.set_exists(true);
        record
    }
}

fn apply_cast(cast: Option<Cast>, value: Value) -> FieldValue {
    match cast {
        Some(Cast::DateTime) => match timestamp(&value) {
            Some(ts) => FieldValue::Timestamp(ts),
            None => FieldValue::Value(value),
        },
        Some(Cast::Boolean) => match boolean(&value) {
            Some(b) => FieldValue::Value(Value::Bool(b)),
            None => FieldValue::Value(value),
        },
        _ => FieldValue::Value(value),
    }
}

/// Integer Unix seconds, as a number or an all-digit string
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let secs = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.parse::<i64>().ok()?,
        _ => return None,
    };
    DateTime::from_timestamp(secs, 0)
}

fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(m) => !m.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
