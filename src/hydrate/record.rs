// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Record contract: what a model type exposes to the hydrator.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::SearchError;
use crate::query::EagerLoad;

/// Declared attribute cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    /// 0/1 (number or string) become booleans
    Boolean,
    /// Integer Unix timestamps become UTC datetimes
    DateTime,
    /// Declared but not coerced by the hydrator
    Other,
}

impl Cast {
    /// `"datetime"`, `"immutable_datetime"`, `"datetime:Y-m-d"` all count as datetime.
    pub fn parse(declared: &str) -> Self {
        let declared = declared.trim().to_ascii_lowercase();
        if declared.contains("datetime") {
            Cast::DateTime
        } else if declared == "boolean" || declared == "bool" {
            Cast::Boolean
        } else {
            Cast::Other
        }
    }
}

/// Attribute value after hydration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Timestamp(DateTime<Utc>),
    Value(Value),
}

impl FieldValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Value(v) => Some(v),
            FieldValue::Timestamp(_) => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            FieldValue::Value(_) => None,
        }
    }

    /// Null or empty string
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Value(v) => is_blank(v),
            FieldValue::Timestamp(_) => false,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Value(v) => v.clone(),
            FieldValue::Timestamp(ts) => Value::String(ts.to_rfc3339()),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Value(v)
    }
}

pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Everything the hydrator hands a record in one go
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    pub attributes: BTreeMap<String, FieldValue>,
    /// Present only when the hit carried a non-empty highlight
    pub highlight: Option<Value>,
}

impl NormalizedRecord {
    pub fn get(&self, attribute: &str) -> Option<&FieldValue> {
        self.attributes.get(attribute)
    }
}

/// A model type the builder can hydrate.
///
/// Implementations are cloned from a prototype for every hit, then
/// force-filled (fillable lists are not enforced) and marked as existing.
#[async_trait]
pub trait Record: Clone + Send + Sync + 'static {
    /// Index names this record is searchable as
    fn searchable_as(&self) -> Vec<String>;

    fn primary_key(&self) -> String {
        "id".to_string()
    }

    /// Declared attribute names used as mapping candidates
    fn fillable(&self) -> Vec<String> {
        Vec::new()
    }

    /// Explicit source-key → attribute overrides, matched case-insensitively
    fn attribute_map(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn casts(&self) -> Vec<(String, Cast)> {
        Vec::new()
    }

    fn fill(&mut self, record: NormalizedRecord);

    fn set_exists(&mut self, exists: bool);

    /// Resolve eager-loaded relations for a batch of hydrated records.
    ///
    /// Only called with a non-empty batch.
    async fn load_relations(&self, _records: &mut [Self], _loads: &[EagerLoad]) -> Result<(), SearchError> {
        Ok(())
    }
}

/// Schemaless record configured at runtime.
///
/// ```
/// use manticore_builder::hydrate::{Cast, Document};
///
/// let prototype = Document::new("ttrentitytest")
///     .with_fillable(["countryiso", "created_at"])
///     .map_attribute("CountryISO", "countryiso")
///     .cast("created_at", Cast::DateTime);
/// assert_eq!(prototype.primary_key_name(), "id");
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    #[serde(skip)]
    index: Vec<String>,
    #[serde(skip)]
    primary_key: String,
    #[serde(skip)]
    fillable: Vec<String>,
    #[serde(skip)]
    attribute_map: Vec<(String, String)>,
    #[serde(skip)]
    casts: Vec<(String, Cast)>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Value>,
    #[serde(skip)]
    pub exists: bool,
}

impl Document {
    /// Document searchable as one or more comma-separated indexes
    pub fn new(index: &str) -> Self {
        Self {
            index: index.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
            primary_key: "id".to_string(),
            ..Default::default()
        }
    }

    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    pub fn with_fillable<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fillable = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn map_attribute(mut self, source: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.attribute_map.push((source.into(), attribute.into()));
        self
    }

    pub fn cast(mut self, attribute: impl Into<String>, cast: Cast) -> Self {
        self.casts.push((attribute.into(), cast));
        self
    }

    pub fn primary_key_name(&self) -> &str {
        if self.primary_key.is_empty() {
            "id"
        } else {
            &self.primary_key
        }
    }

    pub fn get(&self, attribute: &str) -> Option<&FieldValue> {
        self.attributes.get(attribute)
    }

    /// JSON value of an attribute; timestamps render as RFC 3339
    pub fn value(&self, attribute: &str) -> Option<Value> {
        self.attributes.get(attribute).map(FieldValue::to_json)
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<FieldValue>) {
        self.attributes.insert(attribute.into(), value.into());
    }
}

impl Record for Document {
    fn searchable_as(&self) -> Vec<String> {
        self.index.clone()
    }

    fn primary_key(&self) -> String {
        if self.primary_key.is_empty() {
            "id".to_string()
        } else {
            self.primary_key.clone()
        }
    }

    fn fillable(&self) -> Vec<String> {
        self.fillable.clone()
    }

    fn attribute_map(&self) -> Vec<(String, String)> {
        self.attribute_map.clone()
    }

    fn casts(&self) -> Vec<(String, Cast)> {
        self.casts.clone()
    }

    fn fill(&mut self, record: NormalizedRecord) {
        self.attributes.extend(record.attributes);
        self.highlight = record.highlight;
    }

    fn set_exists(&mut self, exists: bool) {
        self.exists = exists;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cast_parse() {
        assert_eq!(Cast::parse("datetime"), Cast::DateTime);
        assert_eq!(Cast::parse("immutable_datetime"), Cast::DateTime);
        assert_eq!(Cast::parse("datetime:Y-m-d"), Cast::DateTime);
        assert_eq!(Cast::parse("boolean"), Cast::Boolean);
        assert_eq!(Cast::parse("integer"), Cast::Other);
    }

    #[test]
    fn test_document_index_split() {
        let doc = Document::new("products, products_rt");
        assert_eq!(doc.searchable_as(), vec!["products".to_string(), "products_rt".to_string()]);
    }

    #[test]
    fn test_document_fill_and_serialize() {
        let mut doc = Document::new("idx");
        let mut record = NormalizedRecord::default();
        record.attributes.insert("id".into(), FieldValue::Value(json!(7)));
        record.attributes.insert("countryiso".into(), FieldValue::Value(json!("PT")));
        doc.fill(record);
        doc.set_exists(true);

        assert!(doc.exists);
        assert_eq!(doc.value(&doc.primary_key()), Some(json!(7)));
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({"countryiso": "PT", "id": 7}));
    }

    #[test]
    fn test_blank_values() {
        assert!(FieldValue::Value(Value::Null).is_blank());
        assert!(FieldValue::Value(json!("")).is_blank());
        assert!(!FieldValue::Value(json!(0)).is_blank());
    }
}
