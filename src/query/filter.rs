// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Filter model - single field predicates
//!
//! A [`Predicate`] is pure data: a field, a structural operator tag, an
//! operand and a negation flag. Operand shape is validated when the predicate
//! is built, so the compilers never see an operator they cannot render.
//!
//! # Example
//!
//! ```rust
//! use manticore_builder::query::{make_filter, Operator};
//!
//! let p = make_filter("countryiso", "!=", "PT").unwrap();
//! assert_eq!(p.operator(), Operator::Eq);
//! assert!(p.is_negated());
//!
//! assert!(make_filter("countryiso", "LIKE", "PT").is_err());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Scalar operand value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Whether the value is emitted unquoted in SQL.
    ///
    /// Text that reads as a plain decimal number counts as numeric, which is
    /// how the engine's own client treats string ids.
    pub fn is_numeric(&self) -> bool {
        match self {
            Scalar::Boolean(_) | Scalar::Integer(_) => true,
            Scalar::Float(f) => f.is_finite(),
            Scalar::Text(s) => looks_numeric(s),
        }
    }

    /// Render as an SQL literal (numeric bare, everything else quoted).
    pub fn to_sql_literal(&self) -> String {
        match self {
            Scalar::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(f) if f.is_finite() => f.to_string(),
            Scalar::Float(f) => format!("'{}'", f),
            Scalar::Text(s) if looks_numeric(s) => s.clone(),
            Scalar::Text(s) => format!("'{}'", escape_sql_string(s)),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Boolean(b) => serde_json::Value::Bool(*b),
            Scalar::Integer(n) => serde_json::Value::from(*n),
            Scalar::Float(f) => serde_json::Value::from(*f),
            Scalar::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<&String> for Scalar {
    fn from(v: &String) -> Self {
        Scalar::Text(v.clone())
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Boolean(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Integer(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Integer(v.into())
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Scalar::Integer(v.into())
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

/// Decimal number check used for SQL literal quoting.
fn looks_numeric(s: &str) -> bool {
    !s.is_empty()
        && s.chars().any(|c| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && s.parse::<f64>().is_ok()
}

/// Backslash-escape quotes, backslashes and NUL for a single-quoted literal.
pub fn escape_sql_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '\'' | '"' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\0' => escaped.push_str("\\0"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Filter operator (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Between,
    GeoDistance,
}

impl Operator {
    /// Parse a comparison operator symbol.
    ///
    /// Only the comparison symbols are accepted here; IN, BETWEEN and geo
    /// distance have dedicated builder methods.
    pub fn parse(symbol: &str) -> Result<Self, SearchError> {
        match symbol.trim().to_lowercase().as_str() {
            "=" | "==" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::Neq),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            _ => Err(SearchError::UnsupportedOperator(symbol.to_string())),
        }
    }

    /// Single range bound this operator compares with, if any
    pub fn range_bound(self) -> Option<RangeBound> {
        match self {
            Operator::Gt => Some(RangeBound::Gt),
            Operator::Gte => Some(RangeBound::Gte),
            Operator::Lt => Some(RangeBound::Lt),
            Operator::Lte => Some(RangeBound::Lte),
            _ => None,
        }
    }
}

/// One side of a range primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeBound {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeBound {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeBound::Gt => "gt",
            RangeBound::Gte => "gte",
            RangeBound::Lt => "lt",
            RangeBound::Lte => "lte",
        }
    }

    /// SQL comparator; negation flips to the complementary comparator.
    pub fn sql_symbol(self, negated: bool) -> &'static str {
        match (self, negated) {
            (RangeBound::Gte, false) => ">=",
            (RangeBound::Gte, true) => "<",
            (RangeBound::Lte, false) => "<=",
            (RangeBound::Lte, true) => ">",
            (RangeBound::Gt, false) => ">",
            (RangeBound::Gt, true) => "<=",
            (RangeBound::Lt, false) => "<",
            (RangeBound::Lt, true) => ">=",
        }
    }
}

/// Geo distance operand: anchor point and radius against a lat/lon attribute pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSpec {
    pub lat_field: String,
    pub lon_field: String,
    pub lat: f64,
    pub lon: f64,
    pub distance_meters: f64,
}

impl GeoSpec {
    /// `source` is the engine's location source: `"lat_attr,lon_attr"`.
    pub fn new(source: &str, lat: f64, lon: f64, distance_meters: f64) -> Result<Self, SearchError> {
        let parts: Vec<&str> = source.split(',').map(str::trim).collect();
        let (lat_field, lon_field) = match parts.as_slice() {
            [lat_field, lon_field] if !lat_field.is_empty() && !lon_field.is_empty() => {
                (lat_field.to_string(), lon_field.to_string())
            }
            _ => {
                return Err(SearchError::invalid_operand(
                    source,
                    "geo source must name a latitude and a longitude attribute",
                ))
            }
        };

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(SearchError::invalid_operand(source, "anchor point out of range"));
        }
        if !distance_meters.is_finite() || distance_meters < 0.0 {
            return Err(SearchError::invalid_operand(source, "distance must be a non-negative number"));
        }

        Ok(Self {
            lat_field,
            lon_field,
            lat,
            lon,
            distance_meters,
        })
    }

    pub fn source(&self) -> String {
        format!("{},{}", self.lat_field, self.lon_field)
    }
}

/// Predicate operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Scalar(Scalar),
    List(Vec<Scalar>),
    /// Ordered range bounds
    Range(Vec<(RangeBound, Scalar)>),
    Geo(GeoSpec),
}

/// A single filter condition.
///
/// `!=`/`<>` and NOT IN are stored with the positive tag (EQ, IN) and the
/// negation flag set; compilers combine the flag with placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: String,
    operator: Operator,
    operand: Operand,
    negated: bool,
}

impl Predicate {
    /// Build a predicate, validating that the operand fits the operator.
    pub fn new(field: impl Into<String>, operator: Operator, operand: Operand) -> Result<Self, SearchError> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(SearchError::invalid_operand(&field, "field name is empty"));
        }

        let (operator, negated) = match operator {
            Operator::Neq => (Operator::Eq, true),
            Operator::NotIn => (Operator::In, true),
            other => (other, false),
        };

        match (operator, &operand) {
            (Operator::Eq | Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte, Operand::Scalar(_)) => {}
            (Operator::In, Operand::List(_)) => {}
            (Operator::Between, Operand::Range(bounds)) => {
                if bounds.len() != 2 {
                    return Err(SearchError::invalid_operand(&field, "BETWEEN needs exactly two bounds"));
                }
            }
            (Operator::GeoDistance, Operand::Geo(_)) => {}
            (op, operand) => {
                return Err(SearchError::invalid_operand(
                    &field,
                    format!("{:?} cannot take operand {:?}", op, operand),
                ))
            }
        }

        Ok(Self {
            field,
            operator,
            operand,
            negated,
        })
    }

    pub fn between(field: impl Into<String>, low: impl Into<Scalar>, high: impl Into<Scalar>) -> Result<Self, SearchError> {
        Self::new(
            field,
            Operator::Between,
            Operand::Range(vec![(RangeBound::Gte, low.into()), (RangeBound::Lte, high.into())]),
        )
    }

    pub fn is_in<V: Into<Scalar>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Result<Self, SearchError> {
        Self::new(field, Operator::In, Operand::List(values.into_iter().map(Into::into).collect()))
    }

    pub fn geo_distance(source: &str, lat: f64, lon: f64, distance_meters: f64) -> Result<Self, SearchError> {
        let spec = GeoSpec::new(source, lat, lon, distance_meters)?;
        Self::new(source, Operator::GeoDistance, Operand::Geo(spec))
    }

    /// Flip the explicit negation flag.
    #[must_use]
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Structural operator tag (never `Neq`/`NotIn`)
    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }
}

/// Build a comparison predicate from an operator symbol.
///
/// Anything outside `= == != <> > >= < <=` fails with
/// [`SearchError::UnsupportedOperator`].
pub fn make_filter(field: impl Into<String>, operator: &str, value: impl Into<Scalar>) -> Result<Predicate, SearchError> {
    let operator = Operator::parse(operator)?;
    Predicate::new(field, operator, Operand::Scalar(value.into()))
}
