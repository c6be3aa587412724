// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Structured Compiler
//!
//! Turns [`QueryState`] into a boolean query tree plus execution options,
//! ready for the engine's native JSON search endpoint.
//!
//! # Request Shape
//!
//! ```text
//! {
//!   "index": "products",
//!   "query": {"bool": {
//!       "must":     [{"match": {"*": "Portugal"}}, {"equals": {"countryiso": "PT"}}],
//!       "should":   [{"range": {"price": {"gte": 10}}}],
//!       "must_not": [{"in": {"status": [1, 2]}}]
//!   }},
//!   "limit": 10, "offset": 0,
//!   "sort": [{"price": "desc"}],
//!   "highlight": {"fields": {"*": {}}},
//!   "aggs": {"by_country": {"terms": {"field": "countryiso", "size": 5}}},
//!   "options": {"max_matches": 1000}
//! }
//! ```
//!
//! GROUP BY, HAVING and projections are never consulted here; they only
//! exist on the SQL path.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use super::filter::{GeoSpec, Operand, Operator, Predicate, RangeBound, Scalar};
use super::state::{AggregationKind, AggregationSpec, MatchClause, QueryState, SortSpec};
use crate::config::ManticoreConfig;

/// Query tree node
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Exact value: `{"equals": {field: value}}`
    Equals { field: String, value: Scalar },
    /// Membership: `{"in": {field: [values]}}`
    In { field: String, values: Vec<Scalar> },
    /// One or two bounds: `{"range": {field: {"gte": a, "lte": b}}}`
    Range { field: String, bounds: Vec<(RangeBound, Scalar)> },
    /// Radius around an anchor point
    GeoDistance(GeoSpec),
    /// Full-text: `{"match": {field: keywords}}`
    Match(MatchClause),
    /// Nested boolean group
    Bool(BoolQuery),
}

impl QueryNode {
    pub fn to_json(&self) -> Value {
        match self {
            QueryNode::Equals { field, value } => json!({ "equals": { field.as_str(): value.to_json() } }),
            QueryNode::In { field, values } => {
                let values: Vec<Value> = values.iter().map(Scalar::to_json).collect();
                json!({ "in": { field.as_str(): values } })
            }
            QueryNode::Range { field, bounds } => {
                let mut spec = Map::new();
                for (bound, value) in bounds {
                    spec.insert(bound.as_str().to_string(), value.to_json());
                }
                json!({ "range": { field.as_str(): spec } })
            }
            QueryNode::GeoDistance(geo) => json!({
                "geo_distance": {
                    "location_anchor": { "lat": geo.lat, "lon": geo.lon },
                    "location_source": geo.source(),
                    "distance_type": "adaptive",
                    "distance": format!("{} m", geo.distance_meters),
                }
            }),
            QueryNode::Match(m) => json!({ "match": { m.field.as_str(): m.keywords } }),
            QueryNode::Bool(b) => json!({ "bool": b.to_json() }),
        }
    }
}

/// Boolean query: MUST (AND), SHOULD (OR among themselves), MUST_NOT
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoolQuery {
    pub must: Vec<QueryNode>,
    pub should: Vec<QueryNode>,
    pub must_not: Vec<QueryNode>,
}

impl BoolQuery {
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }

    /// Empty clause lists are omitted.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        for (key, nodes) in [("must", &self.must), ("should", &self.should), ("must_not", &self.must_not)] {
            if !nodes.is_empty() {
                body.insert(key.to_string(), Value::Array(nodes.iter().map(QueryNode::to_json).collect()));
            }
        }
        Value::Object(body)
    }
}

/// Execution options attached beside the query tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestOptions {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub sort: Vec<SortSpec>,
    pub highlight: bool,
    pub aggregations: Vec<(String, AggregationSpec)>,
    pub max_matches: Option<u64>,
}

/// Compiled structured search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Target index (comma-joined when several)
    pub index: String,
    pub query: BoolQuery,
    pub options: RequestOptions,
}

impl SearchRequest {
    /// JSON body for the engine's search endpoint
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("index".into(), Value::String(self.index.clone()));

        let query = if self.query.is_empty() {
            json!({ "match_all": {} })
        } else {
            json!({ "bool": self.query.to_json() })
        };
        body.insert("query".into(), query);

        let opts = &self.options;
        if let Some(limit) = opts.limit {
            body.insert("limit".into(), limit.into());
        }
        if let Some(offset) = opts.offset {
            body.insert("offset".into(), offset.into());
        }
        if !opts.sort.is_empty() {
            let sort: Vec<Value> = opts
                .sort
                .iter()
                .map(|s| json!({ s.field.as_str(): s.direction.as_str() }))
                .collect();
            body.insert("sort".into(), Value::Array(sort));
        }
        if opts.highlight {
            body.insert("highlight".into(), json!({ "fields": { "*": {} } }));
        }
        if !opts.aggregations.is_empty() {
            let mut aggs = Map::new();
            for (name, spec) in &opts.aggregations {
                let mut terms = Map::new();
                terms.insert("field".into(), Value::String(spec.field.clone()));
                if let Some(size) = spec.size {
                    terms.insert("size".into(), size.into());
                }
                let agg = match spec.kind {
                    AggregationKind::Terms => json!({ "terms": terms }),
                };
                aggs.insert(name.clone(), agg);
            }
            body.insert("aggs".into(), Value::Object(aggs));
        }
        if let Some(max) = opts.max_matches {
            body.insert("options".into(), json!({ "max_matches": max }));
        }

        Value::Object(body)
    }
}

impl Serialize for SearchRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Structured query compiler
pub struct StructuredCompiler;

impl StructuredCompiler {
    /// Compile query state into a native search request.
    pub fn compile(state: &QueryState, index: &str, config: &ManticoreConfig) -> SearchRequest {
        SearchRequest {
            index: index.to_string(),
            query: Self::bool_query(state),
            options: RequestOptions {
                limit: state.limit,
                offset: state.offset,
                sort: state.sort.clone(),
                highlight: state.highlight,
                aggregations: state.aggregations.clone(),
                max_matches: state.effective_max_matches(config),
            },
        }
    }

    /// Build the boolean tree. Negated predicates move to the opposite list;
    /// a negated SHOULD entry becomes a nested `bool.must_not` group.
    pub fn bool_query(state: &QueryState) -> BoolQuery {
        let mut query = BoolQuery::default();

        for m in &state.matches {
            query.must.push(QueryNode::Match(m.clone()));
        }

        for p in &state.must {
            if p.is_negated() {
                query.must_not.push(Self::node(p));
            } else {
                query.must.push(Self::node(p));
            }
        }

        for p in &state.should {
            if p.is_negated() {
                query.should.push(QueryNode::Bool(BoolQuery {
                    must_not: vec![Self::node(p)],
                    ..Default::default()
                }));
            } else {
                query.should.push(Self::node(p));
            }
        }

        for p in &state.must_not {
            if p.is_negated() {
                query.must.push(Self::node(p));
            } else {
                query.must_not.push(Self::node(p));
            }
        }

        query
    }

    /// Positive leaf for a predicate (negation flag ignored)
    pub fn node(predicate: &Predicate) -> QueryNode {
        let field = predicate.field().to_string();
        match (predicate.operator(), predicate.operand()) {
            (Operator::Eq, Operand::Scalar(value)) => QueryNode::Equals { field, value: value.clone() },
            (op @ (Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte), Operand::Scalar(value)) => {
                let bound = op.range_bound().unwrap_or(RangeBound::Gte);
                QueryNode::Range { field, bounds: vec![(bound, value.clone())] }
            }
            (Operator::In, Operand::List(values)) => QueryNode::In { field, values: values.clone() },
            (_, Operand::Range(bounds)) => QueryNode::Range { field, bounds: bounds.clone() },
            (_, Operand::Geo(geo)) => QueryNode::GeoDistance(geo.clone()),
            // Predicate::new rejects every other operator/operand pairing
            (_, Operand::Scalar(value)) => QueryNode::Equals { field, value: value.clone() },
            (_, Operand::List(values)) => QueryNode::In { field, values: values.clone() },
        }
    }
}
