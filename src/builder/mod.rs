// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Fluent search builder.
//!
//! Setters only append to [`QueryState`]; nothing compiles or executes
//! until one of the terminal operations in [`dispatch`] runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use manticore_builder::{Document, InMemoryTransport, ManticoreConfig, SearchBuilder, SearchError};
//!
//! # fn main() -> Result<(), SearchError> {
//! let transport = Arc::new(InMemoryTransport::new());
//! let mut builder = SearchBuilder::new(Document::new("ttrentitytest"), transport, ManticoreConfig::default());
//! builder
//!     .match_text("Portugal")
//!     .where_between("entityid", 1, 999_999_999)?
//!     .where_eq("countryiso", "PT")?
//!     .limit(1);
//!
//! assert!(builder.to_sql().contains("MATCH('@* Portugal')"));
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod types;

pub use dispatch::Dispatch;
pub use types::{Facets, Page, DEFAULT_PER_PAGE};

use std::sync::Arc;

use crate::config::ManticoreConfig;
use crate::error::SearchError;
use crate::hydrate::Record;
use crate::query::{
    make_filter, AggregationKind, AggregationSpec, EagerLoad, MatchClause, Predicate, QueryState, RawQuery, Scalar,
    SortDirection, SortSpec,
};
use crate::transport::{SearchTransport, SqlMode};

/// Fluent query builder bound to one record type and one transport.
///
/// Holds mutable state for a single logical request; use a fresh builder
/// per request.
pub struct SearchBuilder<R: Record> {
    model: R,
    transport: Arc<dyn SearchTransport>,
    config: ManticoreConfig,
    state: QueryState,
}

impl<R: Record> SearchBuilder<R> {
    pub fn new(model: R, transport: Arc<dyn SearchTransport>, config: ManticoreConfig) -> Self {
        Self {
            model,
            transport,
            config,
            state: QueryState::new(),
        }
    }

    /// Index names the record is searchable as, comma-joined
    pub fn index(&self) -> String {
        self.model.searchable_as().join(",")
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn model(&self) -> &R {
        &self.model
    }

    pub fn config(&self) -> &ManticoreConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════════
    // Predicates
    // ═══════════════════════════════════════════════════════════════════

    /// Append a pre-built predicate to the MUST list
    pub fn filter(&mut self, predicate: Predicate) -> &mut Self {
        self.state.must.push(predicate);
        self
    }

    pub fn where_eq(&mut self, field: &str, value: impl Into<Scalar>) -> Result<&mut Self, SearchError> {
        self.where_op(field, "=", value)
    }

    /// `where_op("price", ">=", 10)`; `!=`/`<>` add a negated equality
    pub fn where_op(&mut self, field: &str, operator: &str, value: impl Into<Scalar>) -> Result<&mut Self, SearchError> {
        let predicate = make_filter(field, operator, value)?;
        self.state.must.push(predicate);
        Ok(self)
    }

    pub fn or_where(&mut self, field: &str, value: impl Into<Scalar>) -> Result<&mut Self, SearchError> {
        self.or_where_op(field, "=", value)
    }

    pub fn or_where_op(&mut self, field: &str, operator: &str, value: impl Into<Scalar>) -> Result<&mut Self, SearchError> {
        let predicate = make_filter(field, operator, value)?;
        self.state.should.push(predicate);
        Ok(self)
    }

    pub fn where_not(&mut self, field: &str, value: impl Into<Scalar>) -> Result<&mut Self, SearchError> {
        self.where_not_op(field, "=", value)
    }

    pub fn where_not_op(&mut self, field: &str, operator: &str, value: impl Into<Scalar>) -> Result<&mut Self, SearchError> {
        let predicate = make_filter(field, operator, value)?;
        self.state.must_not.push(predicate);
        Ok(self)
    }

    pub fn where_in<V: Into<Scalar>>(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self, SearchError> {
        let predicate = Predicate::is_in(field, values)?;
        self.state.must.push(predicate);
        Ok(self)
    }

    pub fn where_not_in<V: Into<Scalar>>(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self, SearchError> {
        let predicate = Predicate::is_in(field, values)?.negate();
        self.state.must.push(predicate);
        Ok(self)
    }

    /// Inclusive range: `low <= field <= high`
    pub fn where_between(
        &mut self,
        field: &str,
        low: impl Into<Scalar>,
        high: impl Into<Scalar>,
    ) -> Result<&mut Self, SearchError> {
        let predicate = Predicate::between(field, low, high)?;
        self.state.must.push(predicate);
        Ok(self)
    }

    /// Within `distance_meters` of an anchor; `source` is `"lat_attr,lon_attr"`
    pub fn where_geo_distance(
        &mut self,
        source: &str,
        lat: f64,
        lon: f64,
        distance_meters: f64,
    ) -> Result<&mut Self, SearchError> {
        let predicate = Predicate::geo_distance(source, lat, lon, distance_meters)?;
        self.state.must.push(predicate);
        Ok(self)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Full-text
    // ═══════════════════════════════════════════════════════════════════

    /// Match keywords against all full-text fields
    pub fn match_text(&mut self, keywords: impl Into<String>) -> &mut Self {
        self.state.matches.push(MatchClause::any(keywords));
        self
    }

    pub fn match_field(&mut self, field: impl Into<String>, keywords: impl Into<String>) -> &mut Self {
        self.state.matches.push(MatchClause::on(field, keywords));
        self
    }

    // ═══════════════════════════════════════════════════════════════════
    // Options
    // ═══════════════════════════════════════════════════════════════════

    pub fn order_by(&mut self, field: impl Into<String>, direction: SortDirection) -> &mut Self {
        self.state.sort.push(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn order_by_desc(&mut self, field: impl Into<String>) -> &mut Self {
        self.order_by(field, SortDirection::Desc)
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.state.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.state.offset = Some(offset);
        self
    }

    pub fn max_matches(&mut self, max_matches: u64) -> &mut Self {
        self.state.max_matches = Some(max_matches);
        self
    }

    pub fn with_highlight(&mut self) -> &mut Self {
        self.state.highlight = true;
        self
    }

    /// Request terms buckets under `name`; re-registering a name replaces it
    pub fn aggregate(&mut self, name: impl Into<String>, field: impl Into<String>, size: Option<u64>) -> &mut Self {
        self.state.set_aggregation(
            name,
            AggregationSpec {
                field: field.into(),
                size,
                kind: AggregationKind::Terms,
            },
        );
        self
    }

    // ═══════════════════════════════════════════════════════════════════
    // Tabular clauses (force the SQL path)
    // ═══════════════════════════════════════════════════════════════════

    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.select.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn group_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Raw HAVING fragment. Emitted verbatim: never pass untrusted input.
    pub fn having(&mut self, condition: impl Into<String>) -> &mut Self {
        self.state.having.push(condition.into());
        self
    }

    /// Execute `sql` verbatim, ignoring every other setter
    pub fn raw_query(&mut self, sql: impl Into<String>, mode: SqlMode) -> &mut Self {
        self.state.raw = Some(RawQuery { sql: sql.into(), mode });
        self
    }

    // ═══════════════════════════════════════════════════════════════════
    // Eager loading
    // ═══════════════════════════════════════════════════════════════════

    pub fn with(&mut self, relation: impl Into<String>) -> &mut Self {
        self.state.eager.push(EagerLoad::relation(relation));
        self
    }

    /// Eager-load a relation restricted to `columns`
    pub fn with_columns<I, S>(&mut self, relation: impl Into<String>, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut load = EagerLoad::relation(relation);
        load.projection = Some(columns.into_iter().map(Into::into).collect());
        self.state.eager.push(load);
        self
    }

    /// Eager-load a relation whose query is customised by `scope`
    pub fn with_scope<F>(&mut self, relation: impl Into<String>, scope: F) -> &mut Self
    where
        F: Fn(&mut QueryState) + Send + Sync + 'static,
    {
        let mut load = EagerLoad::relation(relation);
        load.customizer = Some(Arc::new(scope));
        self.state.eager.push(load);
        self
    }

    // ═══════════════════════════════════════════════════════════════════
    // Conditional building
    // ═══════════════════════════════════════════════════════════════════

    pub fn when<F>(&mut self, condition: bool, then: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        if condition {
            then(self);
        }
        self
    }

    pub fn when_else<F, G>(&mut self, condition: bool, then: F, otherwise: G) -> &mut Self
    where
        F: FnOnce(&mut Self),
        G: FnOnce(&mut Self),
    {
        if condition {
            then(self);
        } else {
            otherwise(self);
        }
        self
    }
}
