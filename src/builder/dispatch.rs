// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Execution dispatch and terminal operations.
//!
//! # Decision order
//!
//! ```text
//! raw query set              → Raw         executed verbatim, no compilation
//! group_by/having/select     → Sql         SqlCompiler, tabular hydration
//! otherwise                  → Structured  StructuredCompiler, object hits
//! ```
//!
//! Every derived operation (`first`, `count`, `pluck`, ...) goes through the
//! same [`Dispatch::plan`] as `get`, so none of them compiles differently.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{Facets, Page, DEFAULT_PER_PAGE};
use super::SearchBuilder;
use crate::config::ManticoreConfig;
use crate::error::SearchError;
use crate::hydrate::{Hydrator, Record};
use crate::metrics::{self, LatencyTimer};
use crate::query::{QueryState, RawQuery, SearchRequest, SqlCompiler, StructuredCompiler};
use crate::transport::SqlMode;

/// The single execution path chosen for a request
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Raw(RawQuery),
    Sql(String),
    Structured(SearchRequest),
}

impl Dispatch {
    pub fn plan(state: &QueryState, index: &str, config: &ManticoreConfig) -> Self {
        if let Some(raw) = &state.raw {
            return Dispatch::Raw(raw.clone());
        }
        if state.needs_tabular() {
            return Dispatch::Sql(SqlCompiler::compile(state, index, config));
        }
        Dispatch::Structured(StructuredCompiler::compile(state, index, config))
    }

    pub fn path(&self) -> &'static str {
        match self {
            Dispatch::Raw(_) => "raw",
            Dispatch::Sql(_) => "sql",
            Dispatch::Structured(_) => "structured",
        }
    }
}

/// Hydrated records plus the engine's total, when the path reports one
struct Fetched<R> {
    records: Vec<R>,
    total: Option<u64>,
}

impl<R: Record> SearchBuilder<R> {
    /// The path `get()` would take right now
    pub fn dispatch(&self) -> Dispatch {
        Dispatch::plan(&self.state, &self.index(), &self.config)
    }

    /// Compiled structured request, regardless of which path `get()` takes
    pub fn to_request(&self) -> SearchRequest {
        StructuredCompiler::compile(&self.state, &self.index(), &self.config)
    }

    /// SQL rendering of the structured request
    pub fn to_sql(&self) -> String {
        SqlCompiler::from_request(&self.to_request())
    }

    /// Full SQL statement including GROUP BY/HAVING/projection
    pub fn build_sql_query(&self) -> String {
        SqlCompiler::compile(&self.state, &self.index(), &self.config)
    }

    pub async fn get(&self) -> Result<Vec<R>, SearchError> {
        Ok(self.fetch(&self.state, "get").await?.records)
    }

    /// First record, fetched with `limit = 1`
    pub async fn first(&self) -> Result<Option<R>, SearchError> {
        let mut state = self.state.clone();
        state.limit = Some(1);
        Ok(self.fetch(&state, "first").await?.records.into_iter().next())
    }

    pub async fn last(&self) -> Result<Option<R>, SearchError> {
        Ok(self.fetch(&self.state, "last").await?.records.pop())
    }

    /// Number of records `get()` returns (not the engine-wide total)
    pub async fn count(&self) -> Result<usize, SearchError> {
        Ok(self.fetch(&self.state, "count").await?.records.len())
    }

    /// Fetch one page. `page` is 1-based; `per_page == 0` uses the default.
    pub async fn paginate(&self, per_page: u64, page: u64) -> Result<Page<R>, SearchError> {
        let per_page = if per_page == 0 { DEFAULT_PER_PAGE } else { per_page };
        let page = page.max(1);

        let mut state = self.state.clone();
        state.limit = Some(per_page);
        state.offset = Some((page - 1).saturating_mul(per_page));

        let fetched = self.fetch(&state, "paginate").await?;
        let total = fetched.total.unwrap_or(fetched.records.len() as u64);
        Ok(Page {
            items: fetched.records,
            total,
            per_page,
            current_page: page,
        })
    }

    /// Aggregation buckets for the registered `aggregate()` specs
    pub async fn get_facets(&self) -> Result<Facets, SearchError> {
        if self.state.raw.is_some() {
            return Err(SearchError::FacetsInRawMode);
        }
        metrics::record_facet_request(self.state.aggregations.len());

        let request = self.to_request();
        debug!(index = %request.index, aggregations = request.options.aggregations.len(), "Requesting facets");
        let _timer = LatencyTimer::new("structured", "facets");
        let response = match self.transport.search(&request).await {
            Ok(response) => {
                metrics::record_search_query("structured", "success");
                response
            }
            Err(e) => {
                metrics::record_search_query("structured", "error");
                warn!(error = %e, "Facet request failed");
                return Err(e);
            }
        };
        Ok(Facets::from(response.facets))
    }

    async fn fetch(&self, state: &QueryState, operation: &'static str) -> Result<Fetched<R>, SearchError> {
        let index = self.index();
        let dispatch = Dispatch::plan(state, &index, &self.config);
        let path = dispatch.path();
        let _timer = LatencyTimer::new(path, operation);
        let hydrator = Hydrator::new(&self.model);

        let result = match &dispatch {
            Dispatch::Raw(raw) => {
                debug!(sql = %raw.sql, mode = ?raw.mode, "Executing raw query");
                self.transport
                    .sql(&raw.sql, raw.mode)
                    .await
                    .map(|payload| (hydrator.hydrate(&payload), payload.total()))
            }
            Dispatch::Sql(sql) => {
                debug!(index = %index, sql = %sql, "Executing SQL query");
                self.transport
                    .sql(sql, SqlMode::Array)
                    .await
                    .map(|payload| (hydrator.hydrate(&payload), payload.total()))
            }
            Dispatch::Structured(request) => {
                debug!(index = %index, operation, "Executing structured search");
                self.transport
                    .search(request)
                    .await
                    .map(|response| (hydrator.hydrate_hits(&response.hits), Some(response.total)))
            }
        };

        let (mut records, total) = match result {
            Ok(fetched) => {
                metrics::record_search_query(path, "success");
                fetched
            }
            Err(e) => {
                metrics::record_search_query(path, "error");
                warn!(path, error = %e, "Search failed");
                return Err(e);
            }
        };
        metrics::record_search_results(path, records.len());

        self.load_relations(state, &mut records).await?;
        Ok(Fetched { records, total })
    }

    async fn load_relations(&self, state: &QueryState, records: &mut [R]) -> Result<(), SearchError> {
        let loads = state.eager_loads();
        if loads.is_empty() || records.is_empty() {
            return Ok(());
        }

        debug!(relations = loads.len(), records = records.len(), "Eager loading relations");
        let result = self.model.load_relations(records, &loads).await;
        metrics::record_relation_load(loads.len(), result.is_ok());
        result
    }
}

impl<R: Record + Serialize> SearchBuilder<R> {
    pub async fn to_array(&self) -> Result<Vec<Value>, SearchError> {
        let records = self.get().await?;
        records
            .iter()
            .map(|r| serde_json::to_value(r).map_err(SearchError::from))
            .collect()
    }

    pub async fn to_json(&self) -> Result<String, SearchError> {
        let records = self.get().await?;
        Ok(serde_json::to_string(&records)?)
    }

    /// One attribute from every record; missing attributes yield `null`
    pub async fn pluck(&self, field: &str) -> Result<Vec<Value>, SearchError> {
        Ok(self
            .to_array()
            .await?
            .into_iter()
            .map(|mut v| v.get_mut(field).map(Value::take).unwrap_or(Value::Null))
            .collect())
    }
}
