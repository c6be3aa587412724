// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query state accumulated by the fluent builder.
//!
//! Nothing here compiles or executes; the compilers in
//! [`structured`](super::structured) and [`sql`](super::sql) read it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::filter::Predicate;
use crate::config::ManticoreConfig;
use crate::transport::SqlMode;

/// Wildcard field for match clauses
pub const ANY_FIELD: &str = "*";

/// Full-text match clause: `MATCH('@field keywords')`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchClause {
    pub keywords: String,
    /// Field name or [`ANY_FIELD`]
    pub field: String,
}

impl MatchClause {
    /// Match keywords against every full-text field
    pub fn any(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            field: ANY_FIELD.to_string(),
        }
    }

    pub fn on(field: impl Into<String>, keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            field: field.into(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.field == ANY_FIELD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    /// Bucketed value counts
    #[default]
    Terms,
}

/// Named facet request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub field: String,
    pub size: Option<u64>,
    pub kind: AggregationKind,
}

/// Raw query override, executed verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuery {
    pub sql: String,
    pub mode: SqlMode,
}

/// Relation scope customizer, applied by the record's relation loader
pub type Customizer = Arc<dyn Fn(&mut QueryState) + Send + Sync>;

/// Eager-load registration: relation name plus optional projection/customizer
#[derive(Clone)]
pub struct EagerLoad {
    pub relation: String,
    pub projection: Option<Vec<String>>,
    pub customizer: Option<Customizer>,
}

impl EagerLoad {
    pub fn relation(name: impl Into<String>) -> Self {
        Self {
            relation: name.into(),
            projection: None,
            customizer: None,
        }
    }

    /// Apply the customizer (if any) to a fresh relation query state.
    pub fn scope(&self) -> QueryState {
        let mut state = QueryState::default();
        if let Some(columns) = &self.projection {
            state.select = columns.clone();
        }
        if let Some(customize) = &self.customizer {
            customize(&mut state);
        }
        state
    }
}

impl fmt::Debug for EagerLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EagerLoad")
            .field("relation", &self.relation)
            .field("projection", &self.projection)
            .field("customizer", &self.customizer.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Mutable accumulation of everything a search request needs.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    /// Full-text clauses, each ANDed into the predicate set
    pub matches: Vec<MatchClause>,
    pub must: Vec<Predicate>,
    pub should: Vec<Predicate>,
    pub must_not: Vec<Predicate>,
    pub sort: Vec<SortSpec>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Per-query override of the configured `max_matches`
    pub max_matches: Option<u64>,
    pub select: Vec<String>,
    pub group_by: Vec<String>,
    /// Raw HAVING fragments, AND-joined and never escaped
    pub having: Vec<String>,
    /// Named aggregations in registration order
    pub aggregations: Vec<(String, AggregationSpec)>,
    pub highlight: bool,
    pub eager: Vec<EagerLoad>,
    /// When set, every other field is ignored at dispatch
    pub raw: Option<RawQuery>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-query `max_matches` if set, else the configured default
    pub fn effective_max_matches(&self, config: &ManticoreConfig) -> Option<u64> {
        self.max_matches.or(config.max_matches)
    }

    /// GROUP BY, HAVING and projections only exist on the SQL path
    pub fn needs_tabular(&self) -> bool {
        !self.group_by.is_empty() || !self.having.is_empty() || !self.select.is_empty()
    }

    /// Insert or replace a named aggregation, keeping first-registration order
    pub fn set_aggregation(&mut self, name: impl Into<String>, spec: AggregationSpec) {
        let name = name.into();
        match self.aggregations.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = spec,
            None => self.aggregations.push((name, spec)),
        }
    }

    /// Eager loads de-duplicated by relation name (first registration wins).
    pub fn eager_loads(&self) -> Vec<EagerLoad> {
        let mut seen = std::collections::HashSet::new();
        self.eager
            .iter()
            .filter(|e| !e.relation.is_empty() && seen.insert(e.relation.as_str()))
            .cloned()
            .collect()
    }
}
