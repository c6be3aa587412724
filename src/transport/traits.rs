// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;

use super::response::{ResultPayload, SearchResponse};
use crate::error::SearchError;
use crate::query::SearchRequest;

/// Result shape requested from the SQL endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlMode {
    /// Array payload: `hits.hits[]` entries with `_id`/`_source`
    #[default]
    Array,
    /// Object hits with id/data/highlight accessors
    Object,
}

/// Network collaborator executing compiled requests.
///
/// Implementations own connection handling, timeouts and retries; the
/// builder calls each method at most once per operation and propagates
/// errors unchanged.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Execute a structured search request.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError>;

    /// Execute an SQL statement verbatim.
    async fn sql(&self, query: &str, mode: SqlMode) -> Result<ResultPayload, SearchError>;
}
