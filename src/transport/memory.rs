// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory transport for tests and demos.
//!
//! Serves canned responses and records every call so tests can assert on
//! the exact request or SQL text the builder produced.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::response::{ResultPayload, SearchResponse};
use super::traits::{SearchTransport, SqlMode};
use crate::error::SearchError;
use crate::query::SearchRequest;

/// One call observed by [`InMemoryTransport`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Search(SearchRequest),
    Sql { query: String, mode: SqlMode },
}

#[derive(Debug, Default)]
pub struct InMemoryTransport {
    search_response: Mutex<SearchResponse>,
    sql_response: Mutex<Value>,
    failure: Mutex<Option<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            sql_response: Mutex::new(Value::Array(Vec::new())),
            ..Default::default()
        }
    }

    pub fn with_search_response(self, response: SearchResponse) -> Self {
        *self.search_response.lock() = response;
        self
    }

    /// Raw JSON body served by the SQL endpoint, decoded per requested mode
    pub fn with_sql_response(self, body: Value) -> Self {
        *self.sql_response.lock() = body;
        self
    }

    /// Fail every call with a transport error
    pub fn failing(self, message: impl Into<String>) -> Self {
        *self.failure.lock() = Some(message.into());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().last().cloned()
    }

    fn check_failure(&self) -> Result<(), SearchError> {
        match self.failure.lock().as_ref() {
            Some(message) => Err(SearchError::Transport(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SearchTransport for InMemoryTransport {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        self.calls.lock().push(RecordedCall::Search(request.clone()));
        self.check_failure()?;
        Ok(self.search_response.lock().clone())
    }

    async fn sql(&self, query: &str, mode: SqlMode) -> Result<ResultPayload, SearchError> {
        self.calls.lock().push(RecordedCall::Sql {
            query: query.to_string(),
            mode,
        });
        self.check_failure()?;
        let body = self.sql_response.lock().clone();
        ResultPayload::from_value(body, mode)
    }
}
