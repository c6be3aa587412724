// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Unsupported operator [{0}]")]
    UnsupportedOperator(String),
    #[error("Invalid operand for '{field}': {reason}")]
    InvalidOperand {
        field: String,
        reason: String,
    },
    #[error("Facets are not supported in raw query mode")]
    FacetsInRawMode,
    #[error("Malformed search payload: {0}")]
    MalformedPayload(String),
    #[error("Search transport error: {0}")]
    Transport(String),
    #[error("Relation loading failed: {0}")]
    Relation(String),
}

impl SearchError {
    pub(crate) fn invalid_operand(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOperand {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedPayload(e.to_string())
    }
}
