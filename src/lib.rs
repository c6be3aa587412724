//! # Manticore Builder
//!
//! A fluent query builder for a Manticore-style full-text search engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SearchBuilder                          │
//! │  • where_* / match_* / order_by / aggregate / with ...      │
//! │  • appends to QueryState, never compiles on its own         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                      (Dispatch::plan)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  raw query      → executed verbatim                         │
//! │  group/having   → SqlCompiler        → SELECT ... OPTION    │
//! │  otherwise      → StructuredCompiler → bool tree + options  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                    (SearchTransport, external)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Hydrator                             │
//! │  • identifier resolution, FieldMapper key renaming          │
//! │  • datetime/boolean casts, highlight, exists flag           │
//! │  • eager relations via Record::load_relations               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use manticore_builder::{Document, InMemoryTransport, ManticoreConfig, SearchBuilder, SearchError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SearchError> {
//!     let transport = Arc::new(InMemoryTransport::new());
//!     let model = Document::new("ttrentitytest")
//!         .with_fillable(["countryiso"])
//!         .map_attribute("CountryISO", "countryiso");
//!
//!     let mut builder = SearchBuilder::new(model, transport, ManticoreConfig::from_env());
//!     builder
//!         .match_text("Portugal")
//!         .where_eq("countryiso", "PT")?
//!         .limit(10);
//!
//!     for doc in builder.get().await? {
//!         println!("{:?}", doc.value("countryiso"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`builder`]: The fluent [`SearchBuilder`] and its terminal operations
//! - [`query`]: Filter model, query state, structured and SQL compilers
//! - [`hydrate`]: [`Record`] contract, field mapping, hydration
//! - [`transport`]: Execution collaborator trait and payload types
//! - [`config`]: [`ManticoreConfig`]

pub mod builder;
pub mod config;
pub mod error;
pub mod hydrate;
pub mod metrics;
pub mod query;
pub mod transport;

pub use builder::{Dispatch, Facets, Page, SearchBuilder};
pub use config::ManticoreConfig;
pub use error::SearchError;
pub use hydrate::{Cast, Document, FieldValue, Hydrator, NormalizedRecord, Record};
pub use crate::metrics::LatencyTimer;
pub use query::{make_filter, Operator, Predicate, QueryState, Scalar, SortDirection};
pub use transport::{InMemoryTransport, ResultPayload, SearchResponse, SearchTransport, SqlMode};
