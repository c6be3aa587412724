// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Model and Compilers
//!
//! One query model, two equivalent renderings.
//!
//! # Architecture
//!
//! ```text
//! QueryState (predicates, match clauses, options)
//!     ↓
//!     ├─→ StructuredCompiler → bool tree + options (native JSON search)
//!     └─→ SqlCompiler        → SELECT ... WHERE ... OPTION ... (SQL endpoint)
//! ```
//!
//! # Operators
//!
//! ```text
//! = ==        EQ
//! != <>       EQ, negated
//! > >= < <=   single-bound range
//! where_in      IN            where_not_in  IN, negated
//! where_between two-bound range (gte, lte)
//! where_geo_distance  distance from an anchor point
//! ```
//!
//! Negation is decided by placement (`must_not`) combined with the
//! predicate's own flag, never by a separate operator tag.

mod filter;
mod sql;
mod state;
mod structured;

pub use filter::{escape_sql_string, make_filter, GeoSpec, Operand, Operator, Predicate, RangeBound, Scalar};
pub use sql::{SqlCompiler, DEFAULT_PAGE_SIZE};
pub use state::{
    AggregationKind, AggregationSpec, Customizer, EagerLoad, MatchClause, QueryState, RawQuery, SortDirection,
    SortSpec, ANY_FIELD,
};
pub use structured::{BoolQuery, QueryNode, RequestOptions, SearchRequest, StructuredCompiler};
