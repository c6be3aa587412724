// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Transport boundary.
//!
//! The builder never opens connections itself; it hands compiled
//! requests to a [`SearchTransport`] and hydrates whatever comes back.
//!
//! - [`SearchTransport`]: structured search + SQL execution
//! - [`ResultPayload`] / [`SearchResponse`]: decoded result shapes
//! - [`InMemoryTransport`]: canned responses, recorded calls

mod memory;
mod response;
mod traits;

pub use memory::{InMemoryTransport, RecordedCall};
pub use response::{Bucket, Facet, Hit, HitAccess, ResultPayload, SearchResponse};
pub use traits::{SearchTransport, SqlMode};
