// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Result hydration.
//!
//! - [`Record`]: model contract (index names, primary key, casts, relations)
//! - [`FieldMapper`]: payload keys → attribute names
//! - [`Hydrator`]: payload → records, for both result shapes

mod field_map;
mod hydrator;
mod record;

pub use field_map::{FieldCorrespondence, FieldMapper, NameVariant};
pub use hydrator::Hydrator;
pub use record::{Cast, Document, FieldValue, NormalizedRecord, Record};
