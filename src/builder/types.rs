// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::transport::{Bucket, Facet};

/// Default page size for [`paginate`](super::SearchBuilder::paginate)
pub const DEFAULT_PER_PAGE: u64 = 15;

/// One page of hydrated records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<R> {
    pub items: Vec<R>,
    /// Engine-reported total, or the item count when the path reports none
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
}

impl<R> Page<R> {
    pub fn last_page(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Facet buckets keyed by aggregation name
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Facets(BTreeMap<String, Facet>);

impl Facets {
    pub fn get(&self, name: &str) -> Option<&[Bucket]> {
        self.0.get(name).map(|f| f.buckets.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Facet> {
        self.0
    }
}

impl From<BTreeMap<String, Facet>> for Facets {
    fn from(facets: BTreeMap<String, Facet>) -> Self {
        Self(facets)
    }
}
