// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Source-key → attribute correspondence.
//!
//! # Resolution order
//!
//! ```text
//! 1. explicit overrides        (source key matched case-insensitively)
//! 2. primary key + fillable    each tried through NameVariant::ORDER,
//!                              first unclaimed source key wins
//! 3. literal `id`              → primary key, if both still unclaimed
//! ```
//!
//! A source key maps to at most one attribute and an attribute receives at
//! most one source key. Unmapped keys pass through under their own name.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value};

/// Spelling variants tried when matching an attribute to a source key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameVariant {
    Identity,
    Lowercase,
    /// `CountryISO` → `country_iso`
    SnakeCase,
    /// Non-alphanumerics stripped: `country-iso` → `countryiso`
    Alphanumeric,
}

impl NameVariant {
    pub const ORDER: [NameVariant; 4] = [
        NameVariant::Identity,
        NameVariant::Lowercase,
        NameVariant::SnakeCase,
        NameVariant::Alphanumeric,
    ];

    pub fn apply(self, name: &str) -> String {
        match self {
            NameVariant::Identity => name.to_string(),
            NameVariant::Lowercase => name.to_lowercase(),
            NameVariant::SnakeCase => snake_case(name),
            NameVariant::Alphanumeric => name.chars().filter(|c| c.is_alphanumeric()).collect(),
        }
    }
}

fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c == ' ' || c == '-' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Resolved mapping, in resolution order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldCorrespondence {
    pairs: Vec<(String, String)>,
}

impl FieldCorrespondence {
    pub fn target_of(&self, source: &str) -> Option<&str> {
        self.pairs.iter().find(|(s, _)| s == source).map(|(_, t)| t.as_str())
    }

    /// Target name, or the key itself when unmapped
    pub fn resolve<'a>(&'a self, source: &'a str) -> &'a str {
        self.target_of(source).unwrap_or(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Rename a payload. Unmapped keys are written first so a mapped key
    /// wins over a passthrough key with the same name.
    pub fn apply(&self, source: Map<String, Value>) -> BTreeMap<String, Value> {
        let mut mapped = Vec::new();
        let mut out = BTreeMap::new();
        for (key, value) in source {
            match self.target_of(&key) {
                Some(target) => mapped.push((target.to_string(), value)),
                None => {
                    out.insert(key, value);
                }
            }
        }
        out.extend(mapped);
        out
    }
}

pub struct FieldMapper;

impl FieldMapper {
    pub fn build<'a>(
        source_keys: impl IntoIterator<Item = &'a str>,
        primary_key: &str,
        attributes: &[String],
        overrides: &[(String, String)],
    ) -> FieldCorrespondence {
        let index = SourceIndex::new(source_keys);
        let mut claimed_sources: HashSet<String> = HashSet::new();
        let mut claimed_targets: HashSet<String> = HashSet::new();
        let mut pairs = Vec::new();

        let mut claim = |source: &str, target: &str, pairs: &mut Vec<(String, String)>| -> bool {
            if claimed_sources.contains(source) || claimed_targets.contains(target) {
                return false;
            }
            claimed_sources.insert(source.to_string());
            claimed_targets.insert(target.to_string());
            pairs.push((source.to_string(), target.to_string()));
            true
        };

        for (from, to) in overrides {
            if let Some(source) = index.lookup(from) {
                claim(source, to.as_str(), &mut pairs);
            }
        }

        let mut candidates: Vec<&str> = Vec::with_capacity(attributes.len() + 1);
        for name in std::iter::once(primary_key).chain(attributes.iter().map(String::as_str)) {
            if !name.is_empty() && !candidates.contains(&name) {
                candidates.push(name);
            }
        }

        for attribute in candidates {
            for variant in NameVariant::ORDER {
                let spelled = variant.apply(attribute);
                if spelled.is_empty() {
                    continue;
                }
                if let Some(source) = index.lookup(&spelled) {
                    if claim(source, attribute, &mut pairs) {
                        break;
                    }
                }
            }
        }

        if let Some(source) = index.lookup("id") {
            claim(source, primary_key, &mut pairs);
        }

        FieldCorrespondence { pairs }
    }
}

/// Exact then case-insensitive key lookup; the first key seen wins a
/// case-insensitive collision.
struct SourceIndex<'a> {
    exact: HashSet<&'a str>,
    folded: HashMap<String, &'a str>,
}

impl<'a> SourceIndex<'a> {
    fn new(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut exact = HashSet::new();
        let mut folded = HashMap::new();
        for key in keys {
            exact.insert(key);
            folded.entry(key.to_lowercase()).or_insert(key);
        }
        Self { exact, folded }
    }

    fn lookup(&self, name: &str) -> Option<&'a str> {
        if let Some(key) = self.exact.get(name) {
            return Some(*key);
        }
        self.folded.get(&name.to_lowercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_name_variants() {
        assert_eq!(NameVariant::Lowercase.apply("CountryISO"), "countryiso");
        assert_eq!(NameVariant::SnakeCase.apply("CountryISO"), "country_iso");
        assert_eq!(NameVariant::SnakeCase.apply("createdAt"), "created_at");
        assert_eq!(NameVariant::SnakeCase.apply("HTTPStatus"), "http_status");
        assert_eq!(NameVariant::Alphanumeric.apply("country-iso"), "countryiso");
    }

    #[test]
    fn test_override_is_case_insensitive() {
        let overrides = vec![("countryIso".to_string(), "countryiso".to_string())];
        let map = FieldMapper::build(["id", "CountryISO"], "id", &attrs(&["countryiso"]), &overrides);

        assert_eq!(map.target_of("CountryISO"), Some("countryiso"));
        assert_eq!(map.target_of("id"), Some("id"));
    }

    #[test]
    fn test_candidates_match_by_variant() {
        let map = FieldMapper::build(["EntityID", "CountryISO"], "entityid", &attrs(&["country_iso"]), &[]);

        assert_eq!(map.target_of("EntityID"), Some("entityid"));
        assert_eq!(map.target_of("CountryISO"), Some("country_iso"));
    }

    #[test]
    fn test_snake_case_candidate() {
        let map = FieldMapper::build(["CreatedAt"], "id", &attrs(&["created_at"]), &[]);
        assert_eq!(map.target_of("CreatedAt"), Some("created_at"));

        let map = FieldMapper::build(["created_at"], "id", &attrs(&["createdAt"]), &[]);
        assert_eq!(map.target_of("created_at"), Some("createdAt"));
    }

    #[test]
    fn test_first_seen_key_wins_collision() {
        let map = FieldMapper::build(["NAME", "Name"], "id", &attrs(&["name"]), &[]);
        assert_eq!(map.target_of("NAME"), Some("name"));
        assert_eq!(map.target_of("Name"), None);
    }

    #[test]
    fn test_exact_key_preferred() {
        let map = FieldMapper::build(["NAME", "name"], "id", &attrs(&["name"]), &[]);
        assert_eq!(map.target_of("name"), Some("name"));
    }

    #[test]
    fn test_id_forced_to_primary_key() {
        let map = FieldMapper::build(["id", "title"], "entity_id", &attrs(&["title"]), &[]);
        assert_eq!(map.target_of("id"), Some("entity_id"));
    }

    #[test]
    fn test_id_not_forced_when_pk_claimed() {
        let map = FieldMapper::build(["id", "entity_id"], "entity_id", &[], &[]);
        assert_eq!(map.target_of("entity_id"), Some("entity_id"));
        assert_eq!(map.target_of("id"), None);
    }

    #[test]
    fn test_override_target_not_reclaimed() {
        let overrides = vec![("Label".to_string(), "title".to_string())];
        let map = FieldMapper::build(["Label", "title"], "id", &attrs(&["title"]), &overrides);

        assert_eq!(map.target_of("Label"), Some("title"));
        assert_eq!(map.target_of("title"), None);
    }

    #[test]
    fn test_apply_mapped_keys_win() {
        let overrides = vec![("Label".to_string(), "title".to_string())];
        let map = FieldMapper::build(["Label", "title"], "id", &[], &overrides);

        let mut source = Map::new();
        source.insert("title".into(), json!("passthrough"));
        source.insert("Label".into(), json!("mapped"));
        let out = map.apply(source);

        assert_eq!(out.len(), 1);
        assert_eq!(out["title"], json!("mapped"));
    }

    #[test]
    fn test_unmapped_keys_pass_through() {
        let map = FieldMapper::build(["extra"], "id", &attrs(&["title"]), &[]);
        assert!(map.is_empty());
        assert_eq!(map.resolve("extra"), "extra");
    }
}
