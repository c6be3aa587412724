//! Property-based tests for the compilers, the field mapper and payload
//! decoding.
//!
//! Uses proptest to generate random predicates, key sets and malformed
//! payloads and verify the invariants hold and nothing panics.
//!
//! Run with: `cargo test --test proptest_fuzz`

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use serde_json::Value;

use manticore_builder::hydrate::{Document, FieldMapper, Hydrator};
use manticore_builder::query::{escape_sql_string, make_filter, MatchClause, Predicate, SqlCompiler};
use manticore_builder::{ResultPayload, SearchResponse, SqlMode};

// =============================================================================
// Strategies for generating test data
// =============================================================================

fn field_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

fn comparison_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["=", "==", "!=", "<>", ">", ">=", "<", "<="])
}

/// Generate arbitrary JSON values (including invalid structures)
fn arbitrary_json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        ".*".prop_map(Value::String),
    ];

    leaf.prop_recursive(
        4,  // depth
        64, // max nodes
        10, // items per collection
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..10).prop_map(Value::Array),
                prop::collection::hash_map("[_a-z]{1,8}", inner, 0..10)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    )
}

/// Expected SQL comparator for an operator symbol, positive or negated
fn comparator(symbol: &str, negated: bool) -> &'static str {
    match (symbol, negated) {
        ("=" | "==", false) | ("!=" | "<>", true) => "=",
        ("=" | "==", true) | ("!=" | "<>", false) => "<>",
        (">", false) | ("<=", true) => ">",
        (">", true) | ("<=", false) => "<=",
        (">=", false) | ("<", true) => ">=",
        (">=", true) | ("<", false) => "<",
        _ => unreachable!(),
    }
}

/// Remove backslash escape pairs, leaving only unescaped characters
fn strip_escapes(s: &str) -> String {
    let mut out = String::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

// =============================================================================
// SQL compiler
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Placing a predicate in MUST vs MUST_NOT yields exact logical negations.
    #[test]
    fn negation_flips_comparator(field in field_strategy(), symbol in comparison_strategy(), value in any::<i64>()) {
        let predicate = make_filter(field.as_str(), symbol, value).unwrap();

        let positive = SqlCompiler::predicate(&predicate, false);
        let negative = SqlCompiler::predicate(&predicate, true);

        prop_assert_eq!(positive, format!("`{}` {} {}", field, comparator(symbol, false), value));
        prop_assert_eq!(negative, format!("`{}` {} {}", field, comparator(symbol, true), value));
    }

    /// Negating twice is the identity.
    #[test]
    fn double_negation_is_identity(field in field_strategy(), symbol in comparison_strategy(), value in any::<i32>()) {
        let predicate = make_filter(field.as_str(), symbol, value).unwrap();
        prop_assert_eq!(
            SqlCompiler::predicate(&predicate.clone().negate(), true),
            SqlCompiler::predicate(&predicate, false)
        );
    }

    /// A negated BETWEEN is the OR of the flipped bounds, never an AND.
    #[test]
    fn negated_between_is_or(field in field_strategy(), low in any::<i64>(), high in any::<i64>()) {
        let predicate = Predicate::between(field.as_str(), low, high).unwrap();

        prop_assert_eq!(
            SqlCompiler::predicate(&predicate, false),
            format!("`{f}` >= {} AND `{f}` <= {}", low, high, f = field)
        );
        prop_assert_eq!(
            SqlCompiler::predicate(&predicate, true),
            format!("(`{f}` < {} OR `{f}` > {})", low, high, f = field)
        );
    }

    /// NOT IN is the negation of IN over the same list.
    #[test]
    fn negated_in(field in field_strategy(), values in prop::collection::vec(any::<i32>(), 1..6)) {
        let predicate = Predicate::is_in(field.as_str(), values.clone()).unwrap();
        let list = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");

        prop_assert_eq!(SqlCompiler::predicate(&predicate, false), format!("`{}` IN ({})", field, list));
        prop_assert_eq!(SqlCompiler::predicate(&predicate, true), format!("`{}` NOT IN ({})", field, list));
    }

    /// Keywords never break out of the quoted MATCH argument.
    #[test]
    fn match_keywords_stay_quoted(keywords in ".*") {
        let expr = SqlCompiler::match_expr(&MatchClause::any(keywords.as_str()));
        prop_assert!(expr.starts_with("MATCH('@* "));
        prop_assert!(expr.ends_with("')"));

        let inner = &expr["MATCH('".len()..expr.len() - "')".len()];
        prop_assert!(!strip_escapes(inner).contains('\''));
    }

    /// Escaped text literals contain no unescaped quote characters.
    #[test]
    fn escaped_literals_have_no_bare_quotes(text in ".*") {
        let escaped = escape_sql_string(&text);
        let bare = strip_escapes(&escaped);
        prop_assert!(!bare.contains('\''));
        prop_assert!(!bare.contains('"'));
    }
}

// =============================================================================
// Field mapper
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// No two source keys map to one attribute and no key maps twice.
    #[test]
    fn mapping_is_injective(
        keys in prop::collection::btree_set("[A-Za-z_]{1,8}", 0..12),
        attributes in prop::collection::vec("[A-Za-z_]{1,8}", 0..12),
        overrides in prop::collection::vec(("[A-Za-z_]{1,8}", "[a-z_]{1,8}"), 0..4),
    ) {
        let map = FieldMapper::build(keys.iter().map(String::as_str), "id", &attributes, &overrides);

        let mut sources = HashSet::new();
        let mut targets = HashSet::new();
        for (source, target) in map.iter() {
            prop_assert!(keys.contains(source));
            prop_assert!(sources.insert(source.to_string()), "source {} mapped twice", source);
            prop_assert!(targets.insert(target.to_string()), "target {} claimed twice", target);
        }
    }

    /// Keys already named like attributes map to themselves.
    #[test]
    fn mapping_is_idempotent(keys in prop::collection::btree_set("[a-z_]{1,8}", 1..12)) {
        let attributes: Vec<String> = keys.iter().cloned().collect();
        let map = FieldMapper::build(keys.iter().map(String::as_str), "id", &attributes, &[]);

        for key in &keys {
            prop_assert_eq!(map.resolve(key), key.as_str());
        }
    }

    /// Applying the correspondence never loses a mapped value.
    #[test]
    fn apply_keeps_one_entry_per_target(keys in prop::collection::btree_set("[A-Za-z]{1,6}", 0..10)) {
        let attributes: Vec<String> = keys.iter().map(|k| k.to_lowercase()).collect::<BTreeSet<_>>().into_iter().collect();
        let map = FieldMapper::build(keys.iter().map(String::as_str), "id", &attributes, &[]);

        let source = keys.iter().map(|k| (k.clone(), Value::String(k.clone()))).collect();
        let out = map.apply(source);
        for (source_key, target) in map.iter() {
            prop_assert_eq!(out.get(target), Some(&Value::String(source_key.to_string())));
        }
    }
}

// =============================================================================
// Payload decoding
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Arbitrary bytes decode to a value or a clean error.
    #[test]
    fn decoding_bytes_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = SearchResponse::from_slice(&bytes);
        let _ = ResultPayload::from_slice(&bytes, SqlMode::Array);
        let _ = ResultPayload::from_slice(&bytes, SqlMode::Object);
    }

    /// Arbitrary JSON hydrates without panicking.
    #[test]
    fn hydrating_arbitrary_json_never_panics(value in arbitrary_json_strategy()) {
        let prototype = Document::new("fuzz").with_fillable(["title", "created_at"]);
        let hydrator = Hydrator::new(&prototype);

        for mode in [SqlMode::Array, SqlMode::Object] {
            if let Ok(payload) = ResultPayload::from_value(value.clone(), mode) {
                let records = hydrator.hydrate(&payload);
                prop_assert!(records.iter().all(|r| r.exists));
            }
        }
    }
}
