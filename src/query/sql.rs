// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL Compiler
//!
//! Renders the same query model as SphinxQL text for the engine's SQL
//! endpoint. Values are inlined (the endpoint has no placeholders), so every
//! non-numeric operand is single-quoted and backslash-escaped and every field
//! identifier is backtick-quoted.
//!
//! # SQL Generated
//!
//! ```sql
//! SELECT <fields|*> FROM <index>
//!   WHERE MATCH('@* keywords') AND (`a` = 1 AND `b` >= 2) AND (`c` = 'x' OR `d` IN (1, 2)) AND `e` <> 3
//!   GROUP BY <fields> HAVING <raw fragments>
//!   ORDER BY `f` DESC LIMIT <offset>, <limit> OPTION max_matches=<n>
//! ```
//!
//! # Negation
//!
//! ```text
//! `f` = v          ->  `f` <> v
//! `f` IN (..)      ->  `f` NOT IN (..)
//! `f` >= a         ->  `f` < a            (gte<->lt, gt<->lte)
//! a <= f <= b      ->  (`f` < a OR `f` > b)
//! MATCH('...')     ->  NOT MATCH('...')
//! (group)          ->  NOT (group)
//! ```
//!
//! Clauses whose source list is empty are omitted entirely.

use super::filter::{escape_sql_string, Predicate, Scalar};
use super::state::{MatchClause, QueryState};
use super::structured::{BoolQuery, QueryNode, SearchRequest, StructuredCompiler};
use crate::config::ManticoreConfig;

/// Page size the engine applies when a request carries no limit
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// SQL compiler
pub struct SqlCompiler;

impl SqlCompiler {
    /// Full SELECT statement for a query state.
    pub fn compile(state: &QueryState, index: &str, config: &ManticoreConfig) -> String {
        let select = if state.select.is_empty() {
            "*".to_string()
        } else {
            state.select.join(", ")
        };

        let mut parts = vec![format!("SELECT {} FROM {}", select, index)];

        let clause = Self::where_clause(&state.must, &state.should, &state.must_not, &state.matches);
        if !clause.is_empty() {
            parts.push(format!("WHERE {}", clause));
        }
        if !state.group_by.is_empty() {
            parts.push(format!("GROUP BY {}", state.group_by.join(", ")));
        }
        if !state.having.is_empty() {
            // Caller-supplied fragments, passed through unescaped
            parts.push(format!("HAVING {}", state.having.join(" AND ")));
        }
        if let Some(order) = Self::order_by_clause(&state.sort) {
            parts.push(order);
        }
        if let Some(limit) = Self::limit_clause(state.limit, state.offset) {
            parts.push(limit);
        }
        if let Some(option) = Self::option_clause(state.effective_max_matches(config)) {
            parts.push(option);
        }

        parts.join(" ")
    }

    /// Render a compiled structured request as SQL.
    ///
    /// The LIMIT clause is always present, defaulting to `0, 20`.
    pub fn from_request(request: &SearchRequest) -> String {
        let mut parts = vec![format!("SELECT * FROM {}", request.index)];

        let clause = Self::bool_clause(&request.query);
        if !clause.is_empty() {
            parts.push(format!("WHERE {}", clause));
        }
        if let Some(order) = Self::order_by_clause(&request.options.sort) {
            parts.push(order);
        }
        parts.push(format!(
            "LIMIT {}, {}",
            request.options.offset.unwrap_or(0),
            request.options.limit.unwrap_or(DEFAULT_PAGE_SIZE)
        ));
        if let Some(option) = Self::option_clause(request.options.max_matches) {
            parts.push(option);
        }

        parts.join(" ")
    }

    /// WHERE body (without the keyword) for must/should/must-not/match lists.
    ///
    /// Returns an empty string when every list is empty.
    pub fn where_clause(
        must: &[Predicate],
        should: &[Predicate],
        must_not: &[Predicate],
        matches: &[MatchClause],
    ) -> String {
        Self::join_groups(
            matches.iter().map(Self::match_expr).collect(),
            must.iter().map(|p| Self::predicate(p, false)).collect(),
            should.iter().map(|p| Self::predicate(p, false)).collect(),
            must_not.iter().map(|p| Self::predicate(p, true)).collect(),
        )
    }

    /// WHERE body for a structured boolean tree
    pub fn bool_clause(query: &BoolQuery) -> String {
        Self::join_groups(
            Vec::new(),
            query.must.iter().map(|n| Self::node(n, false)).collect(),
            query.should.iter().map(|n| Self::node(n, false)).collect(),
            query.must_not.iter().map(|n| Self::node(n, true)).collect(),
        )
    }

    /// Compile one predicate; its own negation flag combines with placement.
    pub fn predicate(predicate: &Predicate, negated: bool) -> String {
        Self::node(&StructuredCompiler::node(predicate), negated ^ predicate.is_negated())
    }

    /// Compile one tree node, positive or negated.
    pub fn node(node: &QueryNode, negated: bool) -> String {
        match node {
            QueryNode::Equals { field, value } => {
                let op = if negated { "<>" } else { "=" };
                format!("{} {} {}", Self::quote_identifier(field), op, value.to_sql_literal())
            }
            QueryNode::In { field, values } => {
                if values.is_empty() {
                    // IN () is not valid SQL; an empty set matches nothing
                    return if negated { "1 = 1" } else { "1 = 0" }.to_string();
                }
                let op = if negated { "NOT IN" } else { "IN" };
                let list: Vec<String> = values.iter().map(Scalar::to_sql_literal).collect();
                format!("{} {} ({})", Self::quote_identifier(field), op, list.join(", "))
            }
            QueryNode::Range { field, bounds } => {
                if bounds.is_empty() {
                    return if negated { "1 = 0" } else { "1 = 1" }.to_string();
                }
                let parts: Vec<String> = bounds
                    .iter()
                    .map(|(bound, value)| {
                        format!(
                            "{} {} {}",
                            Self::quote_identifier(field),
                            bound.sql_symbol(negated),
                            value.to_sql_literal()
                        )
                    })
                    .collect();
                if negated && parts.len() > 1 {
                    // NOT (a <= x <= b) == x < a OR x > b
                    format!("({})", parts.join(" OR "))
                } else {
                    parts.join(" AND ")
                }
            }
            QueryNode::GeoDistance(geo) => {
                let op = if negated { ">=" } else { "<" };
                format!(
                    "GEODIST({}, {}, {}, {}, {{in=degrees, out=meters}}) {} {}",
                    Self::quote_identifier(&geo.lat_field),
                    Self::quote_identifier(&geo.lon_field),
                    geo.lat,
                    geo.lon,
                    op,
                    geo.distance_meters
                )
            }
            QueryNode::Match(m) => {
                let expr = Self::match_expr(m);
                if negated {
                    format!("NOT {}", expr)
                } else {
                    expr
                }
            }
            QueryNode::Bool(inner) => {
                let body = Self::bool_clause(inner);
                match (body.is_empty(), negated) {
                    (true, false) => "1 = 1".to_string(),
                    (true, true) => "1 = 0".to_string(),
                    (false, false) => format!("({})", body),
                    (false, true) => format!("NOT ({})", body),
                }
            }
        }
    }

    /// `MATCH('@field keywords')` with field and keywords escaped
    pub fn match_expr(clause: &MatchClause) -> String {
        format!(
            "MATCH('@{} {}')",
            escape_sql_string(&clause.field),
            escape_sql_string(&clause.keywords)
        )
    }

    pub fn quote_identifier(field: &str) -> String {
        format!("`{}`", field.replace('`', "``"))
    }

    fn join_groups(matches: Vec<String>, must: Vec<String>, should: Vec<String>, must_not: Vec<String>) -> String {
        let mut clauses = matches;
        if !must.is_empty() {
            clauses.push(format!("({})", must.join(" AND ")));
        }
        if !should.is_empty() {
            clauses.push(format!("({})", should.join(" OR ")));
        }
        if !must_not.is_empty() {
            clauses.push(must_not.join(" AND "));
        }
        clauses.join(" AND ")
    }

    fn order_by_clause(sort: &[super::state::SortSpec]) -> Option<String> {
        if sort.is_empty() {
            return None;
        }
        let orders: Vec<String> = sort
            .iter()
            .map(|s| format!("{} {}", Self::quote_identifier(&s.field), s.direction.as_sql()))
            .collect();
        Some(format!("ORDER BY {}", orders.join(", ")))
    }

    fn limit_clause(limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        if limit.is_none() && offset.is_none() {
            return None;
        }
        Some(format!(
            "LIMIT {}, {}",
            offset.unwrap_or(0),
            limit.unwrap_or(DEFAULT_PAGE_SIZE)
        ))
    }

    fn option_clause(max_matches: Option<u64>) -> Option<String> {
        max_matches.map(|n| format!("OPTION max_matches={}", n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::{make_filter, Operand, Operator};
    use crate::query::state::{SortDirection, SortSpec};

    fn no_default() -> ManticoreConfig {
        ManticoreConfig {
            max_matches: None,
            ..Default::default()
        }
    }

    #[test]
    fn test_equals_and_negation() {
        let p = make_filter("countryiso", "=", "PT").unwrap();
        assert_eq!(SqlCompiler::predicate(&p, false), "`countryiso` = 'PT'");
        assert_eq!(SqlCompiler::predicate(&p, true), "`countryiso` <> 'PT'");
    }

    #[test]
    fn test_not_equal_flag_xor_placement() {
        let p = make_filter("countryiso", "!=", "PT").unwrap();
        assert_eq!(SqlCompiler::predicate(&p, false), "`countryiso` <> 'PT'");
        // NOT (x != PT) == x = PT
        assert_eq!(SqlCompiler::predicate(&p, true), "`countryiso` = 'PT'");
    }

    #[test]
    fn test_single_bound_flip() {
        let cases = [(">=", "<"), ("<", ">="), (">", "<="), ("<=", ">")];
        for (op, flipped) in cases {
            let p = make_filter("age", op, 30).unwrap();
            assert_eq!(SqlCompiler::predicate(&p, false), format!("`age` {} 30", op));
            assert_eq!(SqlCompiler::predicate(&p, true), format!("`age` {} 30", flipped));
        }
    }

    #[test]
    fn test_between_positive_and_negated() {
        let p = Predicate::between("entityid", 1, 999_999_999).unwrap();
        assert_eq!(
            SqlCompiler::predicate(&p, false),
            "`entityid` >= 1 AND `entityid` <= 999999999"
        );
        assert_eq!(
            SqlCompiler::predicate(&p, true),
            "(`entityid` < 1 OR `entityid` > 999999999)"
        );
    }

    #[test]
    fn test_where_not_in() {
        let p = Predicate::new("status", Operator::NotIn, Operand::List(vec![1.into(), 2.into()])).unwrap();
        let clause = SqlCompiler::where_clause(&[p], &[], &[], &[]);
        assert_eq!(clause, "(`status` NOT IN (1, 2))");

        let p = Predicate::is_in("status", [1, 2]).unwrap();
        let clause = SqlCompiler::where_clause(&[], &[], &[p], &[]);
        assert_eq!(clause, "`status` NOT IN (1, 2)");
    }

    #[test]
    fn test_in_quotes_text() {
        let p = Predicate::is_in("country", ["PT", "ES"]).unwrap();
        assert_eq!(SqlCompiler::predicate(&p, false), "`country` IN ('PT', 'ES')");
    }

    #[test]
    fn test_empty_in_list() {
        let p = Predicate::is_in::<i64>("status", []).unwrap();
        assert_eq!(SqlCompiler::predicate(&p, false), "1 = 0");
        assert_eq!(SqlCompiler::predicate(&p, true), "1 = 1");
    }

    #[test]
    fn test_match_negation_wraps() {
        let node = QueryNode::Match(MatchClause::any("Portugal"));
        assert_eq!(SqlCompiler::node(&node, false), "MATCH('@* Portugal')");
        assert_eq!(SqlCompiler::node(&node, true), "NOT MATCH('@* Portugal')");
    }

    #[test]
    fn test_match_keywords_escaped() {
        let clause = MatchClause::on("title", "O'Reilly \\ books");
        assert_eq!(SqlCompiler::match_expr(&clause), "MATCH('@title O\\'Reilly \\\\ books')");
    }

    #[test]
    fn test_match_field_escaped() {
        let clause = MatchClause::on("title') OR 1=1 OR MATCH('x", "kw");
        assert_eq!(
            SqlCompiler::match_expr(&clause),
            "MATCH('@title\\') OR 1=1 OR MATCH(\\'x kw')"
        );

        let mut state = QueryState::new();
        state.matches.push(MatchClause::on("ti'tle", "kw"));
        assert_eq!(
            SqlCompiler::compile(&state, "idx", &no_default()),
            "SELECT * FROM idx WHERE MATCH('@ti\\'tle kw')"
        );
    }

    #[test]
    fn test_where_groups() {
        let must = vec![make_filter("a", "=", 1).unwrap(), make_filter("b", ">=", 2).unwrap()];
        let should = vec![make_filter("c", "=", "x").unwrap(), make_filter("d", "=", "y").unwrap()];
        let must_not = vec![make_filter("e", "=", 3).unwrap(), make_filter("f", "<", 4).unwrap()];
        let matches = vec![MatchClause::any("hello"), MatchClause::on("title", "world")];

        let clause = SqlCompiler::where_clause(&must, &should, &must_not, &matches);
        assert_eq!(
            clause,
            "MATCH('@* hello') AND MATCH('@title world') AND (`a` = 1 AND `b` >= 2) \
             AND (`c` = 'x' OR `d` = 'y') AND `e` <> 3 AND `f` >= 4"
        );
    }

    #[test]
    fn test_negated_between_does_not_leak_into_and() {
        let must_not = vec![
            make_filter("a", "=", 1).unwrap(),
            Predicate::between("price", 10, 20).unwrap(),
        ];
        let clause = SqlCompiler::where_clause(&[], &[], &must_not, &[]);
        assert_eq!(clause, "`a` <> 1 AND (`price` < 10 OR `price` > 20)");
    }

    #[test]
    fn test_empty_where() {
        assert_eq!(SqlCompiler::where_clause(&[], &[], &[], &[]), "");
    }

    #[test]
    fn test_geo_sql() {
        let p = Predicate::geo_distance("lat,lon", 38.5, -9.25, 1000.0).unwrap();
        assert_eq!(
            SqlCompiler::predicate(&p, false),
            "GEODIST(`lat`, `lon`, 38.5, -9.25, {in=degrees, out=meters}) < 1000"
        );
        assert_eq!(
            SqlCompiler::predicate(&p, true),
            "GEODIST(`lat`, `lon`, 38.5, -9.25, {in=degrees, out=meters}) >= 1000"
        );
    }

    #[test]
    fn test_nested_bool_node() {
        let inner = BoolQuery {
            must_not: vec![QueryNode::Equals { field: "b".into(), value: 2.into() }],
            ..Default::default()
        };
        assert_eq!(SqlCompiler::node(&QueryNode::Bool(inner.clone()), false), "(`b` <> 2)");
        assert_eq!(SqlCompiler::node(&QueryNode::Bool(inner), true), "NOT (`b` <> 2)");
        assert_eq!(SqlCompiler::node(&QueryNode::Bool(BoolQuery::default()), false), "1 = 1");
    }

    #[test]
    fn test_identifier_backticks_escaped() {
        assert_eq!(SqlCompiler::quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_compile_minimal_omits_clauses() {
        let sql = SqlCompiler::compile(&QueryState::new(), "products", &no_default());
        assert_eq!(sql, "SELECT * FROM products");
    }

    #[test]
    fn test_compile_full_statement() {
        let mut state = QueryState::new();
        state.select = vec!["countryiso".into(), "COUNT(*) as total".into()];
        state.must.push(make_filter("active", "=", 1).unwrap());
        state.group_by = vec!["countryiso".into()];
        state.having = vec!["COUNT(*) > 1".into(), "total < 100".into()];
        state.sort.push(SortSpec { field: "total".into(), direction: SortDirection::Desc });
        state.limit = Some(5);
        state.offset = Some(10);

        let config = ManticoreConfig {
            max_matches: Some(8000),
            ..Default::default()
        };
        let sql = SqlCompiler::compile(&state, "products", &config);
        assert_eq!(
            sql,
            "SELECT countryiso, COUNT(*) as total FROM products WHERE (`active` = 1) \
             GROUP BY countryiso HAVING COUNT(*) > 1 AND total < 100 ORDER BY `total` DESC \
             LIMIT 10, 5 OPTION max_matches=8000"
        );
    }

    #[test]
    fn test_limit_defaults() {
        let mut state = QueryState::new();
        state.limit = Some(3);
        assert_eq!(SqlCompiler::compile(&state, "i", &no_default()), "SELECT * FROM i LIMIT 0, 3");

        let mut state = QueryState::new();
        state.offset = Some(40);
        assert_eq!(SqlCompiler::compile(&state, "i", &no_default()), "SELECT * FROM i LIMIT 40, 20");
    }

    #[test]
    fn test_max_matches_override_beats_default() {
        let mut state = QueryState::new();
        state.matches.push(MatchClause::any("Portugal"));
        state.max_matches = Some(20_000);
        state.limit = Some(10);
        let config = ManticoreConfig {
            max_matches: Some(10_000),
            ..Default::default()
        };
        let sql = SqlCompiler::compile(&state, "i", &config);
        assert!(sql.contains("OPTION max_matches=20000"));
        assert!(!sql.contains("10000"));
    }

    #[test]
    fn test_from_request_scenario() {
        let mut state = QueryState::new();
        state.matches.push(MatchClause::any("Portugal"));
        state.must.push(Predicate::between("entityid", 1, 999_999_999).unwrap());
        state.must.push(make_filter("countryiso", "=", "PT").unwrap());
        state.limit = Some(1);

        let request = StructuredCompiler::compile(&state, "ttrentitytest", &no_default());
        let sql = SqlCompiler::from_request(&request);
        assert_eq!(
            sql,
            "SELECT * FROM ttrentitytest WHERE (MATCH('@* Portugal') AND `entityid` >= 1 \
             AND `entityid` <= 999999999 AND `countryiso` = 'PT') LIMIT 0, 1"
        );
    }
}
