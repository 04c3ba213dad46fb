//! Compiled WHERE terms applied to a fixed set of book rows.

use relnest::config::CompilerConfig;
use relnest::query_builder::ToSql;
use relnest::query_compiler::CompileError;
use serde_json::{json, Value};
use test_case::test_case;

use super::support::{compile, matching_ids};

fn books() -> Vec<Value> {
    vec![
        json!({"id": 1, "title": "Dune", "price": 10.0, "year": 1965}),
        json!({"id": 2, "title": "Emma", "price": 7.5, "year": 1815}),
        json!({"id": 3, "title": "Ulysses", "price": 15, "year": 1922}),
        json!({"id": 4, "title": "Untitled", "price": null, "year": null}),
    ]
}

fn filtered_ids(filter: Value) -> Vec<i64> {
    let (_, compiled) = compile(
        &CompilerConfig::default(),
        json!({
            "entity": "Book",
            "selection": {"name": "books", "args": {"where": filter}, "selections": ["title"]}
        }),
    )
    .expect("filter should compile");
    matching_ids(&compiled.statement.filters, &books())
}

#[test_case(json!({"price": {"gt": 10}}), vec![3] ; "gt")]
#[test_case(json!({"price": {"gte": 10}}), vec![1, 3] ; "gte")]
#[test_case(json!({"price": {"lt": 10}}), vec![2] ; "lt")]
#[test_case(json!({"price": {"lte": 10}}), vec![1, 2] ; "lte")]
#[test_case(json!({"price": {"eq": 7.5}}), vec![2] ; "eq")]
#[test_case(json!({"price": {"ne": 10}}), vec![2, 3] ; "ne")]
#[test_case(json!({"price": {"is": null}}), vec![4] ; "is null")]
#[test_case(json!({"price": {"nis": null}}), vec![1, 2, 3] ; "is not null")]
#[test_case(json!({"year": {"in": [1922, 1965]}}), vec![1, 3] ; "in")]
#[test_case(json!({"year": {"nin": [1922]}}), vec![1, 2] ; "not in")]
#[test_case(json!({"year": {"between": [1800, 1930]}}), vec![2, 3] ; "between")]
#[test_case(json!({"year": {"nbetween": [1800, 1930]}}), vec![1] ; "not between")]
#[test_case(json!({"title": {"in": []}}), vec![] ; "empty in matches nothing")]
#[test_case(json!({"title": {"nin": []}}), vec![1, 2, 3, 4] ; "empty nin matches everything")]
#[test_case(json!({"title": {"EQ": "Emma"}}), vec![2] ; "operator case is ignored")]
fn test_operator_semantics(filter: Value, expected: Vec<i64>) {
    assert_eq!(filtered_ids(filter), expected);
}

#[test]
fn test_two_field_predicates_are_anded() {
    assert_eq!(
        filtered_ids(json!({"price": {"gte": 10}, "year": {"lt": 1950}})),
        vec![3]
    );
}

#[test]
fn test_or_members_are_alternatives() {
    assert_eq!(
        filtered_ids(json!({"_or": [{"price": {"lt": 8}}, {"year": {"gt": 1960}}]})),
        vec![1, 2]
    );
}

#[test]
fn test_or_members_are_and_composed_inside() {
    assert_eq!(
        filtered_ids(json!({"_or": [
            {"price": {"gte": 10}, "year": {"lt": 1950}},
            {"title": {"eq": "Emma"}}
        ]})),
        vec![2, 3]
    );
}

#[test]
fn test_or_member_attaches_to_preceding_predicates() {
    // price >= 100 OR title = 'Emma'
    assert_eq!(
        filtered_ids(json!({"price": {"gte": 100}, "_or": [{"title": {"eq": "Emma"}}]})),
        vec![2]
    );
}

#[test]
fn test_and_members_narrow() {
    assert_eq!(
        filtered_ids(json!({"_and": [{"price": {"gte": 7}}, {"price": {"lte": 12}}]})),
        vec![1, 2]
    );
}

#[test]
fn test_values_are_bound_not_inlined() {
    let (_, compiled) = compile(
        &CompilerConfig::default(),
        json!({
            "entity": "Book",
            "selection": {"name": "books",
                          "args": {"where": {"title": {"eq": "x'; DROP TABLE books; --"}}},
                          "selections": ["title"]}
        }),
    )
    .unwrap();

    let rendered = compiled.statement.render();
    assert!(rendered.sql.ends_with("WHERE \"base\".\"title\" = ?"));
    assert_eq!(rendered.bindings, vec![json!("x'; DROP TABLE books; --")]);
}

#[test]
fn test_having_over_aggregate() {
    let (_, compiled) = compile(
        &CompilerConfig::default(),
        json!({
            "entity": "Book",
            "selection": {"name": "books",
                          "args": {"groupBy": ["year"], "having": {"price__sum": {"gt": 20}}},
                          "selections": ["year", "price__sum"]}
        }),
    )
    .unwrap();

    let sql = compiled.statement.to_sql();
    assert!(
        sql.contains("\"base\".\"year\" AS \"base___year\", sum(\"base\".\"price\") AS \"base___price__sum\""),
        "{}",
        sql
    );
    assert!(
        sql.contains("GROUP BY \"base\".\"year\" HAVING sum(\"base\".\"price\") > ?"),
        "{}",
        sql
    );
}

#[test]
fn test_unsupported_operator_is_named() {
    let err = compile(
        &CompilerConfig::default(),
        json!({
            "entity": "Book",
            "selection": {"name": "books", "args": {"where": {"title": {"like": "D%"}}},
                          "selections": ["title"]}
        }),
    )
    .unwrap_err();
    assert_eq!(err, CompileError::UnsupportedOperator("like".to_string()));
}

#[test]
fn test_filter_on_unknown_field() {
    let err = compile(
        &CompilerConfig::default(),
        json!({
            "entity": "Book",
            "selection": {"name": "books", "args": {"where": {"isbn": {"eq": "1"}}},
                          "selections": ["title"]}
        }),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::UnknownField { .. }));
}
