//! Flat rows back to nested results, using the `__` separator throughout.

use relnest::denormalize;
use relnest::query_builder::ToSql;
use relnest::result_denormalizer::{DenormalizeError, EntityId, RowIndex};
use serde_json::{json, Value};

use super::support::{compile, config_with_separator};

fn authors_with_books() -> Value {
    json!({
        "entity": "Author",
        "selection": {
            "name": "authors",
            "selections": ["id", "name",
                {"name": "books", "args": {"joinType": "leftJoin"}, "selections": ["id", "title"]}]
        }
    })
}

fn run(request: Value, rows: &[Value]) -> Result<Vec<Value>, DenormalizeError> {
    let (tree, compiled) = compile(&config_with_separator("__"), request).unwrap();
    denormalize(rows, &tree, &compiled.layout)
}

#[test]
fn test_author_book_scenario() {
    let (_, compiled) = compile(&config_with_separator("__"), authors_with_books()).unwrap();
    assert_eq!(
        compiled.statement.to_sql(),
        "SELECT \"base\".\"id\" AS \"base__id\", \"base\".\"name\" AS \"base__name\", \
         \"Book\".\"id\" AS \"Book__id\", \"Book\".\"title\" AS \"Book__title\" \
         FROM \"authors\" AS \"base\" \
         LEFT JOIN \"books\" AS \"Book\" ON \"base\".\"id\" = \"Book\".\"author_id\""
    );

    let rows = vec![
        json!({"base__id": 1, "base__name": "A", "Book__id": 10, "Book__title": "X"}),
        json!({"base__id": 1, "base__name": "A", "Book__id": 11, "Book__title": "Y"}),
        json!({"base__id": 2, "base__name": "B", "Book__id": null, "Book__title": null}),
    ];

    assert_eq!(
        run(authors_with_books(), &rows).unwrap(),
        vec![
            json!({"id": 1, "name": "A", "books": [{"id": 10, "title": "X"}, {"id": 11, "title": "Y"}]}),
            json!({"id": 2, "name": "B", "books": []}),
        ]
    );
}

#[test]
fn test_fan_out_is_idempotent_and_ordered_by_child_id() {
    let rows = vec![
        json!({"base__id": 1, "base__name": "A", "Book__id": 11, "Book__title": "Y"}),
        json!({"base__id": 1, "base__name": "A", "Book__id": 10, "Book__title": "X"}),
        json!({"base__id": 1, "base__name": "A", "Book__id": 11, "Book__title": "Y"}),
        json!({"base__id": 1, "base__name": "A", "Book__id": 10, "Book__title": "X"}),
    ];

    assert_eq!(
        run(authors_with_books(), &rows).unwrap(),
        vec![json!({"id": 1, "name": "A", "books": [{"id": 10, "title": "X"}, {"id": 11, "title": "Y"}]})]
    );
}

#[test]
fn test_roots_keep_first_seen_order() {
    let rows = vec![
        json!({"base__id": 7, "base__name": "G", "Book__id": null, "Book__title": null}),
        json!({"base__id": 3, "base__name": "C", "Book__id": null, "Book__title": null}),
        json!({"base__id": 7, "base__name": "G", "Book__id": null, "Book__title": null}),
    ];

    let ids: Vec<Value> = run(authors_with_books(), &rows)
        .unwrap()
        .into_iter()
        .map(|author| author["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(7), json!(3)]);
}

#[test]
fn test_null_match_leaves_no_trace() {
    let (tree, compiled) = compile(&config_with_separator("__"), authors_with_books()).unwrap();
    let rows = vec![json!({"base__id": 2, "base__name": "B", "Book__id": null, "Book__title": null})];

    let index = RowIndex::build(&rows, &compiled.layout, &tree.parent_child_pairs()).unwrap();
    assert!(index.pool.get("Book").is_none());
    assert!(index.adjacency.is_empty());
    assert_eq!(index.root_ids, vec![EntityId::Integer(2)]);
}

#[test]
fn test_row_without_child_columns_is_an_outer_join_miss() {
    let rows = vec![
        json!({"base__id": 1, "base__name": "A", "Book__id": 10, "Book__title": "X"}),
        json!({"base__id": 2, "base__name": "B"}),
    ];

    assert_eq!(
        run(authors_with_books(), &rows).unwrap(),
        vec![
            json!({"id": 1, "name": "A", "books": [{"id": 10, "title": "X"}]}),
            json!({"id": 2, "name": "B", "books": []}),
        ]
    );
}

#[test]
fn test_child_columns_without_child_id_fail_loudly() {
    let rows = vec![json!({"base__id": 1, "base__name": "A", "Book__title": "X"})];

    assert_eq!(
        run(authors_with_books(), &rows).unwrap_err(),
        DenormalizeError::MissingUniqueColumn {
            alias: "Book".to_string(),
            column: "Book__id".to_string(),
            index: 0,
        }
    );
}

#[test]
fn test_sibling_relations_are_captured_independently() {
    let request = json!({
        "entity": "Author",
        "selection": {"name": "authors", "selections": ["id",
            {"name": "books", "args": {"joinType": "left"}, "selections": ["id"]},
            {"name": "awards", "args": {"joinType": "left"}, "selections": ["id"]}]}
    });
    let row = |book: i64, award: i64| json!({"base__id": 1, "Book__id": book, "Award__id": award});

    let cross_product = vec![row(10, 100), row(10, 101), row(11, 100), row(11, 101)];
    let correlated = vec![row(10, 100), row(11, 101)];

    let expected = vec![json!({
        "id": 1,
        "books": [{"id": 10}, {"id": 11}],
        "awards": [{"id": 100}, {"id": 101}]
    })];
    // which book and award shared a row is not part of the result
    assert_eq!(run(request.clone(), &cross_product).unwrap(), expected);
    assert_eq!(run(request, &correlated).unwrap(), expected);
}

#[test]
fn test_three_levels_through_an_associative_table() {
    let request = json!({
        "entity": "Author",
        "selection": {"name": "authors", "selections": ["name",
            {"name": "books", "selections": ["title",
                {"name": "tags", "args": {"joinType": "left"}, "selections": ["label"]}]}]}
    });
    let rows = vec![
        json!({"base__name": "A", "base__id": 1, "Book__title": "X", "Book__id": 10, "Tag__label": "sf", "Tag__id": 2}),
        json!({"base__name": "A", "base__id": 1, "Book__title": "X", "Book__id": 10, "Tag__label": "classic", "Tag__id": 1}),
        json!({"base__name": "A", "base__id": 1, "Book__title": "Y", "Book__id": 11, "Tag__label": null, "Tag__id": null}),
    ];

    assert_eq!(
        run(request, &rows).unwrap(),
        vec![json!({"name": "A", "id": 1, "books": [
            {"title": "X", "id": 10, "tags": [{"label": "classic", "id": 1}, {"label": "sf", "id": 2}]},
            {"title": "Y", "id": 11, "tags": []}
        ]})]
    );
}

#[test]
fn test_self_referential_nesting() {
    let request = json!({
        "entity": "Employee",
        "selection": {"name": "employees", "selections": ["name",
            {"name": "reports", "args": {"joinType": "left"}, "selections": ["name",
                {"name": "reports", "args": {"joinType": "left"}, "selections": ["name"]}]}]}
    });
    let rows = vec![
        json!({"base__name": "Ada", "base__id": 1, "Employee__name": "Bo", "Employee__id": 2,
               "Employee_2__name": "Cy", "Employee_2__id": 3}),
        json!({"base__name": "Ada", "base__id": 1, "Employee__name": "Di", "Employee__id": 4,
               "Employee_2__name": null, "Employee_2__id": null}),
    ];

    assert_eq!(
        run(request, &rows).unwrap(),
        vec![json!({"name": "Ada", "id": 1, "reports": [
            {"name": "Bo", "id": 2, "reports": [{"name": "Cy", "id": 3}]},
            {"name": "Di", "id": 4, "reports": []}
        ]})]
    );
}

#[test]
fn test_single_valued_relation_is_object_or_null() {
    let request = json!({
        "entity": "Book",
        "selection": {"name": "books", "selections": ["title",
            {"name": "author", "args": {"joinType": "left"}, "selections": ["name"]}]}
    });
    let rows = vec![
        json!({"base__title": "X", "base__id": 10, "Author__name": "A", "Author__id": 1}),
        json!({"base__title": "Z", "base__id": 12, "Author__name": null, "Author__id": null}),
    ];

    assert_eq!(
        run(request, &rows).unwrap(),
        vec![
            json!({"title": "X", "id": 10, "author": {"name": "A", "id": 1}}),
            json!({"title": "Z", "id": 12, "author": null}),
        ]
    );
}

#[test]
fn test_text_ids_sort_after_integers() {
    let rows = vec![
        json!({"base__id": 1, "base__name": "A", "Book__id": "b-2", "Book__title": "Q"}),
        json!({"base__id": 1, "base__name": "A", "Book__id": 9, "Book__title": "P"}),
        json!({"base__id": 1, "base__name": "A", "Book__id": "b-1", "Book__title": "R"}),
    ];

    let result = run(authors_with_books(), &rows).unwrap();
    let titles: Vec<&Value> = result[0]["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| &book["title"])
        .collect();
    assert_eq!(titles, vec![&json!("P"), &json!("R"), &json!("Q")]);
}

#[test]
fn test_fractional_ids_ascend_numerically() {
    let rows = vec![
        json!({"base__id": 1, "base__name": "A", "Book__id": 10.5, "Book__title": "X"}),
        json!({"base__id": 1, "base__name": "A", "Book__id": 9.5, "Book__title": "Y"}),
    ];

    assert_eq!(
        run(authors_with_books(), &rows).unwrap(),
        vec![json!({"id": 1, "name": "A", "books": [
            {"id": 9.5, "title": "Y"},
            {"id": 10.5, "title": "X"}
        ]})]
    );
}

#[test]
fn test_column_from_unknown_alias_fails_loudly() {
    let rows = vec![json!({"base__id": 1, "base__name": "A", "Book__id": null, "Book__title": null,
                           "Publisher__id": 5})];

    let err = run(authors_with_books(), &rows).unwrap_err();
    assert_eq!(
        err,
        DenormalizeError::UnknownAlias {
            alias: "Publisher".to_string(),
            column: "Publisher__id".to_string(),
        }
    );
}
