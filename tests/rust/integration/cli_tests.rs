use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use serde_json::{json, Value};
use tempfile::tempdir;

use super::support::LIBRARY_CATALOG;

fn relnest(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("relnest");
    cmd.current_dir(dir)
        .env_remove("RELNEST_ALIAS_SEPARATOR")
        .env_remove("RELNEST_BASE_ALIAS")
        .env_remove("RELNEST_DEFAULT_LIMIT")
        .env_remove("RELNEST_MAX_LIMIT");
    cmd
}

fn write_json(dir: &Path, name: &str, value: &Value) -> String {
    let path = dir.join(name);
    fs::write(&path, value.to_string()).expect("write json");
    path.to_string_lossy().into_owned()
}

#[test]
fn test_check_reports_catalog_entities() {
    let dir = tempdir().expect("temp dir");
    relnest(dir.path())
        .args(["check", "--catalog", LIBRARY_CATALOG])
        .assert()
        .success()
        .stdout(predicates::str::contains("5 entities").and(predicates::str::contains("Employee")));
}

#[test]
fn test_compile_prints_sql_and_bindings() {
    let dir = tempdir().expect("temp dir");
    let request = write_json(
        dir.path(),
        "request.json",
        &json!({
            "entity": "Book",
            "selection": {"name": "books", "args": {"where": {"title": {"eq": "Emma"}}},
                          "selections": ["title"]}
        }),
    );

    let output = relnest(dir.path())
        .args(["compile", "--catalog", LIBRARY_CATALOG, "--request", &request])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let rendered: Value = serde_json::from_slice(&output).expect("compile output is JSON");
    assert_eq!(
        rendered,
        json!({
            "sql": "SELECT \"base\".\"title\" AS \"base___title\", \"base\".\"id\" AS \"base___id\" \
                    FROM \"books\" AS \"base\" WHERE \"base\".\"title\" = ?",
            "bindings": ["Emma"]
        })
    );
}

#[test]
fn test_compile_honours_separator_flag() {
    let dir = tempdir().expect("temp dir");
    let request = write_json(
        dir.path(),
        "request.json",
        &json!({"entity": "Tag", "selection": {"name": "tags", "selections": ["label"]}}),
    );

    relnest(dir.path())
        .args(["--alias-separator", "__", "compile", "--catalog", LIBRARY_CATALOG, "--request", &request])
        .assert()
        .success()
        .stdout(predicates::str::contains("base__label"));
}

#[test]
fn test_denormalize_prints_nested_result() {
    let dir = tempdir().expect("temp dir");
    let request = write_json(
        dir.path(),
        "request.json",
        &json!({
            "entity": "Author",
            "selection": {"name": "authors", "selections": ["name",
                {"name": "books", "args": {"joinType": "left"}, "selections": ["title"]}]}
        }),
    );
    let rows = write_json(
        dir.path(),
        "rows.json",
        &json!([
            {"base___name": "A", "base___id": 1, "Book___title": "X", "Book___id": 10},
            {"base___name": "B", "base___id": 2}
        ]),
    );

    let output = relnest(dir.path())
        .args(["denormalize", "--catalog", LIBRARY_CATALOG, "--request", &request, "--rows", &rows])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: Value = serde_json::from_slice(&output).expect("denormalize output is JSON");
    assert_eq!(
        result,
        json!([
            {"name": "A", "id": 1, "books": [{"title": "X", "id": 10}]},
            {"name": "B", "id": 2, "books": []}
        ])
    );
}

#[test]
fn test_unknown_entity_fails_with_message() {
    let dir = tempdir().expect("temp dir");
    let request = write_json(
        dir.path(),
        "request.json",
        &json!({"entity": "Publisher", "selection": {"name": "publishers", "selections": ["id"]}}),
    );

    relnest(dir.path())
        .args(["compile", "--catalog", LIBRARY_CATALOG, "--request", &request])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Publisher"));
}
