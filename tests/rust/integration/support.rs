//! Shared fixtures: the library catalog, request helpers and a small evaluator
//! that applies compiled WHERE terms to in-memory rows.

use std::cmp::Ordering;

use relnest::config::CompilerConfig;
use relnest::entity_catalog::{load_catalog_from_yaml_file, EntityCatalog};
use relnest::query_builder::{ColumnRef, ComparisonOp, Condition, ConditionTerm, Conjunction};
use relnest::query_compiler::CompileError;
use relnest::selection::{ReadRequest, SelectionTree};
use relnest::{compile_read, CompiledRead};
use serde_json::Value;

pub const LIBRARY_CATALOG: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/rust/integration/fixtures/library.yaml"
);

pub fn library_catalog() -> EntityCatalog {
    load_catalog_from_yaml_file(LIBRARY_CATALOG).expect("library catalog should load")
}

pub fn config_with_separator(separator: &str) -> CompilerConfig {
    CompilerConfig {
        alias_separator: separator.to_string(),
        ..CompilerConfig::default()
    }
}

pub fn request(value: Value) -> ReadRequest {
    serde_json::from_value(value).expect("request should deserialize")
}

pub fn compile(
    config: &CompilerConfig,
    value: Value,
) -> Result<(SelectionTree, CompiledRead), CompileError> {
    let catalog = library_catalog();
    let tree = SelectionTree::from_request(&catalog, &request(value))?;
    let compiled = compile_read(&catalog, config, &tree)?;
    Ok((tree, compiled))
}

/// Ids of the rows (plain column names) that satisfy `terms`, in row order.
pub fn matching_ids(terms: &[ConditionTerm], rows: &[Value]) -> Vec<i64> {
    rows.iter()
        .filter(|row| eval_terms(terms, row))
        .filter_map(|row| row["id"].as_i64())
        .collect()
}

/// AND binds tighter than OR, as in SQL.
fn eval_terms(terms: &[ConditionTerm], row: &Value) -> bool {
    let mut any = false;
    let mut current = true;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 && term.conjunction == Conjunction::Or {
            any |= current;
            current = true;
        }
        current &= eval_condition(&term.condition, row);
    }
    any || current
}

fn eval_condition(condition: &Condition, row: &Value) -> bool {
    match condition {
        Condition::Compare {
            column,
            operator,
            value,
        } => {
            let actual = lookup(column, row);
            match operator {
                ComparisonOp::Is => actual == value,
                ComparisonOp::IsNot => actual != value,
                op => match compare(actual, value) {
                    Some(ordering) => match op {
                        ComparisonOp::Gt => ordering == Ordering::Greater,
                        ComparisonOp::Gte => ordering != Ordering::Less,
                        ComparisonOp::Lt => ordering == Ordering::Less,
                        ComparisonOp::Lte => ordering != Ordering::Greater,
                        ComparisonOp::Eq => ordering == Ordering::Equal,
                        _ => ordering != Ordering::Equal,
                    },
                    None => false,
                },
            }
        }
        Condition::In {
            column,
            values,
            negated,
        } => {
            if values.is_empty() {
                return *negated;
            }
            let actual = lookup(column, row);
            if actual.is_null() {
                return false;
            }
            let found = values
                .iter()
                .any(|v| compare(actual, v) == Some(Ordering::Equal));
            found != *negated
        }
        Condition::Between {
            column,
            low,
            high,
            negated,
        } => {
            let actual = lookup(column, row);
            match (compare(actual, low), compare(actual, high)) {
                (Some(lo), Some(hi)) => {
                    let inside = lo != Ordering::Less && hi != Ordering::Greater;
                    inside != *negated
                }
                _ => false,
            }
        }
        Condition::Group(terms) => eval_terms(terms, row),
        Condition::ColumnCompare { .. } => panic!("join keys are not evaluated on single rows"),
    }
}

fn lookup<'r>(column: &ColumnRef, row: &'r Value) -> &'r Value {
    match column {
        ColumnRef::Qualified { column, .. } => &row[column.as_str()],
        ColumnRef::Raw(expression) => panic!("raw expression {} in a row filter", expression),
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
