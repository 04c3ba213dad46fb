//! Filter expressions as sent by callers.
//!
//! ```json
//! { "name": { "eq": "A" },
//!   "_and": [ { "age": { "gte": 18 } } ],
//!   "_or":  [ { "city": { "in": ["Oslo", "Bergen"] } }, { "vip": { "is": true } } ] }
//! ```
//!
//! Operator keys stay as raw strings here; the predicate compiler owns the
//! operator vocabulary so an unknown operator is reported at compile time.

use serde_json::Value;

use crate::query_compiler::errors::CompileError;

pub const AND_KEY: &str = "_and";
pub const OR_KEY: &str = "_or";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpr {
    /// Field predicates in input order
    pub fields: Vec<FieldFilter>,
    pub and: Vec<FilterExpr>,
    pub or: Vec<FilterExpr>,
}

/// `{field: {op: value, ...}}`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub operators: Vec<(String, Value)>,
}

impl FilterExpr {
    pub fn from_json(value: &Value) -> Result<Self, CompileError> {
        let object = value.as_object().ok_or_else(|| {
            CompileError::MalformedFilter(format!("expected an object, got {}", value))
        })?;

        let mut expr = FilterExpr::default();
        for (key, entry) in object {
            match key.as_str() {
                AND_KEY => expr.and = parse_group(key, entry)?,
                OR_KEY => expr.or = parse_group(key, entry)?,
                field => {
                    let operators = entry.as_object().ok_or_else(|| {
                        CompileError::MalformedFilter(format!(
                            "filter on `{}` must be an operator object, got {}",
                            field, entry
                        ))
                    })?;
                    expr.fields.push(FieldFilter {
                        field: field.to_string(),
                        operators: operators
                            .iter()
                            .map(|(op, v)| (op.clone(), v.clone()))
                            .collect(),
                    });
                }
            }
        }
        Ok(expr)
    }

    /// Parse an optional argument, treating JSON null as absent
    pub fn from_optional_json(value: Option<&Value>) -> Result<Option<Self>, CompileError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Self::from_json(value).map(Some),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.and.is_empty() && self.or.is_empty()
    }
}

fn parse_group(key: &str, value: &Value) -> Result<Vec<FilterExpr>, CompileError> {
    let members = value.as_array().ok_or_else(|| {
        CompileError::MalformedFilter(format!("`{}` expects a list of filters", key))
    })?;
    members.iter().map(FilterExpr::from_json).collect()
}
