//! Predicate Compiler
//!
//! Turns a [`FilterExpr`] into conditions for one of three clause groups:
//!
//! - **Filter** (`WHERE`): field predicates and `_and` members are joined with
//!   AND; every `_or` member becomes `OR (...)` of its own AND-composed terms.
//! - **JoinCondition** (`JOIN ... ON`): field predicates only, all ANDed.
//! - **Having** (`HAVING`): like Filter, but `source__fn` field names resolve to
//!   the aggregate expression over `source`.
//!
//! Operators: `gt gte lt lte eq ne is nis` compare, `in nin` test membership,
//! `between nbetween` test a closed range. Lookup ignores case.

use serde_json::Value;

use crate::entity_catalog::EntityDescriptor;
use crate::query_builder::{ColumnRef, ComparisonOp, Condition, ConditionTerm};
use crate::selection::filter_expr::{FieldFilter, FilterExpr, AND_KEY, OR_KEY};

use super::errors::CompileError;
use super::field_projector::{resolve_column, resolve_plain_column};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Compare(ComparisonOp),
    In,
    NotIn,
    Between,
    NotBetween,
}

impl FilterOperator {
    pub fn parse(operator: &str) -> Result<Self, CompileError> {
        let op = match operator.to_ascii_lowercase().as_str() {
            "gt" => FilterOperator::Compare(ComparisonOp::Gt),
            "gte" => FilterOperator::Compare(ComparisonOp::Gte),
            "lt" => FilterOperator::Compare(ComparisonOp::Lt),
            "lte" => FilterOperator::Compare(ComparisonOp::Lte),
            "eq" => FilterOperator::Compare(ComparisonOp::Eq),
            "ne" => FilterOperator::Compare(ComparisonOp::Ne),
            "is" => FilterOperator::Compare(ComparisonOp::Is),
            "nis" => FilterOperator::Compare(ComparisonOp::IsNot),
            "in" => FilterOperator::In,
            "nin" => FilterOperator::NotIn,
            "between" => FilterOperator::Between,
            "nbetween" => FilterOperator::NotBetween,
            _ => return Err(CompileError::UnsupportedOperator(operator.to_string())),
        };
        Ok(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateContext {
    Filter,
    JoinCondition,
    Having,
}

pub struct PredicateCompiler<'a> {
    entity: &'a EntityDescriptor,
    table_alias: &'a str,
    context: PredicateContext,
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(
        entity: &'a EntityDescriptor,
        table_alias: &'a str,
        context: PredicateContext,
    ) -> Self {
        PredicateCompiler {
            entity,
            table_alias,
            context,
        }
    }

    /// Terms for a WHERE or HAVING clause, each carrying its connector.
    pub fn compile_terms(&self, expr: &FilterExpr) -> Result<Vec<ConditionTerm>, CompileError> {
        if self.context == PredicateContext::JoinCondition
            && (!expr.and.is_empty() || !expr.or.is_empty())
        {
            return Err(CompileError::MalformedFilter(format!(
                "`{}` / `{}` are not allowed in a join condition",
                AND_KEY, OR_KEY
            )));
        }

        let mut terms = Vec::new();
        for field_filter in &expr.fields {
            for condition in self.compile_field(field_filter)? {
                terms.push(ConditionTerm::and(condition));
            }
        }
        for member in &expr.and {
            if let Some(group) = self.compile_group(member)? {
                terms.push(ConditionTerm::and(group));
            }
        }
        for member in &expr.or {
            // each OR member defaults to AND inside
            if let Some(group) = self.compile_group(member)? {
                terms.push(ConditionTerm::or(group));
            }
        }
        Ok(terms)
    }

    /// ON conditions for a join; all of them are ANDed by the statement.
    pub fn compile_join_conditions(&self, expr: &FilterExpr) -> Result<Vec<Condition>, CompileError> {
        Ok(self
            .compile_terms(expr)?
            .into_iter()
            .map(|term| term.condition)
            .collect())
    }

    fn compile_group(&self, expr: &FilterExpr) -> Result<Option<Condition>, CompileError> {
        let terms = self.compile_terms(expr)?;
        if terms.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Condition::Group(terms)))
        }
    }

    fn compile_field(&self, filter: &FieldFilter) -> Result<Vec<Condition>, CompileError> {
        if filter.operators.is_empty() {
            return Err(CompileError::invalid_operand(
                filter.field.clone(),
                "empty operator object",
            ));
        }

        let column = match self.context {
            PredicateContext::Having => resolve_column(self.entity, self.table_alias, &filter.field)?,
            _ => resolve_plain_column(self.entity, self.table_alias, &filter.field)?,
        };

        filter
            .operators
            .iter()
            .map(|(operator, value)| compile_operator(column.clone(), operator, value))
            .collect()
    }
}

fn compile_operator(
    column: ColumnRef,
    operator: &str,
    value: &Value,
) -> Result<Condition, CompileError> {
    let condition = match FilterOperator::parse(operator)? {
        FilterOperator::Compare(op @ (ComparisonOp::Is | ComparisonOp::IsNot)) => {
            if !matches!(value, Value::Null | Value::Bool(_)) {
                return Err(CompileError::invalid_operand(
                    operator,
                    format!("expects null, true or false, got {}", value),
                ));
            }
            Condition::Compare {
                column,
                operator: op,
                value: value.clone(),
            }
        }
        FilterOperator::Compare(op) => {
            if value.is_array() || value.is_object() {
                return Err(CompileError::invalid_operand(
                    operator,
                    format!("expects a scalar, got {}", value),
                ));
            }
            // `= NULL` never matches; follow the usual builder convention
            let op = match (op, value) {
                (ComparisonOp::Eq, Value::Null) => ComparisonOp::Is,
                (ComparisonOp::Ne, Value::Null) => ComparisonOp::IsNot,
                _ => op,
            };
            Condition::Compare {
                column,
                operator: op,
                value: value.clone(),
            }
        }
        op @ (FilterOperator::In | FilterOperator::NotIn) => {
            let values = value.as_array().ok_or_else(|| {
                CompileError::invalid_operand(operator, format!("expects a list, got {}", value))
            })?;
            Condition::In {
                column,
                values: values.clone(),
                negated: op == FilterOperator::NotIn,
            }
        }
        op @ (FilterOperator::Between | FilterOperator::NotBetween) => {
            let bounds = value
                .as_array()
                .filter(|bounds| bounds.len() == 2)
                .ok_or_else(|| {
                    CompileError::invalid_operand(
                        operator,
                        format!("expects [low, high], got {}", value),
                    )
                })?;
            Condition::Between {
                column,
                low: bounds[0].clone(),
                high: bounds[1].clone(),
                negated: op == FilterOperator::NotBetween,
            }
        }
    };
    Ok(condition)
}
