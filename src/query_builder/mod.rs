//! Query-builder capability interface
//!
//! The compiler never talks to a database. It emits clauses into anything that
//! implements [`QueryBuilder`]; [`SqlStatement`] is the bundled implementation
//! that renders parameterised SQL.
//!
//! Conditions are plain data: a small tree of comparisons, membership and range
//! tests joined by AND/OR connectors. The same [`Condition`] type serves WHERE,
//! JOIN ... ON and HAVING, which is what the `where*`, `on*` and `having*` method
//! families of a fluent builder collapse to.

pub mod common;
pub mod sql_statement;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use sql_statement::{JoinClause, RenderedStatement, SqlStatement};

pub trait ToSql {
    fn to_sql(&self) -> String;
}

/// A column reference or a raw SQL expression (the escape hatch for aggregates).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRef {
    Qualified { table_alias: String, column: String },
    Raw(String),
}

impl ColumnRef {
    pub fn qualified(table_alias: impl Into<String>, column: impl Into<String>) -> Self {
        ColumnRef::Qualified {
            table_alias: table_alias.into(),
            column: column.into(),
        }
    }
}

/// One SELECT item: an expression and the name it is exposed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub expression: ColumnRef,
    pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
    Is,
    IsNot,
}

impl ComparisonOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Is => "IS",
            ComparisonOp::IsNot => "IS NOT",
        }
    }
}

/// How a condition attaches to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conjunction {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Compare {
        column: ColumnRef,
        operator: ComparisonOp,
        value: Value,
    },
    /// Column-to-column comparison, used for join keys
    ColumnCompare {
        left: ColumnRef,
        operator: ComparisonOp,
        right: ColumnRef,
    },
    In {
        column: ColumnRef,
        values: Vec<Value>,
        negated: bool,
    },
    Between {
        column: ColumnRef,
        low: Value,
        high: Value,
        negated: bool,
    },
    /// Parenthesised sequence of terms
    Group(Vec<ConditionTerm>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionTerm {
    pub conjunction: Conjunction,
    pub condition: Condition,
}

impl ConditionTerm {
    pub fn and(condition: Condition) -> Self {
        ConditionTerm {
            conjunction: Conjunction::And,
            condition,
        }
    }

    pub fn or(condition: Condition) -> Self {
        ConditionTerm {
            conjunction: Conjunction::Or,
            condition,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    FullOuter,
    Cross,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Statement under construction.
///
/// Clause methods append; callers decide the order in which clauses are added
/// and implementations render them in SQL order.
pub trait QueryBuilder {
    fn from_table(&mut self, table: &str, alias: &str);

    fn select(&mut self, projections: Vec<Projection>);

    fn where_condition(&mut self, conjunction: Conjunction, condition: Condition);

    /// `on` holds the ON conditions, combined with AND. Empty for cross joins.
    fn join(&mut self, kind: JoinKind, table: &str, alias: &str, on: Vec<Condition>);

    fn group_by(&mut self, column: ColumnRef);

    fn having_condition(&mut self, conjunction: Conjunction, condition: Condition);

    fn order_by(&mut self, column: ColumnRef, direction: SortDirection);

    fn limit(&mut self, n: u64);

    fn offset(&mut self, n: u64);

    fn distinct(&mut self);
}
