//! Parameterised SQL statement
//!
//! Collects clauses through [`QueryBuilder`] and renders them in SQL order.
//! Every filter value is emitted as a `?` placeholder; [`SqlStatement::render`]
//! returns the bindings in placeholder order. `IS` / `IS NOT` against `null`,
//! `true` or `false` render the keyword inline since most engines reject a
//! bound parameter there.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{qualified_column, quote_identifier, quote_table};
use super::{
    ColumnRef, ComparisonOp, Condition, ConditionTerm, Conjunction, JoinKind, Projection,
    QueryBuilder, SortDirection, ToSql,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    pub on: Vec<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlStatement {
    pub from: Option<(String, String)>,
    pub projections: Vec<Projection>,
    pub joins: Vec<JoinClause>,
    pub filters: Vec<ConditionTerm>,
    pub group_by: Vec<ColumnRef>,
    pub having: Vec<ConditionTerm>,
    pub order_by: Vec<(ColumnRef, SortDirection)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub distinct: bool,
}

/// SQL text plus the values for its placeholders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedStatement {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl SqlStatement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self) -> RenderedStatement {
        let mut bindings = Vec::new();
        let mut sql = String::from("SELECT ");

        if self.distinct {
            sql.push_str("DISTINCT ");
        }

        if self.projections.is_empty() {
            sql.push('*');
        } else {
            let items: Vec<String> = self.projections.iter().map(render_projection).collect();
            sql.push_str(&items.join(", "));
        }

        if let Some((table, alias)) = &self.from {
            sql.push_str(&format!(
                " FROM {} AS {}",
                quote_table(table),
                quote_identifier(alias)
            ));
        }

        for join in &self.joins {
            sql.push_str(&format!(
                " {} {} AS {}",
                join.kind.as_sql(),
                quote_table(&join.table),
                quote_identifier(&join.alias)
            ));
            if !join.on.is_empty() {
                let conditions: Vec<String> = join
                    .on
                    .iter()
                    .map(|condition| render_condition(condition, &mut bindings))
                    .collect();
                sql.push_str(" ON ");
                sql.push_str(&conditions.join(" AND "));
            }
        }

        if !self.filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&render_terms(&self.filters, &mut bindings));
        }

        if !self.group_by.is_empty() {
            let columns: Vec<String> = self.group_by.iter().map(render_column).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&columns.join(", "));
        }

        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&render_terms(&self.having, &mut bindings));
        }

        if !self.order_by.is_empty() {
            let items: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| {
                    format!("{} {}", render_column(column), direction.as_sql())
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&items.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        RenderedStatement { sql, bindings }
    }
}

impl ToSql for SqlStatement {
    fn to_sql(&self) -> String {
        self.render().sql
    }
}

impl QueryBuilder for SqlStatement {
    fn from_table(&mut self, table: &str, alias: &str) {
        self.from = Some((table.to_string(), alias.to_string()));
    }

    fn select(&mut self, projections: Vec<Projection>) {
        self.projections.extend(projections);
    }

    fn where_condition(&mut self, conjunction: Conjunction, condition: Condition) {
        self.filters.push(ConditionTerm {
            conjunction,
            condition,
        });
    }

    fn join(&mut self, kind: JoinKind, table: &str, alias: &str, on: Vec<Condition>) {
        self.joins.push(JoinClause {
            kind,
            table: table.to_string(),
            alias: alias.to_string(),
            on,
        });
    }

    fn group_by(&mut self, column: ColumnRef) {
        self.group_by.push(column);
    }

    fn having_condition(&mut self, conjunction: Conjunction, condition: Condition) {
        self.having.push(ConditionTerm {
            conjunction,
            condition,
        });
    }

    fn order_by(&mut self, column: ColumnRef, direction: SortDirection) {
        self.order_by.push((column, direction));
    }

    fn limit(&mut self, n: u64) {
        self.limit = Some(n);
    }

    fn offset(&mut self, n: u64) {
        self.offset = Some(n);
    }

    fn distinct(&mut self) {
        self.distinct = true;
    }
}

fn render_projection(projection: &Projection) -> String {
    format!(
        "{} AS {}",
        render_column(&projection.expression),
        quote_identifier(&projection.alias)
    )
}

fn render_column(column: &ColumnRef) -> String {
    match column {
        ColumnRef::Qualified {
            table_alias,
            column,
        } => qualified_column(table_alias, column),
        ColumnRef::Raw(expression) => expression.clone(),
    }
}

/// Terms joined by their connectors; the first connector is dropped.
fn render_terms(terms: &[ConditionTerm], bindings: &mut Vec<Value>) -> String {
    let mut sql = String::new();
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            sql.push_str(match term.conjunction {
                Conjunction::And => " AND ",
                Conjunction::Or => " OR ",
            });
        }
        sql.push_str(&render_condition(&term.condition, bindings));
    }
    sql
}

fn render_condition(condition: &Condition, bindings: &mut Vec<Value>) -> String {
    match condition {
        Condition::Compare {
            column,
            operator,
            value,
        } => {
            let rhs = match (operator, value) {
                (ComparisonOp::Is | ComparisonOp::IsNot, Value::Null) => "NULL".to_string(),
                (ComparisonOp::Is | ComparisonOp::IsNot, Value::Bool(true)) => "TRUE".to_string(),
                (ComparisonOp::Is | ComparisonOp::IsNot, Value::Bool(false)) => {
                    "FALSE".to_string()
                }
                _ => {
                    bindings.push(value.clone());
                    "?".to_string()
                }
            };
            format!("{} {} {}", render_column(column), operator.as_sql(), rhs)
        }
        Condition::ColumnCompare {
            left,
            operator,
            right,
        } => format!(
            "{} {} {}",
            render_column(left),
            operator.as_sql(),
            render_column(right)
        ),
        Condition::In {
            column,
            values,
            negated,
        } => {
            if values.is_empty() {
                // IN () is not valid SQL
                return if *negated { "1 = 1" } else { "1 = 0" }.to_string();
            }
            bindings.extend(values.iter().cloned());
            let placeholders = vec!["?"; values.len()].join(", ");
            format!(
                "{} {}IN ({})",
                render_column(column),
                if *negated { "NOT " } else { "" },
                placeholders
            )
        }
        Condition::Between {
            column,
            low,
            high,
            negated,
        } => {
            bindings.push(low.clone());
            bindings.push(high.clone());
            format!(
                "{} {}BETWEEN ? AND ?",
                render_column(column),
                if *negated { "NOT " } else { "" }
            )
        }
        Condition::Group(terms) => {
            if terms.is_empty() {
                "1 = 1".to_string()
            } else {
                format!("({})", render_terms(terms, bindings))
            }
        }
    }
}
