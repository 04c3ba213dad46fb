//! Field Projector
//!
//! Resolves requested scalar names to SELECT items for one table alias:
//! - plain fields become `"alias"."field" AS "alias<sep>field"`
//! - aggregate names (`price__sum`, `id__count_distinct`) become raw aggregate
//!   expressions exposed under the same composite name
//! - the entity's unique column is always projected so rows can be deduplicated

use crate::entity_catalog::EntityDescriptor;
use crate::query_builder::common::qualified_column;
use crate::query_builder::{ColumnRef, Projection};

use super::errors::CompileError;

/// Joins a source column and an aggregate function in a field name
pub const AGGREGATE_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    CountDistinct,
    Min,
    Max,
    Sum,
    Avg,
}

impl AggregateFn {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregateFn::Count),
            "count_distinct" => Some(AggregateFn::CountDistinct),
            "min" => Some(AggregateFn::Min),
            "max" => Some(AggregateFn::Max),
            "sum" => Some(AggregateFn::Sum),
            "avg" => Some(AggregateFn::Avg),
            _ => None,
        }
    }

    /// min/max/sum/avg are only offered on Int and Float fields
    pub fn requires_numeric(&self) -> bool {
        !matches!(self, AggregateFn::Count | AggregateFn::CountDistinct)
    }

    pub fn expression(&self, table_alias: &str, column: &str) -> String {
        let target = qualified_column(table_alias, column);
        match self {
            AggregateFn::Count => format!("count({})", target),
            AggregateFn::CountDistinct => format!("count(distinct {})", target),
            AggregateFn::Min => format!("min({})", target),
            AggregateFn::Max => format!("max({})", target),
            AggregateFn::Sum => format!("sum({})", target),
            AggregateFn::Avg => format!("avg({})", target),
        }
    }
}

/// `<alias><separator><field>`, the key a flat row carries for this column
pub fn aliased_column_name(table_alias: &str, separator: &str, field: &str) -> String {
    format!("{}{}{}", table_alias, separator, field)
}

/// Resolve a scalar or aggregate field name of `entity` to a column expression.
pub fn resolve_column(
    entity: &EntityDescriptor,
    table_alias: &str,
    name: &str,
) -> Result<ColumnRef, CompileError> {
    match name.split_once(AGGREGATE_SEPARATOR) {
        Some((source, function_name)) => {
            let scalar = entity
                .scalar_type(source)
                .ok_or_else(|| unknown_field(entity, name))?;
            let function = AggregateFn::parse(function_name)
                .filter(|f| !f.requires_numeric() || scalar.is_numeric())
                .ok_or_else(|| CompileError::UnsupportedAggregate {
                    entity: entity.name.clone(),
                    field: source.to_string(),
                    function: function_name.to_string(),
                })?;
            Ok(ColumnRef::Raw(function.expression(table_alias, source)))
        }
        None => resolve_plain_column(entity, table_alias, name),
    }
}

/// Resolve a plain scalar field; aggregate names are not fields here.
pub fn resolve_plain_column(
    entity: &EntityDescriptor,
    table_alias: &str,
    name: &str,
) -> Result<ColumnRef, CompileError> {
    if entity.scalar_type(name).is_some() {
        Ok(ColumnRef::qualified(table_alias, name))
    } else {
        Err(unknown_field(entity, name))
    }
}

/// Projections for the requested scalar fields plus the unique column.
pub fn project_fields(
    entity: &EntityDescriptor,
    table_alias: &str,
    fields: &[String],
    separator: &str,
) -> Result<Vec<Projection>, CompileError> {
    let mut projections = Vec::with_capacity(fields.len() + 1);
    for field in fields {
        projections.push(Projection {
            expression: resolve_column(entity, table_alias, field)?,
            alias: aliased_column_name(table_alias, separator, field),
        });
    }

    if !fields.iter().any(|f| f == &entity.unique_column) {
        projections.push(Projection {
            expression: ColumnRef::qualified(table_alias, entity.unique_column.as_str()),
            alias: aliased_column_name(table_alias, separator, &entity.unique_column),
        });
    }

    Ok(projections)
}

fn unknown_field(entity: &EntityDescriptor, field: &str) -> CompileError {
    CompileError::UnknownField {
        entity: entity.name.clone(),
        field: field.to_string(),
    }
}
