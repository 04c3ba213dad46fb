//! Query Assembler
//!
//! Drives one compilation: FROM and root projection, the join planner, then the
//! root-only clauses (row filter, grouping, having, ordering, pagination,
//! distinct). The statement builder is the only mutable state.

use crate::config::CompilerConfig;
use crate::entity_catalog::EntityCatalog;
use crate::query_builder::{QueryBuilder, SortDirection};
use crate::selection::SelectionTree;

use super::alias_registry::AliasRegistry;
use super::errors::CompileError;
use super::field_projector::{project_fields, resolve_column, resolve_plain_column};
use super::join_planner::JoinPlanner;
use super::predicate_compiler::{PredicateCompiler, PredicateContext};
use super::result_layout::{AliasBinding, ResultLayout};

pub fn parse_sort_direction(direction: Option<&str>) -> Result<SortDirection, CompileError> {
    match direction.map(|d| d.to_ascii_lowercase()).as_deref() {
        None | Some("asc") => Ok(SortDirection::Asc),
        Some("desc") => Ok(SortDirection::Desc),
        Some(_) => Err(CompileError::InvalidSortDirection(
            direction.unwrap_or_default().to_string(),
        )),
    }
}

/// Requested limit, else the configured default, clamped to the configured max.
pub fn effective_limit(config: &CompilerConfig, requested: Option<u64>) -> Option<u64> {
    let limit = requested.or(config.default_limit)?;
    Some(match config.max_limit {
        Some(max) if limit > max => {
            log::debug!("Clamping limit {} to max_limit {}", limit, max);
            max
        }
        _ => limit,
    })
}

pub struct QueryAssembler<'a> {
    catalog: &'a EntityCatalog,
    config: &'a CompilerConfig,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(catalog: &'a EntityCatalog, config: &'a CompilerConfig) -> Self {
        QueryAssembler { catalog, config }
    }

    pub fn assemble<B: QueryBuilder>(
        &self,
        tree: &SelectionTree,
        builder: &mut B,
    ) -> Result<ResultLayout, CompileError> {
        let root = self
            .catalog
            .get(&tree.root.entity)
            .ok_or_else(|| CompileError::UnknownEntity(tree.root.entity.clone()))?;
        let base = self.config.base_alias.as_str();
        let separator = self.config.alias_separator.as_str();
        let args = &tree.args;

        builder.from_table(&root.table, base);
        builder.select(project_fields(root, base, &tree.root.scalar_fields, separator)?);

        let mut layout = ResultLayout::new(separator);
        layout.push(AliasBinding {
            path: tree.root.path.clone(),
            alias: base.to_string(),
            entity: root.name.clone(),
            unique_column: root.unique_column.clone(),
            multiplicity: None,
        });

        let mut aliases = AliasRegistry::with_base(base);
        JoinPlanner::new(self.catalog, separator, &mut aliases).plan(
            &tree.root,
            base,
            builder,
            &mut layout,
        )?;

        if let Some(filter) = &args.filter {
            let terms = PredicateCompiler::new(root, base, PredicateContext::Filter)
                .compile_terms(filter)?;
            for term in terms {
                builder.where_condition(term.conjunction, term.condition);
            }
        }

        for column in &args.group_by {
            builder.group_by(resolve_plain_column(root, base, column)?);
        }

        if let Some(having) = &args.having {
            let terms = PredicateCompiler::new(root, base, PredicateContext::Having)
                .compile_terms(having)?;
            for term in terms {
                builder.having_condition(term.conjunction, term.condition);
            }
        }

        for item in &args.order_by {
            let direction = parse_sort_direction(item.direction.as_deref())?;
            builder.order_by(resolve_column(root, base, &item.column)?, direction);
        }

        if let Some(limit) = effective_limit(self.config, args.limit) {
            builder.limit(limit);
        }
        if let Some(offset) = args.offset {
            builder.offset(offset);
        }
        if args.distinct {
            builder.distinct();
        }

        Ok(layout)
    }
}
