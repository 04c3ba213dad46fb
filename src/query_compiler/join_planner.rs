//! Join Planner
//!
//! Walks the relation fields of a selection tree depth-first in selection order.
//! For every relation it emits the join(s) that reach the child table, projects
//! the child's requested scalars plus its unique column under a fresh alias, and
//! records the alias in the [`ResultLayout`].
//!
//! Direct relation:
//! ```text
//! <kind> "books" AS "Book" ON "base"."id" = "Book"."author_id" [AND <on filter>]
//! ```
//! Relation through an associative table:
//! ```text
//! <kind> "book_tags" AS "book_tags" ON "Book"."book_id" = "book_tags"."book_id"
//! <kind> "tags" AS "Tag" ON "book_tags"."tag_id" = "Tag"."id" [AND <on filter>]
//! ```

use crate::entity_catalog::{EntityCatalog, EntityDescriptor, RelationDescriptor};
use crate::query_builder::{ColumnRef, ComparisonOp, Condition, JoinKind, QueryBuilder};
use crate::selection::{RelationSelection, SelectionNode};

use super::alias_registry::AliasRegistry;
use super::errors::CompileError;
use super::field_projector::project_fields;
use super::predicate_compiler::{PredicateCompiler, PredicateContext};
use super::result_layout::{AliasBinding, ResultLayout};

/// Resolve a requested join kind; no kind means inner join.
pub fn parse_join_kind(join_type: Option<&str>) -> Result<JoinKind, CompileError> {
    let Some(raw) = join_type else {
        return Ok(JoinKind::Inner);
    };
    let kind = match raw.to_ascii_lowercase().as_str() {
        "join" | "inner" | "innerjoin" => JoinKind::Inner,
        "left" | "leftjoin" => JoinKind::Left,
        "right" | "rightjoin" => JoinKind::Right,
        "full" | "fullouter" | "fullouterjoin" => JoinKind::FullOuter,
        "cross" | "crossjoin" => JoinKind::Cross,
        _ => return Err(CompileError::InvalidJoinType(raw.to_string())),
    };
    Ok(kind)
}

pub struct JoinPlanner<'a> {
    catalog: &'a EntityCatalog,
    separator: &'a str,
    aliases: &'a mut AliasRegistry,
}

impl<'a> JoinPlanner<'a> {
    pub fn new(
        catalog: &'a EntityCatalog,
        separator: &'a str,
        aliases: &'a mut AliasRegistry,
    ) -> Self {
        JoinPlanner {
            catalog,
            separator,
            aliases,
        }
    }

    /// Emit joins for every relation below `parent`, whose table is `parent_alias`.
    pub fn plan<B: QueryBuilder>(
        &mut self,
        parent: &SelectionNode,
        parent_alias: &str,
        builder: &mut B,
        layout: &mut ResultLayout,
    ) -> Result<(), CompileError> {
        let parent_entity = self
            .catalog
            .get(&parent.entity)
            .ok_or_else(|| CompileError::UnknownEntity(parent.entity.clone()))?;

        for selection in &parent.relations {
            self.plan_relation(parent_entity, parent_alias, selection, builder, layout)?;
        }
        Ok(())
    }

    fn plan_relation<B: QueryBuilder>(
        &mut self,
        parent_entity: &EntityDescriptor,
        parent_alias: &str,
        selection: &RelationSelection,
        builder: &mut B,
        layout: &mut ResultLayout,
    ) -> Result<(), CompileError> {
        let relation = parent_entity.relation(&selection.field).ok_or_else(|| {
            CompileError::UnknownField {
                entity: parent_entity.name.clone(),
                field: selection.field.clone(),
            }
        })?;
        let child_entity = self.catalog.get(&relation.target_entity).ok_or_else(|| {
            CompileError::InvalidRelationType {
                entity: parent_entity.name.clone(),
                field: selection.field.clone(),
                target: relation.target_entity.clone(),
            }
        })?;

        let kind = parse_join_kind(selection.args.join_type.as_deref())?;
        let child_alias = self.aliases.assign(&child_entity.name);

        let on_filter = match &selection.args.on {
            Some(expr) => {
                PredicateCompiler::new(child_entity, &child_alias, PredicateContext::JoinCondition)
                    .compile_join_conditions(expr)?
            }
            None => Vec::new(),
        };
        if kind == JoinKind::Cross && !on_filter.is_empty() {
            return Err(CompileError::invalid_operand(
                "on",
                format!("cross join on `{}` takes no join condition", selection.field),
            ));
        }

        if !selection.args.order_by.is_empty()
            || selection.args.limit.is_some()
            || selection.args.offset.is_some()
        {
            log::debug!(
                "Ignoring orderBy/limit/offset on relation `{}`; pagination applies to the root only",
                selection.node.path
            );
        }

        self.emit_joins(
            kind,
            relation,
            parent_alias,
            child_entity,
            &child_alias,
            on_filter,
            builder,
        );
        log::debug!(
            "Joined `{}` as \"{}\" ({:?})",
            selection.node.path,
            child_alias,
            kind
        );

        builder.select(project_fields(
            child_entity,
            &child_alias,
            &selection.node.scalar_fields,
            self.separator,
        )?);
        layout.push(AliasBinding {
            path: selection.node.path.clone(),
            alias: child_alias.clone(),
            entity: child_entity.name.clone(),
            unique_column: child_entity.unique_column.clone(),
            multiplicity: Some(relation.multiplicity),
        });

        self.plan(&selection.node, &child_alias, builder, layout)
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_joins<B: QueryBuilder>(
        &mut self,
        kind: JoinKind,
        relation: &RelationDescriptor,
        parent_alias: &str,
        child_entity: &EntityDescriptor,
        child_alias: &str,
        on_filter: Vec<Condition>,
        builder: &mut B,
    ) {
        let key = |left_alias: &str, left: &str, right_alias: &str, right: &str| {
            if kind == JoinKind::Cross {
                Vec::new()
            } else {
                vec![Condition::ColumnCompare {
                    left: ColumnRef::qualified(left_alias, left),
                    operator: ComparisonOp::Eq,
                    right: ColumnRef::qualified(right_alias, right),
                }]
            }
        };

        match &relation.through {
            None => {
                let mut on = key(
                    parent_alias,
                    &relation.from_column,
                    child_alias,
                    &relation.to_column,
                );
                on.extend(on_filter);
                builder.join(kind, &child_entity.table, child_alias, on);
            }
            Some(through) => {
                // alias from the bare table name when it is schema-qualified
                let preferred = through.table.rsplit('.').next().unwrap_or(&through.table);
                let through_alias = self.aliases.assign(preferred);
                builder.join(
                    kind,
                    &through.table,
                    &through_alias,
                    key(
                        parent_alias,
                        &relation.from_column,
                        &through_alias,
                        &through.from_column,
                    ),
                );

                let mut on = key(
                    &through_alias,
                    &through.to_column,
                    child_alias,
                    &relation.to_column,
                );
                on.extend(on_filter);
                builder.join(kind, &child_entity.table, child_alias, on);
            }
        }
    }
}
