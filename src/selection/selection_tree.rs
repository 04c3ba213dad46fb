//! Selection tree
//!
//! Built once per request from a [`FieldSelection`] and the entity catalog, then
//! only read. Each node knows its entity, its path from the root, the scalar
//! fields requested on it and the relation fields nested under it. Root-level
//! arguments (filter, grouping, having, ordering, pagination, distinct) live on
//! the tree itself; relation arguments live on each relation edge.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::field_selection::{FieldSelection, ReadRequest};
use super::filter_expr::FilterExpr;
use crate::entity_catalog::{EntityCatalog, RelationDescriptor};
use crate::query_compiler::errors::CompileError;

/// Relation field names from the root down to a node. The root is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root() -> Self {
        FieldPath(Vec::new())
    }

    pub fn child(&self, field: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(field.to_string());
        FieldPath(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub column: String,
    #[serde(default, alias = "order")]
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootArgs {
    /// `where`
    pub filter: Option<FilterExpr>,
    pub distinct: bool,
    pub group_by: Vec<String>,
    pub having: Option<FilterExpr>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationArgs {
    /// Join-condition filter
    pub on: Option<FilterExpr>,
    /// Raw join kind, resolved by the join planner
    pub join_type: Option<String>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionNode {
    pub entity: String,
    pub path: FieldPath,
    pub scalar_fields: Vec<String>,
    pub relations: Vec<RelationSelection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationSelection {
    pub field: String,
    pub args: RelationArgs,
    pub node: SelectionNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTree {
    pub root: SelectionNode,
    pub args: RootArgs,
}

impl SelectionTree {
    pub fn from_request(catalog: &EntityCatalog, request: &ReadRequest) -> Result<Self, CompileError> {
        Self::build(catalog, &request.entity, &request.selection)
    }

    pub fn build(
        catalog: &EntityCatalog,
        entity: &str,
        selection: &FieldSelection,
    ) -> Result<Self, CompileError> {
        if catalog.get(entity).is_none() {
            return Err(CompileError::UnknownEntity(entity.to_string()));
        }
        let root = build_node(catalog, entity, FieldPath::root(), &selection.selections)?;
        let args = parse_root_args(&selection.args)?;
        Ok(SelectionTree { root, args })
    }

    /// (parent path, child path) for every requested relation, depth-first
    pub fn parent_child_pairs(&self) -> Vec<(FieldPath, FieldPath)> {
        fn walk(node: &SelectionNode, pairs: &mut Vec<(FieldPath, FieldPath)>) {
            for relation in &node.relations {
                pairs.push((node.path.clone(), relation.node.path.clone()));
                walk(&relation.node, pairs);
            }
        }

        let mut pairs = Vec::new();
        walk(&self.root, &mut pairs);
        pairs
    }
}

fn build_node(
    catalog: &EntityCatalog,
    entity_name: &str,
    path: FieldPath,
    selections: &[FieldSelection],
) -> Result<SelectionNode, CompileError> {
    let entity = catalog
        .get(entity_name)
        .ok_or_else(|| CompileError::UnknownEntity(entity_name.to_string()))?;

    let mut node = SelectionNode {
        entity: entity_name.to_string(),
        path,
        scalar_fields: Vec::new(),
        relations: Vec::new(),
    };

    // repeated relation fields merge their sub-selections, as GraphQL field merging does
    let mut requested: Vec<(&str, &RelationDescriptor, &Map<String, Value>, Vec<FieldSelection>)> =
        Vec::new();

    for selection in selections {
        // introspection fields such as __typename never reach the database
        if selection.name.starts_with("__") {
            continue;
        }

        if let Some(relation) = entity.relation(&selection.name) {
            match requested.iter_mut().find(|(name, ..)| *name == selection.name) {
                Some((_, _, args, merged)) => {
                    if args.is_empty() {
                        *args = &selection.args;
                    } else if !selection.args.is_empty() && selection.args != **args {
                        return Err(CompileError::MalformedSelection(format!(
                            "relation `{}` is selected more than once with different arguments",
                            selection.name
                        )));
                    }
                    merged.extend(selection.selections.iter().cloned());
                }
                None => requested.push((
                    selection.name.as_str(),
                    relation,
                    &selection.args,
                    selection.selections.clone(),
                )),
            }
        } else if !node.scalar_fields.contains(&selection.name) {
            // validated against the entity by the field projector
            node.scalar_fields.push(selection.name.clone());
        }
    }

    for (field, relation, args, merged) in requested {
        if catalog.get(&relation.target_entity).is_none() {
            return Err(CompileError::InvalidRelationType {
                entity: entity_name.to_string(),
                field: field.to_string(),
                target: relation.target_entity.clone(),
            });
        }
        let child = build_node(catalog, &relation.target_entity, node.path.child(field), &merged)?;
        node.relations.push(RelationSelection {
            field: field.to_string(),
            args: parse_relation_args(args)?,
            node: child,
        });
    }

    Ok(node)
}

fn parse_root_args(args: &Map<String, Value>) -> Result<RootArgs, CompileError> {
    let mut root = RootArgs::default();
    for (key, value) in args {
        match key.as_str() {
            "where" => root.filter = FilterExpr::from_optional_json(Some(value))?,
            "distinct" => root.distinct = parse_bool(key, value)?,
            "groupBy" => root.group_by = parse_list(key, value)?,
            "having" => root.having = FilterExpr::from_optional_json(Some(value))?,
            "orderBy" => root.order_by = parse_list(key, value)?,
            "limit" => root.limit = parse_count(key, value)?,
            "offset" => root.offset = parse_count(key, value)?,
            other => log::debug!("Ignoring unrecognised root argument `{}`", other),
        }
    }
    Ok(root)
}

fn parse_relation_args(args: &Map<String, Value>) -> Result<RelationArgs, CompileError> {
    let mut relation = RelationArgs::default();
    for (key, value) in args {
        match key.as_str() {
            "on" => relation.on = FilterExpr::from_optional_json(Some(value))?,
            "joinType" => {
                relation.join_type = match value {
                    Value::Null => None,
                    Value::String(kind) => Some(kind.clone()),
                    other => return Err(CompileError::InvalidJoinType(other.to_string())),
                }
            }
            "orderBy" => relation.order_by = parse_list(key, value)?,
            "limit" => relation.limit = parse_count(key, value)?,
            "offset" => relation.offset = parse_count(key, value)?,
            other => log::debug!("Ignoring unrecognised relation argument `{}`", other),
        }
    }
    Ok(relation)
}

fn parse_bool(key: &str, value: &Value) -> Result<bool, CompileError> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(flag) => Ok(*flag),
        other => Err(CompileError::MalformedSelection(format!(
            "`{}` expects a boolean, got {}",
            key, other
        ))),
    }
}

fn parse_count(key: &str, value: &Value) -> Result<Option<u64>, CompileError> {
    match value {
        Value::Null => Ok(None),
        other => other.as_u64().map(Some).ok_or_else(|| {
            CompileError::MalformedSelection(format!(
                "`{}` expects a non-negative integer, got {}",
                key, other
            ))
        }),
    }
}

fn parse_list<T: serde::de::DeserializeOwned>(
    key: &str,
    value: &Value,
) -> Result<Vec<T>, CompileError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value.clone())
        .map_err(|e| CompileError::MalformedSelection(format!("`{}`: {}", key, e)))
}
