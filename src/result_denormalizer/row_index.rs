//! Single pass over the flat rows.
//!
//! Builds the object pool (alias → id → scalar fields), the adjacency map
//! (child path → parent id → child ids) and the root ids in first-seen order.
//! Everything is frozen before hydration starts.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::{Map, Value};

use crate::query_compiler::{AliasBinding, ResultLayout};
use crate::selection::FieldPath;

use super::entity_id::EntityId;
use super::errors::DenormalizeError;

pub type ObjectPool = HashMap<String, HashMap<EntityId, Map<String, Value>>>;

#[derive(Debug, Default)]
pub struct RowIndex {
    pub pool: ObjectPool,
    /// Keyed by child path; child ids ascend
    pub adjacency: HashMap<FieldPath, HashMap<EntityId, Vec<EntityId>>>,
    pub root_ids: Vec<EntityId>,
}

impl RowIndex {
    pub fn build(
        rows: &[Value],
        layout: &ResultLayout,
        relations: &[(FieldPath, FieldPath)],
    ) -> Result<Self, DenormalizeError> {
        let root = layout.root().ok_or_else(|| DenormalizeError::MissingBinding {
            path: FieldPath::root().to_string(),
        })?;
        let edges = resolve_edges(layout, relations)?;

        let mut pool = ObjectPool::new();
        let mut adjacency: HashMap<FieldPath, HashMap<EntityId, BTreeSet<EntityId>>> =
            HashMap::new();
        let mut root_ids = Vec::new();
        let mut seen_roots = HashSet::new();

        for (index, row) in rows.iter().enumerate() {
            let row = row
                .as_object()
                .ok_or(DenormalizeError::RowNotObject { index })?;
            let columns = split_row(row, layout)?;

            let mut ids: HashMap<&str, EntityId> = HashMap::new();
            for binding in &layout.bindings {
                let fields = columns.get(binding.alias.as_str());
                let is_root = binding.alias == root.alias;
                let Some(id) = read_id(row, layout, binding, fields.is_some() || is_root, index)?
                else {
                    continue;
                };
                upsert(&mut pool, binding, &id, fields.map(Vec::as_slice).unwrap_or_default());
                ids.insert(binding.alias.as_str(), id);
            }

            if let Some(root_id) = ids.get(root.alias.as_str()) {
                if seen_roots.insert(root_id.clone()) {
                    root_ids.push(root_id.clone());
                }
            }

            for (parent, child) in &edges {
                if let (Some(parent_id), Some(child_id)) =
                    (ids.get(parent.alias.as_str()), ids.get(child.alias.as_str()))
                {
                    adjacency
                        .entry(child.path.clone())
                        .or_default()
                        .entry(parent_id.clone())
                        .or_default()
                        .insert(child_id.clone());
                }
            }
        }

        let adjacency = adjacency
            .into_iter()
            .map(|(path, by_parent)| {
                let by_parent = by_parent
                    .into_iter()
                    .map(|(parent, children)| (parent, children.into_iter().collect()))
                    .collect();
                (path, by_parent)
            })
            .collect();

        Ok(RowIndex {
            pool,
            adjacency,
            root_ids,
        })
    }

    pub fn object(&self, alias: &str, id: &EntityId) -> Option<&Map<String, Value>> {
        self.pool.get(alias).and_then(|objects| objects.get(id))
    }

    pub fn children(&self, child_path: &FieldPath, parent_id: &EntityId) -> &[EntityId] {
        self.adjacency
            .get(child_path)
            .and_then(|by_parent| by_parent.get(parent_id))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn resolve_edges<'l>(
    layout: &'l ResultLayout,
    relations: &[(FieldPath, FieldPath)],
) -> Result<Vec<(&'l AliasBinding, &'l AliasBinding)>, DenormalizeError> {
    let lookup = move |path: &FieldPath| {
        layout
            .by_path(path)
            .ok_or_else(|| DenormalizeError::MissingBinding {
                path: path.to_string(),
            })
    };
    relations
        .iter()
        .map(|(parent, child)| Ok((lookup(parent)?, lookup(child)?)))
        .collect()
}

/// Group the row's columns by alias, rejecting columns the layout cannot place.
fn split_row<'r>(
    row: &'r Map<String, Value>,
    layout: &ResultLayout,
) -> Result<HashMap<&'r str, Vec<(&'r str, &'r Value)>>, DenormalizeError> {
    let mut columns: HashMap<&str, Vec<(&str, &Value)>> = HashMap::new();
    for (key, value) in row {
        let (alias, field) =
            layout
                .split_column(key)
                .ok_or_else(|| DenormalizeError::UnaliasedColumn {
                    column: key.clone(),
                    separator: layout.separator.clone(),
                })?;
        if layout.by_alias(alias).is_none() {
            log::error!("Row column `{}` does not belong to any compiled alias", key);
            return Err(DenormalizeError::UnknownAlias {
                alias: alias.to_string(),
                column: key.clone(),
            });
        }
        columns.entry(alias).or_default().push((field, value));
    }
    Ok(columns)
}

/// An alias with no columns at all in the row is an outer-join miss. One whose
/// other columns are present must also carry its unique column.
fn read_id(
    row: &Map<String, Value>,
    layout: &ResultLayout,
    binding: &AliasBinding,
    required: bool,
    index: usize,
) -> Result<Option<EntityId>, DenormalizeError> {
    let key = layout.column_key(&binding.alias, &binding.unique_column);
    if !required && !row.contains_key(&key) {
        return Ok(None);
    }
    let value = row.get(&key).ok_or_else(|| {
        log::error!("Unique column `{}` missing from row {}", key, index);
        DenormalizeError::MissingUniqueColumn {
            alias: binding.alias.clone(),
            column: key.clone(),
            index,
        }
    })?;
    EntityId::from_value(value).map_err(|value| DenormalizeError::InvalidId {
        alias: binding.alias.clone(),
        value: value.to_string(),
    })
}

/// First-seen values win; later rows that disagree are logged.
fn upsert(pool: &mut ObjectPool, binding: &AliasBinding, id: &EntityId, fields: &[(&str, &Value)]) {
    let object = pool
        .entry(binding.alias.clone())
        .or_default()
        .entry(id.clone())
        .or_default();

    for (field, value) in fields {
        match object.get(*field) {
            None => {
                object.insert(field.to_string(), (*value).clone());
            }
            Some(existing) if existing != *value => {
                log::warn!(
                    "Rows disagree on {}.{} for id {}: keeping {}, ignoring {}",
                    binding.alias,
                    field,
                    id,
                    existing,
                    value
                );
            }
            Some(_) => {}
        }
    }
}
