//! Result denormalizer
//!
//! Rebuilds the nested result from the flat rows of a compiled read.
//!
//! 1. Every row is split by table alias using the [`ResultLayout`].
//! 2. Each alias with a non-null unique id contributes one pooled object per id.
//!    A null id is an outer-join miss and contributes nothing.
//! 3. Each (parent, child) pair of the selection tree links the ids found in the
//!    same row. Child ids are deduplicated and sorted ascending.
//! 4. Root objects come out in first-seen row order and are hydrated
//!    recursively: a `one` relation becomes an object or `null`, a `many`
//!    relation an array.
//!
//! Sibling multi-valued relations are linked independently, so the result
//! says which children belong to a parent but not which pairs of siblings
//! appeared together in a row.

pub mod entity_id;
pub mod errors;
pub mod row_index;

pub use entity_id::EntityId;
pub use errors::DenormalizeError;
pub use row_index::RowIndex;

use serde_json::Value;

use crate::entity_catalog::Multiplicity;
use crate::query_compiler::ResultLayout;
use crate::selection::{SelectionNode, SelectionTree};

pub fn denormalize(
    rows: &[Value],
    tree: &SelectionTree,
    layout: &ResultLayout,
) -> Result<Vec<Value>, DenormalizeError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let index = RowIndex::build(rows, layout, &tree.parent_child_pairs())?;
    let hydrator = Hydrator {
        index: &index,
        layout,
    };

    let roots = index
        .root_ids
        .iter()
        .map(|id| hydrator.hydrate(&tree.root, id))
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "Denormalized {} row(s) into {} `{}` object(s)",
        rows.len(),
        roots.len(),
        tree.root.entity
    );
    Ok(roots)
}

struct Hydrator<'a> {
    index: &'a RowIndex,
    layout: &'a ResultLayout,
}

impl Hydrator<'_> {
    fn hydrate(&self, node: &SelectionNode, id: &EntityId) -> Result<Value, DenormalizeError> {
        let binding = self
            .layout
            .by_path(&node.path)
            .ok_or_else(|| DenormalizeError::MissingBinding {
                path: node.path.to_string(),
            })?;
        let mut object = self
            .index
            .object(&binding.alias, id)
            .cloned()
            .unwrap_or_default();

        for relation in &node.relations {
            let child = &relation.node;
            let multiplicity = self
                .layout
                .by_path(&child.path)
                .and_then(|b| b.multiplicity)
                .unwrap_or_default();
            let child_ids = self.index.children(&child.path, id);

            let value = match multiplicity {
                Multiplicity::One => {
                    if child_ids.len() > 1 {
                        log::warn!(
                            "`{}` is a single-valued relation but id {} has {} matches; using the first",
                            child.path,
                            id,
                            child_ids.len()
                        );
                    }
                    match child_ids.first() {
                        Some(child_id) => self.hydrate(child, child_id)?,
                        None => Value::Null,
                    }
                }
                Multiplicity::Many => Value::Array(
                    child_ids
                        .iter()
                        .map(|child_id| self.hydrate(child, child_id))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
            };
            object.insert(relation.field.clone(), value);
        }

        Ok(Value::Object(object))
    }
}
