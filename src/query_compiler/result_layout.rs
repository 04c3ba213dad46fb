//! Result layout
//!
//! What the denormalizer needs to read the flat rows back: for every node of the
//! selection tree, the table alias its columns were projected under, its entity,
//! its unique column and, below the root, the multiplicity of the relation that
//! reached it.

use crate::entity_catalog::Multiplicity;
use crate::selection::FieldPath;

#[derive(Debug, Clone, PartialEq)]
pub struct AliasBinding {
    pub path: FieldPath,
    pub alias: String,
    pub entity: String,
    pub unique_column: String,
    /// `None` for the root
    pub multiplicity: Option<Multiplicity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultLayout {
    pub separator: String,
    pub bindings: Vec<AliasBinding>,
}

impl ResultLayout {
    pub fn new(separator: impl Into<String>) -> Self {
        ResultLayout {
            separator: separator.into(),
            bindings: Vec::new(),
        }
    }

    pub fn push(&mut self, binding: AliasBinding) {
        self.bindings.push(binding);
    }

    pub fn by_alias(&self, alias: &str) -> Option<&AliasBinding> {
        self.bindings.iter().find(|b| b.alias == alias)
    }

    pub fn by_path(&self, path: &FieldPath) -> Option<&AliasBinding> {
        self.bindings.iter().find(|b| &b.path == path)
    }

    pub fn root(&self) -> Option<&AliasBinding> {
        self.bindings.iter().find(|b| b.path.is_root())
    }

    /// Split a flat-row key into its table alias and field name at the first
    /// separator. Keys without a separator yield `None`.
    pub fn split_column<'c>(&self, column: &'c str) -> Option<(&'c str, &'c str)> {
        column.split_once(self.separator.as_str())
    }

    pub fn column_key(&self, alias: &str, field: &str) -> String {
        format!("{}{}{}", alias, self.separator, field)
    }
}
