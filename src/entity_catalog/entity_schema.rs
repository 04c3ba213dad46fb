//! Entity descriptors and the catalog that owns them.
//!
//! The catalog is a flat map keyed by entity name. Relations reference their
//! target entity by name and are resolved through [`EntityCatalog::get`] at
//! compile time, so self-referencing and mutually-referencing entities need no
//! shared ownership.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::CatalogError;

lazy_static! {
    /// Entity, field and column names. Double underscores are reserved for
    /// aggregate field names (`price__sum`) so they are rejected here.
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z0-9]*(?:_[A-Za-z0-9]+)*$").expect("valid identifier regex");
    /// Table names may carry a schema qualifier (`public.authors`).
    static ref TABLE_NAME: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("valid table name regex");
}

/// Returns true when `name` may be used as an entity, field or column name.
pub fn is_plain_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Scalar type tags understood by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    #[serde(rename = "ID")]
    Id,
    Int,
    Float,
    Boolean,
    String,
}

impl ScalarType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Float)
    }
}

impl FromStr for ScalarType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ID" => Ok(ScalarType::Id),
            "Int" => Ok(ScalarType::Int),
            "Float" => Ok(ScalarType::Float),
            "Boolean" => Ok(ScalarType::Boolean),
            "String" => Ok(ScalarType::String),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ScalarType::Id => "ID",
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::Boolean => "Boolean",
            ScalarType::String => "String",
        };
        f.write_str(tag)
    }
}

/// Whether a relation field resolves to a single object or a list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    One,
    #[default]
    Many,
}

/// Associative table used by many-to-many relations.
///
/// `from_column` joins against the parent's `from_column`, `to_column` against
/// the child's `to_column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThroughDescriptor {
    pub table: String,
    pub from_column: String,
    pub to_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    /// Name of the target entity in the catalog
    pub target_entity: String,
    /// Column on the parent table
    pub from_column: String,
    /// Column on the child table
    pub to_column: String,
    pub through: Option<ThroughDescriptor>,
    pub multiplicity: Multiplicity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarType),
    Relation(RelationDescriptor),
}

/// One logical record type backed by one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub name: String,
    pub table: String,
    pub unique_column: String,
    pub fields: HashMap<String, FieldKind>,
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldKind> {
        self.fields.get(name)
    }

    /// Scalar type of a column. The unique column counts as an `ID` scalar even
    /// when it is not listed in the field map.
    pub fn scalar_type(&self, name: &str) -> Option<ScalarType> {
        match self.fields.get(name) {
            Some(FieldKind::Scalar(scalar)) => Some(*scalar),
            Some(FieldKind::Relation(_)) => None,
            None if name == self.unique_column => Some(ScalarType::Id),
            None => None,
        }
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        match self.fields.get(name) {
            Some(FieldKind::Relation(relation)) => Some(relation),
            _ => None,
        }
    }
}

/// Name-keyed set of entity descriptors, validated on construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCatalog {
    entities: HashMap<String, EntityDescriptor>,
}

impl EntityCatalog {
    pub fn new(descriptors: Vec<EntityDescriptor>) -> Result<Self, CatalogError> {
        let mut entities = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            validate_descriptor(&descriptor)?;
            if entities.contains_key(&descriptor.name) {
                return Err(CatalogError::DuplicateEntity {
                    entity: descriptor.name,
                });
            }
            entities.insert(descriptor.name.clone(), descriptor);
        }

        let catalog = EntityCatalog { entities };
        catalog.validate_relations()?;
        log::debug!("Entity catalog ready with {} entities", catalog.len());
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.get(name)
    }

    /// Entity names in sorted order
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn validate_relations(&self) -> Result<(), CatalogError> {
        for entity in self.entities.values() {
            for (field, kind) in &entity.fields {
                if let FieldKind::Relation(relation) = kind {
                    if !self.entities.contains_key(&relation.target_entity) {
                        return Err(CatalogError::InvalidRelationType {
                            entity: entity.name.clone(),
                            field: field.clone(),
                            target: relation.target_entity.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

fn validate_descriptor(descriptor: &EntityDescriptor) -> Result<(), CatalogError> {
    let entity = &descriptor.name;
    check_identifier(entity, "entity name")?;
    if !TABLE_NAME.is_match(&descriptor.table) {
        return Err(CatalogError::identifier_error_with_context(
            descriptor.table.clone(),
            format!("table of entity `{}`", entity),
        ));
    }
    check_identifier(
        &descriptor.unique_column,
        &format!("unique column of entity `{}`", entity),
    )?;

    for (field, kind) in &descriptor.fields {
        check_identifier(field, &format!("field of entity `{}`", entity))?;
        if let FieldKind::Relation(relation) = kind {
            let context = format!("relation `{}.{}`", entity, field);
            check_identifier(&relation.from_column, &context)?;
            check_identifier(&relation.to_column, &context)?;
            if let Some(through) = &relation.through {
                if !TABLE_NAME.is_match(&through.table) {
                    return Err(CatalogError::identifier_error_with_context(
                        through.table.clone(),
                        context,
                    ));
                }
                check_identifier(&through.from_column, &context)?;
                check_identifier(&through.to_column, &context)?;
            }
        }
    }
    Ok(())
}

fn check_identifier(name: &str, context: &str) -> Result<(), CatalogError> {
    if is_plain_identifier(name) {
        Ok(())
    } else {
        Err(CatalogError::identifier_error_with_context(name, context))
    }
}
