use super::entity_schema::{
    EntityCatalog, EntityDescriptor, FieldKind, Multiplicity, RelationDescriptor, ScalarType,
    ThroughDescriptor,
};
use super::errors::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Entity catalog configuration.
///
/// Entities are defined in YAML with the following structure:
///
/// ```yaml
/// entities:
///   - name: Author              # Entity name used by relations and requests
///     table: authors            # Backing table
///     unique_column: id         # Deduplication key (defaults to `id`)
///     fields:
///       id: ID                  # Scalar: ID, Int, Float, Boolean, String
///       name: String
///       books:                  # Relation
///         target: Book
///         from: id              # column on authors
///         to: author_id         # column on books
///         multiplicity: many    # one | many (default many)
///   - name: Book
///     table: books
///     fields:
///       id: ID
///       title: String
///       tags:
///         target: Tag
///         from: id
///         to: id
///         through:              # associative table
///           table: book_tags
///           from: book_id       # joins books.id
///           to: tag_id          # joins tags.id
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCatalogConfig {
    pub entities: Vec<EntityDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    pub table: String,
    #[serde(default = "default_unique_column")]
    pub unique_column: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDefinition>,
}

fn default_unique_column() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldDefinition {
    Scalar(String),
    Relation(RelationDefinition),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationDefinition {
    pub target: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub through: Option<ThroughDefinition>,
    #[serde(default)]
    pub multiplicity: Multiplicity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughDefinition {
    pub table: String,
    pub from: String,
    pub to: String,
}

impl EntityCatalogConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
        serde_yaml::from_str(content).map_err(|e| CatalogError::ConfigParseError {
            error: e.to_string(),
        })
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CatalogError::ConfigReadError {
            error: format!("{}: {}", path.display(), e),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Convert the raw definitions into a validated catalog
    pub fn to_catalog(&self) -> Result<EntityCatalog, CatalogError> {
        if self.entities.is_empty() {
            return Err(CatalogError::InvalidConfig {
                message: "no entities defined".to_string(),
            });
        }

        let descriptors = self
            .entities
            .iter()
            .map(EntityDefinition::to_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        EntityCatalog::new(descriptors)
    }
}

impl EntityDefinition {
    fn to_descriptor(&self) -> Result<EntityDescriptor, CatalogError> {
        let mut fields = std::collections::HashMap::with_capacity(self.fields.len());
        for (field, definition) in &self.fields {
            let kind = match definition {
                FieldDefinition::Scalar(tag) => {
                    let scalar = tag.parse::<ScalarType>().map_err(|_| {
                        CatalogError::UnknownScalarType {
                            entity: self.name.clone(),
                            field: field.clone(),
                            type_name: tag.clone(),
                        }
                    })?;
                    FieldKind::Scalar(scalar)
                }
                FieldDefinition::Relation(relation) => FieldKind::Relation(RelationDescriptor {
                    target_entity: relation.target.clone(),
                    from_column: relation.from.clone(),
                    to_column: relation.to.clone(),
                    through: relation.through.as_ref().map(|through| ThroughDescriptor {
                        table: through.table.clone(),
                        from_column: through.from.clone(),
                        to_column: through.to.clone(),
                    }),
                    multiplicity: relation.multiplicity,
                }),
            };
            fields.insert(field.clone(), kind);
        }

        Ok(EntityDescriptor {
            name: self.name.clone(),
            table: self.table.clone(),
            unique_column: self.unique_column.clone(),
            fields,
        })
    }
}

/// Load and validate a catalog from YAML text
pub fn load_catalog_from_yaml_content(content: &str) -> Result<EntityCatalog, CatalogError> {
    EntityCatalogConfig::from_yaml_str(content)?.to_catalog()
}

/// Load and validate a catalog from a YAML file
pub fn load_catalog_from_yaml_file<P: AsRef<Path>>(path: P) -> Result<EntityCatalog, CatalogError> {
    let config = EntityCatalogConfig::from_yaml_file(path.as_ref())?;
    let catalog = config.to_catalog()?;
    log::info!(
        "Loaded {} entities from {}",
        catalog.len(),
        path.as_ref().display()
    );
    Ok(catalog)
}
