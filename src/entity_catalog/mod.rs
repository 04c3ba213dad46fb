pub mod config;
pub mod entity_schema;
pub mod errors;

pub use config::{
    load_catalog_from_yaml_content, load_catalog_from_yaml_file, EntityCatalogConfig,
};
pub use entity_schema::{
    is_plain_identifier, EntityCatalog, EntityDescriptor, FieldKind, Multiplicity,
    RelationDescriptor, ScalarType, ThroughDescriptor,
};
pub use errors::CatalogError;
