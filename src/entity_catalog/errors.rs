//! # Entity Catalog Error Types
//!
//! Errors raised while loading and validating entity descriptors.
//!
//! ## Error Categories
//!
//! - **Definition Errors**: duplicate entities, bad identifiers, unknown scalar tags
//! - **Relation Errors**: relations pointing at entities that are not in the catalog
//! - **Configuration Errors**: file I/O and YAML parsing issues during loading

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("Entity `{entity}` is defined more than once")]
    DuplicateEntity { entity: String },
    #[error("Invalid relation type `{target}` detected in entity `{entity}` (field `{field}`)")]
    InvalidRelationType {
        entity: String,
        field: String,
        target: String,
    },
    #[error("Invalid identifier `{name}` ({context})")]
    InvalidIdentifier { name: String, context: String },
    #[error("Unknown scalar type `{type_name}` for field `{field}` in entity `{entity}`")]
    UnknownScalarType {
        entity: String,
        field: String,
        type_name: String,
    },
    #[error("Failed to read configuration file: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse configuration: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl CatalogError {
    /// Create an InvalidIdentifier error naming where the identifier was found
    ///
    /// # Example
    /// ```ignore
    /// CatalogError::identifier_error_with_context("book__id", "field of entity `Book`")
    /// ```
    pub fn identifier_error_with_context(
        name: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        CatalogError::InvalidIdentifier {
            name: name.into(),
            context: context.into(),
        }
    }
}
