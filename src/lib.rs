//! relnest - nested relational reads over a single flat SQL statement
//!
//! This crate provides:
//! - An entity catalog (tables, unique columns, relations) loaded from YAML
//! - Selection trees built from parsed field-selection input
//! - A query compiler that turns a selection tree into one joined statement
//! - A result denormalizer that rebuilds the nested shape from the flat rows

pub mod config;
pub mod entity_catalog;
pub mod executor;
pub mod query_builder;
pub mod query_compiler;
pub mod result_denormalizer;
pub mod selection;

pub use executor::{read_nested, ExecutionError, ReadError, StatementExecutor};
pub use query_compiler::{compile_read, CompiledRead};
pub use result_denormalizer::denormalize;
