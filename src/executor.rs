//! Execution boundary
//!
//! Compilation and denormalization never suspend. Running the statement is the
//! one async step of a read, delegated to a [`StatementExecutor`] supplied by
//! the caller (a database driver, an HTTP client, a test double).

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::CompilerConfig;
use crate::entity_catalog::EntityCatalog;
use crate::query_builder::SqlStatement;
use crate::query_compiler::{compile_read, CompileError};
use crate::result_denormalizer::{denormalize, DenormalizeError};
use crate::selection::{ReadRequest, SelectionTree};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionError {
    #[error("Statement execution failed: {0}")]
    Failed(String),
    #[error("Unexpected row format: {0}")]
    RowFormat(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReadError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Denormalize(#[from] DenormalizeError),
}

/// Runs one compiled statement and returns its rows as JSON objects keyed by
/// projected column alias.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn fetch_rows(&self, statement: &SqlStatement) -> Result<Vec<Value>, ExecutionError>;
}

/// Compile `request`, fetch its rows with a single executor call and rebuild the
/// nested result.
pub async fn read_nested<E>(
    executor: &E,
    catalog: &EntityCatalog,
    config: &CompilerConfig,
    request: &ReadRequest,
) -> Result<Vec<Value>, ReadError>
where
    E: StatementExecutor + ?Sized,
{
    let tree = SelectionTree::from_request(catalog, request)?;
    let compiled = compile_read(catalog, config, &tree)?;

    let rows = executor.fetch_rows(&compiled.statement).await.map_err(|e| {
        log::error!("Read of `{}` failed: {}", request.entity, e);
        e
    })?;
    log::debug!("Fetched {} row(s) for `{}`", rows.len(), request.entity);

    Ok(denormalize(&rows, &tree, &compiled.layout)?)
}
