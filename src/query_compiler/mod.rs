//! Query compiler
//!
//! Compiles a [`SelectionTree`] into one flat joined statement plus the
//! [`ResultLayout`] needed to rebuild the nested result from its rows.
//!
//! ```text
//! SelectionTree ──► QueryAssembler ──► FROM + root projection
//!                        │
//!                        ├──► JoinPlanner ──► joins + child projections (recursive)
//!                        │         └──► PredicateCompiler (ON)
//!                        ├──► PredicateCompiler (WHERE, HAVING)
//!                        └──► GROUP BY / ORDER BY / LIMIT / OFFSET / DISTINCT
//! ```

pub mod alias_registry;
pub mod errors;
pub mod field_projector;
pub mod join_planner;
pub mod predicate_compiler;
pub mod query_assembler;
pub mod result_layout;

pub use errors::CompileError;
pub use query_assembler::QueryAssembler;
pub use result_layout::{AliasBinding, ResultLayout};

use crate::config::CompilerConfig;
use crate::entity_catalog::EntityCatalog;
use crate::query_builder::{QueryBuilder, SqlStatement};
use crate::selection::SelectionTree;

/// A compiled read: the statement to execute and how to read its rows back.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRead<B = SqlStatement> {
    pub statement: B,
    pub layout: ResultLayout,
}

/// Compile into the bundled [`SqlStatement`].
pub fn compile_read(
    catalog: &EntityCatalog,
    config: &CompilerConfig,
    tree: &SelectionTree,
) -> Result<CompiledRead, CompileError> {
    let compiled = compile_into(catalog, config, tree, SqlStatement::new())?;
    log::info!(
        "Compiled read of `{}`: {} projection(s), {} join(s)",
        tree.root.entity,
        compiled.statement.projections.len(),
        compiled.statement.joins.len()
    );
    Ok(compiled)
}

/// Compile into any [`QueryBuilder`].
pub fn compile_into<B: QueryBuilder>(
    catalog: &EntityCatalog,
    config: &CompilerConfig,
    tree: &SelectionTree,
    mut builder: B,
) -> Result<CompiledRead<B>, CompileError> {
    let layout = QueryAssembler::new(catalog, config).assemble(tree, &mut builder)?;
    Ok(CompiledRead {
        statement: builder,
        layout,
    })
}
