use thiserror::Error;

/// Rows that do not match the compiled layout. These point at a compiler or
/// executor defect, so a read fails as a whole instead of returning part of it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DenormalizeError {
    #[error("Row {index} is not an object")]
    RowNotObject { index: usize },

    #[error("Column `{column}` has no table alias (expected `<alias>{separator}<field>`)")]
    UnaliasedColumn { column: String, separator: String },

    #[error("Column `{column}` refers to unknown alias `{alias}`")]
    UnknownAlias { alias: String, column: String },

    #[error("Unique column `{column}` for alias `{alias}` is missing from row {index}")]
    MissingUniqueColumn {
        alias: String,
        column: String,
        index: usize,
    },

    #[error("Unique id for alias `{alias}` is not a scalar: {value}")]
    InvalidId { alias: String, value: String },

    #[error("No alias recorded for selection path `{path}`")]
    MissingBinding { path: String },
}
