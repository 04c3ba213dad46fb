use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    #[error("Not supported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid join type: {0}")]
    InvalidJoinType(String),

    #[error("Invalid relation type `{target}` for field `{field}` of entity `{entity}`")]
    InvalidRelationType {
        entity: String,
        field: String,
        target: String,
    },

    #[error("Unknown entity `{0}`")]
    UnknownEntity(String),

    #[error("Unknown field `{field}` on entity `{entity}`")]
    UnknownField { entity: String, field: String },

    #[error("Unsupported aggregate `{function}` on field `{field}` of entity `{entity}`")]
    UnsupportedAggregate {
        entity: String,
        field: String,
        function: String,
    },

    #[error("Invalid operand for `{operator}`: {reason}")]
    InvalidOperand { operator: String, reason: String },

    #[error("Invalid sort direction: {0}")]
    InvalidSortDirection(String),

    #[error("Malformed filter: {0}")]
    MalformedFilter(String),

    #[error("Malformed selection: {0}")]
    MalformedSelection(String),
}

impl CompileError {
    pub fn invalid_operand(operator: impl Into<String>, reason: impl Into<String>) -> Self {
        CompileError::InvalidOperand {
            operator: operator.into(),
            reason: reason.into(),
        }
    }
}
