//! Model graph errors

use thiserror::Error;

/// Result type for model graph operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while building or loading a model graph
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two models registered under the same name
    #[error("Duplicate model: {0}")]
    DuplicateModel(String),

    /// A relation points at a model that is not registered
    #[error("Relation {model}.{relation} targets unknown model: {target}")]
    UnknownTarget {
        model: String,
        relation: String,
        target: String,
    },

    /// Graph file is not valid JSON or has the wrong shape
    #[error("Malformed model graph: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Graph file could not be read
    #[error("Failed to read model graph: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::DuplicateModel(_) => "RELQUERY_SCHEMA_DUPLICATE_MODEL",
            SchemaError::UnknownTarget { .. } => "RELQUERY_SCHEMA_UNKNOWN_TARGET",
            SchemaError::Malformed(_) => "RELQUERY_SCHEMA_MALFORMED",
            SchemaError::Io(_) => "RELQUERY_SCHEMA_IO",
        }
    }
}
