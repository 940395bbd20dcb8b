//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::executor::FetchError;
use crate::schema::SchemaError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file could not be read or parsed
    #[error("{0}")]
    Config(String),

    /// stdin/stdout or input file failure
    #[error("{0}")]
    Io(String),

    /// Query input is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl CliError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        CliError::Config(msg.into())
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        CliError::Io(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "RELQUERY_CLI_CONFIG_ERROR",
            CliError::Io(_) => "RELQUERY_CLI_IO_ERROR",
            CliError::Json(_) => "RELQUERY_CLI_INVALID_JSON",
            CliError::Schema(err) => err.code(),
            CliError::Fetch(err) => err.code(),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::PlannerError;

    #[test]
    fn test_codes() {
        assert_eq!(CliError::config_error("x").code(), "RELQUERY_CLI_CONFIG_ERROR");

        let err: CliError = FetchError::from(PlannerError::UnknownModel("tags".into())).into();
        assert_eq!(err.code(), "RELQUERY_UNKNOWN_MODEL");
        assert_eq!(err.to_string(), "Unknown model: tags");
    }

    #[test]
    fn test_json_error() {
        let err: CliError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.code(), "RELQUERY_CLI_INVALID_JSON");
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
