//! # Query Normalizer Errors

use thiserror::Error;

/// Result type for normalization
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while normalizing a raw query object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Filter sub-object key is not a recognized operator token
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),
}

impl QueryError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::UnsupportedOperator(_) => "RELQUERY_UNSUPPORTED_OPERATOR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_and_code() {
        let err = QueryError::UnsupportedOperator("like".to_string());
        assert_eq!(err.to_string(), "Unsupported operator: like");
        assert_eq!(err.code(), "RELQUERY_UNSUPPORTED_OPERATOR");
    }
}
