//! Fetch error types
//!
//! Error codes:
//! - RELQUERY_UNSUPPORTED_OPERATOR, RELQUERY_UNKNOWN_RELATION,
//!   RELQUERY_UNKNOWN_MODEL, RELQUERY_UNSUPPORTED_AGGREGATION (rejections)
//! - RELQUERY_REPOSITORY_FAILED (repository errors, passed through)

use std::error::Error as StdError;

use thiserror::Error;

use crate::planner::PlannerError;
use crate::query::QueryError;

/// Error type repositories report
pub type RepositoryError = Box<dyn StdError + Send + Sync>;

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Everything that can end a fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    /// Raised by the repository; displayed unchanged
    #[error("{0}")]
    Repository(#[source] RepositoryError),
}

impl FetchError {
    /// Wraps a repository failure
    pub fn repository(err: impl Into<RepositoryError>) -> Self {
        FetchError::Repository(err.into())
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::Query(err) => err.code(),
            FetchError::Planner(err) => err.code(),
            FetchError::Repository(_) => "RELQUERY_REPOSITORY_FAILED",
        }
    }

    /// True for errors raised before the repository was called
    pub fn is_rejection(&self) -> bool {
        !matches!(self, FetchError::Repository(_))
    }
}
