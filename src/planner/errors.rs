//! Planner error types
//!
//! All planner errors reject the request; none are retried.

use thiserror::Error;

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Errors raised while resolving relations and assembling a plan
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    /// A filter or include path names a relation the model does not have
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    /// A model name (base model or relation target) is not registered
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// An aggregate section names a function the repository cannot compute
    #[error("Unsupported aggregation: {0}")]
    UnsupportedAggregation(String),
}

impl PlannerError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerError::UnknownRelation(_) => "RELQUERY_UNKNOWN_RELATION",
            PlannerError::UnknownModel(_) => "RELQUERY_UNKNOWN_MODEL",
            PlannerError::UnsupportedAggregation(_) => "RELQUERY_UNSUPPORTED_AGGREGATION",
        }
    }
}
