//! Execution subsystem for relquery
//!
//! Assembles normalized queries into execution plans and drives the
//! repository that runs them.
//!
//! # Flow
//!
//! 1. Normalize the raw request (`query`)
//! 2. Clone the base `ModelQuery` and assemble the plan (`assembler`)
//! 3. Pick the fetch mode: single record, full collection or page
//! 4. Run the main fetch, concurrently with the aggregate fetch if any
//! 5. Attach the aggregate row under `aggregation`
//!
//! Every normalization or assembly failure comes back as `Err`; repository
//! errors pass through unchanged.

mod assembler;
mod errors;
mod explain;
mod fetch;
mod query;
mod scope;

pub use assembler::{assemble, Assembler, ExecutionPlan};
pub use errors::{FetchError, FetchResult, RepositoryError};
pub use explain::ExplainPlan;
pub use fetch::{execute, fetch, FetchMode, FetchOptions, Fetched, Fetcher, Repository};
pub use query::{
    AggregateExpr, AggregateFunction, ModelQuery, OrderBy, Predicate, RelationScope, WithRelated,
};
pub use scope::{decorate, scope_for};
