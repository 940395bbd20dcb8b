//! Model graph for relquery
//!
//! Describes the relational model the planner resolves relation paths
//! against: each model has a table, an identifying column and named
//! relations (`belongs_to`, `has_one`, `has_many`) to other models.
//!
//! Column existence is never checked here; unknown columns only fail once
//! the repository executes the query.

mod errors;
mod inflect;
mod loader;
mod model;

pub use errors::{SchemaError, SchemaResult};
pub use inflect::singularize;
pub use loader::SchemaLoader;
pub use model::{ModelDef, ModelGraph, RelationDef, RelationKind};
