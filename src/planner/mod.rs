//! Relation planner for relquery
//!
//! Resolves dotted relation paths against the model graph and plans the
//! minimal, ordered set of joins a query needs.
//!
//! # Join construction
//!
//! - belongs-to: `JOIN target ON target.id = parent.fk`
//! - has-one / has-many: `JOIN target ON target.fk = parent.id`
//!
//! Joins are deduplicated by structural identity, keeping the order of
//! first occurrence across the filter list.

mod errors;
mod join;
mod resolver;

pub use errors::{PlannerError, PlannerResult};
pub use join::{dedup, for_relation, plan, JoinDescriptor};
pub use resolver::{RelationResolver, Resolution};
