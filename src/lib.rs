//! relquery - JSON:API query normalization and relation planning
//!
//! Turns a raw JSON:API-style query (`filter`, `sort`, `page`, `include`,
//! `fields`, `aggregate`) into a canonical `QuerySpec`, resolves dotted
//! relation paths against a `ModelGraph` into joins, assembles an
//! `ExecutionPlan` and runs it through a caller-supplied `Repository`.

pub mod cli;
pub mod config;
pub mod executor;
pub mod observability;
pub mod planner;
pub mod query;
pub mod schema;
pub mod util;
