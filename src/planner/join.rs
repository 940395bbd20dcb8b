//! Join descriptors and join planning
//!
//! Filters that walk the same relation chain produce identical descriptors;
//! the planner keeps the first occurrence of each.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::query::FilterItem;

/// A directional join edge: `JOIN table ON foreign_key = parent_key`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinDescriptor {
    /// Relation name of this hop
    pub relation: String,

    /// First relation name of the chain this hop belongs to
    pub parent: String,

    pub parent_table: String,

    /// Table being joined
    pub table: String,

    /// Table-qualified column on the joined side
    pub foreign_key: String,

    /// Table-qualified column on the parent side
    pub parent_key: String,

    /// Position of this hop in its chain, 0 for the root relation
    pub depth: usize,
}

/// Deduplicated joins of all filters, in order of first occurrence.
///
/// Joins are never aliased: chains reaching the same table from different
/// roots (`author.name` and `comments.author.name`) join it twice, and both
/// predicates qualify their column with the same table name.
pub fn plan<'a>(filters: impl IntoIterator<Item = &'a FilterItem>) -> Vec<JoinDescriptor> {
    dedup(filters.into_iter().flat_map(|f| f.joins.iter()))
}

/// Removes repeated descriptors, keeping the first occurrence.
pub fn dedup<'a>(joins: impl IntoIterator<Item = &'a JoinDescriptor>) -> Vec<JoinDescriptor> {
    let mut seen = HashSet::new();
    joins
        .into_iter()
        .filter(|j| seen.insert(*j))
        .cloned()
        .collect()
}

/// Joins whose chain starts at `relation`.
pub fn for_relation<'a>(
    joins: &'a [JoinDescriptor],
    relation: &'a str,
) -> impl Iterator<Item = &'a JoinDescriptor> + 'a {
    joins.iter().filter(move |j| j.parent == relation)
}
