//! Scoped eager loads
//!
//! An include that is also the root of a relational filter only loads the
//! related rows that satisfy that filter. The scope carries the filter's
//! predicates plus the joins past the first hop; the first hop lands on the
//! relation's own table, which the eager-load query already selects from.
//!
//! Relations that only appear in filters are never added as includes.

use super::query::{Predicate, RelationScope, WithRelated};
use crate::planner::{for_relation, JoinDescriptor};
use crate::query::FilterItem;

/// Attaches a scope to every entry rooted at a filtered relation.
pub fn decorate(includes: &mut [WithRelated], filters: &[FilterItem], joins: &[JoinDescriptor]) {
    for entry in includes.iter_mut() {
        if let Some(scope) = scope_for(&entry.relation, filters, joins) {
            let current = entry.scope_mut();
            current.joins.extend(scope.joins);
            current.predicates.extend(scope.predicates);
        }
    }
}

/// Scope for `relation`, or `None` when no filter is rooted at it.
pub fn scope_for(relation: &str, filters: &[FilterItem], joins: &[JoinDescriptor]) -> Option<RelationScope> {
    let predicates: Vec<Predicate> = filters
        .iter()
        .filter(|f| f.root_relation() == Some(relation))
        .map(Predicate::from)
        .collect();

    if predicates.is_empty() {
        return None;
    }

    Some(RelationScope {
        joins: for_relation(joins, relation)
            .filter(|j| j.depth > 0)
            .cloned()
            .collect(),
        predicates,
        select: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FilterOperator;
    use serde_json::json;

    fn hop(relation: &str, parent: &str, table: &str, depth: usize) -> JoinDescriptor {
        JoinDescriptor {
            relation: relation.into(),
            parent: parent.into(),
            parent_table: "posts".into(),
            table: table.into(),
            foreign_key: format!("{}.id", table),
            parent_key: "posts.id".into(),
            depth,
        }
    }

    fn filter(column: &str, relations: &[&str]) -> FilterItem {
        FilterItem::new(column, FilterOperator::In, json!(["x"]))
            .with_relations(relations.iter().map(|r| r.to_string()).collect())
    }

    #[test]
    fn test_scope_for_filtered_relation() {
        let filters = vec![filter("users.name", &["comments", "author"]), filter("tags.name", &["tags"])];
        let joins = vec![
            hop("comments", "comments", "comments", 0),
            hop("author", "comments", "users", 1),
            hop("tags", "tags", "tags", 0),
        ];

        let scope = scope_for("comments", &filters, &joins).unwrap();
        assert_eq!(scope.joins, vec![hop("author", "comments", "users", 1)]);
        assert_eq!(scope.predicates.len(), 1);
        assert_eq!(scope.predicates[0].column, "users.name");
        assert!(scope.select.is_none());

        let tags = scope_for("tags", &filters, &joins).unwrap();
        assert!(tags.joins.is_empty());
        assert_eq!(tags.predicates.len(), 1);
    }

    #[test]
    fn test_unfiltered_include_passes_through() {
        let filters = vec![filter("tags.name", &["tags"])];
        let mut includes = vec![WithRelated::new("comments")];

        decorate(&mut includes, &filters, &[hop("tags", "tags", "tags", 0)]);
        assert!(includes[0].scope.is_none());
    }

    #[test]
    fn test_nested_include_not_matched_by_root() {
        let filters = vec![filter("comments.body", &["comments"])];
        let mut includes = vec![WithRelated::new("comments.author"), WithRelated::new("comments")];

        decorate(&mut includes, &filters, &[hop("comments", "comments", "comments", 0)]);
        assert!(includes[0].scope.is_none());
        assert!(includes[1].scope.is_some());
    }
}
