//! Execution plan assembly
//!
//! Turns a normalized `QuerySpec` into an `ExecutionPlan` against a base
//! model query. The base is cloned first and never mutated, so a single
//! base query can be shared by concurrent requests.
//!
//! Assembly order:
//!
//! 1. includes become eager loads (each path is resolved, unknown names reject)
//! 2. plain filters become predicates
//! 3. relational filters are resolved; their columns are qualified with the
//!    table of the last hop and their joins collected
//! 4. includes rooted at a filtered relation get a scope carrying that
//!    relation's filters and deeper joins
//! 5. fields project either an include or the base model
//! 6. collected joins, then sort
//! 7. the aggregate query is cloned from the filtered, unpaginated state

use std::sync::Arc;

use serde::Serialize;

use super::query::{extend_unique, AggregateExpr, AggregateFunction, ModelQuery, OrderBy, Predicate, WithRelated};
use super::scope;
use crate::observability::Logger;
use crate::planner::{self, PlannerError, PlannerResult, RelationResolver, Resolution};
use crate::query::{AggregateSpec, FieldSet, FilterItem, PageSpec, QuerySpec};
use crate::schema::{ModelDef, ModelGraph};

/// Everything a repository needs to answer one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPlan {
    /// Main query
    pub query: ModelQuery,

    /// Aggregate query, run next to the main query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<ModelQuery>,

    /// Pagination window, absent for a plain collection fetch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageSpec>,
}

/// Assembles `spec` against `base`.
pub fn assemble(graph: &ModelGraph, base: &ModelQuery, spec: &QuerySpec) -> PlannerResult<ExecutionPlan> {
    Assembler::new(graph).assemble(base, spec)
}

/// Builds execution plans over one model graph
pub struct Assembler<'a> {
    resolver: RelationResolver<'a>,
}

impl<'a> Assembler<'a> {
    pub fn new(graph: &'a ModelGraph) -> Self {
        Self {
            resolver: RelationResolver::new(graph),
        }
    }

    pub fn assemble(&self, base: &ModelQuery, spec: &QuerySpec) -> PlannerResult<ExecutionPlan> {
        let mut working = base.clone();
        let model = Arc::clone(&working.model);

        let first_include = working.with_related.len();
        let include_paths = self.resolve_includes(&model, spec.includes())?;
        working
            .with_related
            .extend(spec.includes().iter().map(WithRelated::new));

        working
            .predicates
            .extend(spec.plain_filters().map(Predicate::from));

        let resolved = self.resolve_filters(&model, spec.relational_filters())?;
        working.predicates.extend(resolved.iter().map(Predicate::from));
        let joins = planner::plan(&resolved);

        scope::decorate(&mut working.with_related[first_include..], &resolved, &joins);

        for field in spec.fields.iter().flatten() {
            self.apply_fields(&mut working, first_include, &include_paths, field);
        }

        for join in joins {
            working.join(join);
        }

        working
            .order_by
            .extend(spec.sort.iter().flatten().map(OrderBy::from));

        let aggregate = match spec.aggregate.as_deref() {
            Some(aggregates) if !aggregates.is_empty() => {
                Some(working.to_aggregate(aggregate_exprs(&model, aggregates)?))
            }
            _ => None,
        };

        let joins = working.joins.len().to_string();
        let predicates = working.predicates.len().to_string();
        let eager = working.with_related.len().to_string();
        let paged = spec.page.is_some().to_string();
        Logger::trace(
            "PLAN_ASSEMBLED",
            &[
                ("model", model.name.as_str()),
                ("joins", joins.as_str()),
                ("predicates", predicates.as_str()),
                ("with_related", eager.as_str()),
                ("paged", paged.as_str()),
                ("aggregate", if aggregate.is_some() { "true" } else { "false" }),
            ],
        );

        Ok(ExecutionPlan {
            query: working,
            aggregate,
            page: spec.page,
        })
    }

    fn resolve_includes(&self, model: &Arc<ModelDef>, includes: &[String]) -> PlannerResult<Vec<Resolution>> {
        includes
            .iter()
            .map(|path| self.resolver.resolve_path(model, path))
            .collect()
    }

    /// Attaches joins to every relational filter and qualifies its column.
    fn resolve_filters<'f>(
        &self,
        model: &Arc<ModelDef>,
        filters: impl Iterator<Item = &'f FilterItem>,
    ) -> PlannerResult<Vec<FilterItem>> {
        let mut resolved = Vec::new();

        for filter in filters {
            let relations = filter.relations.as_deref().unwrap_or(&[]);
            let resolution = self.resolver.resolve(model, relations)?;

            let path = relations.join(".");
            Logger::trace(
                "RELATION_RESOLVED",
                &[
                    ("model", model.name.as_str()),
                    ("path", path.as_str()),
                    ("table", resolution.endpoint_table()),
                ],
            );

            let mut item = filter.clone();
            item.column = resolution.endpoint.qualify(&filter.column);
            item.joins = resolution.joins;
            resolved.push(item);
        }

        Ok(resolved)
    }

    fn apply_fields(
        &self,
        working: &mut ModelQuery,
        first_include: usize,
        include_paths: &[Resolution],
        field: &FieldSet,
    ) {
        let position = working.with_related[first_include..]
            .iter()
            .position(|w| w.relation == field.resource);

        match position {
            Some(i) => {
                let resolution = &include_paths[i];
                let entry = &mut working.with_related[first_include + i];
                let select = entry.scope_mut().select.get_or_insert_with(Vec::new);
                extend_unique(select, relation_projection(resolution, &field.columns));
            }
            None => {
                let model = Arc::clone(&working.model);
                let columns = std::iter::once(model.qualified_id())
                    .chain(field.columns.iter().map(|c| model.qualify(c)));
                working.select_columns(columns);
            }
        }
    }
}

/// Projection for an eager-loaded relation.
///
/// The related id is always kept, and for has-one/has-many hops the
/// foreign key pointing back at the parent as well.
fn relation_projection(resolution: &Resolution, columns: &[String]) -> Vec<String> {
    let endpoint = &resolution.endpoint;
    let mut projection = vec![endpoint.qualified_id()];

    if let Some(last) = resolution.joins.last() {
        if last.foreign_key != endpoint.qualified_id() {
            projection.push(last.foreign_key.clone());
        }
    }

    extend_unique(&mut projection, columns.iter().map(|c| endpoint.qualify(c)));
    projection
}

fn aggregate_exprs(model: &ModelDef, aggregates: &[AggregateSpec]) -> PlannerResult<Vec<AggregateExpr>> {
    let mut exprs = Vec::new();

    for spec in aggregates {
        let function = AggregateFunction::parse(&spec.operator)
            .ok_or_else(|| PlannerError::UnsupportedAggregation(spec.operator.clone()))?;

        exprs.extend(spec.columns.iter().map(|column| AggregateExpr {
            function,
            column: model.qualify(column),
            alias: format!("{}_{}", spec.operator, column),
        }));
    }

    Ok(exprs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{normalize, FilterOperator, SortOrder};
    use crate::schema::RelationDef;
    use serde_json::json;

    fn graph() -> ModelGraph {
        ModelGraph::new()
            .with_model(
                ModelDef::new("posts", "posts")
                    .with_relation("author", RelationDef::belongs_to("users").with_foreign_key("author_id"))
                    .with_relation("comments", RelationDef::has_many("comments")),
            )
            .unwrap()
            .with_model(ModelDef::new("users", "users"))
            .unwrap()
            .with_model(
                ModelDef::new("comments", "comments")
                    .with_relation("author", RelationDef::belongs_to("users")),
            )
            .unwrap()
    }

    fn plan_for(raw: serde_json::Value) -> PlannerResult<ExecutionPlan> {
        let graph = graph();
        let base = ModelQuery::new(Arc::clone(graph.model("posts").unwrap()));
        let spec = normalize(&raw).unwrap();
        assemble(&graph, &base, &spec)
    }

    #[test]
    fn test_plain_filter_and_sort() {
        let plan = plan_for(json!({
            "filter": { "title": "a,b" },
            "sort": "-created_at,title"
        }))
        .unwrap();

        assert_eq!(
            plan.query.predicates,
            vec![Predicate::new("title", FilterOperator::In, json!(["a", "b"]))]
        );
        assert_eq!(plan.query.order_by.len(), 2);
        assert_eq!(plan.query.order_by[0].column, "created_at");
        assert_eq!(plan.query.order_by[0].order, SortOrder::Desc);
        assert!(plan.query.joins.is_empty());
        assert!(plan.aggregate.is_none());
        assert!(plan.page.is_none());
    }

    #[test]
    fn test_relational_filter_joins_and_qualifies() {
        let plan = plan_for(json!({
            "filter": { "author.name": "alice", "comments.author.name": { "contains": "bo" } }
        }))
        .unwrap();

        let columns: Vec<_> = plan.query.predicates.iter().map(|p| p.column.as_str()).collect();
        assert_eq!(columns, vec!["users.name", "users.name"]);

        let tables: Vec<_> = plan.query.joins.iter().map(|j| j.table.as_str()).collect();
        assert_eq!(tables, vec!["users", "comments", "users"]);
        assert!(plan.query.with_related.is_empty());
    }

    #[test]
    fn test_repeated_chain_joins_once() {
        let plan = plan_for(json!({
            "filter": { "comments.body": "x", "comments.score": { "gt": 3 } }
        }))
        .unwrap();

        assert_eq!(plan.query.joins.len(), 1);
        assert_eq!(plan.query.joins[0].foreign_key, "comments.post_id");
        assert_eq!(plan.query.predicates.len(), 2);
    }

    #[test]
    fn test_scoped_include() {
        let plan = plan_for(json!({
            "include": "comments,author",
            "filter": { "comments.author.name": "alice", "comments.score": { "gte": 2 } }
        }))
        .unwrap();

        let comments = &plan.query.with_related[0];
        assert_eq!(comments.relation, "comments");
        let scope = comments.scope.as_ref().unwrap();
        assert_eq!(scope.joins.len(), 1);
        assert_eq!(scope.joins[0].table, "users");
        assert_eq!(scope.joins[0].parent_key, "comments.user_id");
        assert_eq!(scope.predicates.len(), 2);

        let author = &plan.query.with_related[1];
        assert_eq!(author.relation, "author");
        assert!(author.scope.is_none());
    }

    #[test]
    fn test_unknown_include_rejects() {
        let err = plan_for(json!({ "include": "tags" })).unwrap_err();
        assert_eq!(err, PlannerError::UnknownRelation("tags".into()));
    }

    #[test]
    fn test_unknown_filter_relation_rejects() {
        let err = plan_for(json!({ "filter": { "tags.name": "x" } })).unwrap_err();
        assert_eq!(err.to_string(), "Unknown relation: tags");
    }

    #[test]
    fn test_fields_on_base_model() {
        let plan = plan_for(json!({ "fields": { "posts": "title,id,body" } })).unwrap();
        assert_eq!(
            plan.query.select,
            Some(vec!["posts.id".into(), "posts.title".into(), "posts.body".into()])
        );
    }

    #[test]
    fn test_fields_on_include() {
        let plan = plan_for(json!({
            "include": "comments",
            "fields": { "comments": "body", "author": "name" }
        }))
        .unwrap();

        let scope = plan.query.with_related[0].scope.as_ref().unwrap();
        assert_eq!(
            scope.select,
            Some(vec!["comments.id".into(), "comments.post_id".into(), "comments.body".into()])
        );
        // `author` is not included, so it projects the base model
        assert_eq!(plan.query.select, Some(vec!["posts.id".into(), "posts.name".into()]));
    }

    #[test]
    fn test_fields_on_belongs_to_include() {
        let plan = plan_for(json!({
            "include": "author",
            "fields": { "author": "name" }
        }))
        .unwrap();

        let scope = plan.query.with_related[0].scope.as_ref().unwrap();
        assert_eq!(scope.select, Some(vec!["users.id".into(), "users.name".into()]));
    }

    #[test]
    fn test_aggregate_query() {
        let plan = plan_for(json!({
            "filter": { "author.name": "alice" },
            "include": "comments",
            "sort": "title",
            "page": { "number": 2, "size": 5 },
            "aggregate": { "sum": "views", "count": "id" }
        }))
        .unwrap();

        let agg = plan.aggregate.unwrap();
        assert_eq!(agg.predicates, plan.query.predicates);
        assert_eq!(agg.joins, plan.query.joins);
        assert!(agg.order_by.is_empty());
        assert!(agg.with_related.is_empty());
        assert!(agg.select.is_none());

        let aliases: Vec<_> = agg.aggregates.iter().map(|a| a.alias.as_str()).collect();
        assert_eq!(aliases, vec!["sum_views", "count_id"]);
        assert_eq!(agg.aggregates[0].column, "posts.views");

        assert_eq!(plan.page, Some(PageSpec { page: 2, page_size: 5 }));
    }

    #[test]
    fn test_unsupported_aggregation() {
        let err = plan_for(json!({ "aggregate": { "median": "views" } })).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported aggregation: median");
    }

    #[test]
    fn test_base_query_untouched() {
        let graph = graph();
        let base = ModelQuery::new(Arc::clone(graph.model("posts").unwrap()))
            .with_predicate(Predicate::new("published", FilterOperator::In, json!([true])));
        let spec = normalize(&json!({ "filter": { "author.name": "alice" }, "include": "comments" })).unwrap();

        let plan = assemble(&graph, &base, &spec).unwrap();
        assert_eq!(base.predicates.len(), 1);
        assert!(base.joins.is_empty());
        assert!(base.with_related.is_empty());
        assert_eq!(plan.query.predicates.len(), 2);
        assert_eq!(plan.query.predicates[0].column, "published");
    }
}
