//! Explain plan output
//!
//! Renders an assembled plan as SQL-like text. The output is for humans
//! only; repositories never parse it.

use std::fmt;

use serde_json::Value;

use super::assembler::ExecutionPlan;
use super::errors::FetchError;
use super::query::{ModelQuery, Predicate, WithRelated};
use crate::planner::JoinDescriptor;
use crate::query::FilterOperator;

/// Explain plan output
#[derive(Debug, Clone)]
pub struct ExplainPlan {
    /// Whether assembly succeeded
    pub accepted: bool,
    pub model: Option<String>,
    /// Main query
    pub query: Option<String>,
    /// `LIMIT`/`OFFSET` of the page, if any
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// One line per eager load
    pub eager_loads: Vec<String>,
    /// Aggregate query
    pub aggregate: Option<String>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from an assembled plan
    pub fn from_plan(plan: &ExecutionPlan) -> Self {
        Self {
            accepted: true,
            model: Some(plan.query.model.name.clone()),
            query: Some(render_query(&plan.query)),
            limit: plan.page.map(|p| p.limit()),
            offset: plan.page.map(|p| p.offset()),
            eager_loads: plan.query.with_related.iter().map(render_eager_load).collect(),
            aggregate: plan.aggregate.as_ref().map(render_query),
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a rejection
    pub fn from_error(err: &FetchError) -> Self {
        Self {
            accepted: false,
            model: None,
            query: None,
            limit: None,
            offset: None,
            eager_loads: Vec::new(),
            aggregate: None,
            rejection_reason: Some(err.to_string()),
            rejection_code: Some(err.code().to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if !self.accepted {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "Status: ACCEPTED")?;
        if let Some(model) = &self.model {
            writeln!(f, "Model: {}", model)?;
        }
        if let Some(query) = &self.query {
            write!(f, "Query: {}", query)?;
            if let (Some(limit), Some(offset)) = (self.limit, self.offset) {
                write!(f, " LIMIT {} OFFSET {}", limit, offset)?;
            }
            writeln!(f)?;
        }
        if !self.eager_loads.is_empty() {
            writeln!(f, "Eager Loads:")?;
            for load in &self.eager_loads {
                writeln!(f, "  - {}", load)?;
            }
        }
        if let Some(aggregate) = &self.aggregate {
            writeln!(f, "Aggregate: {}", aggregate)?;
        }

        Ok(())
    }
}

fn render_query(query: &ModelQuery) -> String {
    let projection = if !query.aggregates.is_empty() {
        query
            .aggregates
            .iter()
            .map(|a| format!("{} AS {}", a.function.render(&a.column), a.alias))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        match &query.select {
            Some(columns) => columns.join(", "),
            None => format!("{}.*", query.table()),
        }
    };

    let mut sql = format!("SELECT {} FROM {}", projection, query.table());
    push_joins(&mut sql, &query.joins);
    push_where(&mut sql, &query.predicates);

    if !query.order_by.is_empty() {
        let terms: Vec<_> = query
            .order_by
            .iter()
            .map(|o| format!("{} {}", o.column, o.order.as_str()))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&terms.join(", "));
    }

    sql
}

fn render_eager_load(entry: &WithRelated) -> String {
    let Some(scope) = entry.scope.as_ref().filter(|s| !s.is_empty()) else {
        return entry.relation.clone();
    };

    let mut line = entry.relation.clone();
    if let Some(columns) = &scope.select {
        line.push_str(" SELECT ");
        line.push_str(&columns.join(", "));
    }
    push_joins(&mut line, &scope.joins);
    push_where(&mut line, &scope.predicates);
    line
}

fn push_joins(sql: &mut String, joins: &[JoinDescriptor]) {
    for join in joins {
        sql.push_str(&format!(
            " JOIN {} ON {} = {}",
            join.table, join.foreign_key, join.parent_key
        ));
    }
}

fn push_where(sql: &mut String, predicates: &[Predicate]) {
    if predicates.is_empty() {
        return;
    }
    let conditions: Vec<_> = predicates.iter().map(render_predicate).collect();
    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));
}

fn render_predicate(predicate: &Predicate) -> String {
    match predicate.operator {
        FilterOperator::In => {
            let values: Vec<_> = match &predicate.value {
                Value::Array(items) => items.iter().map(render_value).collect(),
                other => vec![render_value(other)],
            };
            format!("{} IN ({})", predicate.column, values.join(", "))
        }
        FilterOperator::Like => format!("{} LIKE {}", predicate.column, render_value(&predicate.value)),
        op => format!("{} {} {}", predicate.column, op.as_str(), render_value(&predicate.value)),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::assemble;
    use crate::planner::PlannerError;
    use crate::query::normalize;
    use crate::schema::{ModelDef, ModelGraph, RelationDef};
    use serde_json::json;
    use std::sync::Arc;

    fn explain(raw: Value) -> ExplainPlan {
        let graph = ModelGraph::new()
            .with_model(
                ModelDef::new("posts", "posts")
                    .with_relation("author", RelationDef::belongs_to("users").with_foreign_key("author_id"))
                    .with_relation("comments", RelationDef::has_many("comments")),
            )
            .unwrap()
            .with_model(ModelDef::new("users", "users"))
            .unwrap()
            .with_model(ModelDef::new("comments", "comments"))
            .unwrap();
        let base = ModelQuery::new(Arc::clone(graph.model("posts").unwrap()));
        let plan = assemble(&graph, &base, &normalize(&raw).unwrap()).unwrap();
        ExplainPlan::from_plan(&plan)
    }

    #[test]
    fn test_explain_accepted_plan() {
        let explain = explain(json!({
            "filter": { "author.name": "o'neil", "views": { "gte": 10 } },
            "sort": "-title",
            "page": { "number": 3, "size": 5 }
        }));

        assert!(explain.accepted);
        assert_eq!(explain.limit, Some(5));
        assert_eq!(explain.offset, Some(10));

        let output = explain.to_string();
        assert!(output.contains("Status: ACCEPTED"));
        assert!(output.contains(
            "Query: SELECT posts.* FROM posts JOIN users ON users.id = posts.author_id \
             WHERE views >= 10 AND users.name IN ('o''neil') ORDER BY title DESC LIMIT 5 OFFSET 10"
        ));
    }

    #[test]
    fn test_explain_eager_loads_and_aggregate() {
        let explain = explain(json!({
            "include": "comments,author",
            "filter": { "comments.body": { "contains": "rust" } },
            "aggregate": { "count": "id" }
        }));

        assert_eq!(explain.eager_loads[0], "comments WHERE comments.body LIKE '%rust%'");
        assert_eq!(explain.eager_loads[1], "author");
        assert_eq!(
            explain.aggregate.as_deref(),
            Some(
                "SELECT COUNT(posts.id) AS count_id FROM posts \
                 JOIN comments ON comments.post_id = posts.id WHERE comments.body LIKE '%rust%'"
            )
        );
    }

    #[test]
    fn test_explain_rejected_plan() {
        let err: FetchError = PlannerError::UnknownRelation("tags".into()).into();
        let explain = ExplainPlan::from_error(&err);

        assert!(!explain.accepted);
        assert_eq!(explain.rejection_code, Some("RELQUERY_UNKNOWN_RELATION".into()));

        let output = format!("{}", explain);
        assert!(output.contains("REJECTED"));
        assert!(output.contains("Reason: Unknown relation: tags"));
    }

    #[test]
    fn test_explain_deterministic() {
        let raw = json!({ "filter": { "title": "a,b" }, "include": "comments" });
        assert_eq!(explain(raw.clone()).to_string(), explain(raw).to_string());
    }
}
