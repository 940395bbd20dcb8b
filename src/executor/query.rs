//! Working model query
//!
//! `ModelQuery` is the data a repository turns into SQL: predicates, joins,
//! ordering, projection, aggregate expressions and eager loads. Eager-load
//! scopes are plain data so plans can be cloned, compared and explained.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::planner::JoinDescriptor;
use crate::query::{FilterItem, FilterOperator, SortItem, SortOrder};
use crate::schema::ModelDef;

/// A single `WHERE` condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    /// Column, table-qualified for relational filters
    pub column: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl Predicate {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }
}

impl From<&FilterItem> for Predicate {
    fn from(item: &FilterItem) -> Self {
        Self::new(item.column.clone(), item.operator, item.value.clone())
    }
}

/// One `ORDER BY` term
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub column: String,
    pub order: SortOrder,
}

impl From<&SortItem> for OrderBy {
    fn from(item: &SortItem) -> Self {
        Self {
            column: item.column.clone(),
            order: item.order,
        }
    }
}

/// Aggregate functions a repository is expected to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregateFunction {
    Count,
    CountDistinct,
    Min,
    Max,
    Sum,
    SumDistinct,
    Avg,
    AvgDistinct,
}

impl AggregateFunction {
    /// Parses the operator name used in the `aggregate` section.
    pub fn parse(name: &str) -> Option<Self> {
        let function = match name {
            "count" => AggregateFunction::Count,
            "countDistinct" => AggregateFunction::CountDistinct,
            "min" => AggregateFunction::Min,
            "max" => AggregateFunction::Max,
            "sum" => AggregateFunction::Sum,
            "sumDistinct" => AggregateFunction::SumDistinct,
            "avg" => AggregateFunction::Avg,
            "avgDistinct" => AggregateFunction::AvgDistinct,
            _ => return None,
        };
        Some(function)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::CountDistinct => "countDistinct",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Sum => "sum",
            AggregateFunction::SumDistinct => "sumDistinct",
            AggregateFunction::Avg => "avg",
            AggregateFunction::AvgDistinct => "avgDistinct",
        }
    }

    /// SQL rendering of the function applied to `column`
    pub fn render(&self, column: &str) -> String {
        match self {
            AggregateFunction::Count => format!("COUNT({})", column),
            AggregateFunction::CountDistinct => format!("COUNT(DISTINCT {})", column),
            AggregateFunction::Min => format!("MIN({})", column),
            AggregateFunction::Max => format!("MAX({})", column),
            AggregateFunction::Sum => format!("SUM({})", column),
            AggregateFunction::SumDistinct => format!("SUM(DISTINCT {})", column),
            AggregateFunction::Avg => format!("AVG({})", column),
            AggregateFunction::AvgDistinct => format!("AVG(DISTINCT {})", column),
        }
    }
}

/// `function(column) AS alias`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateExpr {
    pub function: AggregateFunction,
    pub column: String,
    pub alias: String,
}

/// Restrictions applied to an eager-loaded relation query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelationScope {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<JoinDescriptor>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub predicates: Vec<Predicate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
}

impl RelationScope {
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty() && self.predicates.is_empty() && self.select.is_none()
    }
}

/// An eager-load entry, optionally restricted by a scope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithRelated {
    /// Dotted include path
    pub relation: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<RelationScope>,
}

impl WithRelated {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            scope: None,
        }
    }

    /// Scope of this entry, created empty on first use
    pub fn scope_mut(&mut self) -> &mut RelationScope {
        self.scope.get_or_insert_with(RelationScope::default)
    }
}

/// Query state against one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelQuery {
    #[serde(skip)]
    pub model: Arc<ModelDef>,
    pub predicates: Vec<Predicate>,
    pub joins: Vec<JoinDescriptor>,
    pub order_by: Vec<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aggregates: Vec<AggregateExpr>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub with_related: Vec<WithRelated>,
}

impl ModelQuery {
    pub fn new(model: Arc<ModelDef>) -> Self {
        Self {
            model,
            predicates: Vec::new(),
            joins: Vec::new(),
            order_by: Vec::new(),
            select: None,
            aggregates: Vec::new(),
            with_related: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.model.table
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Adds a join unless an identical one is already present.
    pub fn join(&mut self, join: JoinDescriptor) {
        if !self.joins.contains(&join) {
            self.joins.push(join);
        }
    }

    /// Appends columns to the projection, skipping duplicates.
    pub fn select_columns(&mut self, columns: impl IntoIterator<Item = String>) {
        extend_unique(self.select.get_or_insert_with(Vec::new), columns);
    }

    /// Aggregate variant of this query: joins and predicates only.
    pub fn to_aggregate(&self, aggregates: Vec<AggregateExpr>) -> Self {
        Self {
            model: Arc::clone(&self.model),
            predicates: self.predicates.clone(),
            joins: self.joins.clone(),
            order_by: Vec::new(),
            select: None,
            aggregates,
            with_related: Vec::new(),
        }
    }
}

/// Pushes `items` onto `target`, skipping values already present.
pub(crate) fn extend_unique(target: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
