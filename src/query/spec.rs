//! # Canonical Query Specification
//!
//! The normalized, read-only form of a raw query object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::planner::JoinDescriptor;

/// Predicate operators produced by the operator compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Value in list
    #[serde(rename = "in")]
    In,

    /// Less than
    #[serde(rename = "<")]
    Lt,

    /// Less than or equal
    #[serde(rename = "<=")]
    Lte,

    /// Greater than
    #[serde(rename = ">")]
    Gt,

    /// Greater than or equal
    #[serde(rename = ">=")]
    Gte,

    /// Pattern match (LIKE)
    #[serde(rename = "like")]
    Like,
}

impl FilterOperator {
    /// SQL-facing operator token
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::In => "in",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Like => "like",
        }
    }
}

/// A single normalized filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterItem {
    /// Column name; table-qualified once a relational filter is resolved
    pub column: String,

    /// Predicate operator
    pub operator: FilterOperator,

    /// Sequence for `in`, `%…%` string for `like`, scalar otherwise
    pub value: Value,

    /// Relation chain, present only when the raw key was dotted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<String>>,

    /// Joins needed to reach `column`, filled during assembly
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<JoinDescriptor>,
}

impl FilterItem {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
            relations: None,
            joins: Vec::new(),
        }
    }

    /// Attaches a relation chain
    pub fn with_relations(mut self, relations: Vec<String>) -> Self {
        self.relations = Some(relations);
        self
    }

    pub fn is_relational(&self) -> bool {
        self.relations.is_some()
    }

    /// First relation name of the chain
    pub fn root_relation(&self) -> Option<&str> {
        self.relations
            .as_ref()
            .and_then(|r| r.first())
            .map(String::as_str)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortItem {
    pub column: String,
    pub order: SortOrder,
}

impl SortItem {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Desc,
        }
    }

    /// Parses a raw sort token; a leading `-` selects DESC.
    pub fn parse(token: &str) -> Self {
        match token.strip_prefix('-') {
            Some(column) => Self::desc(column),
            None => Self::asc(token),
        }
    }
}

/// Pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpec {
    /// 1-based page number
    pub page: u64,
    pub page_size: u64,
}

impl PageSpec {
    /// Rows skipped before this page
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

/// Column projection for one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    pub resource: String,
    pub columns: Vec<String>,
}

/// Aggregate request: one function over several columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub operator: String,
    pub columns: Vec<String>,
}

/// Canonical query specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<FilterItem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortItem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldSet>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Vec<AggregateSpec>>,
}

impl QuerySpec {
    /// Filters without a relation chain
    pub fn plain_filters(&self) -> impl Iterator<Item = &FilterItem> {
        self.filter
            .iter()
            .flatten()
            .filter(|f| !f.is_relational())
    }

    /// Filters with a relation chain
    pub fn relational_filters(&self) -> impl Iterator<Item = &FilterItem> {
        self.filter.iter().flatten().filter(|f| f.is_relational())
    }

    pub fn includes(&self) -> &[String] {
        self.include.as_deref().unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self == &QuerySpec::default()
    }
}
