//! # Query Normalizer
//!
//! Parses a raw nested query object (as produced by a URL query-string
//! parser) into a canonical `QuerySpec`. Pure: never touches the model graph
//! or the data store.
//!
//! Recognized sections: `filter`, `sort`, `page`, `include`, `fields`
//! (alias `field`) and `aggregate`. Every section is absent from the output
//! when its raw input is empty.

use serde_json::{Map, Value};

use super::errors::QueryResult;
use super::operator::{compile, IMPLICIT_OPERATOR};
use super::spec::{AggregateSpec, FieldSet, FilterItem, PageSpec, QuerySpec, SortItem};
use crate::config::QueryConfig;
use crate::observability::Logger;
use crate::util::{first_key, first_value, is_empty_value, split_tokens};

/// Normalizes a raw query with the default configuration.
pub fn normalize(raw: &Value) -> QueryResult<QuerySpec> {
    Normalizer::new(&QueryConfig::default()).normalize(raw)
}

/// Query normalizer bound to a configuration
pub struct Normalizer<'a> {
    config: &'a QueryConfig,
}

impl<'a> Normalizer<'a> {
    pub fn new(config: &'a QueryConfig) -> Self {
        Self { config }
    }

    /// Parses every section of the raw object.
    pub fn normalize(&self, raw: &Value) -> QueryResult<QuerySpec> {
        let Some(raw) = raw.as_object() else {
            return Ok(QuerySpec::default());
        };

        let spec = QuerySpec {
            filter: raw.get("filter").map(parse_filters).transpose()?.flatten(),
            sort: raw.get("sort").and_then(parse_sort),
            page: raw.get("page").and_then(|p| self.parse_page(p)),
            include: raw.get("include").and_then(parse_include),
            fields: raw
                .get("fields")
                .or_else(|| raw.get("field"))
                .and_then(parse_fields),
            aggregate: raw.get("aggregate").and_then(parse_aggregates),
        };

        let filters = count(&spec.filter).to_string();
        let includes = count(&spec.include).to_string();
        let sorts = count(&spec.sort).to_string();
        Logger::trace(
            "QUERY_NORMALIZED",
            &[
                ("filters", filters.as_str()),
                ("includes", includes.as_str()),
                ("sorts", sorts.as_str()),
            ],
        );

        Ok(spec)
    }

    /// Parses `page[number]` / `page[size]` over configured defaults.
    fn parse_page(&self, raw: &Value) -> Option<PageSpec> {
        let map = raw.as_object().filter(|m| !m.is_empty())?;

        let page = self.page_value(map, "number", self.config.default_page).max(1);
        let page_size = self.page_value(map, "size", self.config.default_page_size);
        let page_size = match self.config.max_page_size {
            Some(max) => page_size.min(max),
            None => page_size,
        }
        .max(1);

        Some(PageSpec { page, page_size })
    }

    fn page_value(&self, map: &Map<String, Value>, key: &str, default: u64) -> u64 {
        let Some(raw) = map.get(key) else {
            return default;
        };

        let parsed = match raw {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };

        match parsed {
            Some(v) if v >= 1 => v,
            _ => {
                let value = raw.to_string();
                Logger::warn("PAGE_VALUE_IGNORED", &[("key", key), ("value", value.as_str())]);
                default
            }
        }
    }
}

fn count<T>(section: &Option<Vec<T>>) -> usize {
    section.as_ref().map_or(0, Vec::len)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Parses the filter section. Sub-filters with empty values are dropped.
fn parse_filters(raw: &Value) -> QueryResult<Option<Vec<FilterItem>>> {
    let Some(map) = raw.as_object() else {
        return Ok(None);
    };

    let mut items = Vec::with_capacity(map.len());
    for (key, value) in map {
        if let Some(item) = parse_filter(key, value)? {
            items.push(item);
        }
    }

    Ok(non_empty(items))
}

/// Parses a single `filter[key]` entry.
fn parse_filter(key: &str, value: &Value) -> QueryResult<Option<FilterItem>> {
    let (token, operand) = match value {
        Value::Object(map) => match (first_key(map), first_value(value)) {
            (Some(op), Some(operand)) => (op, operand),
            _ => return Ok(None),
        },
        other => (IMPLICIT_OPERATOR, other),
    };

    let (relations, column) = split_relation_path(key);
    let item = compile(token, column, operand)?;

    Ok(item.map(|item| {
        if relations.is_empty() {
            item
        } else {
            item.with_relations(relations)
        }
    }))
}

/// Splits `a.b.column` into (`[a, b]`, `column`).
pub fn split_relation_path(key: &str) -> (Vec<String>, &str) {
    match key.rsplit_once('.') {
        Some((path, column)) => (path.split('.').map(str::to_string).collect(), column),
        None => (Vec::new(), key),
    }
}

fn parse_sort(raw: &Value) -> Option<Vec<SortItem>> {
    non_empty(split_tokens(raw).iter().map(|t| SortItem::parse(t)).collect())
}

fn parse_include(raw: &Value) -> Option<Vec<String>> {
    non_empty(split_tokens(raw))
}

/// `{name: "a,b"}` pairs with non-empty values
fn parse_column_lists(raw: &Value) -> Vec<(String, Vec<String>)> {
    let Some(map) = raw.as_object() else {
        return Vec::new();
    };

    map.iter()
        .filter(|(_, v)| !is_empty_value(v))
        .map(|(k, v)| (k.clone(), split_tokens(v)))
        .filter(|(_, columns)| !columns.is_empty())
        .collect()
}

fn parse_fields(raw: &Value) -> Option<Vec<FieldSet>> {
    non_empty(
        parse_column_lists(raw)
            .into_iter()
            .map(|(resource, columns)| FieldSet { resource, columns })
            .collect(),
    )
}

fn parse_aggregates(raw: &Value) -> Option<Vec<AggregateSpec>> {
    non_empty(
        parse_column_lists(raw)
            .into_iter()
            .map(|(operator, columns)| AggregateSpec { operator, columns })
            .collect(),
    )
}
