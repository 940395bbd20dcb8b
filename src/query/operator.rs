//! # Operator Compiler
//!
//! Translates an operator token and its raw value into a `FilterItem`.

use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use super::spec::{FilterItem, FilterOperator};
use crate::util::{first_value, is_empty_value, to_value_list};

/// Operator used when a filter value is not an operator object
pub const IMPLICIT_OPERATOR: &str = "in";

/// Maps a raw operator token onto a predicate operator.
pub fn parse_operator(token: &str) -> QueryResult<FilterOperator> {
    match token {
        "in" => Ok(FilterOperator::In),
        "lt" => Ok(FilterOperator::Lt),
        "lte" => Ok(FilterOperator::Lte),
        "gt" => Ok(FilterOperator::Gt),
        "gte" => Ok(FilterOperator::Gte),
        "contains" => Ok(FilterOperator::Like),
        other => Err(QueryError::UnsupportedOperator(other.to_string())),
    }
}

/// Compiles one filter.
///
/// Returns `Ok(None)` when the transformed value is empty; such filters are
/// dropped by the normalizer.
pub fn compile(token: &str, column: &str, raw: &Value) -> QueryResult<Option<FilterItem>> {
    let operator = parse_operator(token)?;

    let value = match operator {
        FilterOperator::In => {
            let values = to_value_list(raw);
            if values.is_empty() {
                return Ok(None);
            }
            Value::Array(values)
        }
        FilterOperator::Lt | FilterOperator::Lte | FilterOperator::Gt | FilterOperator::Gte => {
            match first_value(raw) {
                Some(v) if !is_empty_value(v) => v.clone(),
                _ => return Ok(None),
            }
        }
        FilterOperator::Like => {
            if is_empty_value(raw) {
                return Ok(None);
            }
            Value::String(format!("%{}%", like_operand(raw)))
        }
    };

    Ok(Some(FilterItem::new(column, operator, value)))
}

fn like_operand(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_implicit_in() {
        let item = compile("in", "tags", &json!("foo,bar,baz")).unwrap().unwrap();
        assert_eq!(item.operator, FilterOperator::In);
        assert_eq!(item.value, json!(["foo", "bar", "baz"]));

        let item = compile("in", "name", &json!("foo")).unwrap().unwrap();
        assert_eq!(item.value, json!(["foo"]));
    }

    #[test]
    fn test_comparisons() {
        for (token, op) in [
            ("lt", FilterOperator::Lt),
            ("lte", FilterOperator::Lte),
            ("gt", FilterOperator::Gt),
            ("gte", FilterOperator::Gte),
        ] {
            let item = compile(token, "age", &json!(20)).unwrap().unwrap();
            assert_eq!(item.operator, op);
            assert_eq!(item.value, json!(20));
        }

        let item = compile("lt", "age", &json!([5, 9])).unwrap().unwrap();
        assert_eq!(item.value, json!(5));
    }

    #[test]
    fn test_contains_wraps_value() {
        let item = compile("contains", "title", &json!("hello")).unwrap().unwrap();
        assert_eq!(item.operator, FilterOperator::Like);
        assert_eq!(item.value, json!("%hello%"));
    }

    #[test]
    fn test_empty_values_are_dropped() {
        assert_eq!(compile("in", "a", &json!("")).unwrap(), None);
        assert_eq!(compile("in", "a", &json!([])).unwrap(), None);
        assert_eq!(compile("gte", "a", &json!("")).unwrap(), None);
        assert_eq!(compile("contains", "a", &json!("")).unwrap(), None);
    }

    #[test]
    fn test_unsupported_operator() {
        let err = compile("like", "a", &json!("foo")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported operator: like");
    }
}
