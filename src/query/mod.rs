//! # Query Normalizer
//!
//! Turns a raw nested query object into a canonical `QuerySpec`:
//!
//! ```text
//! filter[title]=foo,bar           -> title in [foo, bar]
//! filter[age][gte]=20             -> age >= 20
//! filter[author.name][contains]=a -> [author] name like %a%
//! sort=-created_at,title          -> created_at DESC, title ASC
//! page[number]=2&page[size]=10    -> {page: 2, pageSize: 10}
//! include=author,comments
//! fields[posts]=title,body
//! aggregate[sum]=views
//! ```

mod errors;
mod operator;
mod parser;
mod spec;

pub use errors::{QueryError, QueryResult};
pub use operator::{compile, parse_operator, IMPLICIT_OPERATOR};
pub use parser::{normalize, split_relation_path, Normalizer};
pub use spec::{
    AggregateSpec, FieldSet, FilterItem, FilterOperator, PageSpec, QuerySpec, SortItem, SortOrder,
};
