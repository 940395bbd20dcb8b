//! Observability for relquery
//!
//! Structured event logging on top of `tracing`. The crate never installs a
//! subscriber itself; library callers bring their own, the CLI installs
//! `tracing-subscriber` with an env filter.
//!
//! # Usage
//!
//! ```ignore
//! use relquery::observability::Logger;
//!
//! Logger::info("FETCH_COMPLETE", &[("model", "posts")]);
//! ```

mod logger;

pub use logger::{Logger, Severity};
