//! CLI command implementations
//!
//! Both commands are one-shot and never touch a repository: `normalize`
//! prints the canonical query, `explain` prints the assembled plan or the
//! reason it was rejected.

use std::path::Path;

use serde_json::Value;

use crate::config::QueryConfig;
use crate::executor::{Assembler, ExplainPlan, FetchError, FetchResult, ModelQuery};
use crate::planner::RelationResolver;
use crate::query::Normalizer;
use crate::schema::{ModelGraph, SchemaLoader};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_query, write_response, write_text};

/// Dispatches a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Normalize { query, config } => normalize(query.as_deref(), config.as_deref()),
        Command::Explain {
            schema,
            model,
            query,
            config,
        } => explain(&schema, &model, query.as_deref(), config.as_deref()),
    }
}

/// Print the canonical form of a raw query
pub fn normalize(query: Option<&str>, config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let raw = read_query(query)?;
    write_response(normalize_value(&raw, &config)?)
}

/// Print the explain plan of a raw query against `model`
pub fn explain(
    schema_path: &Path,
    model: &str,
    query: Option<&str>,
    config_path: Option<&Path>,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let graph = SchemaLoader::load(schema_path)?;
    let raw = read_query(query)?;
    write_text(&explain_plan(&graph, model, &raw, &config).to_string())
}

/// Canonical query as JSON
pub fn normalize_value(raw: &Value, config: &QueryConfig) -> CliResult<Value> {
    let spec = Normalizer::new(config)
        .normalize(raw)
        .map_err(FetchError::from)?;
    Ok(serde_json::to_value(spec)?)
}

/// Explain plan for `raw`; rejections are rendered, not returned.
pub fn explain_plan(graph: &ModelGraph, model: &str, raw: &Value, config: &QueryConfig) -> ExplainPlan {
    match assemble_plan(graph, model, raw, config) {
        Ok(plan) => plan,
        Err(err) => ExplainPlan::from_error(&err),
    }
}

fn assemble_plan(
    graph: &ModelGraph,
    model: &str,
    raw: &Value,
    config: &QueryConfig,
) -> FetchResult<ExplainPlan> {
    let base = ModelQuery::new(RelationResolver::new(graph).model(model)?);
    let spec = Normalizer::new(config).normalize(raw)?;
    let plan = Assembler::new(graph).assemble(&base, &spec)?;
    Ok(ExplainPlan::from_plan(&plan))
}

fn load_config(path: Option<&Path>) -> CliResult<QueryConfig> {
    match path {
        Some(path) => QueryConfig::load(path).map_err(|e| {
            CliError::config_error(format!("Failed to load config {}: {}", path.display(), e))
        }),
        None => Ok(QueryConfig::default()),
    }
}
