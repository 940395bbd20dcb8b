//! Fetch orchestration
//!
//! Normalizes a raw request, assembles the plan, then hands the queries to a
//! `Repository`. When an aggregate is requested the main and the aggregate
//! fetch run concurrently and both must succeed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use super::assembler::{Assembler, ExecutionPlan};
use super::errors::{FetchError, FetchResult, RepositoryError};
use super::query::ModelQuery;
use crate::config::QueryConfig;
use crate::observability::Logger;
use crate::planner::RelationResolver;
use crate::query::{Normalizer, PageSpec};
use crate::schema::ModelGraph;

/// Relational collaborator executing assembled queries
#[async_trait]
pub trait Repository: Send + Sync {
    /// Opaque handle (transaction, connection, ...) passed through unmodified
    type Context: Send + Sync;

    /// Row or collection type produced by the main fetch
    type Output: Send;

    async fn fetch_one(
        &self,
        query: &ModelQuery,
        context: Option<&Self::Context>,
    ) -> Result<Self::Output, RepositoryError>;

    async fn fetch_all(
        &self,
        query: &ModelQuery,
        context: Option<&Self::Context>,
    ) -> Result<Self::Output, RepositoryError>;

    async fn fetch_page(
        &self,
        query: &ModelQuery,
        page: PageSpec,
        context: Option<&Self::Context>,
    ) -> Result<Self::Output, RepositoryError>;

    /// Runs an aggregate query and returns its single row
    async fn fetch_aggregate(
        &self,
        query: &ModelQuery,
        context: Option<&Self::Context>,
    ) -> Result<Map<String, Value>, RepositoryError>;
}

/// Fetch entry point the repository is called through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Single,
    All,
    Page(PageSpec),
}

impl FetchMode {
    pub fn for_plan(plan: &ExecutionPlan, is_collection: bool) -> Self {
        match (is_collection, plan.page) {
            (false, _) => FetchMode::Single,
            (true, Some(page)) => FetchMode::Page(page),
            (true, None) => FetchMode::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Single => "single",
            FetchMode::All => "all",
            FetchMode::Page(_) => "page",
        }
    }
}

/// Per-call options
#[derive(Debug, Clone)]
pub struct FetchOptions<C> {
    /// Collection fetch (default) or a single record
    pub is_collection: bool,
    pub context: Option<C>,
}

impl<C> Default for FetchOptions<C> {
    fn default() -> Self {
        Self {
            is_collection: true,
            context: None,
        }
    }
}

impl<C> FetchOptions<C> {
    /// Options for a single-record fetch
    pub fn single() -> Self {
        Self {
            is_collection: false,
            context: None,
        }
    }

    pub fn with_context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }
}

/// Main fetch result plus the aggregate row, when one was requested
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fetched<T> {
    pub data: T,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Map<String, Value>>,
}

/// Fetches through `repository` using the default configuration.
pub async fn fetch<R: Repository>(
    repository: &R,
    graph: &ModelGraph,
    model: &str,
    raw: &Value,
    options: &FetchOptions<R::Context>,
) -> FetchResult<Fetched<R::Output>> {
    let config = QueryConfig::default();
    let base = ModelQuery::new(RelationResolver::new(graph).model(model)?);
    Fetcher::run(repository, graph, &config, &base, raw, options).await
}

/// Repository bound to a model graph and a configuration
pub struct Fetcher<R: Repository> {
    repository: R,
    graph: Arc<ModelGraph>,
    config: QueryConfig,
}

impl<R: Repository> Fetcher<R> {
    pub fn new(repository: R, graph: Arc<ModelGraph>) -> Self {
        Self {
            repository,
            graph,
            config: QueryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// Base query over a registered model
    pub fn base(&self, model: &str) -> FetchResult<ModelQuery> {
        let def = RelationResolver::new(&self.graph).model(model)?;
        Ok(ModelQuery::new(def))
    }

    /// Normalizes and assembles without touching the repository.
    pub fn plan(&self, base: &ModelQuery, raw: &Value) -> FetchResult<ExecutionPlan> {
        build_plan(&self.graph, &self.config, base, raw)
    }

    /// Fetches `model` for the raw request `raw`.
    pub async fn fetch(
        &self,
        model: &str,
        raw: &Value,
        options: &FetchOptions<R::Context>,
    ) -> FetchResult<Fetched<R::Output>> {
        let base = self.base(model)?;
        self.fetch_from(&base, raw, options).await
    }

    /// Fetches starting from a caller-built base query; `base` is not modified.
    pub async fn fetch_from(
        &self,
        base: &ModelQuery,
        raw: &Value,
        options: &FetchOptions<R::Context>,
    ) -> FetchResult<Fetched<R::Output>> {
        Self::run(&self.repository, &self.graph, &self.config, base, raw, options).await
    }

    async fn run(
        repository: &R,
        graph: &ModelGraph,
        config: &QueryConfig,
        base: &ModelQuery,
        raw: &Value,
        options: &FetchOptions<R::Context>,
    ) -> FetchResult<Fetched<R::Output>> {
        let model = base.model.name.clone();

        let plan = match build_plan(graph, config, base, raw) {
            Ok(plan) => plan,
            Err(err) => {
                log_failure(&model, &err);
                return Err(err);
            }
        };

        let mode = FetchMode::for_plan(&plan, options.is_collection);
        Logger::info(
            "FETCH_STARTED",
            &[
                ("model", model.as_str()),
                ("mode", mode.as_str()),
                ("aggregate", if plan.aggregate.is_some() { "true" } else { "false" }),
            ],
        );

        match execute(repository, &plan, mode, options.context.as_ref()).await {
            Ok(fetched) => {
                Logger::info(
                    "FETCH_COMPLETE",
                    &[("model", model.as_str()), ("mode", mode.as_str())],
                );
                Ok(fetched)
            }
            Err(err) => {
                log_failure(&model, &err);
                Err(err)
            }
        }
    }
}

/// Runs an assembled plan against `repository`.
pub async fn execute<R: Repository>(
    repository: &R,
    plan: &ExecutionPlan,
    mode: FetchMode,
    context: Option<&R::Context>,
) -> FetchResult<Fetched<R::Output>> {
    let main = fetch_main(repository, &plan.query, mode, context);

    let Some(aggregate) = &plan.aggregate else {
        let data = main.await.map_err(FetchError::Repository)?;
        return Ok(Fetched {
            data,
            aggregation: None,
        });
    };

    let (data, aggregation) = tokio::try_join!(main, repository.fetch_aggregate(aggregate, context))
        .map_err(FetchError::Repository)?;

    Ok(Fetched {
        data,
        aggregation: Some(aggregation),
    })
}

async fn fetch_main<R: Repository>(
    repository: &R,
    query: &ModelQuery,
    mode: FetchMode,
    context: Option<&R::Context>,
) -> Result<R::Output, RepositoryError> {
    match mode {
        FetchMode::Single => repository.fetch_one(query, context).await,
        FetchMode::All => repository.fetch_all(query, context).await,
        FetchMode::Page(page) => repository.fetch_page(query, page, context).await,
    }
}

fn build_plan(
    graph: &ModelGraph,
    config: &QueryConfig,
    base: &ModelQuery,
    raw: &Value,
) -> FetchResult<ExecutionPlan> {
    let spec = Normalizer::new(config).normalize(raw)?;
    Ok(Assembler::new(graph).assemble(base, &spec)?)
}

fn log_failure(model: &str, err: &FetchError) {
    let reason = err.to_string();
    let fields = [
        ("model", model),
        ("code", err.code()),
        ("reason", reason.as_str()),
    ];

    if err.is_rejection() {
        Logger::warn("FETCH_REJECTED", &fields);
    } else {
        Logger::error("FETCH_FAILED", &fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ModelDef;
    use serde_json::json;

    fn plan(page: Option<PageSpec>) -> ExecutionPlan {
        ExecutionPlan {
            query: ModelQuery::new(Arc::new(ModelDef::new("posts", "posts"))),
            aggregate: None,
            page,
        }
    }

    #[test]
    fn test_fetch_mode_selection() {
        let page = PageSpec { page: 2, page_size: 10 };
        assert_eq!(FetchMode::for_plan(&plan(None), true), FetchMode::All);
        assert_eq!(FetchMode::for_plan(&plan(Some(page)), true), FetchMode::Page(page));
        assert_eq!(FetchMode::for_plan(&plan(Some(page)), false), FetchMode::Single);
    }

    #[test]
    fn test_options_default_to_collection() {
        let options: FetchOptions<()> = FetchOptions::default();
        assert!(options.is_collection);
        assert!(options.context.is_none());

        let single = FetchOptions::single().with_context(7u32);
        assert!(!single.is_collection);
        assert_eq!(single.context, Some(7));
    }

    #[test]
    fn test_fetched_serialization() {
        let mut row = Map::new();
        row.insert("count_id".into(), json!(3));
        let fetched = Fetched {
            data: json!([{ "id": 1 }]),
            aggregation: Some(row),
        };
        assert_eq!(
            serde_json::to_value(&fetched).unwrap(),
            json!({ "data": [{ "id": 1 }], "aggregation": { "count_id": 3 } })
        );

        let plain = Fetched {
            data: json!([]),
            aggregation: None,
        };
        assert_eq!(serde_json::to_value(&plain).unwrap(), json!({ "data": [] }));
    }
}
