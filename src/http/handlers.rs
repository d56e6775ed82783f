//! Route handlers and their request/response bodies

use super::error::{ApiError, ApiResult};
use super::prefix::{expand_clause, expand_pattern, Prefixes};
use super::AppState;
use crate::graph::{Clause, GraphError, Pattern, Triple, Value};
use crate::query::{PathQuery, QueryOptions};
use crate::storage::{OrderBy, TripleOptions};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Body of `/v1/data`, both for adding (POST) and removing (DELETE).
///
/// Entries may contain `null` positions; on removal those are wildcards, on
/// insertion such entries are skipped. Entries that are not a
/// `[string, string, value]` triple are dropped rather than failing the batch.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DataRequest {
    pub graph: String,
    pub prefix: Prefixes,
    #[serde(deserialize_with = "lenient_entries")]
    pub data: Vec<Option<Pattern>>,
}

fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<Option<Pattern>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, entry)| match Pattern::deserialize(entry) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                debug!(entry = i, error = %e, "dropping malformed data entry");
                None
            }
        })
        .collect())
}

impl DataRequest {
    fn expanded_patterns(self) -> Vec<Pattern> {
        let prefix = self.prefix;
        self.data
            .into_iter()
            .flatten()
            .map(|mut pattern| {
                expand_pattern(&prefix, &mut pattern);
                pattern
            })
            .collect()
    }
}

/// Body of `/v1/triples` and `/v1/triples/count`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TriplesRequest {
    pub graph: String,
    pub prefix: Prefixes,
    pub sub: String,
    pub pred: String,
    pub obj: Option<Value>,
    pub limit: usize,
    pub offset: usize,
    pub orderby: String,
}

impl TriplesRequest {
    fn pattern(&self) -> Pattern {
        let mut pattern = Pattern::new(self.sub.clone(), self.pred.clone(), self.obj.clone());
        expand_pattern(&self.prefix, &mut pattern);
        pattern
    }

    fn options(&self) -> ApiResult<TripleOptions> {
        let mut options = TripleOptions::new().with_limit(self.limit).with_offset(self.offset);
        if !self.orderby.is_empty() {
            options = options.with_order_by(self.orderby.parse::<OrderBy>()?);
        }
        Ok(options)
    }
}

/// Body of `/v1/value`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValueRequest {
    pub graph: String,
    pub prefix: Prefixes,
    pub sub: String,
    pub pred: String,
    pub obj: Option<Value>,
}

/// Body of `/v1/query`: clauses plus the result pipeline options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    pub graph: String,
    pub prefix: Prefixes,
    pub data: Vec<Clause>,
    #[serde(flatten)]
    pub options: QueryOptions,
}

/// `{"graph": ..., "data": ...}`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub graph: String,
    pub data: T,
}

/// `?COUNT` queries echo the request alongside the number of results.
#[derive(Debug, Serialize)]
pub struct QueryCountResponse {
    pub graph: String,
    pub request: QueryRequest,
    pub data: usize,
}

#[derive(Debug, Serialize)]
pub struct GraphsResponse {
    pub data: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GraphParams {
    pub graph: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IndexParams {
    pub graph: String,
    pub background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PathParams {
    pub graph: String,
    pub start: String,
    pub end: String,
    pub predicate_name: String,
    pub predicate_adjacent: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InferenceParams {
    pub graph: String,
    pub inference: String,
}

pub async fn ping() -> &'static str {
    "PONG"
}

pub async fn list_graphs(State(state): State<Arc<AppState>>) -> ApiResult<Json<GraphsResponse>> {
    let data = state.run(|engine, cx| Ok(engine.list(cx)?)).await?;
    Ok(Json(GraphsResponse { data }))
}

pub async fn add_data(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DataRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<usize>>> {
    let Json(request) = payload?;
    let name = request.graph.clone();
    let triples: Vec<Triple> = request
        .expanded_patterns()
        .into_iter()
        .filter_map(Pattern::into_triple)
        .collect();

    let graph = name.clone();
    let inserted = state
        .run(move |engine, cx| Ok(engine.resolve_or_create(cx, &graph)?.add_many(cx, &triples)?))
        .await?;
    Ok(Json(DataResponse { graph: name, data: inserted }))
}

pub async fn remove_data(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DataRequest>, JsonRejection>,
) -> ApiResult<&'static str> {
    let Json(request) = payload?;
    let name = request.graph.clone();
    let patterns = request.expanded_patterns();

    state
        .run(move |engine, cx| Ok(engine.resolve_or_create(cx, &name)?.remove_many(cx, &patterns)?))
        .await?;
    Ok("OK")
}

pub async fn triples(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TriplesRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<Vec<Triple>>>> {
    let Json(request) = payload?;
    let pattern = request.pattern();
    let options = request.options()?;

    let graph = request.graph.clone();
    let data = state
        .run(move |engine, cx| Ok(engine.resolve_or_create(cx, &graph)?.triples(cx, &pattern, &options)?))
        .await?;
    Ok(Json(DataResponse { graph: request.graph, data }))
}

pub async fn count_triples(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TriplesRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<u64>>> {
    let Json(request) = payload?;
    let pattern = request.pattern();

    let graph = request.graph.clone();
    let data = state
        .run(move |engine, cx| Ok(engine.resolve_or_create(cx, &graph)?.count(cx, &pattern)?))
        .await?;
    Ok(Json(DataResponse { graph: request.graph, data }))
}

/// A pattern with no match answers `null` rather than an error.
pub async fn value(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ValueRequest>, JsonRejection>,
) -> ApiResult<Json<DataResponse<Option<Value>>>> {
    let Json(request) = payload?;
    let mut pattern = Pattern::new(request.sub, request.pred, request.obj);
    expand_pattern(&request.prefix, &mut pattern);

    let graph = request.graph.clone();
    let data = state
        .run(move |engine, cx| {
            match engine.resolve_or_create(cx, &graph)?.value(cx, &pattern) {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await?;
    Ok(Json(DataResponse { graph: request.graph, data }))
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<axum::response::Response> {
    use axum::response::IntoResponse;

    let Json(request) = payload?;
    let mut clauses = request.data.clone();
    for clause in &mut clauses {
        expand_clause(&request.prefix, clause);
    }

    let graph = request.graph.clone();
    let options = request.options.clone();
    let bindings = state
        .run(move |engine, cx| Ok(engine.resolve_or_create(cx, &graph)?.try_query(cx, &clauses, &options)?))
        .await?;

    if request.options.wants_count() {
        let data = bindings.len();
        return Ok(Json(QueryCountResponse {
            graph: request.graph.clone(),
            request,
            data,
        })
        .into_response());
    }
    Ok(Json(DataResponse { graph: request.graph, data: bindings }).into_response())
}

/// `background` defaults to true when absent or unparsable.
pub async fn index(
    State(state): State<Arc<AppState>>,
    params: Result<Query<IndexParams>, QueryRejection>,
) -> ApiResult<&'static str> {
    let Query(params) = params?;
    if params.graph.is_empty() {
        return Err(ApiError::bad_request("graph name not provided"));
    }
    let background = params
        .background
        .as_deref()
        .and_then(|b| b.parse::<bool>().ok())
        .unwrap_or(true);

    state
        .run(move |engine, cx| Ok(engine.resolve_or_create(cx, &params.graph)?.index(cx, background)?))
        .await?;
    Ok("OK")
}

pub async fn drop_graph(
    State(state): State<Arc<AppState>>,
    params: Result<Query<GraphParams>, QueryRejection>,
) -> ApiResult<&'static str> {
    let Query(params) = params?;
    if params.graph.is_empty() {
        return Err(ApiError::bad_request("graph name required"));
    }
    state.run(move |engine, cx| Ok(engine.drop_graph(cx, &params.graph)?)).await?;
    Ok("OK")
}

/// Unknown start or end names are client errors here.
pub async fn path(
    State(state): State<Arc<AppState>>,
    params: Result<Query<PathParams>, QueryRejection>,
) -> ApiResult<Json<DataResponse<Vec<String>>>> {
    let Query(params) = params?;
    let mut path = PathQuery::between(params.start, params.end).adjacency(params.predicate_adjacent);
    if !params.predicate_name.is_empty() {
        path = path.names(params.predicate_name);
    }

    let graph = params.graph.clone();
    let data = state
        .run(move |engine, cx| {
            match engine.resolve_or_create(cx, &graph)?.path(cx, &path) {
                Ok(names) => Ok(names),
                Err(GraphError::NotFound(msg)) => Err(ApiError::BadRequest(msg)),
                Err(e) => Err(e.into()),
            }
        })
        .await?;
    Ok(Json(DataResponse { graph: params.graph, data }))
}

/// Responds with the number of triples the rule added.
pub async fn inference(
    State(state): State<Arc<AppState>>,
    params: Result<Query<InferenceParams>, QueryRejection>,
) -> ApiResult<Json<DataResponse<usize>>> {
    let Query(params) = params?;
    let rule = state
        .inferences
        .get(&params.inference)
        .ok_or_else(|| GraphError::UnknownInference(params.inference.clone()))?;

    let graph = params.graph.clone();
    let added = state
        .run(move |engine, cx| Ok(engine.resolve_or_create(cx, &graph)?.apply_inference(cx, rule.as_ref())?))
        .await?;
    Ok(Json(DataResponse { graph: params.graph, data: added }))
}
