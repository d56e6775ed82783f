//! JSON HTTP API under `/v1`
//!
//! Handlers decode the request, expand prefixes and hand the engine call to
//! the blocking thread pool with a fresh [`CallContext`]. Dropping the
//! request future (client gone, server shutting down) cancels the context.

mod error;
mod handlers;
mod prefix;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::{
    DataRequest, DataResponse, GraphsResponse, QueryCountResponse, QueryRequest, TriplesRequest, ValueRequest,
};
pub use prefix::{expand_clause, expand_pattern, expand_str, expand_value, Prefixes};

use crate::graph::GraphEngine;
use crate::inference::InferenceRegistry;
use crate::storage::{CallContext, CancellationToken};
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state of every handler
pub struct AppState {
    pub engine: Arc<GraphEngine>,
    pub inferences: Arc<InferenceRegistry>,
    /// Per request deadline; zero disables it
    pub timeout: Duration,
}

impl AppState {
    pub fn new(engine: Arc<GraphEngine>, inferences: Arc<InferenceRegistry>, timeout: Duration) -> Self {
        Self {
            engine,
            inferences,
            timeout,
        }
    }

    /// Run a blocking engine call on the blocking pool.
    pub(crate) async fn run<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&GraphEngine, &CallContext) -> ApiResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        let cx = CallContext::with_timeout(self.timeout);
        let _guard = CancelOnDrop(cx.token().clone());

        tokio::task::spawn_blocking(move || f(&engine, &cx))
            .await
            .map_err(|e| ApiError::Internal(format!("engine task failed: {}", e)))?
    }
}

/// Cancels the token when the owning future goes away.
struct CancelOnDrop(CancellationToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route("/ping", get(handlers::ping))
        .route("/graphs", get(handlers::list_graphs))
        .route("/data", post(handlers::add_data).delete(handlers::remove_data))
        .route("/triples", post(handlers::triples))
        .route("/triples/count", post(handlers::count_triples))
        .route("/value", post(handlers::value))
        .route("/query", post(handlers::query))
        .route("/index", post(handlers::index))
        .route("/drop", post(handlers::drop_graph))
        .route("/path", get(handlers::path))
        .route("/inference", put(handlers::inference));

    Router::new()
        .nest("/v1", v1)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until Ctrl-C.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, rules = ?state.inferences.names(), "tristore server starting");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("tristore server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
