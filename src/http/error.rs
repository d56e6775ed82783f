//! API error type with HTTP status mapping

use crate::graph::GraphError;
use crate::inference::InferenceError;
use crate::storage::StorageError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Graph(#[from] GraphError),

    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),

    #[error("Invalid query string: {0}")]
    Query(#[from] QueryRejection),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Graph(GraphError::Storage(e))
    }
}

/// Result type for HTTP handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Json(_) | ApiError::Query(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Graph(e) => match e {
                GraphError::InvalidTriple(_)
                | GraphError::MissingGraphName
                | GraphError::GraphNotFound(_)
                | GraphError::UnknownInference(_) => StatusCode::BAD_REQUEST,
                GraphError::NotFound(_) => StatusCode::NOT_FOUND,
                GraphError::Storage(s) => storage_status(s),
                GraphError::Inference(i) => match i {
                    InferenceError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
                    InferenceError::MissingArgument(_) => StatusCode::BAD_REQUEST,
                    InferenceError::Graph(g) => match g.as_ref() {
                        GraphError::Storage(s) => storage_status(s),
                        _ => StatusCode::INTERNAL_SERVER_ERROR,
                    },
                    _ => StatusCode::BAD_GATEWAY,
                },
            },
        }
    }
}

fn storage_status(e: &StorageError) -> StatusCode {
    match e {
        StorageError::Cancelled | StorageError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        StorageError::InvalidPartitionName(_) | StorageError::InvalidOrderBy(_) | StorageError::InvalidTriple(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
