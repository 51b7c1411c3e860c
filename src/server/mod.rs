//! HTTP boundary for the scoring service.
//!
//! The router exposes single-record and batch prediction plus a health
//! probe. Pipeline errors are turned into `{"error": ...}` bodies here and
//! nowhere else.

pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::error::{Error, ErrorKind};
use crate::pipeline::Predictor;

pub use handlers::{health_handler, predict_single, predict_upload};

/// Message returned for server-side failures
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// State shared by every request handler
#[derive(Debug)]
pub struct AppState {
    pub config: ServiceConfig,
    pub predictor: Predictor,
}

impl AppState {
    #[must_use]
    pub const fn new(config: ServiceConfig, predictor: Predictor) -> Self {
        Self { config, predictor }
    }
}

/// Build the axum [`Router`] with all routes
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(predict_single))
        .route("/predict/", post(predict_single))
        .route("/predict/upload", post(predict_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Failure of a request, rendered as a JSON error response
#[derive(Debug)]
pub enum ApiError {
    /// The pipeline rejected or failed the request
    Pipeline(Error),
    /// The blocking task running the pipeline panicked or was cancelled
    Worker(tokio::task::JoinError),
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self::Pipeline(error)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Worker(error)
    }
}

/// Status code for an error kind
#[must_use]
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::Numeric => StatusCode::BAD_REQUEST,
        ErrorKind::Model | ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Pipeline(error) => {
                let status = status_for(error.kind());
                if error.is_client_error() {
                    (status, error.to_string())
                } else {
                    log::error!("Request failed: {error}");
                    (status, INTERNAL_ERROR_MESSAGE.to_string())
                }
            }
            Self::Worker(error) => {
                log::error!("Prediction worker failed: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
