//! REST API endpoints.
//!
//! Axum-based HTTP API for reading regional leaderboards, averaging
//! rank labels, generating match analyses, and driving refreshes.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::models::{Region, UnknownRegion};
use crate::storage::StorageError;
use crate::sync::RefreshError;

pub mod routes;
pub mod state;

use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidCursor => ApiError::BadRequest("invalid cursor".to_string()),
            StorageError::PlayerNotFound { .. } => ApiError::NotFound(err.to_string()),
            StorageError::Io(_) | StorageError::Json(_) => {
                ApiError::StorageUnavailable(err.to_string())
            }
        }
    }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::AlreadyRunning => {
                ApiError::Conflict("Refresh already running".to_string())
            }
            RefreshError::Storage(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::StorageUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Resolve the `region` parameter the leaderboard and admin routes
/// require. Absence and an unknown name are both client errors.
pub fn require_region(value: Option<&str>) -> Result<Region, ApiError> {
    let raw = value.ok_or_else(|| ApiError::BadRequest("region is required".to_string()))?;
    raw.parse()
        .map_err(|e: UnknownRegion| ApiError::BadRequest(e.to_string()))
}

/// Reject requests that come through Cloudflare Tunnel (public domain).
/// Cloudflare always adds the `CF-Connecting-IP` header to proxied requests.
pub fn require_local(headers: &HeaderMap) -> Result<(), ApiError> {
    if headers.contains_key("cf-connecting-ip") {
        return Err(ApiError::Forbidden(
            "This endpoint is only available on localhost".to_string(),
        ));
    }
    Ok(())
}

/// Assemble the full route tree.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(routes::meta::health))
        .route("/leaderboard", get(routes::leaderboard::page))
        .route(
            "/leaderboard/surrounding",
            get(routes::leaderboard::surrounding),
        )
        .route("/ranks/average", post(routes::ranks::average))
        .route("/analysis", post(routes::analysis::analyze))
        .route("/refresh", post(routes::refresh::start_refresh))
        .route("/refresh/status", get(routes::refresh::status))
        .route("/admin/seed", post(routes::admin::seed))
        .route("/admin/reset", post(routes::admin::reset));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
