use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::api::state::AppState;
use crate::api::{require_local, ApiError};
use crate::sync::RefreshState;

/// Begin a ladder refresh in the background and report the freshly
/// marked Running state. A second request while a run is in flight
/// gets a 409 instead of a second run.
pub async fn start_refresh(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    require_local(&headers)?;

    let snapshot = state.orchestrator.trigger().await?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

pub async fn status(State(state): State<AppState>) -> Json<RefreshState> {
    Json(state.orchestrator.state().await)
}
