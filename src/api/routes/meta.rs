use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the analysis backend is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    /// Which analysis backend this instance talks to.
    pub generator: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let generator_up = state.generator.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: if generator_up { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        generator: state.generator.name(),
    })
}
