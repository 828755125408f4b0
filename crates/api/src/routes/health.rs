//! Liveness probe.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `"ok"`, or `"degraded"` when the store cannot be reached.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
}

impl HealthResponse {
    fn from_store(db_healthy: bool) -> Self {
        Self {
            status: if db_healthy { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            db_healthy,
        }
    }
}

/// GET /health
///
/// Always answers 200; a store outage shows up in the body only.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match marquee_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            false
        }
    };
    Json(HealthResponse::from_store(db_healthy))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
