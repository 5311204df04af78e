use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Liveness check, no auth required. Reports the last completed cycle.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let latest = state.poller.latest();
    Json(json!({
        "status": "ok",
        "cycle": latest.as_ref().map(|r| r.cycle),
        "last_update": latest.as_ref().map(|r| r.finished_at),
        "failed_symbols": latest.as_ref().map(|r| r.failed_symbols()),
    }))
}
