mod auth;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::{DuplicatePolicy, Result, Timeframe};
use engine::PollerHandle;
use strategy::StrategyParams;

/// Settings shown on the dashboard. Fixed for the life of the process.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeSettings {
    pub symbols: Vec<String>,
    pub timeframe: Timeframe,
    pub poll_interval_secs: u64,
    pub strategy: String,
    pub params: StrategyParams,
    pub duplicate_policy: DuplicatePolicy,
    pub alerts_enabled: bool,
}

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub poller: PollerHandle,
    pub dashboard_token: String,
    pub settings: Arc<RuntimeSettings>,
}

/// Assemble the full router. Split from `serve` so tests can drive it directly.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .merge(routes::api_router(state.clone()))
        .merge(routes::health_router())
        .with_state(state)
        .layer(cors)
}

/// Build and run the Axum API server.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Dashboard API listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
