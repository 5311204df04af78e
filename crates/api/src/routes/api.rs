use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use engine::{CycleReport, SymbolOutcome, SymbolReport};

use crate::{auth::require_auth, AppState};

/// Bars returned by the symbol detail route when `tail` is not given.
const DEFAULT_TAIL: usize = 10;

pub fn api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/symbols", get(get_symbols))
        .route("/api/symbols/:symbol", get(get_symbol))
        .route("/api/signals", get(get_signals))
        .route("/api/config", get(get_config))
        .route("/api/refresh", post(post_refresh))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

fn no_data() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": "no completed cycle yet"})),
    )
        .into_response()
}

fn latest_or_unavailable(state: &AppState) -> Result<Arc<CycleReport>, Response> {
    state.poller.latest().ok_or_else(no_data)
}

// ─── Symbols ──────────────────────────────────────────────────────────────────

fn symbol_overview(report: &SymbolReport) -> Value {
    match &report.outcome {
        SymbolOutcome::FetchFailed { attempts, error } => json!({
            "symbol": report.symbol,
            "status": "fetch_failed",
            "attempts": attempts,
            "error": error,
        }),
        SymbolOutcome::Analyzed {
            analysis,
            signal,
            delivery,
        } => json!({
            "symbol": report.symbol,
            "status": "analyzed",
            "bars": analysis.len(),
            "latest": analysis.latest(),
            "signal": signal,
            "delivery": delivery,
        }),
    }
}

async fn get_symbols(State(state): State<AppState>) -> Response {
    let report = match latest_or_unavailable(&state) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let symbols: Vec<Value> = report.symbols.iter().map(symbol_overview).collect();
    Json(json!({
        "cycle": report.cycle,
        "timeframe": report.timeframe,
        "updated_at": report.finished_at,
        "symbols": symbols,
    }))
    .into_response()
}

#[derive(Deserialize)]
struct TailQuery {
    tail: Option<usize>,
}

async fn get_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(q): Query<TailQuery>,
) -> Response {
    let report = match latest_or_unavailable(&state) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let Some(entry) = report.symbol(&symbol) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("unknown symbol '{symbol}'")})),
        )
            .into_response();
    };

    let mut body = symbol_overview(entry);
    if let (Some(analysis), Value::Object(map)) = (entry.analysis(), &mut body) {
        let rows = analysis.tail(q.tail.unwrap_or(DEFAULT_TAIL));
        map.insert("rows".into(), json!(rows));
    }
    Json(body).into_response()
}

// ─── Signals ──────────────────────────────────────────────────────────────────

async fn get_signals(State(state): State<AppState>) -> Response {
    let report = match latest_or_unavailable(&state) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let signals: Vec<Value> = report
        .symbols
        .iter()
        .filter_map(|s| {
            s.signal()
                .map(|signal| json!({"signal": signal, "delivery": s.delivery()}))
        })
        .collect();
    Json(json!({
        "cycle": report.cycle,
        "signals": signals,
    }))
    .into_response()
}

// ─── Config ───────────────────────────────────────────────────────────────────

async fn get_config(State(state): State<AppState>) -> Json<Value> {
    Json(json!(*state.settings))
}

// ─── Refresh ──────────────────────────────────────────────────────────────────

async fn post_refresh(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    info!("Refresh requested from dashboard");
    state.poller.refresh();
    (StatusCode::ACCEPTED, Json(json!({"status": "refresh requested"})))
}
