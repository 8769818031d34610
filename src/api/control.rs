//! Test orchestration endpoints.

use axum::{body::Bytes, extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::simulation::FaultPatch;
use crate::state::AppState;

pub async fn heartbeat() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn reset(State(state): State<AppState>) -> Json<Value> {
    state.reset().await;
    Json(json!({ "status": "ok" }))
}

/// Merge `{errors, latency, silent}` into the live fault table.
pub async fn configure(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    let patch: FaultPatch = serde_json::from_slice(&body).unwrap_or_else(|e| {
        debug!("Ignoring malformed /config body: {}", e);
        FaultPatch::default()
    });
    info!("Updating fault configuration");
    state.merge_faults(patch).await;
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn error_messages(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "errors": state.error_log().entries() }))
}
