/*
 * Responsibility
 * - GET /health (liveness, outside the negotiate middleware)
 * - Reports the advertised negotiation protocols for operators
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let protocols = state
        .filter
        .provider()
        .map(|p| p.protocols().to_vec())
        .unwrap_or_default();

    (
        StatusCode::OK,
        Json(json!({"status": "ok", "protocols": protocols})),
    )
}
