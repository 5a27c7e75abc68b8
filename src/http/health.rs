use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::http::server::AppState;
use crate::observability::metrics;

/// `GET /health`: 200 while the RPC endpoint answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let accounts = state.service.resolver().len();
    match state.chain.block_number().await {
        Ok(block_number) => {
            metrics::record_rpc_health(state.chain.endpoint(), true);
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "block_number": block_number,
                    "accounts": accounts,
                })),
            )
        }
        Err(e) => {
            metrics::record_rpc_health(state.chain.endpoint(), false);
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "error": e.to_string(),
                    "accounts": accounts,
                })),
            )
        }
    }
}
