use alloy::primitives::TxHash;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::Instrument;

use crate::bidding::{BidError, BidRequest, RejectionKind};
use crate::http::server::AppState;

/// JSON error body shared by every failure response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<RejectionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
}

impl IntoResponse for BidError {
    fn into_response(self) -> Response {
        let (status, rejection, tx_hash) = match &self {
            BidError::UnknownIdentifier(_) => (StatusCode::NOT_FOUND, None, None),
            BidError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, None, None),
            BidError::SubmissionRejected { kind, tx_hash, .. } => {
                (StatusCode::BAD_GATEWAY, Some(*kind), *tx_hash)
            }
            BidError::ConfirmationTimeout { tx_hash, .. } => {
                (StatusCode::GATEWAY_TIMEOUT, None, Some(*tx_hash))
            }
        };

        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
            rejection,
            tx_hash,
        };
        (status, Json(body)).into_response()
    }
}

/// `POST /bid`
pub async fn place_bid(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<BidRequest>, JsonRejection>,
) -> Response {
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            tracing::debug!(request_id = %request_id, error = %rejection, "Malformed bid request");
            let body = ErrorBody {
                error: "invalid_request",
                message: rejection.body_text(),
                rejection: None,
                tx_hash: None,
            };
            return (rejection.status(), Json(body)).into_response();
        }
    };

    let span = tracing::info_span!("http", request_id = %request_id);
    match state.service.place_bid(&request).instrument(span).await {
        Ok(tx) => (StatusCode::OK, Json(tx)).into_response(),
        Err(e) => e.into_response(),
    }
}
