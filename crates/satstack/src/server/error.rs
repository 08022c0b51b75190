use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use satstack_core::CoreError;

// ==============================================================================
// Error Type
// ==============================================================================

#[derive(Debug)]
pub(crate) enum AppError {
    BadRequest(String),
    NotFound(String),
    BadGateway(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %message, "request failed");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Map a failed lookup of `txid` to the status the client should see.
/// Malformed node data is reported as 502, like transport failures.
pub(super) fn map_core_error(txid: bitcoin::Txid, err: CoreError) -> AppError {
    match err {
        CoreError::TxNotFound(_) => AppError::NotFound(format!("transaction not found: {txid}")),
        CoreError::InvalidTxData(message) => {
            AppError::BadGateway(format!("invalid transaction data from node: {message}"))
        }
        CoreError::MalformedAmount(message) => {
            AppError::BadGateway(format!("malformed amount from node: {message}"))
        }
        CoreError::Rpc(rpc) => AppError::BadGateway(format!("bitcoin rpc error: {rpc}")),
        CoreError::Cancelled => AppError::ServiceUnavailable("server is shutting down".to_owned()),
        other => AppError::Internal(format!("look up transaction {txid}: {other}")),
    }
}
