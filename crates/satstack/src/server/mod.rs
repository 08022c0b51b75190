mod error;
mod transactions;

use std::sync::Arc;

use axum::http::header::InvalidHeaderValue;
use axum::http::HeaderValue;
use axum::routing::{any, get};
use axum::{Json, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};

use satstack_core::TransactionService;

// ==============================================================================
// Application State
// ==============================================================================

pub struct AppState {
    pub service: TransactionService,
    /// Cancelled on shutdown. Each request derives a child token from it.
    pub shutdown: CancellationToken,
}

type SharedState = Arc<AppState>;

// ==============================================================================
// Router
// ==============================================================================

pub fn build_router(state: AppState, origin: &str) -> Result<Router, InvalidHeaderValue> {
    // Only reflect the allowed origin when the request's Origin header
    // actually matches; otherwise omit the header entirely.
    let allowed: HeaderValue = origin.parse()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |request_origin: &HeaderValue, _| *request_origin == allowed,
        ))
        .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let shared = Arc::new(state);

    let api = Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/transactions/{txid}",
            get(transactions::get_transaction),
        )
        .route(
            "/api/v1/transactions/{txid}/hex",
            get(transactions::get_transaction_hex),
        );

    Ok(Router::new()
        .merge(api)
        .route("/api", any(api_not_found))
        .route("/api/{*path}", any(api_not_found))
        .layer(cors)
        .with_state(shared))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn api_not_found() -> error::AppError {
    error::AppError::NotFound("API route not found".to_string())
}
