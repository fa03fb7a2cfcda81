//! Axum router configuration.
//!
//! Two routes: `/health` answers any method, `/webhook` accepts POST only.
//! Everything else, including other methods on `/webhook`, is a 404.

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{any, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the router with tracing and the request body cap.
pub fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/health", any(handlers::health::health))
        .route(
            "/webhook",
            post(handlers::webhook::receive_webhook).fallback(not_found),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}
