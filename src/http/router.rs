//! Axum router construction.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::request_id::request_id_middleware;
use crate::http::state::AppState;

/// Build the complete Axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/clip", post(handlers::clip))
        .route("/clips/{run_id}", get(handlers::get_clip))
        .route("/analyze", post(handlers::analyze))
        .route("/download", post(handlers::download))
        .route("/transcript", post(handlers::transcript))
        .layer(TraceLayer::new_for_http())
        // outermost, so the trace span nests inside the request span
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
