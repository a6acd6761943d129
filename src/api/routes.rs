use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the page host router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Page signals
        .route("/data-layer/:topic", post(handlers::publish_signal))
        .route("/viewport/intersections", post(handlers::report_intersections))
        // Recommendations block
        .route("/context", get(handlers::get_context))
        .route("/panel", get(handlers::get_panel))
        .route("/panel/actions", post(handlers::invoke_action))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
