use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{audit, handlers, middleware::metrics_middleware, slates};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config, metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Slates
        .route("/slates", post(slates::create_slate))
        .route("/slates", get(slates::list_slates))
        .route("/slates/{id}", get(slates::get_slate))
        .route("/slates/{id}/status", get(slates::get_slate_status))
        .route("/worker/status", get(slates::get_worker_status))
        // Audit
        .route("/audit", get(audit::query_audit))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
