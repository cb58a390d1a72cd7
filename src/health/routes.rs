use super::handlers;
use axum::{routing::get, Router};

/// Health probes; public, outside the login gate
pub fn health_routes() -> Router {
    Router::new()
        .route("/health/live", get(handlers::liveness))
        .route("/health/ready", get(handlers::readiness))
        .route("/health", get(handlers::health))
        .route("/health/", get(handlers::health))
        .route("/health/metrics", get(handlers::metrics))
}
