// src/app.rs
//! Router assembly: routes plus the fixed middleware pipeline

use axum::{extract::Extension, middleware, Router};

use crate::accounts::accounts_routes;
use crate::auth::{auth_routes, require_login};
use crate::common::{net::TrustProxyHeaders, AppState};
use crate::cors_middleware::{cors_layer, reject_disallowed_origin};
use crate::health::health_routes;
use crate::logging_middleware::log_request;
use crate::rate_limit_middleware::rate_limit_middleware;
use crate::recovery_middleware::recover_panics;
use crate::security_headers_middleware::security_headers;
use crate::session::session_middleware;
use crate::timeout_middleware::request_timeout;
use crate::users::users_routes;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(users_routes())
        .merge(accounts_routes())
        .route_layer(middleware::from_fn(require_login));

    let routes = Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(protected);

    with_pipeline(routes, state)
}

/// Wrap `routes` in the middleware pipeline and the shared extensions
///
/// Layers are listed innermost first; a request passes through them as:
/// recovery, logging, security headers, CORS, rate limit, timeout, session,
/// then the login gate on protected routes.
fn with_pipeline(routes: Router, state: AppState) -> Router {
    let config = state.config.clone();
    let rate_limit_service = state.rate_limit_service.clone();
    let session_codec = state.session_codec.clone();
    let cors = cors_layer(&config);
    let trust_proxy_headers = config.security.trust_proxy_headers;

    let app = routes
        .layer(middleware::from_fn(session_middleware))
        .layer(middleware::from_fn(request_timeout))
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(cors)
        .layer(middleware::from_fn(reject_disallowed_origin))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(log_request))
        .layer(middleware::from_fn(recover_panics))
        .layer(Extension(session_codec))
        .layer(Extension(rate_limit_service))
        .layer(Extension(config))
        .layer(Extension(state.into_shared()));

    if trust_proxy_headers {
        app.layer(Extension(TrustProxyHeaders))
    } else {
        app
    }
}
