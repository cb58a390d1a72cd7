// src/cors_middleware.rs
//! Cross-origin policy: allow-list enforcement plus CORS response headers

use axum::{
    extract::{Extension, Request},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::common::{net::client_ip, AppConfig, ErrorResponse};

/// Build the CORS layer from configuration
///
/// In debug mode with the default origin list, any origin is mirrored back.
/// Credentials are allowed, so a literal `*` is never sent.
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let allow_origin = if config.cors_allows_any_origin() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .security
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([
            header::CONTENT_LENGTH,
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderName::from_static("x-ratelimit-reset"),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 60 * 60))
}

/// True when `origin` names the same host the request was sent to
fn is_same_origin(origin: &str, host: Option<&str>) -> bool {
    let authority = origin.split_once("://").map(|(_, rest)| rest).unwrap_or(origin);
    match host {
        Some(host) => authority.eq_ignore_ascii_case(host),
        None => false,
    }
}

fn origin_allowed(config: &AppConfig, origin: &str, host: Option<&str>) -> bool {
    config.cors_allows_any_origin()
        || config
            .security
            .allowed_origins
            .iter()
            .any(|allowed| allowed == origin)
        || is_same_origin(origin, host)
}

/// Rejects requests whose Origin is neither allow-listed nor same-origin
pub async fn reject_disallowed_origin(
    Extension(config): Extension<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Some(origin) = origin {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok());

        if !origin_allowed(&config, &origin, host) {
            warn!(
                origin = %origin,
                client_ip = %client_ip(&request),
                path = %request.uri().path(),
                "Rejected cross-origin request"
            );
            return (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::new("Origin not allowed")),
            )
                .into_response();
        }
    }

    next.run(request).await
}
