// rate_limit_middleware.rs
use crate::common::net::client_ip;
use crate::recovery_middleware::PendingHeaders;
use crate::services::rate_limit::{RateLimitDecision, RateLimitService};
use axum::{
    extract::{Extension, Request},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Serialize)]
struct RateLimitErrorResponse {
    error: String,
    retry_after: u64,
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(decision.reset_at));
}

/// Rate limiting middleware
///
/// Counts every request against the client IP. Allowed and rejected responses
/// both carry the X-RateLimit-* headers.
pub async fn rate_limit_middleware(
    Extension(rate_limit_service): Extension<Arc<RateLimitService>>,
    request: Request,
    next: Next,
) -> Response {
    if !rate_limit_service.is_enabled() {
        return next.run(request).await;
    }

    let ip_address = client_ip(&request);
    let path = request.uri().path().to_string();

    let decision = rate_limit_service.check(&ip_address).await;

    if decision.allowed {
        debug!(
            client_ip = %ip_address,
            path = %path,
            remaining = decision.remaining,
            "Request allowed by rate limiter"
        );
        let mut staged = HeaderMap::new();
        insert_rate_limit_headers(&mut staged, &decision);
        PendingHeaders::stage(&request, &staged);

        let mut response = next.run(request).await;
        insert_rate_limit_headers(response.headers_mut(), &decision);
        return response;
    }

    let retry_after = decision.retry_after();
    warn!(
        client_ip = %ip_address,
        path = %path,
        retry_after = retry_after,
        "Request blocked by rate limiter"
    );

    let error_response = RateLimitErrorResponse {
        error: "Rate limit exceeded".to_string(),
        retry_after,
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(error_response)).into_response();
    insert_rate_limit_headers(response.headers_mut(), &decision);
    response
        .headers_mut()
        .insert("retry-after", HeaderValue::from(retry_after));
    response
}
