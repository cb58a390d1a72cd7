// src/security_headers_middleware.rs
//! Hardening headers applied to every response

use axum::{
    extract::{Extension, Request},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::common::AppConfig;
use crate::recovery_middleware::PendingHeaders;

const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// True when the request arrived over TLS, directly or via a terminating proxy
fn is_secure_transport(request: &Request) -> bool {
    if request.uri().scheme_str() == Some("https") {
        return true;
    }
    request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|proto| proto.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

fn apply_headers(headers: &mut HeaderMap, csp: &HeaderValue, secure: bool) {
    headers.insert(header::CONTENT_SECURITY_POLICY, csp.clone());
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    if secure {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        );
    }

    // Don't advertise the server stack
    headers.remove(header::SERVER);
    headers.remove(HeaderName::from_static("x-powered-by"));
}

/// Security headers middleware
pub async fn security_headers(
    Extension(config): Extension<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let secure = is_secure_transport(&request);
    let csp = HeaderValue::from_str(&config.security.csp_policy).unwrap_or_else(|_| {
        warn!("CSP_POLICY is not a valid header value, using default-src 'self'");
        HeaderValue::from_static("default-src 'self'")
    });

    let mut staged = HeaderMap::new();
    apply_headers(&mut staged, &csp, secure);
    PendingHeaders::stage(&request, &staged);

    let mut response = next.run(request).await;
    apply_headers(response.headers_mut(), &csp, secure);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body, http::Request as HttpRequest, middleware, response::IntoResponse,
        routing::get, Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        let config = Arc::new(AppConfig::from_lookup(|_| None).unwrap());
        Router::new()
            .route(
                "/",
                get(|| async { ([("x-powered-by", "framework"), ("server", "framework")], "ok").into_response() }),
            )
            .layer(middleware::from_fn(security_headers))
            .layer(Extension(config))
    }

    #[tokio::test]
    async fn test_headers_over_plain_http() {
        let response = app()
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let headers = response.headers();

        assert!(headers
            .get(header::CONTENT_SECURITY_POLICY)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("default-src 'self'"));
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(headers.get(header::X_XSS_PROTECTION).unwrap(), "1; mode=block");
        assert_eq!(
            headers.get(header::REFERRER_POLICY).unwrap(),
            "strict-origin-when-cross-origin"
        );
        assert!(headers.get(header::STRICT_TRANSPORT_SECURITY).is_none());
        assert!(headers.get("x-powered-by").is_none());
        assert!(headers.get(header::SERVER).is_none());
    }

    #[tokio::test]
    async fn test_hsts_behind_tls_proxy() {
        let response = app()
            .oneshot(
                HttpRequest::get("/")
                    .header("x-forwarded-proto", "https")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::STRICT_TRANSPORT_SECURITY).unwrap(),
            HSTS_VALUE
        );
    }
}
