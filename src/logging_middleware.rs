// src/logging_middleware.rs
//! Access log: one line per request with client, method, status and latency

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

use crate::common::net::client_ip;

/// Middleware to log every request once its response is ready
pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let ip = client_ip(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    let status = response.status();

    if status.is_server_error() {
        warn!(
            client_ip = %ip,
            method = %method,
            status = status.as_u16(),
            latency_ms = latency_ms,
            path = %path,
            "Request failed"
        );
    } else {
        info!(
            client_ip = %ip,
            method = %method,
            status = status.as_u16(),
            latency_ms = latency_ms,
            path = %path,
            "Request completed"
        );
    }

    response
}
