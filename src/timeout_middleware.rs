// src/timeout_middleware.rs
//! Bounds total downstream execution time

use axum::{
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::common::{net::client_ip, AppConfig, ErrorResponse};

/// Request timeout middleware
///
/// The rest of the pipeline runs as its own task and races a timer of
/// `READ_TIMEOUT`. The losing side is discarded: on timeout the task is
/// aborted and the request's [`CancellationToken`] is cancelled, so whatever
/// the handler produces later is never written. Handlers that do work outside
/// their own future (spawned tasks) should watch the token from the request
/// extensions.
pub async fn request_timeout(
    Extension(config): Extension<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    let timeout = config.server.read_timeout;
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let ip = client_ip(&request);

    let token = CancellationToken::new();
    request.extensions_mut().insert(token.clone());

    let mut handle = tokio::spawn(next.run(request));

    tokio::select! {
        joined = &mut handle => match joined {
            Ok(response) => response,
            // Let the recovery stage see the panic
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                error!(error = %e, path = %path, "Request task ended unexpectedly");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Internal server error")),
                )
                    .into_response()
            }
        },
        _ = tokio::time::sleep(timeout) => {
            token.cancel();
            handle.abort();
            warn!(
                method = %method,
                path = %path,
                client_ip = %ip,
                timeout_ms = timeout.as_millis() as u64,
                "Request timed out"
            );
            (
                StatusCode::REQUEST_TIMEOUT,
                Json(ErrorResponse::new("Request timeout")),
            )
                .into_response()
        }
    }
}
