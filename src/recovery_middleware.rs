// src/recovery_middleware.rs
//! Converts a panic anywhere downstream into a generic 500

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tracing::error;

use crate::common::{net::client_ip, ErrorResponse};

/// Headers that later stages commit to before running the rest of the chain
///
/// A panic unwinds past the code that would have put them on the response,
/// so the recovered 500 copies them from here instead.
#[derive(Debug, Clone, Default)]
pub struct PendingHeaders(Arc<Mutex<HeaderMap>>);

impl PendingHeaders {
    /// Record `headers` on the request's slot, if recovery installed one
    pub fn stage(request: &Request, headers: &HeaderMap) {
        if let Some(pending) = request.extensions().get::<PendingHeaders>() {
            let mut staged = pending.0.lock().unwrap_or_else(|e| e.into_inner());
            for (name, value) in headers {
                staged.insert(name.clone(), value.clone());
            }
        }
    }

    fn apply_to(&self, headers: &mut HeaderMap) {
        let staged = self.0.lock().unwrap_or_else(|e| e.into_inner());
        for (name, value) in staged.iter() {
            headers.insert(name.clone(), value.clone());
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Panic recovery middleware
///
/// The panic message is logged with the request's method, path and client IP.
/// The client only ever sees `{"error": "Internal server error"}`, plus any
/// headers staged through [`PendingHeaders`].
pub async fn recover_panics(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let ip = client_ip(&request);
    let pending = PendingHeaders::default();
    request.extensions_mut().insert(pending.clone());

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            error!(
                method = %method,
                path = %path,
                client_ip = %ip,
                panic = %panic_message(payload.as_ref()),
                "Recovered from panic"
            );
            let mut response = (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error")),
            )
                .into_response();
            pending.apply_to(response.headers_mut());
            response
        }
    }
}
