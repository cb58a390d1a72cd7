// src/session/middleware.rs
//! Binds a [`Session`] to each request and writes the cookie back

use axum::{
    extract::{Extension, Request},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{debug, error};

use super::codec::{SessionCodec, SessionData, SESSION_COOKIE_NAME};
use super::store::Session;

/// Session attachment middleware
///
/// Missing, tampered or expired cookies yield an empty session. If a handler
/// saved the session, the new cookie is appended to the response.
pub async fn session_middleware(
    Extension(codec): Extension<Arc<SessionCodec>>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let data = match jar.get(SESSION_COOKIE_NAME) {
        Some(cookie) => codec.decode(cookie.value()).unwrap_or_else(|e| {
            debug!(error = %e, "Discarding unreadable session cookie");
            SessionData::default()
        }),
        None => SessionData::default(),
    };

    let session = Session::new(data, codec.clone());
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if let Some(value) = session.take_pending_cookie() {
        let cookie = codec.cookie(value);
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(header) => {
                response.headers_mut().append(SET_COOKIE, header);
            }
            Err(e) => error!(error = %e, "Session cookie is not a valid header value"),
        }
    }

    response
}
