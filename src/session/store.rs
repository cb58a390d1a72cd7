// src/session/store.rs
//! Request-scoped session handle with typed accessors
//!
//! Every mutating accessor saves immediately: the data is re-encoded and the
//! resulting cookie is queued for the response. A failed save changes
//! nothing: neither the data nor the previously queued cookie.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

use super::codec::{SessionCodec, SessionData};
use super::SessionError;
use crate::auth::models::LoggedInUser;
use crate::common::ApiError;

/// Kinds of one-shot flash messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Error,
    Success,
    Warning,
    Info,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Error => "error",
            FlashKind::Success => "success",
            FlashKind::Warning => "warning",
            FlashKind::Info => "info",
        }
    }
}

/// All pending flash messages, drained in one read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlashMessages {
    pub error: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
    pub info: Option<String>,
}

impl FlashMessages {
    pub fn is_empty(&self) -> bool {
        self.error.is_none()
            && self.success.is_none()
            && self.warning.is_none()
            && self.info.is_none()
    }

    /// Non-empty messages paired with their kind, in display order
    pub fn iter(&self) -> impl Iterator<Item = (FlashKind, &str)> {
        [
            (FlashKind::Error, &self.error),
            (FlashKind::Success, &self.success),
            (FlashKind::Warning, &self.warning),
            (FlashKind::Info, &self.info),
        ]
        .into_iter()
        .filter_map(|(kind, msg)| msg.as_deref().map(|m| (kind, m)))
    }
}

struct SessionInner {
    data: SessionData,
    pending_cookie: Option<String>,
}

/// Session bound to one request
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
    codec: Arc<SessionCodec>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

impl Session {
    pub fn new(data: SessionData, codec: Arc<SessionCodec>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                data,
                pending_cookie: None,
            })),
            codec,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply `mutate` and save the result, or keep the old data if the save fails
    fn update<F>(&self, mutate: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut SessionData),
    {
        let mut inner = self.lock();
        let mut next = inner.data.clone();
        mutate(&mut next);
        let encoded = self.codec.encode(&mut next)?;
        inner.data = next;
        inner.pending_cookie = Some(encoded);
        Ok(())
    }

    /// Encoded cookie value queued by the last successful save
    pub fn take_pending_cookie(&self) -> Option<String> {
        self.lock().pending_cookie.take()
    }

    // ========================================================================
    // Logged-in user
    // ========================================================================

    pub fn set_logged_in_user(&self, user: &LoggedInUser) -> Result<(), SessionError> {
        let user = user.clone();
        self.update(move |data| data.logged_in_user = Some(user))
    }

    /// The stored user, if it has a non-empty id
    pub fn logged_in_user(&self) -> Option<LoggedInUser> {
        self.lock()
            .data
            .logged_in_user
            .clone()
            .filter(|user| !user.id.is_empty())
    }

    pub fn delete_logged_in_user(&self) -> Result<(), SessionError> {
        self.update(|data| data.logged_in_user = None)
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in_user().is_some()
    }

    // ========================================================================
    // OAuth state token
    // ========================================================================

    pub fn set_state_token(&self, token: &str) -> Result<(), SessionError> {
        let token = token.to_string();
        self.update(move |data| data.state_token = Some(token))
    }

    /// Stored state token, or an empty string when none is set
    pub fn state_token(&self) -> String {
        self.lock().data.state_token.clone().unwrap_or_default()
    }

    pub fn delete_state_token(&self) -> Result<(), SessionError> {
        self.update(|data| data.state_token = None)
    }

    // ========================================================================
    // Flash messages
    // ========================================================================

    pub fn set_flash(&self, kind: FlashKind, message: &str) -> Result<(), SessionError> {
        let message = message.to_string();
        self.update(move |data| {
            data.flashes.insert(kind.as_str().to_string(), message);
        })
    }

    /// Read and clear one flash message
    pub fn take_flash(&self, kind: FlashKind) -> Option<String> {
        let mut taken = None;
        let result = self.update(|data| taken = data.flashes.remove(kind.as_str()));
        if let Err(e) = result {
            warn!(error = %e, kind = kind.as_str(), "Failed to save session after reading flash");
        }
        taken
    }

    /// Read and clear every flash message in a single save
    pub fn take_all_flashes(&self) -> FlashMessages {
        if self.lock().data.flashes.is_empty() {
            return FlashMessages::default();
        }

        let mut flashes = FlashMessages::default();
        let result = self.update(|data| {
            flashes.error = data.flashes.remove(FlashKind::Error.as_str());
            flashes.success = data.flashes.remove(FlashKind::Success.as_str());
            flashes.warning = data.flashes.remove(FlashKind::Warning.as_str());
            flashes.info = data.flashes.remove(FlashKind::Info.as_str());
        });
        if let Err(e) = result {
            warn!(error = %e, "Failed to save session after reading flashes");
        }
        flashes
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| ApiError::InternalServer("session layer missing".to_string()))
    }
}
