//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::error;

use super::models::LoggedInUser;
use crate::common::ApiError;

/// Authenticated user extractor
///
/// Only valid on routes behind [`require_login`](super::gate::require_login),
/// which places the session user into the request extensions.
#[derive(Debug, Clone)]
pub struct AuthedUser(pub LoggedInUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<LoggedInUser>() {
            Some(user) => Ok(AuthedUser(user.clone())),
            None => {
                error!(path = %parts.uri.path(), "AuthedUser used on a route without the login gate");
                Err(ApiError::InternalServer(
                    "missing authenticated user".to_string(),
                ))
            }
        }
    }
}
