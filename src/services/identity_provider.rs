// src/services/identity_provider.rs
//! External identity provider seam used by the OAuth login flow

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::models::{ProviderProfile, TokenResponse};

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("OAuth provider not configured")]
    NotConfigured,

    #[error("Token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Userinfo request returned HTTP {0}")]
    UserInfoStatus(u16),

    #[error("Invalid profile payload: {0}")]
    InvalidProfile(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// An OAuth2 authorization-code provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Path segment used in `/auth/:provider/login`
    fn name(&self) -> &str;

    /// URL the browser is sent to, carrying `state` and requesting offline access
    fn authorization_url(&self, state: &str) -> String;

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError>;

    async fn fetch_user_info(&self, access_token: &str) -> Result<ProviderProfile, OAuthError>;
}
