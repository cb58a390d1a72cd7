// src/test_support.rs
//! Shared fixtures for router-level tests

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::auth::models::{LoggedInUser, ProviderProfile, TokenResponse};
use crate::common::{migrations::run_migrations, AppConfig, AppState};
use crate::services::{IdentityProvider, OAuthError};
use crate::session::{SessionData, SESSION_COOKIE_NAME};

pub const TEST_SECRET: &str = "router-tests-secret-0123456789abcdef";

/// Configuration with a fixed secret, debug off and plain-HTTP cookies
pub fn test_config_with(overrides: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = [
        ("SECRET", TEST_SECRET),
        ("DEBUG", "false"),
        ("SESSION_SECURE", "false"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

/// One-connection in-memory database with the schema applied
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool, false).await.unwrap();
    pool
}

/// Identity provider with scripted responses
pub struct FakeIdentityProvider {
    pub exchange_fails: bool,
    /// `None` makes the userinfo call fail
    pub profile: Option<ProviderProfile>,
    pub exchange_calls: AtomicUsize,
}

impl FakeIdentityProvider {
    pub fn returning(profile: ProviderProfile) -> Self {
        Self {
            exchange_fails: false,
            profile: Some(profile),
            exchange_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_exchange() -> Self {
        Self {
            exchange_fails: true,
            profile: None,
            exchange_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_userinfo() -> Self {
        Self {
            exchange_fails: false,
            profile: None,
            exchange_calls: AtomicUsize::new(0),
        }
    }
}

pub fn ann_profile() -> ProviderProfile {
    ProviderProfile {
        id: Some("108".to_string()),
        name: Some("Ann".to_string()),
        email: Some("ann@example.com".to_string()),
        phone: None,
        picture: Some("https://example.com/ann.png".to_string()),
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn authorization_url(&self, state: &str) -> String {
        format!(
            "https://idp.test/auth?access_type=offline&state={}",
            state
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if self.exchange_fails {
            return Err(OAuthError::ExchangeFailed("invalid_grant".to_string()));
        }
        Ok(TokenResponse {
            access_token: format!("token-for-{}", code),
            refresh_token: None,
            expires_in: Some(3600),
            token_type: Some("Bearer".to_string()),
            scope: None,
        })
    }

    async fn fetch_user_info(&self, _access_token: &str) -> Result<ProviderProfile, OAuthError> {
        self.profile.clone().ok_or(OAuthError::UserInfoStatus(500))
    }
}

pub async fn state_with_provider(
    overrides: &[(&str, &str)],
    provider: Arc<dyn IdentityProvider>,
) -> AppState {
    AppState::new(
        memory_pool().await,
        Arc::new(test_config_with(overrides)),
        provider,
    )
}

pub async fn test_state_with(overrides: &[(&str, &str)]) -> AppState {
    state_with_provider(overrides, Arc::new(FakeIdentityProvider::returning(ann_profile()))).await
}

pub async fn test_state() -> AppState {
    test_state_with(&[]).await
}

/// `Cookie` header value for a session with `id`/`email` signed in
pub fn login_cookie(state: &AppState, id: &str, email: &str) -> String {
    let mut data = SessionData {
        logged_in_user: Some(LoggedInUser {
            id: id.to_string(),
            name: "Test User".to_string(),
            email: email.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    };
    let value = state.session_codec.encode(&mut data).unwrap();
    format!("{}={}", SESSION_COOKIE_NAME, value)
}

/// First `name=value` pair of the response's session Set-Cookie header
pub fn session_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(SESSION_COOKIE_NAME))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
