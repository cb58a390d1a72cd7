// src/services/google.rs
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use super::identity_provider::{IdentityProvider, OAuthError};
use crate::auth::models::{ProviderProfile, TokenResponse};
use crate::common::config::OAuthConfig;

const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Google OAuth2 endpoints
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
        }
    }
}

pub struct GoogleService {
    client: Client,
    config: OAuthConfig,
    endpoints: GoogleEndpoints,
}

impl GoogleService {
    pub fn new(client: Client, config: OAuthConfig) -> Self {
        Self::with_endpoints(client, config, GoogleEndpoints::default())
    }

    pub fn with_endpoints(client: Client, config: OAuthConfig, endpoints: GoogleEndpoints) -> Self {
        info!(
            configured = config.is_configured(),
            redirect_url = %config.redirect_url,
            "GoogleService initialized"
        );
        Self {
            client,
            config,
            endpoints,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleService {
    fn name(&self) -> &str {
        "google"
    }

    fn authorization_url(&self, state: &str) -> String {
        let scope_param = SCOPES.join(" ");

        format!(
            "{}?access_type=offline&client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.endpoints.auth_url,
            urlencoding::encode(&self.config.google_client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode(&scope_param),
            urlencoding::encode(state)
        )
    }

    /// Exchange authorization code for tokens
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        if !self.config.is_configured() {
            return Err(OAuthError::NotConfigured);
        }

        let params = [
            ("code", code),
            ("client_id", self.config.google_client_id.as_str()),
            ("client_secret", self.config.google_client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code for tokens");

        let response = self
            .client
            .post(&self.endpoints.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Token exchange failed");
            return Err(OAuthError::ExchangeFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::ExchangeFailed(e.to_string()))
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<ProviderProfile, OAuthError> {
        let response = self
            .client
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::UserInfoStatus(response.status().as_u16()));
        }

        response
            .json::<ProviderProfile>()
            .await
            .map_err(|e| OAuthError::InvalidProfile(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, post},
        Form, Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    async fn stub_token(Form(params): Form<HashMap<String, String>>) -> Response {
        match params.get("code").map(String::as_str) {
            Some("good-code") => Json(json!({
                "access_token": "good-token",
                "token_type": "Bearer",
                "expires_in": 3600
            }))
            .into_response(),
            Some("garbled-code") => "not json".into_response(),
            _ => (StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#).into_response(),
        }
    }

    async fn stub_userinfo(headers: HeaderMap) -> Response {
        match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some("Bearer good-token") => Json(json!({
                "id": "g-1",
                "name": "Ann",
                "email": "ann@example.com",
                "picture": "http://pic"
            }))
            .into_response(),
            Some("Bearer garbage-token") => "<html>oops</html>".into_response(),
            _ => StatusCode::UNAUTHORIZED.into_response(),
        }
    }

    /// Serve a token and userinfo endpoint on an ephemeral local port
    async fn stub_endpoints() -> GoogleEndpoints {
        let app = Router::new()
            .route("/token", post(stub_token))
            .route("/userinfo", get(stub_userinfo));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        GoogleEndpoints {
            auth_url: format!("http://{}/auth", addr),
            token_url: format!("http://{}/token", addr),
            userinfo_url: format!("http://{}/userinfo", addr),
        }
    }

    async fn stubbed_service() -> GoogleService {
        let client = Client::builder().no_proxy().build().unwrap();
        GoogleService::with_endpoints(client, test_config(), stub_endpoints().await)
    }

    fn test_config() -> OAuthConfig {
        OAuthConfig {
            google_client_id: "test_client_id".to_string(),
            google_client_secret: "test_secret".to_string(),
            redirect_url: "http://localhost:8080/auth/callback".to_string(),
        }
    }

    #[test]
    fn test_get_authorization_url() {
        let google_service = GoogleService::new(Client::new(), test_config());
        let auth_url = google_service.authorization_url("abc123");

        assert!(auth_url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(auth_url.contains("client_id=test_client_id"));
        assert!(auth_url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fcallback"));
        assert!(auth_url.contains("access_type=offline"));
        assert!(auth_url.contains("response_type=code"));
        assert!(auth_url.contains("state=abc123"));
        assert!(auth_url.contains("userinfo.email"));
    }

    #[tokio::test]
    async fn test_exchange_requires_configuration() {
        let mut config = test_config();
        config.google_client_secret.clear();
        let google_service = GoogleService::new(Client::new(), config);

        let result = google_service.exchange_code("code").await;
        assert!(matches!(result, Err(OAuthError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_exchange_code_against_token_endpoint() {
        let google_service = stubbed_service().await;

        let token = google_service.exchange_code("good-code").await.unwrap();
        assert_eq!(token.access_token, "good-token");
        assert_eq!(token.expires_in, Some(3600));

        let result = google_service.exchange_code("revoked-code").await;
        match result {
            Err(OAuthError::ExchangeFailed(message)) => {
                assert!(message.contains("400"));
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("expected ExchangeFailed, got {:?}", other),
        }

        let result = google_service.exchange_code("garbled-code").await;
        assert!(matches!(result, Err(OAuthError::ExchangeFailed(_))));
    }

    #[tokio::test]
    async fn test_fetch_user_info_against_userinfo_endpoint() {
        let google_service = stubbed_service().await;

        let profile = google_service.fetch_user_info("good-token").await.unwrap();
        let user = profile.into_logged_in_user().unwrap();
        assert_eq!(user.id, "g-1");
        assert_eq!(user.email, "ann@example.com");

        let result = google_service.fetch_user_info("expired-token").await;
        assert!(matches!(result, Err(OAuthError::UserInfoStatus(401))));

        let result = google_service.fetch_user_info("garbage-token").await;
        assert!(matches!(result, Err(OAuthError::InvalidProfile(_))));
    }

    #[tokio::test]
    async fn test_authorization_url_uses_configured_endpoint() {
        let google_service = stubbed_service().await;
        let auth_url = google_service.authorization_url("xyz");

        assert!(auth_url.starts_with("http://127.0.0.1:"));
        assert!(auth_url.contains("/auth?access_type=offline"));
        assert!(auth_url.contains("state=xyz"));
    }
}
