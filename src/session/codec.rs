// src/session/codec.rs
//! Encrypted cookie encoding for session data
//!
//! The cookie value is sealed with the `cookie` crate's private jar
//! (AES-256-GCM, cookie name as associated data). The jar key is expanded from
//! SHA-256 of the configured secret. The JSON payload carries its own
//! `issued_at` so stale cookies are rejected even if a client ignores the
//! cookie's Max-Age.

use chrono::Utc;
use cookie::{Cookie, CookieJar, Key};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::SessionError;
use crate::auth::models::LoggedInUser;
use crate::common::config::SessionConfig;

pub const SESSION_COOKIE_NAME: &str = "session";

/// Browsers drop cookies above this size
pub const MAX_COOKIE_SIZE: usize = 4096;

/// Everything persisted in the session cookie
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SessionData {
    /// Unix seconds of the last save
    #[serde(default)]
    pub issued_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_in_user: Option<LoggedInUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_token: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flashes: BTreeMap<String, String>,
}

pub struct SessionCodec {
    key: Key,
    config: SessionConfig,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("key", &"<redacted>")
            .field("config", &self.config)
            .finish()
    }
}

impl SessionCodec {
    pub fn new(config: SessionConfig) -> Self {
        let digest = Sha256::digest(config.secret.as_bytes());
        Self {
            key: Key::derive_from(digest.as_slice()),
            config,
        }
    }

    /// Stamp `data` with the current time and encode it as a cookie value
    pub fn encode(&self, data: &mut SessionData) -> Result<String, SessionError> {
        data.issued_at = Utc::now().timestamp();
        let encoded = self.seal(data)?;

        if encoded.len() > MAX_COOKIE_SIZE {
            return Err(SessionError::CookieTooLarge(encoded.len()));
        }
        Ok(encoded)
    }

    fn seal(&self, data: &SessionData) -> Result<String, SessionError> {
        let payload = serde_json::to_string(data)?;

        let mut jar = CookieJar::new();
        jar.private_mut(&self.key)
            .add(Cookie::new(SESSION_COOKIE_NAME, payload));

        jar.get(SESSION_COOKIE_NAME)
            .map(|sealed| sealed.value().to_string())
            .ok_or(SessionError::Seal)
    }

    /// Decrypt and authenticate a cookie value
    pub fn decode(&self, value: &str) -> Result<SessionData, SessionError> {
        let opened = CookieJar::new()
            .private(&self.key)
            .decrypt(Cookie::new(SESSION_COOKIE_NAME, value.to_string()))
            .ok_or(SessionError::Decrypt)?;

        let data: SessionData = serde_json::from_str(opened.value())?;

        let age = Utc::now().timestamp() - data.issued_at;
        if age > self.config.max_age {
            return Err(SessionError::Expired);
        }

        Ok(data)
    }

    /// Build the Set-Cookie value carrying an encoded session
    pub fn cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, value))
            .path("/")
            .max_age(time::Duration::seconds(self.config.max_age))
            .http_only(self.config.http_only)
            .secure(self.config.secure)
            .same_site(self.config.same_site)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::SameSite;

    fn test_config(max_age: i64) -> SessionConfig {
        SessionConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
            max_age,
            http_only: true,
            secure: false,
            same_site: SameSite::Lax,
        }
    }

    fn sample_user() -> LoggedInUser {
        LoggedInUser {
            id: "u1".to_string(),
            name: "Ann".to_string(),
            email: "a@b.com".to_string(),
            phone: String::new(),
            picture: String::new(),
        }
    }

    #[test]
    fn test_encode_decode() {
        let codec = SessionCodec::new(test_config(3600));
        let mut data = SessionData {
            logged_in_user: Some(sample_user()),
            ..Default::default()
        };

        let encoded = codec.encode(&mut data).unwrap();
        assert!(!encoded.contains("a@b.com"));

        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_tampered_cookie_is_rejected() {
        let codec = SessionCodec::new(test_config(3600));
        let mut data = SessionData::default();
        let encoded = codec.encode(&mut data).unwrap();

        let middle = encoded.len() / 2;
        let flipped = if &encoded[middle..middle + 1] == "A" { "B" } else { "A" };
        let mut tampered = encoded.clone();
        tampered.replace_range(middle..middle + 1, flipped);

        assert!(matches!(codec.decode(&tampered), Err(SessionError::Decrypt)));
        assert!(matches!(codec.decode("not base64!"), Err(SessionError::Decrypt)));
        assert!(matches!(codec.decode(""), Err(SessionError::Decrypt)));
    }

    #[test]
    fn test_other_secret_cannot_decode() {
        let codec = SessionCodec::new(test_config(3600));
        let mut other_config = test_config(3600);
        other_config.secret = "ffffffffffffffffffffffffffffffff".to_string();
        let other = SessionCodec::new(other_config);

        let encoded = codec.encode(&mut SessionData::default()).unwrap();
        assert!(other.decode(&encoded).is_err());
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let codec = SessionCodec::new(test_config(60));
        let data = SessionData {
            issued_at: Utc::now().timestamp() - 120,
            ..Default::default()
        };

        // Seal directly to keep the old timestamp
        let sealed = codec.seal(&data).unwrap();
        let result = codec.decode(&sealed);
        assert!(matches!(result, Err(SessionError::Expired)));
    }

    #[test]
    fn test_oversized_session_fails_to_encode() {
        let codec = SessionCodec::new(test_config(3600));
        let mut data = SessionData::default();
        data.flashes.insert("info".to_string(), "x".repeat(MAX_COOKIE_SIZE));

        assert!(matches!(
            codec.encode(&mut data),
            Err(SessionError::CookieTooLarge(_))
        ));
    }

    #[test]
    fn test_cookie_attributes() {
        let codec = SessionCodec::new(test_config(3600));
        let header = codec.cookie("value".to_string()).to_string();

        assert!(header.starts_with("session=value"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=3600"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(!header.contains("Secure"));
    }
}
