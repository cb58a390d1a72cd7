// src/common/config.rs
//! Application configuration loaded from environment variables
//!
//! Every option has a default so the service starts with an empty environment.
//! Values that fail to parse fall back to their default with a warning; semantic
//! problems (short session secret, zero limits) are returned as [`ConfigError`].

use axum_extra::extract::cookie::SameSite;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Minimum accepted session secret length in bytes
pub const MIN_SECRET_LENGTH: usize = 32;

/// Secret used when SECRET is unset. Development only.
const DEVELOPMENT_SECRET: &str = "change-me-in-production-this-is-not-secure";

/// Origin list that enables wildcard CORS in debug mode
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:8080";

const DEFAULT_CSP_POLICY: &str =
    "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("session secret must be at least {MIN_SECRET_LENGTH} characters long, got {0}")]
    SecretTooShort(usize),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub oauth: OAuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub debug: bool,
    /// Also bounds total handler execution (request timeout stage)
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_open_conns: u32,
    pub conn_max_lifetime: Duration,
    /// Drop and recreate the schema at startup (RESET_DB)
    pub reset: bool,
}

#[derive(Clone)]
pub struct SessionConfig {
    pub secret: String,
    /// Cookie lifetime in seconds
    pub max_age: i64,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("max_age", &self.max_age)
            .field("http_only", &self.http_only)
            .field("secure", &self.secure)
            .field("same_site", &self.same_site)
            .finish()
    }
}

#[derive(Clone)]
pub struct OAuthConfig {
    pub google_client_id: String,
    pub google_client_secret: String,
    pub redirect_url: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("google_client_id", &self.google_client_id)
            .field("google_client_secret", &"<redacted>")
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

impl OAuthConfig {
    pub fn is_configured(&self) -> bool {
        !self.google_client_id.is_empty() && !self.google_client_secret.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub rate_limit_enabled: bool,
    pub rate_limit_per_minute: u32,
    /// Recognized for compatibility; the fixed-window limiter does not use it
    pub rate_limit_burst: u32,
    pub allowed_origins: Vec<String>,
    pub csp_policy: String,
    /// Honor X-Forwarded-For / X-Real-IP; only safe behind a proxy that overwrites them
    pub trust_proxy_headers: bool,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = EnvReader { lookup: &lookup };
        let debug = vars.bool("DEBUG", false);

        let mut config = Self {
            server: ServerConfig {
                port: vars.parse("PORT", 8080u16),
                debug,
                read_timeout: vars.duration("READ_TIMEOUT", Duration::from_secs(30)),
                write_timeout: vars.duration("WRITE_TIMEOUT", Duration::from_secs(30)),
                shutdown_timeout: vars.duration("SHUTDOWN_TIMEOUT", Duration::from_secs(30)),
            },
            database: DatabaseConfig {
                url: vars.string("DATABASE_URL", "sqlite://crud.db"),
                max_open_conns: vars.parse("DB_MAX_OPEN_CONNS", 100u32),
                conn_max_lifetime: vars.duration("DB_CONN_MAX_LIFETIME", Duration::from_secs(3600)),
                reset: vars.bool("RESET_DB", false),
            },
            session: SessionConfig {
                secret: vars.string("SECRET", ""),
                max_age: vars.parse("SESSION_MAX_AGE", 86_400i64 * 7),
                http_only: vars.bool("SESSION_HTTP_ONLY", true),
                secure: vars.bool("SESSION_SECURE", !debug),
                same_site: vars.same_site("SESSION_SAME_SITE", SameSite::Lax),
            },
            oauth: OAuthConfig {
                google_client_id: vars.string("GOOGLE_CLIENT_ID", ""),
                google_client_secret: vars.string("GOOGLE_CLIENT_SECRET", ""),
                redirect_url: vars.string(
                    "OAUTH_REDIRECT_URL",
                    "http://localhost:8080/auth/callback",
                ),
            },
            security: SecurityConfig {
                rate_limit_enabled: vars.bool("RATE_LIMIT_ENABLED", true),
                rate_limit_per_minute: vars.parse("RATE_LIMIT_PER_MINUTE", 60u32),
                rate_limit_burst: vars.parse("RATE_LIMIT_BURST", 10u32),
                allowed_origins: vars.list("ALLOWED_ORIGINS", &[DEFAULT_ALLOWED_ORIGIN]),
                csp_policy: vars.string("CSP_POLICY", DEFAULT_CSP_POLICY),
                trust_proxy_headers: vars.bool("TRUST_PROXY_HEADERS", false),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.session.secret.is_empty() {
            warn!("SECRET not set; using the built-in development secret. Do not run this in production");
            self.session.secret = DEVELOPMENT_SECRET.to_string();
        }

        if self.session.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::SecretTooShort(self.session.secret.len()));
        }

        if self.session.max_age <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "SESSION_MAX_AGE",
                reason: "must be positive".to_string(),
            });
        }

        if self.security.rate_limit_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_PER_MINUTE",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.server.read_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "READ_TIMEOUT",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.oauth.google_client_id.is_empty() {
            warn!("GOOGLE_CLIENT_ID not set. OAuth authentication will not work");
        }
        if self.oauth.google_client_secret.is_empty() {
            warn!("GOOGLE_CLIENT_SECRET not set. OAuth authentication will not work");
        }

        Ok(())
    }

    /// True when CORS should mirror any origin (debug mode with the untouched default list)
    pub fn cors_allows_any_origin(&self) -> bool {
        self.server.debug
            && self.security.allowed_origins.len() == 1
            && self.security.allowed_origins[0] == DEFAULT_ALLOWED_ORIGIN
    }
}

struct EnvReader<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<'a, F: Fn(&str) -> Option<String>> EnvReader<'a, F> {
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &str, default: T) -> T
    where
        T: std::str::FromStr + std::fmt::Display,
    {
        match self.raw(key) {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                warn!(key = key, value = %value, default = %default, "Invalid numeric value, using default");
                default
            }),
            None => default,
        }
    }

    fn bool(&self, key: &str, default: bool) -> bool {
        match self.raw(key) {
            Some(value) => parse_bool(&value).unwrap_or_else(|| {
                warn!(key = key, value = %value, default = default, "Invalid boolean value, using default");
                default
            }),
            None => default,
        }
    }

    fn duration(&self, key: &str, default: Duration) -> Duration {
        match self.raw(key) {
            Some(value) => parse_duration(&value).unwrap_or_else(|| {
                warn!(key = key, value = %value, default = ?default, "Invalid duration value, using default");
                default
            }),
            None => default,
        }
    }

    fn list(&self, key: &str, default: &[&str]) -> Vec<String> {
        let parsed: Vec<String> = self
            .raw(key)
            .map(|value| {
                value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if parsed.is_empty() {
            default.iter().map(|s| s.to_string()).collect()
        } else {
            parsed
        }
    }

    fn same_site(&self, key: &str, default: SameSite) -> SameSite {
        match self.raw(key) {
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "strict" => SameSite::Strict,
                "lax" => SameSite::Lax,
                "none" => SameSite::None,
                _ => {
                    warn!(key = key, value = %value, "Invalid SameSite value, using default");
                    default
                }
            },
            None => default,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" => Some(true),
        "0" | "f" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Parses durations such as `500ms`, `30s`, `1m30s`, `2h`. A bare number is seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = value;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return None;
        }
        let amount: f64 = rest[..digits_end].parse().ok()?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_nanos: f64 = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" => 60_000_000_000.0,
            "h" => 3_600_000_000_000.0,
            _ => return None,
        };
        rest = &rest[unit_end..];

        total += Duration::from_nanos((amount * unit_nanos).round() as u64);
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_empty_environment() {
        let config = load(&[]).unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(!config.server.debug);
        assert_eq!(config.server.read_timeout, Duration::from_secs(30));
        assert_eq!(config.session.secret, DEVELOPMENT_SECRET);
        assert_eq!(config.session.max_age, 604_800);
        assert!(config.session.secure, "secure cookies by default outside debug");
        assert_eq!(config.security.rate_limit_per_minute, 60);
        assert_eq!(config.security.allowed_origins, vec![DEFAULT_ALLOWED_ORIGIN]);
        assert_eq!(config.session.same_site, SameSite::Lax);
        assert!(!config.security.trust_proxy_headers);
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let result = load(&[("SECRET", "too-short")]);
        assert!(matches!(result, Err(ConfigError::SecretTooShort(9))));
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = load(&[
            ("PORT", "not-a-port"),
            ("DEBUG", "maybe"),
            ("READ_TIMEOUT", "soon"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(!config.server.debug);
        assert_eq!(config.server.read_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let result = load(&[("RATE_LIMIT_PER_MINUTE", "0")]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "RATE_LIMIT_PER_MINUTE", .. })
        ));
    }

    #[test]
    fn test_allowed_origins_are_split_on_commas() {
        let config = load(&[(
            "ALLOWED_ORIGINS",
            "https://a.example.com, https://b.example.com,,",
        )])
        .unwrap();

        assert_eq!(
            config.security.allowed_origins,
            vec!["https://a.example.com", "https://b.example.com"]
        );
    }

    #[test]
    fn test_debug_with_default_origin_allows_any_origin() {
        let config = load(&[("DEBUG", "true")]).unwrap();
        assert!(config.cors_allows_any_origin());
        assert!(!config.session.secure);

        let config = load(&[("DEBUG", "true"), ("ALLOWED_ORIGINS", "https://app.example.com")])
            .unwrap();
        assert!(!config.cors_allows_any_origin());

        let config = load(&[]).unwrap();
        assert!(!config.cors_allows_any_origin());
    }

    #[test]
    fn test_same_site_parsing() {
        let config = load(&[("SESSION_SAME_SITE", "strict")]).unwrap();
        assert_eq!(config.session.same_site, SameSite::Strict);

        let config = load(&[("SESSION_SAME_SITE", "sideways")]).unwrap();
        assert_eq!(config.session.same_site, SameSite::Lax);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("45"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("1h30m"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("10 years"), None);
        assert_eq!(parse_duration("s"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let config = load(&[("GOOGLE_CLIENT_SECRET", "super-secret-value")]).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains(DEVELOPMENT_SECRET));
    }
}
