// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use super::config::AppConfig;
use crate::services::{IdentityProvider, RateLimitService};
use crate::session::SessionCodec;

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub rate_limit_service: Arc<RateLimitService>,
    pub session_codec: Arc<SessionCodec>,
    pub started_at: Instant,
    pub version: &'static str,
}

/// State as handed to handlers through `Extension`
pub type SharedState = Arc<RwLock<AppState>>;

impl AppState {
    pub fn new(
        db: SqlitePool,
        config: Arc<AppConfig>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        let rate_limit_service = Arc::new(RateLimitService::new(
            crate::services::rate_limit::RateLimitConfig::from_security(&config.security),
        ));
        let session_codec = Arc::new(SessionCodec::new(config.session.clone()));

        Self {
            db,
            config,
            identity_provider,
            rate_limit_service,
            session_codec,
            started_at: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }
}
