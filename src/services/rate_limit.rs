// src/services/rate_limit.rs
//! Fixed-window request counter keyed by client IP
//!
//! Counters live in process memory. Each server instance enforces its own
//! limit; there is no cross-instance coordination.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::common::config::SecurityConfig;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests accepted per window
    pub limit: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 60,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Per-minute limit taken from the security section of the app config
    pub fn from_security(security: &SecurityConfig) -> Self {
        Self {
            enabled: security.rate_limit_enabled,
            limit: security.rate_limit_per_minute,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitState {
    count: u32,
    window_start: Instant,
    /// Unix seconds at which the current window ends
    reset_at: u64,
}

impl RateLimitState {
    fn new(window: Duration) -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
            reset_at: unix_now() + window.as_secs(),
        }
    }

    fn reset(&mut self, window: Duration) {
        *self = Self::new(window);
    }

    fn is_expired(&self, window: Duration) -> bool {
        self.window_start.elapsed() >= window
    }
}

/// Outcome of one counted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix seconds at which the window resets
    pub reset_at: u64,
}

impl RateLimitDecision {
    /// Seconds until the window resets, never negative
    pub fn retry_after(&self) -> u64 {
        self.reset_at.saturating_sub(unix_now())
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitService {
    config: RateLimitConfig,
    rate_limiter: Arc<RwLock<HashMap<String, RateLimitState>>>,
}

impl RateLimitService {
    pub fn new(config: RateLimitConfig) -> Self {
        info!(
            enabled = config.enabled,
            limit = config.limit,
            window_seconds = config.window.as_secs(),
            "Initializing RateLimitService"
        );
        Self {
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Count a request for `key` and decide whether it may proceed
    ///
    /// The increment and the comparison happen under one write lock, so
    /// concurrent requests for the same key never both take the last slot.
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let window = self.config.window;
        let limit = self.config.limit;

        let mut limiter = self.rate_limiter.write().await;
        let state = limiter
            .entry(key.to_string())
            .or_insert_with(|| RateLimitState::new(window));

        if state.is_expired(window) {
            state.reset(window);
        }

        state.count = state.count.saturating_add(1);

        RateLimitDecision {
            allowed: state.count <= limit,
            limit,
            remaining: limit.saturating_sub(state.count),
            reset_at: state.reset_at,
        }
    }

    /// Drop counters whose window has elapsed, returning how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let window = self.config.window;
        let mut limiter = self.rate_limiter.write().await;
        let before = limiter.len();
        limiter.retain(|_, state| !state.is_expired(window));
        let removed = before - limiter.len();
        if removed > 0 {
            debug!(removed = removed, "Cleaned up expired rate limit entries");
        }
        removed
    }

    /// Periodically evict expired windows until `shutdown` is cancelled
    pub fn start_cleanup_task(
        self: Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.cleanup_expired().await;
                    }
                }
            }
            debug!("Rate limit cleanup task stopped");
        })
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.rate_limiter.read().await.len()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
