use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Result of a single probe
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
    pub latency_ms: f64,
}

/// Body of `/health/ready` and `/health/`
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub checks: BTreeMap<&'static str, CheckResult>,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MemoryMetrics {
    /// Resident set size; `None` when the platform does not report it
    pub rss_bytes: Option<u64>,
    pub virtual_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseMetrics {
    pub pool_size: u32,
    pub idle_connections: usize,
    pub max_connections: u32,
}

#[derive(Debug, Serialize)]
pub struct RuntimeMetrics {
    pub num_cpu: usize,
    pub uptime_seconds: u64,
    pub version: &'static str,
}

/// Body of `/health/metrics`
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub timestamp: DateTime<Utc>,
    pub memory: MemoryMetrics,
    pub database: DatabaseMetrics,
    pub runtime: RuntimeMetrics,
}
