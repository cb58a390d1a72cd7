use super::models::{CheckResult, CheckStatus, DatabaseMetrics, MemoryMetrics};
use sqlx::SqlitePool;
use std::time::Instant;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::warn;

/// Resident memory above which the service reports itself degraded
pub const MEMORY_WARNING_BYTES: u64 = 512 * 1024 * 1024;

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Runs `SELECT 1` against the pool
pub async fn check_database(db: &SqlitePool) -> CheckResult {
    let start = Instant::now();

    if db.is_closed() {
        return CheckResult {
            status: CheckStatus::Unhealthy,
            message: "Database pool is closed".to_string(),
            latency_ms: elapsed_ms(start),
        };
    }

    match sqlx::query("SELECT 1").execute(db).await {
        Ok(_) => CheckResult {
            status: CheckStatus::Healthy,
            message: "Database connection is healthy".to_string(),
            latency_ms: elapsed_ms(start),
        },
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            CheckResult {
                status: CheckStatus::Unhealthy,
                message: format!("Database ping failed: {}", e),
                latency_ms: elapsed_ms(start),
            }
        }
    }
}

/// Current process memory as reported by the OS
pub fn process_memory() -> MemoryMetrics {
    let pid = Pid::from_u32(std::process::id());
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::new().with_memory(),
    );

    match system.process(pid) {
        Some(process) => MemoryMetrics {
            rss_bytes: Some(process.memory()),
            virtual_bytes: Some(process.virtual_memory()),
        },
        None => MemoryMetrics {
            rss_bytes: None,
            virtual_bytes: None,
        },
    }
}

/// Classifies a resident set size against [`MEMORY_WARNING_BYTES`]
pub fn classify_memory(rss_bytes: Option<u64>) -> CheckResult {
    let start = Instant::now();
    let (status, message) = match rss_bytes {
        Some(rss) if rss > MEMORY_WARNING_BYTES => {
            (CheckStatus::Degraded, "Memory usage is elevated".to_string())
        }
        Some(_) => (
            CheckStatus::Healthy,
            "Memory usage is within normal limits".to_string(),
        ),
        None => (
            CheckStatus::Healthy,
            "Memory usage is not reported on this platform".to_string(),
        ),
    };

    CheckResult {
        status,
        message,
        latency_ms: elapsed_ms(start),
    }
}

pub fn check_memory() -> CheckResult {
    classify_memory(process_memory().rss_bytes)
}

pub fn database_metrics(db: &SqlitePool) -> DatabaseMetrics {
    DatabaseMetrics {
        pool_size: db.size(),
        idle_connections: db.num_idle(),
        max_connections: db.options().get_max_connections(),
    }
}

/// `healthy` unless the database is down (`unhealthy`) or memory is high (`degraded`)
pub fn overall_status(database: &CheckResult, memory: &CheckResult) -> &'static str {
    if database.status != CheckStatus::Healthy {
        "unhealthy"
    } else if memory.status != CheckStatus::Healthy {
        "degraded"
    } else {
        "healthy"
    }
}
