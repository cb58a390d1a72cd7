use super::models::{
    CheckStatus, HealthStatus, LivenessResponse, MetricsResponse, RuntimeMetrics,
};
use super::services;
use crate::common::SharedState;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::collections::BTreeMap;

/// GET /health/live - The process is up
pub async fn liveness() -> impl IntoResponse {
    Json(LivenessResponse {
        status: "alive",
        timestamp: Utc::now(),
    })
}

/// GET /health/ready - The database answers
pub async fn readiness(Extension(state): Extension<SharedState>) -> impl IntoResponse {
    let (db, version) = {
        let app_state = state.read().await;
        (app_state.db.clone(), app_state.version)
    };

    let database = services::check_database(&db).await;
    let ready = database.status == CheckStatus::Healthy;

    let mut checks = BTreeMap::new();
    checks.insert("database", database);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthStatus {
            status: if ready { "ready" } else { "not_ready" },
            timestamp: Utc::now(),
            version,
            checks,
        }),
    )
}

/// GET /health/ - Database and memory
pub async fn health(Extension(state): Extension<SharedState>) -> impl IntoResponse {
    let (db, version) = {
        let app_state = state.read().await;
        (app_state.db.clone(), app_state.version)
    };

    let database = services::check_database(&db).await;
    let memory = services::check_memory();
    let overall = services::overall_status(&database, &memory);

    let mut checks = BTreeMap::new();
    checks.insert("database", database);
    checks.insert("memory", memory);

    let status = if overall == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        status,
        Json(HealthStatus {
            status: overall,
            timestamp: Utc::now(),
            version,
            checks,
        }),
    )
}

/// GET /health/metrics
pub async fn metrics(Extension(state): Extension<SharedState>) -> impl IntoResponse {
    let app_state = state.read().await;

    let num_cpu = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    Json(MetricsResponse {
        timestamp: Utc::now(),
        memory: services::process_memory(),
        database: services::database_metrics(&app_state.db),
        runtime: RuntimeMetrics {
            num_cpu,
            uptime_seconds: app_state.started_at.elapsed().as_secs(),
            version: app_state.version,
        },
    })
}
