//! `GET /health` (§6): fans out to the gateway's per-provider probes and a
//! vector-store liveness check, each bounded by `deadlines.health_check_ms`,
//! then aggregates: unhealthy iff any hard dependency is down, else
//! degraded if any is degraded, else healthy.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use ragforge_gateway::HealthStatus;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, HealthStatus>,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let deadline = Duration::from_millis(state.config.server.deadlines.health_check_ms);

    let gateway_report = state.gateway.health_check().await;

    let store_status = match tokio::time::timeout(deadline, state.store.list_collections()).await {
        Ok(Ok(_)) => HealthStatus::Healthy,
        Ok(Err(_)) => HealthStatus::Unhealthy,
        Err(_) => HealthStatus::Unhealthy,
    };

    let mut dependencies = gateway_report.dependencies.clone();
    dependencies.insert("vector_store".to_string(), store_status);

    let status = if dependencies.values().any(|s| *s == HealthStatus::Unhealthy) {
        HealthStatus::Unhealthy
    } else if dependencies.values().any(|s| *s == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let http_status = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: state.version,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        dependencies,
        cache_hits: gateway_report.cache_hits,
        cache_misses: gateway_report.cache_misses,
    };

    (http_status, Json(response))
}
