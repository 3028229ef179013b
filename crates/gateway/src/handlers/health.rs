//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: CheckResult,
    pub schema: SchemaCheck,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Catalog schema state; the catalog cannot serve until it is current
#[derive(Serialize)]
pub struct SchemaCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_migrations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness check - always returns healthy if server is running
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.observability.service_name.clone(),
        version: cinema_common::VERSION,
    })
}

/// Readiness check: database reachable and every migration applied.
///
/// Answers 503 while not ready.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let start = std::time::Instant::now();

    let database = match state.db.ping().await {
        Ok(_) => CheckResult {
            status: "up".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => CheckResult {
            status: "down".to_string(),
            latency_ms: None,
            error: Some(e.to_string()),
        },
    };

    let schema = match state.db.pending_migrations().await {
        Ok(0) => SchemaCheck {
            status: "current".to_string(),
            pending_migrations: Some(0),
            error: None,
        },
        Ok(pending) => SchemaCheck {
            status: "outdated".to_string(),
            pending_migrations: Some(pending),
            error: None,
        },
        Err(e) => SchemaCheck {
            status: "unknown".to_string(),
            pending_migrations: None,
            error: Some(e.to_string()),
        },
    };

    let ready = database.status == "up" && schema.status == "current";
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(ReadyResponse {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            checks: HealthChecks { database, schema },
        }),
    )
}
