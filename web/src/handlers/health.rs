//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
}

/// Liveness endpoint.
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// ```text
/// GET /health
/// {"status":"ok","version":"0.1.0"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,
    /// Result per dependency
    pub checks: BTreeMap<&'static str, bool>,
}

/// Readiness endpoint.
///
/// Runs every configured probe. 200 when all pass, 503 otherwise.
///
/// ```text
/// GET /ready
/// {"ready":true,"checks":{"database":true}}
/// ```
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let results = join_all(state.probes.iter().map(|probe| async move {
        (probe.name(), probe.check().await)
    }))
    .await;

    let checks: BTreeMap<_, _> = results.into_iter().collect();
    let ready = checks.values().all(|ok| *ok);
    if !ready {
        tracing::warn!(?checks, "Readiness check failed");
    }

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ReadinessResponse { ready, checks }))
}
