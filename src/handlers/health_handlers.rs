//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that exercises the storage backend

use crate::handlers::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that resolves the configured upload container through the
/// blob service. One call covers name validation, the metadata store, and
/// the payload directory, which is the same path a real upload takes.
///
/// Returns JSON describing the check. HTTP 200 when it passes, 503 when it
/// fails.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let storage_check = match state.blobs.ensure_container(&state.container).await {
        Ok(_) => (true, None::<String>),
        Err(err) => (false, Some(err.to_string())),
    };

    let overall_ok = storage_check.0;
    let mut checks = HashMap::new();
    checks.insert(
        "storage",
        CheckStatus {
            ok: storage_check.0,
            error: storage_check.1,
        },
    );

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
