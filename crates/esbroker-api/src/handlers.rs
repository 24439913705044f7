//! REST API handlers.
//!
//! Each handler makes a single orchestrator call and returns JSON.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::debug;

use esbroker_orchestrator::{ProvisionRequest, TagRequest};

use crate::ApiState;

/// Header telling the platform's health tooling to ignore a 503.
pub const IGNORE_ERRORS_HEADER: &str = "x-ignore-errors";

fn error_response(msg: &str, status: StatusCode) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

/// Body decoding failures are reported like any other failure.
fn rejection_response(rejection: JsonRejection) -> Response {
    debug!(error = %rejection.body_text(), "malformed request body");
    error_response(&rejection.body_text(), StatusCode::INTERNAL_SERVER_ERROR)
}

// ── Instances ──────────────────────────────────────────────────

/// POST /v1/es/instance
pub async fn provision(
    State(state): State<ApiState>,
    body: Result<Json<ProvisionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };

    match state.orchestrator.provision(request).await {
        Ok(provisioned) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "creation requested",
                "spec": format!("es:{}", provisioned.name),
            })),
        )
            .into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// DELETE /v1/es/instance/{name}
pub async fn deprovision(State(state): State<ApiState>, Path(name): Path<String>) -> Response {
    match state.orchestrator.deprovision(&name).await {
        Ok(()) => Json(json!({ "message": "deleted" })).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// GET /v1/es/instance/{name}/status and GET /v1/es/url/{name}
///
/// Any failure, including a cluster that has no endpoint yet, is a 503.
pub async fn status(State(state): State<ApiState>, Path(name): Path<String>) -> Response {
    match state.orchestrator.status(&name).await {
        Ok(urls) => Json(urls).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(IGNORE_ERRORS_HEADER, "true")],
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

// ── Catalog ────────────────────────────────────────────────────

/// GET /v1/es/plans
pub async fn plans(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.orchestrator.plans())
}

// ── Tags ───────────────────────────────────────────────────────

/// POST /v1/es/tag
pub async fn tag(
    State(state): State<ApiState>,
    body: Result<Json<TagRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };

    match state.orchestrator.tag(request).await {
        Ok(()) => (StatusCode::CREATED, Json(json!({ "response": "tag added" }))).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}
