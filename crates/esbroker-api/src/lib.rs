//! esbroker-api: REST API for the broker.
//!
//! Thin axum layer over the [`Orchestrator`]: every handler decodes its
//! input, makes one orchestrator call, and renders the result. Errors are
//! rendered as `{"error": "<message>"}`.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/v1/es/instance` | Provision a cluster (`{plan, billingcode}`) |
//! | GET | `/v1/es/instance/{name}/status` | Cluster URLs, 503 until ready |
//! | GET | `/v1/es/url/{name}` | Same as status |
//! | DELETE | `/v1/es/instance/{name}` | Delete a cluster |
//! | GET | `/v1/es/plans` | Plan id → description |
//! | POST | `/v1/es/tag` | Tag a cluster (`{resource, name, value}`) |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use esbroker_orchestrator::Orchestrator;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the complete API router.
pub fn build_router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = ApiState { orchestrator };

    let es_routes = Router::new()
        .route("/instance", post(handlers::provision))
        .route("/instance/{name}", axum::routing::delete(handlers::deprovision))
        .route("/instance/{name}/status", get(handlers::status))
        .route("/url/{name}", get(handlers::status))
        .route("/plans", get(handlers::plans))
        .route("/tag", post(handlers::tag))
        .with_state(state);

    Router::new().nest("/v1/es", es_routes)
}
