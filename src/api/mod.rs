//! HTTP JSON API for front-end collaborators.
//!
//! Any front end (or test harness) drives the workflow through these
//! routes: create a session, poll it until `awaiting_approval`, then
//! resolve the approval request by id.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::config::GlobalConfig;
use crate::gate::ApprovalGate;
use crate::store::SessionStore;
use crate::workflow::Planner;
use crate::AppError;

pub mod approvals;
pub mod sessions;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// Session store.
    pub store: Arc<SessionStore>,
    /// Approval gate.
    pub gate: Arc<ApprovalGate>,
    /// Workflow runner.
    pub planner: Arc<Planner>,
}

/// Handler for `GET /health` — returns 200 OK with a plain-text body.
async fn health() -> &'static str {
    "ok"
}

/// Build the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/{id}", get(sessions::get_session))
        .route("/sessions/{id}/cancel", post(sessions::cancel_session))
        .route("/sessions/{id}/approval", get(approvals::pending_for_session))
        .route("/approvals/{id}", get(approvals::get_approval))
        .route("/approvals/{id}/resolve", post(approvals::resolve_approval))
        .with_state(state)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::AlreadyResolved(_) => StatusCode::CONFLICT,
            Self::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Source(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
