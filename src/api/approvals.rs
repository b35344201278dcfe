//! Approval routes: inspect and resolve by stable id.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::models::approval::{ApprovalRequest, Decision};
use crate::Result;

use super::AppState;

/// Body for `POST /approvals/{id}/resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveBody {
    /// Terminal decision.
    pub decision: Decision,
    /// Optional identifier of the deciding actor.
    pub actor: Option<String>,
}

/// Handler for `GET /sessions/{id}/approval` — pending request for a
/// session, so polling clients can recover the request id.
pub async fn pending_for_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApprovalRequest>> {
    state.store.get(&id).await?;
    let request = state.gate.pending_for_session(&id).await.ok_or_else(|| {
        crate::AppError::NotFound(format!("no pending approval for session {id}"))
    })?;
    Ok(Json(request))
}

/// Handler for `GET /approvals/{id}` — reads apply lazy expiry.
pub async fn get_approval(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApprovalRequest>> {
    let request = state.gate.get(&id).await?;
    Ok(Json(request))
}

/// Handler for `POST /approvals/{id}/resolve` — submit a decision from
/// any execution context holding the request id.
pub async fn resolve_approval(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ResolveBody>,
) -> Result<Json<ApprovalRequest>> {
    let request = state.gate.resolve(&id, body.decision, body.actor).await?;
    info!(request_id = %id, state = ?request.state, "approval resolved via api");
    Ok(Json(request))
}
