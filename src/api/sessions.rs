//! Session routes: create, inspect, cancel.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{error, info};

use crate::models::approval::Decision;
use crate::models::session::{EventContext, Session, SessionStatus};
use crate::{AppError, Result};

use super::AppState;

/// Body for `POST /sessions`.
#[derive(Debug, Deserialize)]
pub struct CreateSessionBody {
    /// Host city; falls back to the configured default.
    pub city: Option<String>,
    /// Event date.
    pub date: String,
    /// Expected attendee count.
    pub attendees: Option<u32>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Handler for `POST /sessions` — create a session and start its
/// workflow in the background.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> Result<(StatusCode, Json<Session>)> {
    let context = EventContext {
        city: body.city.unwrap_or_else(|| state.config.default_city.clone()),
        date: body.date,
        attendees: body.attendees,
        notes: body.notes,
    };

    let session = state.store.create(context).await;
    info!(session_id = %session.id, "session created, starting workflow");

    let planner = state.planner.clone();
    let session_id = session.id.clone();
    tokio::spawn(async move {
        match planner.run(&session_id).await {
            Ok(outcome) => info!(%session_id, ?outcome, "workflow finished"),
            Err(err) => error!(%session_id, %err, "workflow failed"),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(session)))
}

/// Handler for `GET /sessions/{id}` — snapshot for polling clients.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>> {
    let session = state.store.get(&id).await?;
    Ok(Json(session))
}

/// Handler for `POST /sessions/{id}/cancel` — explicit reset.
///
/// A pending approval request for the session is rejected on the
/// caller's behalf so the suspended workflow is released.
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>> {
    let session = state
        .store
        .update(&id, |session| {
            if session.can_transition_to(SessionStatus::Cancelled) {
                session.status = SessionStatus::Cancelled;
            }
        })
        .await?;

    if session.status != SessionStatus::Cancelled {
        return Err(AppError::Conflict(format!(
            "session {id} cannot be cancelled in status {:?}",
            session.status
        )));
    }

    if let Some(pending) = state.gate.pending_for_session(&id).await {
        let _ = state
            .gate
            .resolve(&pending.id, Decision::Rejected, Some("cancelled".into()))
            .await;
    }

    info!(session_id = %id, "session cancelled");
    Ok(Json(session))
}
