//! Session model and lifecycle helpers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::approval::Candidate;
use crate::models::fetch::FetchResult;

/// Lifecycle status for a planning session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session is running or resumable; no approval is outstanding.
    Active,
    /// Workflow is suspended at the approval gate.
    AwaitingApproval,
    /// Workflow reached a terminal outcome.
    Completed,
    /// Session cancelled explicitly by the caller.
    Cancelled,
}

/// Terminal outcome recorded on a completed session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SessionOutcome {
    /// Operator approved and the booking executor confirmed the venue.
    Booked {
        /// Booking confirmation identifier.
        confirmation_id: String,
        /// Venue that was booked.
        venue: String,
        /// Grand total emissions figure shown at approval time.
        total_emissions_kg: f64,
    },
    /// Operator rejected the proposed venue.
    Rejected,
    /// Approval request lapsed without a decision.
    Expired,
}

/// Event details supplied by the caller at session creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EventContext {
    /// Host city for the event.
    pub city: String,
    /// Event date (free-form, e.g. `2025-06-01`).
    pub date: String,
    /// Expected attendee count.
    pub attendees: Option<u32>,
    /// Free-form notes from the caller.
    pub notes: Option<String>,
}

/// Session domain entity held by the in-memory store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Session {
    /// Unique record identifier.
    pub id: String,
    /// Conversation context supplied at creation.
    pub context: EventContext,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Settled fetch results keyed by task id.
    pub fetch_results: HashMap<String, FetchResult>,
    /// Candidate proposed by the auditor, once produced.
    pub candidate: Option<Candidate>,
    /// Terminal outcome, once the workflow completes.
    pub outcome: Option<SessionOutcome>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Construct a new active session with a generated identifier.
    #[must_use]
    pub fn new(context: EventContext) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            context,
            status: SessionStatus::Active,
            fetch_results: HashMap::new(),
            candidate: None,
            outcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Determine whether a lifecycle transition is permitted.
    #[must_use]
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self.status, next),
            (
                SessionStatus::Active,
                SessionStatus::AwaitingApproval | SessionStatus::Completed | SessionStatus::Cancelled
            ) | (
                SessionStatus::AwaitingApproval,
                SessionStatus::Active | SessionStatus::Completed | SessionStatus::Cancelled
            )
        )
    }
}
