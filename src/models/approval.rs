//! Candidate proposal and approval request models.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal decision submitted by an external actor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Authorize the proposed action.
    Approved,
    /// Decline the proposed action.
    Rejected,
}

/// Lifecycle state for an approval request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// Awaiting an external decision.
    Pending,
    /// Actor authorized the proposal.
    Approved,
    /// Actor declined the proposal.
    Rejected,
    /// Deadline passed without a decision.
    Expired,
}

impl ApprovalState {
    /// Whether the request can still be resolved.
    #[must_use]
    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }
}

/// Venue proposal produced once per session by the decision proposer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Candidate {
    /// Structured proposal record (venue, emissions figures).
    pub payload: serde_json::Value,
    /// Human-readable reasoning behind the selection.
    pub justification: String,
    /// Whether the proposal must pass the approval gate.
    pub requires_approval: bool,
}

impl Candidate {
    /// Venue name from the proposal payload, if present.
    #[must_use]
    pub fn venue(&self) -> Option<&str> {
        self.payload.get("venue").and_then(serde_json::Value::as_str)
    }

    /// Grand total emissions from the proposal payload, if present.
    #[must_use]
    pub fn total_emissions_kg(&self) -> Option<f64> {
        self.payload
            .get("total_emissions_kg")
            .and_then(serde_json::Value::as_f64)
    }
}

/// A candidate awaiting external approval, keyed by stable id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ApprovalRequest {
    /// Unique record identifier.
    pub id: String,
    /// Owning session identifier.
    pub session_id: String,
    /// Proposal under review.
    pub candidate: Candidate,
    /// Current lifecycle state.
    pub state: ApprovalState,
    /// Creation timestamp.
    pub requested_at: DateTime<Utc>,
    /// Instant after which the request reads as expired.
    pub deadline: DateTime<Utc>,
    /// Resolution timestamp, once terminal.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Actor who submitted the decision, when provided.
    pub actor: Option<String>,
}

impl ApprovalRequest {
    /// Construct a new pending request with the given lifetime.
    #[must_use]
    pub fn new(session_id: String, candidate: Candidate, ttl: std::time::Duration) -> Self {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::hours(1));
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            candidate,
            state: ApprovalState::Pending,
            requested_at: now,
            deadline: now + ttl,
            resolved_at: None,
            actor: None,
        }
    }

    /// Whether the pending deadline has passed as of `now`.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.state.is_pending() && now > self.deadline
    }
}
