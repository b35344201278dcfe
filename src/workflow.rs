//! End-to-end planning workflow: fan-out, propose, gate, book.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::GlobalConfig;
use crate::coordinator::fanout;
use crate::gate::ApprovalGate;
use crate::models::approval::{ApprovalState, Candidate};
use crate::models::fetch::TaskSpec;
use crate::models::session::{EventContext, SessionOutcome, SessionStatus};
use crate::proposer::Proposer;
use crate::sources::{self, SourceRegistry};
use crate::store::SessionStore;
use crate::{AppError, Result};

/// Confirmation returned by the booking executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BookingConfirmation {
    /// Unique confirmation identifier.
    pub confirmation_id: String,
    /// Venue that was booked.
    pub venue: String,
    /// Booking timestamp.
    pub booked_at: DateTime<Utc>,
}

/// Seam for the irreversible action taken after approval.
pub trait BookingExecutor: Send + Sync {
    /// Book the approved venue.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Source`](crate::AppError::Source) when the
    /// booking collaborator fails.
    fn book(
        &self,
        context: &EventContext,
        candidate: &Candidate,
    ) -> Pin<Box<dyn Future<Output = Result<BookingConfirmation>> + Send + 'static>>;
}

/// Mock executor; confirms every approved booking.
pub struct MockBookingExecutor;

impl BookingExecutor for MockBookingExecutor {
    fn book(
        &self,
        _context: &EventContext,
        candidate: &Candidate,
    ) -> Pin<Box<dyn Future<Output = Result<BookingConfirmation>> + Send + 'static>> {
        let venue = candidate.venue().unwrap_or("unknown venue").to_owned();
        Box::pin(async move {
            Ok(BookingConfirmation {
                confirmation_id: Uuid::new_v4().to_string(),
                venue,
                booked_at: Utc::now(),
            })
        })
    }
}

/// Default task set: venues, transport estimate, policy lookup.
#[must_use]
pub fn default_task_specs() -> Vec<TaskSpec> {
    vec![
        TaskSpec::for_source(sources::venues::SOURCE_ID, json!({})),
        TaskSpec::for_source(sources::transport::SOURCE_ID, json!({"origin": "Distributed"})),
        TaskSpec::for_source(sources::policy::SOURCE_ID, json!({"query": "catering"})),
    ]
}

/// Wires the session store, fan-out, proposer, and approval gate into
/// one resumable workflow per session.
pub struct Planner {
    config: Arc<GlobalConfig>,
    store: Arc<SessionStore>,
    gate: Arc<ApprovalGate>,
    registry: Arc<SourceRegistry>,
    proposer: Arc<dyn Proposer>,
    executor: Arc<dyn BookingExecutor>,
}

impl Planner {
    /// Construct a planner over shared application state.
    #[must_use]
    pub fn new(
        config: Arc<GlobalConfig>,
        store: Arc<SessionStore>,
        gate: Arc<ApprovalGate>,
        registry: Arc<SourceRegistry>,
        proposer: Arc<dyn Proposer>,
        executor: Arc<dyn BookingExecutor>,
    ) -> Self {
        Self {
            config,
            store,
            gate,
            registry,
            proposer,
            executor,
        }
    }

    /// Run the full workflow for a session with the default task set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown sessions,
    /// `AppError::InsufficientData` when no candidate can be proposed,
    /// and `AppError::Conflict` when the session already awaits
    /// approval.
    pub async fn run(&self, session_id: &str) -> Result<SessionOutcome> {
        self.run_with_tasks(session_id, &default_task_specs()).await
    }

    /// Run the full workflow for a session with an explicit task set.
    ///
    /// # Errors
    ///
    /// See [`Planner::run`].
    pub async fn run_with_tasks(
        &self,
        session_id: &str,
        specs: &[TaskSpec],
    ) -> Result<SessionOutcome> {
        let span = info_span!("workflow", session_id);

        async move {
            let results = fanout::fetch_all(
                &self.store,
                session_id,
                specs,
                &self.registry,
                self.config.timeouts.fetch_timeout(),
                &self.config.retry,
            )
            .await?;

            let context = self.store.get(session_id).await?.context;
            let candidate = self.proposer.propose(&context, &results)?;

            let stored = candidate.clone();
            self.store
                .update(session_id, move |session| {
                    session.candidate = Some(stored);
                })
                .await?;

            let request = self.gate.request(session_id, candidate.clone()).await?;
            info!(request_id = %request.id, "workflow suspended at approval gate");

            match self.gate.wait(&request.id).await? {
                ApprovalState::Approved => {
                    let confirmation = self.executor.book(&context, &candidate).await?;
                    let outcome = SessionOutcome::Booked {
                        confirmation_id: confirmation.confirmation_id.clone(),
                        venue: confirmation.venue.clone(),
                        total_emissions_kg: candidate.total_emissions_kg().unwrap_or(0.0),
                    };
                    let recorded = outcome.clone();
                    self.store
                        .update(session_id, move |session| {
                            session.status = SessionStatus::Completed;
                            session.outcome = Some(recorded);
                        })
                        .await?;
                    info!(venue = %confirmation.venue, "booking confirmed");
                    Ok(outcome)
                }
                ApprovalState::Rejected => {
                    info!("proposal rejected by operator");
                    Ok(SessionOutcome::Rejected)
                }
                ApprovalState::Expired => {
                    info!("approval lapsed; session remains resumable");
                    Ok(SessionOutcome::Expired)
                }
                ApprovalState::Pending => Err(AppError::Conflict(
                    "approval wait returned a non-terminal state".into(),
                )),
            }
        }
        .instrument(span)
        .await
    }
}
