//! Approval gate: resumable pending → approved/rejected/expired machine.
//!
//! The gate is the single point where irreversible action is
//! authorized. A blocked workflow registers a oneshot waiter and is
//! released by whichever execution context resolves the request —
//! typically a separate HTTP request carrying only the stable ids.
//! A pending request past its deadline reads as expired on next
//! access; a background sweeper also expires overdue requests so
//! nothing silently stays pending. Expiry is not destructive: the
//! owning session returns to `Active` and may request approval again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::approval::{ApprovalRequest, ApprovalState, Candidate, Decision};
use crate::models::session::{SessionOutcome, SessionStatus};
use crate::store::SessionStore;
use crate::{AppError, Result};

#[derive(Default)]
struct GateInner {
    requests: HashMap<String, ApprovalRequest>,
    waiters: HashMap<String, oneshot::Sender<ApprovalState>>,
}

impl GateInner {
    /// Transition an overdue pending request to expired and release
    /// its waiter. Returns the owning session id when a transition
    /// happened.
    fn expire(&mut self, request_id: &str) -> Option<String> {
        let request = self.requests.get_mut(request_id)?;
        if !request.state.is_pending() {
            return None;
        }
        request.state = ApprovalState::Expired;
        request.resolved_at = Some(Utc::now());
        if let Some(tx) = self.waiters.remove(request_id) {
            let _ = tx.send(ApprovalState::Expired);
        }
        Some(request.session_id.clone())
    }
}

/// Human-in-the-loop approval gate over the session store.
pub struct ApprovalGate {
    store: Arc<SessionStore>,
    ttl: Duration,
    inner: Mutex<GateInner>,
}

impl ApprovalGate {
    /// Construct a gate whose requests expire after `ttl`.
    #[must_use]
    pub fn new(store: Arc<SessionStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            inner: Mutex::new(GateInner::default()),
        }
    }

    /// Submit a candidate for approval.
    ///
    /// Moves the session to `AwaitingApproval`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown session and
    /// `AppError::Conflict` when a pending request already exists for
    /// the session or the session cannot await approval.
    pub async fn request(&self, session_id: &str, candidate: Candidate) -> Result<ApprovalRequest> {
        self.store.get(session_id).await?;

        // Overdue requests do not block a new one; lapse them first so
        // the session reads as resumable below.
        let released = {
            let mut inner = self.inner.lock().await;
            let now = Utc::now();
            let overdue: Vec<String> = inner
                .requests
                .values()
                .filter(|r| r.session_id == session_id && r.is_overdue(now))
                .map(|r| r.id.clone())
                .collect();
            overdue
                .iter()
                .filter_map(|id| inner.expire(id))
                .collect::<Vec<_>>()
        };
        for expired_session in &released {
            self.release_session(expired_session).await;
        }

        let session = self.store.get(session_id).await?;
        if !session.can_transition_to(SessionStatus::AwaitingApproval) {
            return Err(AppError::Conflict(format!(
                "session {session_id} cannot await approval in status {:?}",
                session.status
            )));
        }

        let request = {
            let mut inner = self.inner.lock().await;

            if inner
                .requests
                .values()
                .any(|r| r.session_id == session_id && r.state.is_pending())
            {
                return Err(AppError::Conflict(format!(
                    "session {session_id} already has a pending approval request"
                )));
            }

            let request = ApprovalRequest::new(session_id.to_owned(), candidate, self.ttl);
            inner.requests.insert(request.id.clone(), request.clone());
            request
        };

        self.store
            .update(session_id, |session| {
                session.status = SessionStatus::AwaitingApproval;
            })
            .await?;

        info!(session_id, request_id = %request.id, "approval requested");
        Ok(request)
    }

    /// Read a request, applying lazy expiry when overdue.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown ids.
    pub async fn get(&self, request_id: &str) -> Result<ApprovalRequest> {
        let (request, expired_session) = {
            let mut inner = self.inner.lock().await;
            let now = Utc::now();
            let overdue = inner
                .requests
                .get(request_id)
                .is_some_and(|r| r.is_overdue(now));
            let expired_session = if overdue { inner.expire(request_id) } else { None };
            let request = inner
                .requests
                .get(request_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("approval {request_id} not found")))?;
            (request, expired_session)
        };

        if let Some(session_id) = expired_session {
            self.release_session(&session_id).await;
        }
        Ok(request)
    }

    /// Pending request for a session, if one exists.
    pub async fn pending_for_session(&self, session_id: &str) -> Option<ApprovalRequest> {
        let inner = self.inner.lock().await;
        inner
            .requests
            .values()
            .find(|r| r.session_id == session_id && r.state.is_pending())
            .cloned()
    }

    /// Resolve a pending request with an external decision.
    ///
    /// Only an approved resolution unblocks the waiting workflow for
    /// action; a rejection completes the session with a rejected
    /// outcome.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown ids and
    /// `AppError::AlreadyResolved` when the request is no longer
    /// pending (including lapsing past its deadline).
    pub async fn resolve(
        &self,
        request_id: &str,
        decision: Decision,
        actor: Option<String>,
    ) -> Result<ApprovalRequest> {
        let request = {
            let mut inner = self.inner.lock().await;

            let now = Utc::now();
            let overdue = inner
                .requests
                .get(request_id)
                .is_some_and(|r| r.is_overdue(now));
            if overdue {
                let expired_session = inner.expire(request_id);
                drop(inner);
                if let Some(session_id) = expired_session {
                    self.release_session(&session_id).await;
                }
                return Err(AppError::AlreadyResolved(format!(
                    "approval {request_id} expired at its deadline"
                )));
            }

            let request = inner
                .requests
                .get_mut(request_id)
                .ok_or_else(|| AppError::NotFound(format!("approval {request_id} not found")))?;
            if !request.state.is_pending() {
                return Err(AppError::AlreadyResolved(format!(
                    "approval {request_id} is {:?}",
                    request.state
                )));
            }

            request.state = match decision {
                Decision::Approved => ApprovalState::Approved,
                Decision::Rejected => ApprovalState::Rejected,
            };
            request.resolved_at = Some(Utc::now());
            request.actor = actor;

            let snapshot = request.clone();
            if let Some(tx) = inner.waiters.remove(request_id) {
                let _ = tx.send(snapshot.state);
            }
            snapshot
        };

        if request.state == ApprovalState::Rejected {
            let updated = self
                .store
                .update(&request.session_id, |session| {
                    if session.status == SessionStatus::AwaitingApproval {
                        session.status = SessionStatus::Completed;
                        session.outcome = Some(SessionOutcome::Rejected);
                    }
                })
                .await;
            if let Err(err) = updated {
                warn!(%err, session_id = %request.session_id, "failed to record rejection on session");
            }
        }

        info!(
            request_id,
            state = ?request.state,
            actor = request.actor.as_deref().unwrap_or("unknown"),
            "approval resolved"
        );
        Ok(request)
    }

    /// Block until the request reaches a terminal state or its
    /// deadline passes.
    ///
    /// Safe to call from the workflow task while other execution
    /// contexts resolve the request by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown ids.
    pub async fn wait(&self, request_id: &str) -> Result<ApprovalState> {
        let (rx, remaining) = {
            let mut inner = self.inner.lock().await;
            let request = inner
                .requests
                .get(request_id)
                .ok_or_else(|| AppError::NotFound(format!("approval {request_id} not found")))?;

            if !request.state.is_pending() {
                return Ok(request.state);
            }

            let remaining = (request.deadline - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            let (tx, rx) = oneshot::channel();
            inner.waiters.insert(request_id.to_owned(), tx);
            (rx, remaining)
        };

        match tokio::time::timeout(remaining, rx).await {
            Ok(Ok(state)) => Ok(state),
            Ok(Err(_closed)) => {
                // Waiter was dropped without a decision; report the
                // current state rather than guessing.
                Ok(self.get(request_id).await?.state)
            }
            Err(_elapsed) => {
                let expired_session = {
                    let mut inner = self.inner.lock().await;
                    inner.expire(request_id)
                };
                if let Some(session_id) = expired_session {
                    self.release_session(&session_id).await;
                }
                info!(request_id, "approval wait lapsed at deadline");
                Ok(ApprovalState::Expired)
            }
        }
    }

    /// Expire every overdue pending request. Returns how many lapsed.
    pub async fn expire_overdue(&self) -> usize {
        let expired_sessions = {
            let mut inner = self.inner.lock().await;
            let now = Utc::now();
            let overdue: Vec<String> = inner
                .requests
                .values()
                .filter(|r| r.is_overdue(now))
                .map(|r| r.id.clone())
                .collect();
            overdue
                .iter()
                .filter_map(|id| inner.expire(id))
                .collect::<Vec<_>>()
        };

        for session_id in &expired_sessions {
            self.release_session(session_id).await;
        }
        expired_sessions.len()
    }

    /// Return an expired session to `Active` so it stays resumable.
    async fn release_session(&self, session_id: &str) {
        let updated = self
            .store
            .update(session_id, |session| {
                if session.status == SessionStatus::AwaitingApproval {
                    session.status = SessionStatus::Active;
                }
            })
            .await;
        if let Err(err) = updated {
            warn!(%err, session_id, "failed to release session after expiry");
        }
    }
}

/// Interval-driven sweep so overdue requests lapse without a reader.
#[must_use]
pub fn spawn_expiry_task(
    gate: Arc<ApprovalGate>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("expiry sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let lapsed = gate.expire_overdue().await;
                    if lapsed > 0 {
                        info!(lapsed, "expired overdue approval requests");
                    }
                }
            }
        }
    })
}
