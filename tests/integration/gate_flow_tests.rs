//! Approval gate flow tests: request, resolve, conflicts, release.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use greenevent::gate::ApprovalGate;
use greenevent::models::approval::{ApprovalState, Candidate, Decision};
use greenevent::models::session::{SessionOutcome, SessionStatus};
use greenevent::store::SessionStore;
use greenevent::AppError;

use super::test_helpers::context;

fn candidate() -> Candidate {
    Candidate {
        payload: json!({"venue": "EcoHub Loft", "total_emissions_kg": 570.0}),
        justification: "lowest grand total".into(),
        requires_approval: true,
    }
}

fn gate_fixture() -> (Arc<SessionStore>, ApprovalGate) {
    let store = Arc::new(SessionStore::new());
    let gate = ApprovalGate::new(Arc::clone(&store), Duration::from_secs(3600));
    (store, gate)
}

#[tokio::test]
async fn request_moves_session_to_awaiting_approval() {
    let (store, gate) = gate_fixture();
    let session = store.create(context("Austin")).await;

    let request = gate
        .request(&session.id, candidate())
        .await
        .expect("request accepted");

    assert_eq!(request.state, ApprovalState::Pending);
    assert_eq!(request.session_id, session.id);

    let session = store.get(&session.id).await.expect("session exists");
    assert_eq!(session.status, SessionStatus::AwaitingApproval);
}

#[tokio::test]
async fn second_request_for_same_session_conflicts() {
    let (store, gate) = gate_fixture();
    let session = store.create(context("Austin")).await;

    let first = gate
        .request(&session.id, candidate())
        .await
        .expect("first accepted");
    let err = gate
        .request(&session.id, candidate())
        .await
        .expect_err("duplicate rejected");

    assert!(matches!(err, AppError::Conflict(_)));

    // The first request is untouched by the failed second attempt.
    let still_pending = gate.get(&first.id).await.expect("request exists");
    assert_eq!(still_pending.state, ApprovalState::Pending);
}

#[tokio::test]
async fn concurrent_requests_admit_exactly_one() {
    let (store, gate) = gate_fixture();
    let gate = Arc::new(gate);
    let session = store.create(context("Austin")).await;

    let a = {
        let gate = Arc::clone(&gate);
        let id = session.id.clone();
        tokio::spawn(async move { gate.request(&id, candidate()).await })
    };
    let b = {
        let gate = Arc::clone(&gate);
        let id = session.id.clone();
        tokio::spawn(async move { gate.request(&id, candidate()).await })
    };

    let outcomes = [a.await.expect("join"), b.await.expect("join")];
    let accepted = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicted = outcomes
        .iter()
        .filter(|r| matches!(r, Err(AppError::Conflict(_))))
        .count();

    assert_eq!(accepted, 1);
    assert_eq!(conflicted, 1);
}

#[tokio::test]
async fn request_for_unknown_session_fails_not_found() {
    let (_store, gate) = gate_fixture();

    let err = gate
        .request("missing", candidate())
        .await
        .expect_err("unknown session");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn request_for_completed_session_conflicts() {
    let (store, gate) = gate_fixture();
    let session = store.create(context("Austin")).await;
    store
        .update(&session.id, |s| s.status = SessionStatus::Completed)
        .await
        .expect("update");

    let err = gate
        .request(&session.id, candidate())
        .await
        .expect_err("completed session rejected");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn approval_releases_the_waiting_workflow() {
    let (store, gate) = gate_fixture();
    let gate = Arc::new(gate);
    let session = store.create(context("Austin")).await;

    let request = gate
        .request(&session.id, candidate())
        .await
        .expect("request accepted");

    let waiter = {
        let gate = Arc::clone(&gate);
        let id = request.id.clone();
        tokio::spawn(async move { gate.wait(&id).await })
    };

    // Resolution arrives from a different task, as it would from a
    // separate HTTP request.
    let resolved = gate
        .resolve(&request.id, Decision::Approved, Some("ops@example.com".into()))
        .await
        .expect("resolve accepted");
    assert_eq!(resolved.state, ApprovalState::Approved);
    assert_eq!(resolved.actor.as_deref(), Some("ops@example.com"));
    assert!(resolved.resolved_at.is_some());

    let state = waiter.await.expect("join").expect("wait succeeds");
    assert_eq!(state, ApprovalState::Approved);
}

#[tokio::test]
async fn wait_on_already_resolved_request_returns_immediately() {
    let (store, gate) = gate_fixture();
    let session = store.create(context("Austin")).await;

    let request = gate
        .request(&session.id, candidate())
        .await
        .expect("request accepted");
    gate.resolve(&request.id, Decision::Rejected, None)
        .await
        .expect("resolve accepted");

    let state = gate.wait(&request.id).await.expect("wait succeeds");
    assert_eq!(state, ApprovalState::Rejected);
}

#[tokio::test]
async fn rejection_completes_session_with_rejected_outcome() {
    let (store, gate) = gate_fixture();
    let session = store.create(context("Austin")).await;

    let request = gate
        .request(&session.id, candidate())
        .await
        .expect("request accepted");
    gate.resolve(&request.id, Decision::Rejected, Some("ops".into()))
        .await
        .expect("resolve accepted");

    let session = store.get(&session.id).await.expect("session exists");
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.outcome, Some(SessionOutcome::Rejected));
}

#[tokio::test]
async fn stale_resolution_fails_already_resolved() {
    let (store, gate) = gate_fixture();
    let session = store.create(context("Austin")).await;

    let request = gate
        .request(&session.id, candidate())
        .await
        .expect("request accepted");
    gate.resolve(&request.id, Decision::Rejected, None)
        .await
        .expect("first resolve accepted");

    let err = gate
        .resolve(&request.id, Decision::Approved, None)
        .await
        .expect_err("stale resolve rejected");
    assert!(matches!(err, AppError::AlreadyResolved(_)));

    // Never silently flipped by the stale attempt.
    let request = gate.get(&request.id).await.expect("request exists");
    assert_eq!(request.state, ApprovalState::Rejected);
}

#[tokio::test]
async fn resolve_unknown_request_fails_not_found() {
    let (_store, gate) = gate_fixture();

    let err = gate
        .resolve("missing", Decision::Approved, None)
        .await
        .expect_err("unknown request");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn pending_lookup_tracks_resolution() {
    let (store, gate) = gate_fixture();
    let session = store.create(context("Austin")).await;

    assert!(gate.pending_for_session(&session.id).await.is_none());

    let request = gate
        .request(&session.id, candidate())
        .await
        .expect("request accepted");
    assert!(gate.pending_for_session(&session.id).await.is_some());

    gate.resolve(&request.id, Decision::Approved, None)
        .await
        .expect("resolve accepted");
    assert!(gate.pending_for_session(&session.id).await.is_none());
}
