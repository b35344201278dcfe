//! HTTP API tests: the full approve/reject flow driven over the wire,
//! the way a front-end collaborator would drive it.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use greenevent::api::{self, AppState};
use greenevent::config::GlobalConfig;
use greenevent::gate::ApprovalGate;
use greenevent::proposer::EmissionsAuditor;
use greenevent::sources;
use greenevent::store::SessionStore;
use greenevent::workflow::{MockBookingExecutor, Planner};

use super::test_helpers::test_config;

/// Bind the router on an ephemeral port and return its base URL.
async fn spawn_server(config: GlobalConfig) -> String {
    let config = Arc::new(config);
    let store = Arc::new(SessionStore::new());
    let gate = Arc::new(ApprovalGate::new(
        Arc::clone(&store),
        config.timeouts.approval_ttl(),
    ));
    let planner = Arc::new(Planner::new(
        Arc::clone(&config),
        Arc::clone(&store),
        Arc::clone(&gate),
        Arc::new(sources::default_registry()),
        Arc::new(EmissionsAuditor),
        Arc::new(MockBookingExecutor),
    ));
    let state = AppState {
        config,
        store,
        gate,
        planner,
    };

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    format!("http://{addr}")
}

/// Poll the session until it reports the expected status.
async fn poll_for_status(
    client: &reqwest::Client,
    base: &str,
    session_id: &str,
    status: &str,
) -> serde_json::Value {
    for _ in 0..200 {
        let body: serde_json::Value = client
            .get(format!("{base}/sessions/{session_id}"))
            .send()
            .await
            .expect("get session")
            .json()
            .await
            .expect("session json");
        if body["status"] == status {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {session_id} never reached status {status}");
}

#[tokio::test]
async fn health_endpoint_responds_ok() {
    let base = spawn_server(test_config()).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/health"))
        .send()
        .await
        .expect("health request");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "ok");
}

#[tokio::test]
async fn full_flow_over_http_approves_and_books() {
    let base = spawn_server(test_config()).await;
    let client = reqwest::Client::new();

    // Create a session; the workflow starts in the background.
    let resp = client
        .post(format!("{base}/sessions"))
        .json(&json!({"city": "Austin", "date": "2025-06-01", "attendees": 40}))
        .send()
        .await
        .expect("create session");
    assert_eq!(resp.status(), 202);
    let created: serde_json::Value = resp.json().await.expect("session json");
    let session_id = created["id"].as_str().expect("session id").to_owned();
    assert_eq!(created["context"]["city"], "Austin");

    // Poll until the workflow suspends at the gate.
    let awaiting = poll_for_status(&client, &base, &session_id, "awaiting_approval").await;
    assert!(awaiting["candidate"]["justification"]
        .as_str()
        .is_some_and(|j| j.contains("EcoHub Loft")));

    // Resolution happens from a separate request holding only the ids.
    let request_id = find_request_id(&client, &base, &session_id).await;

    let resp = client
        .post(format!("{base}/approvals/{request_id}/resolve"))
        .json(&json!({"decision": "approved", "actor": "ops@example.com"}))
        .send()
        .await
        .expect("resolve request");
    assert_eq!(resp.status(), 200);
    let resolved: serde_json::Value = resp.json().await.expect("approval json");
    assert_eq!(resolved["state"], "approved");

    // The released workflow completes with a booking.
    let completed = poll_for_status(&client, &base, &session_id, "completed").await;
    assert_eq!(completed["outcome"]["kind"], "booked");
    assert_eq!(completed["outcome"]["venue"], "EcoHub Loft");
}

#[tokio::test]
async fn stale_resolution_over_http_returns_conflict() {
    let base = spawn_server(test_config()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/sessions"))
        .json(&json!({"date": "2025-06-01"}))
        .send()
        .await
        .expect("create session");
    let created: serde_json::Value = resp.json().await.expect("session json");
    let session_id = created["id"].as_str().expect("session id").to_owned();
    // Default city applies when omitted.
    assert_eq!(created["context"]["city"], "Bengaluru");

    poll_for_status(&client, &base, &session_id, "awaiting_approval").await;
    let request_id = find_request_id(&client, &base, &session_id).await;

    let resp = client
        .post(format!("{base}/approvals/{request_id}/resolve"))
        .json(&json!({"decision": "rejected"}))
        .send()
        .await
        .expect("first resolve");
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{base}/approvals/{request_id}/resolve"))
        .json(&json!({"decision": "approved"}))
        .send()
        .await
        .expect("second resolve");
    assert_eq!(resp.status(), 409);

    let completed = poll_for_status(&client, &base, &session_id, "completed").await;
    assert_eq!(completed["outcome"]["kind"], "rejected");
}

#[tokio::test]
async fn unknown_ids_map_to_not_found() {
    let base = spawn_server(test_config()).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/sessions/missing"))
        .send()
        .await
        .expect("get session");
    assert_eq!(resp.status(), 404);

    let resp = client
        .post(format!("{base}/approvals/missing/resolve"))
        .json(&json!({"decision": "approved"}))
        .send()
        .await
        .expect("resolve request");
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn cancel_releases_a_suspended_workflow() {
    let base = spawn_server(test_config()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/sessions"))
        .json(&json!({"city": "Austin", "date": "2025-06-01"}))
        .send()
        .await
        .expect("create session");
    let created: serde_json::Value = resp.json().await.expect("session json");
    let session_id = created["id"].as_str().expect("session id").to_owned();

    poll_for_status(&client, &base, &session_id, "awaiting_approval").await;

    let resp = client
        .post(format!("{base}/sessions/{session_id}/cancel"))
        .send()
        .await
        .expect("cancel session");
    assert_eq!(resp.status(), 200);
    let cancelled: serde_json::Value = resp.json().await.expect("session json");
    assert_eq!(cancelled["status"], "cancelled");
}

/// Recover the pending approval request id for a session.
async fn find_request_id(client: &reqwest::Client, base: &str, session_id: &str) -> String {
    let body: serde_json::Value = client
        .get(format!("{base}/sessions/{session_id}/approval"))
        .send()
        .await
        .expect("pending approval lookup")
        .json()
        .await
        .expect("approval json");
    body["id"].as_str().expect("request id").to_owned()
}
