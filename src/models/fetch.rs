//! Fan-out task specification and fetch result models.

use serde::{Deserialize, Serialize};

/// Settlement status for a single fetch task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Source returned a structured record.
    Ok,
    /// Source reported a failure after retries were exhausted.
    Error,
    /// Task did not settle within the per-task timeout.
    Timeout,
}

/// One unit of work for the fan-out coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct TaskSpec {
    /// Key under which the result is recorded.
    pub task_id: String,
    /// Registered source to invoke.
    pub source_id: String,
    /// Source-specific parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl TaskSpec {
    /// Construct a spec where the task id mirrors the source id.
    #[must_use]
    pub fn for_source(source_id: &str, params: serde_json::Value) -> Self {
        Self {
            task_id: source_id.to_owned(),
            source_id: source_id.to_owned(),
            params,
        }
    }
}

/// Immutable record of one settled fetch task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct FetchResult {
    /// Source that produced (or failed to produce) the payload.
    pub source_id: String,
    /// Structured record when the task succeeded.
    pub payload: Option<serde_json::Value>,
    /// Settlement status.
    pub status: FetchStatus,
    /// Failure detail for `Error` results.
    pub detail: Option<String>,
}

impl FetchResult {
    /// Successful result carrying a structured payload.
    #[must_use]
    pub fn ok(source_id: &str, payload: serde_json::Value) -> Self {
        Self {
            source_id: source_id.to_owned(),
            payload: Some(payload),
            status: FetchStatus::Ok,
            detail: None,
        }
    }

    /// Failed result carrying the source's error detail.
    #[must_use]
    pub fn error(source_id: &str, detail: &str) -> Self {
        Self {
            source_id: source_id.to_owned(),
            payload: None,
            status: FetchStatus::Error,
            detail: Some(detail.to_owned()),
        }
    }

    /// Result for a task that outlived the per-task timeout.
    #[must_use]
    pub fn timeout(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_owned(),
            payload: None,
            status: FetchStatus::Timeout,
            detail: None,
        }
    }

    /// Whether the task produced usable data.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }
}
