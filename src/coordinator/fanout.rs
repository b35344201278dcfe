//! Concurrent fan-out over fetch sources with partial-failure tolerance.
//!
//! All tasks are launched together and the call returns once every
//! task has settled. A task that fails or outlives the per-task
//! timeout settles as an `error`/`timeout` result rather than aborting
//! the batch; downstream consumers must tolerate partial data.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::RetryConfig;
use crate::coordinator::retry;
use crate::models::fetch::{FetchResult, TaskSpec};
use crate::models::session::EventContext;
use crate::sources::SourceRegistry;
use crate::store::SessionStore;
use crate::Result;

/// Run all task specs concurrently and merge settled results into the
/// session.
///
/// The returned mapping is keyed by task id. Completion order between
/// tasks carries no meaning; only the mapping is order-significant.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the session does not exist. Task
/// failures never surface as errors here.
pub async fn fetch_all(
    store: &SessionStore,
    session_id: &str,
    specs: &[TaskSpec],
    registry: &SourceRegistry,
    per_task_timeout: Duration,
    retry_policy: &RetryConfig,
) -> Result<HashMap<String, FetchResult>> {
    let span = info_span!("fetch_all", session_id, tasks = specs.len());

    async move {
        let context = store.get(session_id).await?.context;

        let tasks = specs.iter().map(|spec| {
            run_task(
                spec,
                context.clone(),
                registry,
                per_task_timeout,
                retry_policy,
            )
        });
        let settled: Vec<(String, FetchResult)> = join_all(tasks).await;

        let results: HashMap<String, FetchResult> = settled.into_iter().collect();

        let merged = results.clone();
        store
            .update(session_id, move |session| {
                session.fetch_results.extend(merged);
            })
            .await?;

        info!(
            settled = results.len(),
            ok = results.values().filter(|r| r.is_ok()).count(),
            "fan-out settled"
        );
        Ok(results)
    }
    .instrument(span)
    .await
}

/// Settle a single task, folding failure and timeout into the result.
async fn run_task(
    spec: &TaskSpec,
    context: EventContext,
    registry: &SourceRegistry,
    per_task_timeout: Duration,
    retry_policy: &RetryConfig,
) -> (String, FetchResult) {
    let task_id = spec.task_id.clone();

    let Some(source) = registry.get(&spec.source_id) else {
        warn!(%task_id, source_id = %spec.source_id, "unknown fetch source");
        return (
            task_id,
            FetchResult::error(&spec.source_id, "unknown source"),
        );
    };

    let attempt = retry::with_backoff(retry_policy, || {
        source.fetch(context.clone(), spec.params.clone())
    });

    let result = match tokio::time::timeout(per_task_timeout, attempt).await {
        Ok(Ok(payload)) => {
            debug!(%task_id, source_id = %spec.source_id, "task settled ok");
            FetchResult::ok(&spec.source_id, payload)
        }
        Ok(Err(err)) => {
            warn!(%task_id, source_id = %spec.source_id, %err, "task settled with error");
            FetchResult::error(&spec.source_id, &err.to_string())
        }
        Err(_elapsed) => {
            warn!(%task_id, source_id = %spec.source_id, "task timed out");
            FetchResult::timeout(&spec.source_id)
        }
    };

    (task_id, result)
}
