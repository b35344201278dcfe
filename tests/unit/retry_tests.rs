use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use greenevent::config::RetryConfig;
use greenevent::coordinator::retry::with_backoff;
use greenevent::AppError;

fn policy(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay_ms: 10,
        max_delay_ms: 40,
    }
}

#[tokio::test(start_paused = true)]
async fn returns_first_success_without_retrying() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let value = with_backoff(&policy(3), move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(42_u32)
        }
    })
    .await
    .expect("succeeds");

    assert_eq!(value, 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn retries_until_success_within_budget() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let value = with_backoff(&policy(3), move || {
        let counter = Arc::clone(&counter);
        async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt < 3 {
                Err(AppError::Source("rate limited".into()))
            } else {
                Ok("venue data")
            }
        }
    })
    .await
    .expect("third attempt succeeds");

    assert_eq!(value, "venue data");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_returns_last_error() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let err = with_backoff::<(), _, _>(&policy(3), move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Source("still down".into()))
        }
    })
    .await
    .expect_err("budget exhausted");

    assert!(matches!(err, AppError::Source(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn oversized_initial_delay_is_clamped_to_cap() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let policy = RetryConfig {
        max_attempts: 3,
        initial_delay_ms: u64::MAX,
        max_delay_ms: 40,
    };
    let start = tokio::time::Instant::now();

    let value = with_backoff(&policy, move || {
        let counter = Arc::clone(&counter);
        async move {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt < 3 {
                Err(AppError::Source("rate limited".into()))
            } else {
                Ok("venue data")
            }
        }
    })
    .await
    .expect("third attempt succeeds");

    assert_eq!(value, "venue data");
    assert_eq!(start.elapsed(), std::time::Duration::from_millis(80));
}

#[tokio::test(start_paused = true)]
async fn single_attempt_policy_never_sleeps() {
    let start = tokio::time::Instant::now();

    let err = with_backoff::<(), _, _>(&policy(1), || async {
        Err(AppError::Source("boom".into()))
    })
    .await
    .expect_err("single attempt fails");

    assert!(matches!(err, AppError::Source(_)));
    assert_eq!(start.elapsed(), std::time::Duration::ZERO);
}
