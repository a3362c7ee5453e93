//! Retry Executor Integration Tests
//!
//! Tests recovery mid-sequence and the wall-clock backoff pacing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use feedcast::core::{run_with_retry, RetryPolicy};

#[tokio::test]
async fn test_transient_failure_then_success() {
    let calls = AtomicUsize::new(0);

    let result: Result<&str, String> = run_with_retry(&RetryPolicy::immediate(3), "op", || {
        let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if attempt < 3 {
                Err(format!("transient failure {}", attempt))
            } else {
                Ok("recovered")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "recovered");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_delays_double() {
    let policy = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_secs(5),
    };

    let start = tokio::time::Instant::now();
    let result: Result<(), &str> = run_with_retry(&policy, "op", || async { Err("down") }).await;

    assert!(result.is_err());
    // Two sleeps happened between three attempts: 5s then 10s.
    assert_eq!(start.elapsed(), Duration::from_secs(15));
}
