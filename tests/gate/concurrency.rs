//! Shared-state correctness under concurrent acquisitions.

use super::support::{MockError, MockSource, Step, fast_config};
use aula_db_gate::{BreakerState, DbGate};
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Every connectivity failure lands in the shared counter; no updates are
/// lost when many requests fail at once.
#[tokio::test]
async fn concurrent_failures_are_all_counted() {
    let source = MockSource::scripted(vec![Step::LeaseFail(MockError::Timeout); 64]);
    let counters = source.counters();
    let gate = DbGate::new(
        source,
        fast_config()
            .max_retries(2)
            .initial_delay(Duration::from_millis(1))
            // high threshold: the breaker must not start rejecting mid-test
            .failure_threshold(1_000)
            .build(),
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let task_gate = gate.clone();
        handles.push(tokio::spawn(async move {
            task_gate.acquire().await.unwrap_err()
        }));
    }
    for handle in handles {
        let err = handle.await.unwrap();
        assert!(err.is_unavailable());
    }

    let attempts = counters.lease_calls.load(Ordering::SeqCst);
    assert_eq!(attempts, 16, "8 tasks, 2 attempts each");
    assert_eq!(
        gate.breaker().snapshot().await.consecutive_failures,
        attempts as u32
    );
}

/// While the breaker is open, concurrent calls are all rejected without a
/// single pool attempt.
#[tokio::test]
async fn open_breaker_rejects_concurrent_calls_without_attempts() {
    let source = MockSource::scripted([Step::LeaseFail(MockError::Timeout)]);
    let counters = source.counters();
    let gate = DbGate::new(
        source,
        fast_config()
            .max_retries(1)
            .failure_threshold(1)
            .cooldown(Duration::from_secs(30))
            .build(),
    );

    let _ = gate.acquire().await.unwrap_err();
    assert_eq!(gate.breaker().state(), BreakerState::Open);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let task_gate = gate.clone();
        handles.push(tokio::spawn(async move {
            task_gate.acquire().await.unwrap_err()
        }));
    }
    for handle in handles {
        let err = handle.await.unwrap();
        assert!(err.is_unavailable());
        assert!(err.retry_after().unwrap() <= Duration::from_secs(30));
    }

    assert_eq!(counters.lease_calls.load(Ordering::SeqCst), 1);
}
