//! Listener hooks fire on breaker transitions and rejections.

use super::support::{MockError, MockSource, Step, fast_config};
use aula_db_gate::DbGate;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn breaker_lifecycle_emits_hooks() {
    let opened_with = Arc::new(AtomicU32::new(0));
    let closed = Arc::new(AtomicUsize::new(0));
    let rejected = Arc::new(AtomicUsize::new(0));

    let o = Arc::clone(&opened_with);
    let c = Arc::clone(&closed);
    let r = Arc::clone(&rejected);

    let source = MockSource::scripted([Step::LeaseFail(MockError::Timeout), Step::Ok]);
    let gate = DbGate::new(
        source,
        fast_config()
            .max_retries(1)
            .failure_threshold(1)
            .cooldown(Duration::from_millis(40))
            .on_open(move |failures| {
                o.store(failures, Ordering::SeqCst);
            })
            .on_close(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .on_rejected(move |_retry_after| {
                r.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
    );

    // Failure trips the threshold-1 breaker.
    let _ = gate.acquire().await.unwrap_err();
    assert_eq!(opened_with.load(Ordering::SeqCst), 1);

    // Inside the cooldown: rejected.
    let _ = gate.acquire().await.unwrap_err();
    assert_eq!(rejected.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(60)).await;

    // Past the cooldown: lazy close fires, then a real attempt succeeds.
    let conn = gate.acquire().await.unwrap();
    drop(conn);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert_eq!(rejected.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retry_hook_reports_failed_attempt_and_delay() {
    let seen = Arc::new(AtomicUsize::new(0));
    let s = Arc::clone(&seen);

    let source = MockSource::scripted([Step::LeaseFail(MockError::Timeout), Step::Ok]);
    let gate = DbGate::new(
        source,
        fast_config()
            .max_retries(2)
            .initial_delay(Duration::from_millis(3))
            .failure_threshold(10)
            .on_retry(move |attempt, delay| {
                assert_eq!(attempt, 1);
                assert_eq!(delay, Duration::from_millis(3));
                s.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
    );

    let conn = gate.acquire().await.unwrap();
    drop(conn);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}
