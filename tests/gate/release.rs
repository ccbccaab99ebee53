//! Release accounting: a leased connection is returned or discarded
//! exactly once on every exit path.

use super::support::{MockError, MockSource, Step, fast_config};
use aula_db_gate::DbGate;
use std::sync::atomic::Ordering;

/// The connection goes back even when the handler fails with a business
/// error after acquiring it.
#[tokio::test]
async fn released_once_despite_business_error() {
    let source = MockSource::healthy();
    let counters = source.counters();
    let gate = DbGate::new(source, fast_config().build());

    {
        let _conn = gate.acquire().await.unwrap();
        // Handler-level failure; nothing to do with the database.
        let lookup: Result<(), &str> = Err("usuario no encontrado");
        assert!(lookup.is_err());
    }

    assert_eq!(counters.granted.load(Ordering::SeqCst), 1);
    assert_eq!(counters.released.load(Ordering::SeqCst), 1);
}

/// A probe failure disposes of the dead connection exactly once, and the
/// recovered attempt's connection is released exactly once.
#[tokio::test]
async fn released_once_when_probe_fails_then_recovers() {
    let source = MockSource::scripted([Step::ProbeFail(MockError::Timeout), Step::Ok]);
    let counters = source.counters();
    let gate = DbGate::new(
        source,
        fast_config().max_retries(2).failure_threshold(10).build(),
    );

    {
        let _conn = gate.acquire().await.unwrap();
        assert_eq!(counters.released.load(Ordering::SeqCst), 1, "dead conn already gone");
    }

    assert_eq!(counters.granted.load(Ordering::SeqCst), 2);
    assert_eq!(counters.discarded.load(Ordering::SeqCst), 1);
    assert_eq!(counters.released.load(Ordering::SeqCst), 2);
}

/// Unwinding out of a handler still returns the connection.
#[tokio::test]
async fn released_during_unwind() {
    let source = MockSource::healthy();
    let counters = source.counters();
    let gate = DbGate::new(source, fast_config().build());

    let task_gate = gate.clone();
    let handle = tokio::spawn(async move {
        let _conn = task_gate.acquire().await.unwrap();
        panic!("handler blew up");
    });
    assert!(handle.await.is_err());

    assert_eq!(counters.granted.load(Ordering::SeqCst), 1);
    assert_eq!(counters.released.load(Ordering::SeqCst), 1);
}

/// Repeated acquisitions never leak: grants and releases stay balanced.
#[tokio::test]
async fn grants_and_releases_stay_balanced() {
    let source = MockSource::scripted([
        Step::Ok,
        Step::ProbeFail(MockError::Timeout),
        Step::Ok,
        Step::Ok,
    ]);
    let counters = source.counters();
    let gate = DbGate::new(
        source,
        fast_config().max_retries(2).failure_threshold(10).build(),
    );

    for _ in 0..3 {
        let conn = gate.acquire().await.unwrap();
        drop(conn);
    }

    let granted = counters.granted.load(Ordering::SeqCst);
    let released = counters.released.load(Ordering::SeqCst);
    assert_eq!(granted, 4, "three successes plus one dead connection");
    assert_eq!(granted, released);
}
