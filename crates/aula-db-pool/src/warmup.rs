use aula_db_gate::{ConnectionSource, DbGate};
use std::time::Duration;

/// Pause between warm-up probes, so a dead database is not hammered at
/// boot.
const WARMUP_PAUSE: Duration = Duration::from_secs(1);

/// Probes the database a bounded number of times at process boot.
///
/// Returns `true` as soon as one acquisition succeeds. Failure is logged
/// and never fatal: the process starts serving either way, and endpoints
/// answer 503 until the database comes back. Probes go through the normal
/// acquire path, so their failures feed the breaker like any others.
pub async fn warm_up<S: ConnectionSource>(gate: &DbGate<S>, attempts: u32) -> bool
where
    S::Error: std::fmt::Display,
{
    for attempt in 1..=attempts {
        match gate.acquire().await {
            Ok(_conn) => {
                tracing::info!(attempt, "database reachable, pool warmed up");
                return true;
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "database warm-up probe failed");
            }
        }
        if attempt < attempts {
            tokio::time::sleep(WARMUP_PAUSE).await;
        }
    }
    tracing::warn!(
        attempts,
        "database unreachable after warm-up, serving anyway"
    );
    false
}
