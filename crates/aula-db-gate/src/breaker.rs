use crate::config::GateConfig;
use crate::events::GateEvent;
#[cfg(feature = "metrics")]
use metrics::gauge;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Breaker state as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BreakerState {
    /// Normal operation, acquisition attempts allowed.
    Closed = 0,
    /// Cooling down, every acquisition is rejected immediately.
    Open = 1,
}

impl BreakerState {
    fn from_u8(value: u8) -> Self {
        if value == 1 {
            BreakerState::Open
        } else {
            BreakerState::Closed
        }
    }
}

/// Point-in-time view of the breaker for health reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerSnapshot {
    /// State at the time of the snapshot, with cooldown expiry applied.
    pub state: BreakerState,
    /// Connectivity failures recorded since the last success.
    pub consecutive_failures: u32,
    /// Remaining cooldown when open.
    pub retry_after: Option<Duration>,
}

struct BreakerInner {
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

/// Process-wide circuit breaker shared by every in-flight acquisition.
///
/// Two states, no half-open: once the cooldown has elapsed the breaker
/// closes lazily at the next acquisition check, and the failure count is
/// kept so a failed probe re-opens it after a single failure. Only a
/// successful probe resets the count. All mutation happens through the
/// gate's failure and success recording under one lock; an atomic mirror
/// serves lock-free reads for health checks.
pub struct CircuitBreaker {
    inner: Arc<Mutex<BreakerInner>>,
    state_atomic: Arc<AtomicU8>,
}

impl Clone for CircuitBreaker {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            state_atomic: Arc::clone(&self.state_atomic),
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreaker {
    /// Creates a closed breaker with zero recorded failures.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BreakerInner {
                consecutive_failures: 0,
                open_until: None,
            })),
            state_atomic: Arc::new(AtomicU8::new(BreakerState::Closed as u8)),
        }
    }

    /// Checks whether an acquisition may proceed.
    ///
    /// While open, returns the remaining cooldown as the error. An expired
    /// cooldown transitions the breaker back to closed here; there is no
    /// background timer.
    pub(crate) async fn try_acquire(&self, config: &GateConfig) -> Result<(), Duration> {
        let mut inner = self.inner.lock().await;
        if let Some(until) = inner.open_until {
            let now = Instant::now();
            if now < until {
                let remaining = until - now;
                config.listeners.emit(&GateEvent::CallRejected {
                    name: config.name.clone(),
                    retry_after: remaining,
                });
                return Err(remaining);
            }
            // Cooldown elapsed. The failure count stays at or above the
            // threshold, so one more failure re-opens immediately.
            inner.open_until = None;
            self.set_state(BreakerState::Closed, config);
            config.listeners.emit(&GateEvent::BreakerClosed {
                name: config.name.clone(),
            });
        }
        Ok(())
    }

    /// Records a successful probe, resetting the breaker.
    pub(crate) async fn record_success(&self, config: &GateConfig) {
        let mut inner = self.inner.lock().await;
        let was_open = inner.open_until.is_some();
        inner.consecutive_failures = 0;
        inner.open_until = None;
        self.set_state(BreakerState::Closed, config);
        if was_open {
            config.listeners.emit(&GateEvent::BreakerClosed {
                name: config.name.clone(),
            });
        }
    }

    /// Records a connectivity failure, opening the breaker at the
    /// configured threshold. While already open, each further failure
    /// extends the cooldown window.
    pub(crate) async fn record_failure(&self, config: &GateConfig) {
        let mut inner = self.inner.lock().await;
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        if inner.consecutive_failures >= config.failure_threshold {
            let newly_opened = inner.open_until.is_none();
            inner.open_until = Some(Instant::now() + config.cooldown);
            self.set_state(BreakerState::Open, config);
            if newly_opened {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    gate = %config.name,
                    failures = inner.consecutive_failures,
                    cooldown_secs = config.cooldown.as_secs_f64(),
                    "circuit breaker opened"
                );
                config.listeners.emit(&GateEvent::BreakerOpened {
                    name: config.name.clone(),
                    failures: inner.consecutive_failures,
                });
            }
        }
    }

    /// Returns the state recorded at the last transition.
    ///
    /// Lock-free; safe from sync code. An expired cooldown is only
    /// observed at the next acquisition, so this may briefly report
    /// `Open` past expiry. Use [`snapshot`](Self::snapshot) for a view
    /// with expiry applied.
    pub fn state(&self) -> BreakerState {
        BreakerState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    /// Returns a consistent snapshot for health endpoints.
    pub async fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock().await;
        let remaining = inner
            .open_until
            .and_then(|until| until.checked_duration_since(Instant::now()));
        BreakerSnapshot {
            state: if remaining.is_some() {
                BreakerState::Open
            } else {
                BreakerState::Closed
            },
            consecutive_failures: inner.consecutive_failures,
            retry_after: remaining,
        }
    }

    /// Resets to closed with zero failures.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.consecutive_failures = 0;
        inner.open_until = None;
        self.state_atomic
            .store(BreakerState::Closed as u8, Ordering::Release);
    }

    fn set_state(&self, state: BreakerState, config: &GateConfig) {
        self.state_atomic.store(state as u8, Ordering::Release);
        #[cfg(feature = "metrics")]
        gauge!("aula_db_breaker_open", "gate" => config.name.clone()).set(match state {
            BreakerState::Closed => 0.0,
            BreakerState::Open => 1.0,
        });
        #[cfg(not(feature = "metrics"))]
        let _ = config;
    }
}
