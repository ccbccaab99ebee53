//! Resilient acquisition of database connections.
//!
//! [`DbGate`] sits between request handlers and a connection pool. Every
//! lease goes through a liveness probe, bounded retries with exponential
//! backoff and jitter, and a process-wide circuit breaker that fails fast
//! while the database is judged unavailable — handlers get either a
//! verified, live connection or an error that translates directly to an
//! HTTP response, instead of a request that hangs on a dead socket.
//!
//! ## States
//!
//! - **Closed**: normal operation, acquisition attempts allowed
//! - **Open**: cooldown after repeated connectivity failures; every
//!   acquisition is rejected immediately with a retry-after hint
//!
//! There is no half-open state. The breaker closes lazily once the
//! cooldown has elapsed, keeping its failure count, and the next real
//! attempt decides what happens: a successful probe resets everything, one
//! more connectivity failure re-opens the cooldown.
//!
//! ## Usage
//!
//! The gate is generic over a [`ConnectionSource`], so it can be driven by
//! a real pool or by an in-memory mock:
//!
//! ```rust
//! use aula_db_gate::{
//!     ClassifyFailure, ConnectionSource, DbGate, FailureKind, GateConfig,
//! };
//! use futures::future::BoxFuture;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct Refused;
//!
//! impl std::fmt::Display for Refused {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "connection refused")
//!     }
//! }
//!
//! impl ClassifyFailure for Refused {
//!     fn failure_kind(&self) -> FailureKind {
//!         FailureKind::Connectivity
//!     }
//! }
//!
//! struct AlwaysDown;
//!
//! impl ConnectionSource for AlwaysDown {
//!     type Conn = ();
//!     type Error = Refused;
//!
//!     fn lease(&self) -> BoxFuture<'_, Result<(), Refused>> {
//!         Box::pin(async { Err(Refused) })
//!     }
//!
//!     fn probe<'a>(&'a self, _conn: &'a mut ()) -> BoxFuture<'a, Result<(), Refused>> {
//!         Box::pin(async { Ok(()) })
//!     }
//! }
//!
//! # async fn example() {
//! let config = GateConfig::builder()
//!     .max_retries(2)
//!     .initial_delay(Duration::from_millis(10))
//!     .failure_threshold(3)
//!     .name("docs")
//!     .build();
//!
//! let gate = DbGate::new(AlwaysDown, config);
//!
//! let err = gate.acquire().await.unwrap_err();
//! assert_eq!(err.http_status(), 503);
//! # }
//! ```
//!
//! ## Error handling
//!
//! [`GateError`] has exactly two variants, matching what a route handler
//! needs to produce:
//!
//! - [`GateError::Unavailable`] → `503 Service Unavailable` with a
//!   `Retry-After` header from [`GateError::retry_after`]. Raised both
//!   when the breaker rejects the call outright and when every retry was
//!   spent on connectivity failures; the two cases differ only in latency.
//! - [`GateError::Internal`] → `500 Internal Server Error`. Raised for
//!   non-connectivity failures, which are never retried and never touch
//!   breaker state.
//!
//! ## Feature flags
//!
//! - `metrics`: acquisition counters and a breaker-state gauge via the
//!   `metrics` crate
//! - `tracing`: logging via the `tracing` crate

pub use backoff::Backoff;
pub use breaker::{BreakerSnapshot, BreakerState, CircuitBreaker};
pub use classifier::{ClassifyFailure, FailureKind};
pub use config::{GateConfig, GateConfigBuilder};
pub use error::GateError;
pub use events::{GateEvent, GateListeners};
pub use source::ConnectionSource;

mod backoff;
mod breaker;
mod classifier;
mod config;
mod error;
mod events;
mod source;

#[cfg(feature = "metrics")]
use metrics::counter;
use std::sync::Arc;

/// Resilience gate in front of a connection pool.
///
/// One gate is constructed at startup and handed to request handlers by
/// dependency injection; clones share the same breaker and source.
pub struct DbGate<S> {
    source: Arc<S>,
    config: Arc<GateConfig>,
    breaker: CircuitBreaker,
}

impl<S> Clone for DbGate<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            config: Arc::clone(&self.config),
            breaker: self.breaker.clone(),
        }
    }
}

impl<S: ConnectionSource> DbGate<S> {
    /// Creates a gate over `source` with a fresh, closed breaker.
    pub fn new(source: S, config: GateConfig) -> Self {
        Self {
            source: Arc::new(source),
            config: Arc::new(config),
            breaker: CircuitBreaker::new(),
        }
    }

    /// The shared circuit breaker, for health endpoints and tests.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// The underlying connection source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Acquires a verified, live connection.
    ///
    /// The returned connection is scoped: dropping it — on success, on a
    /// business error, or during unwinding — returns it to the pool
    /// exactly once.
    ///
    /// # Errors
    ///
    /// [`GateError::Unavailable`] when the breaker is open or every retry
    /// failed with a connectivity-class error; [`GateError::Internal`] on
    /// the first non-connectivity failure, without retrying.
    ///
    /// # Cancellation
    ///
    /// Safe to race against a request deadline: the backoff sleep is a
    /// plain timer await, and no connection is held across it.
    pub async fn acquire(&self) -> Result<S::Conn, GateError<S::Error>> {
        if let Err(retry_after) = self.breaker.try_acquire(&self.config).await {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                gate = %self.config.name,
                retry_after_secs = retry_after.as_secs_f64(),
                "breaker open, rejecting acquisition"
            );
            #[cfg(feature = "metrics")]
            counter!("aula_db_acquisitions_total", "gate" => self.config.name.clone(), "outcome" => "rejected")
                .increment(1);
            return Err(GateError::Unavailable { retry_after });
        }

        let mut attempt: u32 = 1;
        loop {
            match self.attempt_once().await {
                Ok(conn) => {
                    self.breaker.record_success(&self.config).await;
                    self.config.listeners.emit(&GateEvent::ProbeSucceeded {
                        name: self.config.name.clone(),
                        attempts: attempt,
                    });
                    #[cfg(feature = "metrics")]
                    counter!("aula_db_acquisitions_total", "gate" => self.config.name.clone(), "outcome" => "success")
                        .increment(1);
                    return Ok(conn);
                }
                Err(err) if err.is_connectivity() => {
                    self.config.listeners.emit(&GateEvent::ProbeFailed {
                        name: self.config.name.clone(),
                        attempt,
                    });
                    self.breaker.record_failure(&self.config).await;

                    if attempt >= self.config.max_retries {
                        #[cfg(feature = "tracing")]
                        tracing::error!(
                            gate = %self.config.name,
                            attempts = attempt,
                            "database unreachable, retries exhausted"
                        );
                        #[cfg(feature = "metrics")]
                        counter!("aula_db_acquisitions_total", "gate" => self.config.name.clone(), "outcome" => "unavailable")
                            .increment(1);
                        return Err(GateError::Unavailable {
                            retry_after: self.config.cooldown,
                        });
                    }

                    let delay = self.config.backoff.delay_for(attempt - 1);
                    self.config.listeners.emit(&GateEvent::RetryScheduled {
                        name: self.config.name.clone(),
                        attempt,
                        delay,
                    });
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        gate = %self.config.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "connectivity failure, backing off"
                    );
                    #[cfg(feature = "metrics")]
                    counter!("aula_db_retries_total", "gate" => self.config.name.clone())
                        .increment(1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    // Not an outage. Surface it untouched so the bug stays
                    // visible, and leave the breaker alone.
                    #[cfg(feature = "metrics")]
                    counter!("aula_db_acquisitions_total", "gate" => self.config.name.clone(), "outcome" => "internal")
                        .increment(1);
                    return Err(GateError::Internal(err));
                }
            }
        }
    }

    /// One lease + probe round. A connection that fails its probe is
    /// handed back to the source for disposal, never reused.
    async fn attempt_once(&self) -> Result<S::Conn, S::Error> {
        let mut conn = self.source.lease().await?;
        match self.source.probe(&mut conn).await {
            Ok(()) => Ok(conn),
            Err(err) => {
                self.source.discard(conn).await;
                Err(err)
            }
        }
    }
}
