use crate::backoff::Backoff;
use crate::events::{GateEvent, GateListeners};
#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge};
#[cfg(feature = "metrics")]
use std::sync::Once;
use std::time::Duration;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Configuration for a [`DbGate`](crate::DbGate).
pub struct GateConfig {
    pub(crate) max_retries: u32,
    pub(crate) backoff: Backoff,
    pub(crate) failure_threshold: u32,
    pub(crate) cooldown: Duration,
    pub(crate) listeners: GateListeners,
    pub(crate) name: String,
}

impl GateConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> GateConfigBuilder {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "aula_db_acquisitions_total",
                "Connection acquisitions through the gate, by outcome"
            );
            describe_counter!(
                "aula_db_retries_total",
                "Retries scheduled after connectivity failures"
            );
            describe_gauge!(
                "aula_db_breaker_open",
                "1 while the circuit breaker is open, 0 otherwise"
            );
        });
        GateConfigBuilder::new()
    }

    /// Total connection attempts per acquisition.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Consecutive failures before the breaker opens.
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// How long the breaker stays open.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Instance name used in events and logs.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`GateConfig`].
pub struct GateConfigBuilder {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    jitter: f64,
    failure_threshold: u32,
    cooldown: Duration,
    listeners: GateListeners,
    name: String,
}

impl Default for GateConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GateConfigBuilder {
    /// Creates a builder with defaults.
    ///
    /// Defaults:
    /// - max_retries: 3 (total attempts, including the first)
    /// - initial_delay: 200ms
    /// - max_delay: 5s
    /// - jitter: 0.25
    /// - failure_threshold: 3 consecutive failures
    /// - cooldown: 30s
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: 0.25,
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
            listeners: GateListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the total connection attempts per acquisition, including the
    /// first. Values below 1 are treated as 1.
    ///
    /// Default: 3
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Sets the delay before the first retry.
    ///
    /// Default: 200ms
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the backoff delay ceiling.
    ///
    /// Default: 5 seconds
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the jitter fraction added on top of each delay, clamped to
    /// `0.0..=1.0`.
    ///
    /// Default: 0.25
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sets the consecutive connectivity failures at which the breaker
    /// opens. Values below 1 are treated as 1.
    ///
    /// Default: 3
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Sets how long the breaker stays open once tripped.
    ///
    /// Default: 30 seconds
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Sets the instance name used in events and logs.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked when a retry is scheduled.
    ///
    /// Receives the attempt that failed (1-indexed) and the delay before
    /// the next attempt.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, Duration) + Send + Sync + 'static,
    {
        self.listeners.add(move |event| {
            if let GateEvent::RetryScheduled { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        });
        self
    }

    /// Registers a callback invoked when the breaker rejects a call
    /// without attempting a connection. Receives the remaining cooldown.
    pub fn on_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.listeners.add(move |event| {
            if let GateEvent::CallRejected { retry_after, .. } = event {
                f(*retry_after);
            }
        });
        self
    }

    /// Registers a callback invoked when the breaker opens. Receives the
    /// failure count at the moment of opening.
    pub fn on_open<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.listeners.add(move |event| {
            if let GateEvent::BreakerOpened { failures, .. } = event {
                f(*failures);
            }
        });
        self
    }

    /// Registers a callback invoked when the breaker closes again.
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.add(move |event| {
            if matches!(event, GateEvent::BreakerClosed { .. }) {
                f();
            }
        });
        self
    }

    /// Registers a raw listener receiving every [`GateEvent`].
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&GateEvent) + Send + Sync + 'static,
    {
        self.listeners.add(f);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> GateConfig {
        GateConfig {
            max_retries: self.max_retries,
            backoff: Backoff::new(self.initial_delay)
                .cap(self.max_delay)
                .jitter(self.jitter),
            failure_threshold: self.failure_threshold,
            cooldown: self.cooldown,
            listeners: self.listeners,
            name: self.name,
        }
    }
}
