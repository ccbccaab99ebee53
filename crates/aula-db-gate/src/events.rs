//! Observability hooks for the gate.

use std::sync::Arc;
use std::time::Duration;

/// Events emitted while acquiring a connection.
#[derive(Debug, Clone)]
pub enum GateEvent {
    /// A liveness probe succeeded and a connection was yielded.
    ProbeSucceeded {
        /// Gate instance name.
        name: String,
        /// Total attempts this acquisition took, including the first.
        attempts: u32,
    },
    /// A lease or probe failed with a connectivity-class error.
    ProbeFailed {
        /// Gate instance name.
        name: String,
        /// The attempt that failed (1-indexed).
        attempt: u32,
    },
    /// A retry was scheduled after a failed attempt.
    RetryScheduled {
        /// Gate instance name.
        name: String,
        /// The attempt that just failed (1-indexed).
        attempt: u32,
        /// Sleep before the next attempt.
        delay: Duration,
    },
    /// The breaker rejected the call without touching the pool.
    CallRejected {
        /// Gate instance name.
        name: String,
        /// Remaining cooldown.
        retry_after: Duration,
    },
    /// The breaker opened after reaching the failure threshold.
    BreakerOpened {
        /// Gate instance name.
        name: String,
        /// Consecutive failures at the moment of opening.
        failures: u32,
    },
    /// The breaker returned to normal operation.
    BreakerClosed {
        /// Gate instance name.
        name: String,
    },
}

type Listener = Arc<dyn Fn(&GateEvent) + Send + Sync>;

/// Registered event callbacks.
///
/// A panicking listener is isolated so the remaining listeners still run.
#[derive(Clone, Default)]
pub struct GateListeners {
    listeners: Vec<Listener>,
}

impl GateListeners {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Registers a callback.
    pub fn add<F>(&mut self, f: F)
    where
        F: Fn(&GateEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(f));
    }

    /// Delivers `event` to every listener.
    pub fn emit(&self, event: &GateEvent) {
        for listener in &self.listeners {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener(event)));
        }
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
