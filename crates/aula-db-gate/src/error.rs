use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`DbGate::acquire`](crate::DbGate::acquire).
#[derive(Debug, Error)]
pub enum GateError<E> {
    /// The database is unavailable: the breaker is open, or every retry
    /// was exhausted by connectivity failures.
    #[error("database unavailable, retry in {}s", retry_after.as_secs())]
    Unavailable {
        /// Cooldown hint for the caller's `Retry-After` header.
        retry_after: Duration,
    },

    /// A non-connectivity failure while leasing or probing. Indicates a
    /// bug or misconfiguration rather than an outage; never retried.
    #[error("unexpected database error: {0}")]
    Internal(E),
}

impl<E> GateError<E> {
    /// True when this error maps to `503 Service Unavailable`.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, GateError::Unavailable { .. })
    }

    /// The `Retry-After` hint, when present.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GateError::Unavailable { retry_after } => Some(*retry_after),
            GateError::Internal(_) => None,
        }
    }

    /// HTTP status a route handler should answer with: 503 or 500.
    pub fn http_status(&self) -> u16 {
        match self {
            GateError::Unavailable { .. } => 503,
            GateError::Internal(_) => 500,
        }
    }

    /// The underlying source error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            GateError::Internal(e) => Some(e),
            GateError::Unavailable { .. } => None,
        }
    }
}
