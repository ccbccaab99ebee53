use std::fmt;

/// Coarse failure taxonomy the gate reacts to.
///
/// Only `Connectivity` failures are retried and counted by the circuit
/// breaker. Everything else is surfaced immediately as an internal error:
/// retrying a bug would only disguise it as a timeout, and letting it open
/// the breaker would take the database offline for unrelated requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport-level failure: timeout, refused connection, broken pipe,
    /// TLS failure, or an exhausted pool.
    Connectivity,
    /// Any other failure observed while leasing or probing.
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Connectivity => write!(f, "connectivity"),
            FailureKind::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// Implemented by a source's error type so the gate can tell a transient
/// outage apart from a bug.
pub trait ClassifyFailure {
    /// Classifies this failure.
    fn failure_kind(&self) -> FailureKind;

    /// Shorthand for `failure_kind() == FailureKind::Connectivity`.
    fn is_connectivity(&self) -> bool {
        self.failure_kind() == FailureKind::Connectivity
    }
}
