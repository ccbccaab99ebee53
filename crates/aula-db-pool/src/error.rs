use aula_db_gate::{ClassifyFailure, FailureKind};
use std::time::Duration;
use thiserror::Error;

/// Failures raised while leasing or probing a pooled connection.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Error from the driver or the pool itself.
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// The liveness probe did not answer within the connect timeout.
    #[error("liveness probe timed out after {0:?}")]
    ProbeTimeout(Duration),
}

impl ClassifyFailure for PoolError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            PoolError::ProbeTimeout(_) => FailureKind::Connectivity,
            PoolError::Database(err) => classify_sqlx(err),
        }
    }
}

/// Transport-level failures count as connectivity, including pool
/// exhaustion; query- and type-level errors do not. Server-side errors are
/// classified by SQLSTATE class: 08 (connection exception), 57P
/// (shutdown), and 53 (insufficient resources) all mean the database
/// cannot take this connection right now.
fn classify_sqlx(err: &sqlx::Error) -> FailureKind {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => FailureKind::Connectivity,
        sqlx::Error::Database(db) => match db.code() {
            Some(code)
                if code.starts_with("08") || code.starts_with("57P") || code.starts_with("53") =>
            {
                FailureKind::Connectivity
            }
            _ => FailureKind::Unexpected,
        },
        _ => FailureKind::Unexpected,
    }
}
