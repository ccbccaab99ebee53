//! Postgres connection pool and gate wiring for the aula backend.
//!
//! This crate owns the concrete database stack: environment-derived
//! [`PoolSettings`], a lazily-connected `sqlx` pool behind
//! [`PoolManager`], and [`connect`], which assembles the
//! [`DbGate`](aula_db_gate::DbGate) that request handlers receive by
//! dependency injection.
//!
//! ```rust,no_run
//! use aula_db_pool::{connect, warm_up, PoolSettings};
//!
//! # async fn boot() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = PoolSettings::from_env()?;
//! let gate = connect(&settings)?;
//!
//! // Best-effort: a down database logs a warning and boot continues;
//! // requests answer 503 until it comes back.
//! warm_up(&gate, 3).await;
//!
//! let mut conn = gate.acquire().await?;
//! sqlx::query("SELECT 1").execute(&mut *conn).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Handlers translate [`GateError`](aula_db_gate::GateError) with
//! `http_status()` and `retry_after()`; business-level failures (missing
//! user, bad credentials) stay the handler's own concern.

pub use error::PoolError;
pub use manager::PoolManager;
pub use settings::{PoolSettings, SettingsError};
pub use warmup::warm_up;

mod error;
mod manager;
mod settings;
mod warmup;

use aula_db_gate::DbGate;

/// The gate type request handlers receive.
pub type PgGate = DbGate<PoolManager>;

/// Builds the pool from `settings` and wraps it in the resilience gate.
///
/// Never touches the network; the first acquisition pays for the
/// handshake.
///
/// # Errors
///
/// [`SettingsError::InvalidUrl`] when `DATABASE_URL` does not parse as a
/// Postgres connection string.
pub fn connect(settings: &PoolSettings) -> Result<PgGate, SettingsError> {
    let manager = PoolManager::new(settings)?;
    Ok(DbGate::new(manager, settings.gate_config()))
}
