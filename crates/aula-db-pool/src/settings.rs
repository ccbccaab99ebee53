use aula_db_gate::GateConfig;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Rejected startup configuration.
///
/// Raised once at boot; a process with a bad surface never starts serving.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// `DATABASE_URL` was not provided.
    #[error("DATABASE_URL is not set; configure it in the deployment environment")]
    MissingDatabaseUrl,

    /// A recognized key held a value that does not parse.
    #[error("invalid value {value:?} for {key}")]
    Invalid {
        /// The offending environment key.
        key: &'static str,
        /// The raw value as found.
        value: String,
    },

    /// `DATABASE_URL` does not parse as a Postgres connection string.
    #[error("invalid DATABASE_URL: {0}")]
    InvalidUrl(String),
}

/// Environment surface for the database layer, read once at process start.
///
/// | Key | Default | Effect |
/// |---|---|---|
/// | `DATABASE_URL` | required | Postgres connection string |
/// | `POOL_SIZE` | 5 | connections kept open |
/// | `MAX_OVERFLOW` | 10 | extra connections under load |
/// | `POOL_TIMEOUT` | 30 | seconds to wait for a free connection |
/// | `POOL_RECYCLE` | 1800 | seconds before a connection is recycled |
/// | `CONNECT_TIMEOUT` | 5 | seconds for the liveness probe to answer |
/// | `CB_FAILURE_THRESHOLD` | 3 | consecutive failures before the breaker opens |
/// | `CB_COOLDOWN` | 30 | seconds the breaker stays open |
/// | `DB_RETRIES` | 3 | connection attempts per acquisition |
/// | `DB_INITIAL_DELAY` | 0.2 | seconds before the first retry |
///
/// Duration-valued keys accept fractional seconds. Managed Postgres
/// offerings require TLS, so a URL without an explicit `sslmode` gets
/// `sslmode=require` appended.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Connection string, with `sslmode` guaranteed present.
    pub database_url: String,
    /// Connections kept open.
    pub pool_size: u32,
    /// Extra connections allowed under load.
    pub max_overflow: u32,
    /// Wait for a free connection before failing the lease.
    pub pool_timeout: Duration,
    /// Connection lifetime before recycling.
    pub pool_recycle: Duration,
    /// Deadline for the liveness probe.
    pub connect_timeout: Duration,
    /// Consecutive failures before the breaker opens.
    pub failure_threshold: u32,
    /// How long the breaker stays open.
    pub cooldown: Duration,
    /// Connection attempts per acquisition.
    pub retries: u32,
    /// Backoff delay before the first retry.
    pub initial_delay: Duration,
}

impl PoolSettings {
    /// Reads the surface from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the surface from an arbitrary lookup. Tests use this to stay
    /// off the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut database_url = lookup("DATABASE_URL").ok_or(SettingsError::MissingDatabaseUrl)?;
        if !database_url.contains("sslmode=") {
            let sep = if database_url.contains('?') { '&' } else { '?' };
            database_url = format!("{database_url}{sep}sslmode=require");
        }

        Ok(Self {
            database_url,
            pool_size: int(&lookup, "POOL_SIZE", 5)?,
            max_overflow: int(&lookup, "MAX_OVERFLOW", 10)?,
            pool_timeout: seconds(&lookup, "POOL_TIMEOUT", 30.0)?,
            pool_recycle: seconds(&lookup, "POOL_RECYCLE", 1800.0)?,
            connect_timeout: seconds(&lookup, "CONNECT_TIMEOUT", 5.0)?,
            failure_threshold: int(&lookup, "CB_FAILURE_THRESHOLD", 3)?,
            cooldown: seconds(&lookup, "CB_COOLDOWN", 30.0)?,
            retries: int(&lookup, "DB_RETRIES", 3)?,
            initial_delay: seconds(&lookup, "DB_INITIAL_DELAY", 0.2)?,
        })
    }

    /// Gate configuration derived from this surface.
    pub fn gate_config(&self) -> GateConfig {
        GateConfig::builder()
            .name("aula-db")
            .max_retries(self.retries)
            .initial_delay(self.initial_delay)
            .failure_threshold(self.failure_threshold)
            .cooldown(self.cooldown)
            .build()
    }
}

fn int<F>(lookup: &F, key: &'static str, default: u32) -> Result<u32, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SettingsError::Invalid { key, value: raw }),
    }
}

fn seconds<F>(lookup: &F, key: &'static str, default: f64) -> Result<Duration, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = match lookup(key) {
        None => return Ok(Duration::from_secs_f64(default)),
        Some(raw) => raw,
    };
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(Duration::from_secs_f64(secs)),
        _ => Err(SettingsError::Invalid { key, value: raw }),
    }
}
