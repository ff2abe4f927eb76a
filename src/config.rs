//! Configuration types, read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::correlation::{DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::error::ConfigError;
use crate::pipeline::docs::DEFAULT_BASE_PATH;
use crate::worker::PoolConfig;

/// Default interval between correlator TTL sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Read `key`, falling back to `default` when unset.
pub(crate) fn env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

pub(crate) fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}': {e}"),
    })
}

/// Pipeline and worker configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub pool: PoolConfig,
    /// Maximum number of correlated conversation markers.
    pub thread_capacity: usize,
    /// Idle time after which a marker is forgotten. `None` disables expiry.
    pub thread_ttl: Option<Duration>,
    pub sweep_interval: Duration,
    /// Root directory of the filesystem document store.
    pub docs_dir: PathBuf,
    /// Path prefix for documents inside the store.
    pub docs_base: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            thread_capacity: DEFAULT_CAPACITY,
            thread_ttl: Some(DEFAULT_TTL),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            docs_dir: PathBuf::from("./data"),
            docs_base: DEFAULT_BASE_PATH.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load from `QUILL_*` variables. A TTL of 0 disables expiry.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let ttl_secs: u64 = env_or("QUILL_THREAD_TTL_SECS", DEFAULT_TTL.as_secs())?;
        let config = Self {
            pool: PoolConfig {
                workers: env_or("QUILL_WORKERS", defaults.pool.workers)?,
                queue_capacity: env_or("QUILL_QUEUE_CAPACITY", defaults.pool.queue_capacity)?,
            },
            thread_capacity: env_or("QUILL_THREAD_CAPACITY", defaults.thread_capacity)?,
            thread_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            sweep_interval: Duration::from_secs(env_or(
                "QUILL_THREAD_SWEEP_SECS",
                DEFAULT_SWEEP_INTERVAL.as_secs(),
            )?),
            docs_dir: env_or("QUILL_DOCS_DIR", defaults.docs_dir)?,
            docs_base: env_or("QUILL_DOCS_BASE", defaults.docs_base)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()?;
        if self.thread_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "QUILL_THREAD_CAPACITY".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "QUILL_THREAD_SWEEP_SECS".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.docs_base.trim_matches('/').is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "QUILL_DOCS_BASE".into(),
                message: "cannot be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.thread_capacity, 10_000);
        assert_eq!(config.thread_ttl, Some(Duration::from_secs(86_400)));
        assert_eq!(config.docs_base, "docs");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_value_reports_key() {
        let err = parse_value::<usize>("QUILL_WORKERS", "four").unwrap_err();
        assert!(err.to_string().contains("QUILL_WORKERS"));
        assert_eq!(parse_value::<usize>("QUILL_WORKERS", " 8 ").unwrap(), 8);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = PipelineConfig {
            thread_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_docs_base_is_rejected() {
        let config = PipelineConfig {
            docs_base: "/".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
