//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the store, the
//! fetcher and the ingestion loop. Nothing in this crate reads process-wide environment
//! variables while serving requests or running cycles; the binaries call the
//! `*_from_env_value` helpers with whatever `std::env::var(..).ok()` returned.

use crate::constants::{
    DEFAULT_DB_PATH, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_SHUTDOWN_GRACE_SECS, DEFAULT_SOURCE_URL,
};
use crate::{QuoteError, QuoteResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    db_path: PathBuf,
    source_url: String,
    poll_interval: Duration,
    fetch_timeout: Duration,
    shutdown_grace: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// Rejects an empty source URL and zero durations for the poll interval and fetch timeout.
    pub fn new(
        db_path: PathBuf,
        source_url: String,
        poll_interval: Duration,
        fetch_timeout: Duration,
        shutdown_grace: Duration,
    ) -> QuoteResult<Self> {
        if source_url.trim().is_empty() {
            return Err(QuoteError::InvalidInput("source_url cannot be empty".into()));
        }
        if poll_interval.is_zero() {
            return Err(QuoteError::InvalidInput(
                "poll interval must be greater than zero".into(),
            ));
        }
        if fetch_timeout.is_zero() {
            return Err(QuoteError::InvalidInput(
                "fetch timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            db_path,
            source_url: source_url.trim().to_string(),
            poll_interval,
            fetch_timeout,
            shutdown_grace,
        })
    }

    /// Resolve every setting from raw environment values.
    ///
    /// Arguments are the results of `std::env::var(..).ok()` for `QUOTES_DB`,
    /// `QUOTES_SOURCE_URL`, `QUOTES_POLL_INTERVAL_SECS`, `QUOTES_FETCH_TIMEOUT_SECS` and
    /// `QUOTES_SHUTDOWN_GRACE_SECS`, in that order.
    pub fn from_env_values(
        db_path: Option<String>,
        source_url: Option<String>,
        poll_interval_secs: Option<String>,
        fetch_timeout_secs: Option<String>,
        shutdown_grace_secs: Option<String>,
    ) -> QuoteResult<Self> {
        Self::new(
            db_path_from_env_value(db_path),
            non_blank(source_url).unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            poll_interval_from_env_value(poll_interval_secs)?,
            secs_from_env_value(
                "QUOTES_FETCH_TIMEOUT_SECS",
                fetch_timeout_secs,
                DEFAULT_FETCH_TIMEOUT_SECS,
            )?,
            secs_from_env_value(
                "QUOTES_SHUTDOWN_GRACE_SECS",
                shutdown_grace_secs,
                DEFAULT_SHUTDOWN_GRACE_SECS,
            )?,
        )
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the database location, falling back to [`DEFAULT_DB_PATH`] for `None` or blank.
pub fn db_path_from_env_value(value: Option<String>) -> PathBuf {
    PathBuf::from(non_blank(value).unwrap_or_else(|| DEFAULT_DB_PATH.to_string()))
}

/// Parse the poll interval in whole seconds.
///
/// `None` or blank yields the default of [`DEFAULT_POLL_INTERVAL_SECS`]; zero is rejected.
pub fn poll_interval_from_env_value(value: Option<String>) -> QuoteResult<Duration> {
    let interval = secs_from_env_value(
        "QUOTES_POLL_INTERVAL_SECS",
        value,
        DEFAULT_POLL_INTERVAL_SECS,
    )?;
    if interval.is_zero() {
        return Err(QuoteError::InvalidInput(
            "QUOTES_POLL_INTERVAL_SECS must be greater than zero".into(),
        ));
    }
    Ok(interval)
}

fn secs_from_env_value(name: &str, value: Option<String>, default: u64) -> QuoteResult<Duration> {
    let secs = non_blank(value)
        .map(|v| {
            v.parse::<u64>().map_err(|_| {
                QuoteError::InvalidInput(format!("{name} must be a whole number of seconds, got '{v}'"))
            })
        })
        .transpose()?
        .unwrap_or(default);
    Ok(Duration::from_secs(secs))
}
