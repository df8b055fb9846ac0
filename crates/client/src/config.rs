use std::time::Duration;

use crate::retry::{RetryPolicy, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};

/// Default per-attempt request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Connection settings for the processing service.
///
/// Immutable after construction; safe to share across concurrent calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Service base URL, e.g. `https://stories.example.com`.
    pub base_url: String,
    /// Upper bound on a single request attempt.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default  |
    /// |-----------------------------|----------|
    /// | `MEMOIR_API_BASE_URL`       | required |
    /// | `MEMOIR_REQUEST_TIMEOUT_MS` | `30000`  |
    /// | `MEMOIR_RETRY_ATTEMPTS`     | `3`      |
    /// | `MEMOIR_RETRY_DELAY_MS`     | `1000`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("MEMOIR_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("MEMOIR_API_BASE_URL"))?;

        Self::from_env_with_base_url(base_url)
    }

    /// [`ClientConfig::from_env`] with the base URL supplied by the caller,
    /// e.g. from a command-line flag.
    pub fn from_env_with_base_url(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let timeout = env_millis("MEMOIR_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT)?;
        let attempts = env_u64("MEMOIR_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS as u64)?;
        let base_delay = env_millis("MEMOIR_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY)?;

        Ok(Self {
            base_url: base_url.into(),
            timeout,
            retry: RetryPolicy {
                attempts: u32::try_from(attempts).map_err(|_| ConfigError::Invalid {
                    var: "MEMOIR_RETRY_ATTEMPTS",
                    value: attempts.to_string(),
                })?,
                base_delay,
            },
        })
    }

    /// Join the base URL and an absolute path without doubling slashes.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Parse an unsigned integer environment variable, or return `default`
/// when it is unset.
pub fn env_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Parse a millisecond duration environment variable.
pub fn env_millis(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    env_u64(var, default.as_millis() as u64).map(Duration::from_millis)
}
