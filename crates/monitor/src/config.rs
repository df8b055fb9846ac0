use std::time::Duration;

use memoir_client::config::{env_millis, env_u64, ConfigError};

/// Default spacing between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5_000);

/// Default overall budget for one job.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_millis(600_000);

/// Default number of back-to-back polling failures tolerated.
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// Poll-loop budgets. Independent of the client's per-request retry
/// policy: a poll counts as one failure only after the client has
/// exhausted its own attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    /// Hard upper bound on the time spent polling.
    pub max_duration: Duration,
    pub max_consecutive_errors: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_duration: DEFAULT_MAX_DURATION,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default  |
    /// |--------------------------------|----------|
    /// | `MEMOIR_POLL_INTERVAL_MS`      | `5000`   |
    /// | `MEMOIR_MAX_DURATION_MS`       | `600000` |
    /// | `MEMOIR_MAX_CONSECUTIVE_ERRORS`| `5`      |
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_consecutive_errors = env_u64(
            "MEMOIR_MAX_CONSECUTIVE_ERRORS",
            DEFAULT_MAX_CONSECUTIVE_ERRORS as u64,
        )?;

        Ok(Self {
            poll_interval: env_millis("MEMOIR_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL)?,
            max_duration: env_millis("MEMOIR_MAX_DURATION_MS", DEFAULT_MAX_DURATION)?,
            max_consecutive_errors: u32::try_from(max_consecutive_errors).map_err(|_| {
                ConfigError::Invalid {
                    var: "MEMOIR_MAX_CONSECUTIVE_ERRORS",
                    value: max_consecutive_errors.to_string(),
                }
            })?,
        })
    }

    /// Wait after a failed poll: twice the steady-state interval.
    pub fn error_backoff(&self) -> Duration {
        self.poll_interval.saturating_mul(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.max_duration, Duration::from_secs(600));
        assert_eq!(config.max_consecutive_errors, 5);
    }

    #[test]
    fn error_backoff_doubles_interval() {
        let config = MonitorConfig {
            poll_interval: Duration::from_millis(1500),
            ..Default::default()
        };
        assert_eq!(config.error_backoff(), Duration::from_secs(3));
    }
}
