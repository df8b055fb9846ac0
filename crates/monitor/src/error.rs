use std::time::Duration;

use memoir_client::ClientError;
use memoir_core::types::SessionId;

/// Terminal outcomes of a monitored job other than success.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The service reported the session as failed.
    #[error("Processing failed: {message}")]
    ProcessingFailed { session_id: SessionId, message: String },

    /// Too many status polls failed back to back.
    #[error("Status polling failed {attempts} consecutive times: {source}")]
    PollingExhausted { attempts: u32, source: ClientError },

    /// The session did not reach a terminal status within the budget.
    #[error("Processing timed out after {elapsed:?}")]
    ProcessingTimeout { session_id: SessionId, elapsed: Duration },

    /// The session completed but its results could not be retrieved.
    #[error("Failed to retrieve results: {0}")]
    Results(#[source] ClientError),

    /// Monitoring was cancelled by the caller.
    #[error("Monitoring cancelled")]
    Cancelled,

    /// The spawned monitor task panicked or was aborted.
    #[error("Monitor task failed: {0}")]
    Task(String),
}
