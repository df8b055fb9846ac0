//! Handle to a monitor running on a background task.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use memoir_core::results::ProcessingResults;
use memoir_core::types::SessionId;

use crate::error::MonitorError;
use crate::monitor::MonitorState;

/// Returned by [`JobMonitor::spawn`](crate::JobMonitor::spawn).
///
/// Dropping the handle cancels the monitor. Cancellation stops further
/// polling and suppresses the outcome: after [`MonitorHandle::cancel`]
/// no progress is reported and [`MonitorHandle::outcome`] yields `None`.
#[derive(Debug)]
pub struct MonitorHandle {
    session_id: SessionId,
    cancel: CancellationToken,
    state: watch::Receiver<MonitorState>,
    task: JoinHandle<Result<ProcessingResults, MonitorError>>,
    _cancel_on_drop: DropGuard,
}

impl MonitorHandle {
    pub(crate) fn new(
        session_id: SessionId,
        cancel: CancellationToken,
        state: watch::Receiver<MonitorState>,
        task: JoinHandle<Result<ProcessingResults, MonitorError>>,
    ) -> Self {
        let guard = cancel.clone().drop_guard();
        Self {
            session_id,
            cancel,
            state,
            task,
            _cancel_on_drop: guard,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Stop monitoring. Requests already sent are not recalled.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!(session_id = %self.session_id, "Cancelling session monitor");
            self.cancel.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A token that cancels this monitor, e.g. for a Ctrl-C handler.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The monitor's current state.
    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    /// Receiver for state transitions.
    pub fn watch_state(&self) -> watch::Receiver<MonitorState> {
        self.state.clone()
    }

    /// Wait for the final outcome.
    ///
    /// Returns `None` if the monitor was cancelled.
    pub async fn outcome(mut self) -> Option<Result<ProcessingResults, MonitorError>> {
        let joined = (&mut self.task).await;

        if self.cancel.is_cancelled() {
            return None;
        }

        match joined {
            Ok(Err(MonitorError::Cancelled)) => None,
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(session_id = %self.session_id, error = %e, "Monitor task failed");
                Some(Err(MonitorError::Task(e.to_string())))
            }
        }
    }
}
