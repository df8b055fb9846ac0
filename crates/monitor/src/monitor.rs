//! The poll loop.
//!
//! ```text
//! Starting -> Polling -> { Completed, Failed, TimedOut, Aborted, Cancelled }
//! ```
//!
//! Each iteration fetches and normalizes the session status, notifies
//! the observer, and either finishes or sleeps. Polls are strictly
//! sequential; a session never has two status requests in flight.
//! Two budgets bound the loop: `max_consecutive_errors` failed polls
//! in a row ([`MonitorError::PollingExhausted`]) and the wall-clock
//! `max_duration` ([`MonitorError::ProcessingTimeout`]). Every
//! suspension point also races the cancellation token.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use memoir_client::{ClientError, JobApi};
use memoir_core::results::{transform, ProcessingResults};
use memoir_core::session::{normalize, Session, SessionStatus};
use memoir_core::types::SessionId;

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::handle::MonitorHandle;
use crate::observer::ProgressObserver;

/// Where a monitor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Starting,
    Polling,
    Completed,
    Failed,
    TimedOut,
    /// Too many consecutive polling failures.
    Aborted,
    Cancelled,
}

impl MonitorState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Starting | Self::Polling)
    }

    fn from_outcome(outcome: &Result<ProcessingResults, MonitorError>) -> Self {
        match outcome {
            Ok(_) => Self::Completed,
            Err(MonitorError::ProcessingTimeout { .. }) => Self::TimedOut,
            Err(MonitorError::PollingExhausted { .. }) => Self::Aborted,
            Err(MonitorError::Cancelled) => Self::Cancelled,
            Err(_) => Self::Failed,
        }
    }
}

/// Drives sessions to a terminal outcome.
///
/// Holds no per-session state, so one monitor can track any number of
/// sessions concurrently; each run keeps its own counters and timers.
#[derive(Clone)]
pub struct JobMonitor {
    api: Arc<dyn JobApi>,
    config: MonitorConfig,
}

impl JobMonitor {
    pub fn new(api: Arc<dyn JobApi>, config: MonitorConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Monitor a session on a background task.
    ///
    /// The returned handle cancels the run when dropped.
    pub fn spawn(
        &self,
        session_id: impl Into<SessionId>,
        observer: Arc<dyn ProgressObserver>,
    ) -> MonitorHandle {
        let session_id = session_id.into();
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(MonitorState::Starting);

        let monitor = self.clone();
        let task_session = session_id.clone();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            monitor
                .run_reporting(&task_session, observer.as_ref(), &task_cancel, &state_tx)
                .await
        });

        MonitorHandle::new(session_id, cancel, state_rx, task)
    }

    /// Monitor a session to completion on the current task.
    pub async fn run(
        &self,
        session_id: &str,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<ProcessingResults, MonitorError> {
        let (state_tx, _) = watch::channel(MonitorState::Starting);
        self.run_reporting(session_id, observer, cancel, &state_tx)
            .await
    }

    /// [`JobMonitor::run`], publishing state transitions to `state`.
    pub async fn run_reporting(
        &self,
        session_id: &str,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
        state: &watch::Sender<MonitorState>,
    ) -> Result<ProcessingResults, MonitorError> {
        tracing::info!(
            session_id,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            max_duration_ms = self.config.max_duration.as_millis() as u64,
            "Monitoring processing session",
        );

        let outcome = self.drive(session_id, observer, cancel, state).await;
        let terminal = MonitorState::from_outcome(&outcome);
        state.send_replace(terminal);

        match &outcome {
            Ok(results) => tracing::info!(
                session_id,
                chapters = results.chapters.len(),
                questions = results.follow_up_questions.len(),
                "Processing session completed",
            ),
            Err(MonitorError::Cancelled) => {
                tracing::info!(session_id, "Monitoring cancelled");
            }
            Err(e) => tracing::error!(
                session_id,
                state = ?terminal,
                error = %e,
                "Processing session did not complete",
            ),
        }

        outcome
    }

    async fn drive(
        &self,
        session_id: &str,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
        state: &watch::Sender<MonitorState>,
    ) -> Result<ProcessingResults, MonitorError> {
        let started = Instant::now();
        let deadline = started + self.config.max_duration;
        let mut consecutive_errors = 0u32;
        let mut polls = 0u32;

        state.send_replace(MonitorState::Polling);

        loop {
            if cancel.is_cancelled() {
                return Err(MonitorError::Cancelled);
            }
            if Instant::now() >= deadline {
                return Err(self.timed_out(session_id, started));
            }

            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(MonitorError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(self.timed_out(session_id, started));
                }
                polled = self.poll_once(session_id) => polled,
            };
            polls += 1;

            let delay = match polled {
                Ok(session) => {
                    consecutive_errors = 0;

                    if cancel.is_cancelled() {
                        return Err(MonitorError::Cancelled);
                    }

                    tracing::debug!(
                        session_id,
                        poll = polls,
                        status = %session.status,
                        progress = session.progress_percentage,
                        stage = session.stage().label(),
                        "Polled session status",
                    );
                    observer.on_progress(&session);

                    match session.status {
                        SessionStatus::Completed => break,
                        SessionStatus::Failed => {
                            return Err(MonitorError::ProcessingFailed {
                                session_id: session_id.to_string(),
                                message: session.failure_message(),
                            });
                        }
                        _ => self.config.poll_interval,
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        return Err(MonitorError::PollingExhausted {
                            attempts: consecutive_errors,
                            source: e,
                        });
                    }

                    let backoff = self.config.error_backoff();
                    tracing::warn!(
                        session_id,
                        consecutive_errors,
                        max_consecutive_errors = self.config.max_consecutive_errors,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Status poll failed",
                    );
                    backoff
                }
            };

            if cancel.is_cancelled() {
                return Err(MonitorError::Cancelled);
            }

            // Never sleep past the deadline; the loop head reports the timeout.
            let wake = (Instant::now() + delay).min(deadline);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(MonitorError::Cancelled),
                _ = tokio::time::sleep_until(wake) => {}
            }
        }

        tracing::debug!(session_id, polls, "Session completed, fetching results");

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MonitorError::Cancelled),
            raw = self.api.fetch_results(session_id) => raw.map_err(MonitorError::Results)?,
        };

        if cancel.is_cancelled() {
            return Err(MonitorError::Cancelled);
        }

        transform(&raw).map_err(|e| MonitorError::Results(e.into()))
    }

    /// One status check: fetch, then normalize.
    async fn poll_once(&self, session_id: &str) -> Result<Session, ClientError> {
        let raw = self.api.fetch_status(session_id).await?;
        let mut session = normalize(&raw)?;
        if session.session_id.is_empty() {
            session.session_id = session_id.to_string();
        }
        Ok(session)
    }

    fn timed_out(&self, session_id: &str, started: Instant) -> MonitorError {
        MonitorError::ProcessingTimeout {
            session_id: session_id.to_string(),
            elapsed: started.elapsed(),
        }
    }
}
