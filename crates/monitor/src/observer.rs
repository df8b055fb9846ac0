//! Progress observer interface and stock observers.
//!
//! The monitor calls [`ProgressObserver::on_progress`] once after every
//! successful poll, synchronously: the next poll does not start until
//! the call returns. Observers must not assume any call frequency
//! beyond that, and the monitor ignores anything they do.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use memoir_core::session::{Session, SessionStatus};
use memoir_core::stage::ProcessingStage;
use memoir_core::types::{SessionId, Timestamp};

/// Broadcast channel capacity for progress events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Sink for incremental session updates.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, session: &Session);
}

impl<F> ProgressObserver for F
where
    F: Fn(&Session) + Send + Sync,
{
    fn on_progress(&self, session: &Session) {
        self(session)
    }
}

/// Logs every update through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_progress(&self, session: &Session) {
        tracing::info!(
            session_id = %session.session_id,
            status = %session.status,
            progress = session.progress_percentage,
            stage = session.stage().label(),
            current_stage = %session.current_stage,
            current_task = %session.current_task,
            "Processing progress",
        );
    }
}

/// A progress update as published to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub progress_percentage: u8,
    pub stage: ProcessingStage,
    pub current_stage: String,
    pub current_task: String,
    pub estimated_completion: Option<Timestamp>,
    /// When the monitor observed this update.
    pub observed_at: Timestamp,
}

impl ProgressEvent {
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            status: session.status,
            progress_percentage: session.progress_percentage,
            stage: session.stage(),
            current_stage: session.current_stage.clone(),
            current_task: session.current_task.clone(),
            estimated_completion: session.estimated_completion,
            observed_at: Utc::now(),
        }
    }
}

/// Publishes each update as a [`ProgressEvent`] on a broadcast channel.
///
/// Sending never blocks the monitor; updates are dropped when nobody
/// is subscribed, and slow subscribers observe `Lagged`.
pub struct BroadcastObserver {
    event_tx: broadcast::Sender<ProgressEvent>,
}

impl BroadcastObserver {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for BroadcastObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for BroadcastObserver {
    fn on_progress(&self, session: &Session) {
        let _ = self.event_tx.send(ProgressEvent::from_session(session));
    }
}

/// Forwards each update to several observers, in registration order.
#[derive(Default)]
pub struct Fanout {
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl ProgressObserver for Fanout {
    fn on_progress(&self, session: &Session) {
        for observer in &self.observers {
            observer.on_progress(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use memoir_core::session::normalize;
    use serde_json::json;

    fn session(progress: u8) -> Session {
        normalize(&json!({
            "sessionId": "sess-1",
            "status": "processing",
            "progressPercentage": progress,
            "currentStage": "Transcribing audio"
        }))
        .unwrap()
    }

    #[test]
    fn closures_are_observers() {
        let seen = Mutex::new(Vec::new());
        let observer = |s: &Session| seen.lock().unwrap().push(s.progress_percentage);
        observer.on_progress(&session(10));
        observer.on_progress(&session(20));
        assert_eq!(*seen.lock().unwrap(), vec![10, 20]);
    }

    #[test]
    fn tracing_observer_does_not_panic() {
        TracingObserver.on_progress(&session(50));
    }

    #[tokio::test]
    async fn broadcast_observer_publishes_events() {
        let observer = BroadcastObserver::new();
        let mut rx = observer.subscribe();

        observer.on_progress(&session(40));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.session_id, "sess-1");
        assert_eq!(event.status, SessionStatus::Processing);
        assert_eq!(event.progress_percentage, 40);
        assert_eq!(event.stage, ProcessingStage::Transcription);
    }

    #[test]
    fn broadcast_without_subscribers_is_silent() {
        BroadcastObserver::new().on_progress(&session(40));
    }

    #[test]
    fn fanout_preserves_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&log);
        let second = Arc::clone(&log);

        let fanout = Fanout::new()
            .with(Arc::new(move |_: &Session| first.lock().unwrap().push("first")))
            .with(Arc::new(move |_: &Session| second.lock().unwrap().push("second")));

        fanout.on_progress(&session(1));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }
}
