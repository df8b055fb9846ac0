//! Canonical job session model and the status normalizer.
//!
//! The processing service reports session status as a loosely-shaped
//! JSON object. [`normalize`] converts it into a [`Session`]: status
//! values are mapped onto the five canonical states, progress is
//! clamped into `0..=100`, and every missing field takes its default.

use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::fields::{number_as_f64, Fields};
use crate::stage::ProcessingStage;
use crate::types::{SessionId, Timestamp};

const SESSION_ID: &[&str] = &["sessionId", "session_id"];
const STATUS: &[&str] = &["status", "state"];
const PROGRESS: &[&str] = &["progressPercentage", "progress_percentage", "progress"];
const CURRENT_STAGE: &[&str] = &["currentStage", "current_stage"];
const CURRENT_TASK: &[&str] = &["currentTask", "current_task"];
const ESTIMATED_COMPLETION: &[&str] = &["estimatedCompletion", "estimated_completion"];
const ERRORS: &[&str] = &["errors"];

const ENTRY_TIMESTAMP: &[&str] = &["timestamp"];
const ENTRY_ERROR: &[&str] = &["error", "message"];
const ENTRY_TRACEBACK: &[&str] = &["traceback"];

/// Message used when the service reports failure without any errors.
pub const GENERIC_FAILURE_MESSAGE: &str = "Processing failed";

/// Canonical session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Initializing,
    Processing,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Map a remote status label onto the canonical set.
    ///
    /// Matching is case-insensitive. Unrecognized labels map to
    /// [`SessionStatus::Processing`], never to a terminal state, so an
    /// unknown value cannot end a poll loop early.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "initializing" => Self::Initializing,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Processing,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Initializing => "initializing",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// `completed` and `failed` are terminal; no further transitions occur.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a session's error log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SessionErrorEntry {
    Message(String),
    Detailed {
        timestamp: Option<String>,
        error: String,
        traceback: Option<String>,
    },
}

impl SessionErrorEntry {
    /// Human-readable error text.
    pub fn message(&self) -> &str {
        match self {
            Self::Message(message) => message,
            Self::Detailed { error, .. } => error,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Message(s.clone())),
            Value::Object(map) => {
                let fields = Fields::from_map(map);
                Some(Self::Detailed {
                    timestamp: fields.opt_string(ENTRY_TIMESTAMP),
                    error: fields.string(ENTRY_ERROR),
                    traceback: fields.opt_string(ENTRY_TRACEBACK),
                })
            }
            Value::Null => None,
            other => Some(Self::Message(other.to_string())),
        }
    }
}

/// Read-only client projection of a remote job session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub session_id: SessionId,
    pub status: SessionStatus,
    /// Clamped into `0..=100`. Not guaranteed to be monotonic.
    pub progress_percentage: u8,
    pub current_stage: String,
    pub current_task: String,
    /// Advisory only.
    pub estimated_completion: Option<Timestamp>,
    pub errors: Vec<SessionErrorEntry>,
}

impl Session {
    /// Coarse classification of the current stage, for display only.
    pub fn stage(&self) -> ProcessingStage {
        ProcessingStage::classify(&self.current_stage, &self.current_task)
    }

    /// All error messages joined into one, or a generic message when
    /// the service supplied none.
    pub fn failure_message(&self) -> String {
        let messages: Vec<&str> = self
            .errors
            .iter()
            .map(SessionErrorEntry::message)
            .filter(|m| !m.trim().is_empty())
            .collect();

        if messages.is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            messages.join("; ")
        }
    }
}

/// Normalize a raw status payload into a canonical [`Session`].
///
/// Fails with [`CoreError::MalformedResponse`] only when `raw` is not a
/// JSON object; every other irregularity is absorbed by defaults.
pub fn normalize(raw: &Value) -> Result<Session, CoreError> {
    let fields = Fields::new(raw).ok_or_else(|| {
        CoreError::MalformedResponse(format!(
            "status payload must be a JSON object, got {}",
            json_kind(raw)
        ))
    })?;

    let status = fields
        .opt_string(STATUS)
        .map(|label| SessionStatus::from_label(&label))
        .unwrap_or(SessionStatus::Pending);

    let errors = match fields.get(ERRORS) {
        Some(Value::Array(items)) => items.iter().filter_map(SessionErrorEntry::from_value).collect(),
        Some(single) => SessionErrorEntry::from_value(single).into_iter().collect(),
        None => Vec::new(),
    };

    Ok(Session {
        session_id: fields.string(SESSION_ID),
        status,
        progress_percentage: clamp_progress(fields.get(PROGRESS)),
        current_stage: fields.string(CURRENT_STAGE),
        current_task: fields.string(CURRENT_TASK),
        estimated_completion: fields
            .opt_string(ESTIMATED_COMPLETION)
            .and_then(|s| parse_timestamp(&s)),
        errors,
    })
}

/// Clamp a raw progress value into `0..=100`; absent or non-numeric is `0`.
fn clamp_progress(value: Option<&Value>) -> u8 {
    let Some(n) = value.and_then(number_as_f64) else {
        return 0;
    };
    if n.is_nan() {
        return 0;
    }
    n.round().clamp(0.0, 100.0) as u8
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
fn parse_timestamp(s: &str) -> Option<Timestamp> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    // -- status mapping --

    #[test]
    fn canonical_labels_map_directly() {
        assert_eq!(SessionStatus::from_label("pending"), SessionStatus::Pending);
        assert_eq!(SessionStatus::from_label("initializing"), SessionStatus::Initializing);
        assert_eq!(SessionStatus::from_label("processing"), SessionStatus::Processing);
        assert_eq!(SessionStatus::from_label("completed"), SessionStatus::Completed);
        assert_eq!(SessionStatus::from_label("failed"), SessionStatus::Failed);
    }

    #[test]
    fn labels_are_case_insensitive() {
        assert_eq!(SessionStatus::from_label("COMPLETED"), SessionStatus::Completed);
        assert_eq!(SessionStatus::from_label(" Failed "), SessionStatus::Failed);
    }

    #[test]
    fn unknown_labels_map_to_processing() {
        for label in ["done", "error", "queued", "", "completed!"] {
            assert_eq!(SessionStatus::from_label(label), SessionStatus::Processing, "{label}");
        }
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(!SessionStatus::Pending.is_terminal());
        assert!(!SessionStatus::Initializing.is_terminal());
        assert!(!SessionStatus::Processing.is_terminal());
    }

    // -- normalize --

    #[test]
    fn normalize_camel_case_payload() {
        let raw = json!({
            "sessionId": "abc",
            "status": "processing",
            "progressPercentage": 45,
            "currentStage": "Transcribing audio",
            "currentTask": "file 2 of 3",
            "estimatedCompletion": "2026-10-18T12:30:00Z",
            "errors": []
        });
        let session = normalize(&raw).unwrap();
        assert_eq!(session.session_id, "abc");
        assert_eq!(session.status, SessionStatus::Processing);
        assert_eq!(session.progress_percentage, 45);
        assert_eq!(session.current_stage, "Transcribing audio");
        assert_eq!(session.current_task, "file 2 of 3");
        assert_eq!(
            session.estimated_completion.unwrap().to_rfc3339(),
            "2026-10-18T12:30:00+00:00"
        );
        assert!(session.errors.is_empty());
    }

    #[test]
    fn normalize_snake_case_payload() {
        let raw = json!({
            "session_id": "abc",
            "status": "initializing",
            "progress_percentage": 5,
            "current_stage": "Loading models",
            "current_task": "whisper",
            "estimated_completion": "2026-10-18T12:30:00.250"
        });
        let session = normalize(&raw).unwrap();
        assert_eq!(session.session_id, "abc");
        assert_eq!(session.status, SessionStatus::Initializing);
        assert_eq!(session.progress_percentage, 5);
        assert_eq!(session.current_stage, "Loading models");
        assert_eq!(session.current_task, "whisper");
        assert!(session.estimated_completion.is_some());
    }

    #[test]
    fn progress_is_clamped() {
        let over = normalize(&json!({"progressPercentage": 250})).unwrap();
        assert_eq!(over.progress_percentage, 100);

        let negative = normalize(&json!({"progress_percentage": -20})).unwrap();
        assert_eq!(negative.progress_percentage, 0);

        let fractional = normalize(&json!({"progressPercentage": 33.6})).unwrap();
        assert_eq!(fractional.progress_percentage, 34);

        let text = normalize(&json!({"progressPercentage": "70"})).unwrap();
        assert_eq!(text.progress_percentage, 70);
    }

    #[test]
    fn unknown_status_normalizes_to_processing() {
        let session = normalize(&json!({"status": "transcoding"})).unwrap();
        assert_eq!(session.status, SessionStatus::Processing);
    }

    #[test]
    fn empty_object_takes_defaults() {
        let session = normalize(&json!({})).unwrap();
        assert_eq!(session.session_id, "");
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.progress_percentage, 0);
        assert_eq!(session.current_stage, "");
        assert_eq!(session.current_task, "");
        assert!(session.estimated_completion.is_none());
        assert!(session.errors.is_empty());
    }

    #[test]
    fn unparseable_timestamp_is_dropped() {
        let session = normalize(&json!({"estimatedCompletion": "soon"})).unwrap();
        assert!(session.estimated_completion.is_none());
    }

    #[test]
    fn non_object_payload_is_malformed() {
        assert_matches!(normalize(&json!([])), Err(CoreError::MalformedResponse(_)));
        assert_matches!(normalize(&json!("ok")), Err(CoreError::MalformedResponse(_)));
        assert_matches!(normalize(&Value::Null), Err(CoreError::MalformedResponse(_)));
    }

    // -- errors --

    #[test]
    fn mixed_error_entries_are_preserved_in_order() {
        let raw = json!({
            "status": "failed",
            "errors": [
                "disk full",
                {"timestamp": "2026-10-18T12:00:00Z", "error": "transcription crashed", "traceback": "..."},
                null
            ]
        });
        let session = normalize(&raw).unwrap();
        assert_eq!(session.errors.len(), 2);
        assert_eq!(session.errors[0], SessionErrorEntry::Message("disk full".into()));
        assert_matches!(
            &session.errors[1],
            SessionErrorEntry::Detailed { timestamp: Some(_), error, traceback: Some(_) }
                if error == "transcription crashed"
        );
    }

    #[test]
    fn single_string_error_becomes_one_entry() {
        let session = normalize(&json!({"errors": "boom"})).unwrap();
        assert_eq!(session.errors, vec![SessionErrorEntry::Message("boom".into())]);
    }

    #[test]
    fn failure_message_joins_errors() {
        let raw = json!({"errors": ["disk full", {"error": "retry later"}]});
        let session = normalize(&raw).unwrap();
        assert_eq!(session.failure_message(), "disk full; retry later");
    }

    #[test]
    fn failure_message_falls_back_when_empty() {
        let session = normalize(&json!({"status": "failed", "errors": ["  "]})).unwrap();
        assert_eq!(session.failure_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn normalize_is_deterministic() {
        let raw = json!({"sessionId": "x", "status": "processing", "progressPercentage": 10});
        assert_eq!(normalize(&raw).unwrap(), normalize(&raw).unwrap());
    }
}
