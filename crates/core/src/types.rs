/// Opaque identifier assigned by the processing service at submission.
pub type SessionId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
