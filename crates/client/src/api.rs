//! The job API seam.
//!
//! The monitor depends on [`JobApi`] rather than on a concrete HTTP
//! client so that tests can script status sequences and so multiple
//! monitors can share one client.

use std::sync::Arc;

use memoir_core::submission::JobSubmission;
use memoir_core::types::SessionId;

use crate::error::ClientError;

/// One logical request per method; retries are internal to the
/// implementation and invisible to callers.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    /// Submit a processing job and return its session identifier.
    async fn submit_job(&self, submission: &JobSubmission) -> Result<SessionId, ClientError>;

    /// Fetch the raw status payload of a session.
    async fn fetch_status(&self, session_id: &str) -> Result<serde_json::Value, ClientError>;

    /// Fetch the raw results payload of a completed session.
    async fn fetch_results(&self, session_id: &str) -> Result<serde_json::Value, ClientError>;
}

#[async_trait::async_trait]
impl<T: JobApi + ?Sized> JobApi for Arc<T> {
    async fn submit_job(&self, submission: &JobSubmission) -> Result<SessionId, ClientError> {
        (**self).submit_job(submission).await
    }

    async fn fetch_status(&self, session_id: &str) -> Result<serde_json::Value, ClientError> {
        (**self).fetch_status(session_id).await
    }

    async fn fetch_results(&self, session_id: &str) -> Result<serde_json::Value, ClientError> {
        (**self).fetch_results(session_id).await
    }
}
