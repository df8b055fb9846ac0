//! REST client for the processing service.
//!
//! Wraps the service's HTTP endpoints using [`reqwest`]:
//!
//! | Operation       | Request                                   |
//! |-----------------|-------------------------------------------|
//! | submit job      | `POST /api/ai/process-from-firebase`      |
//! | session status  | `GET /api/ai/status/{session_id}`         |
//! | session results | `GET /api/ai/results/{session_id}`        |

use std::time::Duration;

use memoir_core::fields::Fields;
use memoir_core::submission::JobSubmission;
use memoir_core::types::SessionId;
use reqwest::{StatusCode, Url};
use serde_json::Value;

use crate::api::JobApi;
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Header carrying the per-request correlation id. The id stays the
/// same across the retries of one logical request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const SUBMIT_PATH: &str = "/api/ai/process-from-firebase";
const STATUS_PATH: &str = "/api/ai/status";
const RESULTS_PATH: &str = "/api/ai/results";

const SESSION_ID: &[&str] = &["sessionId", "session_id"];
const SERVER_MESSAGE: &[&str] = &["detail", "message", "error"];

/// HTTP client for one processing service.
pub struct HttpJobApi {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpJobApi {
    /// Create a client with its own connection pool.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("memoir-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- private helpers ----

    /// URL of a per-session resource. The id is pushed as a single
    /// percent-encoded path segment, so it is opaque to routing.
    fn session_url(&self, path: &str, session_id: &str) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.config.url(path))
            .map_err(|e| ClientError::Validation(format!("invalid service URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Validation("service URL cannot take a path".to_string()))?
            .push(session_id);
        Ok(url)
    }

    /// GET a JSON document with timeout and retry.
    async fn get_json(&self, operation: &'static str, url: Url) -> Result<Value, ClientError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let timeout = self.config.timeout;

        tracing::debug!(operation, request_id = %request_id, url = %url, "Sending request");

        self.config
            .retry
            .run(operation, |_| {
                let request = self
                    .client
                    .get(url.clone())
                    .header(REQUEST_ID_HEADER, request_id.as_str())
                    .timeout(timeout);
                Self::execute(request, timeout)
            })
            .await
    }

    /// Perform one attempt and decode the JSON body.
    async fn execute(
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<Value, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        let response = Self::ensure_success(response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        serde_json::from_slice(&body).map_err(|e| {
            ClientError::MalformedResponse(format!("response body is not valid JSON: {e}"))
        })
    }

    /// Ensure the response has a success status code. On failure the
    /// body is inspected for a server-supplied message.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = server_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

        if status == StatusCode::NOT_FOUND {
            Err(ClientError::NotFound { message })
        } else {
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait::async_trait]
impl JobApi for HttpJobApi {
    async fn submit_job(&self, submission: &JobSubmission) -> Result<SessionId, ClientError> {
        submission.validate()?;

        let url = self.config.url(SUBMIT_PATH);
        let request_id = uuid::Uuid::new_v4().to_string();
        let timeout = self.config.timeout;

        let body = self
            .config
            .retry
            .run("submit_job", |_| {
                let request = self
                    .client
                    .post(&url)
                    .header(REQUEST_ID_HEADER, request_id.as_str())
                    .timeout(timeout)
                    .json(submission);
                Self::execute(request, timeout)
            })
            .await?;

        let session_id = Fields::new(&body)
            .and_then(|fields| fields.opt_string(SESSION_ID))
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                ClientError::MalformedResponse(
                    "submission response is missing sessionId".to_string(),
                )
            })?;

        tracing::info!(
            session_id = %session_id,
            request_id = %request_id,
            audio_count = submission.audio_urls.len(),
            chapter_title = %submission.chapter_title,
            "Processing job submitted",
        );

        Ok(session_id)
    }

    async fn fetch_status(&self, session_id: &str) -> Result<Value, ClientError> {
        let url = self.session_url(STATUS_PATH, session_id)?;
        self.get_json("fetch_status", url).await
    }

    async fn fetch_results(&self, session_id: &str) -> Result<Value, ClientError> {
        let url = self.session_url(RESULTS_PATH, session_id)?;
        self.get_json("fetch_results", url).await
    }
}

/// Classify a reqwest failure: timeouts keep their own variant.
fn transport_error(err: reqwest::Error, timeout: Duration) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(timeout)
    } else {
        ClientError::Request(err)
    }
}

/// Extract a human-readable message from an error response body.
///
/// Prefers a JSON `detail`, `message` or `error` string; otherwise the
/// trimmed raw text. Returns `None` for an empty body.
pub fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let from_json = serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|value| Fields::new(&value).and_then(|f| f.opt_string(SERVER_MESSAGE)));

    Some(from_json.unwrap_or_else(|| trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_prefers_detail() {
        assert_eq!(
            server_message(r#"{"detail": "Session not found"}"#).as_deref(),
            Some("Session not found")
        );
        assert_eq!(
            server_message(r#"{"message": "quota exceeded"}"#).as_deref(),
            Some("quota exceeded")
        );
    }

    #[test]
    fn server_message_falls_back_to_raw_text() {
        assert_eq!(
            server_message("  Bad Gateway  ").as_deref(),
            Some("Bad Gateway")
        );
        // A structured detail (e.g. a validation error list) is not a string.
        assert_eq!(
            server_message(r#"{"detail": [{"loc": ["body"]}]}"#).as_deref(),
            Some(r#"{"detail": [{"loc": ["body"]}]}"#)
        );
    }

    #[test]
    fn server_message_empty_body() {
        assert_eq!(server_message(""), None);
        assert_eq!(server_message("   "), None);
    }

    #[test]
    fn session_id_is_one_escaped_segment() {
        let api = HttpJobApi::new(ClientConfig::new("http://localhost:8000/")).unwrap();
        let url = api.session_url(STATUS_PATH, "a/b?x#y").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/ai/status/a%2Fb%3Fx%23y"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn unparseable_base_url_is_a_validation_error() {
        let api = HttpJobApi::new(ClientConfig::new("not a url")).unwrap();
        let err = api.session_url(STATUS_PATH, "sess-1").unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn new_does_not_panic() {
        let api = HttpJobApi::new(ClientConfig::new("http://localhost:8000")).unwrap();
        assert_eq!(api.config().base_url, "http://localhost:8000");
    }
}
