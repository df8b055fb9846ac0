//! Errors from the processing-service client.

use std::time::Duration;

use memoir_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The submission failed local precondition checks; nothing was sent.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// An attempt exceeded the per-request timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The service returned 404 for the session or its results.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// The service returned any other non-2xx status code.
    #[error("Processing API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body was not the expected JSON shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// Transport failures, timeouts, and non-2xx responses.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::Timeout(_) | Self::NotFound { .. } | Self::Api { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Only transport failures and timeouts are retried transparently.
    /// Non-2xx responses surface immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Timeout(_))
    }
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::MalformedResponse(msg) => Self::MalformedResponse(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let timeout = ClientError::Timeout(Duration::from_secs(30));
        assert!(timeout.is_network());
        assert!(timeout.is_retryable());

        let not_found = ClientError::NotFound {
            message: "Session not found".into(),
        };
        assert!(not_found.is_network());
        assert!(not_found.is_not_found());
        assert!(!not_found.is_retryable());

        let api = ClientError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert!(api.is_network());
        assert!(!api.is_retryable());

        let validation = ClientError::Validation("empty".into());
        assert!(!validation.is_network());
        assert!(!validation.is_retryable());

        let malformed = ClientError::MalformedResponse("not json".into());
        assert!(!malformed.is_network());
        assert!(!malformed.is_retryable());
    }

    #[test]
    fn display_messages() {
        let err = ClientError::Api {
            status: 502,
            message: "upstream unavailable".into(),
        };
        assert_eq!(err.to_string(), "Processing API error (502): upstream unavailable");

        let err = ClientError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Request timed out after 30s");
    }

    #[test]
    fn request_error_display() {
        // Build a reqwest error from an invalid URL.
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = ClientError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
        assert!(err.is_retryable());
    }

    #[test]
    fn core_errors_convert() {
        let err: ClientError = CoreError::Validation("title".into()).into();
        assert!(matches!(err, ClientError::Validation(m) if m == "title"));

        let err: ClientError = CoreError::MalformedResponse("array".into()).into();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }
}
