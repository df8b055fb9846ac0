//! HTTP client for the story-processing service.
//!
//! [`JobApi`](api::JobApi) is the seam the job monitor polls through;
//! [`HttpJobApi`](http::HttpJobApi) implements it with [`reqwest`],
//! bounding every attempt with a timeout and retrying transport
//! failures with progressive backoff.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod retry;

pub use api::JobApi;
pub use config::ClientConfig;
pub use error::ClientError;
pub use http::HttpJobApi;
pub use retry::RetryPolicy;
