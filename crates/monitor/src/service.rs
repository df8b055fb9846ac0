//! Entry point for the UI layer.
//!
//! [`JobService`] bundles job submission and monitoring behind one
//! object. The HTTP client is built lazily on first use through an
//! [`InitGuard`], so constructing the service is free and concurrent
//! first calls share a single client.

use std::sync::Arc;

use memoir_client::{ClientConfig, ClientError, HttpJobApi, JobApi};
use memoir_core::init_guard::InitGuard;
use memoir_core::submission::JobSubmission;
use memoir_core::types::SessionId;

use crate::config::MonitorConfig;
use crate::handle::MonitorHandle;
use crate::monitor::JobMonitor;
use crate::observer::ProgressObserver;

pub struct JobService {
    client_config: Option<ClientConfig>,
    monitor_config: MonitorConfig,
    api: InitGuard<Arc<dyn JobApi>>,
}

impl JobService {
    /// A service talking HTTP to the configured processing service.
    pub fn new(client_config: ClientConfig, monitor_config: MonitorConfig) -> Self {
        Self {
            client_config: Some(client_config),
            monitor_config,
            api: InitGuard::new(),
        }
    }

    /// A service over an existing [`JobApi`] implementation.
    pub fn with_api(api: Arc<dyn JobApi>, monitor_config: MonitorConfig) -> Self {
        Self {
            client_config: None,
            monitor_config,
            api: InitGuard::ready(api),
        }
    }

    /// The job API, building the HTTP client on first use.
    pub async fn api(&self) -> Result<Arc<dyn JobApi>, ClientError> {
        self.api
            .get_or_try_init(|| async {
                let config = self.client_config.clone().ok_or_else(|| {
                    ClientError::Validation("processing service is not configured".to_string())
                })?;
                tracing::info!(base_url = %config.base_url, "Initializing processing service client");
                let api: Arc<dyn JobApi> = Arc::new(HttpJobApi::new(config)?);
                Ok::<_, ClientError>(api)
            })
            .await
    }

    /// Submit a job and return its session identifier.
    ///
    /// The submission is validated here, before any [`JobApi`] sees it.
    pub async fn submit(&self, submission: &JobSubmission) -> Result<SessionId, ClientError> {
        submission.validate()?;
        self.api().await?.submit_job(submission).await
    }

    /// Start monitoring an existing session on a background task.
    pub async fn monitor(
        &self,
        session_id: impl Into<SessionId>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<MonitorHandle, ClientError> {
        let monitor = JobMonitor::new(self.api().await?, self.monitor_config);
        Ok(monitor.spawn(session_id, observer))
    }

    /// Submit a job, then start monitoring the new session.
    ///
    /// A failed job is retried by submitting again, which yields a new
    /// session; sessions are never resumed.
    pub async fn submit_and_monitor(
        &self,
        submission: &JobSubmission,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<MonitorHandle, ClientError> {
        let session_id = self.submit(submission).await?;
        self.monitor(session_id, observer).await
    }
}
