//! Long-running job monitoring for the story-processing service.
//!
//! A submitted job is tracked by polling its session status at a fixed
//! interval until the service reports a terminal state. [`JobMonitor`]
//! owns that poll loop, its consecutive-failure and overall-duration
//! budgets, and the final results retrieval. Progress is pushed to a
//! [`ProgressObserver`] after every successful poll.

pub mod config;
pub mod error;
pub mod handle;
pub mod monitor;
pub mod observer;
pub mod service;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use handle::MonitorHandle;
pub use monitor::{JobMonitor, MonitorState};
pub use observer::ProgressObserver;
pub use service::JobService;
