//! Core data model for the memoir story-processing pipeline.
//!
//! Holds the canonical shapes the rest of the workspace works with:
//! normalized job sessions, processing results, job submissions, and
//! the field-resolution helpers that turn loosely-shaped remote JSON
//! into those shapes. Nothing in this crate performs network I/O.

pub mod error;
pub mod fields;
pub mod init_guard;
pub mod results;
pub mod session;
pub mod stage;
pub mod submission;
pub mod types;
