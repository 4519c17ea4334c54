//! Status derivation and reporting.
//!
//! Status is always derived fresh from the scheduler's batch snapshot and
//! the per-session tracker files; nothing here caches.

mod reporter;
mod types;

pub use reporter::StatusReporter;
pub use types::{BatchReport, BatchSummary, JobDetail, SessionReport, SessionStatus, StatusError};
