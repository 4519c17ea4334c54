//! File-backed processing job tracker.
//!
//! One tracker file per session records the lifecycle state of every
//! processing job. The tracker is the single source of truth consumed by
//! status reporting and survives crashes: every mutation is persisted
//! atomically before the caller proceeds.

mod file;
mod types;

pub use file::{ProcessingTracker, TRACKER_FILE_NAME};
pub use types::{JobId, JobRecord, JobStatus, TrackerError};
