//! Status report types.

use serde::Serialize;
use thiserror::Error;

use crate::session::SessionError;
use crate::tracker::{JobStatus, TrackerError};

/// Errors raised while deriving status.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A tracker file could not be read. Corruption is reported, never
    /// papered over as "not started".
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Derived processing state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Admitted into the batch, waiting behind the concurrency limit.
    Queued,
    /// A worker holds the session, or a job is marked RUNNING.
    Processing,
    /// Every tracked job failed.
    Failed,
    /// Finished with a mix of failed and succeeded jobs.
    Partial,
    /// Every tracked job succeeded.
    Succeeded,
    /// Jobs initialized but none running or finished yet.
    Pending,
    /// No tracker exists for the session.
    NotStarted,
}

impl SessionStatus {
    /// Display ordering for batch reports: in-flight work first, then
    /// waiting, then finished.
    pub fn sort_rank(&self) -> u8 {
        match self {
            SessionStatus::Processing => 0,
            SessionStatus::Queued => 1,
            SessionStatus::Pending => 2,
            SessionStatus::Succeeded => 3,
            SessionStatus::Partial => 4,
            SessionStatus::Failed => 5,
            SessionStatus::NotStarted => 6,
        }
    }
}

/// One tracked job in a session report.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    pub job: String,
    pub status: JobStatus,
}

/// Derived status of one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session_name: String,
    pub path: String,
    pub status: SessionStatus,
    /// Jobs succeeded so far.
    pub completed: usize,
    /// Jobs tracked in total.
    pub total: usize,
    /// Name of the job currently marked RUNNING, if any.
    pub current_job: Option<String>,
    pub jobs: Vec<JobDetail>,
}

/// Aggregate counts over the batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub queued: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Status of the current batch and all of its sessions.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Absent when no batch was ever started.
    pub batch_id: Option<String>,
    /// True while sessions remain queued or in flight.
    pub active: bool,
    pub summary: BatchSummary,
    pub sessions: Vec<SessionReport>,
}
