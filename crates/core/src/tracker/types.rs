//! Tracker data types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Filesystem error while reading or writing the tracker file.
    #[error("tracker file I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The tracker file exists but cannot be parsed. Never silently reset;
    /// a corrupt file needs operator attention.
    #[error("tracker file at {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory job table could not be serialized for writing.
    #[error("failed to serialize tracker state for {path}: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Deterministic identifier for one processing job of one session.
///
/// Derived by hashing the canonical session root together with the qualified
/// job name, so the same job resolves to the same id on every host that can
/// see the session at the same canonical path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub(crate) fn from_digest(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Initialized, not yet started.
    Pending,
    /// Execution dispatched. A job found in this state after a restart
    /// was interrupted mid-run.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error, or never completed.
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted state of one job. Keyed by [`JobId`] in the tracker file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub status: JobStatus,

    /// When the job last entered RUNNING.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When the job last reached a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn pending() -> Self {
        Self {
            status: JobStatus::Pending,
            started_at: None,
            ended_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminal() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Succeeded).unwrap(),
            r#""SUCCEEDED""#
        );
        let parsed: JobStatus = serde_json::from_str(r#""RUNNING""#).unwrap();
        assert_eq!(parsed, JobStatus::Running);
    }

    #[test]
    fn test_record_skips_absent_timestamps() {
        let json = serde_json::to_string(&JobRecord::pending()).unwrap();
        assert_eq!(json, r#"{"status":"PENDING"}"#);
    }

    #[test]
    fn test_read_and_write_errors_read_distinctly() {
        let bad_json = || serde_json::from_str::<u32>("nope").unwrap_err();
        let corrupt = TrackerError::Corrupt {
            path: "/data/s1/tracker.json".to_string(),
            source: bad_json(),
        };
        let serialize = TrackerError::Serialize {
            path: "/data/s1/tracker.json".to_string(),
            source: bad_json(),
        };
        assert!(corrupt.to_string().contains("corrupt"));
        assert!(serialize.to_string().contains("serialize"));
    }
}
