//! Session descriptor types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while resolving a path into a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The path does not point at a recognizable session directory.
    #[error("not a valid session directory: {path} ({reason})")]
    NotASession { path: String, reason: String },

    /// Filesystem error while inspecting the session directory.
    #[error("failed to inspect session directory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Resolved handle to one recorded session.
///
/// Borrowed by the core for the duration of a single call; never cached
/// across runs, so availability checks always reflect current filesystem
/// state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Canonical session root. Stable across local and remote execution and
    /// therefore the anchor for job identity.
    pub root: PathBuf,

    /// Human-readable session name (the root directory's name).
    pub session_name: String,

    /// Directory holding the raw behavior log files.
    pub raw_data_dir: PathBuf,

    /// Directory holding processing tracker files. May not exist yet for a
    /// session that has never been processed.
    pub tracking_data_dir: PathBuf,
}

impl SessionDescriptor {
    /// Qualified job name used for identity: `{session_name}_{job_name}`.
    pub fn qualified_job_name(&self, job_name: &str) -> String {
        format!("{}_{}", self.session_name, job_name)
    }
}
