//! Scheduler state and result types.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::runner::JobRequest;

/// Errors raised at batch admission.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A batch is still live. The live batch is untouched; the caller must
    /// wait for it to drain.
    #[error("a batch is already being processed ({active} active, {queued} queued)")]
    BatchActive { active: usize, queued: usize },

    /// Every requested session path failed resolution; there is nothing to
    /// admit.
    #[error("no valid sessions in request ({} rejected)", rejected.len())]
    NoValidSessions { rejected: Vec<String> },
}

/// Immediate answer to a successful batch admission.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReceipt {
    pub batch_id: String,
    /// Sessions admitted into the batch.
    pub total: usize,
    /// Sessions that start processing right away.
    pub immediate_start: usize,
    /// Sessions waiting behind the concurrency limit.
    pub queued: usize,
    pub max_parallel: usize,
    pub workers_per_session: usize,
    /// Paths that failed session resolution and were not admitted.
    pub rejected: Vec<String>,
}

/// Consistent point-in-time copy of the live batch for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSnapshot {
    pub batch_id: String,
    pub queued: Vec<String>,
    pub active: Vec<String>,
    pub completed: Vec<String>,
    pub failed: Vec<String>,
}

impl BatchSnapshot {
    /// True while sessions remain queued or in flight.
    pub fn is_live(&self) -> bool {
        !self.queued.is_empty() || !self.active.is_empty()
    }

    /// All session paths of the batch.
    pub fn session_paths(&self) -> Vec<String> {
        let mut paths = Vec::with_capacity(
            self.queued.len() + self.active.len() + self.completed.len() + self.failed.len(),
        );
        paths.extend(self.queued.iter().cloned());
        paths.extend(self.active.iter().cloned());
        paths.extend(self.completed.iter().cloned());
        paths.extend(self.failed.iter().cloned());
        paths
    }
}

/// Mutable state of the live batch, owned by the scheduler behind one lock.
///
/// The four collections partition the batch at all times: a session path is
/// in exactly one of queued, active, completed, or failed. Workers move
/// their own path from active into a terminal set under the lock; the
/// manager loop reaps the finished join handles afterwards.
pub(super) struct BatchState {
    pub batch_id: String,
    pub queued: VecDeque<PathBuf>,
    pub active: HashMap<String, JoinHandle<()>>,
    pub completed: HashSet<String>,
    pub failed: HashSet<String>,
    pub request: JobRequest,
    pub workers: usize,
    pub max_parallel: usize,
}

impl BatchState {
    pub fn is_live(&self) -> bool {
        !self.queued.is_empty() || !self.active.is_empty()
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        let mut queued: Vec<String> = self
            .queued
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let mut active: Vec<String> = self.active.keys().cloned().collect();
        let mut completed: Vec<String> = self.completed.iter().cloned().collect();
        let mut failed: Vec<String> = self.failed.iter().cloned().collect();
        queued.sort();
        active.sort();
        completed.sort();
        failed.sort();
        BatchSnapshot {
            batch_id: self.batch_id.clone(),
            queued,
            active,
            completed,
            failed,
        }
    }
}
