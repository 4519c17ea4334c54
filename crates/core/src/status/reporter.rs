//! Status reporter implementation.

use std::path::Path;
use std::sync::Arc;

use super::types::{
    BatchReport, BatchSummary, JobDetail, SessionReport, SessionStatus, StatusError,
};
use crate::catalog::JobKind;
use crate::runner::JobExecutor;
use crate::scheduler::{BatchScheduler, BatchSnapshot};
use crate::session::{SessionDescriptor, SessionResolver};
use crate::tracker::{JobId, JobStatus, ProcessingTracker};

/// Derives session and batch status from tracker files and the scheduler's
/// batch snapshot.
///
/// Reading alongside live workers is safe: tracker writes are atomic
/// replaces, so a report sees each tracker either before or after a
/// transition, never mid-write.
pub struct StatusReporter {
    resolver: Arc<dyn SessionResolver>,
    scheduler: Arc<BatchScheduler>,
}

impl StatusReporter {
    pub fn new(resolver: Arc<dyn SessionResolver>, scheduler: Arc<BatchScheduler>) -> Self {
        Self { resolver, scheduler }
    }

    /// Status of a single session path.
    pub async fn session_report(&self, path: &Path) -> Result<SessionReport, StatusError> {
        let snapshot = self.scheduler.snapshot().await;
        self.derive_session_report(path, snapshot.as_ref())
    }

    /// Status of the current batch with all of its sessions, most active
    /// first.
    pub async fn batch_report(&self) -> Result<BatchReport, StatusError> {
        let Some(snapshot) = self.scheduler.snapshot().await else {
            return Ok(BatchReport {
                batch_id: None,
                active: false,
                summary: BatchSummary::default(),
                sessions: Vec::new(),
            });
        };

        let mut sessions = Vec::new();
        for path in snapshot.session_paths() {
            sessions.push(self.derive_session_report(Path::new(&path), Some(&snapshot))?);
        }
        sessions.sort_by(|a, b| {
            (a.status.sort_rank(), a.session_name.as_str())
                .cmp(&(b.status.sort_rank(), b.session_name.as_str()))
        });

        Ok(BatchReport {
            batch_id: Some(snapshot.batch_id.clone()),
            active: snapshot.is_live(),
            summary: BatchSummary {
                total: snapshot.queued.len()
                    + snapshot.active.len()
                    + snapshot.completed.len()
                    + snapshot.failed.len(),
                queued: snapshot.queued.len(),
                active: snapshot.active.len(),
                completed: snapshot.completed.len(),
                failed: snapshot.failed.len(),
            },
            sessions,
        })
    }

    fn derive_session_report(
        &self,
        path: &Path,
        snapshot: Option<&BatchSnapshot>,
    ) -> Result<SessionReport, StatusError> {
        let session = self.resolver.resolve(path)?;
        let tracker = ProcessingTracker::from_persisted(&session)?;

        let key = path.display().to_string();
        let in_queue = snapshot.is_some_and(|s| s.queued.contains(&key));
        let in_active = snapshot.is_some_and(|s| s.active.contains(&key));
        let in_completed = snapshot.is_some_and(|s| s.completed.contains(&key));
        let in_failed = snapshot.is_some_and(|s| s.failed.contains(&key));

        let jobs: Vec<JobDetail> = tracker
            .jobs()
            .iter()
            .map(|(id, record)| JobDetail {
                job: job_name_for(&session, id),
                status: record.status,
            })
            .collect();

        let completed = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Succeeded)
            .count();
        let current_job = jobs
            .iter()
            .find(|j| j.status == JobStatus::Running)
            .map(|j| j.job.clone());

        let status = derive_status(&jobs, in_queue, in_active, in_completed, in_failed);

        Ok(SessionReport {
            session_name: session.session_name,
            path: key,
            status,
            completed,
            total: jobs.len(),
            current_job,
            jobs,
        })
    }
}

/// First matching rule wins, top to bottom.
///
/// Tracker records decide the terminal states; the batch's own
/// completed/failed verdicts settle sessions whose records alone are
/// indeterminate, such as a session the batch completed without a single
/// runnable job.
fn derive_status(
    jobs: &[JobDetail],
    in_queue: bool,
    in_active: bool,
    in_completed: bool,
    in_failed: bool,
) -> SessionStatus {
    let any = |status: JobStatus| jobs.iter().any(|j| j.status == status);
    let all = |status: JobStatus| jobs.iter().all(|j| j.status == status);
    let failed = any(JobStatus::Failed);
    let succeeded = any(JobStatus::Succeeded);

    if in_queue {
        SessionStatus::Queued
    } else if in_active || any(JobStatus::Running) {
        SessionStatus::Processing
    } else if failed && !succeeded {
        SessionStatus::Failed
    } else if failed {
        SessionStatus::Partial
    } else if !jobs.is_empty() && all(JobStatus::Succeeded) {
        SessionStatus::Succeeded
    } else if in_failed {
        SessionStatus::Failed
    } else if in_completed {
        SessionStatus::Succeeded
    } else if !jobs.is_empty() {
        SessionStatus::Pending
    } else {
        SessionStatus::NotStarted
    }
}

/// Map a job id back to its kind's name by recomputing ids for every kind.
/// Ids that match no kind (for example from a renamed session directory)
/// fall back to a truncated id.
fn job_name_for(session: &SessionDescriptor, id: &JobId) -> String {
    JobKind::all()
        .into_iter()
        .find(|kind| JobExecutor::job_id(session, *kind) == *id)
        .map(|kind| kind.job_name().to_string())
        .unwrap_or_else(|| format!("job-{}", &id.as_str()[..8.min(id.as_str().len())]))
}
