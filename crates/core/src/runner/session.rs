//! Whole-session execution.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::executor::JobExecutor;
use super::types::{EmptyRequestPolicy, JobRequest, RunnerError};
use crate::catalog::{resolve_available, JobKind};
use crate::extractor::Extractor;
use crate::metrics;
use crate::session::SessionResolver;
use crate::tracker::ProcessingTracker;

/// Runs all requested jobs of one session.
///
/// Jobs run strictly sequentially, each with the full worker budget;
/// extractors saturate their budget internally, so interleaving jobs would
/// only thrash. A failing job does not stop the remaining jobs.
pub struct SessionRunner {
    resolver: Arc<dyn SessionResolver>,
    executor: JobExecutor,
    empty_request_policy: EmptyRequestPolicy,
}

impl SessionRunner {
    pub fn new(
        resolver: Arc<dyn SessionResolver>,
        extractor: Arc<dyn Extractor>,
        empty_request_policy: EmptyRequestPolicy,
    ) -> Self {
        Self {
            resolver,
            executor: JobExecutor::new(extractor),
            empty_request_policy,
        }
    }

    /// Run the session at `session_path`.
    ///
    /// Returns `Ok(true)` only when every executed job succeeded. A session
    /// with nothing to run succeeds trivially. Job availability is resolved
    /// against current filesystem state on every call.
    pub async fn run(
        &self,
        session_path: &Path,
        request: &JobRequest,
        workers: usize,
    ) -> Result<bool, RunnerError> {
        let session = self.resolver.resolve(session_path)?;

        let effective = if request.is_empty() {
            match self.empty_request_policy {
                EmptyRequestPolicy::RunAll => JobRequest::all(),
                EmptyRequestPolicy::RunNone => *request,
            }
        } else {
            *request
        };

        let available = resolve_available(&session);
        let to_run: Vec<JobKind> = JobKind::all()
            .into_iter()
            .filter(|kind| effective.requests(*kind) && available[kind])
            .collect();

        if to_run.is_empty() {
            info!(session = %session.session_name, "no jobs to run");
            return Ok(true);
        }

        let mut tracker = ProcessingTracker::from_persisted(&session)?;
        let ids: Vec<_> = to_run
            .iter()
            .map(|kind| JobExecutor::job_id(&session, *kind))
            .collect();
        tracker.initialize_jobs(&ids)?;

        info!(
            session = %session.session_name,
            jobs = to_run.len(),
            workers,
            "session processing started"
        );

        let mut all_succeeded = true;
        for kind in to_run {
            match self.executor.execute(&session, kind, workers, &mut tracker).await {
                Ok(()) => {}
                Err(RunnerError::Extractor(_)) => {
                    // Already recorded and logged; keep going with the rest.
                    all_succeeded = false;
                }
                Err(e) => return Err(e),
            }
        }

        let result = if all_succeeded { "succeeded" } else { "failed" };
        metrics::SESSIONS_TOTAL.with_label_values(&[result]).inc();
        if all_succeeded {
            info!(session = %session.session_name, "session processing succeeded");
        } else {
            warn!(session = %session.session_name, "session processing finished with failures");
        }
        Ok(all_succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FsSessionResolver;
    use crate::testing::{fixtures, MockExtractor};
    use crate::tracker::JobStatus;
    use tempfile::TempDir;

    fn runner(extractor: Arc<MockExtractor>, policy: EmptyRequestPolicy) -> SessionRunner {
        SessionRunner::new(Arc::new(FsSessionResolver::new()), extractor, policy)
    }

    #[tokio::test]
    async fn test_empty_request_run_all_policy() {
        let dir = TempDir::new().unwrap();
        fixtures::make_session(dir.path(), "s1", &[JobKind::Runtime, JobKind::FaceCamera]);
        let extractor = Arc::new(MockExtractor::new());
        let runner = runner(extractor.clone(), EmptyRequestPolicy::RunAll);

        let ok = runner
            .run(&dir.path().join("s1"), &JobRequest::default(), 4)
            .await
            .unwrap();

        assert!(ok);
        assert_eq!(extractor.recorded_runtime_calls(), 1);
        assert_eq!(extractor.recorded_camera_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_request_run_none_policy() {
        let dir = TempDir::new().unwrap();
        fixtures::make_session(dir.path(), "s1", &[JobKind::Runtime]);
        let extractor = Arc::new(MockExtractor::new());
        let runner = runner(extractor.clone(), EmptyRequestPolicy::RunNone);

        let ok = runner
            .run(&dir.path().join("s1"), &JobRequest::default(), 4)
            .await
            .unwrap();

        assert!(ok);
        assert_eq!(extractor.recorded_runtime_calls(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_jobs_are_skipped() {
        let dir = TempDir::new().unwrap();
        fixtures::make_session(dir.path(), "s1", &[JobKind::Runtime]);
        let extractor = Arc::new(MockExtractor::new());
        let runner = runner(extractor.clone(), EmptyRequestPolicy::RunAll);

        let request = JobRequest {
            runtime: true,
            face_camera: true,
            ..Default::default()
        };
        let ok = runner.run(&dir.path().join("s1"), &request, 4).await.unwrap();

        // Face camera log is absent so only runtime runs.
        assert!(ok);
        assert_eq!(extractor.recorded_runtime_calls(), 1);
        assert!(extractor.recorded_camera_calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_remaining_jobs() {
        let dir = TempDir::new().unwrap();
        let session = fixtures::make_session(
            dir.path(),
            "s1",
            &[JobKind::Runtime, JobKind::FaceCamera, JobKind::BodyCamera],
        );
        let extractor = Arc::new(MockExtractor::new());
        extractor.fail_job(JobKind::FaceCamera, "truncated log");
        let runner = runner(extractor.clone(), EmptyRequestPolicy::RunAll);

        let ok = runner
            .run(&dir.path().join("s1"), &JobRequest::default(), 4)
            .await
            .unwrap();

        assert!(!ok);
        // All three jobs attempted despite the failure in the middle.
        assert_eq!(extractor.recorded_runtime_calls(), 1);
        assert_eq!(extractor.recorded_camera_calls().len(), 2);

        let tracker = ProcessingTracker::from_persisted(&session).unwrap();
        let face = JobExecutor::job_id(&session, JobKind::FaceCamera);
        let body = JobExecutor::job_id(&session, JobKind::BodyCamera);
        assert_eq!(tracker.jobs()[&face].status, JobStatus::Failed);
        assert_eq!(tracker.jobs()[&body].status, JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_invalid_session_path_is_an_error() {
        let extractor = Arc::new(MockExtractor::new());
        let runner = runner(extractor, EmptyRequestPolicy::RunAll);

        let result = runner
            .run(Path::new("/nonexistent"), &JobRequest::default(), 4)
            .await;
        assert!(matches!(result, Err(RunnerError::Session(_))));
    }
}
