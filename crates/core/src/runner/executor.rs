//! Single-job execution with tracked lifecycle.

use std::sync::Arc;

use tracing::{debug, warn};

use super::types::RunnerError;
use crate::catalog::JobKind;
use crate::extractor::{CameraLogId, ControllerLogId, Extractor};
use crate::metrics;
use crate::session::SessionDescriptor;
use crate::tracker::{JobId, ProcessingTracker};

/// Executes individual processing jobs against the extractor collaborator,
/// recording every transition in the session tracker.
pub struct JobExecutor {
    extractor: Arc<dyn Extractor>,
}

impl JobExecutor {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    /// Job id for `kind` of `session`.
    pub fn job_id(session: &SessionDescriptor, kind: JobKind) -> JobId {
        let qualified = session.qualified_job_name(kind.job_name());
        ProcessingTracker::generate_job_id(&session.root, &qualified)
    }

    /// Run one job to completion.
    ///
    /// The RUNNING marker is persisted before the job body is dispatched, so
    /// an interrupted run leaves durable evidence. Failures are recorded in
    /// the tracker before being propagated.
    pub async fn execute(
        &self,
        session: &SessionDescriptor,
        kind: JobKind,
        workers: usize,
        tracker: &mut ProcessingTracker,
    ) -> Result<(), RunnerError> {
        let id = Self::job_id(session, kind);
        tracker.start_job(&id)?;
        debug!(
            session = %session.session_name,
            job = %kind,
            workers,
            "job started"
        );

        let outcome = self.dispatch(session, kind, workers).await;

        match outcome {
            Ok(()) => {
                tracker.complete_job(&id)?;
                metrics::JOBS_TOTAL.with_label_values(&["succeeded"]).inc();
                debug!(session = %session.session_name, job = %kind, "job succeeded");
                Ok(())
            }
            Err(e) => {
                tracker.fail_job(&id)?;
                metrics::JOBS_TOTAL.with_label_values(&["failed"]).inc();
                warn!(
                    session = %session.session_name,
                    job = %kind,
                    error = %e,
                    "job failed"
                );
                Err(e.into())
            }
        }
    }

    /// Run the job identified by `job_id`.
    ///
    /// The id is matched against the ids of all job kinds for this session.
    /// An id that matches nothing is recorded as FAILED and surfaced as an
    /// error: remote callers send precomputed ids and must learn that theirs
    /// went nowhere.
    pub async fn execute_by_id(
        &self,
        session: &SessionDescriptor,
        job_id: &JobId,
        workers: usize,
        tracker: &mut ProcessingTracker,
    ) -> Result<(), RunnerError> {
        let kind = JobKind::all()
            .into_iter()
            .find(|kind| Self::job_id(session, *kind) == *job_id);

        match kind {
            Some(kind) => self.execute(session, kind, workers, tracker).await,
            None => {
                tracker.fail_job(job_id)?;
                Err(RunnerError::UnknownJobId {
                    session: session.session_name.clone(),
                    job_id: job_id.to_string(),
                })
            }
        }
    }

    async fn dispatch(
        &self,
        session: &SessionDescriptor,
        kind: JobKind,
        workers: usize,
    ) -> Result<(), crate::extractor::ExtractorError> {
        match kind {
            JobKind::Runtime => self.extractor.process_runtime(session).await,
            JobKind::FaceCamera => {
                self.extractor
                    .process_camera_timestamps(session, CameraLogId::Face, workers)
                    .await
            }
            JobKind::BodyCamera => {
                self.extractor
                    .process_camera_timestamps(session, CameraLogId::Body, workers)
                    .await
            }
            JobKind::ActorMicrocontroller => {
                self.extractor
                    .process_microcontroller(session, ControllerLogId::Actor, workers)
                    .await
            }
            JobKind::SensorMicrocontroller => {
                self.extractor
                    .process_microcontroller(session, ControllerLogId::Sensor, workers)
                    .await
            }
            JobKind::EncoderMicrocontroller => {
                self.extractor
                    .process_microcontroller(session, ControllerLogId::Encoder, workers)
                    .await
            }
        }
    }
}
