//! Mock extractor for testing.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use crate::catalog::JobKind;
use crate::extractor::{CameraLogId, ControllerLogId, Extractor, ExtractorError};
use crate::session::SessionDescriptor;

/// Mock implementation of the Extractor trait.
///
/// Provides controllable behavior for testing:
/// - Record invocations for assertions
/// - Script per-job failures
/// - Simulate processing duration
pub struct MockExtractor {
    failures: RwLock<HashMap<JobKind, String>>,
    runtime_calls: RwLock<usize>,
    camera_calls: RwLock<Vec<CameraLogId>>,
    controller_calls: RwLock<Vec<ControllerLogId>>,
    recorded_workers: RwLock<Vec<usize>>,
    job_duration_ms: RwLock<u64>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            failures: RwLock::new(HashMap::new()),
            runtime_calls: RwLock::new(0),
            camera_calls: RwLock::new(Vec::new()),
            controller_calls: RwLock::new(Vec::new()),
            recorded_workers: RwLock::new(Vec::new()),
            job_duration_ms: RwLock::new(0),
        }
    }

    /// Script `kind` to fail with `message` on every invocation.
    pub fn fail_job(&self, kind: JobKind, message: impl Into<String>) {
        self.failures.write().unwrap().insert(kind, message.into());
    }

    /// Simulate each job taking this long.
    pub fn set_job_duration(&self, duration: Duration) {
        *self.job_duration_ms.write().unwrap() = duration.as_millis() as u64;
    }

    /// Number of runtime processing invocations.
    pub fn recorded_runtime_calls(&self) -> usize {
        *self.runtime_calls.read().unwrap()
    }

    /// Camera log ids processed, in call order.
    pub fn recorded_camera_calls(&self) -> Vec<CameraLogId> {
        self.camera_calls.read().unwrap().clone()
    }

    /// Controller log ids processed, in call order.
    pub fn recorded_controller_calls(&self) -> Vec<ControllerLogId> {
        self.controller_calls.read().unwrap().clone()
    }

    /// Worker budgets received, in call order (runtime calls excluded).
    pub fn recorded_workers(&self) -> Vec<usize> {
        self.recorded_workers.read().unwrap().clone()
    }

    async fn simulate_work(&self) {
        let duration_ms = *self.job_duration_ms.read().unwrap();
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }
    }

    fn scripted_failure(
        &self,
        kind: JobKind,
        session: &SessionDescriptor,
    ) -> Result<(), ExtractorError> {
        if let Some(message) = self.failures.read().unwrap().get(&kind) {
            return Err(ExtractorError::new(
                session.qualified_job_name(kind.job_name()),
                message.clone(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn process_runtime(&self, session: &SessionDescriptor) -> Result<(), ExtractorError> {
        *self.runtime_calls.write().unwrap() += 1;
        self.simulate_work().await;
        self.scripted_failure(JobKind::Runtime, session)
    }

    async fn process_camera_timestamps(
        &self,
        session: &SessionDescriptor,
        log_id: CameraLogId,
        workers: usize,
    ) -> Result<(), ExtractorError> {
        self.camera_calls.write().unwrap().push(log_id);
        self.recorded_workers.write().unwrap().push(workers);
        self.simulate_work().await;
        let kind = match log_id {
            CameraLogId::Face => JobKind::FaceCamera,
            CameraLogId::Body => JobKind::BodyCamera,
        };
        self.scripted_failure(kind, session)
    }

    async fn process_microcontroller(
        &self,
        session: &SessionDescriptor,
        log_id: ControllerLogId,
        workers: usize,
    ) -> Result<(), ExtractorError> {
        self.controller_calls.write().unwrap().push(log_id);
        self.recorded_workers.write().unwrap().push(workers);
        self.simulate_work().await;
        let kind = match log_id {
            ControllerLogId::Actor => JobKind::ActorMicrocontroller,
            ControllerLogId::Sensor => JobKind::SensorMicrocontroller,
            ControllerLogId::Encoder => JobKind::EncoderMicrocontroller,
        };
        self.scripted_failure(kind, session)
    }
}
