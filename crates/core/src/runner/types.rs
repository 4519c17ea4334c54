//! Runner request types and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::JobKind;
use crate::extractor::ExtractorError;
use crate::session::SessionError;
use crate::tracker::TrackerError;

/// Errors raised while running jobs or sessions.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Session path did not resolve to a valid session.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Tracker persistence failed.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// The extractor collaborator reported a failure.
    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    /// A job id did not match any known job of the session.
    #[error("unknown job id for session {session}: {job_id}")]
    UnknownJobId { session: String, job_id: String },
}

/// Which job kinds a caller wants run for a session.
///
/// All flags default to false. What an entirely empty request means is
/// governed by [`EmptyRequestPolicy`], not hardcoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRequest {
    pub runtime: bool,
    pub face_camera: bool,
    pub body_camera: bool,
    pub actor_microcontroller: bool,
    pub sensor_microcontroller: bool,
    pub encoder_microcontroller: bool,
}

impl JobRequest {
    /// Request with every kind selected.
    pub fn all() -> Self {
        Self {
            runtime: true,
            face_camera: true,
            body_camera: true,
            actor_microcontroller: true,
            sensor_microcontroller: true,
            encoder_microcontroller: true,
        }
    }

    /// True when no kind is selected.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn requests(&self, kind: JobKind) -> bool {
        match kind {
            JobKind::Runtime => self.runtime,
            JobKind::FaceCamera => self.face_camera,
            JobKind::BodyCamera => self.body_camera,
            JobKind::ActorMicrocontroller => self.actor_microcontroller,
            JobKind::SensorMicrocontroller => self.sensor_microcontroller,
            JobKind::EncoderMicrocontroller => self.encoder_microcontroller,
        }
    }
}

/// What to do when a request selects no job kinds at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRequestPolicy {
    /// Treat an empty request as "run everything available". Convenient for
    /// operators who just point the pipeline at a session.
    #[default]
    RunAll,
    /// Treat an empty request literally and run nothing.
    RunNone,
}
