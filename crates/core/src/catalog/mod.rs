//! The catalog of processing job kinds.
//!
//! The pipeline supports a fixed, closed set of job kinds. Each kind is bound
//! to the raw log file it consumes; a kind is *available* for a session when
//! that file is present in the session's raw-input directory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extractor::{CameraLogId, ControllerLogId};
use crate::session::SessionDescriptor;

/// One of the fixed processing job kinds of the behavior pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Runtime event log processing.
    Runtime,
    /// Face camera frame timestamp processing.
    FaceCamera,
    /// Body camera frame timestamp processing.
    BodyCamera,
    /// Actor microcontroller stream processing.
    ActorMicrocontroller,
    /// Sensor microcontroller stream processing.
    SensorMicrocontroller,
    /// Encoder microcontroller stream processing.
    EncoderMicrocontroller,
}

impl JobKind {
    /// All job kinds, in catalog order.
    pub fn all() -> [JobKind; 6] {
        [
            JobKind::Runtime,
            JobKind::FaceCamera,
            JobKind::BodyCamera,
            JobKind::ActorMicrocontroller,
            JobKind::SensorMicrocontroller,
            JobKind::EncoderMicrocontroller,
        ]
    }

    /// Base job name, joined with the session name to form the qualified
    /// job name used for identity.
    pub fn job_name(&self) -> &'static str {
        match self {
            JobKind::Runtime => "runtime_processing",
            JobKind::FaceCamera => "face_camera_processing",
            JobKind::BodyCamera => "body_camera_processing",
            JobKind::ActorMicrocontroller => "actor_microcontroller_processing",
            JobKind::SensorMicrocontroller => "sensor_microcontroller_processing",
            JobKind::EncoderMicrocontroller => "encoder_microcontroller_processing",
        }
    }

    /// Name of the raw log file this kind requires.
    pub fn log_file_name(&self) -> String {
        match self {
            JobKind::Runtime => "1_log.npz".to_string(),
            JobKind::FaceCamera => format!("{}_log.npz", CameraLogId::Face.as_u8()),
            JobKind::BodyCamera => format!("{}_log.npz", CameraLogId::Body.as_u8()),
            JobKind::ActorMicrocontroller => {
                format!("{}_log.npz", ControllerLogId::Actor.as_u8())
            }
            JobKind::SensorMicrocontroller => {
                format!("{}_log.npz", ControllerLogId::Sensor.as_u8())
            }
            JobKind::EncoderMicrocontroller => {
                format!("{}_log.npz", ControllerLogId::Encoder.as_u8())
            }
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.job_name())
    }
}

/// Determine which job kinds are available for `session`.
///
/// Availability is a pure function of filesystem state at call time: a kind
/// is available when its required log file exists in the session's raw-input
/// directory. File contents are not inspected. Callers must re-resolve before
/// each run rather than caching the result.
pub fn resolve_available(session: &SessionDescriptor) -> BTreeMap<JobKind, bool> {
    JobKind::all()
        .into_iter()
        .map(|kind| {
            let present = session.raw_data_dir.join(kind.log_file_name()).exists();
            (kind, present)
        })
        .collect()
}
