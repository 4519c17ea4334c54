//! The extractor collaborator seam.
//!
//! Extractors perform the domain-specific numerical decoding of raw log
//! files. They are consumed as black boxes: each call either returns `Ok(())`
//! or fails, produces its output by writing files under the session's
//! processed-data subtree, and is safely re-invocable (a re-run overwrites
//! prior output).

mod command;

pub use command::{CommandExtractor, CommandExtractorConfig};

use async_trait::async_trait;
use thiserror::Error;

use crate::session::SessionDescriptor;

/// Camera log stream identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraLogId {
    Face,
    Body,
}

impl CameraLogId {
    /// Numeric source id used in raw log file names.
    pub fn as_u8(&self) -> u8 {
        match self {
            CameraLogId::Face => 51,
            CameraLogId::Body => 62,
        }
    }
}

/// Microcontroller log stream identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerLogId {
    Actor,
    Sensor,
    Encoder,
}

impl ControllerLogId {
    /// Numeric source id used in raw log file names.
    pub fn as_u8(&self) -> u8 {
        match self {
            ControllerLogId::Actor => 101,
            ControllerLogId::Sensor => 152,
            ControllerLogId::Encoder => 203,
        }
    }
}

/// Error propagated from an extractor invocation.
#[derive(Debug, Error)]
#[error("extractor failed for {job}: {message}")]
pub struct ExtractorError {
    /// Job name the extractor was running under.
    pub job: String,
    /// Collaborator-provided failure description.
    pub message: String,
}

impl ExtractorError {
    pub fn new(job: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            message: message.into(),
        }
    }
}

/// External log extraction collaborator.
///
/// `workers` is the CPU budget the extractor may fan out across internally;
/// the core never inspects extractor output.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Decode the session runtime event log.
    async fn process_runtime(&self, session: &SessionDescriptor) -> Result<(), ExtractorError>;

    /// Decode one camera's frame timestamp log.
    async fn process_camera_timestamps(
        &self,
        session: &SessionDescriptor,
        log_id: CameraLogId,
        workers: usize,
    ) -> Result<(), ExtractorError>;

    /// Decode one microcontroller's data stream log.
    async fn process_microcontroller(
        &self,
        session: &SessionDescriptor,
        log_id: ControllerLogId,
        workers: usize,
    ) -> Result<(), ExtractorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_ids_match_file_naming() {
        assert_eq!(CameraLogId::Face.as_u8(), 51);
        assert_eq!(CameraLogId::Body.as_u8(), 62);
        assert_eq!(ControllerLogId::Actor.as_u8(), 101);
        assert_eq!(ControllerLogId::Sensor.as_u8(), 152);
        assert_eq!(ControllerLogId::Encoder.as_u8(), 203);
    }

    #[test]
    fn test_extractor_error_display() {
        let err = ExtractorError::new("s1_runtime_processing", "bad log header");
        assert_eq!(
            err.to_string(),
            "extractor failed for s1_runtime_processing: bad log header"
        );
    }
}
