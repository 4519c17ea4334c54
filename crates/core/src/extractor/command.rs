//! Extractor backed by an external command-line tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use super::{CameraLogId, ControllerLogId, Extractor, ExtractorError};
use crate::session::SessionDescriptor;

/// Configuration for the command-line extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandExtractorConfig {
    /// Extraction tool to invoke. Resolved through PATH unless absolute.
    pub program: String,
    /// Extra arguments appended to every invocation.
    pub extra_args: Vec<String>,
}

impl Default for CommandExtractorConfig {
    fn default() -> Self {
        Self {
            program: "sl-behavior-extract".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Extractor that shells out to the numerical extraction tool, one process
/// per job. The tool fans out across its worker budget internally; this
/// wrapper only translates jobs into invocations and exit codes into errors.
pub struct CommandExtractor {
    config: CommandExtractorConfig,
}

impl CommandExtractor {
    pub fn new(config: CommandExtractorConfig) -> Self {
        Self { config }
    }

    async fn invoke(&self, job: String, args: Vec<String>) -> Result<(), ExtractorError> {
        debug!(program = %self.config.program, ?args, "invoking extractor");
        let output = Command::new(&self.config.program)
            .args(&args)
            .args(&self.config.extra_args)
            .output()
            .await
            .map_err(|e| {
                ExtractorError::new(
                    job.clone(),
                    format!("failed to launch {}: {}", self.config.program, e),
                )
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            Err(ExtractorError::new(
                job,
                format!(
                    "{} exited with code {:?}: {}",
                    self.config.program,
                    output.status.code(),
                    tail
                ),
            ))
        }
    }
}

#[async_trait]
impl Extractor for CommandExtractor {
    async fn process_runtime(&self, session: &SessionDescriptor) -> Result<(), ExtractorError> {
        let job = session.qualified_job_name("runtime_processing");
        let args = vec![
            "runtime".to_string(),
            "--session".to_string(),
            session.root.display().to_string(),
        ];
        self.invoke(job, args).await
    }

    async fn process_camera_timestamps(
        &self,
        session: &SessionDescriptor,
        log_id: CameraLogId,
        workers: usize,
    ) -> Result<(), ExtractorError> {
        let job = format!("{}_camera_{}", session.session_name, log_id.as_u8());
        let args = vec![
            "camera".to_string(),
            "--session".to_string(),
            session.root.display().to_string(),
            "--log-id".to_string(),
            log_id.as_u8().to_string(),
            "--workers".to_string(),
            workers.to_string(),
        ];
        self.invoke(job, args).await
    }

    async fn process_microcontroller(
        &self,
        session: &SessionDescriptor,
        log_id: ControllerLogId,
        workers: usize,
    ) -> Result<(), ExtractorError> {
        let job = format!("{}_microcontroller_{}", session.session_name, log_id.as_u8());
        let args = vec![
            "microcontroller".to_string(),
            "--session".to_string(),
            session.root.display().to_string(),
            "--log-id".to_string(),
            log_id.as_u8().to_string(),
            "--workers".to_string(),
            workers.to_string(),
        ];
        self.invoke(job, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn session() -> SessionDescriptor {
        SessionDescriptor {
            root: PathBuf::from("/data/s1"),
            session_name: "s1".to_string(),
            raw_data_dir: PathBuf::from("/data/s1/raw_data/behavior"),
            tracking_data_dir: PathBuf::from("/data/s1/tracking_data"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_an_extractor_error() {
        let extractor = CommandExtractor::new(CommandExtractorConfig {
            program: "/nonexistent/extractor-binary".to_string(),
            extra_args: Vec::new(),
        });
        let result = extractor.process_runtime(&session()).await;
        let err = result.unwrap_err();
        assert!(err.message.contains("failed to launch"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_an_extractor_error() {
        let extractor = CommandExtractor::new(CommandExtractorConfig {
            program: "false".to_string(),
            extra_args: Vec::new(),
        });
        let result = extractor
            .process_camera_timestamps(&session(), CameraLogId::Face, 2)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_zero_exit_succeeds() {
        let extractor = CommandExtractor::new(CommandExtractorConfig {
            program: "true".to_string(),
            extra_args: Vec::new(),
        });
        extractor
            .process_microcontroller(&session(), ControllerLogId::Encoder, 2)
            .await
            .unwrap();
    }
}
