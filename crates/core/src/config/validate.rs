use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Scheduler core cap and poll interval are nonzero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.scheduler.max_job_cores == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.max_job_cores cannot be 0".to_string(),
        ));
    }

    if config.scheduler.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.extractor.program.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "extractor.program cannot be empty".to_string(),
        ));
    }

    Ok(())
}
