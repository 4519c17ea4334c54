pub mod catalog;
pub mod config;
pub mod extractor;
pub mod metrics;
pub mod runner;
pub mod scheduler;
pub mod session;
pub mod status;
pub mod testing;
pub mod tracker;

pub use catalog::{resolve_available, JobKind};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use extractor::{
    CameraLogId, CommandExtractor, CommandExtractorConfig, ControllerLogId, Extractor,
    ExtractorError,
};
pub use runner::{EmptyRequestPolicy, JobExecutor, JobRequest, RunnerError, SessionRunner};
pub use scheduler::{BatchReceipt, BatchScheduler, BatchSnapshot, SchedulerConfig, SchedulerError};
pub use session::{FsSessionResolver, SessionDescriptor, SessionError, SessionResolver};
pub use status::{BatchReport, SessionReport, SessionStatus, StatusError, StatusReporter};
pub use tracker::{JobId, JobRecord, JobStatus, ProcessingTracker, TrackerError};
