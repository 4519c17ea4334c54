use std::sync::Arc;

use labtrack_core::{BatchScheduler, Config, StatusReporter};

/// Shared application state
pub struct AppState {
    config: Config,
    scheduler: Arc<BatchScheduler>,
    reporter: StatusReporter,
}

impl AppState {
    pub fn new(config: Config, scheduler: Arc<BatchScheduler>, reporter: StatusReporter) -> Self {
        Self {
            config,
            scheduler,
            reporter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scheduler(&self) -> &BatchScheduler {
        &self.scheduler
    }

    pub fn reporter(&self) -> &StatusReporter {
        &self.reporter
    }
}
