//! Scheduler configuration and the concurrency budget arithmetic.

use serde::{Deserialize, Serialize};

use crate::runner::EmptyRequestPolicy;

/// Configuration for the batch scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Cores kept free for the OS and unrelated services when sizing a
    /// job's worker budget.
    pub reserved_cores: usize,

    /// Hard cap on workers handed to a single job. Extractor throughput
    /// stops scaling beyond this.
    pub max_job_cores: usize,

    /// Manager loop poll interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Override the detected CPU count. Intended for tests and for
    /// containers whose visible core count lies.
    pub cpu_override: Option<usize>,

    /// What a request selecting no job kinds means.
    pub empty_request_policy: EmptyRequestPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reserved_cores: 4,
            max_job_cores: 30,
            poll_interval_ms: 1000,
            cpu_override: None,
            empty_request_policy: EmptyRequestPolicy::default(),
        }
    }
}

impl SchedulerConfig {
    fn cpu_count(&self) -> usize {
        match self.cpu_override {
            Some(cpus) => cpus,
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    /// How many sessions may process concurrently.
    ///
    /// Rounds `cpu / max_job_cores` to the nearest whole session, never
    /// below one: a machine with fewer cores than one full job budget still
    /// processes one session at a time.
    pub fn max_parallel_sessions(&self) -> usize {
        let cpus = self.cpu_count();
        std::cmp::max(1, (cpus + self.max_job_cores / 2) / self.max_job_cores)
    }

    /// Worker budget handed to each session's jobs.
    ///
    /// An explicit request is honored up to the cap. Otherwise the budget is
    /// the machine's cores minus the reserve, capped, and at least one.
    pub fn job_worker_budget(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(n) if n > 0 => std::cmp::min(n, self.max_job_cores),
            _ => {
                let cpus = self.cpu_count();
                let available = std::cmp::max(1, cpus.saturating_sub(self.reserved_cores));
                std::cmp::min(available, self.max_job_cores)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_cpus(cpus: usize) -> SchedulerConfig {
        SchedulerConfig {
            cpu_override: Some(cpus),
            ..Default::default()
        }
    }

    #[test]
    fn test_max_parallel_sessions_rounding() {
        assert_eq!(config_with_cpus(34).max_parallel_sessions(), 1);
        assert_eq!(config_with_cpus(45).max_parallel_sessions(), 2);
        assert_eq!(config_with_cpus(64).max_parallel_sessions(), 2);
        assert_eq!(config_with_cpus(2).max_parallel_sessions(), 1);
    }

    #[test]
    fn test_job_worker_budget_explicit_request() {
        let config = config_with_cpus(64);
        assert_eq!(config.job_worker_budget(Some(8)), 8);
        // Capped at max_job_cores.
        assert_eq!(config.job_worker_budget(Some(100)), 30);
        // Zero is treated as unspecified.
        assert_eq!(config.job_worker_budget(Some(0)), 30);
    }

    #[test]
    fn test_job_worker_budget_derived() {
        assert_eq!(config_with_cpus(64).job_worker_budget(None), 30);
        assert_eq!(config_with_cpus(12).job_worker_budget(None), 8);
        // Never zero, even on tiny machines.
        assert_eq!(config_with_cpus(2).job_worker_budget(None), 1);
    }

    #[test]
    fn test_defaults_deserialize_from_empty_table() {
        let config: SchedulerConfig = toml::from_str("").unwrap();
        assert_eq!(config.reserved_cores, 4);
        assert_eq!(config.max_job_cores, 30);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.cpu_override, None);
    }
}
