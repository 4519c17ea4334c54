//! Prometheus metrics for core components.

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

/// Jobs finished, by result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("labtrack_jobs_total", "Total processing jobs finished"),
        &["result"], // "succeeded", "failed"
    )
    .unwrap()
});

/// Sessions finished, by result.
pub static SESSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("labtrack_sessions_total", "Total sessions finished"),
        &["result"], // "succeeded", "failed"
    )
    .unwrap()
});

/// Batches admitted for processing.
pub static BATCHES_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "labtrack_batches_started_total",
        "Total processing batches started",
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(SESSIONS_TOTAL.clone()),
        Box::new(BATCHES_STARTED.clone()),
    ]
}
