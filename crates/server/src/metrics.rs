//! Prometheus metrics for observability.
//!
//! Counters live in the core crate next to the code that increments them;
//! this module owns the registry, the gauges collected dynamically from the
//! scheduler, and the text encoding for the scrape endpoint.

use once_cell::sync::Lazy;
use prometheus::{self, Encoder, IntGauge, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Sessions currently being processed (collected dynamically).
pub static SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "labtrack_sessions_active",
        "Number of sessions currently being processed",
    )
    .unwrap()
});

/// Sessions waiting behind the concurrency limit (collected dynamically).
pub static SESSIONS_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "labtrack_sessions_queued",
        "Number of sessions queued in the current batch",
    )
    .unwrap()
});

/// Whether a batch is live (1) or not (0).
pub static BATCH_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "labtrack_batch_active",
        "Whether a batch is currently being processed (1) or not (0)",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(SESSIONS_ACTIVE.clone())).unwrap();
    registry.register(Box::new(SESSIONS_QUEUED.clone())).unwrap();
    registry.register(Box::new(BATCH_ACTIVE.clone())).unwrap();

    for metric in labtrack_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Update gauges from current scheduler state. Called before each scrape.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    match state.scheduler().snapshot().await {
        Some(snapshot) => {
            SESSIONS_ACTIVE.set(snapshot.active.len() as i64);
            SESSIONS_QUEUED.set(snapshot.queued.len() as i64);
            BATCH_ACTIVE.set(if snapshot.is_live() { 1 } else { 0 });
        }
        None => {
            SESSIONS_ACTIVE.set(0);
            SESSIONS_QUEUED.set(0);
            BATCH_ACTIVE.set(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        BATCH_ACTIVE.set(0);
        let output = encode_metrics();
        assert!(output.contains("labtrack_batch_active"));
        assert!(output.contains("labtrack_sessions_active"));
    }
}
