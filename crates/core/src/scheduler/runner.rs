//! Batch scheduler implementation.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::config::SchedulerConfig;
use super::types::{BatchReceipt, BatchSnapshot, BatchState, SchedulerError};
use crate::extractor::Extractor;
use crate::metrics;
use crate::runner::{JobRequest, SessionRunner};
use crate::session::SessionResolver;

/// Admits batches of sessions and drives them to completion.
///
/// At most one batch is live at a time. Admission validates every session
/// path up front, sizes the concurrency budget from the machine, and returns
/// immediately; a background manager loop keeps up to `max_parallel` session
/// workers running until the batch drains.
pub struct BatchScheduler {
    config: SchedulerConfig,
    resolver: Arc<dyn SessionResolver>,
    session_runner: Arc<SessionRunner>,
    state: Arc<Mutex<Option<BatchState>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl BatchScheduler {
    pub fn new(
        config: SchedulerConfig,
        resolver: Arc<dyn SessionResolver>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        let session_runner = Arc::new(SessionRunner::new(
            resolver.clone(),
            extractor,
            config.empty_request_policy,
        ));
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            resolver,
            session_runner,
            state: Arc::new(Mutex::new(None)),
            shutdown_tx,
        }
    }

    /// Admit a batch of session paths for processing.
    ///
    /// Paths that fail session resolution are listed in the receipt and
    /// never enter the queue. A live batch rejects the whole request without
    /// touching the batch in flight.
    pub async fn start(
        &self,
        paths: &[PathBuf],
        request: JobRequest,
        requested_workers: Option<usize>,
    ) -> Result<BatchReceipt, SchedulerError> {
        let mut guard = self.state.lock().await;
        if let Some(batch) = guard.as_ref() {
            if batch.is_live() {
                return Err(SchedulerError::BatchActive {
                    active: batch.active.len(),
                    queued: batch.queued.len(),
                });
            }
        }

        let mut valid = Vec::new();
        let mut rejected = Vec::new();
        for path in paths {
            match self.resolver.resolve(path) {
                Ok(_) => valid.push(path.clone()),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "session path rejected");
                    rejected.push(path.display().to_string());
                }
            }
        }
        if valid.is_empty() {
            return Err(SchedulerError::NoValidSessions { rejected });
        }

        let workers = self.config.job_worker_budget(requested_workers);
        let max_parallel = self.config.max_parallel_sessions();
        let batch_id = Uuid::new_v4().to_string();
        let total = valid.len();
        let immediate_start = std::cmp::min(max_parallel, total);

        *guard = Some(BatchState {
            batch_id: batch_id.clone(),
            queued: valid.into_iter().collect(),
            active: HashMap::new(),
            completed: HashSet::new(),
            failed: HashSet::new(),
            request,
            workers,
            max_parallel,
        });
        drop(guard);

        self.spawn_manager();
        metrics::BATCHES_STARTED.inc();
        info!(
            batch_id = %batch_id,
            total,
            max_parallel,
            workers_per_session = workers,
            rejected = rejected.len(),
            "batch started"
        );

        Ok(BatchReceipt {
            batch_id,
            total,
            immediate_start,
            queued: total - immediate_start,
            max_parallel,
            workers_per_session: workers,
            rejected,
        })
    }

    /// Point-in-time view of the current batch, if any was ever started.
    pub async fn snapshot(&self) -> Option<BatchSnapshot> {
        self.state.lock().await.as_ref().map(|batch| batch.snapshot())
    }

    /// True while a batch has sessions queued or in flight.
    pub async fn is_active(&self) -> bool {
        self.state
            .lock()
            .await
            .as_ref()
            .map(|batch| batch.is_live())
            .unwrap_or(false)
    }

    /// Stop the manager loop. Sessions already in flight run to completion;
    /// queued sessions stay queued and are not admitted.
    pub fn stop(&self) {
        info!("batch scheduler stopping");
        let _ = self.shutdown_tx.send(());
    }

    fn spawn_manager(&self) {
        let state = self.state.clone();
        let session_runner = self.session_runner.clone();
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            loop {
                let drained = manage_pass(&state, &session_runner).await;
                if drained {
                    info!("batch drained");
                    break;
                }
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("batch manager stopped before batch drained");
                        break;
                    }
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
        });
    }
}

/// One manager pass. Returns true when the batch has drained.
async fn manage_pass(
    state: &Arc<Mutex<Option<BatchState>>>,
    session_runner: &Arc<SessionRunner>,
) -> bool {
    let mut guard = state.lock().await;
    let Some(batch) = guard.as_mut() else {
        return true;
    };

    // Workers normally move their own key out of active before finishing;
    // a finished handle still present means the worker panicked.
    let mut dead = Vec::new();
    batch.active.retain(|key, handle| {
        if handle.is_finished() {
            dead.push(key.clone());
            false
        } else {
            true
        }
    });
    for key in dead {
        error!(session = %key, "session worker terminated without reporting");
        batch.failed.insert(key);
    }

    if !batch.is_live() {
        return true;
    }

    while batch.active.len() < batch.max_parallel {
        let Some(path) = batch.queued.pop_front() else {
            break;
        };
        let key = path.display().to_string();
        let handle = spawn_worker(
            path,
            key.clone(),
            batch.request,
            batch.workers,
            state.clone(),
            session_runner.clone(),
        );
        batch.active.insert(key, handle);
    }

    false
}

/// Run one session and report the outcome into the batch state.
fn spawn_worker(
    path: PathBuf,
    key: String,
    request: JobRequest,
    workers: usize,
    state: Arc<Mutex<Option<BatchState>>>,
    session_runner: Arc<SessionRunner>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let verdict = session_runner.run(&path, &request, workers).await;

        let mut guard = state.lock().await;
        if let Some(batch) = guard.as_mut() {
            batch.active.remove(&key);
            match verdict {
                Ok(true) => {
                    batch.completed.insert(key);
                }
                Ok(false) => {
                    batch.failed.insert(key);
                }
                Err(e) => {
                    error!(session = %key, error = %e, "session worker failed");
                    batch.failed.insert(key);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::JobKind;
    use crate::session::FsSessionResolver;
    use crate::testing::{fixtures, MockExtractor};
    use tempfile::TempDir;

    fn scheduler(cpus: usize, extractor: Arc<MockExtractor>) -> BatchScheduler {
        let config = SchedulerConfig {
            cpu_override: Some(cpus),
            poll_interval_ms: 10,
            ..Default::default()
        };
        BatchScheduler::new(config, Arc::new(FsSessionResolver::new()), extractor)
    }

    async fn wait_until_drained(scheduler: &BatchScheduler) {
        for _ in 0..500 {
            if !scheduler.is_active().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("batch did not drain in time");
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_paths_but_admits_valid() {
        let dir = TempDir::new().unwrap();
        fixtures::make_session(dir.path(), "s1", &[JobKind::Runtime]);
        let scheduler = scheduler(64, Arc::new(MockExtractor::new()));

        let receipt = scheduler
            .start(
                &[dir.path().join("s1"), dir.path().join("missing")],
                JobRequest::default(),
                None,
            )
            .await
            .unwrap();

        assert_eq!(receipt.total, 1);
        assert_eq!(receipt.rejected.len(), 1);
        assert_eq!(receipt.max_parallel, 2);
        assert_eq!(receipt.workers_per_session, 30);
        wait_until_drained(&scheduler).await;
    }

    #[tokio::test]
    async fn test_start_with_only_invalid_paths() {
        let scheduler = scheduler(64, Arc::new(MockExtractor::new()));
        let result = scheduler
            .start(&[PathBuf::from("/nonexistent")], JobRequest::default(), None)
            .await;
        assert!(matches!(result, Err(SchedulerError::NoValidSessions { .. })));
    }

    #[tokio::test]
    async fn test_second_batch_rejected_while_live() {
        let dir = TempDir::new().unwrap();
        fixtures::make_session(dir.path(), "s1", &[JobKind::Runtime]);
        fixtures::make_session(dir.path(), "s2", &[JobKind::Runtime]);
        let extractor = Arc::new(MockExtractor::new());
        extractor.set_job_duration(Duration::from_millis(300));
        let scheduler = scheduler(34, extractor);

        let first = scheduler
            .start(
                &[dir.path().join("s1"), dir.path().join("s2")],
                JobRequest::default(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(first.max_parallel, 1);

        let second = scheduler
            .start(&[dir.path().join("s1")], JobRequest::default(), None)
            .await;
        assert!(matches!(second, Err(SchedulerError::BatchActive { .. })));

        // First batch is untouched and still drains normally.
        wait_until_drained(&scheduler).await;
        let snapshot = scheduler.snapshot().await.unwrap();
        assert_eq!(snapshot.batch_id, first.batch_id);
        assert_eq!(snapshot.completed.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_partitions_and_drains() {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for i in 0..5 {
            let name = format!("s{i}");
            fixtures::make_session(dir.path(), &name, &[JobKind::Runtime]);
            paths.push(dir.path().join(&name));
        }
        let extractor = Arc::new(MockExtractor::new());
        extractor.set_job_duration(Duration::from_millis(50));
        let scheduler = scheduler(64, extractor);

        let receipt = scheduler
            .start(&paths, JobRequest::default(), None)
            .await
            .unwrap();
        assert_eq!(receipt.total, 5);
        assert_eq!(receipt.immediate_start, 2);
        assert_eq!(receipt.queued, 3);

        // The four sets always partition the batch and never exceed the
        // concurrency limit.
        loop {
            let snapshot = scheduler.snapshot().await.unwrap();
            assert!(snapshot.active.len() <= 2);
            let accounted = snapshot.queued.len()
                + snapshot.active.len()
                + snapshot.completed.len()
                + snapshot.failed.len();
            assert_eq!(accounted, 5);
            if !snapshot.is_live() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let snapshot = scheduler.snapshot().await.unwrap();
        assert_eq!(snapshot.completed.len(), 5);
        assert!(snapshot.failed.is_empty());
    }

    #[tokio::test]
    async fn test_failed_session_lands_in_failed_set() {
        let dir = TempDir::new().unwrap();
        fixtures::make_session(dir.path(), "bad", &[JobKind::FaceCamera]);
        let extractor = Arc::new(MockExtractor::new());
        extractor.fail_job(JobKind::FaceCamera, "bad header");
        let scheduler = scheduler(64, extractor);

        scheduler
            .start(&[dir.path().join("bad")], JobRequest::default(), None)
            .await
            .unwrap();
        wait_until_drained(&scheduler).await;

        let snapshot = scheduler.snapshot().await.unwrap();
        assert_eq!(snapshot.failed.len(), 1);
        assert!(snapshot.completed.is_empty());
    }

    #[tokio::test]
    async fn test_new_batch_admitted_after_drain() {
        let dir = TempDir::new().unwrap();
        fixtures::make_session(dir.path(), "s1", &[JobKind::Runtime]);
        let scheduler = scheduler(64, Arc::new(MockExtractor::new()));

        let first = scheduler
            .start(&[dir.path().join("s1")], JobRequest::default(), None)
            .await
            .unwrap();
        wait_until_drained(&scheduler).await;

        let second = scheduler
            .start(&[dir.path().join("s1")], JobRequest::default(), None)
            .await
            .unwrap();
        assert_ne!(first.batch_id, second.batch_id);
        wait_until_drained(&scheduler).await;
    }
}
