//! File-backed tracker implementation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::types::{JobId, JobRecord, JobStatus, TrackerError};
use crate::session::SessionDescriptor;

/// Name of the tracker file inside a session's tracking-data directory.
pub const TRACKER_FILE_NAME: &str = "behavior_processing_tracker.json";

/// Tracker bound to one session's tracker file.
///
/// Every mutating operation rewrites the whole file atomically (temp file
/// plus rename), so concurrent readers observe either the previous or the
/// new state, never a partial write.
#[derive(Debug)]
pub struct ProcessingTracker {
    path: PathBuf,
    jobs: BTreeMap<JobId, JobRecord>,
}

impl ProcessingTracker {
    /// Bind a fresh, empty tracker to `session`. Does not touch the
    /// filesystem until the first mutation.
    pub fn new(session: &SessionDescriptor) -> Self {
        Self {
            path: session.tracking_data_dir.join(TRACKER_FILE_NAME),
            jobs: BTreeMap::new(),
        }
    }

    /// Load the tracker persisted for `session`.
    ///
    /// An absent file is the normal never-processed case and yields an empty
    /// tracker. A present but unparseable file is an error.
    pub fn from_persisted(session: &SessionDescriptor) -> Result<Self, TrackerError> {
        let path = session.tracking_data_dir.join(TRACKER_FILE_NAME);
        let jobs = match fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| TrackerError::Corrupt {
                    path: path.display().to_string(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(TrackerError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Ok(Self { path, jobs })
    }

    /// Deterministic job id for `qualified_job_name` of the session rooted at
    /// `session_root`.
    ///
    /// Pure function of its inputs; requires no live tracker, so remote
    /// callers can compute ids for sessions they cannot read.
    pub fn generate_job_id(session_root: &Path, qualified_job_name: &str) -> JobId {
        let mut hasher = Sha256::new();
        hasher.update(session_root.display().to_string().as_bytes());
        hasher.update(b":");
        hasher.update(qualified_job_name.as_bytes());
        let digest = hasher.finalize();

        let mut hex = String::with_capacity(32);
        for byte in &digest[..16] {
            hex.push_str(&format!("{:02x}", byte));
        }
        JobId::from_digest(hex)
    }

    /// Register `ids` as PENDING, resetting any prior record for each listed
    /// id. Records for unlisted ids are left untouched.
    pub fn initialize_jobs(&mut self, ids: &[JobId]) -> Result<(), TrackerError> {
        for id in ids {
            self.jobs.insert(id.clone(), JobRecord::pending());
        }
        self.persist()
    }

    /// Mark a job RUNNING. Persisted before the caller dispatches the job
    /// body, so an interruption leaves the RUNNING marker behind as evidence.
    pub fn start_job(&mut self, id: &JobId) -> Result<(), TrackerError> {
        let record = self.jobs.entry(id.clone()).or_insert_with(JobRecord::pending);
        record.status = JobStatus::Running;
        record.started_at = Some(Utc::now());
        record.ended_at = None;
        self.persist()
    }

    /// Mark a job SUCCEEDED.
    pub fn complete_job(&mut self, id: &JobId) -> Result<(), TrackerError> {
        let record = self.jobs.entry(id.clone()).or_insert_with(JobRecord::pending);
        record.status = JobStatus::Succeeded;
        record.ended_at = Some(Utc::now());
        self.persist()
    }

    /// Mark a job FAILED.
    ///
    /// Valid from any state, including for ids with no existing record:
    /// failure recording must always be possible so that dispatch errors for
    /// jobs that never started still leave a durable trace.
    pub fn fail_job(&mut self, id: &JobId) -> Result<(), TrackerError> {
        let record = self.jobs.entry(id.clone()).or_insert_with(JobRecord::pending);
        record.status = JobStatus::Failed;
        record.ended_at = Some(Utc::now());
        self.persist()
    }

    /// All tracked jobs, keyed by id.
    pub fn jobs(&self) -> &BTreeMap<JobId, JobRecord> {
        &self.jobs
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), TrackerError> {
        let io_err = |source| TrackerError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(&self.jobs).map_err(|source| {
            TrackerError::Serialize {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), jobs = self.jobs.len(), "tracker persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn test_session(dir: &TempDir) -> SessionDescriptor {
        SessionDescriptor {
            root: dir.path().to_path_buf(),
            session_name: "s1".to_string(),
            raw_data_dir: dir.path().join("raw_data").join("behavior"),
            tracking_data_dir: dir.path().join("tracking_data"),
        }
    }

    #[test]
    fn test_generate_job_id_deterministic() {
        let root = PathBuf::from("/data/s1");
        let a = ProcessingTracker::generate_job_id(&root, "s1_runtime_processing");
        let b = ProcessingTracker::generate_job_id(&root, "s1_runtime_processing");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_job_id_distinct_inputs() {
        let root = PathBuf::from("/data/s1");
        let a = ProcessingTracker::generate_job_id(&root, "s1_runtime_processing");
        let b = ProcessingTracker::generate_job_id(&root, "s1_face_camera_processing");
        let c = ProcessingTracker::generate_job_id(&PathBuf::from("/data/s2"), "s1_runtime_processing");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_lifecycle_round_trip() {
        let dir = TempDir::new().unwrap();
        let session = test_session(&dir);
        let id = ProcessingTracker::generate_job_id(&session.root, "s1_runtime_processing");

        let mut tracker = ProcessingTracker::new(&session);
        tracker.initialize_jobs(std::slice::from_ref(&id)).unwrap();
        tracker.start_job(&id).unwrap();

        let reloaded = ProcessingTracker::from_persisted(&session).unwrap();
        assert_eq!(reloaded.jobs()[&id].status, JobStatus::Running);
        assert!(reloaded.jobs()[&id].started_at.is_some());

        tracker.complete_job(&id).unwrap();
        let reloaded = ProcessingTracker::from_persisted(&session).unwrap();
        assert_eq!(reloaded.jobs()[&id].status, JobStatus::Succeeded);
        assert!(reloaded.jobs()[&id].ended_at.is_some());
    }

    #[test]
    fn test_from_persisted_absent_file() {
        let dir = TempDir::new().unwrap();
        let tracker = ProcessingTracker::from_persisted(&test_session(&dir)).unwrap();
        assert!(tracker.jobs().is_empty());
    }

    #[test]
    fn test_fail_unknown_job_persists_record() {
        let dir = TempDir::new().unwrap();
        let session = test_session(&dir);
        let id = ProcessingTracker::generate_job_id(&session.root, "s1_nonexistent");

        let mut tracker = ProcessingTracker::new(&session);
        tracker.fail_job(&id).unwrap();

        let reloaded = ProcessingTracker::from_persisted(&session).unwrap();
        assert_eq!(reloaded.jobs()[&id].status, JobStatus::Failed);
    }

    #[test]
    fn test_initialize_resets_listed_ids_only() {
        let dir = TempDir::new().unwrap();
        let session = test_session(&dir);
        let kept = ProcessingTracker::generate_job_id(&session.root, "s1_kept");
        let reset = ProcessingTracker::generate_job_id(&session.root, "s1_reset");

        let mut tracker = ProcessingTracker::new(&session);
        tracker.initialize_jobs(&[kept.clone(), reset.clone()]).unwrap();
        tracker.complete_job(&kept).unwrap();
        tracker.fail_job(&reset).unwrap();

        tracker.initialize_jobs(std::slice::from_ref(&reset)).unwrap();
        assert_eq!(tracker.jobs()[&kept].status, JobStatus::Succeeded);
        assert_eq!(tracker.jobs()[&reset].status, JobStatus::Pending);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let session = test_session(&dir);
        fs::create_dir_all(&session.tracking_data_dir).unwrap();
        fs::write(
            session.tracking_data_dir.join(TRACKER_FILE_NAME),
            b"not json {",
        )
        .unwrap();

        let result = ProcessingTracker::from_persisted(&session);
        assert!(matches!(result, Err(TrackerError::Corrupt { .. })));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let session = test_session(&dir);
        let id = ProcessingTracker::generate_job_id(&session.root, "s1_job");

        let mut tracker = ProcessingTracker::new(&session);
        tracker.initialize_jobs(std::slice::from_ref(&id)).unwrap();

        let entries: Vec<_> = fs::read_dir(&session.tracking_data_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec![TRACKER_FILE_NAME.to_string()]);
    }
}
