//! Session resolution.

use std::path::Path;

use super::types::{SessionDescriptor, SessionError};

/// Resolves filesystem paths into session descriptors.
///
/// Implemented externally for exotic storage layouts; [`FsSessionResolver`]
/// covers the conventional on-disk layout. Resolution failures are rejected
/// at the batch admission boundary and never enter the queue.
pub trait SessionResolver: Send + Sync {
    /// Resolve `path` into a session descriptor, or fail if the path does not
    /// point at a valid session.
    fn resolve(&self, path: &Path) -> Result<SessionDescriptor, SessionError>;
}

/// Resolver for the conventional session directory layout:
///
/// ```text
/// <session root>/
///   raw_data/
///     behavior/        <- raw log files
///   tracking_data/     <- tracker files (created on first processing run)
/// ```
#[derive(Debug, Clone, Default)]
pub struct FsSessionResolver;

impl FsSessionResolver {
    pub fn new() -> Self {
        Self
    }
}

impl SessionResolver for FsSessionResolver {
    fn resolve(&self, path: &Path) -> Result<SessionDescriptor, SessionError> {
        if !path.is_dir() {
            return Err(SessionError::NotASession {
                path: path.display().to_string(),
                reason: "directory does not exist".to_string(),
            });
        }

        let raw_data_dir = path.join("raw_data").join("behavior");
        if !raw_data_dir.is_dir() {
            return Err(SessionError::NotASession {
                path: path.display().to_string(),
                reason: "missing raw_data/behavior subdirectory".to_string(),
            });
        }

        let root = path.canonicalize().map_err(|source| SessionError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let session_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| SessionError::NotASession {
                path: path.display().to_string(),
                reason: "path has no terminal directory name".to_string(),
            })?;

        Ok(SessionDescriptor {
            raw_data_dir: root.join("raw_data").join("behavior"),
            tracking_data_dir: root.join("tracking_data"),
            session_name,
            root,
        })
    }
}
