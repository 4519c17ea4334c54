//! Testing utilities and mock implementations.
//!
//! Provides a mock extractor and session fixtures so runner, scheduler, and
//! status tests need no real log files.

mod mock_extractor;

pub use mock_extractor::MockExtractor;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::fs;
    use std::path::Path;

    use crate::catalog::JobKind;
    use crate::session::{FsSessionResolver, SessionDescriptor, SessionResolver};

    /// Build a conventional session directory under `root` with the log
    /// files for `kinds` present, and return its resolved descriptor.
    pub fn make_session(root: &Path, name: &str, kinds: &[JobKind]) -> SessionDescriptor {
        let session_dir = root.join(name);
        let raw = session_dir.join("raw_data").join("behavior");
        fs::create_dir_all(&raw).unwrap();
        for kind in kinds {
            fs::write(raw.join(kind.log_file_name()), b"").unwrap();
        }
        FsSessionResolver::new().resolve(&session_dir).unwrap()
    }
}
