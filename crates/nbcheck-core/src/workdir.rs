//! Scoped working-directory changes.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Changes the process working directory for the lifetime of the guard.
///
/// The previous directory is recorded on entry and restored on drop, on
/// every exit path including panics. The working directory is process-wide
/// mutable state: hold at most one guard at a time.
#[derive(Debug)]
pub struct WorkdirGuard {
    previous: PathBuf,
}

impl WorkdirGuard {
    /// Enter `path`, remembering the current working directory.
    pub fn enter(path: impl AsRef<Path>) -> Result<Self> {
        let previous = env::current_dir()?;
        env::set_current_dir(path.as_ref())?;
        Ok(Self { previous })
    }

    /// The directory restored when the guard drops.
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Err(e) = env::set_current_dir(&self.previous) {
            tracing::warn!(
                "failed to restore working directory to {}: {}",
                self.previous.display(),
                e
            );
        }
    }
}
