//! Clear command: scrub execution artifacts, saving each notebook in place.

use std::path::PathBuf;

use anyhow::Context;
use nbcheck_core::{Notebook, clear_outputs};

/// Clear every notebook in place.
///
/// Always returns true: clearing has no violations to find.
pub fn execute(notebooks: &[PathBuf]) -> anyhow::Result<bool> {
    for path in notebooks {
        let mut notebook = Notebook::read_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        clear_outputs(&mut notebook);
        notebook
            .write_to_file(path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        tracing::debug!("cleared {}", path.display());
    }
    Ok(true)
}
