//! Check command: verify notebooks carry no execution artifacts.

use std::path::PathBuf;

use anyhow::Context;
use nbcheck_core::{Notebook, check_cleared};

/// Check every notebook; stops and returns false at the first violation.
pub fn execute(notebooks: &[PathBuf]) -> anyhow::Result<bool> {
    for path in notebooks {
        let notebook = Notebook::read_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        if let Err(violation) = check_cleared(&notebook) {
            eprintln!("{} in {}", violation, path.display());
            return Ok(false);
        }
    }
    Ok(true)
}
