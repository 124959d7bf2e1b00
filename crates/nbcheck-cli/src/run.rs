//! Run command: replay notebooks against a kernel.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use nbcheck_core::{
    CellFailure, ExecutionReport, FailureKind, KernelLauncher, RunCallback, RunOptions,
    verify_notebook,
};

use crate::colors;

/// Progress callback printing one dot per cell and a block per failure.
///
/// Everything goes to the error stream; stdout stays free for data.
struct ProgressCallback;

impl RunCallback for ProgressCallback {
    fn on_cell_ok(&self, _cell_index: usize) {
        eprint!(".");
        io::stderr().flush().ok();
    }

    fn on_cell_failed(&self, failure: &CellFailure) {
        eprintln!();
        match &failure.kind {
            FailureKind::Error { traceback } => {
                eprintln!("{}FAILURE:{}", colors::RED, colors::RESET);
                eprintln!("{}", failure.source);
                eprintln!("-----");
                eprintln!("raised:");
                eprintln!("{}", traceback);
            }
            FailureKind::Timeout => {
                eprintln!("{}TIMEOUT:{}", colors::RED, colors::RESET);
                eprintln!("{}", failure.source);
            }
        }
    }
}

/// Run each notebook in turn; returns false if any cell failed.
pub fn execute(
    notebooks: &[PathBuf],
    kernel: Option<&Path>,
    timeout_secs: u64,
) -> anyhow::Result<bool> {
    let launcher = match kernel {
        Some(path) => KernelLauncher::new(path),
        None => KernelLauncher::discover()?,
    };
    let options = RunOptions {
        cell_timeout: Duration::from_secs(timeout_secs),
    };

    let mut all_clean = true;
    for path in notebooks {
        eprintln!("running {}", path.display());
        let report = verify_notebook(
            path,
            &launcher,
            options.clone(),
            Some(Box::new(ProgressCallback)),
        )?;
        print_summary(path, &report);
        if !report.success() {
            all_clean = false;
        }
    }
    Ok(all_clean)
}

fn print_summary(path: &Path, report: &ExecutionReport) {
    eprintln!();
    match &report.notebook_name {
        Some(name) => eprintln!("ran notebook {}", name),
        None => eprintln!("ran notebook {}", path.display()),
    }
    eprintln!("    ran {:3} cells", report.total);
    if !report.failures.is_empty() {
        eprintln!(
            "    {:3} cells raised exceptions",
            report.failures.len()
        );
    }
}
