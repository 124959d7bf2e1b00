//! Sequential cell execution against a kernel.
//!
//! The run loop submits one code cell at a time, waits for its reply with a
//! bounded timeout, classifies the outcome, and always continues to the next
//! cell: the kernel's interpreter state persists across cells within a run,
//! so later cells are worth observing even after an earlier failure. Only
//! infrastructure breakdown aborts a run.

use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::notebook::Notebook;
use crate::workdir::WorkdirGuard;

use super::process::{KernelLauncher, KernelProcess};
use super::protocol::{ExecuteReply, ExecuteStatus};

/// Default bounded wait for one cell's reply.
pub const DEFAULT_CELL_TIMEOUT: Duration = Duration::from_secs(20);

/// Transport seam between the run loop and a kernel.
///
/// One channel, in-order replies, at most one outstanding request.
/// `recv_reply` returning `Ok(None)` abandons the wait; the implementation
/// must guarantee that the late reply, if it ever arrives, is never handed
/// to a later call.
pub trait KernelChannel {
    /// Submit one execute request carrying `source`.
    fn submit(&mut self, source: &str) -> Result<()>;

    /// Wait up to `timeout` for the reply to the outstanding request.
    fn recv_reply(&mut self, timeout: Duration) -> Result<Option<ExecuteReply>>;
}

/// Options for one verification run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Bounded wait per cell.
    pub cell_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            cell_timeout: DEFAULT_CELL_TIMEOUT,
        }
    }
}

/// Why a cell counts as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The kernel reported an error status.
    Error {
        /// Diagnostic trace returned by the kernel.
        traceback: String,
    },

    /// No reply arrived within the bounded wait.
    Timeout,
}

/// One failed cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFailure {
    /// Position of the cell in the full traversal.
    pub cell_index: usize,

    /// Source text that was submitted.
    pub source: String,

    /// How it failed.
    pub kind: FailureKind,
}

/// Aggregate outcome of one run.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// Notebook name, when the document carries one.
    pub notebook_name: Option<String>,

    /// Code cells attempted.
    pub total: usize,

    /// Failed cells, in execution order.
    pub failures: Vec<CellFailure>,
}

impl ExecutionReport {
    /// A run succeeds when every attempted cell ran clean.
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Callback for run progress reporting.
pub trait RunCallback {
    /// Called before a cell is submitted.
    fn on_cell_started(&self, _cell_index: usize, _source: &str) {}

    /// Called when a cell's reply reports success.
    fn on_cell_ok(&self, _cell_index: usize) {}

    /// Called when a cell fails, by error reply or by timeout.
    fn on_cell_failed(&self, _failure: &CellFailure) {}
}

/// Runs every code cell of a document, in order, against one kernel channel.
pub struct CellRunner<C> {
    channel: C,
    options: RunOptions,
    callback: Option<Box<dyn RunCallback>>,
}

impl<C: KernelChannel> CellRunner<C> {
    /// Create a runner with default options.
    pub fn new(channel: C) -> Self {
        Self::with_options(channel, RunOptions::default())
    }

    /// Create a runner with explicit options.
    pub fn with_options(channel: C, options: RunOptions) -> Self {
        Self {
            channel,
            options,
            callback: None,
        }
    }

    /// Set the progress callback.
    pub fn set_callback(&mut self, callback: impl RunCallback + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Execute every code cell and aggregate the outcome.
    ///
    /// Cell-level failures and timeouts are recorded in the report and never
    /// abort the run; a hard error from the channel does.
    pub fn run(&mut self, notebook: &Notebook) -> Result<ExecutionReport> {
        let mut report = ExecutionReport {
            notebook_name: notebook.metadata.name.clone(),
            total: 0,
            failures: Vec::new(),
        };

        for (index, cell) in notebook.code_cells() {
            if let Some(ref callback) = self.callback {
                callback.on_cell_started(index, &cell.source);
            }
            tracing::debug!(cell = index, "submitting cell");

            self.channel.submit(&cell.source)?;
            let outcome = self.channel.recv_reply(self.options.cell_timeout)?;
            report.total += 1;

            let failure = match outcome {
                Some(reply) => match reply.status {
                    ExecuteStatus::Ok => None,
                    ExecuteStatus::Error => Some(CellFailure {
                        cell_index: index,
                        source: cell.source.clone(),
                        kind: FailureKind::Error {
                            traceback: reply.traceback.join("\n"),
                        },
                    }),
                },
                None => Some(CellFailure {
                    cell_index: index,
                    source: cell.source.clone(),
                    kind: FailureKind::Timeout,
                }),
            };

            match failure {
                None => {
                    if let Some(ref callback) = self.callback {
                        callback.on_cell_ok(index);
                    }
                }
                Some(failure) => {
                    if let Some(ref callback) = self.callback {
                        callback.on_cell_failed(&failure);
                    }
                    report.failures.push(failure);
                }
            }
        }

        tracing::info!(
            total = report.total,
            failed = report.failures.len(),
            "run finished"
        );
        Ok(report)
    }

    /// Give the channel back, e.g. to shut a kernel process down.
    pub fn into_channel(self) -> C {
        self.channel
    }
}

/// Verify one notebook document end to end.
///
/// Loads the document, enters its containing directory so executed code can
/// resolve relative paths, launches a kernel (readiness handshake included),
/// replays every code cell, and tears everything down again whatever the
/// outcome: channel and process first, then the working-directory scope.
pub fn verify_notebook(
    path: impl AsRef<Path>,
    launcher: &KernelLauncher,
    options: RunOptions,
    callback: Option<Box<dyn RunCallback>>,
) -> Result<ExecutionReport> {
    let path = path.as_ref();
    let notebook = Notebook::read_from_file(path)?;

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let _workdir = WorkdirGuard::enter(parent)?;

    let kernel = KernelProcess::launch(launcher)?;
    let mut runner = CellRunner::with_options(kernel, options);
    if let Some(callback) = callback {
        runner.callback = Some(callback);
    }

    // Teardown must happen before the result propagates, so the run's
    // outcome is held rather than returned early.
    let result = runner.run(&notebook);

    let kernel = runner.into_channel();
    if let Err(e) = kernel.shutdown() {
        tracing::warn!("kernel shutdown failed: {}", e);
    }

    result
}
