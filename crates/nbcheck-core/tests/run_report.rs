//! Integration tests for the execution client's run loop.
//!
//! A scripted in-process channel stands in for the kernel so outcome
//! classification, ordering, and aggregation can be tested without spawning
//! a process. Channel-level behavior of a live kernel is covered by the
//! ignored tests in the process module.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use nbcheck_core::{
    Cell, CellRunner, CodeCell, Error, ExecuteReply, FailureKind, KernelChannel, Notebook,
    Result, RunCallback, RunOptions, TextCell, Worksheet,
};

// =============================================================================
// Test Helpers
// =============================================================================

/// Kernel channel that replays a fixed script of replies.
///
/// `None` entries simulate a wait that elapses. Submissions are recorded and
/// the one-outstanding-request discipline is asserted.
struct ScriptedChannel {
    replies: VecDeque<Option<ExecuteReply>>,
    submitted: Vec<String>,
    outstanding: bool,
}

impl ScriptedChannel {
    fn new(replies: impl IntoIterator<Item = Option<ExecuteReply>>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            submitted: Vec::new(),
            outstanding: false,
        }
    }
}

impl KernelChannel for ScriptedChannel {
    fn submit(&mut self, source: &str) -> Result<()> {
        assert!(!self.outstanding, "second request submitted before reply");
        self.outstanding = true;
        self.submitted.push(source.to_string());
        Ok(())
    }

    fn recv_reply(&mut self, _timeout: Duration) -> Result<Option<ExecuteReply>> {
        assert!(self.outstanding, "reply awaited with no outstanding request");
        self.outstanding = false;
        match self.replies.pop_front() {
            Some(reply) => Ok(reply),
            None => Err(Error::Channel("script exhausted".to_string())),
        }
    }
}

/// Channel whose submissions start failing at a given cell.
struct BrokenChannel {
    fail_at: usize,
    submissions: usize,
}

impl KernelChannel for BrokenChannel {
    fn submit(&mut self, _source: &str) -> Result<()> {
        if self.submissions == self.fail_at {
            return Err(Error::Channel("kernel went away".to_string()));
        }
        self.submissions += 1;
        Ok(())
    }

    fn recv_reply(&mut self, _timeout: Duration) -> Result<Option<ExecuteReply>> {
        Ok(Some(ExecuteReply::ok()))
    }
}

fn code(source: &str) -> Cell {
    Cell::Code(CodeCell {
        source: source.to_string(),
        ..CodeCell::default()
    })
}

fn markdown(text: &str) -> Cell {
    Cell::Markdown(TextCell {
        source: text.to_string(),
        ..TextCell::default()
    })
}

fn notebook_with(cells: Vec<Cell>) -> Notebook {
    let mut notebook = Notebook::new();
    notebook.metadata.name = Some("scripted".to_string());
    notebook.worksheets.push(Worksheet {
        cells,
        ..Worksheet::default()
    });
    notebook
}

// =============================================================================
// Classification & Resilience
// =============================================================================

#[test]
fn test_failing_cell_does_not_halt_the_run() {
    let notebook = notebook_with(vec![
        code("x = 1"),
        code("raise ValueError()"),
        code("print(x)"),
    ]);
    let channel = ScriptedChannel::new([
        Some(ExecuteReply::ok()),
        Some(ExecuteReply::error(["Traceback:", "ValueError"])),
        Some(ExecuteReply::ok()),
    ]);

    let mut runner = CellRunner::new(channel);
    let report = runner.run(&notebook).unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.failures.len(), 1);
    assert!(!report.success());
    assert_eq!(report.notebook_name.as_deref(), Some("scripted"));

    let failure = &report.failures[0];
    assert_eq!(failure.cell_index, 1);
    assert_eq!(failure.source, "raise ValueError()");
    assert_eq!(
        failure.kind,
        FailureKind::Error {
            traceback: "Traceback:\nValueError".to_string()
        }
    );

    // every cell was submitted, in document order
    let channel = runner.into_channel();
    assert_eq!(
        channel.submitted,
        vec!["x = 1", "raise ValueError()", "print(x)"]
    );
}

#[test]
fn test_timeout_is_reported_distinctly_and_run_continues() {
    let notebook = notebook_with(vec![code("slow()"), code("fast()")]);
    let channel = ScriptedChannel::new([None, Some(ExecuteReply::ok())]);

    let mut runner = CellRunner::new(channel);
    let report = runner.run(&notebook).unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::Timeout);
    assert_eq!(report.failures[0].cell_index, 0);

    assert_eq!(runner.into_channel().submitted.len(), 2);
}

#[test]
fn test_all_cells_clean_is_a_success() {
    let notebook = notebook_with(vec![code("a = 1"), code("b = 2")]);
    let channel =
        ScriptedChannel::new([Some(ExecuteReply::ok()), Some(ExecuteReply::ok())]);

    let report = CellRunner::new(channel).run(&notebook).unwrap();
    assert_eq!(report.total, 2);
    assert!(report.success());
}

#[test]
fn test_narrative_cells_are_skipped_but_keep_positions() {
    let notebook = notebook_with(vec![
        markdown("Intro"),
        code("boom()"),
        markdown("More prose"),
        code("ok()"),
    ]);
    let channel = ScriptedChannel::new([
        Some(ExecuteReply::error(["KeyError"])),
        Some(ExecuteReply::ok()),
    ]);

    let mut runner = CellRunner::new(channel);
    let report = runner.run(&notebook).unwrap();

    // only code cells are attempted, but positions index the full traversal
    assert_eq!(report.total, 2);
    assert_eq!(report.failures[0].cell_index, 1);
    assert_eq!(runner.into_channel().submitted, vec!["boom()", "ok()"]);
}

#[test]
fn test_empty_notebook_runs_clean() {
    let notebook = notebook_with(vec![markdown("Nothing to execute")]);
    let channel = ScriptedChannel::new([]);

    let report = CellRunner::new(channel).run(&notebook).unwrap();
    assert_eq!(report.total, 0);
    assert!(report.success());
}

// =============================================================================
// Infrastructure Failures
// =============================================================================

#[test]
fn test_channel_breakdown_aborts_the_run() {
    let notebook = notebook_with(vec![code("a = 1"), code("b = 2"), code("c = 3")]);
    let channel = BrokenChannel {
        fail_at: 1,
        submissions: 0,
    };

    let err = CellRunner::new(channel).run(&notebook).unwrap_err();
    assert!(matches!(err, Error::Channel(_)));
}

// =============================================================================
// Progress Callbacks
// =============================================================================

#[derive(Default)]
struct RecordingCallback {
    events: Rc<RefCell<Vec<String>>>,
}

impl RunCallback for RecordingCallback {
    fn on_cell_started(&self, cell_index: usize, _source: &str) {
        self.events.borrow_mut().push(format!("start {}", cell_index));
    }

    fn on_cell_ok(&self, cell_index: usize) {
        self.events.borrow_mut().push(format!("ok {}", cell_index));
    }

    fn on_cell_failed(&self, failure: &nbcheck_core::CellFailure) {
        self.events
            .borrow_mut()
            .push(format!("failed {}", failure.cell_index));
    }
}

#[test]
fn test_callback_sees_every_outcome() {
    let notebook = notebook_with(vec![code("a"), code("b"), code("c")]);
    let channel = ScriptedChannel::new([
        Some(ExecuteReply::ok()),
        Some(ExecuteReply::error(["boom"])),
        None,
    ]);

    let events = Rc::new(RefCell::new(Vec::new()));
    let mut runner = CellRunner::with_options(channel, RunOptions::default());
    runner.set_callback(RecordingCallback {
        events: events.clone(),
    });
    runner.run(&notebook).unwrap();

    assert_eq!(
        *events.borrow(),
        vec!["start 0", "ok 0", "start 1", "failed 1", "start 2", "failed 2"]
    );
}
