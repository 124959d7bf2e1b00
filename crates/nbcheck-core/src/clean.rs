//! Clearing and checking execution artifacts.
//!
//! `clear_outputs` scrubs recorded outputs and prompt numbers from every
//! code cell; `check_cleared` verifies a document carries none. Both walk
//! cells in traversal order. A dirty cell is reported as a `Violation`,
//! which is data rather than an error, so callers can tell a non-compliant
//! notebook apart from a tool failure.

use std::fmt;

use crate::notebook::Notebook;

/// Why a code cell failed the compliance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// The cell records a prompt number from a prior run.
    HasPromptNumber,

    /// The cell carries recorded outputs.
    HasOutputs,
}

/// First execution artifact found by [`check_cleared`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Position of the offending cell in the full traversal.
    pub cell_index: usize,

    /// What the cell carries.
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::HasPromptNumber => {
                write!(f, "cell {} has a prompt number", self.cell_index)
            }
            ViolationKind::HasOutputs => write!(f, "cell {} has outputs", self.cell_index),
        }
    }
}

/// Clear recorded outputs and prompt numbers from every code cell.
///
/// Idempotent. Non-code cells and every other field are untouched.
pub fn clear_outputs(notebook: &mut Notebook) {
    for (_, cell) in notebook.code_cells_mut() {
        cell.outputs.clear();
        cell.prompt_number = None;
    }
}

/// Check that no code cell carries execution artifacts.
///
/// Scans in traversal order and stops at the first dirty cell; within a
/// cell the prompt number is inspected before the outputs.
pub fn check_cleared(notebook: &Notebook) -> Result<(), Violation> {
    for (index, cell) in notebook.code_cells() {
        if cell.prompt_number.is_some() {
            return Err(Violation {
                cell_index: index,
                kind: ViolationKind::HasPromptNumber,
            });
        }
        if !cell.outputs.is_empty() {
            return Err(Violation {
                cell_index: index,
                kind: ViolationKind::HasOutputs,
            });
        }
    }
    Ok(())
}
