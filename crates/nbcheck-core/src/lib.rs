//! Core engine for nbcheck notebook verification tools.
//!
//! This crate provides:
//! - Notebook document model with ordered cell traversal
//! - Output normalizer and compliance checker
//! - Kernel execution client for replaying code cells
//! - Scoped working-directory guard

pub mod clean;
pub mod error;
pub mod kernel;
pub mod notebook;
pub mod workdir;

pub use clean::{Violation, ViolationKind, check_cleared, clear_outputs};
pub use error::{Error, Result};
pub use kernel::{
    CellFailure, CellRunner, DEFAULT_CELL_TIMEOUT, ExecuteReply, ExecuteStatus, ExecutionReport,
    FailureKind, KernelChannel, KernelLauncher, KernelProcess, RunCallback, RunOptions,
    verify_notebook,
};
pub use notebook::{
    Cell, CellKind, CodeCell, HeadingCell, NBFORMAT, Notebook, NotebookMetadata, Output, TextCell,
    Worksheet,
};
pub use workdir::WorkdirGuard;
