//! Kernel execution client.
//!
//! Replays a document's code cells against an external kernel process over a
//! framed request/reply channel.
//!
//! - `protocol` - typed messages and framing
//! - `process` - kernel process lifecycle and bounded-wait channel
//! - `run` - sequential dispatch, classification, and aggregation

mod process;
mod protocol;
mod run;

pub use process::{KERNEL_ENV, KernelLauncher, KernelProcess};
pub use protocol::{
    ExecuteReply, ExecuteStatus, KernelReply, KernelRequest, read_message, write_message,
};
pub use run::{
    CellFailure, CellRunner, DEFAULT_CELL_TIMEOUT, ExecutionReport, FailureKind, KernelChannel,
    RunCallback, RunOptions, verify_notebook,
};
