//! Wire protocol for the kernel channel.
//!
//! Messages are length-prefixed JSON over the kernel's stdin/stdout.
//! Format: 4-byte length (u32 LE) + JSON-encoded message. The channel is
//! in-order and carries at most one outstanding request, so replies are
//! correlated to requests purely by position.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound on a single frame; anything larger is a corrupt stream.
const MAX_FRAME_LEN: usize = 100 * 1024 * 1024;

/// Request sent from the client to the kernel process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KernelRequest {
    /// Inert readiness probe; answered with `Pong` and no side effects.
    Ping,

    /// Execute one cell's source text in the kernel's interpreter.
    Execute {
        /// Source text to run.
        source: String,
    },

    /// Ask the kernel to exit cleanly.
    Shutdown,
}

/// Reply sent from the kernel process to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KernelReply {
    /// Answer to `Ping`.
    Pong,

    /// Outcome of an `Execute` request.
    Execute(ExecuteReply),

    /// Acknowledgement of `Shutdown`.
    ShuttingDown,
}

/// Outcome of executing one cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteReply {
    /// Whether the submitted source ran to completion.
    pub status: ExecuteStatus,

    /// Diagnostic trace captured by the kernel when `status` is `Error`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traceback: Vec<String>,
}

impl ExecuteReply {
    /// A successful reply.
    pub fn ok() -> Self {
        Self {
            status: ExecuteStatus::Ok,
            traceback: Vec::new(),
        }
    }

    /// An error reply carrying a diagnostic trace.
    pub fn error(traceback: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            status: ExecuteStatus::Error,
            traceback: traceback.into_iter().map(Into::into).collect(),
        }
    }
}

/// Execution status reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecuteStatus {
    Ok,
    Error,
}

/// Write a message using length-prefixed JSON encoding.
pub fn write_message<W: Write>(writer: &mut W, message: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec(message)
        .map_err(|e| Error::Serialization(format!("failed to encode channel message: {}", e)))?;

    let len = bytes.len() as u32;
    writer
        .write_all(&len.to_le_bytes())
        .map_err(|e| Error::Channel(format!("failed to write message length: {}", e)))?;
    writer
        .write_all(&bytes)
        .map_err(|e| Error::Channel(format!("failed to write message body: {}", e)))?;
    writer
        .flush()
        .map_err(|e| Error::Channel(format!("failed to flush channel: {}", e)))?;

    Ok(())
}

/// Read a message using length-prefixed JSON encoding.
pub fn read_message<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    let mut len_bytes = [0u8; 4];
    reader
        .read_exact(&mut len_bytes)
        .map_err(|e| Error::Channel(format!("failed to read message length: {}", e)))?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    if len > MAX_FRAME_LEN {
        return Err(Error::Channel(format!("message too large: {} bytes", len)));
    }

    let mut bytes = vec![0u8; len];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| Error::Channel(format!("failed to read message body: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Serialization(format!("failed to decode channel message: {}", e)))
}
