//! Kernel process management.
//!
//! `KernelProcess` owns one spawned kernel: its stdin for requests, a reader
//! thread draining replies from its stdout, and the child handle itself. A
//! dedicated reader thread feeding an mpsc channel is what makes reply waits
//! boundable; the client itself still waits on exactly one thing at a time.

use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use crate::error::{Error, Result};

use super::protocol::{ExecuteReply, KernelReply, KernelRequest, read_message, write_message};
use super::run::KernelChannel;

/// Environment variable naming the kernel executable.
pub const KERNEL_ENV: &str = "NBCHECK_KERNEL";

/// Bounded wait for the readiness handshake and for shutdown.
const CONTROL_TIMEOUT: Duration = Duration::from_secs(5);

fn kernel_binary_name() -> &'static str {
    if cfg!(windows) {
        "nbcheck-kernel.exe"
    } else {
        "nbcheck-kernel"
    }
}

/// How to start a kernel process.
#[derive(Debug, Clone)]
pub struct KernelLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl KernelLauncher {
    /// Launch the given executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument to the kernel command line.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Find a kernel executable.
    ///
    /// Looks in the following order:
    /// 1. `NBCHECK_KERNEL` environment variable
    /// 2. Same directory as the current executable
    /// 3. System PATH
    pub fn discover() -> Result<Self> {
        if let Ok(path) = std::env::var(KERNEL_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(Self::new(path));
            }
        }

        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            let candidate = exe_dir.join(kernel_binary_name());
            if candidate.exists() {
                return Ok(Self::new(candidate));
            }
        }

        if let Ok(path) = which::which(kernel_binary_name()) {
            return Ok(Self::new(path));
        }

        Err(Error::Kernel(format!(
            "could not find a kernel executable; set {} or pass one explicitly",
            KERNEL_ENV
        )))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Handle to a live kernel process.
///
/// Exclusively owned by one run. The process is killed when the handle is
/// dropped without an explicit [`KernelProcess::shutdown`].
pub struct KernelProcess {
    child: Child,
    stdin: BufWriter<std::process::ChildStdin>,
    replies: Receiver<Result<KernelReply>>,
    reader: Option<JoinHandle<()>>,
    /// Replies still owed to requests whose wait was abandoned.
    stale_replies: usize,
    killed: bool,
}

impl KernelProcess {
    /// Spawn a kernel and confirm the channel is live.
    ///
    /// The kernel's own diagnostic stream is discarded. A `Ping` is
    /// submitted and its `Pong` awaited before this returns, so a
    /// successfully launched kernel is ready for execute requests.
    pub fn launch(launcher: &KernelLauncher) -> Result<Self> {
        let mut child = launcher
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Kernel(format!("failed to spawn kernel process: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Channel("failed to open kernel stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Channel("failed to open kernel stdout".to_string()))?;

        let (tx, rx) = mpsc::channel();
        let reader = thread::spawn(move || {
            let mut stdout = BufReader::new(stdout);
            loop {
                let frame = read_message::<_, KernelReply>(&mut stdout);
                let broken = frame.is_err();
                if tx.send(frame).is_err() || broken {
                    break;
                }
            }
        });

        let mut kernel = Self {
            child,
            stdin: BufWriter::new(stdin),
            replies: rx,
            reader: Some(reader),
            stale_replies: 0,
            killed: false,
        };

        kernel.send(&KernelRequest::Ping)?;
        match kernel.recv(CONTROL_TIMEOUT)? {
            Some(KernelReply::Pong) => Ok(kernel),
            Some(other) => Err(Error::Channel(format!(
                "unexpected readiness reply: {:?}",
                other
            ))),
            None => Err(Error::Kernel(
                "kernel did not answer the readiness ping".to_string(),
            )),
        }
    }

    fn send(&mut self, request: &KernelRequest) -> Result<()> {
        if self.killed {
            return Err(Error::Channel("kernel has been shut down".to_string()));
        }
        write_message(&mut self.stdin, request)
    }

    /// Wait up to `timeout` for the next reply frame; `Ok(None)` means the
    /// wait elapsed.
    fn recv(&mut self, timeout: Duration) -> Result<Option<KernelReply>> {
        match self.replies.recv_timeout(timeout) {
            Ok(frame) => frame.map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(Error::Channel("kernel reply stream closed".to_string()))
            }
        }
    }

    /// Stop the kernel: ask it to exit, wait briefly, then terminate.
    pub fn shutdown(mut self) -> Result<()> {
        if self.killed {
            return Ok(());
        }
        self.killed = true;

        let _ = write_message(&mut self.stdin, &KernelRequest::Shutdown);

        match self.child.wait_timeout(CONTROL_TIMEOUT) {
            Ok(Some(status)) => {
                tracing::debug!("kernel exited with {}", status);
            }
            Ok(None) => {
                tracing::warn!("kernel ignored shutdown request, killing");
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
            Err(e) => {
                let _ = self.child.kill();
                let _ = self.child.wait();
                return Err(Error::Kernel(format!(
                    "failed to wait for kernel exit: {}",
                    e
                )));
            }
        }

        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        Ok(())
    }

    /// Kill the kernel process immediately.
    fn kill(&mut self) {
        if self.killed {
            return;
        }
        self.killed = true;

        // Give the kernel a moment to exit on its own before terminating.
        let _ = write_message(&mut self.stdin, &KernelRequest::Shutdown);
        thread::sleep(Duration::from_millis(10));

        if let Err(e) = self.child.kill() {
            tracing::warn!("failed to kill kernel: {}", e);
        }
        let _ = self.child.wait();

        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

impl KernelChannel for KernelProcess {
    fn submit(&mut self, source: &str) -> Result<()> {
        self.send(&KernelRequest::Execute {
            source: source.to_string(),
        })
    }

    fn recv_reply(&mut self, timeout: Duration) -> Result<Option<ExecuteReply>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.recv(remaining)? {
                Some(KernelReply::Execute(reply)) => {
                    // A reply whose wait was abandoned answers an earlier
                    // request; drop it and keep waiting for ours.
                    if self.stale_replies > 0 {
                        self.stale_replies -= 1;
                        continue;
                    }
                    return Ok(Some(reply));
                }
                Some(other) => {
                    return Err(Error::Channel(format!(
                        "unexpected reply while awaiting an execution result: {:?}",
                        other
                    )));
                }
                None => {
                    self.stale_replies += 1;
                    return Ok(None);
                }
            }
        }
    }
}

impl Drop for KernelProcess {
    fn drop(&mut self) {
        self.kill();
    }
}
