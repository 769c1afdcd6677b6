//! Thin async wrappers around external tools (yt-dlp, ffprobe, ffmpeg).
//!
//! Output is read line by line as it is produced; both stdout and stderr are
//! consumed so the child can never block on a full pipe. `\r`-terminated
//! progress updates are split into separate lines.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Number of trailing output lines kept for failure diagnostics.
pub const TAIL_LINES: usize = 20;

/// Errors starting or talking to an external tool.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started (missing binary, permissions).
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the program or reading its output failed.
    #[error("IO error while running {program}: {source}")]
    Io {
        /// Program being run.
        program: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    fn spawn(program: &Path, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.to_path_buf(),
            source,
        }
    }

    fn io(program: &Path, source: std::io::Error) -> Self {
        Self::Io {
            program: program.to_path_buf(),
            source,
        }
    }
}

/// Exit information and the last lines of output from a streamed run.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// True for exit code 0.
    pub success: bool,
    /// Last [`TAIL_LINES`] non-empty lines across stdout and stderr.
    pub tail: Vec<String>,
}

impl ProcessOutcome {
    /// The tail joined with newlines, for error messages.
    #[must_use]
    pub fn tail_text(&self) -> String {
        self.tail.join("\n")
    }
}

/// Fully captured output of a short-lived command.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// Exit code; `None` when killed by a signal.
    pub code: Option<i32>,
    /// True for exit code 0.
    pub success: bool,
    /// Stdout decoded lossily as UTF-8.
    pub stdout: String,
    /// Stderr decoded lossily as UTF-8.
    pub stderr: String,
}

/// Runs `program` and invokes `on_line` for every output line as it arrives.
///
/// The child is killed if the returned future is dropped. There is no output
/// timeout: a tool that hangs keeps the future pending.
///
/// # Errors
///
/// Returns [`ProcessError::Spawn`] if the program cannot be started and
/// [`ProcessError::Io`] if waiting on it fails. A non-zero exit is not an
/// error here; inspect [`ProcessOutcome::success`].
pub async fn run_streaming<F>(
    program: &Path,
    args: &[String],
    mut on_line: F,
) -> Result<ProcessOutcome, ProcessError>
where
    F: FnMut(&str) + Send,
{
    debug!(program = %program.display(), ?args, "spawning process");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ProcessError::spawn(program, e))?;

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(forward_lines(stdout, line_tx.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(forward_lines(stderr, line_tx.clone())));
    }
    drop(line_tx);

    let mut tail: VecDeque<String> = VecDeque::with_capacity(TAIL_LINES);
    while let Some(line) = line_rx.recv().await {
        trace!(line = %line, "process output");
        on_line(&line);
        if tail.len() == TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    for reader in readers {
        let _ = reader.await;
    }

    let status = child
        .wait()
        .await
        .map_err(|e| ProcessError::io(program, e))?;
    debug!(program = %program.display(), code = ?status.code(), "process exited");

    Ok(ProcessOutcome {
        code: status.code(),
        success: status.success(),
        tail: tail.into_iter().collect(),
    })
}

/// Runs `program` to completion and captures its output.
///
/// # Errors
///
/// Returns [`ProcessError::Spawn`] if the program cannot be started.
pub async fn run_captured(program: &Path, args: &[String]) -> Result<CapturedOutput, ProcessError> {
    debug!(program = %program.display(), ?args, "running process");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ProcessError::spawn(program, e))?;

    Ok(CapturedOutput {
        code: output.status.code(),
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buffer);
                for piece in text.split(['\r', '\n']) {
                    let piece = piece.trim_end();
                    if piece.is_empty() {
                        continue;
                    }
                    if tx.send(piece.to_string()).is_err() {
                        return;
                    }
                }
            }
        }
    }
}
