//! Subprocess execution.
//!
//! Build-tool invocations either inherit the terminal ([`run_inherited`]) or
//! have their output captured ([`run_captured`]). Capturing drains stdout and
//! stderr concurrently, one reader per stream, so the child never blocks on a
//! full pipe. Messages are ordered by arrival across both streams.
//!
//! Neither mode enforces a timeout: a process runs until it exits.

pub mod log;

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use log::{LogError, log_file_name, save_log};

/// Exit code reported for a process terminated by a signal.
pub const SIGNAL_EXIT_CODE: i32 = -1;

/// Output stream of a subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
  Stdout,
  Stderr,
}

/// One line of subprocess output, or the unterminated rest of a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedMessage {
  pub stream: Stream,
  /// Seconds since the process was spawned, taken when the line was read.
  pub elapsed_secs: f64,
  pub text: String,
}

/// Everything a captured subprocess wrote, in arrival order.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
  pub started_at: DateTime<Local>,
  pub finished_at: DateTime<Local>,
  pub messages: Vec<CapturedMessage>,
}

impl CapturedOutput {
  /// Concatenated text of one stream.
  pub fn stream_text(&self, stream: Stream) -> String {
    self
      .messages
      .iter()
      .filter(|m| m.stream == stream)
      .map(|m| m.text.as_str())
      .collect()
  }
}

/// Result of a captured run.
#[derive(Debug, Clone)]
pub struct CapturedRun {
  pub code: i32,
  pub output: CapturedOutput,
}

/// Errors launching or waiting for a subprocess.
///
/// A nonzero exit code is not an error at this level.
#[derive(Debug, Error)]
pub enum ProcessError {
  #[error("failed to spawn '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to wait for '{program}': {source}")]
  Wait {
    program: String,
    #[source]
    source: io::Error,
  },
}

fn exit_code(status: ExitStatus) -> i32 {
  status.code().unwrap_or(SIGNAL_EXIT_CODE)
}

/// Run a process with stdout/stderr inherited from this process.
pub async fn run_inherited(program: &Path, args: &[String]) -> Result<i32, ProcessError> {
  info!(command = %format_command_line(program, args), "running");

  let status = Command::new(program)
    .args(args)
    .stdin(Stdio::null())
    .status()
    .await
    .map_err(|source| ProcessError::Spawn {
      program: program.display().to_string(),
      source,
    })?;

  let code = exit_code(status);
  debug!(program = %program.display(), code, "process exited");
  Ok(code)
}

/// Run a process and capture its stdout and stderr.
pub async fn run_captured(program: &Path, args: &[String]) -> Result<CapturedRun, ProcessError> {
  info!(command = %format_command_line(program, args), "running");

  let started_at = Local::now();
  let start = Instant::now();

  let mut child = Command::new(program)
    .args(args)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .map_err(|source| ProcessError::Spawn {
      program: program.display().to_string(),
      source,
    })?;

  let (tx, mut rx) = mpsc::unbounded_channel();
  let stdout_task = child
    .stdout
    .take()
    .map(|stdout| tokio::spawn(drain(stdout, Stream::Stdout, start, tx.clone())));
  let stderr_task = child
    .stderr
    .take()
    .map(|stderr| tokio::spawn(drain(stderr, Stream::Stderr, start, tx.clone())));
  drop(tx);

  // The channel closes once both readers hit end-of-stream.
  let mut messages = Vec::new();
  while let Some(message) = rx.recv().await {
    messages.push(message);
  }

  let status = child.wait().await.map_err(|source| ProcessError::Wait {
    program: program.display().to_string(),
    source,
  })?;

  for task in [stdout_task, stderr_task].into_iter().flatten() {
    if let Err(e) = task.await {
      warn!(program = %program.display(), error = %e, "output reader task failed");
    }
  }

  let code = exit_code(status);
  debug!(program = %program.display(), code, lines = messages.len(), "process exited");

  Ok(CapturedRun {
    code,
    output: CapturedOutput {
      started_at,
      finished_at: Local::now(),
      messages,
    },
  })
}

/// Forward `reader` line by line. Each complete line is decoded on its own,
/// so a multi-byte character is never split between two messages.
async fn drain<R>(reader: R, stream: Stream, start: Instant, tx: mpsc::UnboundedSender<CapturedMessage>)
where
  R: AsyncRead + Unpin,
{
  let mut reader = BufReader::new(reader);
  let mut line = Vec::new();
  loop {
    line.clear();
    match reader.read_until(b'\n', &mut line).await {
      Ok(0) => break,
      Ok(_) => {
        let message = CapturedMessage {
          stream,
          elapsed_secs: start.elapsed().as_secs_f64(),
          text: String::from_utf8_lossy(&line).into_owned(),
        };
        if tx.send(message).is_err() {
          break;
        }
      }
      Err(e) => {
        debug!(?stream, error = %e, "output stream read failed");
        break;
      }
    }
  }
}

/// Shell-readable rendering of a command line, for logging.
///
/// Arguments containing spaces or `;` are double-quoted; backslashes and
/// double quotes are escaped.
pub fn format_command_line(program: &Path, args: &[String]) -> String {
  let mut line = program.display().to_string();
  for arg in args {
    line.push(' ');
    line.push_str(&quote_arg(arg));
  }
  line
}

fn quote_arg(arg: &str) -> String {
  let mut escaped = String::with_capacity(arg.len());
  for c in arg.chars() {
    match c {
      '\\' => escaped.push_str("\\\\"),
      '"' => escaped.push_str("\\\""),
      c => escaped.push(c),
    }
  }
  if arg.is_empty() || arg.contains([' ', ';']) {
    format!("\"{escaped}\"")
  } else {
    escaped
  }
}
