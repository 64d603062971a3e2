//! Per-step log files for captured package steps.
//!
//! ```text
//! Started at Sat, 17 Oct 2026 10:00:00 +0200
//!     [0.01] -- Configuring done
//! ERR [0.02] CMake Warning:
//! ERR        unused variable
//! ERR
//!     [0.30] -- Generating done
//! Finished at Sat, 17 Oct 2026 10:00:01 +0200, exit code 0
//! ```
//!
//! Stdout lines carry a four-space marker, stderr lines `ERR `. Runs of blank
//! lines collapse into one. Logging is best effort: [`save_log`] never fails
//! the step it records.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::{CapturedOutput, Stream};
use crate::consts::{ALL_TARGETS_NAME, LOG_EXTENSION};
use crate::layout::ConfigName;

const STDOUT_MARKER: &str = "    ";
const STDERR_MARKER: &str = "ERR ";

#[derive(Debug, Error)]
pub enum LogError {
  #[error("log directory {path} unavailable: {source}")]
  Directory {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write log {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// `<package>-<config>-<step>[-<target>].log`
///
/// An empty target names the default build target `all`.
pub fn log_file_name(package: &str, config: &ConfigName, step: &str, target: Option<&str>) -> String {
  match target {
    Some(target) => {
      let target = if target.is_empty() { ALL_TARGETS_NAME } else { target };
      format!("{package}-{}-{step}-{target}{LOG_EXTENSION}", config.display_name())
    }
    None => format!("{package}-{}-{step}{LOG_EXTENSION}", config.display_name()),
  }
}

/// Render captured output as log text.
pub fn format_log(output: &CapturedOutput, code: i32) -> String {
  let mut log = String::new();
  let _ = writeln!(log, "Started at {}", output.started_at.to_rfc2822());

  for message in &output.messages {
    let marker = match message.stream {
      Stream::Stdout => STDOUT_MARKER,
      Stream::Stderr => STDERR_MARKER,
    };
    let text = message.text.as_str();
    let bytes = text.as_bytes();
    let mut indent: Option<usize> = None;
    let mut pos = 0;

    while pos < bytes.len() {
      let line_end = bytes[pos..]
        .iter()
        .position(|b| *b == b'\n' || *b == b'\r')
        .map_or(bytes.len(), |offset| pos + offset);

      if pos < line_end {
        let line = &text[pos..line_end];
        match indent {
          None => {
            let prefix = format!("[{:.2}] ", message.elapsed_secs);
            let _ = writeln!(log, "{marker}{prefix}{line}");
            indent = Some(prefix.len());
          }
          Some(width) => {
            let _ = writeln!(log, "{marker}{:width$}{line}", "");
          }
        }
      }

      pos = line_end;
      let mut newlines = 0;
      while pos < bytes.len() {
        match bytes[pos] {
          b'\n' => newlines += 1,
          b'\r' => {}
          _ => break,
        }
        pos += 1;
      }
      if newlines > 1 {
        match message.stream {
          Stream::Stdout => log.push('\n'),
          Stream::Stderr => {
            let _ = writeln!(log, "{}", STDERR_MARKER.trim_end());
          }
        }
      }
    }
  }

  let _ = writeln!(
    log,
    "Finished at {}, exit code {code}",
    output.finished_at.to_rfc2822()
  );
  log
}

/// Write a log file, creating `log_dir` if needed.
pub fn write_log(log_dir: &Path, file_name: &str, output: &CapturedOutput, code: i32) -> Result<PathBuf, LogError> {
  fs::create_dir_all(log_dir).map_err(|source| LogError::Directory {
    path: log_dir.to_path_buf(),
    source,
  })?;

  let path = log_dir.join(file_name);
  fs::write(&path, format_log(output, code)).map_err(|source| LogError::Write {
    path: path.clone(),
    source,
  })?;

  info!(path = %path.display(), "saved log");
  Ok(path)
}

/// Best-effort [`write_log`]: failures are reported and swallowed.
pub fn save_log(log_dir: &Path, file_name: &str, output: &CapturedOutput, code: i32) -> Option<PathBuf> {
  match write_log(log_dir, file_name, output, code) {
    Ok(path) => Some(path),
    Err(e) => {
      warn!(error = %e, "could not save log");
      None
    }
  }
}
