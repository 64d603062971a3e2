//! Two-phase (propose/confirm) tracking of applied configure arguments.
//!
//! # State Machine
//!
//! ```text
//! Clean ──about_to_configure──▶ Proposed ──confirm──▶ Confirmed
//!                                  ▲  │                   │
//!                                  └──┘                   │
//!                                  └──about_to_configure──┘
//! ```
//!
//! The proposal is persisted before the configure step runs and merged into
//! the cached arguments only after it succeeded. A proposal that is never
//! confirmed (configure failed, process killed) stays on disk; its arguments
//! are treated as uncertain by the next decision and supplied again.
//!
//! # Example State File
//!
//! ```json
//! {
//!   "phase": "confirmed",
//!   "pending_args": [],
//!   "pending_replaces_cache": false,
//!   "cached_args": ["-DCMAKE_BUILD_TYPE=Release", "-DCMAKE_TOOLCHAIN_FILE=/tc.cmake"],
//!   "c_sha": "",
//!   "toolchain_sha": "9f86d0..."
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::args::{self, ArgKey, BuildArgument, SwitchKind};
use crate::consts::{CACHE_TRACKER_FILENAME, CMAKE_TOOLCHAIN_FILE};
use crate::util::fs::write_atomic;
use crate::util::hash::hash_file_or_empty;

/// Where a binary directory is in the propose/confirm protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerPhase {
  /// No configure step was ever proposed.
  #[default]
  Clean,
  /// Arguments were proposed; the configure step has not reported success.
  Proposed,
  /// The last proposal was applied successfully.
  Confirmed,
}

/// Persisted tracker state of one binary directory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerState {
  pub phase: TrackerPhase,
  /// Arguments proposed for the pending configure step.
  pub pending_args: Vec<BuildArgument>,
  /// Set when the proposal was forced; confirming it replaces `cached_args`.
  pub pending_replaces_cache: bool,
  /// Arguments applied by successful configure steps.
  pub cached_args: Vec<BuildArgument>,
  /// Hash of the `-C` cache script at confirmation time.
  pub c_sha: String,
  /// Hash of the `CMAKE_TOOLCHAIN_FILE` at confirmation time.
  pub toolchain_sha: String,
}

impl TrackerState {
  fn cache_script(&self) -> Option<&BuildArgument> {
    args::find_switch(&self.cached_args, SwitchKind::CacheScript)
  }

  fn toolchain_file(&self) -> Option<&BuildArgument> {
    args::find_define(&self.cached_args, CMAKE_TOOLCHAIN_FILE)
  }

  /// Keys of cached arguments whose backing file changed since confirmation.
  fn changed_backing_files(&self) -> Vec<ArgKey> {
    let mut keys = Vec::new();

    if let Some(arg) = self.cache_script()
      && hash_file_or_empty(Path::new(&arg.value)) != self.c_sha
    {
      debug!(path = %arg.value, "cache script changed");
      keys.push(arg.key());
    }

    if let Some(arg) = self.toolchain_file()
      && hash_file_or_empty(Path::new(&arg.value)) != self.toolchain_sha
    {
      debug!(path = %arg.value, "toolchain file changed");
      keys.push(arg.key());
    }

    keys
  }

  fn rehash_backing_files(&mut self) {
    self.c_sha = self
      .cache_script()
      .map(|arg| hash_file_or_empty(Path::new(&arg.value)))
      .unwrap_or_default();
    self.toolchain_sha = self
      .toolchain_file()
      .map(|arg| hash_file_or_empty(Path::new(&arg.value)))
      .unwrap_or_default();
  }
}

/// Errors that can occur when persisting tracker state.
#[derive(Debug, Error)]
pub enum TrackerError {
  #[error("failed to read cache tracker: {0}")]
  Read(#[source] io::Error),

  #[error("failed to write cache tracker: {0}")]
  Write(#[source] io::Error),

  /// The state file exists but is not valid; callers treat this as absence.
  #[error("failed to parse cache tracker: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize cache tracker: {0}")]
  Serialize(#[source] serde_json::Error),
}

/// Outcome of [`CacheTracker::about_to_configure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
  /// Arguments to pass to the configure step.
  pub args: Vec<BuildArgument>,
  /// Whether the configure step has to run at all.
  pub needs_configure: bool,
}

/// Tracker bound to one binary directory.
///
/// Not safe against concurrent use of the same binary directory.
#[derive(Debug, Clone)]
pub struct CacheTracker {
  path: PathBuf,
}

impl CacheTracker {
  pub fn new(binary_dir: &Path) -> Self {
    Self {
      path: binary_dir.join(CACHE_TRACKER_FILENAME),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Read the persisted state. Returns `Ok(None)` if there is none.
  pub fn read_state(&self) -> Result<Option<TrackerState>, TrackerError> {
    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(TrackerError::Read(e)),
    };

    serde_json::from_str(&content).map(Some).map_err(TrackerError::Parse)
  }

  /// Load the state, treating a missing or unreadable file as a clean tracker.
  ///
  /// An unreadable file forgets every cached argument, which forces all
  /// requested arguments to be applied again.
  pub fn load(&self) -> TrackerState {
    match self.read_state() {
      Ok(state) => state.unwrap_or_default(),
      Err(e) => {
        warn!(path = %self.path.display(), error = %e, "cache tracker state unusable, starting clean");
        TrackerState::default()
      }
    }
  }

  fn save(&self, state: &TrackerState) -> Result<(), TrackerError> {
    let content = serde_json::to_string_pretty(state).map_err(TrackerError::Serialize)?;
    write_atomic(&self.path, content.as_bytes()).map_err(TrackerError::Write)
  }

  pub fn phase(&self) -> TrackerPhase {
    self.load().phase
  }

  /// Decide which arguments the next configure step must receive.
  ///
  /// With `force`, all requested arguments are returned. Otherwise only those
  /// differing from the cached ones. In both cases the result also covers
  /// uncertain variables: those of an unconfirmed earlier proposal and those
  /// whose backing file (`-C` script, toolchain file) changed on disk. An
  /// uncertain variable gets its requested value, else its cached value, else
  /// it is undefined.
  ///
  /// An unconfirmed earlier proposal always requires a configure step, even
  /// when none of its arguments has to be passed again. A proposal that
  /// requires configuring is persisted before returning; otherwise the state
  /// file is left untouched.
  pub fn about_to_configure(&self, requested: &[BuildArgument], force: bool) -> Result<Proposal, TrackerError> {
    let mut state = self.load();
    let requested = args::canonicalize(requested.iter().cloned());

    let cached: HashMap<ArgKey, &BuildArgument> = state.cached_args.iter().map(|a| (a.key(), a)).collect();
    let requested_by_key: HashMap<ArgKey, &BuildArgument> = requested.iter().map(|a| (a.key(), a)).collect();

    let mut to_apply: Vec<BuildArgument> = requested
      .iter()
      .filter(|arg| force || cached.get(&arg.key()) != Some(arg))
      .cloned()
      .collect();

    let mut uncertain: Vec<ArgKey> = state.pending_args.iter().map(BuildArgument::key).collect();
    uncertain.extend(state.changed_backing_files());

    for key in uncertain {
      if let Some(arg) = requested_by_key.get(&key).or_else(|| cached.get(&key)) {
        to_apply.push((*arg).clone());
      } else if let ArgKey::Variable(name) = key {
        to_apply.push(BuildArgument::undefine(name));
      } else {
        // A switch has no undo; the configure step still has to run.
        debug!(path = %self.path.display(), ?key, "unconfirmed switch cannot be reverted");
      }
    }

    let proposal = Proposal {
      needs_configure: force || !to_apply.is_empty() || state.phase == TrackerPhase::Proposed,
      args: args::canonicalize(to_apply),
    };
    if !proposal.needs_configure {
      debug!(path = %self.path.display(), "configure arguments up to date");
      return Ok(proposal);
    }

    state.phase = TrackerPhase::Proposed;
    state.pending_args = proposal.args.clone();
    state.pending_replaces_cache = force;
    self.save(&state)?;

    debug!(
      path = %self.path.display(),
      force,
      to_apply = ?proposal.args.iter().map(BuildArgument::render).collect::<Vec<_>>(),
      "proposed configure arguments"
    );
    Ok(proposal)
  }

  /// Record that the proposed arguments were applied successfully.
  ///
  /// Call only after the configure step exited with success. Does nothing if
  /// no proposal is pending.
  pub fn confirm(&self) -> Result<(), TrackerError> {
    let mut state = self.load();
    if state.phase != TrackerPhase::Proposed {
      debug!(path = %self.path.display(), phase = ?state.phase, "nothing proposed, confirm ignored");
      return Ok(());
    }

    let pending = std::mem::take(&mut state.pending_args);
    state.cached_args = if state.pending_replaces_cache {
      pending
    } else {
      args::canonicalize(std::mem::take(&mut state.cached_args).into_iter().chain(pending))
    };
    state.pending_replaces_cache = false;
    state.rehash_backing_files();
    state.phase = TrackerPhase::Confirmed;
    self.save(&state)?;

    info!(path = %self.path.display(), cached = state.cached_args.len(), "configure arguments confirmed");
    Ok(())
  }
}
