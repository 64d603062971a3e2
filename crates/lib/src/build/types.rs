//! Build request, result and error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::args::ArgError;
use crate::cache::TrackerError;
use crate::layout::ConfigName;
use crate::process::ProcessError;

/// One configure-and-build of a (package, configuration) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
  /// Package name, empty for the main project.
  pub package: String,
  /// Main project: the source dir. Package: sub-directory of its clone dir,
  /// empty for the clone dir itself.
  pub source_dir: PathBuf,
  /// Raw configure arguments.
  pub args: Vec<String>,
  pub config: ConfigName,
  /// Targets built in order; an empty name is the default target.
  pub targets: Vec<String>,
  pub force_configure: bool,
}

impl BuildRequest {
  /// Build the main project's default target.
  pub fn main(source_dir: impl Into<PathBuf>, config: ConfigName) -> Self {
    Self {
      package: String::new(),
      source_dir: source_dir.into(),
      args: Vec::new(),
      config,
      targets: vec![String::new()],
      force_configure: false,
    }
  }

  /// Build a dependency package's default target.
  pub fn package(name: impl Into<String>, config: ConfigName) -> Self {
    Self {
      package: name.into(),
      ..Self::main(PathBuf::new(), config)
    }
  }

  pub fn with_source_dir(mut self, source_dir: impl Into<PathBuf>) -> Self {
    self.source_dir = source_dir.into();
    self
  }

  pub fn with_args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
    self.args = args.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_targets<S: Into<String>>(mut self, targets: impl IntoIterator<Item = S>) -> Self {
    self.targets = targets.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_force_configure(mut self, force: bool) -> Self {
    self.force_configure = force;
    self
  }

  pub fn is_main(&self) -> bool {
    self.package.is_empty()
  }
}

/// What a successful build did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
  pub binary_dir: PathBuf,
  /// Whether the configure step ran.
  pub configured: bool,
  pub targets: Vec<String>,
}

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Argument(#[from] ArgError),

  #[error("package '{package}' must not set {name} ({arg}): it installs into the shared dependency prefix")]
  ReservedArgumentConflict { package: String, name: String, arg: String },

  #[error("configure step failed with exit code {code}")]
  ConfigureFailed { code: i32 },

  #[error("build of target '{target}' failed with exit code {code}")]
  BuildFailed { target: String, code: i32 },

  #[error("failed to create directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Tracker(#[from] TrackerError),

  #[error(transparent)]
  Process(#[from] ProcessError),
}
