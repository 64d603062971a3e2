//! Tool and workspace configuration.
//!
//! [`ToolConfig`] selects the build-tool executable. [`WorkspaceSettings`] are
//! fixed when a binary root is first used and persisted under the internal
//! directory, so later invocations agree on generator and directory layout.
//!
//! # Example Settings File
//!
//! ```json
//! {
//!   "version": 1,
//!   "per_config_bin_dirs": true,
//!   "multiconfig_generator": false,
//!   "generator": "Ninja"
//! }
//! ```

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::args::{self, BuildArgument};
use crate::consts::CMAKE_ENV_VAR;
use crate::layout::Workspace;
use crate::util::fs::write_atomic;

/// Current settings file format version.
pub const SETTINGS_VERSION: u32 = 1;

/// Build-tool selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
  /// The build-tool executable.
  pub cmake: PathBuf,
}

impl ToolConfig {
  pub fn new(cmake: impl Into<PathBuf>) -> Self {
    Self { cmake: cmake.into() }
  }

  /// `$CMKX_CMAKE` if set, otherwise `cmake` from `PATH`.
  pub fn from_env() -> Self {
    let cmake = std::env::var_os(CMAKE_ENV_VAR)
      .filter(|v| !v.is_empty())
      .map(PathBuf::from)
      .unwrap_or_else(|| PathBuf::from("cmake"));
    Self { cmake }
  }
}

impl Default for ToolConfig {
  fn default() -> Self {
    Self::from_env()
  }
}

/// Settings fixed for the lifetime of a binary root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSettings {
  pub version: u32,
  /// User setting; only effective for single-config generators.
  pub per_config_bin_dirs: bool,
  pub multiconfig_generator: bool,
  /// Generator name, empty for the platform default.
  #[serde(default)]
  pub generator: String,
}

/// Errors that can occur when working with workspace settings.
#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("failed to read settings: {0}")]
  Read(#[source] io::Error),

  #[error("failed to write settings: {0}")]
  Write(#[source] io::Error),

  #[error("failed to parse settings: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize settings: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("unsupported settings version: {0}")]
  UnsupportedVersion(u32),

  /// The requested generator differs from the one the binary root was created with.
  #[error("binary dir was configured with generator '{existing}', cannot switch to '{requested}'")]
  GeneratorMismatch { existing: String, requested: String },
}

impl WorkspaceSettings {
  pub fn new(generator: &str, per_config_bin_dirs: bool) -> Self {
    Self {
      version: SETTINGS_VERSION,
      per_config_bin_dirs,
      multiconfig_generator: args::is_generator_multiconfig(generator),
      generator: generator.to_string(),
    }
  }

  /// Load the settings of a workspace.
  ///
  /// Returns `Ok(None)` if the workspace has not been initialized yet.
  pub fn load(workspace: &Workspace) -> Result<Option<Self>, SettingsError> {
    let path = workspace.settings_path();

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(SettingsError::Read(e)),
    };

    let settings: Self = serde_json::from_str(&content).map_err(SettingsError::Parse)?;
    if settings.version != SETTINGS_VERSION {
      return Err(SettingsError::UnsupportedVersion(settings.version));
    }

    debug!(path = %path.display(), ?settings, "loaded workspace settings");
    Ok(Some(settings))
  }

  /// Save the settings atomically.
  pub fn save(&self, workspace: &Workspace) -> Result<(), SettingsError> {
    let content = serde_json::to_string_pretty(self).map_err(SettingsError::Serialize)?;
    write_atomic(&workspace.settings_path(), content.as_bytes()).map_err(SettingsError::Write)
  }

  /// Load existing settings, or create them from the global arguments.
  ///
  /// An existing workspace keeps its settings; requesting a different
  /// generator for it is an error.
  pub fn load_or_init(
    workspace: &Workspace,
    global_args: &[BuildArgument],
    per_config_bin_dirs: bool,
  ) -> Result<Self, SettingsError> {
    let requested = args::generator(global_args);

    if let Some(existing) = Self::load(workspace)? {
      if !requested.is_empty() && requested != existing.generator {
        return Err(SettingsError::GeneratorMismatch {
          existing: existing.generator,
          requested: requested.to_string(),
        });
      }
      return Ok(existing);
    }

    let settings = Self::new(requested, per_config_bin_dirs);
    settings.save(workspace)?;
    info!(
      root = %workspace.main_binary_dir_common().display(),
      generator = %settings.generator,
      multiconfig = settings.multiconfig_generator,
      per_config_bin_dirs = settings.per_config_bin_dirs,
      "initialized workspace"
    );
    Ok(settings)
  }
}
