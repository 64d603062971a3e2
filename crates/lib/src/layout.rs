//! Directory layout of a build tree.
//!
//! Everything lives under the main project's binary root:
//!
//! ```text
//! <root>/                     main project binary dir (common)
//! ├── <config>/               per-config main binary dir (single-config generators)
//! ├── _cmkx/
//! │   ├── settings.json
//! │   ├── executor/           helper project evaluating dependency scripts
//! │   ├── tmp/
//! │   └── log/
//! ├── _deps/<pkg>/            package clone dir
//! ├── _deps-build/<pkg>/      package binary dir (common)
//! └── _deps-install/          shared install prefix of all packages
//! ```
//!
//! Nothing here touches the filesystem; directories are created by the callers
//! that need them.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::consts::{
  DEPS_BUILD_DIRNAME, DEPS_INSTALL_DIRNAME, DEPS_SOURCE_DIRNAME, EXECUTOR_BINARY_DIRNAME, EXECUTOR_DIRNAME,
  INTERNAL_DIRNAME, LOG_DIRNAME, NO_CONFIG_NAME, SETTINGS_FILENAME, TMP_DIRNAME,
};

/// A build configuration, or none for generators that do not use one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigName {
  Named(String),
  NoConfig,
}

impl ConfigName {
  /// An empty name means no configuration.
  pub fn new(name: impl Into<String>) -> Self {
    let name = name.into();
    if name.is_empty() {
      ConfigName::NoConfig
    } else {
      ConfigName::Named(name)
    }
  }

  pub fn is_noconfig(&self) -> bool {
    matches!(self, ConfigName::NoConfig)
  }

  /// The name, or `None` for no-config.
  pub fn name(&self) -> Option<&str> {
    match self {
      ConfigName::Named(name) => Some(name),
      ConfigName::NoConfig => None,
    }
  }

  /// The name, or `"NoConfig"`; used in directory and log file names.
  pub fn display_name(&self) -> &str {
    self.name().unwrap_or(NO_CONFIG_NAME)
  }
}

impl fmt::Display for ConfigName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.display_name())
  }
}

/// Paths derived from the main binary root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
  root: PathBuf,
}

impl Workspace {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn main_binary_dir_common(&self) -> &Path {
    &self.root
  }

  pub fn internal_dir(&self) -> PathBuf {
    self.root.join(INTERNAL_DIRNAME)
  }

  pub fn settings_path(&self) -> PathBuf {
    self.internal_dir().join(SETTINGS_FILENAME)
  }

  pub fn executor_dir(&self) -> PathBuf {
    self.internal_dir().join(EXECUTOR_DIRNAME)
  }

  pub fn executor_binary_dir(&self) -> PathBuf {
    self.executor_dir().join(EXECUTOR_BINARY_DIRNAME)
  }

  pub fn tmp_dir(&self) -> PathBuf {
    self.internal_dir().join(TMP_DIRNAME)
  }

  pub fn log_dir(&self) -> PathBuf {
    self.internal_dir().join(LOG_DIRNAME)
  }

  pub fn pkg_clone_dir(&self, pkg_name: &str) -> PathBuf {
    self.root.join(DEPS_SOURCE_DIRNAME).join(pkg_name)
  }

  pub fn pkg_binary_dir_common(&self, pkg_name: &str) -> PathBuf {
    self.root.join(DEPS_BUILD_DIRNAME).join(pkg_name)
  }

  /// Install prefix shared by every dependency package and configuration.
  pub fn deps_install_dir(&self) -> PathBuf {
    self.root.join(DEPS_INSTALL_DIRNAME)
  }
}

/// Config-qualify a binary dir.
///
/// Returns `common` unchanged for multiconfig generators, when per-config dirs
/// are disabled, or for no-config; otherwise `common/<config>`.
pub fn binary_dir_of_config(common: &Path, config: &ConfigName, per_config_bin_dirs: bool, multiconfig: bool) -> PathBuf {
  match config.name() {
    Some(name) if per_config_bin_dirs && !multiconfig => common.join(name),
    _ => common.to_path_buf(),
  }
}

/// Resolved directories for one (package, configuration) build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryLayout {
  /// Package name, empty for the main project.
  pub package: String,
  pub source_dir: PathBuf,
  pub binary_dir: PathBuf,
  pub deps_install_dir: PathBuf,
  pub log_dir: PathBuf,
  pub tmp_dir: PathBuf,
  /// Clone dir of the package; `None` for the main project.
  pub clone_dir: Option<PathBuf>,
}

impl DirectoryLayout {
  /// Resolve the layout of a build.
  ///
  /// For the main project `source_dir` is used as is. For a package it is a
  /// sub-directory of the package's clone dir (empty = the clone dir itself).
  pub fn resolve(
    workspace: &Workspace,
    package: &str,
    source_dir: &Path,
    config: &ConfigName,
    per_config_bin_dirs: bool,
    multiconfig: bool,
  ) -> Self {
    let (source_dir, common, clone_dir) = if package.is_empty() {
      (
        source_dir.to_path_buf(),
        workspace.main_binary_dir_common().to_path_buf(),
        None,
      )
    } else {
      let clone_dir = workspace.pkg_clone_dir(package);
      let source = if source_dir.as_os_str().is_empty() {
        clone_dir.clone()
      } else {
        clone_dir.join(source_dir)
      };
      (source, workspace.pkg_binary_dir_common(package), Some(clone_dir))
    };

    Self {
      package: package.to_string(),
      source_dir,
      binary_dir: binary_dir_of_config(&common, config, per_config_bin_dirs, multiconfig),
      deps_install_dir: workspace.deps_install_dir(),
      log_dir: workspace.log_dir(),
      tmp_dir: workspace.tmp_dir(),
      clone_dir,
    }
  }

  pub fn is_main(&self) -> bool {
    self.package.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn release() -> ConfigName {
    ConfigName::new("Release")
  }

  #[test]
  fn empty_config_name_is_noconfig() {
    assert!(ConfigName::new("").is_noconfig());
    assert_eq!(ConfigName::new("").display_name(), "NoConfig");
    assert_eq!(release().to_string(), "Release");
  }

  #[test]
  fn per_config_dir_for_single_config_generator() {
    let dir = binary_dir_of_config(Path::new("/b"), &release(), true, false);
    assert_eq!(dir, PathBuf::from("/b/Release"));
  }

  #[test]
  fn multiconfig_never_gets_per_config_dirs() {
    let dir = binary_dir_of_config(Path::new("/b"), &release(), true, true);
    assert_eq!(dir, PathBuf::from("/b"));
  }

  #[test]
  fn per_config_setting_disabled() {
    let dir = binary_dir_of_config(Path::new("/b"), &release(), false, false);
    assert_eq!(dir, PathBuf::from("/b"));
  }

  #[test]
  fn noconfig_uses_common_dir() {
    let dir = binary_dir_of_config(Path::new("/b"), &ConfigName::NoConfig, true, false);
    assert_eq!(dir, PathBuf::from("/b"));
  }

  #[test]
  fn main_project_layout() {
    let ws = Workspace::new("/b");
    let layout = DirectoryLayout::resolve(&ws, "", Path::new("/src"), &release(), true, false);
    assert!(layout.is_main());
    assert_eq!(layout.source_dir, PathBuf::from("/src"));
    assert_eq!(layout.binary_dir, PathBuf::from("/b/Release"));
    assert_eq!(layout.deps_install_dir, PathBuf::from("/b/_deps-install"));
    assert_eq!(layout.log_dir, PathBuf::from("/b/_cmkx/log"));
    assert!(layout.clone_dir.is_none());
  }

  #[test]
  fn package_layout() {
    let ws = Workspace::new("/b");
    let layout = DirectoryLayout::resolve(&ws, "zlib", Path::new("contrib"), &release(), true, false);
    assert!(!layout.is_main());
    assert_eq!(layout.source_dir, PathBuf::from("/b/_deps/zlib/contrib"));
    assert_eq!(layout.binary_dir, PathBuf::from("/b/_deps-build/zlib/Release"));
    assert_eq!(layout.clone_dir, Some(PathBuf::from("/b/_deps/zlib")));
  }

  #[test]
  fn package_layout_without_source_subdir() {
    let ws = Workspace::new("/b");
    let layout = DirectoryLayout::resolve(&ws, "zlib", Path::new(""), &ConfigName::NoConfig, true, false);
    assert_eq!(layout.source_dir, PathBuf::from("/b/_deps/zlib"));
    assert_eq!(layout.binary_dir, PathBuf::from("/b/_deps-build/zlib"));
  }

  #[test]
  fn install_dir_is_shared_across_configs_and_packages() {
    let ws = Workspace::new("/b");
    let a = DirectoryLayout::resolve(&ws, "a", Path::new(""), &release(), true, false);
    let b = DirectoryLayout::resolve(&ws, "b", Path::new(""), &ConfigName::new("Debug"), true, false);
    assert_eq!(a.deps_install_dir, b.deps_install_dir);
    assert_ne!(a.binary_dir, b.binary_dir);
  }

  #[test]
  fn internal_dirs() {
    let ws = Workspace::new("/b");
    assert_eq!(ws.executor_binary_dir(), PathBuf::from("/b/_cmkx/executor/b"));
    assert_eq!(ws.tmp_dir(), PathBuf::from("/b/_cmkx/tmp"));
    assert_eq!(ws.settings_path(), PathBuf::from("/b/_cmkx/settings.json"));
  }
}
