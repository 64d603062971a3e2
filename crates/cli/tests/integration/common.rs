//! Shared test helpers for CLI integration tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Fake build tool.
///
/// Records each invocation in `calls.txt`, creates `CMakeCache.txt` in the
/// `-B` dir, and for a dependency-script run copies the script (which holds
/// ready-made declaration lines) into the side-output file. Exits 2 when
/// asked to build the target `broken`.
const FAKE_CMAKE: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls.txt"
for a in "$@"; do
  case "$a" in
    -B*) mkdir -p "${a#-B}" && touch "${a#-B}/CMakeCache.txt" ;;
    "-D__CMKX_EXECUTOR_COMMAND=run;"*)
      rest="${a#*=run;}"
      cat "${rest%%;*}" >> "${rest#*;}"
      ;;
  esac
done
case "$*" in
  *"--target broken"*) echo "broken target" >&2; exit 2 ;;
esac
exit 0
"#;

/// Isolated test environment with a fake build tool.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let tools = temp.path().join("tools");
    fs::create_dir_all(&tools).unwrap();

    let cmake = tools.join("cmake");
    fs::write(&cmake, FAKE_CMAKE).unwrap();
    let mut perms = fs::metadata(&cmake).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&cmake, perms).unwrap();

    Self { temp }
  }

  pub fn binary_dir(&self) -> PathBuf {
    self.temp.path().join("bin")
  }

  /// Write a file relative to the temp directory and return its path.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
  }

  /// Build-tool invocations so far.
  pub fn calls(&self) -> Vec<String> {
    fs::read_to_string(self.temp.path().join("tools").join("calls.txt"))
      .map(|s| s.lines().map(str::to_string).collect())
      .unwrap_or_default()
  }

  /// Get a Command for the cmkx binary using the fake build tool.
  pub fn cmkx_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("cmkx");
    cmd.env("CMKX_CMAKE", self.temp.path().join("tools").join("cmake"));
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
