//! Test utilities for cmkx-lib.
//!
//! Tests never run a real build tool. Instead they write small `/bin/sh`
//! scripts that stand in for it and record how they were invoked.

use std::fs;
use std::path::{Path, PathBuf};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

/// Write an executable shell script named `name` into `dir`.
///
/// Tests spawning the result should be `#[serial]`: a script still open for
/// writing in another thread's fork cannot be executed.
#[cfg(unix)]
pub fn write_fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
  let mut perms = fs::metadata(&path).unwrap().permissions();
  perms.set_mode(0o755);
  fs::set_permissions(&path, perms).unwrap();
  path
}

/// Fake build tool appending each invocation's arguments, one line per call,
/// to `<dir>/calls.txt`.
///
/// A configure (`-H<src> -B<bin> ...`) writes `CMakeCache.txt` into the binary
/// dir. `extra` runs after that, with `$@` still available.
#[cfg(unix)]
pub fn write_recording_cmake(dir: &Path, extra: &str) -> PathBuf {
  let calls = dir.join("calls.txt");
  let body = format!(
    r#"echo "$@" >> "{calls}"
for a in "$@"; do
  case "$a" in
    -B*) mkdir -p "${{a#-B}}" && touch "${{a#-B}}/CMakeCache.txt" ;;
  esac
done
{extra}"#,
    calls = calls.display()
  );
  write_fake_tool(dir, "fake-cmake", &body)
}

/// Invocations recorded by [`write_recording_cmake`].
pub fn recorded_calls(dir: &Path) -> Vec<String> {
  fs::read_to_string(dir.join("calls.txt"))
    .map(|s| s.lines().map(str::to_string).collect())
    .unwrap_or_default()
}
