//! Filesystem helpers.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// Write `content` to `path` atomically: write to `<path>.tmp`, then rename.
///
/// Readers never observe a partially written file.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }

  let mut temp_name = OsString::from(path.as_os_str());
  temp_name.push(".tmp");
  let temp_path = Path::new(&temp_name);

  fs::write(temp_path, content)?;
  fs::rename(temp_path, path)
}
