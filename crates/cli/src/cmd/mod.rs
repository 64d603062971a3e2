mod build;
mod deps;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use build::{BuildArgs, cmd_build};
pub use deps::{DepsArgs, cmd_deps};

/// Create the binary root if needed and return its canonical path.
fn prepare_binary_root(dir: &Path) -> Result<PathBuf> {
  fs::create_dir_all(dir).with_context(|| format!("Failed to create binary dir: {}", dir.display()))?;
  dunce::canonicalize(dir).with_context(|| format!("Failed to resolve binary dir: {}", dir.display()))
}
