//! Dependency manifests.
//!
//! A manifest is a build-tool script declaring the packages a project
//! depends on:
//!
//! ```cmake
//! declare_package(zlib GIT_REPOSITORY=https://github.com/madler/zlib GIT_TAG=v1.3)
//! if(WITH_TESTS)
//!   declare_package(googletest GIT_TAG=v1.14.0)
//! endif()
//! ```
//!
//! Manifests may use any construct of the scripting language, so they are
//! not parsed here. A [`ManifestEvaluator`] runs them and reports the
//! declarations; [`CMakeEvaluator`] does so with the build tool itself.

mod host;
mod types;

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub use host::{CMakeEvaluator, helper_script, write_helper_script};
pub use types::*;

/// Evaluates manifests into package requests.
pub trait ManifestEvaluator: Send + Sync {
  fn evaluate(&self, manifest: &Path) -> impl Future<Output = Result<Vec<PackageRequest>, DepsError>> + Send;
}

/// Validate a manifest path before anything is run for it.
///
/// The manifest must be an existing regular file whose path can be passed
/// as a single list element (no `;`). Returns the canonical path.
pub fn check_manifest(manifest: &Path) -> Result<PathBuf, DepsError> {
  let not_found = |reason| DepsError::ManifestNotFound {
    path: manifest.to_path_buf(),
    reason,
  };

  let path = dunce::canonicalize(manifest).map_err(|_| not_found("no such file"))?;
  if !path.is_file() {
    return Err(not_found("not a file"));
  }
  if path.to_string_lossy().contains(';') {
    return Err(not_found("path contains ';'"));
  }
  Ok(path)
}

/// Reads the package requests of manifests through an evaluator.
#[derive(Debug, Clone)]
pub struct DependencyResolver<E> {
  evaluator: E,
}

impl<E: ManifestEvaluator> DependencyResolver<E> {
  pub fn new(evaluator: E) -> Self {
    Self { evaluator }
  }

  pub fn evaluator(&self) -> &E {
    &self.evaluator
  }

  /// Packages declared by `manifest`. An empty result is a leaf package.
  pub async fn read_package_requests(&self, manifest: &Path) -> Result<Vec<PackageRequest>, DepsError> {
    let manifest = check_manifest(manifest)?;
    let requests = self.evaluator.evaluate(&manifest).await?;

    info!(manifest = %manifest.display(), count = requests.len(), "read package requests");
    for request in &requests {
      debug!(name = %request.name, fields = ?request.fields, "package request");
    }
    Ok(requests)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;
  use std::fs;
  use std::sync::Mutex;
  use tempfile::TempDir;

  /// Returns canned side output per manifest file name.
  #[derive(Default)]
  struct FakeEvaluator {
    outputs: HashMap<String, String>,
    evaluated: Mutex<Vec<PathBuf>>,
  }

  impl FakeEvaluator {
    fn with_output(mut self, file_name: &str, output: &str) -> Self {
      self.outputs.insert(file_name.to_string(), output.to_string());
      self
    }
  }

  impl ManifestEvaluator for FakeEvaluator {
    async fn evaluate(&self, manifest: &Path) -> Result<Vec<PackageRequest>, DepsError> {
      self.evaluated.lock().unwrap().push(manifest.to_path_buf());
      let name = manifest.file_name().unwrap().to_string_lossy();
      match self.outputs.get(name.as_ref()) {
        Some(output) => parse_declarations(output),
        None => Err(DepsError::DependencyScriptFailed {
          manifest: manifest.to_path_buf(),
          code: 1,
        }),
      }
    }
  }

  fn manifest(temp: &TempDir, name: &str) -> PathBuf {
    let path = temp.path().join(name);
    fs::write(&path, "").unwrap();
    path
  }

  #[tokio::test]
  async fn declarations_become_requests() {
    let temp = TempDir::new().unwrap();
    let path = manifest(&temp, "deps.cmake");
    let resolver = DependencyResolver::new(FakeEvaluator::default().with_output("deps.cmake", "foo\tbar=1\tbaz=2\nqux\n"));

    let requests = resolver.read_package_requests(&path).await.unwrap();

    assert_eq!(
      requests,
      vec![
        PackageRequest::new("foo", ["bar=1", "baz=2"]),
        PackageRequest::new("qux", Vec::<String>::new()),
      ]
    );
  }

  #[tokio::test]
  async fn leaf_package_has_no_requests() {
    let temp = TempDir::new().unwrap();
    let path = manifest(&temp, "deps.cmake");
    let resolver = DependencyResolver::new(FakeEvaluator::default().with_output("deps.cmake", ""));

    assert!(resolver.read_package_requests(&path).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn evaluator_failure_propagates() {
    let temp = TempDir::new().unwrap();
    let path = manifest(&temp, "other.cmake");
    let resolver = DependencyResolver::new(FakeEvaluator::default());

    let err = resolver.read_package_requests(&path).await.unwrap_err();
    assert!(matches!(err, DepsError::DependencyScriptFailed { code: 1, .. }));
  }

  #[tokio::test]
  async fn missing_manifest_is_not_evaluated() {
    let temp = TempDir::new().unwrap();
    let resolver = DependencyResolver::new(FakeEvaluator::default());

    let err = resolver
      .read_package_requests(&temp.path().join("missing.cmake"))
      .await
      .unwrap_err();

    assert!(matches!(err, DepsError::ManifestNotFound { .. }));
    assert!(resolver.evaluator().evaluated.lock().unwrap().is_empty());
  }

  #[test]
  fn directory_is_not_a_manifest() {
    let temp = TempDir::new().unwrap();
    let err = check_manifest(temp.path()).unwrap_err();
    assert!(matches!(err, DepsError::ManifestNotFound { reason: "not a file", .. }));
  }

  #[test]
  fn semicolon_in_path_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = manifest(&temp, "a;b.cmake");
    let err = check_manifest(&path).unwrap_err();
    assert!(matches!(err, DepsError::ManifestNotFound { reason: "path contains ';'", .. }));
  }

  #[test]
  fn manifest_path_is_canonical() {
    let temp = TempDir::new().unwrap();
    let path = manifest(&temp, "deps.cmake");
    let dotted = temp.path().join(".").join("deps.cmake");
    assert_eq!(check_manifest(&dotted).unwrap(), dunce::canonicalize(&path).unwrap());
  }
}
