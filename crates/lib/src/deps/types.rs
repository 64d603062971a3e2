//! Package requests and dependency-script errors.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::TrackerError;
use crate::process::ProcessError;

/// One dependency declared by a manifest.
///
/// `fields` are passed on as written (`GIT_TAG=v1.2`, `SOURCE_DIR=lib`, ...);
/// interpreting them is up to the package resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRequest {
  pub name: String,
  #[serde(default)]
  pub fields: Vec<String>,
}

impl PackageRequest {
  pub fn new<S: Into<String>>(name: impl Into<String>, fields: impl IntoIterator<Item = S>) -> Self {
    Self {
      name: name.into(),
      fields: fields.into_iter().map(Into::into).collect(),
    }
  }
}

#[derive(Debug, Error)]
pub enum DepsError {
  #[error("dependency script {path} not found: {reason}")]
  ManifestNotFound { path: PathBuf, reason: &'static str },

  #[error("dependency script {manifest} failed with exit code {code}")]
  DependencyScriptFailed { manifest: PathBuf, code: i32 },

  #[error("configuring the dependency script host failed with exit code {code}")]
  HostConfigureFailed { code: i32 },

  #[error("malformed declaration on line {line}: {content:?}")]
  MalformedDeclaration { line: usize, content: String },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Tracker(#[from] TrackerError),

  #[error(transparent)]
  Process(#[from] ProcessError),
}

/// Parse the side output of a script run.
///
/// Each non-empty line is `name<TAB>field<TAB>field...`. Fields are not
/// validated beyond the split.
pub fn parse_declarations(content: &str) -> Result<Vec<PackageRequest>, DepsError> {
  let mut requests = Vec::new();
  for (index, line) in content.lines().enumerate() {
    if line.is_empty() {
      continue;
    }
    let mut parts = line.split('\t');
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
      return Err(DepsError::MalformedDeclaration {
        line: index + 1,
        content: line.to_string(),
      });
    }
    requests.push(PackageRequest::new(name, parts));
  }
  Ok(requests)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_names_and_fields() {
    let requests = parse_declarations("foo\tbar=1\tbaz=2\nqux\n").unwrap();
    assert_eq!(
      requests,
      vec![
        PackageRequest::new("foo", ["bar=1", "baz=2"]),
        PackageRequest::new("qux", Vec::<String>::new()),
      ]
    );
  }

  #[test]
  fn empty_output_declares_nothing() {
    assert!(parse_declarations("").unwrap().is_empty());
    assert!(parse_declarations("\n\n").unwrap().is_empty());
  }

  #[test]
  fn crlf_line_endings() {
    let requests = parse_declarations("a\tx\r\nb\r\n").unwrap();
    assert_eq!(requests[0], PackageRequest::new("a", ["x"]));
    assert_eq!(requests[1].name, "b");
  }

  #[test]
  fn fields_are_kept_verbatim() {
    // Duplicates and inner spaces pass through untouched.
    let requests = parse_declarations("a\tGIT_TAG=v 1\tGIT_TAG=v 1\na\n").unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].fields, vec!["GIT_TAG=v 1", "GIT_TAG=v 1"]);
  }

  #[test]
  fn missing_name_is_malformed() {
    let err = parse_declarations("ok\n\tfield\n").unwrap_err();
    assert!(matches!(err, DepsError::MalformedDeclaration { line: 2, .. }));
  }
}
