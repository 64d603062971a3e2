//! The build tool as a scripting host for dependency manifests.
//!
//! A generated helper project defines `declare_package(NAME [FIELD...])`
//! (alias `add_pkg`). When its configure step finds a `run` command in
//! [`EXECUTOR_COMMAND_VAR`], it includes the manifest, and every declaration
//! is appended as one tab-separated line to the side-output file. The command
//! variable is removed from the cache as soon as it is read, so a later
//! configure of the helper never replays a run.
//!
//! ```text
//! <root>/_cmkx/executor/CMakeLists.txt    helper project
//! <root>/_cmkx/executor/b/                its binary dir
//! <root>/_cmkx/tmp/add_pkg_out.txt        side output of the last run
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use super::{DepsError, ManifestEvaluator, PackageRequest, check_manifest, parse_declarations};
use crate::args::{self, BuildArgument};
use crate::cache::CacheTracker;
use crate::consts::{
  ADD_PKG_OUT_FILENAME, ADD_PKG_OUT_VAR, CMAKE_CACHE_FILENAME, EXECUTOR_COMMAND_VAR, EXECUTOR_LOG_NAME, LOG_EXTENSION,
};
use crate::layout::Workspace;
use crate::process::{self, ProcessError};
use crate::settings::ToolConfig;
use crate::util::hash::hash_bytes;

const SCRIPT_FILENAME: &str = "CMakeLists.txt";
const HASH_LINE_PREFIX: &str = "# script hash: ";

const SCRIPT_TEMPLATE: &str = r#"cmake_minimum_required(VERSION 3.5)
project(cmkx_dependency_host NONE)

set(__cmkx_command "${@COMMAND_VAR@}")
unset(@COMMAND_VAR@ CACHE)

function(declare_package NAME)
  list(LENGTH NAME __cmkx_len)
  if(NOT __cmkx_len EQUAL 1)
    message(FATAL_ERROR "declare_package: the package name must be a single token, got '${NAME}'")
  endif()
  set(__cmkx_line "${NAME}")
  foreach(__cmkx_field IN LISTS ARGN)
    if(__cmkx_field MATCHES "[\t\n]")
      message(FATAL_ERROR "declare_package(${NAME}): fields must not contain tabs or newlines")
    endif()
    string(APPEND __cmkx_line "\t${__cmkx_field}")
  endforeach()
  file(APPEND "${@OUT_VAR@}" "${__cmkx_line}\n")
endfunction()

macro(add_pkg)
  declare_package(${ARGV})
endmacro()

function(include_deps_script PATH)
  if(NOT IS_ABSOLUTE "${PATH}")
    get_filename_component(PATH "${PATH}" ABSOLUTE BASE_DIR "${CMAKE_CURRENT_LIST_DIR}")
  endif()
  if(NOT EXISTS "${PATH}" OR IS_DIRECTORY "${PATH}")
    message(FATAL_ERROR "dependency script not found: ${PATH}")
  endif()
  include("${PATH}")
endfunction()

if(__cmkx_command)
  list(GET __cmkx_command 0 __cmkx_verb)
  if(__cmkx_verb STREQUAL "run")
    list(LENGTH __cmkx_command __cmkx_len)
    if(NOT __cmkx_len EQUAL 3)
      message(FATAL_ERROR "run expects a script and an output file, got '${__cmkx_command}'")
    endif()
    list(GET __cmkx_command 1 __cmkx_script)
    list(GET __cmkx_command 2 @OUT_VAR@)
    include_deps_script("${__cmkx_script}")
  else()
    message(FATAL_ERROR "unknown command: '${__cmkx_verb}'")
  endif()
endif()
"#;

/// Full text of the helper project's script, hash line first.
pub fn helper_script() -> String {
  let body = SCRIPT_TEMPLATE
    .replace("@COMMAND_VAR@", EXECUTOR_COMMAND_VAR)
    .replace("@OUT_VAR@", ADD_PKG_OUT_VAR);
  format!("{HASH_LINE_PREFIX}{}\n{body}", hash_bytes(body.as_bytes()))
}

/// Write the helper script into `dir` unless an identical one is there.
///
/// Returns whether the file was (re)written.
pub fn write_helper_script(dir: &Path) -> Result<bool, DepsError> {
  let path = dir.join(SCRIPT_FILENAME);
  let script = helper_script();
  let hash_line = script.lines().next().unwrap_or_default();

  if let Ok(existing) = fs::read_to_string(&path)
    && existing.lines().next() == Some(hash_line)
  {
    return Ok(false);
  }

  fs::create_dir_all(dir).map_err(|source| DepsError::Write {
    path: dir.to_path_buf(),
    source,
  })?;
  fs::write(&path, script).map_err(|source| DepsError::Write {
    path: path.clone(),
    source,
  })?;
  debug!(path = %path.display(), "wrote dependency script host");
  Ok(true)
}

/// [`ManifestEvaluator`] running manifests through the build tool.
#[derive(Debug, Clone)]
pub struct CMakeEvaluator {
  tool: ToolConfig,
  source_dir: PathBuf,
  binary_dir: PathBuf,
  log_dir: PathBuf,
  out_path: PathBuf,
}

impl CMakeEvaluator {
  /// Generate and configure the helper project.
  ///
  /// `global_args` (generator selection, toolchain, ...) are applied to the
  /// helper like to any package. The configure step only runs when the
  /// script changed, the helper was never configured, or the tracker reports
  /// changed arguments.
  pub async fn configure(
    workspace: &Workspace,
    tool: &ToolConfig,
    global_args: &[BuildArgument],
  ) -> Result<Self, DepsError> {
    let evaluator = Self {
      tool: tool.clone(),
      source_dir: workspace.executor_dir(),
      binary_dir: workspace.executor_binary_dir(),
      log_dir: workspace.log_dir(),
      out_path: workspace.tmp_dir().join(ADD_PKG_OUT_FILENAME),
    };

    let rewritten = write_helper_script(&evaluator.source_dir)?;
    let force = rewritten || !evaluator.binary_dir.join(CMAKE_CACHE_FILENAME).is_file();

    let requested = args::canonicalize(
      global_args
        .iter()
        .cloned()
        .chain([BuildArgument::undefine(EXECUTOR_COMMAND_VAR)]),
    );
    let tracker = CacheTracker::new(&evaluator.binary_dir);
    let proposal = tracker.about_to_configure(&requested, force)?;

    if proposal.needs_configure {
      let mut cmd_args = evaluator.location_args();
      cmd_args.extend(proposal.args.iter().map(BuildArgument::render));

      let code = evaluator.run_logged(&cmd_args, "configure").await?;
      if code != 0 {
        error!(code, "dependency script host configure failed");
        return Err(DepsError::HostConfigureFailed { code });
      }
      tracker.confirm()?;
      info!(dir = %evaluator.binary_dir.display(), "configured dependency script host");
    } else {
      debug!(dir = %evaluator.binary_dir.display(), "dependency script host up to date");
    }

    Ok(evaluator)
  }

  /// Evaluate a manifest and return the packages it declares.
  pub async fn run_script(&self, manifest: &Path) -> Result<Vec<PackageRequest>, DepsError> {
    let manifest = check_manifest(manifest)?;

    if let Some(tmp_dir) = self.out_path.parent() {
      fs::create_dir_all(tmp_dir).map_err(|source| DepsError::Write {
        path: tmp_dir.to_path_buf(),
        source,
      })?;
    }
    fs::write(&self.out_path, "").map_err(|source| DepsError::Write {
      path: self.out_path.clone(),
      source,
    })?;

    let mut cmd_args = self.location_args();
    cmd_args.push(format!(
      "-D{EXECUTOR_COMMAND_VAR}=run;{};{}",
      manifest.display(),
      self.out_path.display()
    ));

    let code = self.run_logged(&cmd_args, "run").await?;
    if code != 0 {
      error!(manifest = %manifest.display(), code, "dependency script failed");
      return Err(DepsError::DependencyScriptFailed { manifest, code });
    }

    let content = fs::read_to_string(&self.out_path).map_err(|source| DepsError::Read {
      path: self.out_path.clone(),
      source,
    })?;
    parse_declarations(&content)
  }

  fn location_args(&self) -> Vec<String> {
    vec![
      format!("-H{}", self.source_dir.display()),
      format!("-B{}", self.binary_dir.display()),
    ]
  }

  async fn run_logged(&self, args: &[String], step: &str) -> Result<i32, ProcessError> {
    let run = process::run_captured(&self.tool.cmake, args).await?;
    let log_name = format!("{EXECUTOR_LOG_NAME}-{step}{LOG_EXTENSION}");
    process::save_log(&self.log_dir, &log_name, &run.output, run.code);
    Ok(run.code)
  }
}

impl ManifestEvaluator for CMakeEvaluator {
  async fn evaluate(&self, manifest: &Path) -> Result<Vec<PackageRequest>, DepsError> {
    self.run_script(manifest).await
  }
}
