//! Configure and build steps for one (package, configuration) pair.
//!
//! A build runs strictly in sequence:
//!
//! 1. resolve the [`DirectoryLayout`]
//! 2. complete the configure arguments (install prefix for packages, build
//!    type for single-config generators)
//! 3. ask the [`CacheTracker`] what has to be applied; configure only if
//!    something has, or if the binary dir was never configured
//! 4. build each requested target, stopping at the first failure
//!
//! Package steps are captured and saved as log files. The main project's
//! output goes straight to the terminal.
//!
//! Nothing here serializes access to a binary dir: callers must not run two
//! builds of the same pair concurrently.

mod types;

use std::fs;
use std::path::Path;

use tracing::{error, info};

use crate::args::{self, BuildArgument, SwitchKind};
use crate::cache::CacheTracker;
use crate::consts::{CMAKE_BUILD_TYPE, CMAKE_CACHE_FILENAME, CMAKE_INSTALL_PREFIX};
use crate::layout::{ConfigName, DirectoryLayout, Workspace};
use crate::process::{self, ProcessError};
use crate::settings::{ToolConfig, WorkspaceSettings};

pub use types::*;

/// Everything shared by the builds of one workspace.
#[derive(Debug, Clone)]
pub struct BuildContext {
  pub workspace: Workspace,
  pub settings: WorkspaceSettings,
  pub tool: ToolConfig,
}

impl BuildContext {
  pub fn new(workspace: Workspace, settings: WorkspaceSettings, tool: ToolConfig) -> Self {
    Self {
      workspace,
      settings,
      tool,
    }
  }

  pub fn layout(&self, package: &str, source_dir: &Path, config: &ConfigName) -> DirectoryLayout {
    DirectoryLayout::resolve(
      &self.workspace,
      package,
      source_dir,
      config,
      self.settings.per_config_bin_dirs,
      self.settings.multiconfig_generator,
    )
  }
}

/// Configure (if needed) and build the requested targets.
///
/// # Panics
///
/// If the workspace uses a multiconfig generator and `request.config` is
/// no-config. Callers must always name a configuration for those.
pub async fn build(ctx: &BuildContext, request: &BuildRequest) -> Result<BuildReport, BuildError> {
  let multiconfig = ctx.settings.multiconfig_generator;
  assert!(
    !(multiconfig && request.config.is_noconfig()),
    "multiconfig generators need an explicit configuration"
  );

  let layout = ctx.layout(&request.package, &request.source_dir, &request.config);
  let configure_args = configure_args(ctx, &layout, request)?;

  let force = request.force_configure || !layout.binary_dir.join(CMAKE_CACHE_FILENAME).is_file();
  let tracker = CacheTracker::new(&layout.binary_dir);
  let proposal = tracker.about_to_configure(&configure_args, force)?;

  let configured = if proposal.needs_configure {
    fs::create_dir_all(&layout.binary_dir).map_err(|source| BuildError::CreateDir {
      path: layout.binary_dir.clone(),
      source,
    })?;

    let mut cmd_args = vec![
      format!("-H{}", layout.source_dir.display()),
      format!("-B{}", layout.binary_dir.display()),
    ];
    cmd_args.extend(proposal.args.iter().map(BuildArgument::render));

    let log_name = package_log_name(&layout, &request.config, "configure", None);
    let code = run_step(ctx, &layout, &cmd_args, log_name).await?;
    if code != 0 {
      error!(package = %display_package(&layout), config = %request.config, code, "configure failed");
      return Err(BuildError::ConfigureFailed { code });
    }
    tracker.confirm()?;
    true
  } else {
    info!(
      package = %display_package(&layout),
      config = %request.config,
      "configure skipped, cache is up to date"
    );
    false
  };

  for target in &request.targets {
    let mut cmd_args = vec!["--build".to_string(), layout.binary_dir.display().to_string()];
    if !target.is_empty() {
      cmd_args.push("--target".to_string());
      cmd_args.push(target.clone());
    }
    if multiconfig && let Some(config) = request.config.name() {
      cmd_args.push("--config".to_string());
      cmd_args.push(config.to_string());
    }

    let log_name = package_log_name(&layout, &request.config, "build", Some(target));
    let code = run_step(ctx, &layout, &cmd_args, log_name).await?;
    if code != 0 {
      error!(package = %display_package(&layout), config = %request.config, build_target = %target, code, "build failed");
      return Err(BuildError::BuildFailed {
        target: target.clone(),
        code,
      });
    }
  }

  Ok(BuildReport {
    binary_dir: layout.binary_dir,
    configured,
    targets: request.targets.clone(),
  })
}

/// Normalized configure arguments of a request, completed with the settings
/// this build controls itself.
fn configure_args(
  ctx: &BuildContext,
  layout: &DirectoryLayout,
  request: &BuildRequest,
) -> Result<Vec<BuildArgument>, BuildError> {
  let mut normalized = args::normalize(&request.args)?;

  if !layout.is_main() {
    if let Some(arg) = args::find_reserved(&normalized) {
      return Err(BuildError::ReservedArgumentConflict {
        package: layout.package.clone(),
        name: arg.name.clone(),
        arg: arg.render(),
      });
    }
    normalized.push(BuildArgument::define(
      CMAKE_INSTALL_PREFIX,
      layout.deps_install_dir.display().to_string(),
    ));
  }

  if args::find_switch(&normalized, SwitchKind::Generator).is_none() && !ctx.settings.generator.is_empty() {
    normalized.push(BuildArgument::switch(SwitchKind::Generator, ctx.settings.generator.clone()));
  }

  if !ctx.settings.multiconfig_generator {
    normalized.push(match request.config.name() {
      Some(name) => BuildArgument::define(CMAKE_BUILD_TYPE, name),
      None => BuildArgument::undefine(CMAKE_BUILD_TYPE),
    });
  }

  Ok(args::canonicalize(normalized))
}

fn package_log_name(layout: &DirectoryLayout, config: &ConfigName, step: &str, target: Option<&str>) -> Option<String> {
  (!layout.is_main()).then(|| process::log_file_name(&layout.package, config, step, target))
}

fn display_package(layout: &DirectoryLayout) -> &str {
  if layout.is_main() { "<main>" } else { &layout.package }
}

/// Run one build-tool step: inherited when `log_name` is `None`, otherwise
/// captured and saved to the log dir.
async fn run_step(
  ctx: &BuildContext,
  layout: &DirectoryLayout,
  args: &[String],
  log_name: Option<String>,
) -> Result<i32, ProcessError> {
  match log_name {
    None => process::run_inherited(&ctx.tool.cmake, args).await,
    Some(name) => {
      let run = process::run_captured(&ctx.tool.cmake, args).await?;
      process::save_log(&layout.log_dir, &name, &run.output, run.code);
      Ok(run.code)
    }
  }
}
