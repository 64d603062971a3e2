//! Implementation of the `cmkx build` command.
//!
//! Configures the main project or one dependency package when its cached
//! arguments are out of date, then builds the requested targets.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::debug;

use cmkx_lib::args::normalize;
use cmkx_lib::build::{BuildContext, BuildRequest, build};
use cmkx_lib::layout::{ConfigName, Workspace};
use cmkx_lib::settings::{ToolConfig, WorkspaceSettings};

use super::prepare_binary_root;
use crate::output::{format_duration, print_stat, print_success};

#[derive(Args, Debug)]
pub struct BuildArgs {
  /// Binary root of the build tree
  #[arg(short = 'B', long)]
  pub binary_dir: PathBuf,

  /// Source dir of the main project, or source sub-directory of a package
  #[arg(short = 'S', long)]
  pub source_dir: Option<PathBuf>,

  /// Build this dependency package instead of the main project
  #[arg(short, long)]
  pub package: Option<String>,

  /// Configuration to build (required for multi-config generators)
  #[arg(short, long)]
  pub config: Option<String>,

  /// Target to build, repeatable (default: the default target)
  #[arg(short, long = "target")]
  pub targets: Vec<String>,

  /// Run the configure step even if the cache is up to date
  #[arg(long)]
  pub force_configure: bool,

  /// Use one binary dir per configuration with single-config generators
  /// (only honored when the build tree is created)
  #[arg(long)]
  pub per_config_bin_dirs: bool,

  /// Configure arguments (-D, -U, -G, -T, -A, -C), after `--`
  #[arg(last = true, allow_hyphen_values = true)]
  pub cmake_args: Vec<String>,
}

pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let workspace = Workspace::new(prepare_binary_root(&args.binary_dir)?);
  let requested = normalize(&args.cmake_args).context("Invalid configure arguments")?;
  let settings = WorkspaceSettings::load_or_init(&workspace, &requested, args.per_config_bin_dirs)
    .context("Failed to load workspace settings")?;

  let config = ConfigName::new(args.config.unwrap_or_default());
  if settings.multiconfig_generator && config.is_noconfig() {
    bail!(
      "--config is required with the multi-config generator '{}'",
      settings.generator
    );
  }

  let request = match args.package {
    Some(package) => BuildRequest::package(package, config).with_source_dir(args.source_dir.unwrap_or_default()),
    None => {
      let source_dir = args
        .source_dir
        .context("--source-dir is required when building the main project")?;
      let source_dir = dunce::canonicalize(&source_dir)
        .with_context(|| format!("Source dir not found: {}", source_dir.display()))?;
      BuildRequest::main(source_dir, config)
    }
  };
  let mut request = request
    .with_args(args.cmake_args)
    .with_force_configure(args.force_configure);
  if !args.targets.is_empty() {
    request = request.with_targets(args.targets);
  }

  let name = if request.is_main() {
    "main project".to_string()
  } else {
    request.package.clone()
  };
  debug!(?request, "build request");

  let ctx = BuildContext::new(workspace, settings, ToolConfig::from_env());
  let start = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(build(&ctx, &request))
    .with_context(|| format!("Build of {name} ({}) failed", request.config))?;

  print_success(&format!(
    "Built {name} ({}) in {}",
    request.config,
    format_duration(start.elapsed())
  ));
  print_stat("Binary dir", &report.binary_dir.display().to_string());
  print_stat(
    "Configured",
    if report.configured { "yes" } else { "no, cache up to date" },
  );

  Ok(())
}
