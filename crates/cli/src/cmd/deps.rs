//! Implementation of the `cmkx deps` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cmkx_lib::args::normalize_global;
use cmkx_lib::deps::{CMakeEvaluator, DependencyResolver};
use cmkx_lib::layout::Workspace;
use cmkx_lib::settings::ToolConfig;

use super::prepare_binary_root;
use crate::output::{OutputFormat, print_info, print_json};

#[derive(Args, Debug)]
pub struct DepsArgs {
  /// Dependency script to evaluate
  pub manifest: PathBuf,

  /// Binary root of the build tree
  #[arg(short = 'B', long)]
  pub binary_dir: PathBuf,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,

  /// Global configure arguments applied to the script host, after `--`
  #[arg(last = true, allow_hyphen_values = true)]
  pub cmake_args: Vec<String>,
}

pub fn cmd_deps(args: DepsArgs) -> Result<()> {
  let workspace = Workspace::new(prepare_binary_root(&args.binary_dir)?);
  let global = normalize_global(&args.cmake_args).context("Invalid global configure arguments")?;
  let tool = ToolConfig::from_env();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let requests = rt
    .block_on(async {
      let evaluator = CMakeEvaluator::configure(&workspace, &tool, &global).await?;
      DependencyResolver::new(evaluator)
        .read_package_requests(&args.manifest)
        .await
    })
    .with_context(|| format!("Failed to read dependencies of {}", args.manifest.display()))?;

  if args.output.is_json() {
    return print_json(&requests);
  }

  if requests.is_empty() {
    print_info("No dependencies declared");
    return Ok(());
  }
  for request in &requests {
    if request.fields.is_empty() {
      println!("{}", request.name);
    } else {
      println!("{} {}", request.name, request.fields.join(" "));
    }
  }
  Ok(())
}
