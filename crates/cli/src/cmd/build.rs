//! Implementation of the `pbforge build` command.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use pbforge_lib::builder::artifact_file_name;
use pbforge_lib::{BuildOutput, Builder, BuilderOptions, GoToolchain, OutputSink};

use super::{RequestArgs, parse_timeout};
use crate::output::{OutputFormat, format_bytes, format_duration, print_info, print_json, print_stat, print_success};

/// Environment variable consulted when `--timeout` is not given.
pub const TIMEOUT_ENV: &str = "PBFORGE_TIMEOUT";

#[derive(Debug, Serialize)]
struct BuildSummary {
  path: PathBuf,
  platform: String,
  size: u64,
  sha256: String,
  duration_ms: u128,
}

/// Build a binary and write it to `output`, or `./pocketbase[.exe]`.
///
/// With `verbose`, toolchain output is streamed to stderr as it arrives.
pub fn cmd_build(
  args: RequestArgs,
  workdir: Option<PathBuf>,
  timeout: Option<Duration>,
  output: Option<PathBuf>,
  format: OutputFormat,
  verbose: bool,
) -> Result<()> {
  let request = args.resolve()?;

  let mut toolchain = GoToolchain::from_env();
  if let Some(timeout) = effective_timeout(timeout)? {
    toolchain = toolchain.with_timeout(timeout);
  }
  debug!(program = %toolchain.program.display(), timeout = ?toolchain.timeout, "toolchain configured");

  let mut options = BuilderOptions::default().with_toolchain(toolchain);
  if let Some(dir) = &workdir {
    options = options.with_dir(dir);
  }
  if verbose {
    options = options.with_output(OutputSink::stderr());
  }

  let mut builder = Builder::with_options(request, options)?;
  let platform = builder.platform();
  let destination = output.unwrap_or_else(|| PathBuf::from(artifact_file_name(platform.os)));

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let started = Instant::now();
  let built = rt.block_on(write_binary(&mut builder, &destination));
  let elapsed = started.elapsed();
  let released = builder.close();

  let built = built?;
  released?;

  let path = dunce::canonicalize(&built.path).unwrap_or_else(|_| built.path.clone());

  if format.is_json() {
    print_json(&BuildSummary {
      path,
      platform: platform.pair(),
      size: built.size,
      sha256: built.sha256.to_string(),
      duration_ms: elapsed.as_millis(),
    })?;
  } else {
    print_success(&format!("Built {} for {}", path.display(), platform));
    print_stat("Size", &format_bytes(built.size));
    print_stat("SHA-256", &built.sha256.to_string());
    print_stat("Duration", &format_duration(elapsed));
    if let Some(dir) = workdir {
      print_info(&format!("Sources kept in {}", dir.display()));
    }
  }

  Ok(())
}

async fn write_binary(builder: &mut Builder, destination: &Path) -> Result<BuildOutput, pbforge_lib::BuildError> {
  if destination.is_absolute() {
    builder.build_to_absolute_filepath(destination).await
  } else {
    builder.build_to_relative_filepath(destination).await
  }
}

/// The flag wins over the environment; a blank variable means no timeout.
fn effective_timeout(flag: Option<Duration>) -> Result<Option<Duration>> {
  if flag.is_some() {
    return Ok(flag);
  }
  match std::env::var(TIMEOUT_ENV) {
    Ok(value) if !value.trim().is_empty() => parse_timeout(&value).map(Some),
    _ => Ok(None),
  }
}
