//! `pbforge`: build PocketBase binaries with plugins compiled in.

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::RequestArgs;
use crate::output::{OutputFormat, print_error};

/// Build custom PocketBase binaries
#[derive(Parser)]
#[command(name = "pbforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging and stream toolchain output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile a binary for the requested platform and modules
  Build {
    #[command(flatten)]
    request: RequestArgs,

    /// Build in this directory instead of a temporary one; it is kept afterwards
    #[arg(long, value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// Abort the toolchain after this long (e.g. "90s", "5m")
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Where to write the binary (default: ./pocketbase, or ./pocketbase.exe for windows)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
  },

  /// Print the generated go.mod and main.go without building
  Render {
    #[command(flatten)]
    request: RequestArgs,
  },

  /// List supported target architectures and operating systems
  Platforms {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
  },

  /// Show the host platform and toolchain settings
  Info {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build {
      request,
      workdir,
      timeout,
      output,
      format,
    } => cmd::cmd_build(request, workdir, timeout, output, format, cli.verbose),
    Commands::Render { request } => cmd::cmd_render(request),
    Commands::Platforms { format } => cmd::cmd_platforms(format),
    Commands::Info { format } => cmd::cmd_info(format),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&e.to_string());
      ExitCode::FAILURE
    }
  }
}
