//! Go toolchain invocation.
//!
//! A build runs two toolchain steps inside the workspace:
//! 1. `go mod tidy` resolves every required module (including `latest` pins)
//! 2. `go build` compiles the entry point for the target platform
//!
//! Both steps receive `GOOS`/`GOARCH` in the environment and run with cgo
//! disabled. Output is captured line by line and, when an [`OutputSink`] is
//! attached, forwarded as it arrives; a non-zero exit surfaces the captured
//! stderr verbatim. Subprocesses are killed if the future awaiting them is
//! dropped.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::inject::DEFAULT_GO_VERSION;
use crate::platform::Platform;

/// Program run when nothing else is configured.
pub const DEFAULT_PROGRAM: &str = "go";

/// Environment variable overriding the toolchain program.
pub const PROGRAM_ENV: &str = "PBFORGE_GO";

/// A toolchain step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  Tidy,
  Build,
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Step::Tidy => f.write_str("go mod tidy"),
      Step::Build => f.write_str("go build"),
    }
  }
}

/// Errors that can occur running the toolchain.
#[derive(Debug, Error)]
pub enum ToolchainError {
  /// The toolchain could not be started or waited on.
  #[error("failed to run {step} ({}): {source}", program.display())]
  Io {
    step: Step,
    program: PathBuf,
    source: std::io::Error,
  },

  /// The toolchain exited unsuccessfully.
  #[error("{step} failed with exit code {code:?}: {}", diagnostics(stderr, stdout))]
  Failed {
    step: Step,
    code: Option<i32>,
    stderr: String,
    stdout: String,
  },

  /// The step did not finish in time and was killed.
  #[error("{step} timed out after {timeout:?}")]
  TimedOut { step: Step, timeout: Duration },

  /// The toolchain reported success but the binary is missing.
  #[error("{step} produced no binary at {}", path.display())]
  MissingOutput { step: Step, path: PathBuf },
}

/// What the toolchain printed on failure: stderr, or stdout when stderr is
/// empty.
fn diagnostics<'a>(stderr: &'a str, stdout: &'a str) -> &'a str {
  match (stderr.is_empty(), stdout.is_empty()) {
    (false, _) => stderr,
    (true, false) => stdout,
    (true, true) => "no output",
  }
}

/// Which toolchain stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
  Stdout,
  Stderr,
}

/// Receives toolchain output line by line while a step runs.
///
/// Output is still captured for [`ToolchainError::Failed`] whether or not a
/// sink is attached.
#[derive(Clone)]
pub struct OutputSink(Arc<dyn Fn(OutputStream, &str) + Send + Sync>);

impl OutputSink {
  pub fn new(f: impl Fn(OutputStream, &str) + Send + Sync + 'static) -> Self {
    Self(Arc::new(f))
  }

  /// Forward each line to the matching stream of this process.
  pub fn inherit() -> Self {
    Self::new(|stream, line| match stream {
      OutputStream::Stdout => println!("{line}"),
      OutputStream::Stderr => eprintln!("{line}"),
    })
  }

  /// Forward both streams to this process's stderr.
  pub fn stderr() -> Self {
    Self::new(|_, line| eprintln!("{line}"))
  }

  fn emit(&self, stream: OutputStream, line: &str) {
    (self.0)(stream, line)
  }
}

impl fmt::Debug for OutputSink {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("OutputSink(..)")
  }
}

/// Parameters for one toolchain run.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
  /// Build root containing `go.mod` and `main.go`.
  pub workspace: &'a Path,
  pub platform: Platform,
  pub tags: &'a [String],
  pub ldflags: &'a [String],
  /// Where `go build` writes the binary.
  pub output: &'a Path,
  /// Live destination for toolchain output.
  pub sink: Option<&'a OutputSink>,
}

/// How to run the Go toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoToolchain {
  /// Program to execute.
  pub program: PathBuf,
  /// Per-step limit; `None` waits indefinitely.
  pub timeout: Option<Duration>,
  /// `go` directive written to the manifest.
  pub go_version: String,
  /// Extra environment for every step, applied after the target variables.
  pub env: BTreeMap<String, String>,
}

impl Default for GoToolchain {
  fn default() -> Self {
    Self {
      program: PathBuf::from(DEFAULT_PROGRAM),
      timeout: None,
      go_version: DEFAULT_GO_VERSION.to_string(),
      env: BTreeMap::new(),
    }
  }
}

impl GoToolchain {
  /// Default toolchain, with the program taken from `PBFORGE_GO` when set.
  pub fn from_env() -> Self {
    let mut toolchain = Self::default();
    if let Some(program) = std::env::var_os(PROGRAM_ENV).filter(|p| !p.is_empty()) {
      toolchain.program = PathBuf::from(program);
    }
    toolchain
  }

  pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
    self.program = program.into();
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  pub fn with_go_version(mut self, version: impl Into<String>) -> Self {
    self.go_version = version.into();
    self
  }

  pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  /// Resolve modules and compile the workspace.
  ///
  /// On success `invocation.output` holds the binary. On failure any partial
  /// output is removed.
  pub async fn build(&self, invocation: &Invocation<'_>) -> Result<(), ToolchainError> {
    info!(platform = %invocation.platform, workspace = %invocation.workspace.display(), "running toolchain");

    let result = self.build_inner(invocation).await;
    if result.is_err() && invocation.output.exists() {
      debug!(path = %invocation.output.display(), "removing partial output");
      if let Err(e) = tokio::fs::remove_file(invocation.output).await {
        warn!(path = %invocation.output.display(), error = %e, "failed to remove partial output");
      }
    }
    result
  }

  async fn build_inner(&self, invocation: &Invocation<'_>) -> Result<(), ToolchainError> {
    self.run(Step::Tidy, tidy_args(), invocation).await?;
    self.run(Step::Build, build_args(invocation), invocation).await?;

    if !invocation.output.is_file() {
      return Err(ToolchainError::MissingOutput {
        step: Step::Build,
        path: invocation.output.to_path_buf(),
      });
    }
    Ok(())
  }

  async fn run(&self, step: Step, args: Vec<OsString>, invocation: &Invocation<'_>) -> Result<(), ToolchainError> {
    let mut command = Command::new(&self.program);
    command
      .args(&args)
      .current_dir(invocation.workspace)
      .env("GOOS", invocation.platform.os.as_str())
      .env("GOARCH", invocation.platform.arch.as_str())
      .env("CGO_ENABLED", "0")
      .envs(&self.env)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    debug!(step = %step, program = %self.program.display(), args = ?args, "spawning process");

    let io_err = |source: std::io::Error| ToolchainError::Io {
      step,
      program: self.program.clone(),
      source,
    };
    // Dropping the child on timeout or cancellation kills it
    let mut child = command.spawn().map_err(io_err)?;
    let out_pipe = child.stdout.take();
    let err_pipe = child.stderr.take();

    let completed = async {
      let (stdout, stderr) = tokio::try_join!(
        capture(out_pipe, OutputStream::Stdout, invocation.sink),
        capture(err_pipe, OutputStream::Stderr, invocation.sink),
      )?;
      let status = child.wait().await?;
      Ok::<_, std::io::Error>((status, stdout, stderr))
    };

    let (status, stdout, stderr) = match self.timeout {
      Some(timeout) => tokio::time::timeout(timeout, completed)
        .await
        .map_err(|_| ToolchainError::TimedOut { step, timeout })?,
      None => completed.await,
    }
    .map_err(io_err)?;

    let stdout = stdout.trim().to_string();
    let stderr = stderr.trim().to_string();

    if invocation.sink.is_none() {
      if !stdout.is_empty() {
        debug!(step = %step, stdout = %stdout, "toolchain stdout");
      }
      if !stderr.is_empty() {
        debug!(step = %step, stderr = %stderr, "toolchain stderr");
      }
    }

    if !status.success() {
      return Err(ToolchainError::Failed {
        step,
        code: status.code(),
        stderr,
        stdout,
      });
    }

    Ok(())
  }
}

/// Read a pipe to EOF, forwarding each line to `sink` and returning all of it.
async fn capture<R>(pipe: Option<R>, stream: OutputStream, sink: Option<&OutputSink>) -> std::io::Result<String>
where
  R: AsyncRead + Unpin,
{
  let Some(pipe) = pipe else {
    return Ok(String::new());
  };

  let mut reader = BufReader::new(pipe);
  let mut captured = String::new();
  let mut buf = Vec::new();
  loop {
    buf.clear();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
      break;
    }
    let line = String::from_utf8_lossy(&buf);
    if let Some(sink) = sink {
      sink.emit(stream, line.trim_end_matches(['\r', '\n']));
    }
    captured.push_str(&line);
  }
  Ok(captured)
}

fn tidy_args() -> Vec<OsString> {
  vec!["mod".into(), "tidy".into()]
}

/// Arguments for `go build`. Tags and linker flags are omitted when empty.
fn build_args(invocation: &Invocation<'_>) -> Vec<OsString> {
  let mut args: Vec<OsString> = vec![
    "build".into(),
    "-trimpath".into(),
    "-buildvcs=false".into(),
    "-o".into(),
    invocation.output.into(),
  ];
  if !invocation.tags.is_empty() {
    args.push("-tags".into());
    args.push(invocation.tags.join(",").into());
  }
  if !invocation.ldflags.is_empty() {
    args.push("-ldflags".into());
    args.push(invocation.ldflags.join(" ").into());
  }
  args.push(".".into());
  args
}
