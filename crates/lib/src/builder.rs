//! Build orchestration.
//!
//! A [`Builder`] owns a validated request and the workspace acquired for it.
//! [`Builder::build`] runs the stages strictly in order:
//! - Resolve the module set and write `go.mod`/`main.go` into the workspace
//! - Run the toolchain for the target platform
//! - Hand the binary back as an [`ArtifactStream`] that owns the workspace
//!
//! The workspace is released on every exit path. On success that happens
//! when the stream is closed or dropped; on failure before the error is
//! returned; on cancellation (the future is dropped) when the workspace
//! itself drops, after the toolchain subprocess has been killed.
//!
//! Each `build()` consumes the workspace. Calling it again acquires a fresh
//! one, or re-populates the caller's directory if one was provided.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tracing::info;

use crate::artifact::{ARTIFACT_NAME, ArtifactStream, BuildOutput, release_quietly};
use crate::error::BuildError;
use crate::inject::{self, ModuleSet, Sources};
use crate::platform::{Os, Platform};
use crate::request::BuildRequest;
use crate::toolchain::{GoToolchain, Invocation, OutputSink};
use crate::util::hash::{ContentHash, copy_hashed};
use crate::workspace::{Workspace, WorkspaceError};

/// Permission bits for written binaries.
#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

/// Construction-time options.
#[derive(Debug, Clone, Default)]
pub struct BuilderOptions {
  /// Caller-provided workspace. Never removed by the builder.
  pub dir: Option<PathBuf>,
  /// Parent for system-created workspaces; the system temp directory when unset.
  pub temp_root: Option<PathBuf>,
  pub toolchain: GoToolchain,
  /// Receives toolchain output while it runs. Without one, output is only
  /// captured.
  pub output: Option<OutputSink>,
}

impl BuilderOptions {
  pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.dir = Some(dir.into());
    self
  }

  pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
    self.temp_root = Some(root.into());
    self
  }

  pub fn with_toolchain(mut self, toolchain: GoToolchain) -> Self {
    self.toolchain = toolchain;
    self
  }

  pub fn with_output(mut self, sink: OutputSink) -> Self {
    self.output = Some(sink);
    self
  }

  fn acquire(&self) -> Result<Workspace, WorkspaceError> {
    Workspace::acquire(self.dir.as_deref(), self.temp_root.as_deref())
  }
}

/// Produces custom binaries for one request.
#[derive(Debug)]
pub struct Builder {
  request: BuildRequest,
  platform: Platform,
  options: BuilderOptions,
  workspace: Option<Workspace>,
}

/// File name of the binary for a target OS.
pub fn artifact_file_name(os: Os) -> String {
  format!("{}{}", ARTIFACT_NAME, os.exe_suffix())
}

impl Builder {
  /// Validate `request` and acquire a system-created workspace.
  pub fn new(request: BuildRequest) -> Result<Self, BuildError> {
    Self::with_options(request, BuilderOptions::default())
  }

  /// Validate `request` and acquire its workspace.
  ///
  /// Validation runs first; a rejected request never creates a directory.
  pub fn with_options(request: BuildRequest, options: BuilderOptions) -> Result<Self, BuildError> {
    let platform = request.validate()?;
    let workspace = options.acquire()?;

    info!(
      platform = %platform,
      plugins = request.plugins.len(),
      workspace = %workspace.path().display(),
      "builder ready"
    );

    Ok(Self {
      request,
      platform,
      options,
      workspace: Some(workspace),
    })
  }

  pub fn request(&self) -> &BuildRequest {
    &self.request
  }

  pub fn platform(&self) -> Platform {
    self.platform
  }

  /// The workspace the next `build()` will use, if already acquired.
  pub fn workspace_path(&self) -> Option<&Path> {
    self.workspace.as_ref().map(Workspace::path)
  }

  /// The manifest and entry point this builder generates.
  pub fn render(&self) -> Result<Sources, BuildError> {
    let modules = ModuleSet::resolve(&self.request)?;
    Ok(Sources::render(&modules, &self.options.toolchain.go_version))
  }

  /// Build the binary and return a stream over it.
  pub async fn build(&mut self) -> Result<ArtifactStream, BuildError> {
    let workspace = match self.workspace.take() {
      Some(workspace) => workspace,
      None => self.options.acquire()?,
    };

    match self.compile(workspace.path()).await {
      Ok(artifact) => ArtifactStream::open(artifact, workspace).await,
      Err(e) => {
        release_quietly(workspace);
        Err(e)
      }
    }
  }

  async fn compile(&self, root: &Path) -> Result<PathBuf, BuildError> {
    let sources = self.render()?;
    inject::inject(root, &sources).await?;

    let output = root.join(artifact_file_name(self.platform.os));
    let invocation = Invocation {
      workspace: root,
      platform: self.platform,
      tags: &self.request.tags,
      ldflags: &self.request.ldflags,
      output: &output,
      sink: self.options.output.as_ref(),
    };
    self.options.toolchain.build(&invocation).await?;

    info!(path = %output.display(), "build complete");
    Ok(output)
  }

  /// Build and write the binary to an absolute path, truncating any existing
  /// file there.
  pub async fn build_to_absolute_filepath(&mut self, path: impl AsRef<Path>) -> Result<BuildOutput, BuildError> {
    let path = path.as_ref();
    if !path.is_absolute() {
      return Err(BuildError::Destination {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "destination path is not absolute"),
      });
    }

    let mut stream = self.build().await?;
    let written = write_executable(&mut stream, path).await;
    let closed = stream.close().await;

    let (size, sha256) = written?;
    closed?;

    info!(path = %path.display(), size, sha256 = %sha256, "wrote binary");
    Ok(BuildOutput {
      path: path.to_path_buf(),
      size,
      sha256,
    })
  }

  /// Build and write the binary to `path` resolved against the current
  /// working directory.
  pub async fn build_to_relative_filepath(&mut self, path: impl AsRef<Path>) -> Result<BuildOutput, BuildError> {
    let cwd = std::env::current_dir().map_err(BuildError::CurrentDir)?;
    self.build_to_absolute_filepath(cwd.join(path)).await
  }

  /// Release the workspace if `build()` has not taken it.
  pub fn close(mut self) -> Result<(), WorkspaceError> {
    match self.workspace.take() {
      Some(workspace) => workspace.release(),
      None => Ok(()),
    }
  }
}

async fn write_executable(stream: &mut ArtifactStream, path: &Path) -> Result<(u64, ContentHash), BuildError> {
  let dest_err = |source: std::io::Error| BuildError::Destination {
    path: path.to_path_buf(),
    source,
  };

  let mut options = OpenOptions::new();
  options.write(true).create(true).truncate(true);
  #[cfg(unix)]
  options.mode(EXECUTABLE_MODE);

  let mut file = options.open(path).await.map_err(dest_err)?;
  let copied = copy_hashed(stream, &mut file).await.map_err(dest_err)?;

  // The mode above only applies to newly created files
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(EXECUTABLE_MODE))
      .await
      .map_err(dest_err)?;
  }

  Ok(copied)
}
