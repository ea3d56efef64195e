//! The compiled binary as a readable stream.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};
use tracing::warn;

use crate::error::BuildError;
use crate::util::hash::ContentHash;
use crate::workspace::{Workspace, WorkspaceError};

/// Binary name inside the workspace, before the OS suffix.
pub const ARTIFACT_NAME: &str = "pocketbase";

/// Reads the compiled binary out of its workspace.
///
/// The stream owns the workspace. [`close`](Self::close) releases it and
/// reports failures; dropping the stream releases it on a best-effort basis,
/// whether or not it was read to the end.
#[derive(Debug)]
pub struct ArtifactStream {
  file: Option<File>,
  path: PathBuf,
  len: u64,
  workspace: Option<Workspace>,
}

impl ArtifactStream {
  /// Open the artifact at `path`, taking ownership of `workspace`.
  ///
  /// If the artifact cannot be opened the workspace is released before the
  /// error is returned.
  pub(crate) async fn open(path: PathBuf, workspace: Workspace) -> Result<Self, BuildError> {
    let opened = async {
      let file = File::open(&path).await?;
      let len = file.metadata().await?.len();
      Ok::<_, io::Error>((file, len))
    }
    .await;

    match opened {
      Ok((file, len)) => Ok(Self {
        file: Some(file),
        path,
        len,
        workspace: Some(workspace),
      }),
      Err(source) => {
        release_quietly(workspace);
        Err(BuildError::Artifact { path, source })
      }
    }
  }

  /// Location of the binary inside the workspace.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Size of the binary in bytes.
  pub fn len(&self) -> u64 {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Close the stream and release its workspace.
  pub async fn close(mut self) -> Result<(), WorkspaceError> {
    match self.shutdown() {
      Some(workspace) => workspace.release(),
      None => Ok(()),
    }
  }

  /// Close the file and hand back the workspace holding it. The file must
  /// be closed first or the directory cannot be removed on Windows.
  fn shutdown(&mut self) -> Option<Workspace> {
    drop(self.file.take());
    self.workspace.take()
  }
}

impl AsyncRead for ArtifactStream {
  fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
    match self.get_mut().file.as_mut() {
      Some(file) => Pin::new(file).poll_read(cx, buf),
      None => Poll::Ready(Ok(())),
    }
  }
}

impl Drop for ArtifactStream {
  fn drop(&mut self) {
    if let Some(workspace) = self.shutdown() {
      release_quietly(workspace);
    }
  }
}

/// Release a workspace on an error path, logging instead of failing.
pub(crate) fn release_quietly(workspace: Workspace) {
  let path = workspace.path().to_path_buf();
  if let Err(e) = workspace.release() {
    warn!(path = %path.display(), error = %e, "failed to release workspace");
  }
}

/// Where a build was written and what it contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutput {
  pub path: PathBuf,
  pub size: u64,
  pub sha256: ContentHash,
}
