//! Ephemeral build workspaces.
//!
//! A [`Workspace`] is the build root holding the generated manifest, entry
//! point and compiled artifact for one build. Directories created here are
//! removed on [`Workspace::release`] (or when dropped); directories supplied by
//! the caller are never removed.
//!
//! Two builders must not share a caller-provided directory. Nothing guards
//! against it.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;

/// Prefix for system-created workspace directories.
pub const WORKSPACE_PREFIX: &str = "pocketbase";

/// Errors that can occur acquiring or releasing a workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
  #[error("failed to create workspace in {}: {source}", parent.display())]
  Create { parent: PathBuf, source: std::io::Error },

  #[error("failed to prepare workspace {}: {source}", path.display())]
  Prepare { path: PathBuf, source: std::io::Error },

  #[error("failed to remove workspace {}: {source}", path.display())]
  Remove { path: PathBuf, source: std::io::Error },
}

/// The build root for one build session.
#[derive(Debug)]
pub enum Workspace {
  /// Created by us; removed on release.
  Created(TempDir),
  /// Supplied by the caller; left in place on release.
  Provided(PathBuf),
}

impl Workspace {
  /// Acquire a workspace.
  ///
  /// With `dir`, the caller's directory is used (and created if missing),
  /// resolved to an absolute path.
  /// Otherwise a uniquely named directory is created under `temp_root`, or
  /// the system temp directory when that is `None`.
  pub fn acquire(dir: Option<&Path>, temp_root: Option<&Path>) -> Result<Self, WorkspaceError> {
    if let Some(dir) = dir {
      let prepare_err = |source: std::io::Error| WorkspaceError::Prepare {
        path: dir.to_path_buf(),
        source,
      };
      std::fs::create_dir_all(dir).map_err(prepare_err)?;
      // The toolchain runs inside the workspace, so paths under it must not
      // depend on our own working directory
      let dir = dunce::canonicalize(dir).map_err(prepare_err)?;
      debug!(path = %dir.display(), "using caller-provided workspace");
      return Ok(Self::Provided(dir));
    }

    let parent = temp_root.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
    let temp = tempfile::Builder::new()
      .prefix(WORKSPACE_PREFIX)
      .tempdir_in(&parent)
      .map_err(|source| WorkspaceError::Create { parent, source })?;

    debug!(path = %temp.path().display(), "created workspace");
    Ok(Self::Created(temp))
  }

  /// The workspace root.
  pub fn path(&self) -> &Path {
    match self {
      Self::Created(temp) => temp.path(),
      Self::Provided(path) => path,
    }
  }

  /// Whether release removes the directory.
  pub fn is_system_created(&self) -> bool {
    matches!(self, Self::Created(_))
  }

  /// End the build session, removing the directory if we created it.
  pub fn release(self) -> Result<(), WorkspaceError> {
    match self {
      Self::Created(temp) => {
        let path = temp.path().to_path_buf();
        temp.close().map_err(|source| WorkspaceError::Remove { path: path.clone(), source })?;
        debug!(path = %path.display(), "removed workspace");
        Ok(())
      }
      Self::Provided(path) => {
        debug!(path = %path.display(), "leaving caller-provided workspace in place");
        Ok(())
      }
    }
  }
}
