//! Top-level build error.

use std::path::PathBuf;

use thiserror::Error;

use crate::inject::ResolutionError;
use crate::request::ValidationError;
use crate::toolchain::ToolchainError;
use crate::workspace::WorkspaceError;

/// Errors returned by [`Builder`](crate::builder::Builder) operations.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The request was rejected before any side effect.
  #[error("invalid build request: {0}")]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Workspace(#[from] WorkspaceError),

  #[error("module resolution failed: {0}")]
  Resolution(#[from] ResolutionError),

  /// The compiler failed; the message carries its diagnostics.
  #[error("toolchain failed: {0}")]
  Toolchain(#[from] ToolchainError),

  #[error("failed to open artifact {}: {source}", path.display())]
  Artifact { path: PathBuf, source: std::io::Error },

  #[error("failed to write {}: {source}", path.display())]
  Destination { path: PathBuf, source: std::io::Error },

  #[error("failed to determine working directory: {0}")]
  CurrentDir(#[source] std::io::Error),
}

impl BuildError {
  /// Whether this is an I/O failure opening the artifact, writing the
  /// destination, or reading the working directory.
  pub fn is_io(&self) -> bool {
    matches!(self, Self::Artifact { .. } | Self::Destination { .. } | Self::CurrentDir(_))
  }
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;
