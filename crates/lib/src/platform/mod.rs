//! Target platform identifiers.
//!
//! The supported sets mirror the `GOOS`/`GOARCH` pairs the Go toolchain
//! accepts. [`is_arch`] and [`is_os`] are the predicates request validation
//! runs before any workspace or toolchain activity.

pub mod arch;
pub mod os;

use std::fmt;

pub use arch::{Arch, UnknownArch, is_arch};
pub use os::{Os, UnknownOs, is_os};

/// Platform identifier combining OS and architecture (e.g., "linux/amd64")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub os: Os,
  pub arch: Arch,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      os: Os::current()?,
      arch: Arch::current()?,
    })
  }

  /// Returns the `os/arch` pair in toolchain notation (e.g., "linux/amd64")
  pub fn pair(&self) -> String {
    format!("{}/{}", self.os, self.arch)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.pair())
  }
}

/// Returns the platform pair for the current system (e.g., "darwin/arm64")
///
/// Returns `None` if the current platform is not supported
pub fn host_pair() -> Option<String> {
  Platform::current().map(|p| p.pair())
}
