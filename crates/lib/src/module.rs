//! Module references.
//!
//! A [`ModuleRef`] names a Go module and the version to pin it at. The
//! well-known base application and glue modules are exposed as constructors
//! so request defaults are plain values rather than process-wide state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Module path of the base application.
pub const POCKETBASE_MODULE: &str = "github.com/pocketbase/pocketbase";

/// Module path of the glue module that wires plugins into the base application.
pub const XPB_MODULE: &str = "github.com/pocketbuilds/xpb";

/// Version query the toolchain resolves to the newest available release.
pub const LATEST: &str = "latest";

/// A module identity pinned at a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleRef {
  /// Module path, e.g. `github.com/pocketbase/pocketbase`.
  pub module: String,
  /// Version specifier; `latest` when unset.
  #[serde(default = "default_version", deserialize_with = "deserialize_version")]
  pub version: String,
}

fn default_version() -> String {
  LATEST.to_string()
}

fn deserialize_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let version = Option::<String>::deserialize(deserializer)?;
  Ok(normalize_version(version.as_deref().unwrap_or_default()))
}

/// Blank versions mean `latest`.
fn normalize_version(version: &str) -> String {
  let version = version.trim();
  if version.is_empty() {
    default_version()
  } else {
    version.to_string()
  }
}

impl ModuleRef {
  /// Create a reference, treating a blank version as `latest`.
  pub fn new(module: impl Into<String>, version: impl AsRef<str>) -> Self {
    Self {
      module: module.into(),
      version: normalize_version(version.as_ref()),
    }
  }

  /// Reference to `module` at `latest`.
  pub fn latest(module: impl Into<String>) -> Self {
    Self::new(module, LATEST)
  }

  /// The default base application module.
  pub fn pocketbase() -> Self {
    Self::latest(POCKETBASE_MODULE)
  }

  /// The default glue module.
  pub fn xpb() -> Self {
    Self::latest(XPB_MODULE)
  }

  /// Same module at a different version.
  pub fn at(&self, version: impl AsRef<str>) -> Self {
    Self::new(self.module.clone(), version)
  }

  pub fn is_latest(&self) -> bool {
    self.version == LATEST
  }
}

impl fmt::Display for ModuleRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.module, self.version)
  }
}

impl FromStr for ModuleRef {
  type Err = std::convert::Infallible;

  /// Parses `module` or `module@version`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    Ok(match s.rsplit_once('@') {
      Some((module, version)) => Self::new(module, version),
      None => Self::latest(s),
    })
  }
}
