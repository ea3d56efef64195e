//! Build requests.
//!
//! A [`BuildRequest`] describes one custom binary: the target platform, the
//! toolchain parameters, and the modules to compile in. Requests deserialize
//! from JSON using the same field names they serialize to, so a request
//! written by one caller can be replayed by another.

mod validate;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::module::ModuleRef;
use crate::platform::{Arch, Os, Platform};

pub use validate::{FieldError, ValidationError, validate};

/// Errors that can occur loading a request from disk.
#[derive(Debug, Error)]
pub enum RequestError {
  #[error("failed to read request {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse request {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },
}

/// What to build and for which platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
  /// Target `GOARCH`.
  #[serde(default)]
  pub arch: String,

  /// Target `GOOS`.
  #[serde(default)]
  pub os: String,

  /// Build tags, passed to the toolchain comma-joined.
  #[serde(default, deserialize_with = "null_as_empty")]
  pub tags: Vec<String>,

  /// Linker flags, passed to the toolchain space-joined.
  #[serde(default, deserialize_with = "null_as_empty")]
  pub ldflags: Vec<String>,

  /// Plugin modules, imported in this order.
  #[serde(default, deserialize_with = "skip_null_entries")]
  pub plugins: Vec<ModuleRef>,

  /// Base application module. `None` only if a caller explicitly cleared it,
  /// which validation rejects.
  #[serde(default = "default_pocketbase")]
  pub pocketbase: Option<ModuleRef>,

  /// Glue module. Same rules as `pocketbase`.
  #[serde(default = "default_xpb")]
  pub xpb: Option<ModuleRef>,
}

fn default_pocketbase() -> Option<ModuleRef> {
  Some(ModuleRef::pocketbase())
}

fn default_xpb() -> Option<ModuleRef> {
  Some(ModuleRef::xpb())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn skip_null_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  let entries = Option::<Vec<Option<T>>>::deserialize(deserializer)?.unwrap_or_default();
  Ok(entries.into_iter().flatten().collect())
}

impl Default for BuildRequest {
  fn default() -> Self {
    Self {
      arch: String::new(),
      os: String::new(),
      tags: Vec::new(),
      ldflags: Vec::new(),
      plugins: Vec::new(),
      pocketbase: default_pocketbase(),
      xpb: default_xpb(),
    }
  }
}

impl BuildRequest {
  /// A request for `os`/`arch` with default base and glue modules.
  pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
    Self {
      os: os.into(),
      arch: arch.into(),
      ..Self::default()
    }
  }

  /// A request for an already-parsed platform.
  pub fn for_platform(platform: Platform) -> Self {
    Self::new(platform.os.as_str(), platform.arch.as_str())
  }

  /// Load a request from a JSON file.
  pub fn from_json_file(path: &Path) -> Result<Self, RequestError> {
    let content = std::fs::read_to_string(path).map_err(|source| RequestError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| RequestError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
    self.tags.push(tag.into());
    self
  }

  pub fn with_ldflag(mut self, flag: impl Into<String>) -> Self {
    self.ldflags.push(flag.into());
    self
  }

  pub fn with_plugin(mut self, plugin: ModuleRef) -> Self {
    self.plugins.push(plugin);
    self
  }

  pub fn with_pocketbase(mut self, module: ModuleRef) -> Self {
    self.pocketbase = Some(module);
    self
  }

  pub fn with_xpb(mut self, module: ModuleRef) -> Self {
    self.xpb = Some(module);
    self
  }

  /// The parsed target platform, if both fields name supported values.
  pub fn platform(&self) -> Option<Platform> {
    Some(Platform::new(self.os.parse::<Os>().ok()?, self.arch.parse::<Arch>().ok()?))
  }

  /// Run field validation, returning the parsed target platform.
  pub fn validate(&self) -> Result<Platform, ValidationError> {
    validate(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::module::{POCKETBASE_MODULE, XPB_MODULE};
  use tempfile::TempDir;

  #[test]
  fn new_supplies_default_modules() {
    let request = BuildRequest::new("linux", "amd64");
    assert_eq!(request.pocketbase, Some(ModuleRef::pocketbase()));
    assert_eq!(request.xpb, Some(ModuleRef::xpb()));
    assert!(request.plugins.is_empty());
  }

  #[test]
  fn deserialize_applies_defaults_for_missing_fields() {
    let request: BuildRequest = serde_json::from_str(r#"{"arch":"amd64","os":"linux"}"#).unwrap();
    assert_eq!(request, BuildRequest::new("linux", "amd64"));
  }

  #[test]
  fn deserialize_keeps_explicit_null_modules_absent() {
    let request: BuildRequest = serde_json::from_str(r#"{"arch":"amd64","os":"linux","xpb":null}"#).unwrap();
    assert_eq!(request.xpb, None);
    assert_eq!(request.pocketbase.as_ref().map(|m| m.module.as_str()), Some(POCKETBASE_MODULE));
  }

  #[test]
  fn deserialize_skips_null_plugins_and_null_lists() {
    let request: BuildRequest = serde_json::from_str(
      r#"{
        "arch": "arm64",
        "os": "darwin",
        "tags": null,
        "ldflags": ["-s", "-w"],
        "plugins": [null, {"module": "example.org/plugin", "version": "v1.0.0"}, null]
      }"#,
    )
    .unwrap();
    assert!(request.tags.is_empty());
    assert_eq!(request.ldflags, vec!["-s", "-w"]);
    assert_eq!(request.plugins, vec![ModuleRef::new("example.org/plugin", "v1.0.0")]);
  }

  #[test]
  fn serialized_request_reloads_identically() {
    let request = BuildRequest::new("windows", "amd64")
      .with_tag("sqlite_fts5")
      .with_ldflag("-s")
      .with_plugin(ModuleRef::new("example.org/plugin", "v1.0.0"))
      .with_xpb(ModuleRef::new(XPB_MODULE, "v0.2.0"));

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("request.json");
    std::fs::write(&path, serde_json::to_string_pretty(&request).unwrap()).unwrap();

    assert_eq!(BuildRequest::from_json_file(&path).unwrap(), request);
  }

  #[test]
  fn from_json_file_reports_path_on_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing.json");
    let err = BuildRequest::from_json_file(&missing).unwrap_err();
    assert!(matches!(err, RequestError::Read { .. }));
    assert!(err.to_string().contains("missing.json"));

    let broken = temp.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(BuildRequest::from_json_file(&broken), Err(RequestError::Parse { .. })));
  }

  #[test]
  fn platform_parses_valid_pairs_only() {
    assert_eq!(
      BuildRequest::new("linux", "amd64").platform(),
      Some(Platform::new(Os::Linux, Arch::Amd64))
    );
    assert_eq!(BuildRequest::new("linux", "bogus").platform(), None);
  }
}
