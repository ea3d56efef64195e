//! Module resolution and injection.
//!
//! Turns a [`BuildRequest`] into the concrete inputs the toolchain consumes:
//! - `go.mod` requiring the base application, the glue module and every
//!   plugin at its requested version
//! - `main.go` importing the glue module and every plugin for their side
//!   effects, then handing control to the base application
//!
//! Rendering is pure and deterministic: identical module sets always produce
//! identical files, with plugins in request order.

mod templates;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::module::ModuleRef;
use crate::request::BuildRequest;

pub use templates::{GO_MOD_TEMPLATE, MAIN_GO_TEMPLATE};

/// Manifest file name.
pub const MANIFEST_FILE: &str = "go.mod";

/// Entry point file name.
pub const ENTRY_POINT_FILE: &str = "main.go";

/// Module path of the generated main module.
pub const MAIN_MODULE: &str = "pbforge";

/// `go` directive written to the manifest unless overridden.
pub const DEFAULT_GO_VERSION: &str = "1.23";

/// Errors that can occur turning a request into build inputs.
#[derive(Debug, Error)]
pub enum ResolutionError {
  #[error("{role} module is not set")]
  Missing { role: &'static str },

  #[error("malformed module path {module:?}: {reason}")]
  MalformedModule { module: String, reason: &'static str },

  #[error("malformed version {version:?} for {module}")]
  MalformedVersion { module: String, version: String },

  #[error("conflicting versions for {module}: {first} and {second}")]
  ConflictingVersions {
    module: String,
    first: String,
    second: String,
  },

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },
}

/// The modules of one build, deduplicated, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSet {
  pub base: ModuleRef,
  pub glue: ModuleRef,
  pub plugins: Vec<ModuleRef>,
}

impl ModuleSet {
  /// Resolve the module set for a request.
  ///
  /// Identical references collapse to one entry. The same module requested
  /// at two versions is an error.
  pub fn resolve(request: &BuildRequest) -> Result<Self, ResolutionError> {
    let base = request.pocketbase.clone().ok_or(ResolutionError::Missing { role: "base application" })?;
    let glue = request.xpb.clone().ok_or(ResolutionError::Missing { role: "glue" })?;

    let mut seen: HashMap<String, String> = HashMap::new();
    let mut admit = |m: &ModuleRef| -> Result<bool, ResolutionError> {
      check_module_path(&m.module)?;
      check_version(m)?;
      match seen.get(&m.module) {
        Some(version) if *version == m.version => Ok(false),
        Some(version) => Err(ResolutionError::ConflictingVersions {
          module: m.module.clone(),
          first: version.clone(),
          second: m.version.clone(),
        }),
        None => {
          seen.insert(m.module.clone(), m.version.clone());
          Ok(true)
        }
      }
    };

    admit(&base)?;
    admit(&glue)?;

    let mut plugins = Vec::with_capacity(request.plugins.len());
    for plugin in &request.plugins {
      if admit(plugin)? {
        plugins.push(plugin.clone());
      } else {
        debug!(module = %plugin, "skipping duplicate module reference");
      }
    }

    Ok(Self { base, glue, plugins })
  }

  /// Every module in manifest order: base, glue, then plugins.
  pub fn iter(&self) -> impl Iterator<Item = &ModuleRef> {
    [&self.base, &self.glue].into_iter().chain(self.plugins.iter())
  }
}

fn check_module_path(module: &str) -> Result<(), ResolutionError> {
  let reason = if module.is_empty() {
    Some("empty")
  } else if module.starts_with('-') || module.starts_with('/') {
    Some("must not start with '-' or '/'")
  } else if module.ends_with('/') {
    Some("must not end with '/'")
  } else if module.chars().any(|c| c.is_whitespace() || matches!(c, '"' | '`' | '\'' | '@' | '\\')) {
    Some("contains a forbidden character")
  } else {
    None
  };

  match reason {
    Some(reason) => Err(ResolutionError::MalformedModule {
      module: module.to_string(),
      reason,
    }),
    None => Ok(()),
  }
}

fn check_version(m: &ModuleRef) -> Result<(), ResolutionError> {
  if m.version.is_empty() || m.version.chars().any(|c| c.is_whitespace() || matches!(c, '"' | '`' | '\'')) {
    return Err(ResolutionError::MalformedVersion {
      module: m.module.clone(),
      version: m.version.clone(),
    });
  }
  Ok(())
}

/// Generated build inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
  /// Contents of `go.mod`.
  pub manifest: String,
  /// Contents of `main.go`.
  pub entry_point: String,
}

impl Sources {
  /// Render the manifest and entry point for a module set.
  pub fn render(modules: &ModuleSet, go_version: &str) -> Self {
    let requires: String = modules.iter().map(|m| format!("\t{} {}\n", m.module, m.version)).collect();
    let manifest = GO_MOD_TEMPLATE
      .replace("{module}", MAIN_MODULE)
      .replace("{go_version}", go_version)
      .replace("{requires}", &requires);

    let imports: String = std::iter::once(&modules.glue)
      .chain(modules.plugins.iter())
      .map(|m| format!("\t_ \"{}\"\n", m.module))
      .collect();
    let entry_point = MAIN_GO_TEMPLATE
      .replace("{base}", &modules.base.module)
      .replace("{imports}", &imports);

    Self { manifest, entry_point }
  }
}

/// Paths of the files written into a workspace.
#[derive(Debug, Clone)]
pub struct Injected {
  pub manifest: PathBuf,
  pub entry_point: PathBuf,
}

/// Write the rendered inputs into the workspace root, replacing any previous
/// generation.
pub async fn inject(workspace: &Path, sources: &Sources) -> Result<Injected, ResolutionError> {
  let manifest = workspace.join(MANIFEST_FILE);
  let entry_point = workspace.join(ENTRY_POINT_FILE);

  write(&manifest, &sources.manifest).await?;
  write(&entry_point, &sources.entry_point).await?;

  debug!(workspace = %workspace.display(), "wrote manifest and entry point");
  Ok(Injected { manifest, entry_point })
}

async fn write(path: &Path, content: &str) -> Result<(), ResolutionError> {
  fs::write(path, content).await.map_err(|source| ResolutionError::Write {
    path: path.to_path_buf(),
    source,
  })
}
