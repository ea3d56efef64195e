mod build;
mod info;
mod platforms;
mod render;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Args;
use pbforge_lib::platform::{Arch, Os};
use pbforge_lib::{BuildRequest, ModuleRef};

pub use build::cmd_build;
pub use info::cmd_info;
pub use platforms::cmd_platforms;
pub use render::cmd_render;

/// Flags describing what to build. Values given here override those loaded
/// with `--request`; lists are appended.
#[derive(Args, Debug, Default)]
pub struct RequestArgs {
  /// Load the request from a JSON file
  #[arg(long, value_name = "FILE")]
  pub request: Option<PathBuf>,

  /// Target architecture (GOARCH, default: host)
  #[arg(long)]
  pub arch: Option<String>,

  /// Target operating system (GOOS, default: host)
  #[arg(long)]
  pub os: Option<String>,

  /// Build tag (repeatable)
  #[arg(long = "tag", value_name = "TAG")]
  pub tags: Vec<String>,

  /// Linker flag (repeatable)
  #[arg(long = "ldflag", value_name = "FLAG", allow_hyphen_values = true)]
  pub ldflags: Vec<String>,

  /// Plugin module to compile in (repeatable)
  #[arg(long = "with", value_name = "MODULE[@VERSION]", value_parser = parse_module)]
  pub plugins: Vec<ModuleRef>,

  /// PocketBase version, or a replacement module as MODULE@VERSION
  #[arg(long, value_name = "VERSION")]
  pub pocketbase: Option<String>,

  /// xpb version, or a replacement module as MODULE@VERSION
  #[arg(long, value_name = "VERSION")]
  pub xpb: Option<String>,
}

impl RequestArgs {
  /// Combine the request file, the flags and host defaults into one request.
  pub fn resolve(self) -> Result<BuildRequest> {
    let mut request = match &self.request {
      Some(path) => BuildRequest::from_json_file(path)?,
      None => BuildRequest::default(),
    };

    if let Some(arch) = self.arch {
      request.arch = arch;
    } else if request.arch.is_empty()
      && let Some(host) = Arch::current()
    {
      request.arch = host.to_string();
    }

    if let Some(os) = self.os {
      request.os = os;
    } else if request.os.is_empty()
      && let Some(host) = Os::current()
    {
      request.os = host.to_string();
    }

    request.tags.extend(self.tags);
    request.ldflags.extend(self.ldflags);
    request.plugins.extend(self.plugins);

    if let Some(value) = self.pocketbase {
      let current = request.pocketbase.take().unwrap_or_else(ModuleRef::pocketbase);
      request.pocketbase = Some(override_module(current, &value));
    }
    if let Some(value) = self.xpb {
      let current = request.xpb.take().unwrap_or_else(ModuleRef::xpb);
      request.xpb = Some(override_module(current, &value));
    }

    Ok(request)
  }
}

/// A bare version keeps the module path; `module@version` replaces both.
fn override_module(current: ModuleRef, value: &str) -> ModuleRef {
  if value.contains('@') {
    let Ok(replacement) = ModuleRef::from_str(value);
    replacement
  } else {
    current.at(value)
  }
}

fn parse_module(value: &str) -> Result<ModuleRef, String> {
  let Ok(module) = ModuleRef::from_str(value);
  if module.module.trim().is_empty() {
    return Err(format!("'{value}' does not name a module"));
  }
  Ok(module)
}

/// Parse a `PBFORGE_TIMEOUT`-style duration.
fn parse_timeout(value: &str) -> Result<std::time::Duration> {
  humantime::parse_duration(value.trim()).with_context(|| format!("invalid timeout '{value}'"))
}
