use anyhow::Result;
use serde::Serialize;

use pbforge_lib::GoToolchain;
use pbforge_lib::platform::host_pair;
use pbforge_lib::toolchain::PROGRAM_ENV;

use super::build::TIMEOUT_ENV;
use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Serialize)]
struct Info {
  version: &'static str,
  platform: Option<String>,
  toolchain: String,
  go_version: String,
  timeout: Option<String>,
}

pub fn cmd_info(format: OutputFormat) -> Result<()> {
  let toolchain = GoToolchain::from_env();
  let info = Info {
    version: env!("CARGO_PKG_VERSION"),
    platform: host_pair(),
    toolchain: toolchain.program.display().to_string(),
    go_version: toolchain.go_version.clone(),
    timeout: std::env::var(TIMEOUT_ENV).ok().filter(|v| !v.trim().is_empty()),
  };

  if format.is_json() {
    print_json(&info)?;
    return Ok(());
  }

  println!("pbforge v{}", info.version);
  match &info.platform {
    Some(pair) => print_stat("Platform", pair),
    None => print_stat("Platform", "unsupported host"),
  }
  print_stat("Toolchain", &format!("{} (override with {})", info.toolchain, PROGRAM_ENV));
  print_stat("Go directive", &info.go_version);
  if let Some(timeout) = &info.timeout {
    print_stat("Timeout", timeout);
  }

  Ok(())
}
