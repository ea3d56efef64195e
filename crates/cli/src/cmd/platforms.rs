use anyhow::Result;
use serde::Serialize;

use pbforge_lib::platform::{Arch, Os};

use crate::output::{OutputFormat, print_json};

#[derive(Serialize)]
struct Platforms {
  arch: Vec<&'static str>,
  os: Vec<&'static str>,
}

pub fn cmd_platforms(format: OutputFormat) -> Result<()> {
  let platforms = Platforms {
    arch: Arch::ALL.iter().map(Arch::as_str).collect(),
    os: Os::ALL.iter().map(Os::as_str).collect(),
  };

  if format.is_json() {
    print_json(&platforms)?;
  } else {
    println!("Architectures:");
    for arch in &platforms.arch {
      println!("  {}", arch);
    }
    println!();
    println!("Operating systems:");
    for os in &platforms.os {
      println!("  {}", os);
    }
  }

  Ok(())
}
