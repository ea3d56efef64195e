//! Implementation of the `pbforge render` command.

use anyhow::Result;

use pbforge_lib::inject::{DEFAULT_GO_VERSION, ENTRY_POINT_FILE, MANIFEST_FILE, ModuleSet, Sources};

use super::RequestArgs;

/// Print the generated sources for a request.
///
/// Nothing is written to disk and the toolchain is not run, so this works on
/// machines without Go installed.
pub fn cmd_render(args: RequestArgs) -> Result<()> {
  let request = args.resolve()?;
  request.validate()?;

  let modules = ModuleSet::resolve(&request)?;
  let sources = Sources::render(&modules, DEFAULT_GO_VERSION);

  println!("// {}", MANIFEST_FILE);
  print!("{}", sources.manifest);
  println!();
  println!("// {}", ENTRY_POINT_FILE);
  print!("{}", sources.entry_point);

  Ok(())
}
