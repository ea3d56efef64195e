//! Test utilities for pbforge-lib.
//!
//! Toolchain behavior is exercised against small shell scripts standing in
//! for `go`. Each script appends its arguments and target environment to
//! `invocations.log` next to itself, so tests can assert on exactly what was
//! run. A fake that hangs records its PID in `go.pid`.

use std::path::{Path, PathBuf};

/// Log file each fake toolchain appends to.
pub const INVOCATION_LOG: &str = "invocations.log";

/// PID file written by the hanging fake.
pub const PID_FILE: &str = "go.pid";

/// Script body shared by every fake: log the call, then dispatch on the
/// subcommand. `{tidy}` and `{build}` are replaced with the bodies of the
/// `mod` and `build` branches.
#[cfg(unix)]
const FAKE_GO: &str = r#"#!/bin/sh
dir=$(dirname "$0")
echo "$GOOS/$GOARCH CGO_ENABLED=$CGO_ENABLED $*" >> "$dir/invocations.log"
case "$1" in
  mod)
{tidy}
    ;;
  build)
    out=""
    prev=""
    for arg in "$@"; do
      if [ "$prev" = "-o" ]; then out="$arg"; fi
      prev="$arg"
    done
{build}
    ;;
esac
echo "unknown command $1" >&2
exit 2
"#;

#[cfg(unix)]
const TIDY_OK: &str = r#"    exit 0"#;

/// Fails like an unresolvable module version.
#[cfg(unix)]
const TIDY_FAIL: &str = r#"    echo "go: example.org/plugin@v9.9.9: invalid version: unknown revision v9.9.9" >&2
    exit 1"#;

/// Writes a binary stamped with the target platform.
#[cfg(unix)]
const BUILD_OK: &str = r#"    printf 'ELF %s/%s\n' "$GOOS" "$GOARCH" > "$out"
    exit 0"#;

/// Fails like a compile error, leaving a partial output behind.
#[cfg(unix)]
const BUILD_FAIL: &str = r#"    printf 'partial' > "$out"
    echo "main.go:12: undefined symbol: plugin.Register" >&2
    echo "building pbforge"
    exit 1"#;

/// Fails after leaving a non-empty directory where the binary belongs, so
/// the partial output cannot be removed with `remove_file`.
#[cfg(unix)]
const BUILD_FAIL_STUCK: &str = r#"    mkdir -p "$out/obj"
    echo "link: cannot write $out" >&2
    exit 1"#;

/// Never finishes. `exec` keeps the recorded PID for the sleeping process.
#[cfg(unix)]
const BUILD_HANG: &str = r#"    echo $$ > "$dir/go.pid"
    exec sleep 30"#;

/// Reports success without writing anything.
#[cfg(unix)]
const BUILD_NO_OUTPUT: &str = r#"    exit 0"#;

/// Kinds of fake toolchain.
#[derive(Debug, Clone, Copy)]
pub enum FakeGo {
  Ok,
  Fail,
  Hang,
  NoOutput,
  TidyFail,
  FailStuck,
}

/// Write a fake `go` script into `dir` and return its path.
#[cfg(unix)]
pub fn fake_go(dir: &Path, kind: FakeGo) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let (tidy, build) = match kind {
    FakeGo::Ok => (TIDY_OK, BUILD_OK),
    FakeGo::Fail => (TIDY_OK, BUILD_FAIL),
    FakeGo::Hang => (TIDY_OK, BUILD_HANG),
    FakeGo::NoOutput => (TIDY_OK, BUILD_NO_OUTPUT),
    FakeGo::TidyFail => (TIDY_FAIL, BUILD_OK),
    FakeGo::FailStuck => (TIDY_OK, BUILD_FAIL_STUCK),
  };
  let path = dir.join("go");
  std::fs::write(&path, FAKE_GO.replace("{tidy}", tidy).replace("{build}", build)).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// Lines logged by the fake toolchain in `dir`.
pub fn invocations(dir: &Path) -> Vec<String> {
  std::fs::read_to_string(dir.join(INVOCATION_LOG))
    .unwrap_or_default()
    .lines()
    .map(str::to_string)
    .collect()
}

/// PID recorded by the hanging fake in `dir`, waiting up to five seconds for
/// it to appear.
pub fn recorded_pid(dir: &Path) -> u32 {
  let path = dir.join(PID_FILE);
  for _ in 0..50 {
    if let Some(pid) = std::fs::read_to_string(&path).ok().and_then(|s| s.trim().parse().ok()) {
      return pid;
    }
    std::thread::sleep(std::time::Duration::from_millis(100));
  }
  panic!("no pid recorded in {}", path.display());
}

/// Whether `pid` has exited, waiting up to five seconds. A zombie awaiting
/// reaping counts as exited.
#[cfg(unix)]
pub fn process_exited(pid: u32) -> bool {
  for _ in 0..50 {
    let ps = std::process::Command::new("ps")
      .args(["-o", "stat=", "-p", &pid.to_string()])
      .output()
      .unwrap();
    let stat = String::from_utf8_lossy(&ps.stdout);
    let stat = stat.trim();
    if stat.is_empty() || stat.starts_with('Z') {
      return true;
    }
    std::thread::sleep(std::time::Duration::from_millis(100));
  }
  false
}

/// Number of entries directly inside `dir`.
pub fn entry_count(dir: &Path) -> usize {
  std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
