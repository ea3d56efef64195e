//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Stand-in for `go`: `mod tidy` succeeds, `build` runs the given body with
/// `$out` set to the `-o` argument.
const FAKE_GO: &str = r#"#!/bin/sh
case "$1" in
  mod)
    exit 0
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
exit 2
"#;

pub const BUILD_OK: &str = r#"    printf 'ELF %s/%s\n' "$GOOS" "$GOARCH" > "$out"
    exit 0"#;

/// Succeeds, reporting progress on stderr the way `go build -x` would.
pub const BUILD_CHATTY: &str = r#"    echo "go: downloading example.org/plugin v1.0.0" >&2
    printf 'ELF %s/%s\n' "$GOOS" "$GOARCH" > "$out"
    exit 0"#;

pub const BUILD_FAIL: &str = r#"    echo "main.go:7: undefined symbol: plugin.Register" >&2
    exit 1"#;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the fake toolchain, the
/// temp root builds are created under, and the output directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create an environment whose toolchain runs `build_body` for `go build`.
  pub fn with_toolchain(build_body: &str) -> Self {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let go = temp.path().join("go");
    std::fs::write(&go, FAKE_GO.replace("{build}", build_body)).unwrap();
    std::fs::set_permissions(&go, std::fs::Permissions::from_mode(0o755)).unwrap();

    let env = Self { temp };
    std::fs::create_dir_all(env.tmp_path()).unwrap();
    std::fs::create_dir_all(env.output_path()).unwrap();
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  pub fn go_path(&self) -> PathBuf {
    self.temp.path().join("go")
  }

  /// Temp root for build workspaces (isolated per test).
  pub fn tmp_path(&self) -> PathBuf {
    self.temp.path().join("tmp")
  }

  /// Directory binaries are written to.
  pub fn output_path(&self) -> PathBuf {
    self.temp.path().join("output")
  }

  /// Number of build workspaces left behind in the temp root.
  pub fn leftover_workspaces(&self) -> usize {
    std::fs::read_dir(self.tmp_path()).map(|entries| entries.count()).unwrap_or(0)
  }

  /// Get a pre-configured Command for the pbforge binary.
  ///
  /// Sets environment variables for isolated testing:
  /// - `PBFORGE_GO`: the fake toolchain
  /// - `TMPDIR`: isolated temp root, so cleanup can be checked
  /// - current directory: the output path
  pub fn pbforge_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("pbforge");
    cmd.env("PBFORGE_GO", self.go_path());
    cmd.env("TMPDIR", self.tmp_path());
    cmd.env_remove("PBFORGE_TIMEOUT");
    cmd.env_remove("RUST_LOG");
    cmd.current_dir(self.output_path());
    cmd
  }
}
