//! Build command integration tests.

use predicates::prelude::*;
use serial_test::serial;

use super::common::{BUILD_CHATTY, BUILD_FAIL, BUILD_OK, TestEnv};

#[test]
#[serial]
fn build_writes_default_output_name() {
  let env = TestEnv::with_toolchain(BUILD_OK);

  env
    .pbforge_cmd()
    .args(["build", "--os", "linux", "--arch", "arm64"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Built"))
    .stdout(predicate::str::contains("linux/arm64"))
    .stdout(predicate::str::contains("SHA-256"));

  let binary = env.output_path().join("pocketbase");
  assert_eq!(std::fs::read_to_string(&binary).unwrap(), "ELF linux/arm64\n");
  assert_eq!(env.leftover_workspaces(), 0);
}

#[test]
#[serial]
fn build_for_windows_adds_exe_suffix() {
  let env = TestEnv::with_toolchain(BUILD_OK);

  env
    .pbforge_cmd()
    .args(["build", "--os", "windows", "--arch", "amd64"])
    .assert()
    .success();

  assert!(env.output_path().join("pocketbase.exe").is_file());
}

#[test]
#[serial]
fn build_json_reports_output() {
  let env = TestEnv::with_toolchain(BUILD_OK);
  let target = env.output_path().join("pb-linux");

  let output = env
    .pbforge_cmd()
    .args(["build", "--os", "linux", "--arch", "amd64", "--format", "json", "-o"])
    .arg(&target)
    .output()
    .unwrap();
  assert!(output.status.success());

  let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(parsed["platform"], "linux/amd64");
  assert_eq!(parsed["size"], "ELF linux/amd64\n".len() as u64);
  assert_eq!(parsed["sha256"].as_str().unwrap().len(), 64);
  assert!(target.is_file());
}

#[test]
#[serial]
fn build_from_request_file() {
  let env = TestEnv::with_toolchain(BUILD_OK);
  let request = env.write_file(
    "request.json",
    r#"{"arch": "riscv64", "os": "freebsd", "plugins": [{"module": "example.org/plugin", "version": "v1.2.3"}]}"#,
  );

  env
    .pbforge_cmd()
    .args(["build", "-o", "pb", "--request"])
    .arg(&request)
    .assert()
    .success();

  assert_eq!(
    std::fs::read_to_string(env.output_path().join("pb")).unwrap(),
    "ELF freebsd/riscv64\n"
  );
}

#[test]
#[serial]
fn build_keeps_sources_in_workdir() {
  let env = TestEnv::with_toolchain(BUILD_OK);
  let workdir = env.temp.path().join("work");

  env
    .pbforge_cmd()
    .args(["build", "--os", "linux", "--arch", "amd64", "--with", "example.org/plugin@v1.0.0", "--workdir"])
    .arg(&workdir)
    .assert()
    .success()
    .stdout(predicate::str::contains("Sources kept in"));

  let manifest = std::fs::read_to_string(workdir.join("go.mod")).unwrap();
  assert!(manifest.contains("example.org/plugin v1.0.0"));
  assert!(workdir.join("main.go").is_file());
}

#[test]
#[serial]
fn toolchain_failure_reports_diagnostics() {
  let env = TestEnv::with_toolchain(BUILD_FAIL);

  env
    .pbforge_cmd()
    .args(["build", "--os", "linux", "--arch", "amd64"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("undefined symbol"));

  assert!(!env.output_path().join("pocketbase").exists());
  assert_eq!(env.leftover_workspaces(), 0);
}

#[test]
#[serial]
fn missing_toolchain_fails() {
  let env = TestEnv::with_toolchain(BUILD_OK);

  env
    .pbforge_cmd()
    .env("PBFORGE_GO", env.temp.path().join("no-such-go"))
    .args(["build", "--os", "linux", "--arch", "amd64"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("go mod tidy"));
}

#[test]
#[serial]
fn relative_workdir_is_resolved_against_cwd() {
  let env = TestEnv::with_toolchain(BUILD_OK);

  env
    .pbforge_cmd()
    .args(["build", "--os", "linux", "--arch", "amd64", "--workdir", "work"])
    .assert()
    .success();

  let workdir = env.output_path().join("work");
  assert!(workdir.join("go.mod").is_file());
  assert!(workdir.join("pocketbase").is_file());
  assert!(env.output_path().join("pocketbase").is_file());
}

#[test]
#[serial]
fn verbose_streams_toolchain_output() {
  let env = TestEnv::with_toolchain(BUILD_CHATTY);

  env
    .pbforge_cmd()
    .args(["-v", "build", "--os", "linux", "--arch", "amd64"])
    .assert()
    .success()
    .stderr(predicate::str::contains("go: downloading example.org/plugin v1.0.0"));

  env
    .pbforge_cmd()
    .args(["build", "--os", "linux", "--arch", "amd64"])
    .assert()
    .success()
    .stderr(predicate::str::contains("downloading").not());
}
