use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

#[test]
#[serial]
fn package_build_configures_once() {
  let env = TestEnv::new();
  let build = || {
    env
      .cmkx_cmd()
      .args(["build", "--package", "zlib", "--config", "Release", "-B"])
      .arg(env.binary_dir())
      .args(["--", "-DZLIB_COMPAT=ON"])
      .assert()
      .success()
  };

  build().stdout(predicate::str::contains("Configured: yes"));
  build().stdout(predicate::str::contains("Configured: no"));

  let calls = env.calls();
  assert_eq!(calls.len(), 3);
  assert!(calls[0].contains("-DZLIB_COMPAT=ON"));
  assert!(calls[0].contains("-DCMAKE_BUILD_TYPE=Release"));
  assert!(calls[1].starts_with("--build "));
  assert!(
    env
      .binary_dir()
      .join("_cmkx/log/zlib-Release-build-all.log")
      .is_file()
  );
}

#[test]
#[serial]
fn failing_target_reports_exit_code() {
  let env = TestEnv::new();

  env
    .cmkx_cmd()
    .args(["build", "--package", "zlib", "-t", "", "-t", "broken", "-t", "install", "-B"])
    .arg(env.binary_dir())
    .assert()
    .failure()
    .stderr(predicate::str::contains("target 'broken' failed with exit code 2"));

  assert!(!env.calls().iter().any(|c| c.contains("install")));
}

#[test]
#[serial]
fn main_project_build() {
  let env = TestEnv::new();
  let source = env.write_file("src/CMakeLists.txt", "project(app)\n");
  let source_dir = source.parent().unwrap().to_path_buf();

  env
    .cmkx_cmd()
    .args(["build", "-S"])
    .arg(&source_dir)
    .arg("-B")
    .arg(env.binary_dir())
    .assert()
    .success()
    .stdout(predicate::str::contains("Built main project"));

  let configure = &env.calls()[0];
  assert!(configure.contains("-UCMAKE_BUILD_TYPE"));
  assert!(!configure.contains("CMAKE_INSTALL_PREFIX"));
}

#[test]
#[serial]
fn generator_is_remembered() {
  let env = TestEnv::new();

  env
    .cmkx_cmd()
    .args(["build", "--package", "a", "--config", "Debug", "-B"])
    .arg(env.binary_dir())
    .args(["--", "-GNinja Multi-Config"])
    .assert()
    .success();

  env
    .cmkx_cmd()
    .args(["build", "--package", "b", "--config", "Debug", "-B"])
    .arg(env.binary_dir())
    .assert()
    .success();

  let calls = env.calls();
  assert!(calls[2].contains("-GNinja Multi-Config"));
  assert!(calls[3].ends_with("--config Debug"));
}
