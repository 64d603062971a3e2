use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

#[test]
#[serial]
fn deps_prints_declared_packages() {
  let env = TestEnv::new();
  let manifest = env.write_file("deps.cmake", "foo\tbar=1\tbaz=2\nqux\n");

  env
    .cmkx_cmd()
    .arg("deps")
    .arg(&manifest)
    .arg("-B")
    .arg(env.binary_dir())
    .assert()
    .success()
    .stdout(predicate::str::contains("foo bar=1 baz=2"))
    .stdout(predicate::str::contains("qux"));
}

#[test]
#[serial]
fn deps_json_output() {
  let env = TestEnv::new();
  let manifest = env.write_file("deps.cmake", "foo\tbar=1\n");

  let output = env
    .cmkx_cmd()
    .arg("deps")
    .arg(&manifest)
    .args(["-o", "json", "-B"])
    .arg(env.binary_dir())
    .output()
    .unwrap();

  assert!(output.status.success());
  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value[0]["name"], "foo");
  assert_eq!(value[0]["fields"][0], "bar=1");
}

#[test]
#[serial]
fn deps_without_declarations() {
  let env = TestEnv::new();
  let manifest = env.write_file("deps.cmake", "");

  env
    .cmkx_cmd()
    .arg("deps")
    .arg(&manifest)
    .arg("-B")
    .arg(env.binary_dir())
    .assert()
    .success()
    .stdout(predicate::str::contains("No dependencies declared"));
}

#[test]
#[serial]
fn deps_missing_manifest_runs_nothing_for_it() {
  let env = TestEnv::new();

  env
    .cmkx_cmd()
    .arg("deps")
    .arg(env.temp.path().join("missing.cmake"))
    .arg("-B")
    .arg(env.binary_dir())
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));

  assert_eq!(env.calls().len(), 1, "only the script host was configured");
}
