use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn resync_is_idempotent() {
  let env = TestEnv::new();

  env
    .saltgen_cmd()
    .arg("resync")
    .assert()
    .success()
    .stdout(predicate::str::contains("Resync complete"));
  let first = env.read_pillar(1000010000).unwrap();

  env.saltgen_cmd().arg("resync").assert().success();
  assert_eq!(env.read_pillar(1000010000).unwrap(), first);
  assert_eq!(env.read_assignment("org_9").unwrap(), "include: []\n");
}

#[test]
fn resync_json_output_is_valid() {
  let env = TestEnv::new();

  let output = env.saltgen_cmd().args(["-o", "json", "resync"]).output().unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  // web1 pillar and assignment, group 42, orgs 7 and 9
  assert_eq!(report["written"].as_array().unwrap().len(), 5);
  assert!(report["failures"].as_array().unwrap().is_empty());
}

#[test]
fn prune_dry_run_keeps_files() {
  let env = TestEnv::new();
  let stale = env.pillar_path().join("server_77.sls");
  std::fs::write(&stale, "org_id: 1\ngroup_id: []\n").unwrap();

  env
    .saltgen_cmd()
    .args(["prune", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"))
    .stdout(predicate::str::contains("server_77.sls"));

  assert!(stale.exists());
}

#[test]
fn prune_removes_stale_artifacts() {
  let env = TestEnv::new();
  env.saltgen_cmd().arg("resync").assert().success();
  let stale = env.custom_path().join("group_500.sls");
  std::fs::write(&stale, "include: []\n").unwrap();

  env.saltgen_cmd().arg("prune").assert().success();

  assert!(!stale.exists());
  assert!(env.read_assignment("group_42").is_some());
}

#[test]
fn custom_extension_is_honored() {
  let env = TestEnv::new();

  env
    .saltgen_cmd()
    .args(["--extension", "yml", "register", "1000010000"])
    .assert()
    .success();

  assert!(env.pillar_path().join("server_1000010000.yml").exists());
}
