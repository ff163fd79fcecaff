//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const FLEET: &str = r#"
orgs:
  - { id: 7, name: acme }
  - { id: 9, name: globex }
servers:
  - { id: 1000010000, name: web1, org_id: 7, minion: true }
  - { id: 1000010001, name: legacy, org_id: 7 }
groups:
  - { id: 42, name: web, org_id: 7 }
memberships:
  - { server_id: 1000010000, group_id: 42 }
custom_states:
  - { org_id: 7, name: base }
  - { org_id: 7, name: db }
"#;

/// Isolated test environment.
///
/// Inventory, artifact roots and revision history all live in one temp dir.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("inventory.yaml"), FLEET).unwrap();
    Self { temp }
  }

  fn dir(&self, name: &str) -> PathBuf {
    let p = self.temp.path().join(name);
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn inventory_path(&self) -> PathBuf {
    self.temp.path().join("inventory.yaml")
  }

  pub fn pillar_path(&self) -> PathBuf {
    self.dir("pillar")
  }

  pub fn custom_path(&self) -> PathBuf {
    self.dir("salt").join("custom")
  }

  pub fn read_pillar(&self, server: u64) -> Option<String> {
    std::fs::read_to_string(self.pillar_path().join(format!("server_{}.sls", server))).ok()
  }

  pub fn read_assignment(&self, stem: &str) -> Option<String> {
    std::fs::read_to_string(self.custom_path().join(format!("{}.sls", stem))).ok()
  }

  pub fn inventory(&self) -> serde_yaml::Value {
    serde_yaml::from_str(&std::fs::read_to_string(self.inventory_path()).unwrap()).unwrap()
  }

  /// A saltgen command with every location pointed into the temp dir.
  pub fn saltgen_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("saltgen");
    cmd.env("SALTGEN_INVENTORY", self.inventory_path());
    cmd.env("SALTGEN_PILLAR_ROOT", self.pillar_path());
    cmd.env("SALTGEN_SLS_ROOT", self.dir("salt"));
    cmd.env("SALTGEN_DATA_DIR", self.dir("data"));
    cmd.env_remove("SALTGEN_EXTENSION");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
