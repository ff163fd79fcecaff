use std::fs;
use std::path::{Path, PathBuf};

use saltgen_lib::artifact::{ArtifactPaths, FsArtifactWriter};
use saltgen_lib::inventory::Inventory;
use saltgen_lib::reconcile::ScopeReconciler;
use saltgen_lib::resolve::CatalogResolver;
use saltgen_lib::revision::RevisionStore;
use tempfile::TempDir;

pub const FLEET: &str = r#"
orgs:
  - { id: 7, name: acme }
  - { id: 9, name: globex }
servers:
  - { id: 1000010000, name: web1, org_id: 7, minion: true }
  - { id: 1000010001, name: legacy, org_id: 7 }
  - { id: 1000010002, name: web2, org_id: 7, minion: true }
  - { id: 1000010003, name: mail, org_id: 9, minion: true }
groups:
  - { id: 42, name: web, org_id: 7 }
  - { id: 90, name: ops, org_id: 9 }
memberships:
  - { server_id: 1000010000, group_id: 42 }
  - { server_id: 1000010002, group_id: 42 }
  - { server_id: 1000010003, group_id: 90 }
custom_states:
  - { org_id: 7, name: base }
  - { org_id: 7, name: db }
  - { org_id: 9, name: monitoring }
"#;

pub type Reconciler<'a> =
  ScopeReconciler<&'a Inventory, &'a RevisionStore, CatalogResolver<&'a Inventory>, FsArtifactWriter>;

/// Artifact roots and revision history under one temp dir.
pub struct Fixture {
  pub temp: TempDir,
  pub paths: ArtifactPaths,
  pub store: RevisionStore,
}

impl Fixture {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(temp.path().join("pillar"), temp.path().join("salt"), "sls");
    let store = RevisionStore::new(temp.path().join("revisions"));
    Self { temp, paths, store }
  }

  pub fn reconciler<'a>(&'a self, inventory: &'a Inventory) -> Reconciler<'a> {
    ScopeReconciler::new(
      self.paths.clone(),
      inventory,
      &self.store,
      CatalogResolver::new(inventory),
      FsArtifactWriter,
    )
  }

  pub fn read(&self, path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
  }

  /// Every artifact file with its content, sorted by path.
  pub fn artifacts(&self) -> Vec<(PathBuf, String)> {
    let mut out = Vec::new();
    for dir in [self.paths.pillar_root(), self.paths.custom_dir()] {
      let Ok(entries) = fs::read_dir(dir) else { continue };
      for entry in entries.flatten() {
        let path = entry.path();
        out.push((path.clone(), fs::read_to_string(&path).unwrap()));
      }
    }
    out.sort();
    out
  }
}

pub fn fleet() -> Inventory {
  Inventory::from_yaml(FLEET).unwrap()
}
