//! Test fixtures and in-memory collaborators.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use crate::artifact::{ArtifactDocument, ArtifactError, ArtifactPaths, ArtifactWriter};
use crate::inventory::Inventory;
use crate::resolve::{ResolveError, StateNameResolver};
use crate::topology::{PackageStateTrigger, TopologyError, TopologyQuery};
use crate::types::{GroupId, Org, OrgId, Server, ServerGroup, ServerId};

/// Two orgs; org 7 has a managed server in groups 42 and 43, an unmanaged
/// server, one live custom state and one soft-deleted one.
pub const FLEET: &str = r#"
orgs:
  - { id: 7, name: acme }
  - { id: 9, name: globex }
servers:
  - { id: 1000010000, name: web1, org_id: 7, minion: true }
  - { id: 1000010001, name: legacy, org_id: 7 }
  - { id: 1000010002, name: web2, org_id: 7, minion: true }
groups:
  - { id: 42, name: web, org_id: 7 }
  - { id: 43, name: db, org_id: 7 }
  - { id: 90, name: ops, org_id: 9 }
memberships:
  - { server_id: 1000010000, group_id: 43 }
  - { server_id: 1000010000, group_id: 42 }
custom_states:
  - { org_id: 7, name: base }
  - { org_id: 7, name: db, deleted: true }
  - { org_id: 9, name: monitoring }
"#;

pub const WEB1: ServerId = ServerId(1000010000);
pub const LEGACY: ServerId = ServerId(1000010001);

pub fn fleet() -> Inventory {
  Inventory::from_yaml(FLEET).unwrap()
}

pub fn test_paths() -> ArtifactPaths {
  ArtifactPaths::new("/srv/pillar", "/srv/salt", "sls")
}

pub fn names(list: &[&str]) -> BTreeSet<String> {
  list.iter().map(|s| s.to_string()).collect()
}

/// Keeps written artifacts in memory, rendered as YAML.
#[derive(Debug, Default)]
pub struct RecordingWriter {
  files: RefCell<BTreeMap<PathBuf, String>>,
  writes: RefCell<usize>,
  failing: RefCell<BTreeSet<PathBuf>>,
}

impl RecordingWriter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Make every write and removal of `path` fail.
  pub fn fail_on(&self, path: impl Into<PathBuf>) {
    self.failing.borrow_mut().insert(path.into());
  }

  pub fn seed(&self, path: impl Into<PathBuf>, content: &str) {
    self.files.borrow_mut().insert(path.into(), content.to_string());
  }

  pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
    self.files.borrow().get(path.as_ref()).cloned()
  }

  pub fn contains(&self, path: impl AsRef<Path>) -> bool {
    self.files.borrow().contains_key(path.as_ref())
  }

  pub fn paths(&self) -> Vec<PathBuf> {
    self.files.borrow().keys().cloned().collect()
  }

  pub fn write_count(&self) -> usize {
    *self.writes.borrow()
  }

  fn check(&self, path: &Path) -> Result<(), io::Error> {
    if self.failing.borrow().contains(path) {
      Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    } else {
      Ok(())
    }
  }
}

impl ArtifactWriter for RecordingWriter {
  fn write(&self, path: &Path, document: &ArtifactDocument) -> Result<(), ArtifactError> {
    self.check(path).map_err(|source| ArtifactError::Write {
      path: path.to_path_buf(),
      source,
    })?;
    let content = document.to_yaml().map_err(|source| ArtifactError::Serialize {
      path: path.to_path_buf(),
      source,
    })?;
    *self.writes.borrow_mut() += 1;
    self.files.borrow_mut().insert(path.to_path_buf(), content);
    Ok(())
  }

  fn remove(&self, path: &Path) -> Result<bool, ArtifactError> {
    self.check(path).map_err(|source| ArtifactError::Remove {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(self.files.borrow_mut().remove(path).is_some())
  }
}

/// A resolver whose backend is unreachable.
#[derive(Debug, Default)]
pub struct DownResolver;

impl StateNameResolver for DownResolver {
  fn resolve(&self, org_id: OrgId, _candidates: &BTreeSet<String>) -> Result<BTreeSet<String>, ResolveError> {
    Err(ResolveError::Unavailable {
      org_id,
      message: "connection refused".to_string(),
    })
  }
}

/// Delegates to an inventory but fails to list the servers of some orgs.
#[derive(Debug)]
pub struct FlakyTopology {
  pub inner: Inventory,
  pub broken_orgs: BTreeSet<OrgId>,
}

impl TopologyQuery for FlakyTopology {
  fn is_fleet_managed(&self, server: &Server) -> bool {
    self.inner.is_fleet_managed(server)
  }

  fn list_managed_groups(&self, server: &Server) -> Result<Vec<ServerGroup>, TopologyError> {
    self.inner.list_managed_groups(server)
  }

  fn list_servers_in_org(&self, org_id: OrgId) -> Result<Vec<Server>, TopologyError> {
    if self.broken_orgs.contains(&org_id) {
      return Err(TopologyError::Lookup(format!("servers of org {} unavailable", org_id)));
    }
    self.inner.list_servers_in_org(org_id)
  }

  fn list_groups_in_org(&self, org_id: OrgId) -> Result<Vec<ServerGroup>, TopologyError> {
    self.inner.list_groups_in_org(org_id)
  }

  fn list_orgs(&self) -> Result<Vec<Org>, TopologyError> {
    self.inner.list_orgs()
  }

  fn lookup_server(&self, id: ServerId) -> Result<Option<Server>, TopologyError> {
    self.inner.lookup_server(id)
  }

  fn lookup_group(&self, id: GroupId) -> Result<Option<ServerGroup>, TopologyError> {
    self.inner.lookup_group(id)
  }

  fn lookup_org(&self, id: OrgId) -> Result<Option<Org>, TopologyError> {
    self.inner.lookup_org(id)
  }
}

/// Records which servers had package states regenerated.
#[derive(Debug, Default)]
pub struct RecordingTrigger {
  pub fired: RefCell<Vec<ServerId>>,
}

impl PackageStateTrigger for RecordingTrigger {
  fn regenerate_package_state(&self, server: &Server) {
    self.fired.borrow_mut().push(server.id);
  }
}
