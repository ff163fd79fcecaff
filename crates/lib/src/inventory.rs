//! YAML fleet inventory.
//!
//! A self-contained stand-in for the fleet database: organizations, servers,
//! groups, group memberships and custom state definitions in one file. It
//! implements [`TopologyQuery`] and [`CustomStateCatalog`] so the reconciler
//! can run without any other backend.
//!
//! ```yaml
//! orgs:
//!   - { id: 7, name: acme }
//! servers:
//!   - { id: 1000010000, name: web1, org_id: 7, minion: true }
//! groups:
//!   - { id: 42, name: web, org_id: 7 }
//! memberships:
//!   - { server_id: 1000010000, group_id: 42 }
//! custom_states:
//!   - { org_id: 7, name: base }
//!   - { org_id: 7, name: db, deleted: true }
//! ```

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::resolve::{CustomStateCatalog, CustomStateDefinition, ResolveError};
use crate::topology::{TopologyError, TopologyQuery};
use crate::types::{GroupId, Org, OrgId, Server, ServerGroup, ServerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
  pub server_id: ServerId,
  pub group_id: GroupId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
  #[serde(default)]
  pub orgs: Vec<Org>,
  #[serde(default)]
  pub servers: Vec<Server>,
  #[serde(default)]
  pub groups: Vec<ServerGroup>,
  #[serde(default)]
  pub memberships: Vec<Membership>,
  #[serde(default)]
  pub custom_states: Vec<CustomStateDefinition>,
}

#[derive(Debug, Error)]
pub enum InventoryError {
  #[error("failed to read inventory {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse inventory {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("failed to serialize inventory: {0}")]
  Serialize(#[source] serde_yaml::Error),

  #[error("failed to write inventory {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid inventory: {0}")]
  Invalid(String),

  #[error("unknown {kind} {id}")]
  Unknown { kind: &'static str, id: u64 },
}

impl Inventory {
  /// Load and validate an inventory file.
  pub fn load(path: &Path) -> Result<Self, InventoryError> {
    let content = fs::read_to_string(path).map_err(|source| InventoryError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let inventory = Self::from_yaml(&content).map_err(|e| match e {
      InventoryError::Parse { source, .. } => InventoryError::Parse {
        path: path.to_path_buf(),
        source,
      },
      other => other,
    })?;

    debug!(
      path = %path.display(),
      orgs = inventory.orgs.len(),
      servers = inventory.servers.len(),
      groups = inventory.groups.len(),
      "inventory loaded"
    );
    Ok(inventory)
  }

  pub fn from_yaml(content: &str) -> Result<Self, InventoryError> {
    let inventory: Inventory = serde_yaml::from_str(content).map_err(|source| InventoryError::Parse {
      path: PathBuf::new(),
      source,
    })?;
    inventory.validate()?;
    Ok(inventory)
  }

  /// Write the inventory back, replacing the file atomically.
  pub fn save(&self, path: &Path) -> Result<(), InventoryError> {
    let content = serde_yaml::to_string(self).map_err(InventoryError::Serialize)?;
    let write_err = |source: io::Error| InventoryError::Write {
      path: path.to_path_buf(),
      source,
    };

    let dir = match path.parent() {
      Some(dir) if !dir.as_os_str().is_empty() => dir,
      _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;
    let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    info!(path = %path.display(), "inventory saved");
    Ok(())
  }

  /// Check ids are unique and every reference points at a known entity.
  pub fn validate(&self) -> Result<(), InventoryError> {
    let org_ids = unique(self.orgs.iter().map(|o| o.id.0), "org")?;
    let server_ids = unique(self.servers.iter().map(|s| s.id.0), "server")?;
    let group_ids = unique(self.groups.iter().map(|g| g.id.0), "group")?;

    for server in &self.servers {
      if !org_ids.contains(&server.org_id.0) {
        return Err(InventoryError::Invalid(format!(
          "server {} references unknown org {}",
          server.id, server.org_id
        )));
      }
    }
    for group in &self.groups {
      if !org_ids.contains(&group.org_id.0) {
        return Err(InventoryError::Invalid(format!(
          "group {} references unknown org {}",
          group.id, group.org_id
        )));
      }
    }
    for membership in &self.memberships {
      if !server_ids.contains(&membership.server_id.0) || !group_ids.contains(&membership.group_id.0) {
        return Err(InventoryError::Invalid(format!(
          "membership of server {} in group {} references an unknown entity",
          membership.server_id, membership.group_id
        )));
      }
    }
    for def in &self.custom_states {
      if !org_ids.contains(&def.org_id.0) {
        return Err(InventoryError::Invalid(format!(
          "custom state {:?} references unknown org {}",
          def.name, def.org_id
        )));
      }
    }

    Ok(())
  }

  pub fn server(&self, id: ServerId) -> Option<&Server> {
    self.servers.iter().find(|s| s.id == id)
  }

  pub fn group(&self, id: GroupId) -> Option<&ServerGroup> {
    self.groups.iter().find(|g| g.id == id)
  }

  pub fn org(&self, id: OrgId) -> Option<&Org> {
    self.orgs.iter().find(|o| o.id == id)
  }

  /// Move a server to another organization. Group memberships do not cross
  /// organizations and are dropped.
  pub fn move_server(&mut self, id: ServerId, org_id: OrgId) -> Result<Server, InventoryError> {
    if self.org(org_id).is_none() {
      return Err(InventoryError::Unknown { kind: "org", id: org_id.0 });
    }
    let server = self
      .servers
      .iter_mut()
      .find(|s| s.id == id)
      .ok_or(InventoryError::Unknown { kind: "server", id: id.0 })?;

    server.org_id = org_id;
    let server = server.clone();
    self.memberships.retain(|m| m.server_id != id);
    Ok(server)
  }

  /// Soft-delete a custom state. Returns whether the state was visible before.
  pub fn delete_custom_state(&mut self, org_id: OrgId, name: &str) -> Result<bool, InventoryError> {
    let def = self
      .custom_states
      .iter_mut()
      .find(|d| d.org_id == org_id && d.name == name)
      .ok_or_else(|| InventoryError::Invalid(format!("org {} has no custom state {:?}", org_id, name)))?;

    let was_visible = !def.deleted;
    def.deleted = true;
    Ok(was_visible)
  }

  pub fn remove_server(&mut self, id: ServerId) -> Option<Server> {
    let pos = self.servers.iter().position(|s| s.id == id)?;
    self.memberships.retain(|m| m.server_id != id);
    Some(self.servers.remove(pos))
  }

  pub fn remove_group(&mut self, id: GroupId) -> Option<ServerGroup> {
    let pos = self.groups.iter().position(|g| g.id == id)?;
    self.memberships.retain(|m| m.group_id != id);
    Some(self.groups.remove(pos))
  }

  /// Remove an organization with everything it owns.
  pub fn remove_org(&mut self, id: OrgId) -> Option<Org> {
    let pos = self.orgs.iter().position(|o| o.id == id)?;

    let servers: HashSet<ServerId> = self.servers.iter().filter(|s| s.org_id == id).map(|s| s.id).collect();
    let groups: HashSet<GroupId> = self.groups.iter().filter(|g| g.org_id == id).map(|g| g.id).collect();

    self
      .memberships
      .retain(|m| !servers.contains(&m.server_id) && !groups.contains(&m.group_id));
    self.servers.retain(|s| s.org_id != id);
    self.groups.retain(|g| g.org_id != id);
    self.custom_states.retain(|d| d.org_id != id);

    Some(self.orgs.remove(pos))
  }
}

fn unique(ids: impl Iterator<Item = u64>, kind: &str) -> Result<HashSet<u64>, InventoryError> {
  let mut seen = HashSet::new();
  for id in ids {
    if !seen.insert(id) {
      return Err(InventoryError::Invalid(format!("duplicate {} id {}", kind, id)));
    }
  }
  Ok(seen)
}

impl TopologyQuery for Inventory {
  fn is_fleet_managed(&self, server: &Server) -> bool {
    server.minion
  }

  fn list_managed_groups(&self, server: &Server) -> Result<Vec<ServerGroup>, TopologyError> {
    Ok(
      self
        .memberships
        .iter()
        .filter(|m| m.server_id == server.id)
        .filter_map(|m| self.group(m.group_id))
        .filter(|g| g.org_id == server.org_id)
        .cloned()
        .collect(),
    )
  }

  fn list_servers_in_org(&self, org_id: OrgId) -> Result<Vec<Server>, TopologyError> {
    Ok(self.servers.iter().filter(|s| s.org_id == org_id).cloned().collect())
  }

  fn list_groups_in_org(&self, org_id: OrgId) -> Result<Vec<ServerGroup>, TopologyError> {
    Ok(self.groups.iter().filter(|g| g.org_id == org_id).cloned().collect())
  }

  fn list_orgs(&self) -> Result<Vec<Org>, TopologyError> {
    Ok(self.orgs.clone())
  }

  fn lookup_server(&self, id: ServerId) -> Result<Option<Server>, TopologyError> {
    Ok(self.server(id).cloned())
  }

  fn lookup_group(&self, id: GroupId) -> Result<Option<ServerGroup>, TopologyError> {
    Ok(self.group(id).cloned())
  }

  fn lookup_org(&self, id: OrgId) -> Result<Option<Org>, TopologyError> {
    Ok(self.org(id).cloned())
  }
}

impl CustomStateCatalog for Inventory {
  fn definitions(&self, org_id: OrgId) -> Result<Vec<CustomStateDefinition>, ResolveError> {
    Ok(self.custom_states.iter().filter(|d| d.org_id == org_id).cloned().collect())
  }
}
