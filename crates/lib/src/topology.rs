//! Fleet topology and the other collaborators the reconciler calls out to.

use thiserror::Error;
use tracing::debug;

use crate::types::{GroupId, Org, OrgId, Server, ServerGroup, ServerId};

#[derive(Debug, Error)]
pub enum TopologyError {
  #[error("topology lookup failed: {0}")]
  Lookup(String),
}

/// Read-only view of which machines exist and where they belong.
pub trait TopologyQuery {
  /// Whether `server` has an enrolled agent and receives generated artifacts.
  fn is_fleet_managed(&self, server: &Server) -> bool;

  /// Managed groups `server` is a member of.
  fn list_managed_groups(&self, server: &Server) -> Result<Vec<ServerGroup>, TopologyError>;

  /// Every server currently in `org_id`, managed or not.
  fn list_servers_in_org(&self, org_id: OrgId) -> Result<Vec<Server>, TopologyError>;

  fn list_groups_in_org(&self, org_id: OrgId) -> Result<Vec<ServerGroup>, TopologyError>;

  fn list_orgs(&self) -> Result<Vec<Org>, TopologyError>;

  fn lookup_server(&self, id: ServerId) -> Result<Option<Server>, TopologyError>;

  fn lookup_group(&self, id: GroupId) -> Result<Option<ServerGroup>, TopologyError>;

  fn lookup_org(&self, id: OrgId) -> Result<Option<Org>, TopologyError>;
}

/// Hook fired after a migration so package states get regenerated.
///
/// Fire-and-forget: failures belong to the implementor and are not reported
/// back.
pub trait PackageStateTrigger {
  fn regenerate_package_state(&self, server: &Server);
}

/// Trigger for deployments without package state generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPackageStates;

impl PackageStateTrigger for NoPackageStates {
  fn regenerate_package_state(&self, server: &Server) {
    debug!(server = %server.id, "package state generation not configured");
  }
}

impl<T: PackageStateTrigger + ?Sized> PackageStateTrigger for &T {
  fn regenerate_package_state(&self, server: &Server) {
    (**self).regenerate_package_state(server)
  }
}

impl<T: TopologyQuery + ?Sized> TopologyQuery for &T {
  fn is_fleet_managed(&self, server: &Server) -> bool {
    (**self).is_fleet_managed(server)
  }

  fn list_managed_groups(&self, server: &Server) -> Result<Vec<ServerGroup>, TopologyError> {
    (**self).list_managed_groups(server)
  }

  fn list_servers_in_org(&self, org_id: OrgId) -> Result<Vec<Server>, TopologyError> {
    (**self).list_servers_in_org(org_id)
  }

  fn list_groups_in_org(&self, org_id: OrgId) -> Result<Vec<ServerGroup>, TopologyError> {
    (**self).list_groups_in_org(org_id)
  }

  fn list_orgs(&self) -> Result<Vec<Org>, TopologyError> {
    (**self).list_orgs()
  }

  fn lookup_server(&self, id: ServerId) -> Result<Option<Server>, TopologyError> {
    (**self).lookup_server(id)
  }

  fn lookup_group(&self, id: GroupId) -> Result<Option<ServerGroup>, TopologyError> {
    (**self).lookup_group(id)
  }

  fn lookup_org(&self, id: OrgId) -> Result<Option<Org>, TopologyError> {
    (**self).lookup_org(id)
  }
}
