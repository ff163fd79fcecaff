use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::artifact::{ArtifactError, InvalidScopeError};
use crate::resolve::ResolveError;
use crate::revision::{ConfigurationRevision, RevisionError};
use crate::topology::TopologyError;
use crate::types::{GroupId, OrgId, Scope, Server, ServerGroup, ServerId};

/// Topology-changing events the reconciler reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
  ServerRegistered(Server),
  ServerRemoved(Server),
  GroupRemoved(ServerGroup),
  OrgRemoved(OrgId),
  /// A revision was committed; its scope is carried by the revision.
  CustomStateRevisionCommitted(ConfigurationRevision),
  /// A custom state definition was edited or soft-deleted.
  CustomStateDefinitionChanged { org_id: OrgId, state_name: String },
  ServerMigrated {
    server: Server,
    new_org: OrgId,
    actor: Option<String>,
  },
}

impl Event {
  pub fn name(&self) -> &'static str {
    match self {
      Event::ServerRegistered(_) => "server_registered",
      Event::ServerRemoved(_) => "server_removed",
      Event::GroupRemoved(_) => "group_removed",
      Event::OrgRemoved(_) => "org_removed",
      Event::CustomStateRevisionCommitted(_) => "custom_state_revision_committed",
      Event::CustomStateDefinitionChanged { .. } => "custom_state_definition_changed",
      Event::ServerMigrated { .. } => "server_migrated",
    }
  }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
  #[error(transparent)]
  InvalidScope(#[from] InvalidScopeError),

  #[error(transparent)]
  Artifact(#[from] ArtifactError),

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Revision(#[from] RevisionError),

  #[error(transparent)]
  Topology(#[from] TopologyError),

  #[error("unknown server {0}")]
  UnknownServer(ServerId),

  #[error("unknown group {0}")]
  UnknownGroup(GroupId),

  #[error("unknown org {0}")]
  UnknownOrg(OrgId),
}

/// A batch member that failed.
#[derive(Debug, Serialize)]
pub struct ScopeFailure {
  pub scope: Scope,
  #[serde(serialize_with = "display")]
  pub error: ReconcileError,
}

fn display<S: serde::Serializer>(error: &ReconcileError, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.collect_str(error)
}

/// What a reconciliation did.
///
/// Batch operations keep going past member failures and collect them here;
/// single-scope operations return `Err` instead.
#[derive(Debug, Default, Serialize)]
pub struct ReconcileReport {
  /// Artifacts written.
  pub written: Vec<PathBuf>,
  /// Artifacts removed or already absent. For a dry-run prune, the ones that
  /// would be removed.
  pub removed: Vec<PathBuf>,
  /// Every removal attempted, failed ones included.
  pub removals_attempted: usize,
  pub failures: Vec<ScopeFailure>,
}

impl ReconcileReport {
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }

  pub fn merge(&mut self, other: ReconcileReport) {
    self.written.extend(other.written);
    self.removed.extend(other.removed);
    self.removals_attempted += other.removals_attempted;
    self.failures.extend(other.failures);
  }

  pub(crate) fn fail(&mut self, scope: Scope, error: ReconcileError) {
    self.failures.push(ScopeFailure { scope, error });
  }

  /// Turn the first recorded failure into an error.
  pub(crate) fn into_result(mut self) -> Result<Self, ReconcileError> {
    if self.failures.is_empty() {
      Ok(self)
    } else {
      Err(self.failures.remove(0).error)
    }
  }
}
