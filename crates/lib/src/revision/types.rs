use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{OrgId, Scope};

/// Current revision index format version.
pub const REVISION_INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStateKind {
  Installed,
  Latest,
  Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageState {
  pub name: String,
  pub state: PackageStateKind,
}

/// Immutable snapshot of the configuration assigned to a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationRevision {
  pub scope: Scope,
  /// Sequence number, starting at 1 for each scope.
  pub revision: u64,
  /// Owning organization when the revision was committed.
  pub org_id: OrgId,
  pub created_at: u64,
  pub created_by: Option<String>,
  #[serde(default)]
  pub custom_states: BTreeSet<String>,
  #[serde(default)]
  pub package_states: Vec<PackageState>,
  #[serde(default)]
  pub pillar: Option<BTreeMap<String, serde_json::Value>>,
}

impl ConfigurationRevision {
  pub fn references(&self, state_name: &str) -> bool {
    self.custom_states.contains(state_name)
  }

  pub fn to_metadata(&self) -> RevisionMetadata {
    RevisionMetadata {
      revision: self.revision,
      created_at: self.created_at,
      created_by: self.created_by.clone(),
      custom_state_count: self.custom_states.len(),
      package_state_count: self.package_states.len(),
    }
  }
}

/// Content of a revision about to be committed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRevision {
  pub created_by: Option<String>,
  pub custom_states: BTreeSet<String>,
  pub package_states: Vec<PackageState>,
  pub pillar: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMetadata {
  pub revision: u64,
  pub created_at: u64,
  pub created_by: Option<String>,
  pub custom_state_count: usize,
  pub package_state_count: usize,
}

/// Per-scope list of revisions plus the latest pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionIndex {
  pub version: u32,
  pub scope: Scope,
  pub revisions: Vec<RevisionMetadata>,
  pub latest: Option<u64>,
}

impl RevisionIndex {
  pub fn new(scope: Scope) -> Self {
    Self {
      version: REVISION_INDEX_VERSION,
      scope,
      revisions: Vec::new(),
      latest: None,
    }
  }

  pub fn next_revision(&self) -> u64 {
    self.latest.map_or(1, |latest| latest + 1)
  }

  pub fn add(&mut self, metadata: RevisionMetadata) {
    self.latest = Some(metadata.revision);
    self.revisions.push(metadata);
  }

  pub fn len(&self) -> usize {
    self.revisions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.revisions.is_empty()
  }
}

/// Latest revisions referencing a custom state, grouped by scope kind.
#[derive(Debug, Default)]
pub struct RevisionUsage {
  pub servers: Vec<ConfigurationRevision>,
  pub groups: Vec<ConfigurationRevision>,
  pub orgs: Vec<ConfigurationRevision>,
  /// Scopes whose history could not be read, so whether they reference the
  /// state is unknown.
  pub unreadable: Vec<(Scope, RevisionError)>,
}

impl RevisionUsage {
  pub fn push(&mut self, revision: ConfigurationRevision) {
    match revision.scope {
      Scope::Server(_) => self.servers.push(revision),
      Scope::Group(_) => self.groups.push(revision),
      Scope::Org(_) => self.orgs.push(revision),
    }
  }

  pub fn len(&self) -> usize {
    self.servers.len() + self.groups.len() + self.orgs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Servers first, then groups, then orgs.
  pub fn into_iter_ordered(self) -> impl Iterator<Item = ConfigurationRevision> {
    self.servers.into_iter().chain(self.groups).chain(self.orgs)
  }
}

#[derive(Debug, Error)]
pub enum RevisionError {
  #[error("failed to create revision directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to read revision data: {0}")]
  Read(#[source] io::Error),

  #[error("failed to write revision data: {0}")]
  Write(#[source] io::Error),

  #[error("failed to parse revision data: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize revision data: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("revision {revision} not found for {scope}")]
  NotFound { scope: Scope, revision: u64 },

  #[error("unsupported revision index version: {0}")]
  UnsupportedVersion(u32),

  #[error("revision index for {expected} names {found}")]
  ScopeMismatch { expected: Scope, found: Scope },
}

/// Seconds since the unix epoch.
pub(crate) fn unix_now() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs())
    .unwrap_or_default()
}
