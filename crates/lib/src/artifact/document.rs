//! Declarative documents written as artifacts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{GroupId, OrgId, Purpose};

/// Per-server pillar data, rebuilt from current topology on every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillar {
  pub org_id: OrgId,
  pub group_id: Vec<GroupId>,
}

impl Pillar {
  /// Build a pillar; group ids are sorted and deduplicated so the output is
  /// independent of query order.
  pub fn new(org_id: OrgId, groups: impl IntoIterator<Item = GroupId>) -> Self {
    let group_id: BTreeSet<GroupId> = groups.into_iter().collect();
    Self {
      org_id,
      group_id: group_id.into_iter().collect(),
    }
  }
}

/// Custom states included for a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomStateAssignment {
  pub include: BTreeSet<String>,
}

impl CustomStateAssignment {
  pub fn new(include: BTreeSet<String>) -> Self {
    Self { include }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactDocument {
  Pillar(Pillar),
  CustomStateAssignment(CustomStateAssignment),
}

impl ArtifactDocument {
  pub fn purpose(&self) -> Purpose {
    match self {
      ArtifactDocument::Pillar(_) => Purpose::Pillar,
      ArtifactDocument::CustomStateAssignment(_) => Purpose::CustomStateAssignment,
    }
  }

  /// Render the document as YAML.
  pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
    match self {
      ArtifactDocument::Pillar(pillar) => serde_yaml::to_string(pillar),
      ArtifactDocument::CustomStateAssignment(assignment) => serde_yaml::to_string(assignment),
    }
  }
}

impl From<Pillar> for ArtifactDocument {
  fn from(pillar: Pillar) -> Self {
    ArtifactDocument::Pillar(pillar)
  }
}

impl From<CustomStateAssignment> for ArtifactDocument {
  fn from(assignment: CustomStateAssignment) -> Self {
    ArtifactDocument::CustomStateAssignment(assignment)
  }
}
