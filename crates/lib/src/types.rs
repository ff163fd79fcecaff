//! Fleet topology types shared across the crate.
//!
//! A [`Scope`] names the unit an artifact is generated for. Servers, groups
//! and organizations are identified by stable numeric ids; the server id
//! doubles as its digital server id in artifact file names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! numeric_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(pub u64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }

    impl FromStr for $name {
      type Err = std::num::ParseIntError;

      fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map($name)
      }
    }
  };
}

numeric_id!(
  /// Digital id of a server.
  ServerId
);
numeric_id!(
  /// Id of a server group.
  GroupId
);
numeric_id!(
  /// Id of an organization.
  OrgId
);

/// A server record as known to the fleet topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
  pub id: ServerId,
  pub name: String,
  pub org_id: OrgId,
  /// Whether the server has an enrolled agent. Callers should ask
  /// [`TopologyQuery::is_fleet_managed`](crate::topology::TopologyQuery::is_fleet_managed)
  /// rather than reading this directly.
  #[serde(default)]
  pub minion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerGroup {
  pub id: GroupId,
  pub name: String,
  pub org_id: OrgId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Org {
  pub id: OrgId,
  pub name: String,
}

/// The entity an artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Scope {
  Server(ServerId),
  Group(GroupId),
  Org(OrgId),
}

impl Scope {
  /// File name stem of the custom state assignment for this scope.
  pub fn assignment_stem(&self) -> String {
    match self {
      Scope::Server(id) => format!("custom_{}", id),
      Scope::Group(id) => format!("group_{}", id),
      Scope::Org(id) => format!("org_{}", id),
    }
  }

  /// Directory name used when persisting per-scope data.
  pub fn dir_name(&self) -> String {
    match self {
      Scope::Server(id) => format!("server_{}", id),
      Scope::Group(id) => format!("group_{}", id),
      Scope::Org(id) => format!("org_{}", id),
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scope::Server(id) => write!(f, "server:{}", id),
      Scope::Group(id) => write!(f, "group:{}", id),
      Scope::Org(id) => write!(f, "org:{}", id),
    }
  }
}

/// Errors from parsing a `kind:id` scope string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeParseError {
  #[error("expected <kind>:<id>, got {0:?}")]
  Format(String),

  #[error("unknown scope kind {0:?} (expected server, group or org)")]
  UnknownKind(String),

  #[error("invalid scope id {0:?}")]
  InvalidId(String),
}

impl FromStr for Scope {
  type Err = ScopeParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (kind, id) = s.split_once(':').ok_or_else(|| ScopeParseError::Format(s.to_string()))?;
    let id: u64 = id.parse().map_err(|_| ScopeParseError::InvalidId(id.to_string()))?;

    match kind {
      "server" => Ok(Scope::Server(ServerId(id))),
      "group" => Ok(Scope::Group(GroupId(id))),
      "org" => Ok(Scope::Org(OrgId(id))),
      other => Err(ScopeParseError::UnknownKind(other.to_string())),
    }
  }
}

/// What an artifact is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
  /// Key-value pillar data. Servers only.
  Pillar,
  /// List of custom states included for the scope.
  CustomStateAssignment,
}

impl fmt::Display for Purpose {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Purpose::Pillar => f.write_str("pillar"),
      Purpose::CustomStateAssignment => f.write_str("custom-state-assignment"),
    }
  }
}
