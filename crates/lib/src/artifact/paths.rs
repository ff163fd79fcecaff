//! Artifact path resolution.
//!
//! # Layout
//!
//! ```text
//! {pillar_root}/
//! └── server_<id>.<ext>        # pillar, servers only
//! {sls_root}/custom/
//! ├── custom_<id>.<ext>        # server assignment
//! ├── group_<id>.<ext>         # group assignment
//! └── org_<id>.<ext>           # org assignment
//! ```
//!
//! Paths are never recorded anywhere; they are recomputed on every access, so
//! resolution must stay a pure function of scope and purpose.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consts::CUSTOM_STATES_DIR;
use crate::types::{GroupId, OrgId, Purpose, Scope, ServerId};

/// Purpose requested for a scope that cannot carry it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{purpose} artifacts are not defined for {scope}")]
pub struct InvalidScopeError {
  pub scope: Scope,
  pub purpose: Purpose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
  pillar_root: PathBuf,
  custom_dir: PathBuf,
  extension: String,
}

impl ArtifactPaths {
  pub fn new(pillar_root: impl Into<PathBuf>, sls_root: impl AsRef<Path>, extension: impl Into<String>) -> Self {
    Self {
      pillar_root: pillar_root.into(),
      custom_dir: sls_root.as_ref().join(CUSTOM_STATES_DIR),
      extension: extension.into(),
    }
  }

  pub fn pillar_root(&self) -> &Path {
    &self.pillar_root
  }

  /// Directory holding custom state assignments.
  pub fn custom_dir(&self) -> &Path {
    &self.custom_dir
  }

  /// Resolve the artifact path for a scope and purpose.
  ///
  /// # Errors
  ///
  /// Returns [`InvalidScopeError`] when asking for a pillar of anything but a
  /// server.
  pub fn resolve(&self, scope: &Scope, purpose: Purpose) -> Result<PathBuf, InvalidScopeError> {
    match (purpose, scope) {
      (Purpose::Pillar, Scope::Server(id)) => Ok(self.pillar_path(*id)),
      (Purpose::Pillar, _) => Err(InvalidScopeError {
        scope: *scope,
        purpose,
      }),
      (Purpose::CustomStateAssignment, _) => Ok(self.assignment_path(scope)),
    }
  }

  pub fn pillar_path(&self, server: ServerId) -> PathBuf {
    self.pillar_root.join(self.file_name(&format!("server_{}", server)))
  }

  pub fn assignment_path(&self, scope: &Scope) -> PathBuf {
    self.custom_dir.join(self.file_name(&scope.assignment_stem()))
  }

  /// Map a path laid out by [`resolve`](Self::resolve) back to its scope and
  /// purpose. Returns `None` for anything this resolver would not produce,
  /// including ids spelled differently (`org_007`, `org_+7`).
  pub fn parse(&self, path: &Path) -> Option<(Scope, Purpose)> {
    let parent = path.parent()?;
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(&format!(".{}", self.extension))?;
    let (prefix, id) = stem.split_once('_')?;
    let id: u64 = id.parse().ok()?;

    let (scope, purpose) = if parent == self.pillar_root {
      match prefix {
        "server" => (Scope::Server(ServerId(id)), Purpose::Pillar),
        _ => return None,
      }
    } else if parent == self.custom_dir {
      let scope = match prefix {
        "custom" => Scope::Server(ServerId(id)),
        "group" => Scope::Group(GroupId(id)),
        "org" => Scope::Org(OrgId(id)),
        _ => return None,
      };
      (scope, Purpose::CustomStateAssignment)
    } else {
      return None;
    };

    let resolved = self.resolve(&scope, purpose).ok()?;
    (resolved.as_path() == path).then_some((scope, purpose))
  }

  fn file_name(&self, stem: &str) -> String {
    format!("{}.{}", stem, self.extension)
  }
}
