//! File-backed revision storage.
//!
//! # Storage Layout
//!
//! ```text
//! {data_dir}/revisions/
//! └── <scope>/             # server_5, group_42, org_7
//!     ├── index.json       # RevisionIndex: metadata list + latest pointer
//!     └── <revision>.json  # ConfigurationRevision
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::RevisionProvider;
use super::types::{
  ConfigurationRevision, NewRevision, REVISION_INDEX_VERSION, RevisionError, RevisionIndex, RevisionMetadata,
  RevisionUsage, unix_now,
};
use crate::types::{OrgId, Scope};

/// Index file name.
const INDEX_FILENAME: &str = "index.json";

/// Manages revision history on disk.
///
/// Revisions are written once and never modified. Index updates use a
/// write-then-rename so a crash never leaves a torn index. Concurrent commits
/// for the same scope must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct RevisionStore {
  base_path: PathBuf,
}

impl RevisionStore {
  pub fn new(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
    }
  }

  fn scope_dir(&self, scope: &Scope) -> PathBuf {
    self.base_path.join(scope.dir_name())
  }

  fn index_path(&self, scope: &Scope) -> PathBuf {
    self.scope_dir(scope).join(INDEX_FILENAME)
  }

  fn revision_path(&self, scope: &Scope, revision: u64) -> PathBuf {
    self.scope_dir(scope).join(format!("{}.json", revision))
  }

  /// Load the index for a scope. Returns an empty index if none exists.
  pub fn load_index(&self, scope: &Scope) -> Result<RevisionIndex, RevisionError> {
    let index = match read_index(&self.index_path(scope))? {
      Some(index) => index,
      None => return Ok(RevisionIndex::new(*scope)),
    };

    if index.scope != *scope {
      return Err(RevisionError::ScopeMismatch {
        expected: *scope,
        found: index.scope,
      });
    }

    Ok(index)
  }

  /// Load a specific revision of a scope.
  pub fn load_revision(&self, scope: &Scope, revision: u64) -> Result<ConfigurationRevision, RevisionError> {
    let content = fs::read_to_string(self.revision_path(scope, revision)).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        RevisionError::NotFound {
          scope: *scope,
          revision,
        }
      } else {
        RevisionError::Read(e)
      }
    })?;

    serde_json::from_str(&content).map_err(RevisionError::Parse)
  }

  /// Revision metadata for a scope, oldest first.
  pub fn list_revisions(&self, scope: &Scope) -> Result<Vec<RevisionMetadata>, RevisionError> {
    Ok(self.load_index(scope)?.revisions)
  }

  /// Commit a new revision for `scope`, numbered one past the current latest.
  pub fn commit(&self, scope: &Scope, org_id: OrgId, new: NewRevision) -> Result<ConfigurationRevision, RevisionError> {
    let mut index = self.load_index(scope)?;

    let revision = ConfigurationRevision {
      scope: *scope,
      revision: index.next_revision(),
      org_id,
      created_at: unix_now(),
      created_by: new.created_by,
      custom_states: new.custom_states,
      package_states: new.package_states,
      pillar: new.pillar,
    };

    fs::create_dir_all(self.scope_dir(scope)).map_err(RevisionError::CreateDir)?;

    let content = serde_json::to_string_pretty(&revision).map_err(RevisionError::Serialize)?;
    write_atomic(&self.revision_path(scope, revision.revision), &content)?;

    index.add(revision.to_metadata());
    self.save_index(&index)?;

    info!(
      scope = %scope,
      revision = revision.revision,
      custom_states = revision.custom_states.len(),
      package_states = revision.package_states.len(),
      "revision committed"
    );
    Ok(revision)
  }

  /// Commit a copy of the latest revision, optionally dropping its package
  /// and custom states. Pillar overrides are always carried over.
  pub fn clone_latest(
    &self,
    scope: &Scope,
    org_id: OrgId,
    actor: Option<&str>,
    keep_packages: bool,
    keep_custom: bool,
  ) -> Result<ConfigurationRevision, RevisionError> {
    let mut new = NewRevision {
      created_by: actor.map(str::to_string),
      ..NewRevision::default()
    };

    if let Some(latest) = self.latest_revision(scope)? {
      new.pillar = latest.pillar;
      if keep_packages {
        new.package_states = latest.package_states;
      }
      if keep_custom {
        new.custom_states = latest.custom_states;
      }
    }

    self.commit(scope, org_id, new)
  }

  fn save_index(&self, index: &RevisionIndex) -> Result<(), RevisionError> {
    let content = serde_json::to_string_pretty(index).map_err(RevisionError::Serialize)?;
    write_atomic(&self.index_path(&index.scope), &content)
  }

  /// Indexes of every scope with history. Directories without an index are
  /// skipped; scopes whose index cannot be read are returned separately so
  /// one damaged scope does not hide the others.
  fn all_indexes(&self) -> Result<(Vec<RevisionIndex>, Vec<(Scope, RevisionError)>), RevisionError> {
    let entries = match fs::read_dir(&self.base_path) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((Vec::new(), Vec::new())),
      Err(e) => return Err(RevisionError::Read(e)),
    };

    let mut indexes = Vec::new();
    let mut unreadable = Vec::new();
    for entry in entries {
      let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
          warn!(dir = %self.base_path.display(), error = %e, "skipping unreadable revision entry");
          continue;
        }
      };
      let path = entry.path();
      if !path.is_dir() {
        continue;
      }
      let Some(scope) = path.file_name().and_then(|n| n.to_str()).and_then(scope_from_dir) else {
        debug!(path = %path.display(), "not a scope directory");
        continue;
      };

      match self.load_index(&scope) {
        Ok(index) if index.is_empty() => {}
        Ok(index) => indexes.push(index),
        Err(e) => {
          warn!(scope = %scope, error = %e, "skipping unreadable revision index");
          unreadable.push((scope, e));
        }
      }
    }

    indexes.sort_by_key(|index| index.scope);
    unreadable.sort_by_key(|(scope, _)| *scope);
    Ok((indexes, unreadable))
  }
}

impl RevisionProvider for RevisionStore {
  fn latest_revision(&self, scope: &Scope) -> Result<Option<ConfigurationRevision>, RevisionError> {
    match self.load_index(scope)?.latest {
      Some(revision) => Ok(Some(self.load_revision(scope, revision)?)),
      None => Ok(None),
    }
  }

  fn latest_revisions_by_custom_state_usage(
    &self,
    org_id: OrgId,
    state_name: &str,
  ) -> Result<RevisionUsage, RevisionError> {
    let (indexes, unreadable) = self.all_indexes()?;
    let mut usage = RevisionUsage {
      unreadable,
      ..RevisionUsage::default()
    };

    for index in indexes {
      let Some(latest) = index.latest else { continue };
      match self.load_revision(&index.scope, latest) {
        Ok(revision) if revision.org_id == org_id && revision.references(state_name) => usage.push(revision),
        Ok(_) => {}
        Err(e) => {
          warn!(scope = %index.scope, revision = latest, error = %e, "skipping unreadable revision");
          usage.unreadable.push((index.scope, e));
        }
      }
    }

    debug!(
      org_id = %org_id,
      state = state_name,
      matches = usage.len(),
      unreadable = usage.unreadable.len(),
      "custom state usage"
    );
    Ok(usage)
  }

  fn create_empty_revision(
    &self,
    scope: &Scope,
    org_id: OrgId,
    actor: Option<&str>,
  ) -> Result<ConfigurationRevision, RevisionError> {
    self.clone_latest(scope, org_id, actor, false, false)
  }
}

/// Inverse of [`Scope::dir_name`]: `group_42` is `group:42`.
fn scope_from_dir(name: &str) -> Option<Scope> {
  let scope: Scope = name.replacen('_', ":", 1).parse().ok()?;
  (scope.dir_name() == name).then_some(scope)
}

fn read_index(path: &Path) -> Result<Option<RevisionIndex>, RevisionError> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(RevisionError::Read(e)),
  };

  let index: RevisionIndex = serde_json::from_str(&content).map_err(RevisionError::Parse)?;

  if index.version != REVISION_INDEX_VERSION {
    return Err(RevisionError::UnsupportedVersion(index.version));
  }

  Ok(Some(index))
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, content: &str) -> Result<(), RevisionError> {
  let mut temp_name = path.as_os_str().to_owned();
  temp_name.push(".tmp");
  let temp_path = PathBuf::from(temp_name);

  fs::write(&temp_path, content).map_err(RevisionError::Write)?;
  fs::rename(&temp_path, path).map_err(RevisionError::Write)?;
  Ok(())
}
