//! Configuration revisions.
//!
//! A revision is an immutable, numbered snapshot of what is assigned to a
//! scope. Only the latest revision of a scope drives artifact generation;
//! older ones are kept as history.

mod store;
mod types;

pub use store::RevisionStore;
pub use types::{
  ConfigurationRevision, NewRevision, PackageState, PackageStateKind, REVISION_INDEX_VERSION, RevisionError,
  RevisionIndex, RevisionMetadata, RevisionUsage,
};

use crate::types::{OrgId, Scope};

/// Read side of revision history, plus the one write the reconciler needs.
pub trait RevisionProvider {
  /// Latest revision committed for `scope`, if any.
  fn latest_revision(&self, scope: &Scope) -> Result<Option<ConfigurationRevision>, RevisionError>;

  /// Latest revisions within `org_id` whose custom states reference
  /// `state_name`, grouped by scope kind.
  fn latest_revisions_by_custom_state_usage(
    &self,
    org_id: OrgId,
    state_name: &str,
  ) -> Result<RevisionUsage, RevisionError>;

  /// Persist a new revision for `scope` carrying no custom or package states.
  fn create_empty_revision(
    &self,
    scope: &Scope,
    org_id: OrgId,
    actor: Option<&str>,
  ) -> Result<ConfigurationRevision, RevisionError>;
}

impl<T: RevisionProvider + ?Sized> RevisionProvider for &T {
  fn latest_revision(&self, scope: &Scope) -> Result<Option<ConfigurationRevision>, RevisionError> {
    (**self).latest_revision(scope)
  }

  fn latest_revisions_by_custom_state_usage(
    &self,
    org_id: OrgId,
    state_name: &str,
  ) -> Result<RevisionUsage, RevisionError> {
    (**self).latest_revisions_by_custom_state_usage(org_id, state_name)
  }

  fn create_empty_revision(
    &self,
    scope: &Scope,
    org_id: OrgId,
    actor: Option<&str>,
  ) -> Result<ConfigurationRevision, RevisionError> {
    (**self).create_empty_revision(scope, org_id, actor)
  }
}
