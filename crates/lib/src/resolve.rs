//! Custom state name resolution.
//!
//! Revisions keep referencing custom states after those are soft-deleted so
//! history stays accurate. Resolution is the single place where such names,
//! and names an organization cannot see, are dropped before an assignment is
//! written.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::OrgId;

/// A named, organization-scoped custom state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomStateDefinition {
  pub org_id: OrgId,
  pub name: String,
  #[serde(default)]
  pub deleted: bool,
}

#[derive(Debug, Error)]
pub enum ResolveError {
  /// The backing lookup could not be consulted. Generation must fail rather
  /// than write unfiltered names.
  #[error("custom state lookup unavailable for org {org_id}: {message}")]
  Unavailable { org_id: OrgId, message: String },
}

/// Filters candidate state names down to the ones valid for an organization.
pub trait StateNameResolver {
  /// Return the subset of `candidates` naming non-deleted definitions visible
  /// to `org_id`. Unknown names are dropped silently.
  fn resolve(&self, org_id: OrgId, candidates: &BTreeSet<String>) -> Result<BTreeSet<String>, ResolveError>;
}

/// Source of custom state definitions.
pub trait CustomStateCatalog {
  /// All definitions owned by `org_id`, deleted ones included.
  fn definitions(&self, org_id: OrgId) -> Result<Vec<CustomStateDefinition>, ResolveError>;
}

/// Resolver backed by a [`CustomStateCatalog`].
#[derive(Debug, Clone)]
pub struct CatalogResolver<C> {
  catalog: C,
}

impl<C: CustomStateCatalog> CatalogResolver<C> {
  pub fn new(catalog: C) -> Self {
    Self { catalog }
  }
}

impl<C: CustomStateCatalog> StateNameResolver for CatalogResolver<C> {
  fn resolve(&self, org_id: OrgId, candidates: &BTreeSet<String>) -> Result<BTreeSet<String>, ResolveError> {
    if candidates.is_empty() {
      return Ok(BTreeSet::new());
    }

    let visible: BTreeSet<String> = self
      .catalog
      .definitions(org_id)?
      .into_iter()
      .filter(|def| def.org_id == org_id && !def.deleted)
      .map(|def| def.name)
      .collect();

    let resolved: BTreeSet<String> = candidates.intersection(&visible).cloned().collect();

    if resolved.len() != candidates.len() {
      let dropped: Vec<&String> = candidates.difference(&resolved).collect();
      debug!(org_id = %org_id, ?dropped, "dropped unresolvable custom states");
    }

    Ok(resolved)
  }
}

impl<T: StateNameResolver + ?Sized> StateNameResolver for &T {
  fn resolve(&self, org_id: OrgId, candidates: &BTreeSet<String>) -> Result<BTreeSet<String>, ResolveError> {
    (**self).resolve(org_id, candidates)
  }
}

impl<T: CustomStateCatalog + ?Sized> CustomStateCatalog for &T {
  fn definitions(&self, org_id: OrgId) -> Result<Vec<CustomStateDefinition>, ResolveError> {
    (**self).definitions(org_id)
  }
}
