//! Scope reconciliation.
//!
//! The reconciler turns topology events into artifact writes and removals.
//! It keeps no state of its own: every reaction recomputes full artifact
//! content from current domain state and overwrites, so replaying an event
//! yields byte-identical files.
//!
//! # Error Policy
//!
//! Single-scope reactions return the first error. Batch reactions
//! (`OrgRemoved`, `CustomStateDefinitionChanged`, [`ScopeReconciler::resync`],
//! [`ScopeReconciler::prune`]) attempt every member, log failures and collect
//! them in [`ReconcileReport::failures`].
//!
//! Nothing here retries, and a failed write never rolls back the domain
//! change that triggered it. The next successful event for the scope heals
//! the artifact.

mod prune;
mod types;

pub use types::{Event, ReconcileError, ReconcileReport, ScopeFailure};

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::artifact::{ArtifactPaths, ArtifactWriter, CustomStateAssignment, Pillar};
use crate::resolve::StateNameResolver;
use crate::revision::{ConfigurationRevision, RevisionProvider};
use crate::topology::{NoPackageStates, PackageStateTrigger, TopologyQuery};
use crate::types::{OrgId, Purpose, Scope, Server, ServerGroup};

/// Drives artifact generation from topology events.
///
/// Collaborators are injected; references work too, since every collaborator
/// trait is implemented for `&T`.
#[derive(Debug)]
pub struct ScopeReconciler<T, R, S, W, P = NoPackageStates> {
  paths: ArtifactPaths,
  topology: T,
  revisions: R,
  resolver: S,
  writer: W,
  packages: P,
}

impl<T, R, S, W> ScopeReconciler<T, R, S, W>
where
  T: TopologyQuery,
  R: RevisionProvider,
  S: StateNameResolver,
  W: ArtifactWriter,
{
  pub fn new(paths: ArtifactPaths, topology: T, revisions: R, resolver: S, writer: W) -> Self {
    Self {
      paths,
      topology,
      revisions,
      resolver,
      writer,
      packages: NoPackageStates,
    }
  }
}

impl<T, R, S, W, P> ScopeReconciler<T, R, S, W, P>
where
  T: TopologyQuery,
  R: RevisionProvider,
  S: StateNameResolver,
  W: ArtifactWriter,
  P: PackageStateTrigger,
{
  /// Replace the package state trigger fired after migrations.
  pub fn with_package_trigger<Q: PackageStateTrigger>(self, packages: Q) -> ScopeReconciler<T, R, S, W, Q> {
    ScopeReconciler {
      paths: self.paths,
      topology: self.topology,
      revisions: self.revisions,
      resolver: self.resolver,
      writer: self.writer,
      packages,
    }
  }

  pub fn paths(&self) -> &ArtifactPaths {
    &self.paths
  }

  /// React to a single event.
  pub fn handle(&self, event: Event) -> Result<ReconcileReport, ReconcileError> {
    debug!(event = event.name(), "handling event");
    match event {
      Event::ServerRegistered(server) => self.register_server(&server),
      Event::ServerRemoved(server) => self.remove_server(&server),
      Event::GroupRemoved(group) => self.remove_group(&group),
      Event::OrgRemoved(org_id) => Ok(self.remove_org(org_id)),
      Event::CustomStateRevisionCommitted(revision) => self.revision_committed(&revision),
      Event::CustomStateDefinitionChanged { org_id, state_name } => self.definition_changed(org_id, &state_name),
      Event::ServerMigrated { server, new_org, actor } => self.migrate_server(&server, new_org, actor.as_deref()),
    }
  }

  /// Write the pillar and an empty assignment for a newly registered server.
  /// Servers that are not fleet-managed are left alone.
  pub fn register_server(&self, server: &Server) -> Result<ReconcileReport, ReconcileError> {
    let mut report = ReconcileReport::default();
    if !self.topology.is_fleet_managed(server) {
      debug!(server = %server.id, "not fleet-managed, skipping registration");
      return Ok(report);
    }

    info!(server = %server.id, name = %server.name, "registering server");
    report.written.push(self.write_pillar(server, server.org_id)?);
    report.written.push(self.write_assignment(
      &Scope::Server(server.id),
      server.org_id,
      &BTreeSet::new(),
    )?);
    Ok(report)
  }

  /// Remove a managed server's pillar and assignment. Both removals are
  /// attempted even if the first fails.
  pub fn remove_server(&self, server: &Server) -> Result<ReconcileReport, ReconcileError> {
    let mut report = ReconcileReport::default();
    self.remove_server_into(server, &mut report);
    report.into_result()
  }

  pub fn remove_group(&self, group: &ServerGroup) -> Result<ReconcileReport, ReconcileError> {
    info!(group = %group.id, "removing group artifacts");
    let mut report = ReconcileReport::default();
    self.remove_artifact(&Scope::Group(group.id), Purpose::CustomStateAssignment, &mut report);
    report.into_result()
  }

  /// Remove every managed server of an organization, then the organization's
  /// own assignment. Server failures are collected and never prevent the
  /// organization's removal.
  pub fn remove_org(&self, org_id: OrgId) -> ReconcileReport {
    info!(org = %org_id, "removing org artifacts");
    let mut report = ReconcileReport::default();
    let org_scope = Scope::Org(org_id);

    match self.topology.list_servers_in_org(org_id) {
      Ok(servers) => {
        for server in servers.iter().filter(|s| self.topology.is_fleet_managed(s)) {
          self.remove_server_into(server, &mut report);
        }
      }
      Err(e) => {
        warn!(org = %org_id, error = %e, "failed to list servers of org");
        report.fail(org_scope, e.into());
      }
    }

    self.remove_artifact(&org_scope, Purpose::CustomStateAssignment, &mut report);

    if !report.is_success() {
      warn!(org = %org_id, failures = report.failures.len(), "org removal finished with failures");
    }
    report
  }

  /// Regenerate the assignment of the revision's scope from that revision.
  pub fn revision_committed(&self, revision: &ConfigurationRevision) -> Result<ReconcileReport, ReconcileError> {
    let mut report = ReconcileReport::default();
    if let Some(path) = self.regenerate_from_revision(revision)? {
      report.written.push(path);
    }
    Ok(report)
  }

  /// Regenerate every assignment in `org_id` whose latest revision references
  /// `state_name`, so edits and soft-deletes take effect.
  pub fn definition_changed(&self, org_id: OrgId, state_name: &str) -> Result<ReconcileReport, ReconcileError> {
    let mut usage = self.revisions.latest_revisions_by_custom_state_usage(org_id, state_name)?;
    info!(org = %org_id, state = state_name, scopes = usage.len(), "regenerating custom state users");

    let mut report = ReconcileReport::default();
    for (scope, e) in std::mem::take(&mut usage.unreadable) {
      report.fail(scope, e.into());
    }
    for revision in usage.into_iter_ordered() {
      match self.regenerate_from_revision(&revision) {
        Ok(Some(path)) => report.written.push(path),
        Ok(None) => {}
        Err(e) => {
          warn!(scope = %revision.scope, error = %e, "failed to regenerate custom state assignment");
          report.fail(revision.scope, e);
        }
      }
    }
    Ok(report)
  }

  /// Reset a server moved to `new_org`: commit an empty revision, rewrite
  /// pillar and assignment under the new organization, then hand package
  /// states to the trigger.
  pub fn migrate_server(
    &self,
    server: &Server,
    new_org: OrgId,
    actor: Option<&str>,
  ) -> Result<ReconcileReport, ReconcileError> {
    info!(server = %server.id, from = %server.org_id, to = %new_org, "migrating server");
    let scope = Scope::Server(server.id);
    let revision = self.revisions.create_empty_revision(&scope, new_org, actor)?;

    let migrated = Server {
      org_id: new_org,
      ..server.clone()
    };

    let mut report = ReconcileReport::default();
    if self.topology.is_fleet_managed(&migrated) {
      report.written.push(self.write_pillar(&migrated, new_org)?);
      report
        .written
        .push(self.write_assignment(&scope, new_org, &revision.custom_states)?);
    } else {
      debug!(server = %server.id, "not fleet-managed, no artifacts to regenerate");
    }

    self.packages.regenerate_package_state(&migrated);
    Ok(report)
  }

  /// Regenerate every artifact from current domain state.
  ///
  /// Managed servers get their pillar and an assignment from their latest
  /// revision; groups and organizations get an assignment from theirs. Scopes
  /// without history get an empty assignment.
  pub fn resync(&self) -> Result<ReconcileReport, ReconcileError> {
    let orgs = self.topology.list_orgs()?;
    info!(orgs = orgs.len(), "resyncing all artifacts");

    let mut report = ReconcileReport::default();
    for org in orgs {
      match self.topology.list_servers_in_org(org.id) {
        Ok(servers) => {
          for server in servers.iter().filter(|s| self.topology.is_fleet_managed(s)) {
            let scope = Scope::Server(server.id);
            match self.resync_server(server) {
              Ok(written) => report.written.extend(written),
              Err(e) => {
                warn!(scope = %scope, error = %e, "resync failed");
                report.fail(scope, e);
              }
            }
          }
        }
        Err(e) => report.fail(Scope::Org(org.id), e.into()),
      }

      match self.topology.list_groups_in_org(org.id) {
        Ok(groups) => {
          for group in groups {
            let scope = Scope::Group(group.id);
            match self.resync_assignment(&scope, org.id) {
              Ok(path) => report.written.push(path),
              Err(e) => {
                warn!(scope = %scope, error = %e, "resync failed");
                report.fail(scope, e);
              }
            }
          }
        }
        Err(e) => report.fail(Scope::Org(org.id), e.into()),
      }

      let scope = Scope::Org(org.id);
      match self.resync_assignment(&scope, org.id) {
        Ok(path) => report.written.push(path),
        Err(e) => {
          warn!(scope = %scope, error = %e, "resync failed");
          report.fail(scope, e);
        }
      }
    }

    Ok(report)
  }

  fn resync_server(&self, server: &Server) -> Result<Vec<PathBuf>, ReconcileError> {
    let pillar = self.write_pillar(server, server.org_id)?;
    let assignment = self.resync_assignment(&Scope::Server(server.id), server.org_id)?;
    Ok(vec![pillar, assignment])
  }

  fn resync_assignment(&self, scope: &Scope, org_id: OrgId) -> Result<PathBuf, ReconcileError> {
    let states = self
      .revisions
      .latest_revision(scope)?
      .map(|revision| revision.custom_states)
      .unwrap_or_default();
    self.write_assignment(scope, org_id, &states)
  }

  /// Regenerate the assignment for a revision's scope, resolving against the
  /// scope's current organization. Returns `None` for unmanaged servers.
  fn regenerate_from_revision(&self, revision: &ConfigurationRevision) -> Result<Option<PathBuf>, ReconcileError> {
    let org_id = match revision.scope {
      Scope::Server(id) => {
        let server = self
          .topology
          .lookup_server(id)?
          .ok_or(ReconcileError::UnknownServer(id))?;
        if !self.topology.is_fleet_managed(&server) {
          debug!(server = %id, "not fleet-managed, skipping custom state assignment");
          return Ok(None);
        }
        server.org_id
      }
      Scope::Group(id) => {
        self
          .topology
          .lookup_group(id)?
          .ok_or(ReconcileError::UnknownGroup(id))?
          .org_id
      }
      Scope::Org(id) => {
        self.topology.lookup_org(id)?.ok_or(ReconcileError::UnknownOrg(id))?.id
      }
    };

    debug!(scope = %revision.scope, revision = revision.revision, "generating custom state assignment");
    self
      .write_assignment(&revision.scope, org_id, &revision.custom_states)
      .map(Some)
  }

  fn write_pillar(&self, server: &Server, org_id: OrgId) -> Result<PathBuf, ReconcileError> {
    let groups = self
      .topology
      .list_managed_groups(server)?
      .into_iter()
      .filter(|group| group.org_id == org_id)
      .map(|group| group.id);
    let pillar = Pillar::new(org_id, groups);

    let path = self.paths.resolve(&Scope::Server(server.id), Purpose::Pillar)?;
    debug!(server = %server.id, org = %org_id, groups = ?pillar.group_id, "generating pillar");
    self.writer.write(&path, &pillar.into())?;
    Ok(path)
  }

  /// Resolve `candidates` for the organization and write the result. Names
  /// are never written without going through the resolver.
  fn write_assignment(
    &self,
    scope: &Scope,
    org_id: OrgId,
    candidates: &BTreeSet<String>,
  ) -> Result<PathBuf, ReconcileError> {
    let resolved = self.resolver.resolve(org_id, candidates)?;
    let path = self.paths.resolve(scope, Purpose::CustomStateAssignment)?;
    self.writer.write(&path, &CustomStateAssignment::new(resolved).into())?;
    Ok(path)
  }

  fn remove_server_into(&self, server: &Server, report: &mut ReconcileReport) {
    if !self.topology.is_fleet_managed(server) {
      debug!(server = %server.id, "not fleet-managed, nothing to remove");
      return;
    }

    info!(server = %server.id, name = %server.name, "removing server artifacts");
    let scope = Scope::Server(server.id);
    self.remove_artifact(&scope, Purpose::Pillar, report);
    self.remove_artifact(&scope, Purpose::CustomStateAssignment, report);
  }

  fn remove_artifact(&self, scope: &Scope, purpose: Purpose, report: &mut ReconcileReport) {
    let path = match self.paths.resolve(scope, purpose) {
      Ok(path) => path,
      Err(e) => {
        report.fail(*scope, e.into());
        return;
      }
    };

    report.removals_attempted += 1;
    match self.writer.remove(&path) {
      Ok(_) => report.removed.push(path),
      Err(e) => {
        warn!(scope = %scope, purpose = %purpose, error = %e, "failed to remove artifact");
        report.fail(*scope, e.into());
      }
    }
  }
}
