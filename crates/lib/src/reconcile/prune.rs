use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{ReconcileError, ReconcileReport, ScopeReconciler};
use crate::artifact::ArtifactWriter;
use crate::resolve::StateNameResolver;
use crate::revision::RevisionProvider;
use crate::topology::{PackageStateTrigger, TopologyQuery};
use crate::types::Scope;

impl<T, R, S, W, P> ScopeReconciler<T, R, S, W, P>
where
  T: TopologyQuery,
  R: RevisionProvider,
  S: StateNameResolver,
  W: ArtifactWriter,
  P: PackageStateTrigger,
{
  /// Remove artifacts whose scope no longer exists or is no longer
  /// fleet-managed.
  ///
  /// Only files matching the generated layout are considered; anything else
  /// in the artifact directories is left alone. With `dry_run`, nothing is
  /// removed and [`ReconcileReport::removed`] lists what would be.
  pub fn prune(&self, dry_run: bool) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let mut scanned = 0usize;

    for dir in [self.paths.pillar_root(), self.paths.custom_dir()] {
      for path in artifact_files(dir) {
        scanned += 1;
        let Some((scope, purpose)) = self.paths.parse(&path) else {
          debug!(path = %path.display(), "not a generated artifact, leaving in place");
          continue;
        };

        match self.scope_alive(&scope) {
          Ok(true) => continue,
          Ok(false) => {}
          Err(e) => {
            warn!(scope = %scope, error = %e, "cannot determine whether scope exists, keeping artifact");
            report.fail(scope, e);
            continue;
          }
        }

        debug!(path = %path.display(), scope = %scope, purpose = %purpose, "removing stale artifact");
        if dry_run {
          report.removed.push(path);
          continue;
        }

        report.removals_attempted += 1;
        match self.writer.remove(&path) {
          Ok(_) => report.removed.push(path),
          Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to remove stale artifact");
            report.fail(scope, e.into());
          }
        }
      }
    }

    info!(
      scanned,
      removed = report.removed.len(),
      failures = report.failures.len(),
      dry_run,
      "prune complete"
    );
    report
  }

  fn scope_alive(&self, scope: &Scope) -> Result<bool, ReconcileError> {
    Ok(match *scope {
      Scope::Server(id) => self
        .topology
        .lookup_server(id)?
        .is_some_and(|server| self.topology.is_fleet_managed(&server)),
      Scope::Group(id) => self.topology.lookup_group(id)?.is_some(),
      Scope::Org(id) => self.topology.lookup_org(id)?.is_some(),
    })
  }
}

/// Regular files directly inside `dir`, sorted. A missing directory yields
/// nothing.
fn artifact_files(dir: &Path) -> Vec<PathBuf> {
  if !dir.exists() {
    return Vec::new();
  }

  WalkDir::new(dir)
    .min_depth(1)
    .max_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .map(|e| e.into_path())
    .collect()
}
