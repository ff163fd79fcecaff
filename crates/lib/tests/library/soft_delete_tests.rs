//! Soft-deleted custom states never reach generated assignments.

use std::collections::BTreeSet;

use saltgen_lib::reconcile::{Event, ReconcileError, ScopeReconciler};
use saltgen_lib::resolve::{ResolveError, StateNameResolver};
use saltgen_lib::revision::NewRevision;
use saltgen_lib::artifact::FsArtifactWriter;
use saltgen_lib::types::{OrgId, Scope, ServerId};

use super::common::{Fixture, fleet};

const WEB1: ServerId = ServerId(1000010000);

fn commit(fx: &Fixture, scope: Scope, list: &[&str]) -> saltgen_lib::revision::ConfigurationRevision {
  fx.store
    .commit(
      &scope,
      OrgId(7),
      NewRevision {
        custom_states: list.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
      },
    )
    .unwrap()
}

#[test]
fn deleted_and_unknown_names_are_dropped() {
  let fx = Fixture::new();
  let mut inventory = fleet();
  inventory.delete_custom_state(OrgId(7), "db").unwrap();
  let reconciler = fx.reconciler(&inventory);

  let revision = commit(&fx, Scope::Server(WEB1), &["base", "db", "ghost"]);
  reconciler
    .handle(Event::CustomStateRevisionCommitted(revision))
    .unwrap();

  assert_eq!(
    fx.read(fx.paths.assignment_path(&Scope::Server(WEB1))),
    "include:\n- base\n"
  );
}

#[test]
fn deletion_propagates_to_every_referencing_scope() {
  let fx = Fixture::new();
  let mut inventory = fleet();
  commit(&fx, Scope::Server(WEB1), &["base", "db"]);
  commit(&fx, Scope::Org(OrgId(7)), &["db"]);
  fx.reconciler(&inventory).resync().unwrap();
  assert_eq!(
    fx.read(fx.paths.assignment_path(&Scope::Org(OrgId(7)))),
    "include:\n- db\n"
  );

  assert!(inventory.delete_custom_state(OrgId(7), "db").unwrap());
  let report = fx
    .reconciler(&inventory)
    .handle(Event::CustomStateDefinitionChanged {
      org_id: OrgId(7),
      state_name: "db".to_string(),
    })
    .unwrap();

  assert_eq!(report.written.len(), 2);
  assert_eq!(
    fx.read(fx.paths.assignment_path(&Scope::Server(WEB1))),
    "include:\n- base\n"
  );
  assert_eq!(
    fx.read(fx.paths.assignment_path(&Scope::Org(OrgId(7)))),
    "include: []\n"
  );
}

struct Unreachable;

impl StateNameResolver for Unreachable {
  fn resolve(&self, org_id: OrgId, _: &BTreeSet<String>) -> Result<BTreeSet<String>, ResolveError> {
    Err(ResolveError::Unavailable {
      org_id,
      message: "timeout".to_string(),
    })
  }
}

#[test]
fn unavailable_lookup_keeps_previous_artifact() {
  let fx = Fixture::new();
  let inventory = fleet();
  fx.reconciler(&inventory).resync().unwrap();
  let path = fx.paths.assignment_path(&Scope::Server(WEB1));
  let before = fx.read(&path);

  let reconciler = ScopeReconciler::new(fx.paths.clone(), &inventory, &fx.store, Unreachable, FsArtifactWriter);
  let revision = commit(&fx, Scope::Server(WEB1), &["base"]);
  let result = reconciler.handle(Event::CustomStateRevisionCommitted(revision));

  assert!(matches!(result, Err(ReconcileError::Resolve(_))));
  assert_eq!(fx.read(&path), before);
}
