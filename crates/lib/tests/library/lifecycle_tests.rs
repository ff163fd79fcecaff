//! Artifact lifecycle against the real filesystem.

use std::collections::BTreeSet;

use saltgen_lib::reconcile::Event;
use saltgen_lib::revision::{NewRevision, RevisionProvider};
use saltgen_lib::types::{GroupId, OrgId, Scope, ServerId};

use super::common::{Fixture, fleet};

const WEB1: ServerId = ServerId(1000010000);
const LEGACY: ServerId = ServerId(1000010001);

fn states(list: &[&str]) -> BTreeSet<String> {
  list.iter().map(|s| s.to_string()).collect()
}

mod registration {
  use super::*;

  #[test]
  fn writes_both_artifacts_for_managed_servers() {
    let fx = Fixture::new();
    let inventory = fleet();
    let reconciler = fx.reconciler(&inventory);

    reconciler
      .handle(Event::ServerRegistered(inventory.server(WEB1).cloned().unwrap()))
      .unwrap();

    assert_eq!(fx.read(fx.paths.pillar_path(WEB1)), "org_id: 7\ngroup_id:\n- 42\n");
    assert_eq!(
      fx.read(fx.paths.assignment_path(&Scope::Server(WEB1))),
      "include: []\n"
    );
  }

  #[test]
  fn unmanaged_servers_leave_no_trace() {
    let fx = Fixture::new();
    let inventory = fleet();
    let reconciler = fx.reconciler(&inventory);
    let legacy = inventory.server(LEGACY).cloned().unwrap();

    reconciler.handle(Event::ServerRegistered(legacy.clone())).unwrap();
    reconciler.handle(Event::ServerRemoved(legacy)).unwrap();

    assert!(fx.artifacts().is_empty());
  }
}

mod idempotence {
  use super::*;

  #[test]
  fn replaying_events_leaves_identical_bytes() {
    let fx = Fixture::new();
    let inventory = fleet();
    let reconciler = fx.reconciler(&inventory);
    let revision = fx
      .store
      .commit(
        &Scope::Group(GroupId(42)),
        OrgId(7),
        NewRevision {
          custom_states: states(&["db", "base"]),
          ..Default::default()
        },
      )
      .unwrap();

    let events = || {
      vec![
        Event::ServerRegistered(inventory.server(WEB1).cloned().unwrap()),
        Event::CustomStateRevisionCommitted(revision.clone()),
      ]
    };

    for event in events() {
      reconciler.handle(event).unwrap();
    }
    let first = fx.artifacts();

    for event in events() {
      reconciler.handle(event).unwrap();
    }
    assert_eq!(fx.artifacts(), first);
    assert_eq!(
      fx.read(fx.paths.assignment_path(&Scope::Group(GroupId(42)))),
      "include:\n- base\n- db\n"
    );
  }

  #[test]
  fn resync_twice_is_stable() {
    let fx = Fixture::new();
    let inventory = fleet();
    let reconciler = fx.reconciler(&inventory);

    reconciler.resync().unwrap();
    let first = fx.artifacts();
    reconciler.resync().unwrap();

    assert_eq!(fx.artifacts(), first);
    // 3 managed servers x 2, groups 42 and 90, orgs 7 and 9
    assert_eq!(first.len(), 10);
  }
}

mod removal {
  use super::*;

  #[test]
  fn org_removal_removes_servers_then_org() {
    let fx = Fixture::new();
    let inventory = fleet();
    let reconciler = fx.reconciler(&inventory);
    reconciler.resync().unwrap();

    let report = reconciler.handle(Event::OrgRemoved(OrgId(7))).unwrap();

    assert_eq!(report.removals_attempted, 2 * 2 + 1);
    assert!(report.is_success());

    let remaining: Vec<_> = fx.artifacts().into_iter().map(|(p, _)| p).collect();
    assert_eq!(
      remaining,
      vec![
        fx.paths.pillar_path(ServerId(1000010003)),
        fx.paths.assignment_path(&Scope::Server(ServerId(1000010003))),
        fx.paths.assignment_path(&Scope::Group(GroupId(42))),
        fx.paths.assignment_path(&Scope::Group(GroupId(90))),
        fx.paths.assignment_path(&Scope::Org(OrgId(9))),
      ]
    );
  }

  #[test]
  fn group_removal_without_artifact_is_a_no_op() {
    let fx = Fixture::new();
    let inventory = fleet();
    let reconciler = fx.reconciler(&inventory);

    let group = inventory.group(GroupId(42)).cloned().unwrap();
    let report = reconciler.handle(Event::GroupRemoved(group)).unwrap();

    assert!(report.is_success());
    assert!(fx.artifacts().is_empty());
  }
}

mod migration {
  use super::*;

  #[test]
  fn resets_revision_and_artifacts() {
    let fx = Fixture::new();
    let mut inventory = fleet();
    fx.store
      .commit(
        &Scope::Server(WEB1),
        OrgId(7),
        NewRevision {
          custom_states: states(&["base"]),
          ..Default::default()
        },
      )
      .unwrap();
    fx.reconciler(&inventory).resync().unwrap();

    let before = inventory.server(WEB1).cloned().unwrap();
    inventory.move_server(WEB1, OrgId(9)).unwrap();
    let reconciler = fx.reconciler(&inventory);
    reconciler
      .handle(Event::ServerMigrated {
        server: before,
        new_org: OrgId(9),
        actor: None,
      })
      .unwrap();

    assert_eq!(fx.read(fx.paths.pillar_path(WEB1)), "org_id: 9\ngroup_id: []\n");
    assert_eq!(
      fx.read(fx.paths.assignment_path(&Scope::Server(WEB1))),
      "include: []\n"
    );

    let history = fx.store.list_revisions(&Scope::Server(WEB1)).unwrap();
    assert_eq!(history.len(), 2);
    let latest = fx.store.latest_revision(&Scope::Server(WEB1)).unwrap().unwrap();
    assert_eq!(latest.org_id, OrgId(9));
    assert!(latest.custom_states.is_empty());
  }
}
