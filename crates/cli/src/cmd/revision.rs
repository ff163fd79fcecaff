use std::collections::BTreeSet;

use anyhow::{Context as _, Result};
use saltgen_lib::reconcile::Event;
use saltgen_lib::revision::{NewRevision, RevisionMetadata, RevisionStore};
use saltgen_lib::types::{OrgId, Scope};
use serde::Serialize;

use crate::context::{Context, Overrides};
use crate::output::{self, OutputFormat, print_info, print_json};

/// Organization owning `scope`, from the inventory.
fn owning_org(ctx: &Context, scope: &Scope) -> Result<OrgId> {
  let org = match *scope {
    Scope::Server(id) => ctx.inventory.server(id).map(|s| s.org_id),
    Scope::Group(id) => ctx.inventory.group(id).map(|g| g.org_id),
    Scope::Org(id) => ctx.inventory.org(id).map(|o| o.id),
  };
  org.with_context(|| format!("{} is not in the inventory", scope))
}

pub fn cmd_commit(
  overrides: &Overrides,
  scope: Scope,
  states: BTreeSet<String>,
  actor: Option<&str>,
  output: OutputFormat,
) -> Result<()> {
  let ctx = Context::load(overrides)?;
  let org_id = owning_org(&ctx, &scope)?;

  let revision = ctx.store.commit(
    &scope,
    org_id,
    NewRevision {
      created_by: actor.map(str::to_string),
      custom_states: states,
      ..NewRevision::default()
    },
  )?;
  let number = revision.revision;

  let report = ctx.reconciler().handle(Event::CustomStateRevisionCommitted(revision))?;
  output::report(&report, &format!("Committed revision {} for {}", number, scope), output)
}

#[derive(Serialize)]
struct RevisionsOutput<'a> {
  scope: &'a Scope,
  revisions: Vec<RevisionMetadata>,
}

pub fn cmd_revisions(overrides: &Overrides, scope: Scope, output: OutputFormat) -> Result<()> {
  let store = RevisionStore::new(overrides.settings().revisions_dir());
  let revisions = store.list_revisions(&scope)?;

  if output.is_json() {
    return print_json(&RevisionsOutput {
      scope: &scope,
      revisions,
    });
  }

  if revisions.is_empty() {
    print_info(&format!("No revisions for {}", scope));
    return Ok(());
  }

  println!("{:<10} {:<12} {:<8} {:<8} BY", "REVISION", "CREATED", "STATES", "PACKAGES");
  for meta in &revisions {
    println!(
      "{:<10} {:<12} {:<8} {:<8} {}",
      meta.revision,
      meta.created_at,
      meta.custom_state_count,
      meta.package_state_count,
      meta.created_by.as_deref().unwrap_or("-")
    );
  }
  Ok(())
}
