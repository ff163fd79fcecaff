//! Removal commands.
//!
//! Artifacts are removed before the inventory is updated, so a failed removal
//! leaves the entity in place and the command can simply be rerun. Removing an
//! org also removes the assignments of its groups, since the inventory drops
//! them with the org.

use anyhow::{Context as _, Result};
use saltgen_lib::reconcile::{Event, ScopeFailure};
use saltgen_lib::topology::TopologyQuery;
use saltgen_lib::types::{GroupId, OrgId, Scope, ServerId};

use crate::context::{Context, Overrides};
use crate::output::{self, OutputFormat, print_info};
use crate::prompts::confirm_removal;

pub fn cmd_remove_server(overrides: &Overrides, id: ServerId, output: OutputFormat) -> Result<()> {
  let mut ctx = Context::load(overrides)?;
  let server = ctx
    .inventory
    .server(id)
    .cloned()
    .with_context(|| format!("Server {} is not in the inventory", id))?;

  let report = ctx.reconciler().handle(Event::ServerRemoved(server.clone()))?;

  ctx.inventory.remove_server(id);
  ctx.save_inventory()?;

  output::report(&report, &format!("Removed server {}", server.name), output)
}

pub fn cmd_remove_group(overrides: &Overrides, id: GroupId, output: OutputFormat) -> Result<()> {
  let mut ctx = Context::load(overrides)?;
  let group = ctx
    .inventory
    .group(id)
    .cloned()
    .with_context(|| format!("Group {} is not in the inventory", id))?;

  let report = ctx.reconciler().handle(Event::GroupRemoved(group.clone()))?;

  ctx.inventory.remove_group(id);
  ctx.save_inventory()?;

  output::report(&report, &format!("Removed group {}", group.name), output)
}

pub fn cmd_remove_org(overrides: &Overrides, id: OrgId, force: bool, output: OutputFormat) -> Result<()> {
  let mut ctx = Context::load(overrides)?;
  let org = ctx
    .inventory
    .org(id)
    .cloned()
    .with_context(|| format!("Org {} is not in the inventory", id))?;

  if !confirm_removal(&format!("org {} ({})", org.name, id), force)? {
    print_info("Aborted");
    return Ok(());
  }

  let reconciler = ctx.reconciler();
  let mut report = reconciler.handle(Event::OrgRemoved(id))?;
  for group in ctx.inventory.list_groups_in_org(id)? {
    let scope = Scope::Group(group.id);
    match reconciler.handle(Event::GroupRemoved(group)) {
      Ok(removed) => report.merge(removed),
      Err(error) => report.failures.push(ScopeFailure { scope, error }),
    }
  }
  if !report.is_success() {
    return output::report(&report, "", output).with_context(|| format!("Org {} kept in the inventory", id));
  }

  ctx.inventory.remove_org(id);
  ctx.save_inventory()?;

  output::report(&report, &format!("Removed org {}", org.name), output)
}
