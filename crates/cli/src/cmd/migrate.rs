use anyhow::{Context as _, Result};
use saltgen_lib::reconcile::Event;
use saltgen_lib::types::{OrgId, ServerId};

use crate::context::{Context, Overrides};
use crate::output::{self, OutputFormat};

pub fn cmd_migrate(
  overrides: &Overrides,
  id: ServerId,
  new_org: OrgId,
  actor: Option<String>,
  output: OutputFormat,
) -> Result<()> {
  let mut ctx = Context::load(overrides)?;
  let server = ctx
    .inventory
    .server(id)
    .cloned()
    .with_context(|| format!("Server {} is not in the inventory", id))?;

  ctx.inventory.move_server(id, new_org)?;
  ctx.save_inventory()?;

  let report = ctx.reconciler().handle(Event::ServerMigrated {
    server: server.clone(),
    new_org,
    actor,
  })?;
  output::report(
    &report,
    &format!("Migrated server {} from org {} to org {}", server.name, server.org_id, new_org),
    output,
  )
}
