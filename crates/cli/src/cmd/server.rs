use anyhow::{Context as _, Result};
use saltgen_lib::reconcile::Event;
use saltgen_lib::types::ServerId;

use crate::context::{Context, Overrides};
use crate::output::{self, OutputFormat, print_info};

pub fn cmd_register(overrides: &Overrides, id: ServerId, output: OutputFormat) -> Result<()> {
  let ctx = Context::load(overrides)?;
  let server = ctx
    .inventory
    .server(id)
    .cloned()
    .with_context(|| format!("Server {} is not in the inventory", id))?;

  let report = ctx.reconciler().handle(Event::ServerRegistered(server.clone()))?;

  if !output.is_json() && report.written.is_empty() {
    print_info(&format!("Server {} ({}) is not fleet-managed, nothing generated", server.name, id));
    return Ok(());
  }
  output::report(&report, &format!("Registered server {}", server.name), output)
}
