use anyhow::Result;
use saltgen_lib::reconcile::Event;
use saltgen_lib::types::OrgId;

use crate::context::{Context, Overrides};
use crate::output::{self, OutputFormat, print_warning};

pub fn cmd_state_changed(overrides: &Overrides, org_id: OrgId, name: &str, output: OutputFormat) -> Result<()> {
  let ctx = Context::load(overrides)?;
  let report = ctx.reconciler().handle(Event::CustomStateDefinitionChanged {
    org_id,
    state_name: name.to_string(),
  })?;
  output::report(&report, &format!("Regenerated users of {}", name), output)
}

pub fn cmd_delete_state(overrides: &Overrides, org_id: OrgId, name: &str, output: OutputFormat) -> Result<()> {
  let mut ctx = Context::load(overrides)?;
  if !ctx.inventory.delete_custom_state(org_id, name)? {
    print_warning(&format!("Custom state {} was already deleted", name));
  }
  ctx.save_inventory()?;

  let report = ctx.reconciler().handle(Event::CustomStateDefinitionChanged {
    org_id,
    state_name: name.to_string(),
  })?;
  output::report(&report, &format!("Deleted custom state {}", name), output)
}
