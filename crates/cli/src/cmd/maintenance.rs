use anyhow::Result;

use crate::context::{Context, Overrides};
use crate::output::{self, OutputFormat, print_info};

pub fn cmd_resync(overrides: &Overrides, output: OutputFormat) -> Result<()> {
  let ctx = Context::load(overrides)?;
  let report = ctx.reconciler().resync()?;
  output::report(&report, "Resync complete", output)
}

pub fn cmd_prune(overrides: &Overrides, dry_run: bool, output: OutputFormat) -> Result<()> {
  let ctx = Context::load(overrides)?;
  let report = ctx.reconciler().prune(dry_run);

  if dry_run && !output.is_json() {
    print_info("Dry run - no changes made");
  }
  output::report(&report, "Prune complete", output)
}
