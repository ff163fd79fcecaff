use anyhow::Result;
use saltgen_lib::types::{Purpose, Scope};
use serde_json::json;

use crate::context::Overrides;
use crate::output::{OutputFormat, print_json};

pub fn cmd_path(overrides: &Overrides, scope: Scope, purpose: Purpose, output: OutputFormat) -> Result<()> {
  let path = overrides.settings().artifact_paths().resolve(&scope, purpose)?;

  if output.is_json() {
    print_json(&json!({ "scope": scope, "purpose": purpose, "path": path }))?;
  } else {
    println!("{}", path.display());
  }
  Ok(())
}
