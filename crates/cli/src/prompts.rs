use std::io::{self, IsTerminal, Write};

use anyhow::{Result, bail};

/// Ask before a destructive action. `force` answers yes without asking.
pub fn confirm_removal(what: &str, force: bool) -> Result<bool> {
  if force {
    return Ok(true);
  }

  if !io::stdin().is_terminal() || !io::stderr().is_terminal() {
    bail!("Refusing to remove {} without confirmation. Use --force to proceed.", what);
  }

  write!(io::stderr(), "Remove {} and all artifacts it owns? [y/N] ", what)?;
  io::stderr().flush()?;

  let mut answer = String::new();
  io::stdin().read_line(&mut answer)?;

  Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
