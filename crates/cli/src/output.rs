//! CLI output formatting utilities.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};
use saltgen_lib::reconcile::ReconcileReport;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ADD: &str = "+";
  pub const REMOVE: &str = "-";
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// Print what a reconciliation did, then fail if any scope failed.
pub fn report(report: &ReconcileReport, headline: &str, output: OutputFormat) -> Result<()> {
  if output.is_json() {
    print_json(report)?;
  } else {
    for path in &report.written {
      println!(
        "  {} {}",
        symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()),
        path.display()
      );
    }
    for path in &report.removed {
      println!(
        "  {} {}",
        symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()),
        path.display()
      );
    }
    for failure in &report.failures {
      print_error(&format!("{}: {}", failure.scope, failure.error));
    }

    if report.is_success() {
      print_success(headline);
    }
    print_stat("Written", &report.written.len().to_string());
    print_stat("Removed", &report.removed.len().to_string());
  }

  if !report.is_success() {
    bail!("{} scope(s) failed", report.failures.len());
  }
  Ok(())
}
