mod cmd;
mod context;
mod output;
mod prompts;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use saltgen_lib::types::{GroupId, OrgId, Purpose, Scope, ServerId};
use tracing_subscriber::EnvFilter;

use crate::context::Overrides;
use crate::output::OutputFormat;

/// saltgen - keep Salt pillar and custom state assignment files in sync with fleet topology
#[derive(Parser)]
#[command(name = "saltgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(flatten)]
  overrides: Overrides,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text", global = true)]
  output: OutputFormat,

  /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate artifacts for a newly registered server
  Register { server: ServerId },

  /// Remove a server's artifacts and drop it from the inventory
  RemoveServer { server: ServerId },

  /// Remove a group's assignment and drop it from the inventory
  RemoveGroup { group: GroupId },

  /// Remove an organization with all its servers' artifacts
  RemoveOrg {
    org: OrgId,

    /// Skip confirmation prompt
    #[arg(long)]
    force: bool,
  },

  /// Commit a new custom state revision for a scope and regenerate its assignment
  Commit(CommitArgs),

  /// Regenerate every assignment referencing a custom state
  StateChanged { org: OrgId, name: String },

  /// Soft-delete a custom state and regenerate the assignments using it
  DeleteState { org: OrgId, name: String },

  /// Move a server to another organization, resetting its configuration
  Migrate {
    server: ServerId,
    org: OrgId,

    /// Who performed the migration
    #[arg(long)]
    actor: Option<String>,
  },

  /// Regenerate every artifact from current state
  Resync,

  /// Remove artifacts whose scope no longer exists
  Prune {
    /// Preview what would be removed without removing anything
    #[arg(long)]
    dry_run: bool,
  },

  /// Print the artifact path for a scope
  Path {
    /// Scope as <kind>:<id>, e.g. server:1000010000
    scope: Scope,

    #[arg(value_enum, default_value = "custom-state-assignment")]
    purpose: PurposeArg,
  },

  /// List the revision history of a scope
  Revisions {
    /// Scope as <kind>:<id>, e.g. group:42
    scope: Scope,
  },
}

#[derive(Args)]
struct CommitArgs {
  /// Scope as <kind>:<id>, e.g. org:7
  scope: Scope,

  /// Custom state to include (repeatable)
  #[arg(short, long = "state")]
  states: Vec<String>,

  /// Who committed the revision
  #[arg(long)]
  actor: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PurposeArg {
  Pillar,
  CustomStateAssignment,
}

impl From<PurposeArg> for Purpose {
  fn from(arg: PurposeArg) -> Self {
    match arg {
      PurposeArg::Pillar => Purpose::Pillar,
      PurposeArg::CustomStateAssignment => Purpose::CustomStateAssignment,
    }
  }
}

fn init_tracing(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let overrides = &cli.overrides;
  let output = cli.output;

  match cli.command {
    Commands::Register { server } => cmd::cmd_register(overrides, server, output),
    Commands::RemoveServer { server } => cmd::cmd_remove_server(overrides, server, output),
    Commands::RemoveGroup { group } => cmd::cmd_remove_group(overrides, group, output),
    Commands::RemoveOrg { org, force } => cmd::cmd_remove_org(overrides, org, force, output),
    Commands::Commit(args) => cmd::cmd_commit(
      overrides,
      args.scope,
      args.states.into_iter().collect(),
      args.actor.as_deref(),
      output,
    ),
    Commands::StateChanged { org, name } => cmd::cmd_state_changed(overrides, org, &name, output),
    Commands::DeleteState { org, name } => cmd::cmd_delete_state(overrides, org, &name, output),
    Commands::Migrate { server, org, actor } => cmd::cmd_migrate(overrides, server, org, actor, output),
    Commands::Resync => cmd::cmd_resync(overrides, output),
    Commands::Prune { dry_run } => cmd::cmd_prune(overrides, dry_run, output),
    Commands::Path { scope, purpose } => cmd::cmd_path(overrides, scope, purpose.into(), output),
    Commands::Revisions { scope } => cmd::cmd_revisions(overrides, scope, output),
  }
}

