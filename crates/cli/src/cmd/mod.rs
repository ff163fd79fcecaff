mod maintenance;
mod migrate;
mod path;
mod remove;
mod revision;
mod server;
mod state;

pub use maintenance::{cmd_prune, cmd_resync};
pub use migrate::cmd_migrate;
pub use path::cmd_path;
pub use remove::{cmd_remove_group, cmd_remove_org, cmd_remove_server};
pub use revision::{cmd_commit, cmd_revisions};
pub use server::cmd_register;
pub use state::{cmd_delete_state, cmd_state_changed};
