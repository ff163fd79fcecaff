//! Shared constants.

pub const APP_NAME: &str = "saltgen";

/// Root directory for generated pillar files.
pub const DEFAULT_PILLAR_ROOT: &str = "/srv/susemanager/pillar";

/// Root directory for generated salt state files.
pub const DEFAULT_SLS_ROOT: &str = "/srv/susemanager/salt";

/// Subdirectory of the sls root holding custom state assignments.
pub const CUSTOM_STATES_DIR: &str = "custom";

/// Extension appended to every generated artifact.
pub const DEFAULT_EXTENSION: &str = "sls";

/// Directory name for revisions within the data directory.
pub const REVISIONS_DIR: &str = "revisions";

/// Inventory file name within the config directory.
pub const INVENTORY_FILENAME: &str = "inventory.yaml";
