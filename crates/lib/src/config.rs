//! Runtime settings for artifact generation.
//!
//! Every location has a built-in default, can be overridden by an environment
//! variable, and callers (the CLI) may override again with explicit values.

use std::path::PathBuf;

use serde::Serialize;

use crate::artifact::ArtifactPaths;
use crate::consts::{DEFAULT_EXTENSION, DEFAULT_PILLAR_ROOT, DEFAULT_SLS_ROOT, INVENTORY_FILENAME, REVISIONS_DIR};
use crate::platform::paths::{config_dir, data_dir};

pub const PILLAR_ROOT_ENV: &str = "SALTGEN_PILLAR_ROOT";
pub const SLS_ROOT_ENV: &str = "SALTGEN_SLS_ROOT";
pub const EXTENSION_ENV: &str = "SALTGEN_EXTENSION";
pub const DATA_DIR_ENV: &str = "SALTGEN_DATA_DIR";
pub const INVENTORY_ENV: &str = "SALTGEN_INVENTORY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
  pub pillar_root: PathBuf,
  pub sls_root: PathBuf,
  pub extension: String,
  pub data_dir: PathBuf,
  pub inventory: PathBuf,
}

impl Settings {
  /// Settings from the environment, falling back to defaults.
  pub fn current() -> Self {
    Self {
      pillar_root: env_path(PILLAR_ROOT_ENV).unwrap_or_else(|| PathBuf::from(DEFAULT_PILLAR_ROOT)),
      sls_root: env_path(SLS_ROOT_ENV).unwrap_or_else(|| PathBuf::from(DEFAULT_SLS_ROOT)),
      extension: std::env::var(EXTENSION_ENV)
        .ok()
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
      data_dir: env_path(DATA_DIR_ENV).unwrap_or_else(data_dir),
      inventory: env_path(INVENTORY_ENV).unwrap_or_else(|| config_dir().join(INVENTORY_FILENAME)),
    }
  }

  pub fn revisions_dir(&self) -> PathBuf {
    self.data_dir.join(REVISIONS_DIR)
  }

  pub fn artifact_paths(&self) -> ArtifactPaths {
    ArtifactPaths::new(&self.pillar_root, &self.sls_root, &self.extension)
  }
}

fn env_path(var: &str) -> Option<PathBuf> {
  std::env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}
