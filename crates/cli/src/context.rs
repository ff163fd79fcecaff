//! Resolved locations and loaded state shared by every command.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use saltgen_lib::artifact::{ArtifactPaths, FsArtifactWriter};
use saltgen_lib::config::Settings;
use saltgen_lib::inventory::Inventory;
use saltgen_lib::reconcile::ScopeReconciler;
use saltgen_lib::resolve::CatalogResolver;
use saltgen_lib::revision::RevisionStore;
use tracing::debug;

/// Location flags. Each one wins over its environment variable.
#[derive(Args, Debug, Default)]
pub struct Overrides {
  /// Fleet inventory file [env: SALTGEN_INVENTORY]
  #[arg(long, global = true)]
  pub inventory: Option<PathBuf>,

  /// Directory for pillar files [env: SALTGEN_PILLAR_ROOT]
  #[arg(long, global = true)]
  pub pillar_root: Option<PathBuf>,

  /// Salt state root; assignments go to its custom/ subdirectory [env: SALTGEN_SLS_ROOT]
  #[arg(long, global = true)]
  pub sls_root: Option<PathBuf>,

  /// Directory for revision history [env: SALTGEN_DATA_DIR]
  #[arg(long, global = true)]
  pub data_dir: Option<PathBuf>,

  /// Artifact file extension [env: SALTGEN_EXTENSION]
  #[arg(long, global = true)]
  pub extension: Option<String>,
}

impl Overrides {
  pub fn settings(&self) -> Settings {
    let mut settings = Settings::current();
    if let Some(path) = &self.inventory {
      settings.inventory = path.clone();
    }
    if let Some(path) = &self.pillar_root {
      settings.pillar_root = path.clone();
    }
    if let Some(path) = &self.sls_root {
      settings.sls_root = path.clone();
    }
    if let Some(path) = &self.data_dir {
      settings.data_dir = path.clone();
    }
    if let Some(ext) = &self.extension {
      settings.extension = ext.clone();
    }
    settings
  }
}

pub type Reconciler<'a> = ScopeReconciler<&'a Inventory, &'a RevisionStore, CatalogResolver<&'a Inventory>, FsArtifactWriter>;

pub struct Context {
  pub settings: Settings,
  pub paths: ArtifactPaths,
  pub inventory: Inventory,
  pub store: RevisionStore,
}

impl Context {
  pub fn load(overrides: &Overrides) -> Result<Self> {
    let settings = overrides.settings();
    debug!(?settings, "resolved settings");

    let inventory = Inventory::load(&settings.inventory)
      .with_context(|| format!("Failed to load inventory {}", settings.inventory.display()))?;

    Ok(Self {
      paths: settings.artifact_paths(),
      store: RevisionStore::new(settings.revisions_dir()),
      settings,
      inventory,
    })
  }

  pub fn reconciler(&self) -> Reconciler<'_> {
    ScopeReconciler::new(
      self.paths.clone(),
      &self.inventory,
      &self.store,
      CatalogResolver::new(&self.inventory),
      FsArtifactWriter,
    )
  }

  pub fn save_inventory(&self) -> Result<()> {
    self
      .inventory
      .save(&self.settings.inventory)
      .with_context(|| format!("Failed to save inventory {}", self.settings.inventory.display()))
  }
}
