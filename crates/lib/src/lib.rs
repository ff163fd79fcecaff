//! saltgen-lib: configuration artifact generation for a Salt-managed fleet
//!
//! This crate keeps per-server pillar files and per-scope custom state
//! assignment files in sync with fleet topology:
//! - `ArtifactPaths`: deterministic mapping from scope and purpose to a file
//! - `StateNameResolver`: filters revision state names down to live ones
//! - `RevisionStore`: numbered configuration history per scope
//! - `ScopeReconciler`: reacts to topology events by rewriting or removing artifacts
//! - `Inventory`: a YAML fleet description usable as topology and state catalog

pub mod artifact;
pub mod config;
pub mod consts;
pub mod inventory;
pub mod platform;
pub mod reconcile;
pub mod resolve;
pub mod revision;
pub mod topology;
pub mod types;
pub mod util;
