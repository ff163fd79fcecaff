//! Generated artifacts: where they live, what they contain, and how they
//! reach the disk.
//!
//! Artifacts are a cache over domain state. Their content is fully
//! determined by the scope, its latest revision and the current visibility
//! of custom state definitions, so deleting and regenerating one is always
//! lossless.

pub mod document;
pub mod paths;
pub mod writer;

pub use document::{ArtifactDocument, CustomStateAssignment, Pillar};
pub use paths::{ArtifactPaths, InvalidScopeError};
pub use writer::{ArtifactError, ArtifactWriter, FsArtifactWriter};
