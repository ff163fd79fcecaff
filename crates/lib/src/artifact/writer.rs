//! Artifact persistence.
//!
//! Writes go to a uniquely named temp file next to the target and are then
//! renamed over it, so readers only ever see the old or the new full file.
//! Two concurrent writers of the same artifact never share a temp file; the
//! last rename wins.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use super::document::ArtifactDocument;

/// Storage failures while writing or removing an artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("failed to create artifact directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to serialize artifact {path}: {source}")]
  Serialize {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("failed to write artifact {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to remove artifact {path}: {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Sink for generated artifacts.
pub trait ArtifactWriter {
  /// Serialize `document` and atomically replace whatever is at `path`,
  /// creating parent directories as needed.
  fn write(&self, path: &Path, document: &ArtifactDocument) -> Result<(), ArtifactError>;

  /// Remove the artifact at `path`. Returns whether a file was removed;
  /// a missing file is not an error.
  fn remove(&self, path: &Path) -> Result<bool, ArtifactError>;
}

/// Writes artifacts to the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactWriter;

impl ArtifactWriter for FsArtifactWriter {
  fn write(&self, path: &Path, document: &ArtifactDocument) -> Result<(), ArtifactError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|source| ArtifactError::CreateDir {
      path: dir.to_path_buf(),
      source,
    })?;

    let content = document.to_yaml().map_err(|source| ArtifactError::Serialize {
      path: path.to_path_buf(),
      source,
    })?;

    let write_err = |source: io::Error| ArtifactError::Write {
      path: path.to_path_buf(),
      source,
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    info!(path = %path.display(), purpose = %document.purpose(), "artifact written");
    debug!(content = %content, "artifact content");
    Ok(())
  }

  fn remove(&self, path: &Path) -> Result<bool, ArtifactError> {
    match fs::remove_file(path) {
      Ok(()) => {
        info!(path = %path.display(), "artifact removed");
        Ok(true)
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "artifact already gone");
        Ok(false)
      }
      Err(source) => Err(ArtifactError::Remove {
        path: path.to_path_buf(),
        source,
      }),
    }
  }
}

impl<T: ArtifactWriter + ?Sized> ArtifactWriter for &T {
  fn write(&self, path: &Path, document: &ArtifactDocument) -> Result<(), ArtifactError> {
    (**self).write(path, document)
  }

  fn remove(&self, path: &Path) -> Result<bool, ArtifactError> {
    (**self).remove(path)
  }
}
