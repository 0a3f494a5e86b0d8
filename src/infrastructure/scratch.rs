//! Scratch files for in-flight jobs.
//!
//! Names are random v4 UUIDs; allocation touches no shared state.

use serde::Serialize;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ScratchSpace {
    dir: PathBuf,
}

/// A scratch path handed out to one job step. The file may not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScratchFile {
    pub file_name: String,
    pub path: PathBuf,
}

impl ScratchSpace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Falls back to the host temp directory when no working directory is
    /// configured.
    pub fn from_config(dir: Option<PathBuf>) -> Self {
        match dir {
            Some(dir) => Self::new(dir),
            None => {
                let fallback = std::env::temp_dir();
                warn!(
                    "⚠️ No working directory configured, using {}",
                    fallback.display()
                );
                Self::new(fallback)
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    pub fn allocate(&self, extension: &str) -> ScratchFile {
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        ScratchFile {
            path: self.dir.join(&file_name),
            file_name,
        }
    }

    /// Deletes a scratch file. A file that is already gone is fine; any
    /// other failure is logged and swallowed.
    pub async fn release(&self, file: &ScratchFile) {
        match remove_if_exists(&file.path).await {
            Ok(()) => debug!("🧹 Removed scratch file {}", file.path.display()),
            Err(e) => warn!(
                "Failed to remove scratch file {}: {}",
                file.path.display(),
                e
            ),
        }
    }
}

/// Deletes `path`, treating a missing file as success.
pub async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
