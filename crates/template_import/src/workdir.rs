//! Per-import scratch directories

use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Prefix of working directory names
pub const WORKDIR_PREFIX: &str = "temp_";

/// An exclusively owned scratch directory for one import.
///
/// The name combines a nanosecond timestamp with a random suffix, and the
/// final path segment is created with `create_dir`, so two imports can never
/// end up sharing a directory.
#[derive(Debug)]
pub struct WorkingDirectory {
    path: PathBuf,
}

impl WorkingDirectory {
    /// Generate a fresh directory name
    pub fn unique_name() -> String {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}{}_{}", WORKDIR_PREFIX, nanos, &suffix[..12])
    }

    /// Create a new working directory under `parent`
    pub fn allocate(parent: &Path) -> io::Result<Self> {
        fs::create_dir_all(parent)?;
        let path = parent.join(Self::unique_name());
        fs::create_dir(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the directory and everything in it
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
