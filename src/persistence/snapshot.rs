//! Snapshot file load and atomic save.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::expiration::{ExpirableId, PersistedExpiration};

/// Full snapshot contents: identity → pending expiration.
pub type SnapshotMap = BTreeMap<ExpirableId, PersistedExpiration>;

/// Errors raised while reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Reads and writes the snapshot file at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. `Ok(None)` if no file exists yet.
    pub fn read(&self) -> Result<Option<SnapshotMap>, SnapshotError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let map = serde_json::from_reader(BufReader::new(file)).map_err(SnapshotError::Decode)?;
        Ok(Some(map))
    }

    /// Load pending expirations, treating any failure as empty state.
    pub fn load(&self) -> Vec<PersistedExpiration> {
        match self.read() {
            Ok(Some(map)) => map.into_values().collect(),
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "No snapshot found, starting empty");
                Vec::new()
            }
            Err(e) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to load snapshot, starting empty"
                );
                Vec::new()
            }
        }
    }

    /// Atomically replace the snapshot with `records`.
    ///
    /// Writes a temp file in the target directory and renames it over the
    /// old snapshot, so a crash leaves either the old or the new file.
    pub fn save(&self, records: &SnapshotMap) -> Result<usize, SnapshotError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut temp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer(&mut writer, records).map_err(SnapshotError::Encode)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| SnapshotError::Io(e.error))?;

        Ok(records.len())
    }
}
