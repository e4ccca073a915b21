//! Directory-backed expirable store.
//!
//! Each expirable object is a regular file directly inside the root
//! directory; its identity is the file name.
//!
//! Lookup and destroy run on the coordinator task. On a multi-threaded
//! runtime the filesystem calls go through `block_in_place` so other tasks
//! keep their worker; elsewhere they run inline.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::expiration::ExpirableId;
use crate::store::{Expirable, ExpirableStore};

/// A file owned by a [`DirectoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    id: ExpirableId,
    path: PathBuf,
}

impl StoredFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Expirable for StoredFile {
    fn expiration_id(&self) -> ExpirableId {
        self.id.clone()
    }
}

/// Store that deletes expired files from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an identity to a path inside the root.
    ///
    /// Identities that could escape the root are rejected.
    fn resolve(&self, id: &ExpirableId) -> Option<PathBuf> {
        let name = id.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return None;
        }
        Some(self.root.join(name))
    }
}

impl ExpirableStore for DirectoryStore {
    type Object = StoredFile;

    fn lookup(&self, id: &ExpirableId) -> Option<StoredFile> {
        let Some(path) = self.resolve(id) else {
            tracing::warn!(id = %id, "Rejecting identity that is not a plain file name");
            return None;
        };

        off_worker(|| path.is_file()).then(|| StoredFile {
            id: id.clone(),
            path,
        })
    }

    fn destroy(&self, object: StoredFile) {
        match off_worker(|| fs::remove_file(&object.path)) {
            Ok(()) => tracing::info!(
                id = %object.id,
                path = %object.path.display(),
                "Deleted expired file"
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(id = %object.id, "File already removed");
            }
            Err(e) => tracing::error!(
                id = %object.id,
                path = %object.path.display(),
                error = %e,
                "Failed to delete expired file"
            ),
        }
    }
}

/// Run blocking filesystem work without stalling the current worker thread.
fn off_worker<R>(work: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_and_destroy_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("paste-1"), b"contents").unwrap();
        let store = DirectoryStore::new(dir.path());

        let file = store.lookup(&"paste-1".into()).unwrap();
        assert_eq!(file.expiration_id(), ExpirableId::from("paste-1"));

        store.destroy(file);
        assert!(!dir.path().join("paste-1").exists());
        assert!(store.lookup(&"paste-1".into()).is_none());
    }

    #[test]
    fn test_rejects_paths_outside_root() {
        let dir = TempDir::new().unwrap();
        let store = DirectoryStore::new(dir.path().join("inner"));
        fs::create_dir(store.root()).unwrap();
        fs::write(dir.path().join("secret"), b"x").unwrap();

        assert!(store.lookup(&"../secret".into()).is_none());
        assert!(store.lookup(&"..".into()).is_none());
        assert!(store.lookup(&"".into()).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_destroy_on_multi_thread_runtime() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("paste-2"), b"contents").unwrap();
        let store = DirectoryStore::new(dir.path());

        let file = store.lookup(&"paste-2".into()).unwrap();
        store.destroy(file);
        assert!(!dir.path().join("paste-2").exists());
    }

    #[tokio::test]
    async fn test_destroy_on_current_thread_runtime() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("paste-3"), b"contents").unwrap();
        let store = DirectoryStore::new(dir.path());

        let file = store.lookup(&"paste-3".into()).unwrap();
        store.destroy(file);
        assert!(!dir.path().join("paste-3").exists());
    }

    #[test]
    fn test_directories_are_not_objects() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let store = DirectoryStore::new(dir.path());
        assert!(store.lookup(&"sub".into()).is_none());
    }
}
