//! Local filesystem blob store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{CabinetError, Result};

use super::{BlobGateway, ContentHandle};

/// Blob store over a local directory, the default gateway for
/// single-machine deployments.
///
/// Content is stored under UUID handles in a sharded layout:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12cd34-5678-90ab-cdef-123456789012
/// ├── cd/
/// │   └── cd90ab12-3456-7890-abcd-ef1234567890
/// └── ...
/// ```
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Base directory for blob content.
    base_path: PathBuf,
}

impl LocalBlobStore {
    /// Create a new LocalBlobStore with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Check whether content exists for a handle.
    pub fn exists(&self, handle: &ContentHandle) -> bool {
        self.blob_path(handle).exists()
    }

    /// Full path for a handle: {base_path}/{shard}/{handle}, where shard is
    /// the first two characters of the handle.
    fn blob_path(&self, handle: &ContentHandle) -> PathBuf {
        let name = handle.as_str();
        let shard = if name.len() >= 2 { &name[..2] } else { name };
        self.base_path.join(shard).join(name)
    }
}

impl BlobGateway for LocalBlobStore {
    fn put_blob(&self, bytes: &[u8]) -> Result<ContentHandle> {
        let handle = ContentHandle::new(Uuid::new_v4().to_string());
        let path = self.blob_path(&handle);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;

        Ok(handle)
    }

    fn get_blob(&self, handle: &ContentHandle) -> Result<Vec<u8>> {
        match fs::read(self.blob_path(handle)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CabinetError::NotFound(format!("blob {handle}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete_blob(&self, handle: &ContentHandle) -> Result<()> {
        match fs::remove_file(self.blob_path(handle)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CabinetError::Blob(format!("delete {handle}: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalBlobStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(temp_dir.path()).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blobs");

        assert!(!path.exists());
        let store = LocalBlobStore::new(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.base_path(), path);
    }

    #[test]
    fn test_put_and_get() {
        let (_temp_dir, store) = setup();
        let content = b"Hello, World!";

        let handle = store.put_blob(content).unwrap();

        let loaded = store.get_blob(&handle).unwrap();
        assert_eq!(loaded, content);
    }

    #[test]
    fn test_handles_are_unique() {
        let (_temp_dir, store) = setup();

        let first = store.put_blob(b"same bytes").unwrap();
        let second = store.put_blob(b"same bytes").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_put_creates_shard_directory() {
        let (_temp_dir, store) = setup();

        let handle = store.put_blob(b"data").unwrap();

        let shard = &handle.as_str()[..2];
        let shard_dir = store.base_path().join(shard);
        assert!(shard_dir.is_dir());
    }

    #[test]
    fn test_get_not_found() {
        let (_temp_dir, store) = setup();

        let result = store.get_blob(&ContentHandle::new("nonexistent"));

        assert!(matches!(result, Err(CabinetError::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, store) = setup();

        let handle = store.put_blob(b"to delete").unwrap();
        assert!(store.exists(&handle));

        store.delete_blob(&handle).unwrap();
        assert!(!store.exists(&handle));
    }

    #[test]
    fn test_delete_unknown_handle_is_ok() {
        let (_temp_dir, store) = setup();

        store.delete_blob(&ContentHandle::new("nonexistent")).unwrap();
    }

    #[test]
    fn test_binary_content() {
        let (_temp_dir, store) = setup();
        let content: Vec<u8> = (0..=255).collect();

        let handle = store.put_blob(&content).unwrap();

        assert_eq!(store.get_blob(&handle).unwrap(), content);
    }
}
