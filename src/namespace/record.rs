//! File records and repository for the namespace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blob::ContentHandle;
use crate::store::DocumentStore;
use crate::Result;

use super::path::names_equal;
use super::OwnerId;

/// Store collection holding file records.
pub(crate) const FILES: &str = "files";

/// Metadata for a file in an owner's namespace.
///
/// The bytes themselves live behind the blob gateway; this record only
/// carries the opaque handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: Uuid,
    /// Owner of the namespace this file belongs to.
    pub owner_id: OwnerId,
    /// Folder this file lives in.
    pub folder_id: Uuid,
    /// File name (display name).
    pub name: String,
    /// Opaque blob host reference. Immutable once set; rename and move
    /// never touch it.
    pub content_handle: ContentHandle,
    /// Content size in bytes.
    pub size: u64,
    /// Media type hint, if known.
    pub mime_hint: Option<String>,
    /// When the file was uploaded.
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    /// Create a file record with a fresh id.
    pub fn new(
        owner_id: OwnerId,
        folder_id: Uuid,
        name: impl Into<String>,
        content_handle: ContentHandle,
        size: u64,
        mime_hint: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            folder_id,
            name: name.into(),
            content_handle,
            size,
            mime_hint,
            created_at: Utc::now(),
        }
    }
}

/// Request data for registering an uploaded file.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Folder to place the file in.
    pub folder_id: Uuid,
    /// File name.
    pub name: String,
    /// Handle returned by the blob gateway for the uploaded bytes.
    pub content_handle: ContentHandle,
    /// Content size in bytes.
    pub size: u64,
    /// Media type hint; guessed from the name when absent.
    pub mime_hint: Option<String>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(
        folder_id: Uuid,
        name: impl Into<String>,
        content_handle: ContentHandle,
        size: u64,
    ) -> Self {
        Self {
            folder_id,
            name: name.into(),
            content_handle,
            size,
            mime_hint: None,
        }
    }

    /// Set the media type hint.
    pub fn with_mime_hint(mut self, mime_hint: impl Into<String>) -> Self {
        self.mime_hint = Some(mime_hint.into());
        self
    }
}

/// Repository for file records.
pub struct FileRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository over the given store.
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Insert or replace a file record.
    pub fn save(&self, file: &FileRecord) -> Result<()> {
        self.store.put(FILES, &file.id.to_string(), file)
    }

    /// Get a file by ID, scoped to an owner.
    pub fn get(&self, owner: OwnerId, id: Uuid) -> Result<Option<FileRecord>> {
        let file: Option<FileRecord> = self.store.get(FILES, &id.to_string())?;
        Ok(file.filter(|f| f.owner_id == owner))
    }

    /// Delete a file record by ID. Returns `true` if it existed.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        self.store.delete(FILES, &id.to_string())
    }

    /// List files in a folder.
    pub fn list_by_folder(&self, owner: OwnerId, folder_id: Uuid) -> Result<Vec<FileRecord>> {
        self.store.query(FILES, |f: &FileRecord| {
            f.owner_id == owner && f.folder_id == folder_id
        })
    }

    /// Find a file by name within a folder, honoring the case policy.
    pub fn find_child(
        &self,
        owner: OwnerId,
        folder_id: Uuid,
        name: &str,
        case_insensitive: bool,
    ) -> Result<Option<FileRecord>> {
        let mut matches = self.store.query(FILES, |f: &FileRecord| {
            f.owner_id == owner
                && f.folder_id == folder_id
                && names_equal(&f.name, name, case_insensitive)
        })?;
        Ok(matches.pop())
    }

    /// List every file in an owner's namespace.
    pub fn list_owner(&self, owner: OwnerId) -> Result<Vec<FileRecord>> {
        self.store.query(FILES, |f: &FileRecord| f.owner_id == owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const OWNER: OwnerId = OwnerId(100);
    const OTHER: OwnerId = OwnerId(200);

    fn setup() -> (TempDir, DocumentStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path()).unwrap();
        (temp_dir, store)
    }

    fn record(owner: OwnerId, folder_id: Uuid, name: &str) -> FileRecord {
        FileRecord::new(
            owner,
            folder_id,
            name,
            ContentHandle::new(Uuid::new_v4().to_string()),
            1024,
            Some("text/plain".to_string()),
        )
    }

    #[test]
    fn test_save_and_get() {
        let (_temp_dir, store) = setup();
        let repo = FileRepository::new(&store);
        let folder_id = Uuid::new_v4();

        let file = record(OWNER, folder_id, "a.txt");
        repo.save(&file).unwrap();

        let found = repo.get(OWNER, file.id).unwrap().unwrap();
        assert_eq!(found.name, "a.txt");
        assert_eq!(found.folder_id, folder_id);
        assert_eq!(found.content_handle, file.content_handle);
        assert_eq!(found.size, 1024);
    }

    #[test]
    fn test_get_scopes_by_owner() {
        let (_temp_dir, store) = setup();
        let repo = FileRepository::new(&store);

        let file = record(OWNER, Uuid::new_v4(), "a.txt");
        repo.save(&file).unwrap();

        assert!(repo.get(OTHER, file.id).unwrap().is_none());
    }

    #[test]
    fn test_list_by_folder() {
        let (_temp_dir, store) = setup();
        let repo = FileRepository::new(&store);
        let folder = Uuid::new_v4();
        let other_folder = Uuid::new_v4();

        repo.save(&record(OWNER, folder, "a.txt")).unwrap();
        repo.save(&record(OWNER, folder, "b.txt")).unwrap();
        repo.save(&record(OWNER, other_folder, "c.txt")).unwrap();

        assert_eq!(repo.list_by_folder(OWNER, folder).unwrap().len(), 2);
        assert_eq!(repo.list_by_folder(OWNER, other_folder).unwrap().len(), 1);
    }

    #[test]
    fn test_find_child_case_policy() {
        let (_temp_dir, store) = setup();
        let repo = FileRepository::new(&store);
        let folder = Uuid::new_v4();

        repo.save(&record(OWNER, folder, "Report.pdf")).unwrap();

        assert!(repo.find_child(OWNER, folder, "report.pdf", false).unwrap().is_none());
        assert!(repo.find_child(OWNER, folder, "Report.pdf", false).unwrap().is_some());
        assert!(repo.find_child(OWNER, folder, "report.pdf", true).unwrap().is_some());
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, store) = setup();
        let repo = FileRepository::new(&store);

        let file = record(OWNER, Uuid::new_v4(), "a.txt");
        repo.save(&file).unwrap();

        assert!(repo.delete(file.id).unwrap());
        assert!(repo.get(OWNER, file.id).unwrap().is_none());
    }

    #[test]
    fn test_upload_request_builder() {
        let folder_id = Uuid::new_v4();
        let handle = ContentHandle::new("h1");

        let request = UploadRequest::new(folder_id, "a.txt", handle.clone(), 13)
            .with_mime_hint("text/plain");

        assert_eq!(request.folder_id, folder_id);
        assert_eq!(request.name, "a.txt");
        assert_eq!(request.content_handle, handle);
        assert_eq!(request.size, 13);
        assert_eq!(request.mime_hint, Some("text/plain".to_string()));
    }
}
