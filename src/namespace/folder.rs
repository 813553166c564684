//! Folder records and repository for the namespace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::DocumentStore;
use crate::Result;

use super::path::names_equal;
use super::OwnerId;

/// Store collection holding folder records.
pub(crate) const FOLDERS: &str = "folders";

/// A folder in an owner's namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    /// Unique folder ID.
    pub id: Uuid,
    /// Owner of the namespace this folder belongs to.
    pub owner_id: OwnerId,
    /// Folder name. Empty for the owner root.
    pub name: String,
    /// Parent folder ID (None for the root).
    pub parent_id: Option<Uuid>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

impl Folder {
    /// Create a folder record with a fresh id.
    pub fn new(owner_id: OwnerId, name: impl Into<String>, parent_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            parent_id,
            created_at: Utc::now(),
        }
    }

    /// Whether this folder is the owner root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Repository for folder records.
pub struct FolderRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository over the given store.
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Insert or replace a folder record.
    pub fn save(&self, folder: &Folder) -> Result<()> {
        self.store.put(FOLDERS, &folder.id.to_string(), folder)
    }

    /// Get a folder by ID, scoped to an owner.
    pub fn get(&self, owner: OwnerId, id: Uuid) -> Result<Option<Folder>> {
        let folder: Option<Folder> = self.store.get(FOLDERS, &id.to_string())?;
        Ok(folder.filter(|f| f.owner_id == owner))
    }

    /// Delete a folder record by ID. Returns `true` if it existed.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        self.store.delete(FOLDERS, &id.to_string())
    }

    /// Get the owner's root folder, if it has been materialized.
    pub fn root(&self, owner: OwnerId) -> Result<Option<Folder>> {
        let mut roots = self
            .store
            .query(FOLDERS, |f: &Folder| f.owner_id == owner && f.parent_id.is_none())?;
        Ok(roots.pop())
    }

    /// List child folders of a parent folder.
    pub fn list_children(&self, owner: OwnerId, parent_id: Uuid) -> Result<Vec<Folder>> {
        self.store.query(FOLDERS, |f: &Folder| {
            f.owner_id == owner && f.parent_id == Some(parent_id)
        })
    }

    /// Find a child folder by name under a parent, honoring the case policy.
    pub fn find_child(
        &self,
        owner: OwnerId,
        parent_id: Uuid,
        name: &str,
        case_insensitive: bool,
    ) -> Result<Option<Folder>> {
        let mut matches = self.store.query(FOLDERS, |f: &Folder| {
            f.owner_id == owner
                && f.parent_id == Some(parent_id)
                && names_equal(&f.name, name, case_insensitive)
        })?;
        Ok(matches.pop())
    }

    /// List every folder in an owner's namespace.
    pub fn list_owner(&self, owner: OwnerId) -> Result<Vec<Folder>> {
        self.store.query(FOLDERS, |f: &Folder| f.owner_id == owner)
    }
}
