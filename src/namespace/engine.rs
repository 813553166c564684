//! Namespace engine: per-owner folder trees and file records.
//!
//! Every mutating operation runs under a per-owner critical section, so
//! mutations on one owner's namespace are serialized while different owners
//! proceed in parallel. Reads take the owner's shared guard and therefore
//! never observe a half-applied move or cascading delete.
//!
//! All validation (existence, name collisions, cycles, root protection)
//! happens before the first store write, so validation failures never leave
//! partial state.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::blob::{BlobGateway, LocalBlobStore};
use crate::config::Config;
use crate::store::DocumentStore;
use crate::{CabinetError, Result};

use super::folder::{Folder, FolderRepository};
use super::path::{split_path, validate_name};
use super::record::{FileRecord, FileRepository, UploadRequest};
use super::search::{self, SearchMatch, SearchQuery};
use super::OwnerId;

/// A folder or file entry, as returned by `get` and `list_children`.
#[derive(Debug, Clone)]
pub enum Node {
    /// A folder.
    Folder(Folder),
    /// A file record.
    File(FileRecord),
}

impl Node {
    /// The node's id.
    pub fn id(&self) -> Uuid {
        match self {
            Node::Folder(f) => f.id,
            Node::File(f) => f.id,
        }
    }

    /// The node's name.
    pub fn name(&self) -> &str {
        match self {
            Node::Folder(f) => &f.name,
            Node::File(f) => &f.name,
        }
    }

    /// When the node was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Node::Folder(f) => f.created_at,
            Node::File(f) => f.created_at,
        }
    }

    /// Whether the node is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, Node::Folder(_))
    }
}

/// Ordering for `list_children`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Lexical by name.
    #[default]
    Name,
    /// Most recently created first.
    CreatedAt,
}

/// Aggregate counts over a folder subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderStats {
    /// Descendant folders (the folder itself not counted).
    pub folders: usize,
    /// Files in the subtree.
    pub files: usize,
    /// Total size of those files in bytes.
    pub total_size: u64,
}

/// What a `repair` sweep removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepairReport {
    /// Folders no longer reachable from the root.
    pub removed_folders: usize,
    /// File records whose folder was gone.
    pub removed_files: usize,
}

/// Per-owner lock registry.
///
/// Mutations take the write guard, reads the read guard; locks for
/// different owners never contend.
struct OwnerLocks {
    inner: Mutex<HashMap<OwnerId, Arc<RwLock<()>>>>,
}

impl OwnerLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    fn for_owner(&self, owner: OwnerId) -> Result<Arc<RwLock<()>>> {
        let mut map = self.inner.lock().map_err(|_| lock_poisoned())?;
        Ok(map.entry(owner).or_default().clone())
    }
}

fn lock_poisoned() -> CabinetError {
    CabinetError::Store("namespace lock poisoned".to_string())
}

/// The namespace engine.
///
/// Owns the document store, the blob gateway used for best-effort content
/// cleanup, the case policy, and the per-owner lock registry.
pub struct NamespaceEngine {
    store: Arc<DocumentStore>,
    blobs: Arc<dyn BlobGateway>,
    case_insensitive: bool,
    locks: OwnerLocks,
}

impl NamespaceEngine {
    /// Create an engine over an open store and blob gateway.
    pub fn new(store: Arc<DocumentStore>, blobs: Arc<dyn BlobGateway>) -> Self {
        Self {
            store,
            blobs,
            case_insensitive: false,
            locks: OwnerLocks::new(),
        }
    }

    /// Apply the case policy for sibling name collisions and path lookup.
    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Open an engine with the on-disk store and local blob gateway named
    /// by the configuration.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(DocumentStore::open(&config.store.path)?);
        let blobs: Arc<dyn BlobGateway> =
            Arc::new(LocalBlobStore::new(&config.blobs.storage_path)?);
        Ok(Self::new(store, blobs).with_case_insensitive(config.namespace.case_insensitive))
    }

    fn folders(&self) -> FolderRepository<'_> {
        FolderRepository::new(&self.store)
    }

    fn files(&self) -> FileRepository<'_> {
        FileRepository::new(&self.store)
    }

    /// The owner's root folder, materialized on first use.
    pub fn root(&self, owner: OwnerId) -> Result<Folder> {
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.write().map_err(|_| lock_poisoned())?;
        self.ensure_root(owner)
    }

    fn ensure_root(&self, owner: OwnerId) -> Result<Folder> {
        if let Some(root) = self.folders().root(owner)? {
            return Ok(root);
        }
        let root = Folder::new(owner, "", None);
        self.folders().save(&root)?;
        debug!(%owner, "materialized namespace root");
        Ok(root)
    }

    /// Create a folder under a parent.
    pub fn create_folder(&self, owner: OwnerId, parent_id: Uuid, name: &str) -> Result<Folder> {
        validate_name(name)?;
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.write().map_err(|_| lock_poisoned())?;

        let parent = self
            .folders()
            .get(owner, parent_id)?
            .ok_or_else(|| CabinetError::NotFound("parent folder".to_string()))?;
        self.assert_name_free(owner, parent.id, name, None)?;

        let folder = Folder::new(owner, name, Some(parent.id));
        self.folders().save(&folder)?;
        debug!(%owner, folder = %folder.id, name, "created folder");
        Ok(folder)
    }

    /// Register an uploaded file in a folder.
    ///
    /// The bytes must already live behind the blob gateway; the request
    /// carries the handle. A missing mime hint is guessed from the name.
    pub fn upload_file(&self, owner: OwnerId, request: &UploadRequest) -> Result<FileRecord> {
        validate_name(&request.name)?;
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.write().map_err(|_| lock_poisoned())?;

        let folder = self
            .folders()
            .get(owner, request.folder_id)?
            .ok_or_else(|| CabinetError::NotFound("folder".to_string()))?;
        self.assert_name_free(owner, folder.id, &request.name, None)?;

        let mime_hint = request.mime_hint.clone().or_else(|| {
            mime_guess::from_path(&request.name)
                .first_raw()
                .map(str::to_string)
        });
        let record = FileRecord::new(
            owner,
            folder.id,
            request.name.clone(),
            request.content_handle.clone(),
            request.size,
            mime_hint,
        );
        self.files().save(&record)?;
        debug!(%owner, file = %record.id, name = %record.name, "registered file");
        Ok(record)
    }

    /// Rename a folder or file. The root folder cannot be renamed.
    pub fn rename(&self, owner: OwnerId, node_id: Uuid, new_name: &str) -> Result<()> {
        validate_name(new_name)?;
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.write().map_err(|_| lock_poisoned())?;

        match self.node(owner, node_id)? {
            None => Err(CabinetError::NotFound("node".to_string())),
            Some(Node::Folder(mut folder)) => {
                let Some(parent_id) = folder.parent_id else {
                    return Err(CabinetError::Forbidden(
                        "root folder cannot be renamed".to_string(),
                    ));
                };
                self.assert_name_free(owner, parent_id, new_name, Some(folder.id))?;
                folder.name = new_name.to_string();
                self.folders().save(&folder)
            }
            Some(Node::File(mut file)) => {
                self.assert_name_free(owner, file.folder_id, new_name, Some(file.id))?;
                file.name = new_name.to_string();
                self.files().save(&file)
            }
        }
    }

    /// Re-parent a folder or file. The root folder cannot be moved, and a
    /// folder can never be moved under itself or one of its descendants.
    pub fn move_node(&self, owner: OwnerId, node_id: Uuid, new_parent_id: Uuid) -> Result<()> {
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.write().map_err(|_| lock_poisoned())?;

        let node = self
            .node(owner, node_id)?
            .ok_or_else(|| CabinetError::NotFound("node".to_string()))?;
        let dest = self
            .folders()
            .get(owner, new_parent_id)?
            .ok_or_else(|| CabinetError::NotFound("destination folder".to_string()))?;

        if let Node::Folder(folder) = &node {
            if folder.is_root() {
                return Err(CabinetError::Forbidden(
                    "root folder cannot be moved".to_string(),
                ));
            }
            self.assert_no_cycle(owner, folder.id, &dest)?;
        }
        self.assert_name_free(owner, dest.id, node.name(), Some(node.id()))?;

        match node {
            Node::Folder(mut folder) => {
                folder.parent_id = Some(dest.id);
                self.folders().save(&folder)
            }
            Node::File(mut file) => {
                file.folder_id = dest.id;
                self.files().save(&file)
            }
        }
    }

    /// Delete a file, or a folder together with its entire subtree.
    ///
    /// Folder deletion is two-phase: the full closure of descendants is
    /// collected with an explicit worklist, then removals are applied
    /// (files first, folders children-before-parents). Blob cleanup runs
    /// after the metadata deletion has committed.
    pub fn delete(&self, owner: OwnerId, node_id: Uuid) -> Result<()> {
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.write().map_err(|_| lock_poisoned())?;

        match self.node(owner, node_id)? {
            None => Err(CabinetError::NotFound("node".to_string())),
            Some(Node::File(file)) => {
                self.files().delete(file.id)?;
                self.discard_blob(&file);
                debug!(%owner, file = %file.id, "deleted file");
                Ok(())
            }
            Some(Node::Folder(folder)) => {
                if folder.is_root() {
                    return Err(CabinetError::Forbidden(
                        "root folder cannot be deleted".to_string(),
                    ));
                }
                let (folders, files) = self.collect_subtree(owner, &folder)?;
                for file in &files {
                    self.files().delete(file.id)?;
                }
                for entry in folders.iter().rev() {
                    self.folders().delete(entry.id)?;
                }
                for file in &files {
                    self.discard_blob(file);
                }
                info!(
                    %owner,
                    folder = %folder.id,
                    folders = folders.len(),
                    files = files.len(),
                    "deleted folder subtree"
                );
                Ok(())
            }
        }
    }

    /// Get a folder or file by id.
    pub fn get(&self, owner: OwnerId, node_id: Uuid) -> Result<Node> {
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.read().map_err(|_| lock_poisoned())?;

        self.node(owner, node_id)?
            .ok_or_else(|| CabinetError::NotFound("node".to_string()))
    }

    /// List the folders and files directly under a folder.
    pub fn list_children(
        &self,
        owner: OwnerId,
        folder_id: Uuid,
        order: ListOrder,
    ) -> Result<Vec<Node>> {
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.read().map_err(|_| lock_poisoned())?;

        let folder = self
            .folders()
            .get(owner, folder_id)?
            .ok_or_else(|| CabinetError::NotFound("folder".to_string()))?;

        let mut entries: Vec<Node> = self
            .folders()
            .list_children(owner, folder.id)?
            .into_iter()
            .map(Node::Folder)
            .chain(
                self.files()
                    .list_by_folder(owner, folder.id)?
                    .into_iter()
                    .map(Node::File),
            )
            .collect();

        match order {
            ListOrder::Name => entries.sort_by(|a, b| a.name().cmp(b.name())),
            ListOrder::CreatedAt => entries.sort_by(|a, b| {
                b.created_at()
                    .cmp(&a.created_at())
                    .then_with(|| a.name().cmp(b.name()))
            }),
        }
        Ok(entries)
    }

    /// Resolve a path to a folder, optionally creating missing segments.
    ///
    /// The empty path and "/" resolve to the owner root. With
    /// `create_missing` false the namespace is left untouched apart from
    /// root materialization on first contact with the owner.
    pub fn resolve(&self, owner: OwnerId, path: &str, create_missing: bool) -> Result<Folder> {
        let segments = split_path(path)?;
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.write().map_err(|_| lock_poisoned())?;

        let mut current = self.ensure_root(owner)?;
        for segment in segments {
            match self
                .folders()
                .find_child(owner, current.id, segment, self.case_insensitive)?
            {
                Some(next) => current = next,
                None if create_missing => {
                    self.assert_name_free(owner, current.id, segment, None)?;
                    let folder = Folder::new(owner, segment, Some(current.id));
                    self.folders().save(&folder)?;
                    debug!(%owner, folder = %folder.id, name = segment, "created folder on demand");
                    current = folder;
                }
                None => return Err(CabinetError::NotFound(format!("folder {segment}"))),
            }
        }
        Ok(current)
    }

    /// Render the absolute path of a folder or file, "/"-joined from root.
    pub fn path_of(&self, owner: OwnerId, node_id: Uuid) -> Result<String> {
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.read().map_err(|_| lock_poisoned())?;

        let node = self
            .node(owner, node_id)?
            .ok_or_else(|| CabinetError::NotFound("node".to_string()))?;

        let (mut names, mut parent) = match node {
            Node::Folder(f) => {
                if f.is_root() {
                    return Ok("/".to_string());
                }
                (vec![f.name.clone()], f.parent_id)
            }
            Node::File(f) => (vec![f.name.clone()], Some(f.folder_id)),
        };

        let mut seen = HashSet::new();
        while let Some(parent_id) = parent {
            let folder = self
                .folders()
                .get(owner, parent_id)?
                .ok_or_else(|| CabinetError::Corrupt(format!("missing parent folder {parent_id}")))?;
            if !seen.insert(folder.id) {
                return Err(CabinetError::Corrupt(format!(
                    "folder parent cycle at {parent_id}"
                )));
            }
            if folder.is_root() {
                break;
            }
            names.push(folder.name.clone());
            parent = folder.parent_id;
        }

        names.reverse();
        Ok(format!("/{}", names.join("/")))
    }

    /// Aggregate counts over a folder's subtree.
    pub fn stats(&self, owner: OwnerId, folder_id: Uuid) -> Result<FolderStats> {
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.read().map_err(|_| lock_poisoned())?;

        let folder = self
            .folders()
            .get(owner, folder_id)?
            .ok_or_else(|| CabinetError::NotFound("folder".to_string()))?;
        let (folders, files) = self.collect_subtree(owner, &folder)?;

        Ok(FolderStats {
            folders: folders.len() - 1,
            files: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
        })
    }

    /// Sweep records left dangling by a crash between the writes of a
    /// cascading delete: file records whose folder is gone, and folders no
    /// longer reachable from the root.
    pub fn repair(&self, owner: OwnerId) -> Result<RepairReport> {
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.write().map_err(|_| lock_poisoned())?;

        let root = self.ensure_root(owner)?;
        let all_folders = self.folders().list_owner(owner)?;

        let mut by_parent: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for folder in &all_folders {
            if let Some(parent_id) = folder.parent_id {
                by_parent.entry(parent_id).or_default().push(folder.id);
            }
        }

        let mut reachable = HashSet::from([root.id]);
        let mut pending = vec![root.id];
        while let Some(current) = pending.pop() {
            if let Some(children) = by_parent.get(&current) {
                for &child in children {
                    if reachable.insert(child) {
                        pending.push(child);
                    }
                }
            }
        }

        let mut report = RepairReport::default();
        for folder in &all_folders {
            if !reachable.contains(&folder.id) {
                self.folders().delete(folder.id)?;
                report.removed_folders += 1;
            }
        }
        for file in self.files().list_owner(owner)? {
            if !reachable.contains(&file.folder_id) {
                self.files().delete(file.id)?;
                self.discard_blob(&file);
                report.removed_files += 1;
            }
        }

        if report.removed_folders + report.removed_files > 0 {
            info!(
                %owner,
                folders = report.removed_folders,
                files = report.removed_files,
                "repaired namespace"
            );
        }
        Ok(report)
    }

    /// Search file names and metadata, optionally within a subtree.
    pub fn search(&self, owner: OwnerId, query: &SearchQuery) -> Result<Vec<SearchMatch>> {
        let lock = self.locks.for_owner(owner)?;
        let _guard = lock.read().map_err(|_| lock_poisoned())?;

        let candidates = match query.scope {
            Some(folder_id) => {
                let folder = self
                    .folders()
                    .get(owner, folder_id)?
                    .ok_or_else(|| CabinetError::NotFound("scope folder".to_string()))?;
                let (_, files) = self.collect_subtree(owner, &folder)?;
                files
            }
            None => self.files().list_owner(owner)?,
        };
        Ok(search::rank(candidates, query))
    }

    fn node(&self, owner: OwnerId, node_id: Uuid) -> Result<Option<Node>> {
        if let Some(folder) = self.folders().get(owner, node_id)? {
            return Ok(Some(Node::Folder(folder)));
        }
        if let Some(file) = self.files().get(owner, node_id)? {
            return Ok(Some(Node::File(file)));
        }
        Ok(None)
    }

    /// Fail `DuplicateName` if any sibling other than `exclude` already
    /// carries the name, folder or file alike.
    fn assert_name_free(
        &self,
        owner: OwnerId,
        parent_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<()> {
        if let Some(existing) =
            self.folders()
                .find_child(owner, parent_id, name, self.case_insensitive)?
        {
            if Some(existing.id) != exclude {
                return Err(CabinetError::DuplicateName(name.to_string()));
            }
        }
        if let Some(existing) =
            self.files()
                .find_child(owner, parent_id, name, self.case_insensitive)?
        {
            if Some(existing.id) != exclude {
                return Err(CabinetError::DuplicateName(name.to_string()));
            }
        }
        Ok(())
    }

    /// Reject a move that would make `folder_id` its own ancestor. Walks
    /// the destination's ancestor chain up to the root; the chain is finite
    /// by invariant, with a visited guard against corrupt stored cycles.
    fn assert_no_cycle(&self, owner: OwnerId, folder_id: Uuid, dest: &Folder) -> Result<()> {
        if dest.id == folder_id {
            return Err(CabinetError::CycleDetected);
        }
        let mut seen = HashSet::new();
        let mut current = dest.clone();
        while let Some(parent_id) = current.parent_id {
            if parent_id == folder_id {
                return Err(CabinetError::CycleDetected);
            }
            if !seen.insert(parent_id) {
                return Err(CabinetError::Corrupt(format!(
                    "folder parent cycle at {parent_id}"
                )));
            }
            current = self
                .folders()
                .get(owner, parent_id)?
                .ok_or_else(|| CabinetError::Corrupt(format!("missing parent folder {parent_id}")))?;
        }
        Ok(())
    }

    /// Collect a folder's full subtree with an explicit worklist, parents
    /// before children. The returned folder list includes the folder itself.
    fn collect_subtree(
        &self,
        owner: OwnerId,
        folder: &Folder,
    ) -> Result<(Vec<Folder>, Vec<FileRecord>)> {
        let mut folders = vec![folder.clone()];
        let mut files = Vec::new();
        let mut pending = vec![folder.id];

        while let Some(current) = pending.pop() {
            files.extend(self.files().list_by_folder(owner, current)?);
            for child in self.folders().list_children(owner, current)? {
                pending.push(child.id);
                folders.push(child);
            }
        }
        Ok((folders, files))
    }

    /// Best-effort blob cleanup. Metadata deletion has already committed;
    /// a gateway failure leaves an orphaned blob, never orphaned metadata.
    fn discard_blob(&self, file: &FileRecord) {
        if let Err(e) = self.blobs.delete_blob(&file.content_handle) {
            warn!(
                file = %file.id,
                handle = %file.content_handle,
                error = %e,
                "blob cleanup failed"
            );
        }
    }
}
