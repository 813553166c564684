//! Namespace module for CABINET.
//!
//! This module owns the per-owner folder tree and file records:
//! - Typed folder and file records over the document store
//! - Path resolution with creation-on-demand
//! - The namespace engine (create/rename/move/delete/list/search)
//! - Search queries with relevance ranking

use std::fmt;

use serde::{Deserialize, Serialize};

mod engine;
mod folder;
mod path;
mod record;
mod search;

pub use engine::{FolderStats, ListOrder, NamespaceEngine, Node, RepairReport};
pub use folder::{Folder, FolderRepository};
pub use record::{FileRecord, FileRepository, UploadRequest};
pub use search::{MatchRank, SearchMatch, SearchQuery};

/// Maximum length for folder and file names (in characters).
pub const MAX_NAME_LENGTH: usize = 100;

/// Identity whose namespace is being operated on (one chat user).
///
/// Every engine operation is scoped to a single owner; owners never see
/// each other's folders or files.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OwnerId(pub i64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
