//! CABINET - storage metadata engine for a chat-driven personal cloud drive.
//!
//! Each owner (one chat user) gets a hierarchical namespace of folders and
//! file records, persisted in a human-readable document store. File bytes
//! live behind an external blob gateway and are never inspected here; the
//! engine stores opaque content handles and cleans them up best-effort on
//! delete. The conversational front end is an external caller: it maps the
//! authenticated chat identity to an [`OwnerId`] and renders the structured
//! error kinds in [`CabinetError`].

pub mod blob;
pub mod config;
pub mod error;
pub mod logging;
pub mod namespace;
pub mod store;

pub use blob::{BlobGateway, ContentHandle, LocalBlobStore};
pub use config::Config;
pub use error::{CabinetError, Result};
pub use namespace::{
    FileRecord, FileRepository, Folder, FolderRepository, FolderStats, ListOrder, MatchRank,
    NamespaceEngine, Node, OwnerId, RepairReport, SearchMatch, SearchQuery, UploadRequest,
    MAX_NAME_LENGTH,
};
pub use store::DocumentStore;
