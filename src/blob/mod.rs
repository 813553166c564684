//! External blob gateway for CABINET.
//!
//! The namespace engine stores metadata only; file bytes live behind a
//! [`BlobGateway`]. Handles are opaque to the engine: it stores them on
//! upload, passes them back on download, and calls `delete_blob` as
//! best-effort cleanup when records are removed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;

mod local;

pub use local::LocalBlobStore;

/// Opaque reference to binary content held by a blob host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHandle(String);

impl ContentHandle {
    /// Wrap a raw handle string.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The raw handle string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Binary content host consumed by the namespace engine.
pub trait BlobGateway: Send + Sync {
    /// Store binary content, returning an opaque handle for later retrieval.
    fn put_blob(&self, bytes: &[u8]) -> Result<ContentHandle>;

    /// Fetch the content for a handle.
    fn get_blob(&self, handle: &ContentHandle) -> Result<Vec<u8>>;

    /// Remove the content for a handle. Removing an unknown handle is not
    /// an error, so cleanup stays idempotent.
    fn delete_blob(&self, handle: &ContentHandle) -> Result<()>;
}
