//! Search queries over an owner's namespace.
//!
//! Searches are read-derived: [`crate::NamespaceEngine::search`] gathers the
//! candidate file records under the owner's read guard and hands them to the
//! ranking here, so results always reflect the last committed mutation.

use uuid::Uuid;

use super::record::FileRecord;

/// A search over file names and metadata.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Text matched case-insensitively against file names.
    pub text: String,
    /// Restrict to files with exactly this media type hint.
    pub mime_hint: Option<String>,
    /// Restrict to files of at least this many bytes.
    pub min_size: Option<u64>,
    /// Restrict to files of at most this many bytes.
    pub max_size: Option<u64>,
    /// Restrict to the subtree rooted at this folder.
    pub scope: Option<Uuid>,
}

impl SearchQuery {
    /// Create a query matching the given text anywhere in a file name.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mime_hint: None,
            min_size: None,
            max_size: None,
            scope: None,
        }
    }

    /// Filter on an exact media type hint.
    pub fn with_mime_hint(mut self, mime_hint: impl Into<String>) -> Self {
        self.mime_hint = Some(mime_hint.into());
        self
    }

    /// Filter on a minimum size in bytes.
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = Some(min_size);
        self
    }

    /// Filter on a maximum size in bytes.
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Restrict the search to the subtree rooted at a folder.
    pub fn within(mut self, folder_id: Uuid) -> Self {
        self.scope = Some(folder_id);
        self
    }
}

/// How strongly a file name matched the query text.
///
/// Variant order is ranking order: exact matches sort before prefix
/// matches, which sort before plain substring hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    /// The whole name equals the query text.
    Exact,
    /// The name starts with the query text.
    Prefix,
    /// The query text appears somewhere in the name.
    Substring,
}

/// A single search hit.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    /// The matching file record.
    pub file: FileRecord,
    /// Match strength.
    pub rank: MatchRank,
}

/// Filter and rank candidate files for a query.
///
/// Ordering: rank, then most-recently-created, then name and id so equal
/// timestamps still produce a stable sequence.
pub(crate) fn rank(candidates: Vec<FileRecord>, query: &SearchQuery) -> Vec<SearchMatch> {
    let needle = query.text.trim().to_lowercase();

    let mut matches: Vec<SearchMatch> = candidates
        .into_iter()
        .filter_map(|file| {
            if let Some(mime) = &query.mime_hint {
                if file.mime_hint.as_deref() != Some(mime.as_str()) {
                    return None;
                }
            }
            if query.min_size.is_some_and(|min| file.size < min) {
                return None;
            }
            if query.max_size.is_some_and(|max| file.size > max) {
                return None;
            }

            let name = file.name.to_lowercase();
            let rank = if name == needle {
                MatchRank::Exact
            } else if name.starts_with(&needle) {
                MatchRank::Prefix
            } else if name.contains(&needle) {
                MatchRank::Substring
            } else {
                return None;
            };
            Some(SearchMatch { file, rank })
        })
        .collect();

    matches.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| b.file.created_at.cmp(&a.file.created_at))
            .then_with(|| a.file.name.cmp(&b.file.name))
            .then_with(|| a.file.id.cmp(&b.file.id))
    });
    matches
}
