//! I/O boundary traits for testability
//!
//! These traits abstract persistence and file access, allowing services
//! to be tested with in-memory or instrumented implementations.

use std::io;
use std::path::Path;

use crate::domain::{CodeDraft, CodeEntry, CodeFilter, CodeId, CodeTree, Page, PageRequest};
use crate::infrastructure::InfraResult;

/// Persistence port for code entries.
///
/// Id and code lookups return rows regardless of the soft-delete flag.
/// Sibling queries only consider live rows and order them by `(sequence, id)`.
pub trait CodeRepository: Send + Sync {
    /// Store a new row; the store assigns id and timestamps.
    fn insert(&self, draft: CodeDraft) -> InfraResult<CodeEntry>;

    /// Overwrite an existing row; the store refreshes `updated_at`.
    fn update(&self, entry: CodeEntry) -> InfraResult<CodeEntry>;

    fn find_by_id(&self, id: CodeId) -> InfraResult<Option<CodeEntry>>;

    /// Row plus its live descendants.
    fn find_by_id_with_children(&self, id: CodeId) -> InfraResult<Option<CodeTree>>;

    fn find_by_code(&self, code: &str) -> InfraResult<Option<CodeEntry>>;

    /// Row plus its live descendants, looked up by natural key.
    fn find_by_code_with_children(&self, code: &str) -> InfraResult<Option<CodeTree>>;

    /// Does a live entry under `parent_id` hold exactly `sequence`?
    fn exists_sibling_with_sequence(
        &self,
        parent_id: Option<CodeId>,
        sequence: i32,
    ) -> InfraResult<bool>;

    /// Live sibling with the highest sequence.
    fn find_top_sibling_by_sequence_desc(
        &self,
        parent_id: Option<CodeId>,
    ) -> InfraResult<Option<CodeEntry>>;

    /// Live siblings ordered by `(sequence, id)`.
    fn find_by_parent_id(&self, parent_id: Option<CodeId>) -> InfraResult<Vec<CodeEntry>>;

    /// Filtered rows ordered by id, cut to the requested page.
    fn find_by_condition(
        &self,
        page: PageRequest,
        filter: &CodeFilter,
    ) -> InfraResult<Page<CodeEntry>>;
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Rename/move a file.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
