//! Code stores: an in-process table and its TOML-file-backed variant.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use generational_arena::{Arena, Index};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{CodeDraft, CodeEntry, CodeFilter, CodeId, CodeTree, Page, PageRequest};
use crate::infrastructure::traits::{CodeRepository, FileSystem};
use crate::infrastructure::{InfraError, InfraResult};

/// Row storage: entries in an arena, indexed by id and by natural key.
#[derive(Debug, Clone)]
pub struct CodeTable {
    rows: Arena<CodeEntry>,
    by_id: HashMap<CodeId, Index>,
    by_code: HashMap<String, Index>,
    next_id: i64,
}

impl Default for CodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeTable {
    pub fn new() -> Self {
        Self {
            rows: Arena::new(),
            by_id: HashMap::new(),
            by_code: HashMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a table from persisted rows.
    pub fn from_rows(rows: Vec<CodeEntry>, next_id: i64) -> InfraResult<Self> {
        let mut table = Self::new();
        for row in rows {
            if table.by_code.contains_key(&row.code) || table.by_id.contains_key(&row.id) {
                return Err(InfraError::UniqueViolation(row.code));
            }
            table.next_id = table.next_id.max(row.id.0 + 1);
            table.index(row);
        }
        table.next_id = table.next_id.max(next_id);
        Ok(table)
    }

    fn index(&mut self, row: CodeEntry) {
        let id = row.id;
        let code = row.code.clone();
        let idx = self.rows.insert(row);
        self.by_id.insert(id, idx);
        self.by_code.insert(code, idx);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// All rows ordered by id.
    pub fn rows(&self) -> Vec<CodeEntry> {
        let mut rows: Vec<CodeEntry> = self.rows.iter().map(|(_, row)| row.clone()).collect();
        rows.sort_by_key(|row| row.id);
        rows
    }

    pub fn insert(&mut self, draft: CodeDraft) -> InfraResult<CodeEntry> {
        if self.by_code.contains_key(&draft.code) {
            return Err(InfraError::UniqueViolation(draft.code));
        }
        let now = Utc::now();
        let row = CodeEntry {
            id: CodeId(self.next_id),
            code: draft.code,
            name: draft.name,
            parent_id: draft.parent_id,
            sequence: draft.sequence,
            description: draft.description,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.next_id += 1;
        self.index(row.clone());
        Ok(row)
    }

    pub fn update(&mut self, entry: CodeEntry) -> InfraResult<CodeEntry> {
        let idx = *self.by_id.get(&entry.id).ok_or(InfraError::Missing(entry.id))?;
        let previous_code = self.rows[idx].code.clone();
        if previous_code != entry.code {
            if self.by_code.contains_key(&entry.code) {
                return Err(InfraError::UniqueViolation(entry.code));
            }
            self.by_code.remove(&previous_code);
            self.by_code.insert(entry.code.clone(), idx);
        }
        let row = CodeEntry {
            updated_at: Utc::now(),
            ..entry
        };
        self.rows[idx] = row.clone();
        Ok(row)
    }

    pub fn get(&self, id: CodeId) -> Option<&CodeEntry> {
        self.by_id.get(&id).and_then(|&idx| self.rows.get(idx))
    }

    pub fn get_by_code(&self, code: &str) -> Option<&CodeEntry> {
        self.by_code.get(code).and_then(|&idx| self.rows.get(idx))
    }

    /// Live siblings ordered by `(sequence, id)`.
    pub fn siblings(&self, parent_id: Option<CodeId>) -> Vec<CodeEntry> {
        let mut siblings: Vec<CodeEntry> = self
            .rows
            .iter()
            .map(|(_, row)| row)
            .filter(|row| row.is_live() && row.parent_id == parent_id)
            .cloned()
            .collect();
        siblings.sort_by_key(|row| (row.sequence, row.id));
        siblings
    }

    pub fn subtree(&self, root: &CodeEntry) -> CodeTree {
        CodeTree::build(root.clone(), |id| self.siblings(Some(id)))
    }

    pub fn filter(&self, page: PageRequest, filter: &CodeFilter) -> Page<CodeEntry> {
        let matching: Vec<CodeEntry> = self
            .rows()
            .into_iter()
            .filter(|row| filter.matches(row))
            .collect();
        Page::slice(matching, page)
    }
}

/// Code store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCodeRepository {
    table: RwLock<CodeTable>,
}

impl InMemoryCodeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: CodeTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Copy of the current table.
    pub fn snapshot(&self) -> CodeTable {
        self.table.read().clone()
    }
}

impl CodeRepository for InMemoryCodeRepository {
    #[instrument(level = "trace", skip(self))]
    fn insert(&self, draft: CodeDraft) -> InfraResult<CodeEntry> {
        self.table.write().insert(draft)
    }

    #[instrument(level = "trace", skip(self))]
    fn update(&self, entry: CodeEntry) -> InfraResult<CodeEntry> {
        self.table.write().update(entry)
    }

    fn find_by_id(&self, id: CodeId) -> InfraResult<Option<CodeEntry>> {
        Ok(self.table.read().get(id).cloned())
    }

    fn find_by_id_with_children(&self, id: CodeId) -> InfraResult<Option<CodeTree>> {
        let table = self.table.read();
        Ok(table.get(id).map(|root| table.subtree(root)))
    }

    fn find_by_code(&self, code: &str) -> InfraResult<Option<CodeEntry>> {
        Ok(self.table.read().get_by_code(code).cloned())
    }

    fn find_by_code_with_children(&self, code: &str) -> InfraResult<Option<CodeTree>> {
        let table = self.table.read();
        Ok(table.get_by_code(code).map(|root| table.subtree(root)))
    }

    fn exists_sibling_with_sequence(
        &self,
        parent_id: Option<CodeId>,
        sequence: i32,
    ) -> InfraResult<bool> {
        Ok(self
            .table
            .read()
            .siblings(parent_id)
            .iter()
            .any(|row| row.sequence == sequence))
    }

    fn find_top_sibling_by_sequence_desc(
        &self,
        parent_id: Option<CodeId>,
    ) -> InfraResult<Option<CodeEntry>> {
        Ok(self.table.read().siblings(parent_id).pop())
    }

    fn find_by_parent_id(&self, parent_id: Option<CodeId>) -> InfraResult<Vec<CodeEntry>> {
        Ok(self.table.read().siblings(parent_id))
    }

    fn find_by_condition(
        &self,
        page: PageRequest,
        filter: &CodeFilter,
    ) -> InfraResult<Page<CodeEntry>> {
        Ok(self.table.read().filter(page, filter))
    }
}

/// On-disk layout of the code store.
#[derive(Debug, Serialize, Deserialize, Default)]
struct CodeFile {
    #[serde(default)]
    next_id: i64,
    #[serde(default)]
    codes: Vec<CodeEntry>,
}

/// Code store persisted to a TOML file after every write.
///
/// Writes go to a copy of the table which replaces the live one only after the
/// file has been written, so a failed write leaves both unchanged.
pub struct FileCodeRepository {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    inner: InMemoryCodeRepository,
}

impl FileCodeRepository {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(fs: Arc<dyn FileSystem>, path: &Path) -> InfraResult<Self> {
        debug!("open: path={}", path.display());
        let table = if fs.exists(path) {
            let content = fs
                .read_to_string(path)
                .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
            let file: CodeFile = toml::from_str(&content).map_err(|e| InfraError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            CodeTable::from_rows(file.codes, file.next_id)?
        } else {
            CodeTable::new()
        };
        debug!("open: loaded {} codes", table.len());

        Ok(Self {
            fs,
            path: path.to_path_buf(),
            inner: InMemoryCodeRepository::from_table(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, table: &CodeTable) -> InfraResult<()> {
        let file = CodeFile {
            next_id: table.next_id(),
            codes: table.rows(),
        };
        let content = toml::to_string_pretty(&file).map_err(|e| InfraError::Serialize {
            message: e.to_string(),
        })?;

        self.fs
            .ensure_parent(&self.path)
            .map_err(|e| InfraError::io(format!("create parent of {}", self.path.display()), e))?;
        let tmp = self.path.with_extension("toml.tmp");
        self.fs
            .write(&tmp, &content)
            .map_err(|e| InfraError::io(format!("write {}", tmp.display()), e))?;
        self.fs
            .rename(&tmp, &self.path)
            .map_err(|e| InfraError::io(format!("replace {}", self.path.display()), e))
    }

    fn write_with<T>(
        &self,
        op: impl FnOnce(&mut CodeTable) -> InfraResult<T>,
    ) -> InfraResult<T> {
        let mut live = self.inner.table.write();
        let mut staged = live.clone();
        let result = op(&mut staged)?;
        self.persist(&staged)?;
        *live = staged;
        Ok(result)
    }
}

impl CodeRepository for FileCodeRepository {
    #[instrument(level = "trace", skip(self))]
    fn insert(&self, draft: CodeDraft) -> InfraResult<CodeEntry> {
        self.write_with(|table| table.insert(draft))
    }

    #[instrument(level = "trace", skip(self))]
    fn update(&self, entry: CodeEntry) -> InfraResult<CodeEntry> {
        self.write_with(|table| table.update(entry))
    }

    fn find_by_id(&self, id: CodeId) -> InfraResult<Option<CodeEntry>> {
        self.inner.find_by_id(id)
    }

    fn find_by_id_with_children(&self, id: CodeId) -> InfraResult<Option<CodeTree>> {
        self.inner.find_by_id_with_children(id)
    }

    fn find_by_code(&self, code: &str) -> InfraResult<Option<CodeEntry>> {
        self.inner.find_by_code(code)
    }

    fn find_by_code_with_children(&self, code: &str) -> InfraResult<Option<CodeTree>> {
        self.inner.find_by_code_with_children(code)
    }

    fn exists_sibling_with_sequence(
        &self,
        parent_id: Option<CodeId>,
        sequence: i32,
    ) -> InfraResult<bool> {
        self.inner.exists_sibling_with_sequence(parent_id, sequence)
    }

    fn find_top_sibling_by_sequence_desc(
        &self,
        parent_id: Option<CodeId>,
    ) -> InfraResult<Option<CodeEntry>> {
        self.inner.find_top_sibling_by_sequence_desc(parent_id)
    }

    fn find_by_parent_id(&self, parent_id: Option<CodeId>) -> InfraResult<Vec<CodeEntry>> {
        self.inner.find_by_parent_id(parent_id)
    }

    fn find_by_condition(
        &self,
        page: PageRequest,
        filter: &CodeFilter,
    ) -> InfraResult<Page<CodeEntry>> {
        self.inner.find_by_condition(page, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(code: &str, parent: Option<CodeId>, sequence: i32) -> CodeDraft {
        CodeDraft {
            code: code.into(),
            name: code.to_lowercase(),
            parent_id: parent,
            sequence,
            description: None,
        }
    }

    #[test]
    fn given_inserts_when_reading_then_ids_are_sequential() {
        let repo = InMemoryCodeRepository::new();

        let a = repo.insert(draft("A", None, 1)).unwrap();
        let b = repo.insert(draft("B", None, 2)).unwrap();

        assert_eq!(a.id, CodeId(1));
        assert_eq!(b.id, CodeId(2));
        assert_eq!(repo.find_by_code("B").unwrap().map(|e| e.id), Some(CodeId(2)));
    }

    #[test]
    fn given_existing_code_when_inserting_then_unique_violation() {
        let repo = InMemoryCodeRepository::new();
        repo.insert(draft("A", None, 1)).unwrap();

        let err = repo.insert(draft("A", None, 2)).unwrap_err();

        assert!(matches!(err, InfraError::UniqueViolation(code) if code == "A"));
    }

    #[test]
    fn given_deleted_sibling_when_querying_siblings_then_it_is_ignored() {
        let repo = InMemoryCodeRepository::new();
        repo.insert(draft("A", None, 1)).unwrap();
        let b = repo.insert(draft("B", None, 5)).unwrap();
        repo.update(CodeEntry {
            deleted: true,
            ..b
        })
        .unwrap();

        assert!(!repo.exists_sibling_with_sequence(None, 5).unwrap());
        assert_eq!(
            repo.find_top_sibling_by_sequence_desc(None)
                .unwrap()
                .map(|e| e.code),
            Some("A".to_string())
        );
        // raw lookups still see the row
        assert!(repo.find_by_code("B").unwrap().unwrap().deleted);
    }

    #[test]
    fn given_unknown_id_when_updating_then_missing() {
        let repo = InMemoryCodeRepository::new();
        let a = repo.insert(draft("A", None, 1)).unwrap();

        let err = repo
            .update(CodeEntry {
                id: CodeId(42),
                ..a
            })
            .unwrap_err();

        assert!(matches!(err, InfraError::Missing(CodeId(42))));
    }

    #[test]
    fn given_rows_when_rebuilding_table_then_next_id_follows_max() {
        let repo = InMemoryCodeRepository::new();
        repo.insert(draft("A", None, 1)).unwrap();
        repo.insert(draft("B", None, 2)).unwrap();
        let rows = repo.snapshot().rows();

        let table = CodeTable::from_rows(rows, 0).unwrap();

        assert_eq!(table.next_id(), 3);
        assert_eq!(table.len(), 2);
    }
}
