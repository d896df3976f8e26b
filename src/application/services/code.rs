//! Code management service
//!
//! Create/update with validation, sibling sequencing and root cache refresh;
//! lookups by id, natural key and filter.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::sequencing::{allocate, reorder};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    CodeDraft, CodeEntry, CodeFilter, CodeId, CodeTree, CodeUpdate, DomainError, NewCode, Page,
    PageRequest, MAX_ANCESTOR_DEPTH,
};
use crate::infrastructure::traits::CodeRepository;
use crate::infrastructure::{CacheGroup, TtlCache};

/// Service orchestrating code entries, their sibling order and the root cache.
///
/// Only live root entries are cached, keyed by code, together with their live
/// subtree. Every write re-reads the affected root from the store and
/// overwrites its cache entry, so a completed write is never followed by a
/// stale cached root.
pub struct CodeService {
    repo: Arc<dyn CodeRepository>,
    cache: Arc<TtlCache<CodeTree>>,
}

impl CodeService {
    /// Create a new code service.
    pub fn new(repo: Arc<dyn CodeRepository>, cache: Arc<TtlCache<CodeTree>>) -> Self {
        Self { repo, cache }
    }

    /// Create an entry, placing it among its siblings.
    ///
    /// # Errors
    /// - `Duplicate` if the code exists (soft-deleted rows included)
    /// - `NotFound` if the parent does not resolve to a live entry
    #[instrument(level = "debug", skip(self), fields(code = %new.code))]
    pub fn create(&self, new: NewCode) -> ApplicationResult<CodeEntry> {
        require_text("code", &new.code)?;
        require_text("name", &new.name)?;
        self.ensure_code_is_free(&new.code)?;

        if let Some(parent_id) = new.parent_id {
            self.find_by_id(parent_id)?;
        }

        let sequence = allocate(self.repo.as_ref(), new.sequence, new.parent_id)?;
        let saved = self.repo.insert(CodeDraft::from_new(new, sequence))?;
        info!(
            "created {} (#{}) under {:?} at {}",
            saved.code, saved.id, saved.parent_id, saved.sequence
        );

        self.refresh_tree_of(&saved)?;
        Ok(saved)
    }

    /// Replace every mutable field of an entry and resolve sibling collisions.
    ///
    /// Siblings left behind in the old parent group keep their sequences.
    ///
    /// # Errors
    /// - `NotFound` if the entry or the new parent does not resolve to a live entry
    /// - `InvalidParent` if the new parent is the entry itself or below it
    #[instrument(level = "debug", skip(self), fields(id = %update.id))]
    pub fn update(&self, update: CodeUpdate) -> ApplicationResult<CodeEntry> {
        require_text("name", &update.name)?;

        if let Some(parent_id) = update.parent_id {
            self.find_by_id(parent_id)?;
            self.ensure_not_descendant(update.id, parent_id)?;
        }

        let current = self.find_by_id(update.id)?;
        let old_root = self.root_of(&current)?;

        let updated = self.repo.update(current.apply(&update))?;
        info!(
            "updated {} (#{}) under {:?} at {}",
            updated.code, updated.id, updated.parent_id, updated.sequence
        );

        if updated.is_live() {
            reorder(
                self.repo.as_ref(),
                updated.id,
                updated.sequence,
                updated.parent_id,
            )?;
        }

        let new_root = self.refresh_tree_of(&updated)?;
        if new_root.id != old_root.id {
            self.refresh_root(&old_root.code)?;
        }
        Ok(updated)
    }

    /// Live entry by id.
    pub fn find_by_id(&self, id: CodeId) -> ApplicationResult<CodeEntry> {
        self.repo
            .find_by_id(id)?
            .filter(CodeEntry::is_live)
            .ok_or_else(|| DomainError::NotFound(id).into())
    }

    /// Live entry by id with its live subtree.
    pub fn find_by_id_with_children(&self, id: CodeId) -> ApplicationResult<CodeTree> {
        self.repo
            .find_by_id_with_children(id)?
            .filter(|tree| tree.root_entry().is_live())
            .ok_or_else(|| DomainError::NotFound(id).into())
    }

    /// Entry with its subtree by natural key, served from the cache when possible.
    ///
    /// A store hit is cached only if it is a root entry.
    #[instrument(level = "debug", skip(self))]
    pub fn find_by_code(&self, code: &str) -> ApplicationResult<Option<CodeTree>> {
        if let Some(cached) = self.cache.get_in(CacheGroup::Code, code) {
            debug!("find_by_code: cache hit for {}", code);
            return Ok(Some(cached));
        }

        let found = self
            .repo
            .find_by_code_with_children(code)?
            .filter(|tree| tree.root_entry().is_live());

        if let Some(tree) = &found {
            if tree.root_entry().is_root() {
                debug!("find_by_code: caching root {}", code);
                self.cache.put_in(CacheGroup::Code, code, tree.clone());
            }
        }
        Ok(found)
    }

    /// Filtered, paginated entries. Not cached.
    pub fn find_by_condition(
        &self,
        page: PageRequest,
        filter: &CodeFilter,
    ) -> ApplicationResult<Page<CodeEntry>> {
        Ok(self.repo.find_by_condition(page, filter)?)
    }

    /// Filtered, paginated entries, each with its live subtree. Not cached.
    pub fn find_by_condition_with_children(
        &self,
        page: PageRequest,
        filter: &CodeFilter,
    ) -> ApplicationResult<Page<CodeTree>> {
        let entries = self.repo.find_by_condition(page, filter)?;
        let mut trees = Vec::with_capacity(entries.content.len());
        for entry in &entries.content {
            let tree = self
                .repo
                .find_by_id_with_children(entry.id)?
                .unwrap_or_else(|| CodeTree::leaf(entry.clone()));
            trees.push(tree);
        }
        Ok(Page {
            content: trees,
            page: entries.page,
            size: entries.size,
            total_elements: entries.total_elements,
        })
    }

    /// Drop one cached root; returns whether it was cached.
    pub fn evict_cached(&self, code: &str) -> bool {
        self.cache.evict_in(CacheGroup::Code, code)
    }

    /// Drop every cached root; returns how many were cached.
    pub fn clear_cache(&self) -> usize {
        self.cache.clear_group(CacheGroup::Code)
    }

    fn ensure_code_is_free(&self, code: &str) -> ApplicationResult<()> {
        let filter = CodeFilter {
            include_deleted: true,
            ..CodeFilter::by_code(code)
        };
        let existing = self.repo.find_by_condition(PageRequest::new(0, 1), &filter)?;
        if existing.content.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Duplicate(code.to_string()).into())
        }
    }

    /// Reject a parent that is `id` itself or one of its descendants.
    fn ensure_not_descendant(&self, id: CodeId, parent_id: CodeId) -> ApplicationResult<()> {
        let mut current = Some(parent_id);
        for _ in 0..MAX_ANCESTOR_DEPTH {
            let Some(ancestor) = current else {
                return Ok(());
            };
            if ancestor == id {
                return Err(DomainError::InvalidParent {
                    id,
                    parent: parent_id,
                }
                .into());
            }
            current = self
                .repo
                .find_by_id(ancestor)?
                .ok_or(DomainError::NotFound(ancestor))?
                .parent_id;
        }
        Err(DomainError::AncestryTooDeep(parent_id).into())
    }

    /// Walk parent links up to the root entry.
    fn root_of(&self, entry: &CodeEntry) -> ApplicationResult<CodeEntry> {
        let mut current = entry.clone();
        for _ in 0..MAX_ANCESTOR_DEPTH {
            let Some(parent_id) = current.parent_id else {
                return Ok(current);
            };
            current = self
                .repo
                .find_by_id(parent_id)?
                .ok_or(DomainError::NotFound(parent_id))?;
        }
        Err(DomainError::AncestryTooDeep(entry.id).into())
    }

    fn refresh_tree_of(&self, entry: &CodeEntry) -> ApplicationResult<CodeEntry> {
        let root = self.root_of(entry)?;
        self.refresh_root(&root.code)?;
        Ok(root)
    }

    /// Re-read a root from the store and overwrite its cache entry.
    fn refresh_root(&self, code: &str) -> ApplicationResult<()> {
        match self.repo.find_by_code_with_children(code)? {
            Some(tree) if tree.root_entry().is_live() && tree.root_entry().is_root() => {
                debug!("refresh: caching root {}", code);
                self.cache.put_in(CacheGroup::Code, code, tree);
            }
            _ => {
                debug!("refresh: evicting {}", code);
                self.cache.evict_in(CacheGroup::Code, code);
            }
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), ApplicationError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidInput(format!("{field} must not be blank")).into());
    }
    Ok(())
}
