//! Domain entities: core data structures

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sequence value meaning "append after the last sibling".
pub const UNSPECIFIED_SEQUENCE: i32 = 0;

/// Store-assigned identifier of a code entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeId(pub i64);

impl fmt::Display for CodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CodeId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A node in the forest of reference codes.
///
/// Children are not stored here; they are derived from `parent_id`
/// (see [`crate::domain::CodeTree`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub id: CodeId,
    /// Natural key, unique across all entries and never changed after creation
    pub code: String,
    pub name: String,
    /// `None` for root entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CodeId>,
    /// Order among siblings
    pub sequence: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CodeEntry {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_live(&self) -> bool {
        !self.deleted
    }

    /// Replace every mutable field from an update request.
    ///
    /// `id`, `code` and `created_at` are carried over; `updated_at` is left
    /// to the store.
    pub fn apply(&self, update: &CodeUpdate) -> Self {
        Self {
            id: self.id,
            code: self.code.clone(),
            name: update.name.clone(),
            parent_id: update.parent_id,
            sequence: update.sequence,
            description: update.description.clone(),
            deleted: update.deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Copy with only the sequence changed.
    pub fn with_sequence(&self, sequence: i32) -> Self {
        Self {
            sequence,
            ..self.clone()
        }
    }
}

impl fmt::Display for CodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (#{}, seq {})", self.code, self.name, self.id, self.sequence)?;
        if self.deleted {
            write!(f, " [deleted]")?;
        }
        Ok(())
    }
}

/// Request to create a new code entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewCode {
    pub code: String,
    pub name: String,
    pub parent_id: Option<CodeId>,
    /// [`UNSPECIFIED_SEQUENCE`] appends after the last sibling
    pub sequence: i32,
    pub description: Option<String>,
}

impl NewCode {
    pub fn root(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn child(code: impl Into<String>, name: impl Into<String>, parent_id: CodeId) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::root(code, name)
        }
    }

    pub fn with_sequence(mut self, sequence: i32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Full replacement of the mutable fields of an existing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUpdate {
    pub id: CodeId,
    pub name: String,
    pub parent_id: Option<CodeId>,
    pub sequence: i32,
    pub description: Option<String>,
    pub deleted: bool,
}

impl CodeUpdate {
    /// Update request pre-filled with the entry's current values.
    pub fn from_entry(entry: &CodeEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            parent_id: entry.parent_id,
            sequence: entry.sequence,
            description: entry.description.clone(),
            deleted: entry.deleted,
        }
    }
}

/// Insert record handed to the store once the sequence is settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeDraft {
    pub code: String,
    pub name: String,
    pub parent_id: Option<CodeId>,
    pub sequence: i32,
    pub description: Option<String>,
}

impl CodeDraft {
    pub fn from_new(new: NewCode, sequence: i32) -> Self {
        Self {
            code: new.code,
            name: new.name,
            parent_id: new.parent_id,
            sequence,
            description: new.description,
        }
    }
}

/// Parent selector for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter {
    /// Root entries only
    Root,
    /// Direct children of the given entry
    Id(CodeId),
}

/// Filter for paginated list queries. Empty filter matches every live entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeFilter {
    /// Exact natural key
    pub code: Option<String>,
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    pub parent: Option<ParentFilter>,
    pub include_deleted: bool,
}

impl CodeFilter {
    pub fn by_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &CodeEntry) -> bool {
        if entry.deleted && !self.include_deleted {
            return false;
        }
        if let Some(code) = &self.code {
            if &entry.code != code {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !entry.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        match self.parent {
            Some(ParentFilter::Root) => entry.parent_id.is_none(),
            Some(ParentFilter::Id(id)) => entry.parent_id == Some(id),
            None => true,
        }
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size: size.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, 10)
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
}

impl<T> Page<T> {
    /// Cut the requested page out of the full, already ordered result set.
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total_elements = all.len();
        let content = all
            .into_iter()
            .skip(request.offset())
            .take(request.size)
            .collect();
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total_elements.div_ceil(self.size.max(1))
    }

    pub fn has_next(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, code: &str, parent: Option<i64>) -> CodeEntry {
        let now = Utc::now();
        CodeEntry {
            id: CodeId(id),
            code: code.into(),
            name: format!("Name {code}"),
            parent_id: parent.map(CodeId),
            sequence: 1,
            description: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn given_update_when_applied_then_code_and_id_are_kept() {
        let original = entry(3, "COLOR", None);
        let update = CodeUpdate {
            id: CodeId(3),
            name: "Colour".into(),
            parent_id: Some(CodeId(1)),
            sequence: 7,
            description: Some("renamed".into()),
            deleted: true,
        };

        let applied = original.apply(&update);

        assert_eq!(applied.id, CodeId(3));
        assert_eq!(applied.code, "COLOR");
        assert_eq!(applied.name, "Colour");
        assert_eq!(applied.parent_id, Some(CodeId(1)));
        assert_eq!(applied.sequence, 7);
        assert!(applied.deleted);
        assert_eq!(applied.created_at, original.created_at);
    }

    #[test]
    fn given_filter_when_matching_then_honours_every_field() {
        let root = entry(1, "COLOR", None);
        let child = entry(2, "RED", Some(1));
        let mut gone = entry(3, "BLUE", Some(1));
        gone.deleted = true;

        let roots = CodeFilter {
            parent: Some(ParentFilter::Root),
            ..CodeFilter::default()
        };
        assert!(roots.matches(&root));
        assert!(!roots.matches(&child));

        let by_name = CodeFilter {
            name: Some("name r".into()),
            ..CodeFilter::default()
        };
        assert!(by_name.matches(&child));
        assert!(!by_name.matches(&root));

        let under_color = CodeFilter {
            parent: Some(ParentFilter::Id(CodeId(1))),
            ..CodeFilter::default()
        };
        assert!(!under_color.matches(&gone));
        assert!(CodeFilter {
            include_deleted: true,
            ..under_color
        }
        .matches(&gone));
    }

    #[test]
    fn given_eleven_items_when_slicing_pages_then_reports_totals() {
        let items: Vec<i32> = (1..=11).collect();

        let second = Page::slice(items.clone(), PageRequest::new(1, 5));
        assert_eq!(second.content, vec![6, 7, 8, 9, 10]);
        assert_eq!(second.total_pages(), 3);
        assert!(second.has_next());

        let last = Page::slice(items, PageRequest::new(2, 5));
        assert_eq!(last.content, vec![11]);
        assert!(!last.has_next());
    }

    #[test]
    fn given_last_possible_page_when_checking_next_then_no_overflow() {
        let page = Page::slice(vec![1, 2, 3], PageRequest::new(usize::MAX, 2));

        assert!(page.content.is_empty());
        assert!(!page.has_next());
    }

    #[test]
    fn given_zero_size_when_building_request_then_clamps_to_one() {
        assert_eq!(PageRequest::new(0, 0).size, 1);
    }
}
