//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::CodeId;

/// Domain errors represent business rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("code not found: #{0}")]
    NotFound(CodeId),

    #[error("code already exists: {0}")]
    Duplicate(String),

    #[error("invalid parent #{parent} for code #{id}: would create a cycle")]
    InvalidParent { id: CodeId, parent: CodeId },

    #[error("ancestor chain of #{0} exceeds the maximum depth")]
    AncestryTooDeep(CodeId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no sequence left above {0} in this sibling group")]
    SequenceOverflow(i32),
}
