//! Sibling sequence allocation and collision resolution.
//!
//! Both operations are pure computation over store data. They fail on store
//! errors, passed through unchanged, and with
//! [`DomainError::SequenceOverflow`] when a sibling group runs out of `i32`.

use tracing::{debug, info};

use crate::application::ApplicationResult;
use crate::domain::{CodeId, DomainError, UNSPECIFIED_SEQUENCE};
use crate::infrastructure::traits::CodeRepository;

/// The value after `sequence`, or an error at the end of the range.
fn next_sequence(sequence: i32) -> Result<i32, DomainError> {
    sequence
        .checked_add(1)
        .ok_or(DomainError::SequenceOverflow(sequence))
}

/// Pick the sequence for an entry joining the sibling group of `parent_id`.
///
/// [`UNSPECIFIED_SEQUENCE`] appends after the highest sibling (1 for an empty
/// group). Any other value is taken if free, otherwise the next free value
/// above it; every candidate costs one store query.
pub fn allocate(
    repo: &dyn CodeRepository,
    requested: i32,
    parent_id: Option<CodeId>,
) -> ApplicationResult<i32> {
    if requested == UNSPECIFIED_SEQUENCE {
        let last = repo
            .find_top_sibling_by_sequence_desc(parent_id)?
            .map(|top| top.sequence)
            .unwrap_or(0);
        debug!("allocate: parent={:?} appended after {}", parent_id, last);
        return next_sequence(last).map_err(Into::into);
    }

    let mut candidate = requested;
    while repo.exists_sibling_with_sequence(parent_id, candidate)? {
        candidate = next_sequence(candidate)?;
    }
    debug!(
        "allocate: parent={:?} requested={} allocated={}",
        parent_id, requested, candidate
    );
    Ok(candidate)
}

/// Push siblings forward after `moved_id` has been written with `new_sequence`.
///
/// Only siblings at or above `new_sequence` are candidates. Walking them in
/// `(sequence, id)` order with a frontier starting at `new_sequence`, a
/// sibling is moved to `frontier + 1` (and the frontier follows) when its
/// sequence equals the frontier or equals `new_sequence`; anything else stays
/// where it is. Sequences only ever grow.
///
/// Each shifted sibling is a separate write with no rollback: on failure the
/// rows already written stay written and the error is returned. Siblings
/// holding `new_sequence` are shifted first, so once they are written a retry
/// with the same arguments finds no collision and is a no-op. Siblings left
/// sharing a value have to be repaired by hand.
///
/// A shift past `i32::MAX` fails with [`DomainError::SequenceOverflow`]
/// before that sibling is written.
///
/// Returns the number of siblings rewritten.
pub fn reorder(
    repo: &dyn CodeRepository,
    moved_id: CodeId,
    new_sequence: i32,
    parent_id: Option<CodeId>,
) -> ApplicationResult<usize> {
    let siblings = repo.find_by_parent_id(parent_id)?;

    let collides = siblings
        .iter()
        .any(|s| s.id != moved_id && s.sequence == new_sequence);
    if !collides {
        debug!(
            "reorder: #{} at {} under {:?} collides with nothing",
            moved_id, new_sequence, parent_id
        );
        return Ok(0);
    }

    let mut frontier = new_sequence;
    let mut shifted = 0;
    for sibling in siblings
        .into_iter()
        .filter(|s| s.id != moved_id && s.sequence >= new_sequence)
    {
        // Siblings duplicating the target move as well, even past a gap.
        if sibling.sequence == frontier || sibling.sequence == new_sequence {
            frontier = next_sequence(frontier)?;
            debug!(
                "reorder: #{} {} -> {}",
                sibling.id, sibling.sequence, frontier
            );
            repo.update(sibling.with_sequence(frontier))?;
            shifted += 1;
        }
    }

    info!(
        "reorder: shifted {} siblings of #{} under {:?}",
        shifted, moved_id, parent_id
    );
    Ok(shifted)
}
