//! Tests for sibling sequence allocation

use rstest::{fixture, rstest};

use codetree::application::sequencing::allocate;
use codetree::application::ApplicationError;
use codetree::domain::{CodeDraft, CodeEntry, CodeId, DomainError};
use codetree::infrastructure::traits::CodeRepository;
use codetree::infrastructure::InMemoryCodeRepository;
use codetree::util::testing;

#[fixture]
fn repo() -> InMemoryCodeRepository {
    testing::init_test_setup();
    InMemoryCodeRepository::new()
}

fn seed(repo: &InMemoryCodeRepository, parent: Option<CodeId>, sequences: &[i32]) -> Vec<CodeEntry> {
    let offset = repo.snapshot().len();
    sequences
        .iter()
        .enumerate()
        .map(|(i, &sequence)| {
            repo.insert(CodeDraft {
                code: format!("S{}", offset + i),
                name: format!("Sibling {}", offset + i),
                parent_id: parent,
                sequence,
                description: None,
            })
            .expect("insert sibling")
        })
        .collect()
}

#[rstest]
#[case::empty_group_appends_at_one(&[], 0, 1)]
#[case::appends_after_highest(&[1, 2, 7], 0, 8)]
#[case::free_value_is_taken(&[1, 2], 4, 4)]
#[case::taken_value_moves_up(&[5], 5, 6)]
#[case::walks_past_consecutive_run(&[5, 6, 7], 5, 8)]
#[case::stops_at_first_gap(&[5, 6, 8], 5, 7)]
#[case::negative_value_is_accepted(&[], -3, -3)]
#[case::largest_value_when_free(&[1], i32::MAX, i32::MAX)]
fn given_sibling_sequences_when_allocating_then_picks_expected_value(
    repo: InMemoryCodeRepository,
    #[case] existing: &[i32],
    #[case] requested: i32,
    #[case] expected: i32,
) {
    // Arrange
    let parent = seed(&repo, None, &[1])[0].id;
    seed(&repo, Some(parent), existing);

    // Act
    let allocated = allocate(&repo, requested, Some(parent)).unwrap();

    // Assert
    assert_eq!(allocated, expected);
}

#[rstest]
fn given_root_group_when_allocating_then_counts_only_roots(repo: InMemoryCodeRepository) {
    // Arrange: roots at 1 and 2, a child of the first root at 9
    let roots = seed(&repo, None, &[1, 2]);
    seed(&repo, Some(roots[0].id), &[9]);

    // Act
    let allocated = allocate(&repo, 0, None).unwrap();

    // Assert
    assert_eq!(allocated, 3);
}

#[rstest]
fn given_deleted_sibling_holding_value_when_allocating_then_value_is_free(
    repo: InMemoryCodeRepository,
) {
    // Arrange
    let parent = seed(&repo, None, &[1])[0].id;
    let sibling = seed(&repo, Some(parent), &[5]).remove(0);
    repo.update(CodeEntry {
        deleted: true,
        ..sibling
    })
    .unwrap();

    // Act
    let explicit = allocate(&repo, 5, Some(parent)).unwrap();
    let appended = allocate(&repo, 0, Some(parent)).unwrap();

    // Assert
    assert_eq!(explicit, 5);
    assert_eq!(appended, 1);
}

#[rstest]
#[case::append_after_largest(0)]
#[case::probe_past_largest(i32::MAX)]
fn given_sibling_at_largest_value_when_allocating_then_sequence_overflow(
    repo: InMemoryCodeRepository,
    #[case] requested: i32,
) {
    // Arrange
    let parent = seed(&repo, None, &[1])[0].id;
    seed(&repo, Some(parent), &[i32::MAX]);

    // Act
    let err = allocate(&repo, requested, Some(parent)).unwrap_err();

    // Assert
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::SequenceOverflow(i32::MAX))
    ));
}
