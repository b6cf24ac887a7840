use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn edits_of<T: PartialEq>(old: &[T], new: &[T]) -> Vec<DiffEdit> {
	diff(&(old, new))
}

fn replay<T: Clone>(old: &[T], new: &[T], edits: &[DiffEdit]) -> Vec<T> {
	let mut out = Vec::with_capacity(new.len());
	let mut next = 0;
	for edit in edits {
		match *edit {
			DiffEdit::Delete { position } => {
				out.extend_from_slice(&old[next..position]);
				next = position + 1;
			}
			DiffEdit::Insert { position, source } => {
				out.extend_from_slice(&old[next..position]);
				next = position;
				out.push(new[source].clone());
			}
		}
	}
	out.extend_from_slice(&old[next..]);
	out
}

/// Classic dynamic-programming LCS length.
fn lcs_len<T: PartialEq>(old: &[T], new: &[T]) -> usize {
	let mut table = vec![vec![0usize; new.len() + 1]; old.len() + 1];
	for i in (0..old.len()).rev() {
		for j in (0..new.len()).rev() {
			table[i][j] = if old[i] == new[j] {
				table[i + 1][j + 1] + 1
			} else {
				table[i + 1][j].max(table[i][j + 1])
			};
		}
	}
	table[0][0]
}

#[test]
fn equal_sequences_produce_no_edits() {
	let seq = [1, 2, 3, 4];
	assert!(edits_of(&seq, &seq).is_empty());
	assert!(edits_of::<u8>(&[], &[]).is_empty());
}

#[test]
fn empty_old_inserts_everything_at_zero() {
	let edits = edits_of(&[], &['a', 'b', 'c']);
	assert_eq!(
		edits,
		vec![
			DiffEdit::Insert { position: 0, source: 0 },
			DiffEdit::Insert { position: 0, source: 1 },
			DiffEdit::Insert { position: 0, source: 2 },
		]
	);
	assert_eq!(hunks(&edits), vec![DiffHunk { old: 0..0, new: 0..3 }]);
}

#[test]
fn empty_new_deletes_everything() {
	let edits = edits_of(&['a', 'b'], &[]);
	assert_eq!(edits, vec![DiffEdit::Delete { position: 0 }, DiffEdit::Delete { position: 1 }]);
	assert_eq!(hunks(&edits), vec![DiffHunk { old: 0..2, new: 0..0 }]);
}

#[test]
fn textbook_example_has_distance_five() {
	let old: Vec<char> = "ABCABBA".chars().collect();
	let new: Vec<char> = "CBABAC".chars().collect();
	let edits = edits_of(&old, &new);
	assert_eq!(edits.len(), 5);
	assert_eq!(replay(&old, &new, &edits), new);
}

#[test]
fn separate_changes_form_separate_hunks() {
	let old: Vec<char> = "the quick fox".chars().collect();
	let new: Vec<char> = "the slow fox!".chars().collect();
	let edits = edits_of(&old, &new);
	assert_eq!(replay(&old, &new, &edits), new);

	let hunks = hunks(&edits);
	assert_eq!(hunks.len(), 2);
	assert_eq!(hunks[1], DiffHunk { old: 13..13, new: 12..13 });
	for hunk in &hunks {
		assert!(hunk.old.start <= hunk.old.end);
		assert!(!hunk.old.is_empty() || !hunk.new.is_empty());
	}
}

#[test]
fn hunk_new_ranges_track_shift() {
	// delete "b", then insert "x" after "c"
	let old = ['a', 'b', 'c', 'd'];
	let new = ['a', 'c', 'x', 'd'];
	let hunks = hunks(&edits_of(&old, &new));
	assert_eq!(
		hunks,
		vec![DiffHunk { old: 1..2, new: 1..1 }, DiffHunk { old: 3..3, new: 2..3 }]
	);
}

proptest! {
	#[test]
	fn replay_reproduces_new(old in prop::collection::vec(0u8..4, 0..40), new in prop::collection::vec(0u8..4, 0..40)) {
		let edits = edits_of(&old, &new);
		prop_assert_eq!(replay(&old, &new, &edits), new);
	}

	#[test]
	fn edit_count_is_minimal(old in prop::collection::vec(0u8..3, 0..30), new in prop::collection::vec(0u8..3, 0..30)) {
		let edits = edits_of(&old, &new);
		let lcs = lcs_len(&old, &new);
		prop_assert_eq!(edits.len(), old.len() + new.len() - 2 * lcs);
	}

	#[test]
	fn edits_are_sorted_by_position(old in prop::collection::vec(0u8..4, 0..40), new in prop::collection::vec(0u8..4, 0..40)) {
		let edits = edits_of(&old, &new);
		prop_assert!(edits.windows(2).all(|pair| pair[0].position() <= pair[1].position()));
	}
}
