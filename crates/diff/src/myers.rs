//! Linear-space Myers diff.
//!
//! Forward and reverse frontiers are advanced one edit at a time until they overlap on a
//! diagonal; the overlap point (the middle snake) splits the problem in two and each half is
//! solved recursively. Common prefixes and suffixes are stripped before every split, so equal
//! runs never reach the frontier search.

use std::ops::{Index, IndexMut, Range};

/// Two sequences compared element-wise by index.
pub trait DiffSequences {
	fn old_len(&self) -> usize;
	fn new_len(&self) -> usize;
	/// Whether `old[old_index]` equals `new[new_index]`.
	fn equal(&self, old_index: usize, new_index: usize) -> bool;
}

impl<T: PartialEq> DiffSequences for (&[T], &[T]) {
	fn old_len(&self) -> usize {
		self.0.len()
	}

	fn new_len(&self) -> usize {
		self.1.len()
	}

	fn equal(&self, old_index: usize, new_index: usize) -> bool {
		self.0[old_index] == self.1[new_index]
	}
}

/// One step of an edit script, in old-sequence coordinates.
///
/// `Insert` places `new[source]` before `old[position]`; `Delete` removes `old[position]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffEdit {
	Insert { position: usize, source: usize },
	Delete { position: usize },
}

impl DiffEdit {
	pub fn position(self) -> usize {
		match self {
			Self::Insert { position, .. } | Self::Delete { position } => position,
		}
	}
}

/// A maximal run of adjacent edits: `old[old]` is replaced by `new[new]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiffHunk {
	pub old: Range<usize>,
	pub new: Range<usize>,
}

/// Computes a minimal edit script turning the old sequence into the new one.
///
/// Edits come out sorted by position, so replaying them left to right reproduces the new sequence.
pub fn diff<S: DiffSequences + ?Sized>(sequences: &S) -> Vec<DiffEdit> {
	let old_len = sequences.old_len();
	let new_len = sequences.new_len();
	let max_d = max_d(old_len, new_len);
	let mut forward = Frontier::new(max_d);
	let mut backward = Frontier::new(max_d);
	let mut edits = Vec::new();
	conquer(sequences, 0..old_len, 0..new_len, &mut forward, &mut backward, &mut edits);
	edits
}

/// Groups an ordered edit script into hunks.
pub fn hunks(edits: &[DiffEdit]) -> Vec<DiffHunk> {
	let mut hunks: Vec<DiffHunk> = Vec::new();
	// new index minus old index for elements outside every hunk seen so far
	let mut shift: isize = 0;

	for &edit in edits {
		let position = edit.position();
		let extends = matches!(hunks.last(), Some(hunk) if hunk.old.end == position);
		if !extends {
			let new_start = position.saturating_add_signed(shift);
			hunks.push(DiffHunk {
				old: position..position,
				new: new_start..new_start,
			});
		}
		let Some(hunk) = hunks.last_mut() else {
			continue;
		};
		match edit {
			DiffEdit::Delete { .. } => {
				hunk.old.end += 1;
				shift -= 1;
			}
			DiffEdit::Insert { source, .. } => {
				debug_assert_eq!(source, hunk.new.end, "inserted elements must be contiguous");
				hunk.new.end += 1;
				shift += 1;
			}
		}
	}

	hunks
}

fn max_d(old_len: usize, new_len: usize) -> usize {
	(old_len + new_len).div_ceil(2) + 1
}

/// Furthest-reaching x per diagonal `k = x - y`, indexed by signed diagonal.
struct Frontier {
	offset: isize,
	v: Vec<usize>,
}

impl Frontier {
	fn new(max_d: usize) -> Self {
		Self {
			offset: max_d as isize,
			v: vec![0; 2 * max_d],
		}
	}
}

impl Index<isize> for Frontier {
	type Output = usize;

	fn index(&self, k: isize) -> &usize {
		&self.v[(k + self.offset) as usize]
	}
}

impl IndexMut<isize> for Frontier {
	fn index_mut(&mut self, k: isize) -> &mut usize {
		&mut self.v[(k + self.offset) as usize]
	}
}

fn common_prefix_len<S: DiffSequences + ?Sized>(sequences: &S, old: Range<usize>, new: Range<usize>) -> usize {
	old.zip(new).take_while(|&(o, n)| sequences.equal(o, n)).count()
}

fn common_suffix_len<S: DiffSequences + ?Sized>(sequences: &S, old: Range<usize>, new: Range<usize>) -> usize {
	old.rev().zip(new.rev()).take_while(|&(o, n)| sequences.equal(o, n)).count()
}

/// Finds the middle snake of `old` x `new`, returning the split point `(x, y)`.
///
/// Both ranges must be non-empty and the frontiers sized for at least their combined length.
fn find_middle_snake<S: DiffSequences + ?Sized>(
	sequences: &S,
	old: Range<usize>,
	new: Range<usize>,
	forward: &mut Frontier,
	backward: &mut Frontier,
) -> Option<(usize, usize)> {
	let n = old.len();
	let m = new.len();
	// Sum of the lengths is odd iff the delta is odd, in which case the forward pass detects
	// the overlap; otherwise the backward pass does.
	let delta = n as isize - m as isize;
	let odd = delta & 1 == 1;

	forward[1] = 0;
	backward[1] = 0;

	let d_max = max_d(n, m) as isize;
	for d in 0..d_max {
		// forward path
		for k in (-d..=d).rev().step_by(2) {
			let mut x = if k == -d || (k != d && forward[k - 1] < forward[k + 1]) {
				forward[k + 1]
			} else {
				forward[k - 1] + 1
			};
			let y = (x as isize - k) as usize;
			let (x0, y0) = (x, y);
			if x < n && y < m {
				x += common_prefix_len(sequences, old.start + x..old.end, new.start + y..new.end);
			}
			forward[k] = x;

			if odd && (k - delta).abs() <= d - 1 && forward[k] + backward[-(k - delta)] >= n {
				return Some((old.start + x0, new.start + y0));
			}
		}

		// backward path
		for k in (-d..=d).rev().step_by(2) {
			let mut x = if k == -d || (k != d && backward[k - 1] < backward[k + 1]) {
				backward[k + 1]
			} else {
				backward[k - 1] + 1
			};
			let mut y = (x as isize - k) as usize;
			if x < n && y < m {
				let advance = common_suffix_len(sequences, old.start..old.start + n - x, new.start..new.start + m - y);
				x += advance;
				y += advance;
			}
			backward[k] = x;

			if !odd && (k - delta).abs() <= d && backward[k] + forward[-(k - delta)] >= n {
				return Some((old.start + n - x, new.start + m - y));
			}
		}
	}

	None
}

fn conquer<S: DiffSequences + ?Sized>(
	sequences: &S,
	mut old: Range<usize>,
	mut new: Range<usize>,
	forward: &mut Frontier,
	backward: &mut Frontier,
	edits: &mut Vec<DiffEdit>,
) {
	let prefix = common_prefix_len(sequences, old.clone(), new.clone());
	old.start += prefix;
	new.start += prefix;

	let suffix = common_suffix_len(sequences, old.clone(), new.clone());
	old.end -= suffix;
	new.end -= suffix;

	if old.is_empty() && new.is_empty() {
		return;
	}
	if new.is_empty() {
		edits.extend(old.map(|position| DiffEdit::Delete { position }));
		return;
	}
	if old.is_empty() {
		let position = old.start;
		edits.extend(new.map(|source| DiffEdit::Insert { position, source }));
		return;
	}

	match find_middle_snake(sequences, old.clone(), new.clone(), forward, backward) {
		Some((x, y)) => {
			conquer(sequences, old.start..x, new.start..y, forward, backward, edits);
			conquer(sequences, x..old.end, y..new.end, forward, backward, edits);
		}
		None => {
			// Not reachable for consistent equality predicates; degrade to a full replacement.
			tracing::debug!(old_len = old.len(), new_len = new.len(), "diff.middle_snake_missing");
			let position = old.end;
			edits.extend(old.map(|position| DiffEdit::Delete { position }));
			edits.extend(new.map(|source| DiffEdit::Insert { position, source }));
		}
	}
}

#[cfg(test)]
mod tests;
