use thiserror::Error;

use crate::text::TextChange;

/// A change list that cannot be replayed against its base text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
	#[error("change {start}..{end} exceeds text length {len}")]
	OutOfBounds { start: usize, end: usize, len: usize },
	#[error("change at {start} starts before the previous change ended at {previous_end}")]
	Unordered { start: usize, previous_end: usize },
	#[error("change {start}..{end} does not fall on char boundaries")]
	NotCharBoundary { start: usize, end: usize },
}

/// Applies sorted, non-overlapping changes to `text` in one forward pass.
///
/// Several insertions at the same offset are applied in list order.
pub fn apply_changes(text: &str, changes: &[TextChange]) -> Result<String, ApplyError> {
	let inserted: usize = changes.iter().map(|change| change.new_text.len()).sum();
	let mut out = String::with_capacity(text.len() + inserted);
	let mut cursor = 0;

	for change in changes {
		let start = change.span.start;
		let end = change.span.end();
		if end > text.len() {
			return Err(ApplyError::OutOfBounds {
				start,
				end,
				len: text.len(),
			});
		}
		if start < cursor {
			return Err(ApplyError::Unordered {
				start,
				previous_end: cursor,
			});
		}
		if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
			return Err(ApplyError::NotCharBoundary { start, end });
		}
		out.push_str(&text[cursor..start]);
		out.push_str(&change.new_text);
		cursor = end;
	}

	out.push_str(&text[cursor..]);
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::text::TextSpan;

	#[test]
	fn applies_in_order() {
		let changes = [
			TextChange::new(TextSpan::new(0, 5), "howdy"),
			TextChange::insert(11, "!"),
		];
		assert_eq!(apply_changes("hello world", &changes).as_deref(), Ok("howdy world!"));
	}

	#[test]
	fn empty_change_list_is_identity() {
		assert_eq!(apply_changes("abc", &[]).as_deref(), Ok("abc"));
	}

	#[test]
	fn rejects_overlap() {
		let changes = [
			TextChange::new(TextSpan::new(0, 4), ""),
			TextChange::new(TextSpan::new(2, 1), "x"),
		];
		assert_eq!(
			apply_changes("abcdef", &changes),
			Err(ApplyError::Unordered {
				start: 2,
				previous_end: 4
			})
		);
	}

	#[test]
	fn rejects_out_of_bounds() {
		let changes = [TextChange::new(TextSpan::new(2, 5), "")];
		assert_eq!(
			apply_changes("abc", &changes),
			Err(ApplyError::OutOfBounds { start: 2, end: 7, len: 3 })
		);
	}

	#[test]
	fn rejects_split_scalar() {
		let changes = [TextChange::new(TextSpan::new(1, 1), "")];
		assert_eq!(
			apply_changes("é", &changes),
			Err(ApplyError::NotCharBoundary { start: 1, end: 2 })
		);
	}
}
