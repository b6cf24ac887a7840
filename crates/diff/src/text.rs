//! Text-level diffing: granularities, minimal change collapse and the threshold-driven differ.

use std::ops::Range;

use crate::apply::apply_changes;
use crate::myers::{DiffEdit, DiffSequences, diff, hunks};

/// Combined input size (bytes) up to which [`TextDiffer`] diffs characters directly.
pub const DEFAULT_LINE_DIFF_THRESHOLD: usize = 64 * 1024;

/// A half-open byte span in the old text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextSpan {
	pub start: usize,
	pub length: usize,
}

impl TextSpan {
	pub const fn new(start: usize, length: usize) -> Self {
		Self { start, length }
	}

	pub fn from_bounds(start: usize, end: usize) -> Self {
		debug_assert!(start <= end);
		Self {
			start,
			length: end - start,
		}
	}

	pub const fn end(&self) -> usize {
		self.start + self.length
	}

	pub const fn is_empty(&self) -> bool {
		self.length == 0
	}

	pub const fn range(&self) -> Range<usize> {
		self.start..self.end()
	}
}

/// Replace the bytes covered by `span` with `new_text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextChange {
	pub span: TextSpan,
	pub new_text: String,
}

impl TextChange {
	pub fn new(span: TextSpan, new_text: impl Into<String>) -> Self {
		Self {
			span,
			new_text: new_text.into(),
		}
	}

	pub fn insert(at: usize, text: impl Into<String>) -> Self {
		Self::new(TextSpan::new(at, 0), text)
	}
}

/// Unit of comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
	/// Unicode scalar values.
	Char,
	/// Lines including their terminator.
	Line,
}

/// A text split into diffable units, remembering each unit's byte offset.
#[derive(Debug, Clone)]
pub struct TextUnits<'a> {
	text: &'a str,
	/// `bounds[i]` is the byte start of unit `i`; the last entry is `text.len()`.
	bounds: Vec<usize>,
}

impl<'a> TextUnits<'a> {
	pub fn new(text: &'a str, granularity: Granularity) -> Self {
		let mut bounds: Vec<usize> = match granularity {
			Granularity::Char => text.char_indices().map(|(offset, _)| offset).collect(),
			Granularity::Line => {
				let mut offset = 0;
				text.split_inclusive('\n')
					.map(|line| {
						let start = offset;
						offset += line.len();
						start
					})
					.collect()
			}
		};
		bounds.push(text.len());
		Self { text, bounds }
	}

	pub fn len(&self) -> usize {
		self.bounds.len() - 1
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn text(&self) -> &'a str {
		self.text
	}

	/// Byte offset of the start of unit `index`; `index == len()` yields the text length.
	pub fn offset(&self, index: usize) -> usize {
		self.bounds[index]
	}

	pub fn unit(&self, index: usize) -> &'a str {
		&self.text[self.bounds[index]..self.bounds[index + 1]]
	}

	pub fn slice(&self, units: Range<usize>) -> &'a str {
		&self.text[self.bounds[units.start]..self.bounds[units.end]]
	}
}

struct UnitPair<'p, 'a> {
	old: &'p TextUnits<'a>,
	new: &'p TextUnits<'a>,
}

impl DiffSequences for UnitPair<'_, '_> {
	fn old_len(&self) -> usize {
		self.old.len()
	}

	fn new_len(&self) -> usize {
		self.new.len()
	}

	fn equal(&self, old_index: usize, new_index: usize) -> bool {
		self.old.unit(old_index) == self.new.unit(new_index)
	}
}

/// Runs the edit-distance diff over two unit sequences.
pub fn diff_units(old: &TextUnits<'_>, new: &TextUnits<'_>) -> Vec<DiffEdit> {
	diff(&UnitPair { old, new })
}

/// Merges a raw edit script into the fewest contiguous changes.
///
/// Spans are byte offsets into `old`; the result is sorted and non-overlapping.
pub fn collapse_to_minimal_ranges(old: &TextUnits<'_>, new: &TextUnits<'_>, edits: &[DiffEdit]) -> Vec<TextChange> {
	hunks(edits)
		.into_iter()
		.map(|hunk| TextChange {
			span: TextSpan::from_bounds(old.offset(hunk.old.start), old.offset(hunk.old.end)),
			new_text: new.slice(hunk.new).to_owned(),
		})
		.collect()
}

/// Diffs two texts at a fixed granularity and collapses the result.
pub fn text_changes(old: &str, new: &str, granularity: Granularity) -> Vec<TextChange> {
	if old == new {
		return Vec::new();
	}
	let old_units = TextUnits::new(old, granularity);
	let new_units = TextUnits::new(new, granularity);
	let edits = diff_units(&old_units, &new_units);
	collapse_to_minimal_ranges(&old_units, &new_units, &edits)
}

/// Chooses the diff granularity from the input size.
///
/// Inputs whose combined length is at or below `line_diff_threshold` are diffed per character.
/// Larger inputs get a line pass first; each resulting hunk is then refined per character when
/// it is itself within the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextDiffer {
	line_diff_threshold: usize,
}

impl Default for TextDiffer {
	fn default() -> Self {
		Self::new(DEFAULT_LINE_DIFF_THRESHOLD)
	}
}

impl TextDiffer {
	pub const fn new(line_diff_threshold: usize) -> Self {
		Self { line_diff_threshold }
	}

	pub const fn line_diff_threshold(&self) -> usize {
		self.line_diff_threshold
	}

	pub fn minimal_changes(&self, old: &str, new: &str) -> Vec<TextChange> {
		if old == new {
			return Vec::new();
		}

		let line_pass = old.len() + new.len() > self.line_diff_threshold;
		let changes = if line_pass {
			text_changes(old, new, Granularity::Line)
				.into_iter()
				.flat_map(|hunk| self.refine(old, hunk))
				.collect()
		} else {
			text_changes(old, new, Granularity::Char)
		};

		debug_assert!(
			matches!(apply_changes(old, &changes), Ok(ref applied) if applied == new),
			"collapsed changes must reproduce the new text"
		);
		tracing::trace!(
			old_len = old.len(),
			new_len = new.len(),
			line_pass,
			changes = changes.len(),
			"diff.minimal_changes"
		);
		changes
	}

	fn refine(&self, old: &str, hunk: TextChange) -> Vec<TextChange> {
		let replaced = &old[hunk.span.range()];
		if replaced.len() + hunk.new_text.len() > self.line_diff_threshold {
			return vec![hunk];
		}
		let base = hunk.span.start;
		text_changes(replaced, &hunk.new_text, Granularity::Char)
			.into_iter()
			.map(|change| TextChange {
				span: TextSpan::new(change.span.start + base, change.span.length),
				new_text: change.new_text,
			})
			.collect()
	}
}
