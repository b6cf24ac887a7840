use serde::{Deserialize, Serialize};

/// A `(start, length)` span in UTF-8 byte offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceSpan {
	pub start: usize,
	pub length: usize,
}

impl SourceSpan {
	pub const fn new(start: usize, length: usize) -> Self {
		Self { start, length }
	}

	pub fn from_bounds(start: usize, end: usize) -> Self {
		assert!(start <= end, "span end {end} precedes start {start}");
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

	/// Edge-inclusive containment: `start <= offset <= end`.
	pub const fn contains_inclusive(&self, offset: usize) -> bool {
		offset >= self.start && offset - self.start <= self.length
	}

	/// Whether the two spans share at least one byte.
	pub fn intersects(&self, other: &SourceSpan) -> bool {
		self.start.max(other.start) < self.end().min(other.end())
	}
}

/// Pairs a span of the template with the span of the projection generated from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceMapping {
	pub original: SourceSpan,
	pub generated: SourceSpan,
}

impl SourceMapping {
	pub const fn new(original: SourceSpan, generated: SourceSpan) -> Self {
		Self { original, generated }
	}
}
