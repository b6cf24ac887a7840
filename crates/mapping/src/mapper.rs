use serde::{Deserialize, Serialize};

use crate::span::{SourceMapping, SourceSpan};

/// How a projection range is mapped back onto the template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MappingBehavior {
	/// Both endpoints must map, in order.
	#[default]
	Strict,
	/// Falls back to the full original span of the single mapping the range touches.
	Inclusive,
}

/// Source mappings ordered by generated start, with no overlap in generated space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
	mappings: Vec<SourceMapping>,
}

impl MappingTable {
	/// Builds a table from compiler output.
	///
	/// # Panics
	///
	/// Panics if generated starts are not ascending or two generated spans overlap.
	pub fn new(mappings: Vec<SourceMapping>) -> Self {
		for pair in mappings.windows(2) {
			let (prev, next) = (&pair[0].generated, &pair[1].generated);
			assert!(
				prev.end() <= next.start,
				"source mappings must be ordered by generated start without overlap: {prev:?} then {next:?}"
			);
		}
		Self { mappings }
	}

	pub fn as_slice(&self) -> &[SourceMapping] {
		&self.mappings
	}

	pub fn len(&self) -> usize {
		self.mappings.len()
	}

	pub fn is_empty(&self) -> bool {
		self.mappings.is_empty()
	}

	/// Maps a template offset into the projection.
	///
	/// The first mapping whose original span contains the offset wins; a span owns its end.
	pub fn to_generated(&self, original_offset: usize) -> Option<usize> {
		self.mappings
			.iter()
			.find(|mapping| mapping.original.contains_inclusive(original_offset))
			.map(|mapping| mapping.generated.start + (original_offset - mapping.original.start))
	}

	/// Maps a projection offset back onto the template.
	pub fn to_original(&self, generated_offset: usize) -> Option<usize> {
		self.mappings
			.iter()
			.find(|mapping| mapping.generated.contains_inclusive(generated_offset))
			.map(|mapping| mapping.original.start + (generated_offset - mapping.generated.start))
	}

	pub fn map_range(&self, generated: SourceSpan, behavior: MappingBehavior) -> Option<SourceSpan> {
		match behavior {
			MappingBehavior::Strict => self.map_range_strict(generated),
			MappingBehavior::Inclusive => self.map_range_inclusive(generated),
		}
	}

	/// Maps both endpoints; fails if either is unmapped or they come out reversed.
	pub fn map_range_strict(&self, generated: SourceSpan) -> Option<SourceSpan> {
		let start = self.to_original(generated.start)?;
		let end = self.to_original(generated.end())?;
		(start <= end).then(|| SourceSpan::from_bounds(start, end))
	}

	/// Like [`map_range_strict`](Self::map_range_strict), but when that fails the range resolves
	/// to the whole original span of the one mapping it touches.
	///
	/// The touched mappings are those containing the endpoint that mapped directly (the start if
	/// both did), or, when neither endpoint maps, those overlapping the range. Zero or several
	/// candidates is a failure.
	pub fn map_range_inclusive(&self, generated: SourceSpan) -> Option<SourceSpan> {
		let start = self.to_original(generated.start);
		let end = self.to_original(generated.end());
		if let (Some(start), Some(end)) = (start, end)
			&& start <= end
		{
			return Some(SourceSpan::from_bounds(start, end));
		}

		let anchor = if start.is_some() {
			Some(generated.start)
		} else if end.is_some() {
			Some(generated.end())
		} else {
			None
		};

		let mut candidates = self.mappings.iter().filter(|mapping| match anchor {
			Some(offset) => mapping.generated.contains_inclusive(offset),
			None => mapping.generated.intersects(&generated),
		});
		let candidate = candidates.next()?;
		if candidates.next().is_some() {
			tracing::trace!(?generated, "mapping.inclusive_ambiguous");
			return None;
		}
		Some(candidate.original)
	}
}
