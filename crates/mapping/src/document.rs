use std::sync::Arc;

use lsp_types::{Position, Range};

use crate::classify::{ClassifiedSpan, LanguageKind, classify_at_offset};
use crate::mapper::{MappingBehavior, MappingTable};
use crate::position::{LineIndex, OffsetEncoding};
use crate::span::{SourceMapping, SourceSpan};

/// A compiled template: the source, its host projection and everything needed to map between them.
///
/// Immutable once built; share it behind an [`Arc`].
#[derive(Debug, Clone)]
pub struct CodeDocument {
	source: Arc<str>,
	host_text: Arc<str>,
	mappings: MappingTable,
	classified: Vec<ClassifiedSpan>,
	tag_helpers: Vec<SourceSpan>,
	source_lines: LineIndex,
	host_lines: LineIndex,
}

impl CodeDocument {
	/// # Panics
	///
	/// Panics if the mapping table is malformed or a span falls outside its text.
	pub fn new(
		source: impl Into<Arc<str>>,
		host_text: impl Into<Arc<str>>,
		mappings: Vec<SourceMapping>,
		classified: Vec<ClassifiedSpan>,
		tag_helpers: Vec<SourceSpan>,
	) -> Self {
		let source = source.into();
		let host_text = host_text.into();
		for mapping in &mappings {
			assert!(
				mapping.original.end() <= source.len() && mapping.generated.end() <= host_text.len(),
				"source mapping {mapping:?} exceeds its text"
			);
		}
		let mappings = MappingTable::new(mappings);
		let source_lines = LineIndex::new(&source);
		let host_lines = LineIndex::new(&host_text);
		Self {
			source,
			host_text,
			mappings,
			classified,
			tag_helpers,
			source_lines,
			host_lines,
		}
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn host_text(&self) -> &str {
		&self.host_text
	}

	pub fn mappings(&self) -> &MappingTable {
		&self.mappings
	}

	pub fn classified_spans(&self) -> &[ClassifiedSpan] {
		&self.classified
	}

	pub fn tag_helper_spans(&self) -> &[SourceSpan] {
		&self.tag_helpers
	}

	pub fn source_lines(&self) -> &LineIndex {
		&self.source_lines
	}

	pub fn host_lines(&self) -> &LineIndex {
		&self.host_lines
	}

	pub fn to_generated(&self, original_offset: usize) -> Option<usize> {
		self.mappings.to_generated(original_offset)
	}

	pub fn to_original(&self, generated_offset: usize) -> Option<usize> {
		self.mappings.to_original(generated_offset)
	}

	pub fn map_range_strict(&self, generated: SourceSpan) -> Option<SourceSpan> {
		self.mappings.map_range_strict(generated)
	}

	pub fn map_range_inclusive(&self, generated: SourceSpan) -> Option<SourceSpan> {
		self.mappings.map_range_inclusive(generated)
	}

	pub fn classify_at_offset(&self, original_offset: usize) -> LanguageKind {
		classify_at_offset(&self.classified, &self.tag_helpers, self.source.len(), original_offset)
	}

	/// Classifies a template position; positions outside the document are template syntax.
	pub fn classify_position(&self, position: Position, encoding: OffsetEncoding) -> LanguageKind {
		self.source_lines
			.position_to_offset(position, encoding)
			.map_or(LanguageKind::Template, |offset| self.classify_at_offset(offset))
	}

	pub fn map_position_to_generated(&self, position: Position, encoding: OffsetEncoding) -> Option<Position> {
		let original = self.source_lines.position_to_offset(position, encoding)?;
		let generated = self.to_generated(original)?;
		self.host_lines.offset_to_position(generated, encoding)
	}

	pub fn map_position_to_original(&self, position: Position, encoding: OffsetEncoding) -> Option<Position> {
		let generated = self.host_lines.position_to_offset(position, encoding)?;
		let original = self.to_original(generated)?;
		self.source_lines.offset_to_position(original, encoding)
	}

	/// Maps a host projection range onto the template.
	pub fn map_range_to_original(
		&self,
		range: Range,
		behavior: MappingBehavior,
		encoding: OffsetEncoding,
	) -> Option<Range> {
		let start = self.host_lines.position_to_offset(range.start, encoding)?;
		let end = self.host_lines.position_to_offset(range.end, encoding)?;
		if end < start {
			return None;
		}
		let original = self.mappings.map_range(SourceSpan::from_bounds(start, end), behavior)?;
		self.source_range(original, encoding)
	}

	/// Converts a template byte span to an LSP range.
	pub fn source_range(&self, span: SourceSpan, encoding: OffsetEncoding) -> Option<Range> {
		Some(Range::new(
			self.source_lines.offset_to_position(span.start, encoding)?,
			self.source_lines.offset_to_position(span.end(), encoding)?,
		))
	}
}
