use lsp_types::{Position, PositionEncodingKind};
use ropey::{Rope, RopeSlice};
use serde::{Deserialize, Serialize};

/// Offset encoding for LSP positions.
///
/// LSP uses UTF-16 by default, but clients can negotiate different encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OffsetEncoding {
	/// UTF-8 byte offsets.
	#[serde(rename = "utf-8")]
	Utf8,
	/// UTF-16 code unit offsets (LSP default).
	#[default]
	#[serde(rename = "utf-16")]
	Utf16,
	/// UTF-32 / Unicode codepoint offsets.
	#[serde(rename = "utf-32")]
	Utf32,
}

impl OffsetEncoding {
	/// Parse from LSP position encoding kind.
	pub fn from_lsp(kind: &PositionEncodingKind) -> Option<Self> {
		match kind.as_str() {
			"utf-8" => Some(Self::Utf8),
			"utf-16" => Some(Self::Utf16),
			"utf-32" => Some(Self::Utf32),
			_ => None,
		}
	}

	pub fn to_lsp(self) -> PositionEncodingKind {
		match self {
			Self::Utf8 => PositionEncodingKind::UTF8,
			Self::Utf16 => PositionEncodingKind::UTF16,
			Self::Utf32 => PositionEncodingKind::UTF32,
		}
	}
}

/// Converts between byte offsets and line/column positions of one text.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
	rope: Rope,
}

impl LineIndex {
	pub fn new(text: &str) -> Self {
		Self {
			rope: Rope::from_str(text),
		}
	}

	pub fn from_rope(rope: Rope) -> Self {
		Self { rope }
	}

	pub fn rope(&self) -> &Rope {
		&self.rope
	}

	pub fn len_bytes(&self) -> usize {
		self.rope.len_bytes()
	}

	pub fn line_count(&self) -> usize {
		self.rope.len_lines()
	}

	/// Converts a byte offset to a position. See [`byte_to_lsp_position`].
	pub fn offset_to_position(&self, offset: usize, encoding: OffsetEncoding) -> Option<Position> {
		byte_to_lsp_position(&self.rope, offset, encoding)
	}

	/// Converts a position to a byte offset. See [`lsp_position_to_byte`].
	pub fn position_to_offset(&self, position: Position, encoding: OffsetEncoding) -> Option<usize> {
		lsp_position_to_byte(&self.rope, position, encoding)
	}
}

/// Converts a byte offset to a position; offsets inside a scalar value round down.
///
/// Returns `None` for offsets past the end of the text.
pub fn byte_to_lsp_position(rope: &Rope, offset: usize, encoding: OffsetEncoding) -> Option<Position> {
	if offset > rope.len_bytes() {
		return None;
	}
	let char_idx = rope.byte_to_char(offset);
	let line = rope.char_to_line(char_idx);
	let line_start = rope.line_to_char(line);
	let character = match encoding {
		OffsetEncoding::Utf8 => rope.char_to_byte(char_idx) - rope.line_to_byte(line),
		OffsetEncoding::Utf16 => rope.char_to_utf16_cu(char_idx) - rope.char_to_utf16_cu(line_start),
		OffsetEncoding::Utf32 => char_idx - line_start,
	};
	Some(Position::new(line as u32, character as u32))
}

/// Converts a position to a byte offset.
///
/// A character past the end of its line clamps to the line end (before the terminator).
/// Lines past the last line yield `None`.
pub fn lsp_position_to_byte(rope: &Rope, position: Position, encoding: OffsetEncoding) -> Option<usize> {
	let line = position.line as usize;
	if line >= rope.len_lines() {
		return None;
	}
	let character = position.character as usize;
	let line_start = rope.line_to_char(line);
	let slice = rope.line(line);
	let content_chars = content_len_chars(slice);

	let column = match encoding {
		OffsetEncoding::Utf8 => {
			let bytes = character.min(slice.char_to_byte(content_chars));
			slice.byte_to_char(bytes)
		}
		OffsetEncoding::Utf16 => {
			let units = character.min(slice.char_to_utf16_cu(content_chars));
			slice.utf16_cu_to_char(units)
		}
		OffsetEncoding::Utf32 => character.min(content_chars),
	};
	Some(rope.char_to_byte(line_start + column))
}

/// Length of a line in chars, excluding its terminator.
fn content_len_chars(line: RopeSlice<'_>) -> usize {
	let mut len = line.len_chars();
	if len > 0 && line.char(len - 1) == '\n' {
		len -= 1;
		if len > 0 && line.char(len - 1) == '\r' {
			len -= 1;
		}
	} else if len > 0 && matches!(line.char(len - 1), '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}') {
		len -= 1;
	}
	len
}

#[cfg(test)]
mod tests;
