use super::*;

fn pos(line: u32, character: u32) -> Position {
	Position { line, character }
}

#[test]
fn utf32_round_trip() {
	let index = LineIndex::new("hello\nworld\n");
	let encoding = OffsetEncoding::Utf32;

	assert_eq!(index.position_to_offset(pos(0, 3), encoding), Some(3));
	assert_eq!(index.offset_to_position(3, encoding), Some(pos(0, 3)));

	// "hello\n" = 6 bytes, + 2
	assert_eq!(index.position_to_offset(pos(1, 2), encoding), Some(8));
	assert_eq!(index.offset_to_position(8, encoding), Some(pos(1, 2)));
}

#[test]
fn utf16_counts_surrogate_pairs() {
	// U+1F600 is 4 UTF-8 bytes and 2 UTF-16 code units
	let index = LineIndex::new("a\u{1F600}b\n");
	let encoding = OffsetEncoding::Utf16;

	assert_eq!(index.position_to_offset(pos(0, 1), encoding), Some(1));
	assert_eq!(index.position_to_offset(pos(0, 3), encoding), Some(5));
	assert_eq!(index.offset_to_position(5, encoding), Some(pos(0, 3)));
}

#[test]
fn utf8_columns_are_bytes() {
	let index = LineIndex::new("caf\u{00E9}!\n");
	let encoding = OffsetEncoding::Utf8;

	assert_eq!(index.offset_to_position(5, encoding), Some(pos(0, 5)));
	assert_eq!(index.position_to_offset(pos(0, 5), encoding), Some(5));
	assert_eq!(OffsetEncoding::Utf16.to_lsp(), PositionEncodingKind::UTF16);
}

#[test]
fn character_past_line_end_clamps_before_terminator() {
	let index = LineIndex::new("ab\r\ncd");
	assert_eq!(index.position_to_offset(pos(0, 40), OffsetEncoding::Utf16), Some(2));
	assert_eq!(index.position_to_offset(pos(1, 40), OffsetEncoding::Utf16), Some(6));
}

#[test]
fn line_past_end_is_rejected() {
	let index = LineIndex::new("ab\ncd");
	assert_eq!(index.line_count(), 2);
	assert_eq!(index.position_to_offset(pos(2, 0), OffsetEncoding::Utf16), None);
	assert_eq!(index.offset_to_position(6, OffsetEncoding::Utf16), None);
}

#[test]
fn end_of_text_after_newline_is_an_empty_line() {
	let index = LineIndex::new("ab\n");
	assert_eq!(index.offset_to_position(3, OffsetEncoding::Utf16), Some(pos(1, 0)));
	assert_eq!(index.position_to_offset(pos(1, 0), OffsetEncoding::Utf16), Some(3));
}

#[test]
fn encoding_parses_from_lsp_kind() {
	assert_eq!(OffsetEncoding::from_lsp(&PositionEncodingKind::UTF8), Some(OffsetEncoding::Utf8));
	assert_eq!(OffsetEncoding::from_lsp(&PositionEncodingKind::new("latin-1")), None);
}
