use serde::{Deserialize, Serialize};

use crate::span::SourceSpan;

/// Syntactic role of a classified span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpanKind {
	/// The `@` that switches between markup and code.
	Transition,
	/// Delimiters and keywords owned by the template language itself.
	MetaCode,
	Comment,
	/// Host-language code.
	Code,
	Markup,
}

/// Which characters the parser would accept at the end of a span.
///
/// A span accepting [`None`](Self::None) is closed: it does not own the offset at its end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AcceptedCharacters {
	None,
	NewLine,
	Whitespace,
	NonWhitespace,
	AllWhitespace,
	#[default]
	Any,
}

/// A span of the template together with its syntactic role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedSpan {
	pub span: SourceSpan,
	pub kind: SpanKind,
	#[serde(default)]
	pub accepted: AcceptedCharacters,
}

impl ClassifiedSpan {
	pub const fn new(span: SourceSpan, kind: SpanKind, accepted: AcceptedCharacters) -> Self {
		Self { span, kind, accepted }
	}

	fn owns(&self, offset: usize) -> bool {
		if !self.span.contains_inclusive(offset) {
			return false;
		}
		!(self.accepted == AcceptedCharacters::None && offset == self.span.end())
	}

	pub fn language(&self) -> LanguageKind {
		match self.kind {
			SpanKind::Markup => LanguageKind::Markup,
			SpanKind::Code => LanguageKind::Host,
			SpanKind::Transition | SpanKind::MetaCode | SpanKind::Comment => LanguageKind::Template,
		}
	}
}

/// Language an offset of the template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LanguageKind {
	Markup,
	Host,
	/// Template syntax with no projection of its own (transitions, directives, comments).
	Template,
}

/// Classifies a template offset.
///
/// Classified spans are scanned in document order and the first owner wins; a span owns its
/// end offset unless it accepts no further characters. Tag-helper spans are consulted next and
/// classify as markup. An offset exactly at the end of the document takes the language of the
/// last classified span. Anything else is template syntax.
pub fn classify_at_offset(
	spans: &[ClassifiedSpan],
	tag_helpers: &[SourceSpan],
	document_len: usize,
	offset: usize,
) -> LanguageKind {
	if let Some(span) = spans.iter().find(|span| span.owns(offset)) {
		return span.language();
	}
	if tag_helpers.iter().any(|span| span.contains_inclusive(offset)) {
		return LanguageKind::Markup;
	}
	if offset == document_len
		&& let Some(last) = spans.last()
	{
		return last.language();
	}
	LanguageKind::Template
}
