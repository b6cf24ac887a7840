use lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range};
use serde::{Deserialize, Serialize};

use crate::classify::LanguageKind;
use crate::document::CodeDocument;
use crate::mapper::MappingBehavior;
use crate::position::OffsetEncoding;
use crate::span::SourceSpan;

/// `source` field of diagnostics produced by the template compiler.
pub const TEMPLATE_DIAGNOSTIC_SOURCE: &str = "stencil";

/// Range given to errors that have no place in the template.
///
/// Editors typically surface these at the top of the document.
pub const UNDEFINED_RANGE: Range = Range {
	start: Position {
		line: u32::MAX,
		character: u32::MAX,
	},
	end: Position {
		line: u32::MAX,
		character: u32::MAX,
	},
};

/// A diagnostic reported by the template compiler against the template source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDiagnostic {
	pub span: SourceSpan,
	pub severity: DiagnosticSeverity,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	pub message: String,
}

/// Rewrites host projection diagnostics onto the template.
///
/// Ranges are mapped inclusively. Errors that cannot be mapped are kept with
/// [`UNDEFINED_RANGE`] so they are never silently lost; other unmappable diagnostics are dropped.
pub fn translate_host_diagnostics(
	document: &CodeDocument,
	diagnostics: Vec<Diagnostic>,
	encoding: OffsetEncoding,
) -> Vec<Diagnostic> {
	diagnostics
		.into_iter()
		.filter_map(|mut diagnostic| {
			match document.map_range_to_original(diagnostic.range, MappingBehavior::Inclusive, encoding) {
				Some(range) => diagnostic.range = range,
				None if diagnostic.severity == Some(DiagnosticSeverity::ERROR) => diagnostic.range = UNDEFINED_RANGE,
				None => {
					tracing::trace!(message = %diagnostic.message, "mapping.diagnostic_dropped");
					return None;
				}
			}
			Some(diagnostic)
		})
		.collect()
}

/// Keeps markup diagnostics whose start lies in markup.
///
/// The markup projection preserves offsets, so the range needs no rewriting.
pub fn filter_markup_diagnostics(
	document: &CodeDocument,
	diagnostics: Vec<Diagnostic>,
	encoding: OffsetEncoding,
) -> Vec<Diagnostic> {
	diagnostics
		.into_iter()
		.filter(|diagnostic| document.classify_position(diagnostic.range.start, encoding) == LanguageKind::Markup)
		.collect()
}

/// Converts a compiler diagnostic to an LSP diagnostic on the template.
pub fn template_diagnostic(
	document: &CodeDocument,
	diagnostic: &TemplateDiagnostic,
	encoding: OffsetEncoding,
) -> Diagnostic {
	let range = document
		.source_range(diagnostic.span, encoding)
		.unwrap_or(UNDEFINED_RANGE);
	Diagnostic {
		range,
		severity: Some(diagnostic.severity),
		code: diagnostic.code.clone().map(NumberOrString::String),
		source: Some(TEMPLATE_DIAGNOSTIC_SOURCE.to_owned()),
		message: diagnostic.message.clone(),
		..Diagnostic::default()
	}
}

#[cfg(test)]
mod tests;
