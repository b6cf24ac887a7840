use pretty_assertions::assert_eq;

use super::*;
use crate::classify::{AcceptedCharacters, ClassifiedSpan, SpanKind};
use crate::span::SourceMapping;

/// `<div>\n@name\n</div>\n` with `name` projected into `__o = name;\n`.
fn document() -> CodeDocument {
	let classified = vec![
		ClassifiedSpan::new(SourceSpan::new(0, 6), SpanKind::Markup, AcceptedCharacters::Any),
		ClassifiedSpan::new(SourceSpan::new(6, 1), SpanKind::Transition, AcceptedCharacters::None),
		ClassifiedSpan::new(SourceSpan::new(7, 4), SpanKind::Code, AcceptedCharacters::NonWhitespace),
		ClassifiedSpan::new(SourceSpan::new(11, 8), SpanKind::Markup, AcceptedCharacters::Any),
	];
	let mappings = vec![SourceMapping::new(SourceSpan::new(7, 4), SourceSpan::new(6, 4))];
	CodeDocument::new("<div>\n@name\n</div>\n", "__o = name;\n", mappings, classified, Vec::new())
}

fn diagnostic(range: ((u32, u32), (u32, u32)), severity: DiagnosticSeverity, message: &str) -> Diagnostic {
	Diagnostic {
		range: Range::new(Position::new(range.0.0, range.0.1), Position::new(range.1.0, range.1.1)),
		severity: Some(severity),
		message: message.to_owned(),
		..Diagnostic::default()
	}
}

#[test]
fn host_diagnostics_land_on_the_template() {
	let doc = document();
	let translated = translate_host_diagnostics(
		&doc,
		vec![diagnostic(((0, 6), (0, 10)), DiagnosticSeverity::WARNING, "unused")],
		OffsetEncoding::Utf16,
	);
	assert_eq!(translated.len(), 1);
	assert_eq!(
		translated[0].range,
		Range::new(Position::new(1, 1), Position::new(1, 5))
	);
}

#[test]
fn unmappable_errors_are_kept_and_warnings_dropped() {
	let doc = document();
	let translated = translate_host_diagnostics(
		&doc,
		vec![
			diagnostic(((0, 0), (0, 3)), DiagnosticSeverity::ERROR, "generated error"),
			diagnostic(((0, 0), (0, 3)), DiagnosticSeverity::WARNING, "generated warning"),
		],
		OffsetEncoding::Utf16,
	);
	assert_eq!(translated.len(), 1);
	assert_eq!(translated[0].message, "generated error");
	assert_eq!(translated[0].range, UNDEFINED_RANGE);
}

#[test]
fn markup_diagnostics_inside_code_are_filtered() {
	let doc = document();
	let kept = filter_markup_diagnostics(
		&doc,
		vec![
			diagnostic(((0, 0), (0, 5)), DiagnosticSeverity::WARNING, "in markup"),
			diagnostic(((1, 2), (1, 4)), DiagnosticSeverity::WARNING, "in code"),
		],
		OffsetEncoding::Utf16,
	);
	assert_eq!(kept.len(), 1);
	assert_eq!(kept[0].message, "in markup");
}

#[test]
fn template_diagnostics_convert_byte_spans() {
	let doc = document();
	let converted = template_diagnostic(
		&doc,
		&TemplateDiagnostic {
			span: SourceSpan::new(6, 5),
			severity: DiagnosticSeverity::ERROR,
			code: Some("ST0001".into()),
			message: "unknown symbol".into(),
		},
		OffsetEncoding::Utf16,
	);
	assert_eq!(converted.range, Range::new(Position::new(1, 0), Position::new(1, 5)));
	assert_eq!(converted.source.as_deref(), Some(TEMPLATE_DIAGNOSTIC_SOURCE));
	assert_eq!(converted.code, Some(NumberOrString::String("ST0001".into())));
}
