//! Coordinate mapping between an authored template and its generated projections.
//!
//! A [`CodeDocument`] pairs the template source with its host-language projection, the ordered
//! [`SourceMapping`] table linking the two, and the compiler's [`ClassifiedSpan`]s. On top of it:
//!
//! * offset mapping in both directions with edge-inclusive span ownership ([`MappingTable`]),
//! * strict and inclusive range mapping ([`MappingBehavior`]),
//! * language classification of template offsets ([`classify_at_offset`]),
//! * byte offset <-> LSP [`Position`](lsp_types::Position) conversion ([`LineIndex`]),
//! * translation of projection diagnostics back onto the template ([`translate_host_diagnostics`]).
//!
//! Every lookup is total: "no mapping" is `None`, never a panic. Malformed mapping tables are
//! rejected when the document is built.

mod classify;
mod diagnostics;
mod document;
mod mapper;
mod position;
mod span;

pub use classify::{AcceptedCharacters, ClassifiedSpan, LanguageKind, SpanKind, classify_at_offset};
pub use diagnostics::{
	TEMPLATE_DIAGNOSTIC_SOURCE, TemplateDiagnostic, UNDEFINED_RANGE, filter_markup_diagnostics, template_diagnostic,
	translate_host_diagnostics,
};
pub use document::CodeDocument;
pub use mapper::{MappingBehavior, MappingTable};
pub use position::{LineIndex, OffsetEncoding, byte_to_lsp_position, lsp_position_to_byte};
pub use span::{SourceMapping, SourceSpan};
