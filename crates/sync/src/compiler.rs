use std::sync::Arc;

use stencil_mapping::{ClassifiedSpan, CodeDocument, SourceMapping, SourceSpan, TemplateDiagnostic};

use crate::config::ProjectConfiguration;

/// Everything the template compiler produces for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutput {
	pub host_text: String,
	/// Offset-preserving markup projection: template syntax and code blanked out.
	pub markup_text: String,
	pub mappings: Vec<SourceMapping>,
	pub classified_spans: Vec<ClassifiedSpan>,
	pub tag_helper_spans: Vec<SourceSpan>,
	pub diagnostics: Vec<TemplateDiagnostic>,
}

impl CompileOutput {
	/// Builds the mapping artifact for `source`.
	///
	/// # Panics
	///
	/// Panics if the compiler produced a malformed mapping table.
	pub fn into_document(self, source: &str) -> CompiledDocument {
		let document = CodeDocument::new(
			source,
			self.host_text,
			self.mappings,
			self.classified_spans,
			self.tag_helper_spans,
		);
		CompiledDocument {
			document: Arc::new(document),
			markup_text: self.markup_text.into(),
			diagnostics: self.diagnostics,
		}
	}
}

/// Compiler output in the shape the projection store keeps.
#[derive(Debug, Clone)]
pub struct CompiledDocument {
	pub document: Arc<CodeDocument>,
	pub markup_text: Arc<str>,
	pub diagnostics: Vec<TemplateDiagnostic>,
}

/// The template compiler.
///
/// Pure and potentially expensive; the engine only calls it on the background pool.
pub trait DocumentCompiler: Send + Sync + 'static {
	fn compile(&self, source: &str, configuration: &ProjectConfiguration) -> CompileOutput;
}
