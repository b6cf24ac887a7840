//! Generated projections and their per-document container.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use stencil_mapping::CodeDocument;
use tokio::sync::mpsc;

use crate::compiler::CompiledDocument;
use crate::version::DocumentVersion;

/// Which generated artifact of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProjectionTarget {
	/// Host-language projection.
	Host,
	/// Markup-only projection.
	Markup,
}

impl ProjectionTarget {
	pub const ALL: [Self; 2] = [Self::Host, Self::Markup];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Host => "host",
			Self::Markup => "markup",
		}
	}
}

/// One generated artifact. Replaced wholesale on every compile, never mutated.
#[derive(Debug)]
pub struct GeneratedProjection {
	target: ProjectionTarget,
	text: Arc<str>,
	document: Arc<CodeDocument>,
	input_version: Option<DocumentVersion>,
	host_output_version: Option<DocumentVersion>,
	markup_output_version: Option<DocumentVersion>,
}

impl GeneratedProjection {
	pub fn target(&self) -> ProjectionTarget {
		self.target
	}

	pub fn text(&self) -> &Arc<str> {
		&self.text
	}

	pub fn document(&self) -> &Arc<CodeDocument> {
		&self.document
	}

	/// Document version the projection was compiled from.
	pub fn input_version(&self) -> Option<DocumentVersion> {
		self.input_version
	}

	/// Input version at which the host text last changed.
	pub fn host_output_version(&self) -> Option<DocumentVersion> {
		self.host_output_version
	}

	/// Input version at which the markup text last changed.
	pub fn markup_output_version(&self) -> Option<DocumentVersion> {
		self.markup_output_version
	}
}

/// Message from containers to the publisher routine.
#[derive(Debug, Clone)]
pub enum ProjectionEvent {
	/// A projection's text or input version changed.
	Changed {
		path: PathBuf,
		target: ProjectionTarget,
		projection: Arc<GeneratedProjection>,
	},
	/// The document's projections are gone.
	Removed { path: PathBuf },
}

pub type ProjectionEventSender = mpsc::UnboundedSender<ProjectionEvent>;
pub type ProjectionEventReceiver = mpsc::UnboundedReceiver<ProjectionEvent>;

/// Current projections of one document.
#[derive(Debug)]
pub struct ProjectionContainer {
	path: PathBuf,
	events: ProjectionEventSender,
	host: Option<Arc<GeneratedProjection>>,
	markup: Option<Arc<GeneratedProjection>>,
}

impl ProjectionContainer {
	pub(crate) fn new(path: PathBuf, events: ProjectionEventSender) -> Self {
		Self {
			path,
			events,
			host: None,
			markup: None,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn projection(&self, target: ProjectionTarget) -> Option<&Arc<GeneratedProjection>> {
		match target {
			ProjectionTarget::Host => self.host.as_ref(),
			ProjectionTarget::Markup => self.markup.as_ref(),
		}
	}

	pub fn code_document(&self) -> Option<&Arc<CodeDocument>> {
		self.host.as_ref().map(|projection| projection.document())
	}

	/// Replaces both projections with a fresh compile of `input_version`.
	///
	/// Sends [`ProjectionEvent::Changed`] for each target whose text or input version differs from
	/// the previous projection. Returns the number of events sent.
	pub fn set_output(&mut self, input_version: Option<DocumentVersion>, output: &CompiledDocument) -> usize {
		let host_text: Arc<str> = Arc::from(output.document.host_text());
		let markup_text = output.markup_text.clone();

		let host_changed = self.host.as_ref().is_none_or(|p| p.text != host_text);
		let markup_changed = self.markup.as_ref().is_none_or(|p| p.text != markup_text);
		let host_output_version = if host_changed {
			input_version
		} else {
			self.host.as_ref().and_then(|p| p.host_output_version)
		};
		let markup_output_version = if markup_changed {
			input_version
		} else {
			self.markup.as_ref().and_then(|p| p.markup_output_version)
		};

		let build = |target, text| {
			Arc::new(GeneratedProjection {
				target,
				text,
				document: output.document.clone(),
				input_version,
				host_output_version,
				markup_output_version,
			})
		};
		let host = build(ProjectionTarget::Host, host_text);
		let markup = build(ProjectionTarget::Markup, markup_text);

		let mut sent = 0;
		let previous = [self.host.replace(host.clone()), self.markup.replace(markup.clone())];
		for (previous, next) in previous.into_iter().zip([host, markup]) {
			let unchanged = previous
				.as_ref()
				.is_some_and(|p| p.text == next.text && p.input_version == next.input_version);
			if unchanged {
				continue;
			}
			let event = ProjectionEvent::Changed {
				path: self.path.clone(),
				target: next.target,
				projection: next,
			};
			if self.events.send(event).is_err() {
				tracing::debug!(path = %self.path.display(), "sync.projection.publisher_gone");
			}
			sent += 1;
		}
		sent
	}
}

#[cfg(test)]
mod tests;
