use std::path::{Path, PathBuf};

use lsp_types::Diagnostic;
use tokio::sync::mpsc;

use crate::version::DocumentVersion;

/// Destination of the merged diagnostics of a template.
///
/// Every call replaces the full diagnostic set of `path`.
pub trait DiagnosticsSink: Send + Sync + 'static {
	fn publish(&self, path: &Path, version: Option<DocumentVersion>, diagnostics: Vec<Diagnostic>);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsUpdate {
	pub path: PathBuf,
	pub version: Option<DocumentVersion>,
	pub diagnostics: Vec<Diagnostic>,
}

/// Forwards diagnostics over a channel to the editor transport.
#[derive(Debug, Clone)]
pub struct ChannelDiagnosticsSink {
	tx: mpsc::UnboundedSender<DiagnosticsUpdate>,
}

impl ChannelDiagnosticsSink {
	pub fn new(tx: mpsc::UnboundedSender<DiagnosticsUpdate>) -> Self {
		Self { tx }
	}

	pub fn channel() -> (Self, mpsc::UnboundedReceiver<DiagnosticsUpdate>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self::new(tx), rx)
	}
}

impl DiagnosticsSink for ChannelDiagnosticsSink {
	fn publish(&self, path: &Path, version: Option<DocumentVersion>, diagnostics: Vec<Diagnostic>) {
		let update = DiagnosticsUpdate {
			path: path.to_path_buf(),
			version,
			diagnostics,
		};
		if self.tx.send(update).is_err() {
			tracing::debug!(path = %path.display(), "sync.diagnostics.sink_closed");
		}
	}
}
