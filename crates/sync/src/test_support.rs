//! In-memory implementations of every role trait, for tests.
//!
//! Enabled for this crate's own tests and, for dependents, through the `test-support` feature.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use lsp_types::{Diagnostic, DiagnosticSeverity};
use parking_lot::Mutex;
use stencil_diff::{TextChange, apply_changes};
use stencil_mapping::{AcceptedCharacters, ClassifiedSpan, SourceMapping, SourceSpan, SpanKind, TemplateDiagnostic};
use tokio::sync::Notify;

use crate::compiler::{CompileOutput, DocumentCompiler};
use crate::config::{ProjectConfiguration, ProjectSnapshot};
use crate::config_sync::ProjectUpdater;
use crate::consumer::{BufferConsumer, ConsumerError};
use crate::diagnostics::{DiagnosticsSink, DiagnosticsUpdate};
use crate::error::Result;
use crate::version::DocumentVersion;

/// Compiler for a toy template syntax: `@{ ... }` blocks are host code, everything else markup.
///
/// The host projection is the code blocks joined by newlines. The markup projection is the
/// source with every block blanked to spaces, newlines kept, so offsets are preserved.
#[derive(Debug, Default)]
pub struct FakeCompiler {
	compiles: AtomicUsize,
}

impl FakeCompiler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn compile_count(&self) -> usize {
		self.compiles.load(Ordering::SeqCst)
	}
}

fn blank(text: &str) -> String {
	text.chars()
		.map(|ch| if ch == '\n' { "\n".to_owned() } else { " ".repeat(ch.len_utf8()) })
		.collect()
}

impl DocumentCompiler for FakeCompiler {
	fn compile(&self, source: &str, _configuration: &ProjectConfiguration) -> CompileOutput {
		self.compiles.fetch_add(1, Ordering::SeqCst);
		let mut output = CompileOutput::default();
		let mut cursor = 0;

		while let Some(found) = source[cursor..].find("@{") {
			let open = cursor + found;
			if open > cursor {
				output.markup_text.push_str(&source[cursor..open]);
				output.classified_spans.push(ClassifiedSpan::new(
					SourceSpan::from_bounds(cursor, open),
					SpanKind::Markup,
					AcceptedCharacters::Any,
				));
			}
			let content_start = open + 2;
			let (content_end, close_end) = match source[content_start..].find('}') {
				Some(offset) => (content_start + offset, content_start + offset + 1),
				None => {
					output.diagnostics.push(TemplateDiagnostic {
						span: SourceSpan::from_bounds(open, source.len()),
						severity: DiagnosticSeverity::ERROR,
						code: Some("ST1001".into()),
						message: "unterminated code block".into(),
					});
					(source.len(), source.len())
				}
			};

			output.markup_text.push_str(&blank(&source[open..close_end]));
			output.classified_spans.extend([
				ClassifiedSpan::new(SourceSpan::new(open, 1), SpanKind::Transition, AcceptedCharacters::None),
				ClassifiedSpan::new(SourceSpan::new(open + 1, 1), SpanKind::MetaCode, AcceptedCharacters::None),
				ClassifiedSpan::new(
					SourceSpan::from_bounds(content_start, content_end),
					SpanKind::Code,
					AcceptedCharacters::Any,
				),
			]);
			if close_end > content_end {
				output.classified_spans.push(ClassifiedSpan::new(
					SourceSpan::new(content_end, 1),
					SpanKind::MetaCode,
					AcceptedCharacters::None,
				));
			}

			if !output.host_text.is_empty() {
				output.host_text.push('\n');
			}
			let generated_start = output.host_text.len();
			output.host_text.push_str(&source[content_start..content_end]);
			output.mappings.push(SourceMapping::new(
				SourceSpan::from_bounds(content_start, content_end),
				SourceSpan::new(generated_start, content_end - content_start),
			));
			cursor = close_end;
		}

		if cursor < source.len() {
			output.markup_text.push_str(&source[cursor..]);
			output.classified_spans.push(ClassifiedSpan::new(
				SourceSpan::from_bounds(cursor, source.len()),
				SpanKind::Markup,
				AcceptedCharacters::Any,
			));
		}
		output
	}
}

/// One call observed by a [`RecordingConsumer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerCall {
	Apply {
		path: PathBuf,
		edits: Vec<TextChange>,
		version: Option<DocumentVersion>,
	},
	Close {
		path: PathBuf,
	},
}

/// Buffer consumer that records every call and replays edits into in-memory buffers.
#[derive(Debug, Default)]
pub struct RecordingConsumer {
	calls: Mutex<Vec<ConsumerCall>>,
	buffers: Mutex<HashMap<PathBuf, String>>,
	failing: AtomicBool,
	changed: Notify,
}

impl RecordingConsumer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes subsequent calls fail with [`ConsumerError::Disconnected`] (they are still recorded).
	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub fn calls(&self) -> Vec<ConsumerCall> {
		self.calls.lock().clone()
	}

	pub fn apply_count(&self) -> usize {
		self.calls
			.lock()
			.iter()
			.filter(|call| matches!(call, ConsumerCall::Apply { .. }))
			.count()
	}

	/// Buffer content reached by applying every edit list received for `path`.
	pub fn buffer(&self, path: &Path) -> Option<String> {
		self.buffers.lock().get(path).cloned()
	}

	/// Waits until at least `count` calls were recorded.
	pub async fn wait_for_calls(&self, count: usize) {
		loop {
			let notified = self.changed.notified();
			if self.calls.lock().len() >= count {
				return;
			}
			notified.await;
		}
	}

	fn record(&self, call: ConsumerCall) -> std::result::Result<(), ConsumerError> {
		self.calls.lock().push(call);
		self.changed.notify_waiters();
		if self.failing.load(Ordering::SeqCst) {
			return Err(ConsumerError::Disconnected);
		}
		Ok(())
	}
}

#[async_trait]
impl BufferConsumer for RecordingConsumer {
	async fn apply_edits(
		&self,
		path: &Path,
		edits: Vec<TextChange>,
		version: Option<DocumentVersion>,
	) -> std::result::Result<(), ConsumerError> {
		if !self.failing.load(Ordering::SeqCst) {
			let mut buffers = self.buffers.lock();
			let buffer = buffers.entry(path.to_path_buf()).or_default();
			*buffer = apply_changes(buffer, &edits).map_err(|error| ConsumerError::Rejected {
				path: path.to_path_buf(),
				reason: error.to_string(),
			})?;
		}
		self.record(ConsumerCall::Apply {
			path: path.to_path_buf(),
			edits,
			version,
		})
	}

	async fn close_buffer(&self, path: &Path) -> std::result::Result<(), ConsumerError> {
		self.buffers.lock().remove(path);
		self.record(ConsumerCall::Close {
			path: path.to_path_buf(),
		})
	}
}

/// Diagnostics sink that keeps every published set.
#[derive(Debug, Default)]
pub struct RecordingDiagnosticsSink {
	updates: Mutex<Vec<DiagnosticsUpdate>>,
	changed: Notify,
}

impl RecordingDiagnosticsSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn updates(&self) -> Vec<DiagnosticsUpdate> {
		self.updates.lock().clone()
	}

	/// Most recent set published for `path`.
	pub fn latest(&self, path: &Path) -> Option<Vec<Diagnostic>> {
		self.updates
			.lock()
			.iter()
			.rev()
			.find(|update| update.path == path)
			.map(|update| update.diagnostics.clone())
	}

	pub async fn wait_for_updates(&self, count: usize) {
		loop {
			let notified = self.changed.notified();
			if self.updates.lock().len() >= count {
				return;
			}
			notified.await;
		}
	}
}

impl DiagnosticsSink for RecordingDiagnosticsSink {
	fn publish(&self, path: &Path, version: Option<DocumentVersion>, diagnostics: Vec<Diagnostic>) {
		self.updates.lock().push(DiagnosticsUpdate {
			path: path.to_path_buf(),
			version,
			diagnostics,
		});
		self.changed.notify_waiters();
	}
}

/// One call observed by a [`RecordingUpdater`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdaterCall {
	Add(PathBuf),
	Update(PathBuf, Option<ProjectSnapshot>),
}

/// Project updater that only records what the synchronizer asked for.
#[derive(Debug, Default)]
pub struct RecordingUpdater {
	calls: Mutex<Vec<UpdaterCall>>,
	changed: Notify,
}

impl RecordingUpdater {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn calls(&self) -> Vec<UpdaterCall> {
		self.calls.lock().clone()
	}

	pub fn updates(&self) -> Vec<(PathBuf, Option<ProjectSnapshot>)> {
		self.calls
			.lock()
			.iter()
			.filter_map(|call| match call {
				UpdaterCall::Update(path, snapshot) => Some((path.clone(), snapshot.clone())),
				UpdaterCall::Add(_) => None,
			})
			.collect()
	}

	pub async fn wait_for_calls(&self, count: usize) {
		loop {
			let notified = self.changed.notified();
			if self.calls.lock().len() >= count {
				return;
			}
			notified.await;
		}
	}

	fn record(&self, call: UpdaterCall) {
		self.calls.lock().push(call);
		self.changed.notify_waiters();
	}
}

#[async_trait]
impl ProjectUpdater for RecordingUpdater {
	async fn add_project(&self, project_file: &Path) -> Result<()> {
		self.record(UpdaterCall::Add(project_file.to_path_buf()));
		Ok(())
	}

	async fn update_project(&self, project_file: &Path, snapshot: Option<ProjectSnapshot>) -> Result<()> {
		self.record(UpdaterCall::Update(project_file.to_path_buf(), snapshot));
		Ok(())
	}
}
