//! The engine facade: one instance per workspace.
//!
//! All document, version and projection state lives in an [`EngineState`] owned by a foreground
//! [`Dispatcher`]. Host calls post closures to it in arrival order. Regeneration is coalesced by
//! the publish-delay debouncer: it drains the pending set, compiles on the background pool and
//! posts each result back, where results computed against an outdated version are dropped.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use lsp_types::{Diagnostic, Position, Range, TextDocumentContentChangeEvent};
use stencil_diff::TextDiffer;
use stencil_mapping::{
	CodeDocument, LanguageKind, MappingBehavior, OffsetEncoding, filter_markup_diagnostics, template_diagnostic,
	translate_host_diagnostics,
};
use stencil_worker::{Debouncer, Dispatcher, TaskClass, WorkerJoinSet};
use tokio::sync::mpsc;

use crate::compiler::{CompiledDocument, DocumentCompiler};
use crate::config::{ProjectConfiguration, ProjectSnapshot};
use crate::config_sync::{ConfigChangeSender, ConfigSynchronizer, ProjectUpdater};
use crate::consumer::BufferConsumer;
use crate::context::ServerContext;
use crate::diagnostics::DiagnosticsSink;
use crate::error::Result;
use crate::project::{ProjectGraph, ProjectUpdate};
use crate::projection::{GeneratedProjection, ProjectionEventSender, ProjectionTarget};
use crate::publisher::ProjectionPublisher;
use crate::store::ProjectionStore;
use crate::version::{DocumentVersion, VersionCache};
use crate::watcher::ConfigWatcher;

/// Fate of a background result posted back to the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
	Applied,
	/// Computed against a version or revision that is no longer current; dropped.
	Stale,
}

/// Downstream collaborators of an engine.
pub struct EngineRoles {
	pub compiler: Arc<dyn DocumentCompiler>,
	pub host: Arc<dyn BufferConsumer>,
	pub markup: Arc<dyn BufferConsumer>,
	pub diagnostics: Arc<dyn DiagnosticsSink>,
}

#[derive(Debug, Default)]
struct DiagnosticSets {
	template: Vec<Diagnostic>,
	host: Vec<Diagnostic>,
	markup: Vec<Diagnostic>,
}

impl DiagnosticSets {
	fn merged(&self) -> Vec<Diagnostic> {
		self.template
			.iter()
			.chain(&self.host)
			.chain(&self.markup)
			.cloned()
			.collect()
	}
}

/// Input of one background compile.
#[derive(Debug, Clone)]
struct CompileItem {
	path: PathBuf,
	/// `None` for project documents the host has not opened; read from disk instead.
	text: Option<String>,
	version: Option<DocumentVersion>,
	revision: u64,
	configuration: ProjectConfiguration,
}

impl CompileItem {
	fn compile(self, compiler: &dyn DocumentCompiler) -> std::io::Result<CompileResult> {
		let source = match self.text {
			Some(text) => text,
			None => std::fs::read_to_string(&self.path)?,
		};
		let output = compiler.compile(&source, &self.configuration).into_document(&source);
		Ok(CompileResult {
			path: self.path,
			version: self.version,
			revision: self.revision,
			output,
		})
	}
}

/// A finished compile, tagged with the version and revision it was computed from.
#[derive(Debug, Clone)]
struct CompileResult {
	path: PathBuf,
	version: Option<DocumentVersion>,
	revision: u64,
	output: CompiledDocument,
}

/// Foreground-owned engine state.
pub struct EngineState {
	graph: ProjectGraph,
	versions: VersionCache,
	store: ProjectionStore,
	pending: BTreeSet<PathBuf>,
	diagnostics: HashMap<PathBuf, DiagnosticSets>,
	sink: Arc<dyn DiagnosticsSink>,
	encoding: OffsetEncoding,
}

impl EngineState {
	fn new(events: ProjectionEventSender, sink: Arc<dyn DiagnosticsSink>, encoding: OffsetEncoding) -> Self {
		Self {
			graph: ProjectGraph::new(),
			versions: VersionCache::new(),
			store: ProjectionStore::new(events),
			pending: BTreeSet::new(),
			diagnostics: HashMap::new(),
			sink,
			encoding,
		}
	}

	pub fn graph(&self) -> &ProjectGraph {
		&self.graph
	}

	pub fn versions(&self) -> &VersionCache {
		&self.versions
	}

	pub fn store(&self) -> &ProjectionStore {
		&self.store
	}

	fn open(&mut self, path: &Path, text: &str, version: DocumentVersion) {
		self.graph.open(path, text);
		self.versions.set(path, version);
		self.pending.insert(path.to_path_buf());
	}

	fn change(&mut self, path: &Path, changes: &[TextDocumentContentChangeEvent], version: DocumentVersion) -> Result<()> {
		self.graph.apply_changes(path, changes, self.encoding)?;
		self.versions.set(path, version);
		self.pending.insert(path.to_path_buf());
		Ok(())
	}

	/// Returns whether the document is still tracked (and so needs a recompile from disk).
	fn close(&mut self, path: &Path) -> bool {
		let tracked = self.graph.close(path);
		self.versions.evict(path);
		if tracked {
			self.pending.insert(path.to_path_buf());
		} else {
			self.clear_diagnostics(path);
		}
		tracked
	}

	fn apply_project_update(&mut self, update: ProjectUpdate) {
		for path in &update.untracked {
			self.versions.evict(path);
			self.clear_diagnostics(path);
		}
		self.pending.extend(update.affected);
	}

	fn clear_diagnostics(&mut self, path: &Path) {
		if self.diagnostics.remove(path).is_some() {
			self.sink.publish(path, None, Vec::new());
		}
	}

	fn drain_pending(&mut self) -> Vec<CompileItem> {
		std::mem::take(&mut self.pending)
			.into_iter()
			.filter_map(|path| {
				let document = self.graph.document(&path)?;
				let configuration = self
					.graph
					.project_of(&path)
					.map(|project| project.configuration().clone())
					.unwrap_or_default();
				Some(CompileItem {
					text: document.text().map(|rope| rope.to_string()),
					version: self.versions.get(&path),
					revision: document.revision(),
					configuration,
					path,
				})
			})
			.collect()
	}

	fn apply_result(&mut self, result: CompileResult) -> ApplyOutcome {
		let path = result.path.as_path();
		let current_revision = self.graph.document(path).map(|document| document.revision());
		if current_revision != Some(result.revision) || !self.versions.is_current(path, result.version) {
			tracing::debug!(
				path = %path.display(),
				version = ?result.version,
				current = ?self.versions.get(path),
				"sync.engine.stale_result"
			);
			return ApplyOutcome::Stale;
		}

		let sent = self.store.get_or_create(path).set_output(result.version, &result.output);
		tracing::trace!(path = %path.display(), version = ?result.version, events = sent, "sync.engine.applied");

		let encoding = self.encoding;
		let template: Vec<Diagnostic> = result
			.output
			.diagnostics
			.iter()
			.map(|diagnostic| template_diagnostic(&result.output.document, diagnostic, encoding))
			.collect();
		let first = !self.diagnostics.contains_key(path);
		let sets = self.diagnostics.entry(result.path.clone()).or_default();
		if first || sets.template != template {
			sets.template = template;
			self.sink.publish(&result.path, result.version, sets.merged());
		}
		ApplyOutcome::Applied
	}

	fn set_host_diagnostics(
		&mut self,
		path: &Path,
		version: Option<DocumentVersion>,
		diagnostics: Vec<Diagnostic>,
	) -> ApplyOutcome {
		self.set_projection_diagnostics(path, version, |document, encoding, sets| {
			sets.host = translate_host_diagnostics(document, diagnostics, encoding);
		})
	}

	fn set_markup_diagnostics(
		&mut self,
		path: &Path,
		version: Option<DocumentVersion>,
		diagnostics: Vec<Diagnostic>,
	) -> ApplyOutcome {
		self.set_projection_diagnostics(path, version, |document, encoding, sets| {
			sets.markup = filter_markup_diagnostics(document, diagnostics, encoding);
		})
	}

	fn set_projection_diagnostics(
		&mut self,
		path: &Path,
		version: Option<DocumentVersion>,
		update: impl FnOnce(&CodeDocument, OffsetEncoding, &mut DiagnosticSets),
	) -> ApplyOutcome {
		let document = self.store.get(path).and_then(|container| container.code_document());
		let (true, Some(document)) = (self.versions.is_current(path, version), document) else {
			tracing::debug!(path = %path.display(), ?version, "sync.engine.stale_diagnostics");
			return ApplyOutcome::Stale;
		};
		let sets = self.diagnostics.entry(path.to_path_buf()).or_default();
		update(&**document, self.encoding, sets);
		self.sink.publish(path, version, sets.merged());
		ApplyOutcome::Applied
	}

	/// Drops projections of documents that are neither open nor listed by a project.
	fn sweep(&mut self) -> Vec<PathBuf> {
		let removed = self.store.sweep(|path| self.graph.is_live(path));
		for path in &removed {
			self.clear_diagnostics(path);
		}
		removed
	}
}

/// Handle to the sync engine of one workspace. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SyncEngine {
	context: ServerContext,
	dispatcher: Dispatcher<EngineState>,
	regenerate: Debouncer,
	sweep: Debouncer,
}

impl SyncEngine {
	/// Starts the foreground actor, the publisher routine and both debounce timers.
	///
	/// Everything stops when the context shuts down.
	pub fn new(context: ServerContext, roles: EngineRoles) -> Self {
		let options = context.options();
		let shutdown = context.shutdown_token().clone();
		let (events, events_rx) = mpsc::unbounded_channel();

		let state = EngineState::new(events, roles.diagnostics, options.position_encoding);
		let dispatcher = Dispatcher::spawn("stencil-sync", state);

		let publisher = ProjectionPublisher::new(roles.host, roles.markup, TextDiffer::new(options.line_diff_threshold));
		stencil_worker::spawn(TaskClass::Background, publisher.run(events_rx, shutdown.clone()));

		let stop = dispatcher.clone();
		let stop_token = shutdown.clone();
		stencil_worker::spawn(TaskClass::Background, async move {
			stop_token.cancelled().await;
			stop.shutdown();
		});

		let regenerate = {
			let dispatcher = dispatcher.clone();
			let compiler = roles.compiler;
			Debouncer::with_cancel("regenerate", options.publish_delay(), shutdown.clone(), move || {
				regenerate(dispatcher.clone(), compiler.clone())
			})
		};
		let sweep = {
			let dispatcher = dispatcher.clone();
			Debouncer::with_cancel("sweep", options.sweep_delay(), shutdown, move || {
				let dispatcher = dispatcher.clone();
				async move {
					match dispatcher.run_foreground(EngineState::sweep).await {
						Ok(removed) if !removed.is_empty() => {
							tracing::debug!(removed = removed.len(), "sync.engine.swept");
						}
						Ok(_) => {}
						Err(error) => tracing::debug!(%error, "sync.engine.sweep_skipped"),
					}
				}
			})
		};

		tracing::debug!(root = %context.workspace_root().display(), "sync.engine.started");
		Self {
			context,
			dispatcher,
			regenerate,
			sweep,
		}
	}

	pub fn context(&self) -> &ServerContext {
		&self.context
	}

	/// Runs `f` against the foreground state, after every previously posted call.
	pub async fn inspect<R, F>(&self, f: F) -> Result<R>
	where
		F: FnOnce(&EngineState) -> R + Send + 'static,
		R: Send + 'static,
	{
		Ok(self.dispatcher.run_foreground(move |state| f(state)).await?)
	}

	pub async fn open(&self, path: impl Into<PathBuf>, text: impl Into<String>, version: DocumentVersion) -> Result<()> {
		let path = path.into();
		let text = text.into();
		tracing::debug!(path = %path.display(), version, "sync.engine.open");
		self.dispatcher
			.run_foreground(move |state| state.open(&path, &text, version))
			.await?;
		self.regenerate.schedule();
		Ok(())
	}

	/// Applies host edits in order and records the new version.
	pub async fn change(
		&self,
		path: impl Into<PathBuf>,
		changes: Vec<TextDocumentContentChangeEvent>,
		version: DocumentVersion,
	) -> Result<()> {
		let path = path.into();
		tracing::trace!(path = %path.display(), version, edits = changes.len(), "sync.engine.change");
		self.dispatcher
			.run_foreground(move |state| state.change(&path, &changes, version))
			.await??;
		self.regenerate.schedule();
		Ok(())
	}

	pub async fn close(&self, path: impl Into<PathBuf>) -> Result<()> {
		let path = path.into();
		tracing::debug!(path = %path.display(), "sync.engine.close");
		let tracked = self.dispatcher.run_foreground(move |state| state.close(&path)).await?;
		if tracked {
			self.regenerate.schedule();
		}
		self.sweep.schedule();
		Ok(())
	}

	/// Creates an empty project. Returns `false` if it already existed.
	pub async fn add_project(&self, project_file: impl Into<PathBuf>) -> Result<bool> {
		let project_file = project_file.into();
		Ok(self
			.dispatcher
			.run_foreground(move |state| state.graph.add_project(&project_file))
			.await?)
	}

	pub async fn remove_project(&self, project_file: impl Into<PathBuf>) -> Result<()> {
		let project_file = project_file.into();
		tracing::debug!(project = %project_file.display(), "sync.engine.remove_project");
		self.dispatcher
			.run_foreground(move |state| {
				let update = state.graph.remove_project(&project_file);
				state.apply_project_update(update);
			})
			.await?;
		self.after_project_change();
		Ok(())
	}

	/// Applies a project snapshot; `None` resets the project.
	pub async fn update_project(&self, project_file: impl Into<PathBuf>, snapshot: Option<ProjectSnapshot>) -> Result<()> {
		let project_file = project_file.into();
		tracing::debug!(project = %project_file.display(), reset = snapshot.is_none(), "sync.engine.update_project");
		self.dispatcher
			.run_foreground(move |state| {
				let update = state.graph.update_project(&project_file, snapshot.as_ref());
				state.apply_project_update(update);
			})
			.await?;
		self.after_project_change();
		Ok(())
	}

	fn after_project_change(&self) {
		self.regenerate.schedule();
		self.sweep.schedule();
	}

	pub async fn version(&self, path: impl Into<PathBuf>) -> Result<Option<DocumentVersion>> {
		let path = path.into();
		Ok(self.dispatcher.run_foreground(move |state| state.versions.get(&path)).await?)
	}

	pub async fn projection(
		&self,
		path: impl Into<PathBuf>,
		target: ProjectionTarget,
	) -> Result<Option<Arc<GeneratedProjection>>> {
		let path = path.into();
		Ok(self
			.dispatcher
			.run_foreground(move |state| {
				state
					.store
					.get(&path)
					.and_then(|container| container.projection(target).cloned())
			})
			.await?)
	}

	/// Mapping artifact of the latest applied compile.
	pub async fn code_document(&self, path: impl Into<PathBuf>) -> Result<Option<Arc<CodeDocument>>> {
		let path = path.into();
		Ok(self
			.dispatcher
			.run_foreground(move |state| {
				state
					.store
					.get(&path)
					.and_then(|container| container.code_document().cloned())
			})
			.await?)
	}

	/// Language at `position` of the template; `None` until the document has been compiled.
	pub async fn classify(&self, path: impl Into<PathBuf>, position: Position) -> Result<Option<LanguageKind>> {
		let encoding = self.encoding();
		Ok(self
			.code_document(path)
			.await?
			.map(|document| document.classify_position(position, encoding)))
	}

	pub async fn map_to_generated(&self, path: impl Into<PathBuf>, position: Position) -> Result<Option<Position>> {
		let encoding = self.encoding();
		Ok(self
			.code_document(path)
			.await?
			.and_then(|document| document.map_position_to_generated(position, encoding)))
	}

	/// Maps a host projection range back onto the template.
	pub async fn map_to_original(
		&self,
		path: impl Into<PathBuf>,
		range: Range,
		behavior: MappingBehavior,
	) -> Result<Option<Range>> {
		let encoding = self.encoding();
		Ok(self
			.code_document(path)
			.await?
			.and_then(|document| document.map_range_to_original(range, behavior, encoding)))
	}

	/// Replaces the host-language diagnostics of `path`, computed against `version`.
	pub async fn publish_host_diagnostics(
		&self,
		path: impl Into<PathBuf>,
		version: Option<DocumentVersion>,
		diagnostics: Vec<Diagnostic>,
	) -> Result<ApplyOutcome> {
		let path = path.into();
		Ok(self
			.dispatcher
			.run_foreground(move |state| state.set_host_diagnostics(&path, version, diagnostics))
			.await?)
	}

	/// Replaces the markup diagnostics of `path`, computed against `version`.
	pub async fn publish_markup_diagnostics(
		&self,
		path: impl Into<PathBuf>,
		version: Option<DocumentVersion>,
		diagnostics: Vec<Diagnostic>,
	) -> Result<ApplyOutcome> {
		let path = path.into();
		Ok(self
			.dispatcher
			.run_foreground(move |state| state.set_markup_diagnostics(&path, version, diagnostics))
			.await?)
	}

	/// Starts the configuration synchronizer routine, driving this engine.
	pub fn spawn_config_sync(&self) -> ConfigChangeSender {
		let (tx, rx) = mpsc::unbounded_channel();
		let synchronizer = ConfigSynchronizer::new(Arc::new(self.clone()), self.context.options().config_apply_delay());
		stencil_worker::spawn(
			TaskClass::Background,
			synchronizer.run(rx, self.context.shutdown_token().clone()),
		);
		tx
	}

	/// Watches the workspace root for configuration artifacts and feeds them to a fresh
	/// synchronizer. The watcher stops when the engine shuts down.
	pub async fn watch_workspace(&self) -> Result<ConfigWatcher> {
		let watcher = ConfigWatcher::new(self.context.options().config_file_name.clone());
		let changes = self.spawn_config_sync();
		watcher
			.start(self.context.workspace_root(), changes, self.context.shutdown_token())
			.await?;
		Ok(watcher)
	}

	/// Stops everything this engine started, workspace watchers included.
	pub fn shutdown(&self) {
		self.context.shutdown();
		self.dispatcher.shutdown();
	}

	fn encoding(&self) -> OffsetEncoding {
		self.context.options().position_encoding
	}
}

#[async_trait]
impl ProjectUpdater for SyncEngine {
	async fn add_project(&self, project_file: &Path) -> Result<()> {
		SyncEngine::add_project(self, project_file).await.map(drop)
	}

	async fn update_project(&self, project_file: &Path, snapshot: Option<ProjectSnapshot>) -> Result<()> {
		SyncEngine::update_project(self, project_file, snapshot).await
	}
}

/// One firing of the publish-delay debouncer.
async fn regenerate(dispatcher: Dispatcher<EngineState>, compiler: Arc<dyn DocumentCompiler>) {
	let items = match dispatcher.run_foreground(EngineState::drain_pending).await {
		Ok(items) => items,
		Err(error) => {
			tracing::debug!(%error, "sync.engine.regenerate_skipped");
			return;
		}
	};
	if items.is_empty() {
		return;
	}
	tracing::debug!(documents = items.len(), "sync.engine.regenerate");

	let mut jobs = WorkerJoinSet::new(TaskClass::Background);
	for item in items {
		let dispatcher = dispatcher.clone();
		let compiler = compiler.clone();
		jobs.spawn(async move {
			let path = item.path.clone();
			match dispatcher.run_background(move || item.compile(&*compiler)).await {
				Ok(Ok(result)) => {
					if let Err(error) = dispatcher.run_foreground(move |state| state.apply_result(result)).await {
						tracing::debug!(path = %path.display(), %error, "sync.engine.apply_skipped");
					}
				}
				Ok(Err(error)) => tracing::warn!(path = %path.display(), %error, "sync.engine.read_failed"),
				Err(error) => tracing::debug!(path = %path.display(), %error, "sync.engine.compile_cancelled"),
			}
		});
	}
	jobs.join_all().await;
}

#[cfg(test)]
mod tests;
