//! Debounced application of project configuration artifacts.
//!
//! The synchronizer is a single routine. It tracks which artifact describes which project and,
//! per project, the most recent snapshot waiting to be applied. Bursts of artifact changes
//! collapse into one update per project carrying the latest payload.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stencil_worker::{CancellationToken, TaskClass, WorkerJoinSet};
use tokio::sync::mpsc;
use tokio::task::JoinError;

use crate::config::ProjectSnapshot;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigChangeKind {
	Added,
	Changed,
	Removed,
}

/// A filesystem event on a configuration artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
	pub kind: ConfigChangeKind,
	pub path: PathBuf,
}

impl ConfigChange {
	pub fn new(kind: ConfigChangeKind, path: impl Into<PathBuf>) -> Self {
		Self {
			kind,
			path: path.into(),
		}
	}
}

pub type ConfigChangeSender = mpsc::UnboundedSender<ConfigChange>;
pub type ConfigChangeReceiver = mpsc::UnboundedReceiver<ConfigChange>;

/// Receiver of project lifecycle calls made by the synchronizer.
#[async_trait]
pub trait ProjectUpdater: Send + Sync + 'static {
	/// Creates an empty project for `project_file` if it does not exist yet.
	async fn add_project(&self, project_file: &Path) -> Result<()>;

	/// Applies `snapshot` to the project; `None` resets it to the default configuration.
	async fn update_project(&self, project_file: &Path, snapshot: Option<ProjectSnapshot>) -> Result<()>;
}

/// Payload waiting for its project's delayed apply.
#[derive(Debug, Default)]
struct DelayedConfigUpdate {
	snapshot: Option<ProjectSnapshot>,
	armed: bool,
}

enum Step {
	Change(ConfigChange),
	Fired(std::result::Result<PathBuf, JoinError>),
}

pub struct ConfigSynchronizer {
	updater: Arc<dyn ProjectUpdater>,
	delay: Duration,
	/// Artifact path to the project file it describes.
	artifacts: HashMap<PathBuf, PathBuf>,
	pending: HashMap<PathBuf, DelayedConfigUpdate>,
	timers: WorkerJoinSet<PathBuf>,
}

impl std::fmt::Debug for ConfigSynchronizer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConfigSynchronizer")
			.field("delay", &self.delay)
			.field("artifacts", &self.artifacts)
			.field("pending", &self.pending.len())
			.finish()
	}
}

impl ConfigSynchronizer {
	pub fn new(updater: Arc<dyn ProjectUpdater>, delay: Duration) -> Self {
		Self {
			updater,
			delay,
			artifacts: HashMap::new(),
			pending: HashMap::new(),
			timers: WorkerJoinSet::new(TaskClass::Background),
		}
	}

	/// Project currently described by the artifact at `path`.
	pub fn project_for(&self, artifact: &Path) -> Option<&Path> {
		self.artifacts.get(artifact).map(PathBuf::as_path)
	}

	/// Processes artifact changes and fires delayed applies until `changes` closes or `cancel`
	/// fires. Pending applies are dropped on exit.
	pub async fn run(mut self, mut changes: ConfigChangeReceiver, cancel: CancellationToken) {
		loop {
			let step = tokio::select! {
				biased;
				_ = cancel.cancelled() => break,
				Some(fired) = self.timers.join_next(), if !self.timers.is_empty() => Step::Fired(fired),
				change = changes.recv() => {
					let Some(change) = change else {
						break;
					};
					Step::Change(change)
				}
			};
			match step {
				Step::Change(change) => {
					if let Err(error) = self.handle(&change).await {
						tracing::warn!(path = %change.path.display(), kind = ?change.kind, %error, "sync.config.change_failed");
					}
				}
				Step::Fired(Ok(project)) => self.apply(project).await,
				Step::Fired(Err(error)) => tracing::debug!(%error, "sync.config.timer_failed"),
			}
		}
		self.timers.abort_all();
		tracing::debug!(pending = self.pending.len(), "sync.config.stopped");
	}

	async fn handle(&mut self, change: &ConfigChange) -> Result<()> {
		let artifact = &change.path;
		match change.kind {
			ConfigChangeKind::Added => {
				let Some(snapshot) = read_snapshot(artifact).await? else {
					tracing::debug!(path = %artifact.display(), "sync.config.added_ignored");
					return Ok(());
				};
				self.track(artifact, snapshot).await;
			}
			ConfigChangeKind::Changed => {
				let snapshot = read_snapshot(artifact).await?;
				let tracked = self.artifacts.get(artifact).cloned();
				match (snapshot, tracked) {
					(None, Some(project)) => self.enqueue(project, None),
					(None, None) => {
						tracing::debug!(path = %artifact.display(), "sync.config.changed_ignored");
					}
					(Some(snapshot), None) => self.track(artifact, snapshot).await,
					(Some(snapshot), Some(project)) if project != snapshot.project_file_path => {
						tracing::debug!(
							path = %artifact.display(),
							from = %project.display(),
							to = %snapshot.project_file_path.display(),
							"sync.config.project_moved"
						);
						self.enqueue(project, None);
						self.track(artifact, snapshot).await;
					}
					(Some(snapshot), Some(project)) => self.enqueue(project, Some(snapshot)),
				}
			}
			ConfigChangeKind::Removed => {
				if let Some(project) = self.artifacts.remove(artifact) {
					self.enqueue(project, None);
				}
			}
		}
		Ok(())
	}

	/// Records that `artifact` describes the snapshot's project and schedules the snapshot.
	async fn track(&mut self, artifact: &Path, snapshot: ProjectSnapshot) {
		let project = snapshot.project_file_path.clone();
		self.artifacts.insert(artifact.to_path_buf(), project.clone());
		if let Err(error) = self.updater.add_project(&project).await {
			tracing::warn!(project = %project.display(), %error, "sync.config.add_failed");
		}
		self.enqueue(project, Some(snapshot));
	}

	/// Stores the latest payload for `project`, arming its timer unless one is already pending.
	fn enqueue(&mut self, project: PathBuf, snapshot: Option<ProjectSnapshot>) {
		let update = self.pending.entry(project.clone()).or_default();
		update.snapshot = snapshot;
		if update.armed {
			tracing::trace!(project = %project.display(), "sync.config.superseded");
			return;
		}
		update.armed = true;
		let delay = self.delay;
		self.timers.spawn(async move {
			tokio::time::sleep(delay).await;
			project
		});
	}

	async fn apply(&mut self, project: PathBuf) {
		let Some(update) = self.pending.remove(&project) else {
			return;
		};
		let reset = update.snapshot.is_none();
		tracing::debug!(project = %project.display(), reset, "sync.config.apply");
		if let Err(error) = self.updater.update_project(&project, update.snapshot).await {
			tracing::warn!(project = %project.display(), %error, "sync.config.update_failed");
		}
	}
}

async fn read_snapshot(artifact: &Path) -> Result<Option<ProjectSnapshot>> {
	let path = artifact.to_path_buf();
	Ok(stencil_worker::run_blocking(TaskClass::Blocking, move || ProjectSnapshot::read(&path)).await?)
}

#[cfg(test)]
mod tests;
