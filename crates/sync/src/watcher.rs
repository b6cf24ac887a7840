//! Filesystem watching for project configuration artifacts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use ignore::WalkBuilder;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use stencil_worker::{CancellationToken, TaskClass};

use crate::config_sync::{ConfigChange, ConfigChangeKind, ConfigChangeSender};
use crate::error::{Result, SyncError};

type WatcherMap = Mutex<HashMap<PathBuf, WatchEntry>>;

struct WatchEntry {
	_watcher: RecommendedWatcher,
	/// Fired when the entry is stopped or replaced.
	stopped: CancellationToken,
}

/// Watches workspace roots for artifacts named `config_file_name` and reports them as
/// [`ConfigChange`]s.
///
/// A root stays watched until it is stopped or the token passed to [`ConfigWatcher::start`]
/// fires. Dropping the watcher stops every root.
pub struct ConfigWatcher {
	config_file_name: String,
	watchers: Arc<WatcherMap>,
}

impl std::fmt::Debug for ConfigWatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConfigWatcher")
			.field("config_file_name", &self.config_file_name)
			.field("roots", &self.watchers.lock().keys().collect::<Vec<_>>())
			.finish()
	}
}

impl ConfigWatcher {
	pub fn new(config_file_name: impl Into<String>) -> Self {
		Self {
			config_file_name: config_file_name.into(),
			watchers: Arc::new(Mutex::new(HashMap::new())),
		}
	}

	pub fn config_file_name(&self) -> &str {
		&self.config_file_name
	}

	/// Reports every existing artifact under `root` as added, then watches `root` recursively.
	///
	/// Returns [`SyncError::Cancelled`] without leaving a watcher behind if `cancel` fires before
	/// the watcher is registered.
	pub async fn start(&self, root: &Path, changes: ConfigChangeSender, cancel: &CancellationToken) -> Result<()> {
		if cancel.is_cancelled() {
			return Err(SyncError::Cancelled);
		}

		let walk_root = root.to_path_buf();
		let name = self.config_file_name.clone();
		let existing = tokio::select! {
			biased;
			_ = cancel.cancelled() => return Err(SyncError::Cancelled),
			found = stencil_worker::run_blocking(TaskClass::Blocking, move || find_artifacts(&walk_root, &name)) => found?,
		};
		tracing::debug!(root = %root.display(), artifacts = existing.len(), "sync.watcher.seeded");
		for path in existing {
			if changes.send(ConfigChange::new(ConfigChangeKind::Added, path)).is_err() {
				return Err(SyncError::Cancelled);
			}
		}

		let name = self.config_file_name.clone();
		let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| match event {
			Ok(event) => {
				for change in changes_for_event(&event, &name) {
					if changes.send(change).is_err() {
						return;
					}
				}
			}
			Err(error) => tracing::warn!(%error, "sync.watcher.error"),
		})?;
		watcher.watch(root, RecursiveMode::Recursive)?;

		if cancel.is_cancelled() {
			drop(watcher);
			return Err(SyncError::Cancelled);
		}
		let stopped = CancellationToken::new();
		let entry = WatchEntry {
			_watcher: watcher,
			stopped: stopped.clone(),
		};
		if let Some(replaced) = self.watchers.lock().insert(root.to_path_buf(), entry) {
			replaced.stopped.cancel();
		}
		stencil_worker::spawn(
			TaskClass::Background,
			stop_on_cancel(Arc::downgrade(&self.watchers), root.to_path_buf(), cancel.clone(), stopped),
		);
		tracing::debug!(root = %root.display(), "sync.watcher.started");
		Ok(())
	}

	/// Stops watching `root`. Returns whether a watcher was registered for it.
	pub fn stop(&self, root: &Path) -> bool {
		let Some(entry) = self.watchers.lock().remove(root) else {
			return false;
		};
		entry.stopped.cancel();
		true
	}

	pub fn stop_all(&self) {
		let stopped = std::mem::take(&mut *self.watchers.lock());
		for entry in stopped.values() {
			entry.stopped.cancel();
		}
		tracing::debug!(roots = stopped.len(), "sync.watcher.stopped");
	}

	pub fn is_watching(&self, root: &Path) -> bool {
		self.watchers.lock().contains_key(root)
	}
}

impl Drop for ConfigWatcher {
	fn drop(&mut self) {
		for entry in self.watchers.lock().values() {
			entry.stopped.cancel();
		}
	}
}

/// Drops the watcher for `root` once `cancel` fires, unless the entry was stopped first.
async fn stop_on_cancel(
	watchers: Weak<WatcherMap>,
	root: PathBuf,
	cancel: CancellationToken,
	stopped: CancellationToken,
) {
	tokio::select! {
		_ = stopped.cancelled() => {}
		_ = cancel.cancelled() => {
			let Some(watchers) = watchers.upgrade() else {
				return;
			};
			if !stopped.is_cancelled() && watchers.lock().remove(&root).is_some() {
				tracing::debug!(root = %root.display(), "sync.watcher.cancelled");
			}
		}
	}
}

/// Every file named `name` below `root`, ignore files and hidden directories included.
fn find_artifacts(root: &Path, name: &str) -> Vec<PathBuf> {
	let mut found: Vec<PathBuf> = WalkBuilder::new(root)
		.standard_filters(false)
		.build()
		.filter_map(|entry| match entry {
			Ok(entry) => Some(entry),
			Err(error) => {
				tracing::debug!(%error, "sync.watcher.walk_error");
				None
			}
		})
		.filter(|entry| entry.file_type().is_some_and(|kind| kind.is_file()) && entry.file_name() == name)
		.map(ignore::DirEntry::into_path)
		.collect();
	found.sort();
	found
}

fn is_artifact(path: &Path, name: &str) -> bool {
	path.file_name().is_some_and(|file_name| file_name == name)
}

/// Translates one filesystem event into artifact changes.
fn changes_for_event(event: &Event, name: &str) -> Vec<ConfigChange> {
	let kind_of = |path: &Path| match event.kind {
		EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ConfigChangeKind::Added),
		EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
			Some(ConfigChangeKind::Removed)
		}
		EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => None,
		// rename halves the backend could not pair
		EventKind::Modify(ModifyKind::Name(_)) if path.exists() => Some(ConfigChangeKind::Added),
		EventKind::Modify(ModifyKind::Name(_)) => Some(ConfigChangeKind::Removed),
		EventKind::Modify(_) => Some(ConfigChangeKind::Changed),
		EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
	};

	let mut changes = Vec::new();
	if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
		if let [from, to, ..] = event.paths.as_slice() {
			if is_artifact(from, name) {
				changes.push(ConfigChange::new(ConfigChangeKind::Removed, from.clone()));
			}
			if is_artifact(to, name) {
				changes.push(ConfigChange::new(ConfigChangeKind::Added, to.clone()));
			}
		}
		return changes;
	}

	for path in &event.paths {
		if !is_artifact(path, name) {
			continue;
		}
		if let Some(kind) = kind_of(path) {
			changes.push(ConfigChange::new(kind, path.clone()));
		}
	}
	changes
}
