use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::projection::{ProjectionContainer, ProjectionEvent, ProjectionEventSender};

/// Projection containers of every document, owned by the foreground.
///
/// Each container is created lazily and handed the publisher channel once, at creation.
#[derive(Debug)]
pub struct ProjectionStore {
	events: ProjectionEventSender,
	containers: HashMap<PathBuf, ProjectionContainer>,
}

impl ProjectionStore {
	pub fn new(events: ProjectionEventSender) -> Self {
		Self {
			events,
			containers: HashMap::new(),
		}
	}

	pub fn get(&self, path: &Path) -> Option<&ProjectionContainer> {
		self.containers.get(path)
	}

	pub fn get_or_create(&mut self, path: &Path) -> &mut ProjectionContainer {
		self.containers
			.entry(path.to_path_buf())
			.or_insert_with(|| ProjectionContainer::new(path.to_path_buf(), self.events.clone()))
	}

	pub fn contains(&self, path: &Path) -> bool {
		self.containers.contains_key(path)
	}

	pub fn len(&self) -> usize {
		self.containers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.containers.is_empty()
	}

	/// Drops the container of `path` and announces its removal.
	pub fn remove(&mut self, path: &Path) -> bool {
		if self.containers.remove(path).is_none() {
			return false;
		}
		if self
			.events
			.send(ProjectionEvent::Removed {
				path: path.to_path_buf(),
			})
			.is_err()
		{
			tracing::debug!(path = %path.display(), "sync.store.publisher_gone");
		}
		true
	}

	/// Removes every container whose document is no longer live. Returns the removed paths.
	pub fn sweep(&mut self, is_live: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
		let mut dead: Vec<PathBuf> = self
			.containers
			.keys()
			.filter(|path| !is_live(path.as_path()))
			.cloned()
			.collect();
		dead.sort();
		for path in &dead {
			self.remove(path);
		}
		if !dead.is_empty() {
			tracing::debug!(removed = dead.len(), remaining = self.containers.len(), "sync.store.swept");
		}
		dead
	}
}
