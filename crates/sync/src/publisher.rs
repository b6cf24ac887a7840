//! Minimal-edit publishing of projections to downstream language services.
//!
//! The publisher is a single routine fed by [`ProjectionEvent`]s in the order containers sent
//! them. It remembers what each consumer last received and sends only the difference, so a
//! consumer that applies every edit list in order always holds the latest projection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use stencil_diff::TextDiffer;
use stencil_worker::{CancellationToken, TaskClass};

use crate::consumer::BufferConsumer;
use crate::projection::{ProjectionEvent, ProjectionEventReceiver, ProjectionTarget};
use crate::version::DocumentVersion;

/// What a consumer last received for one path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PublishRecord {
	text: Arc<str>,
	version: Option<DocumentVersion>,
}

pub struct ProjectionPublisher {
	host: Arc<dyn BufferConsumer>,
	markup: Arc<dyn BufferConsumer>,
	differ: TextDiffer,
	records: HashMap<(PathBuf, ProjectionTarget), PublishRecord>,
}

impl std::fmt::Debug for ProjectionPublisher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProjectionPublisher")
			.field("differ", &self.differ)
			.field("records", &self.records.len())
			.finish()
	}
}

impl ProjectionPublisher {
	pub fn new(host: Arc<dyn BufferConsumer>, markup: Arc<dyn BufferConsumer>, differ: TextDiffer) -> Self {
		Self {
			host,
			markup,
			differ,
			records: HashMap::new(),
		}
	}

	fn consumer(&self, target: ProjectionTarget) -> &Arc<dyn BufferConsumer> {
		match target {
			ProjectionTarget::Host => &self.host,
			ProjectionTarget::Markup => &self.markup,
		}
	}

	/// Text and version last sent for `path` to the `target` consumer.
	pub fn last_published(&self, path: &Path, target: ProjectionTarget) -> Option<(&str, Option<DocumentVersion>)> {
		self.records
			.get(&(path.to_path_buf(), target))
			.map(|record| (&*record.text, record.version))
	}

	/// Sends the minimal edits turning the last published text into `text`.
	///
	/// Nothing is sent when neither the text nor the version changed. The record only advances
	/// once the consumer accepted the edits; after a failed delivery the next publish is diffed
	/// against what the consumer still holds.
	pub async fn publish(
		&mut self,
		path: &Path,
		target: ProjectionTarget,
		text: Arc<str>,
		version: Option<DocumentVersion>,
	) {
		let key = (path.to_path_buf(), target);
		let previous = self.records.get(&key).cloned().unwrap_or_default();

		let differ = self.differ;
		let old = previous.text.clone();
		let new = text.clone();
		let edits =
			match stencil_worker::run_blocking(TaskClass::Blocking, move || differ.minimal_changes(&old, &new)).await {
				Ok(edits) => edits,
				Err(error) => {
					tracing::debug!(path = %path.display(), target = target.as_str(), %error, "sync.publish.diff_cancelled");
					return;
				}
			};

		if edits.is_empty() && previous.version == version {
			tracing::trace!(path = %path.display(), target = target.as_str(), ?version, "sync.publish.unchanged");
			return;
		}

		let count = edits.len();
		if let Err(error) = self.consumer(target).apply_edits(path, edits, version).await {
			tracing::warn!(path = %path.display(), target = target.as_str(), ?version, %error, "sync.publish.failed");
			return;
		}
		self.records.insert(key, PublishRecord { text, version });
		tracing::trace!(path = %path.display(), target = target.as_str(), ?version, edits = count, "sync.publish.sent");
	}

	/// Drops the records of a removed document and closes its downstream buffers.
	pub async fn forget(&mut self, path: &Path) {
		for target in ProjectionTarget::ALL {
			if self.records.remove(&(path.to_path_buf(), target)).is_none() {
				continue;
			}
			if let Err(error) = self.consumer(target).close_buffer(path).await {
				tracing::warn!(path = %path.display(), target = target.as_str(), %error, "sync.publish.close_failed");
			}
		}
	}

	pub async fn handle(&mut self, event: ProjectionEvent) {
		match event {
			ProjectionEvent::Changed {
				path,
				target,
				projection,
			} => {
				let text = projection.text().clone();
				self.publish(&path, target, text, projection.input_version()).await;
			}
			ProjectionEvent::Removed { path } => self.forget(&path).await,
		}
	}

	/// Processes events until the channel closes or `cancel` fires.
	pub async fn run(mut self, mut events: ProjectionEventReceiver, cancel: CancellationToken) {
		loop {
			let event = tokio::select! {
				biased;
				_ = cancel.cancelled() => break,
				event = events.recv() => {
					let Some(event) = event else {
						break;
					};
					event
				}
			};
			self.handle(event).await;
		}
		tracing::debug!(records = self.records.len(), "sync.publish.stopped");
	}
}
