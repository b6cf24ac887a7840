use std::path::{Path, PathBuf};

use async_trait::async_trait;
use stencil_diff::TextChange;
use tokio::sync::mpsc;

use crate::projection::ProjectionTarget;
use crate::version::DocumentVersion;

/// A downstream language service refused or never received an update.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsumerError {
	#[error("buffer consumer disconnected")]
	Disconnected,
	#[error("buffer update for {} rejected: {reason}", path.display())]
	Rejected { path: PathBuf, reason: String },
}

/// Receiver of projection buffers (the host-language or markup language service).
///
/// A consumer starts every never-seen path from empty text and applies each edit list strictly
/// in order to reach the announced version.
#[async_trait]
pub trait BufferConsumer: Send + Sync + 'static {
	async fn apply_edits(
		&self,
		path: &Path,
		edits: Vec<TextChange>,
		version: Option<DocumentVersion>,
	) -> Result<(), ConsumerError>;

	/// Forgets the buffer of `path`; the next update for it starts from empty text again.
	async fn close_buffer(&self, path: &Path) -> Result<(), ConsumerError>;
}

/// Update forwarded by [`ChannelBufferConsumer`] to a transport task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferUpdate {
	Edits {
		target: ProjectionTarget,
		path: PathBuf,
		edits: Vec<TextChange>,
		version: Option<DocumentVersion>,
	},
	Close {
		target: ProjectionTarget,
		path: PathBuf,
	},
}

/// Forwards buffer updates over a channel to the task that talks to the language service.
#[derive(Debug, Clone)]
pub struct ChannelBufferConsumer {
	target: ProjectionTarget,
	tx: mpsc::UnboundedSender<BufferUpdate>,
}

impl ChannelBufferConsumer {
	pub fn new(target: ProjectionTarget, tx: mpsc::UnboundedSender<BufferUpdate>) -> Self {
		Self { target, tx }
	}

	pub fn channel(target: ProjectionTarget) -> (Self, mpsc::UnboundedReceiver<BufferUpdate>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self::new(target, tx), rx)
	}

	fn send(&self, update: BufferUpdate) -> Result<(), ConsumerError> {
		self.tx.send(update).map_err(|_| ConsumerError::Disconnected)
	}
}

#[async_trait]
impl BufferConsumer for ChannelBufferConsumer {
	async fn apply_edits(
		&self,
		path: &Path,
		edits: Vec<TextChange>,
		version: Option<DocumentVersion>,
	) -> Result<(), ConsumerError> {
		self.send(BufferUpdate::Edits {
			target: self.target,
			path: path.to_path_buf(),
			edits,
			version,
		})
	}

	async fn close_buffer(&self, path: &Path) -> Result<(), ConsumerError> {
		self.send(BufferUpdate::Close {
			target: self.target,
			path: path.to_path_buf(),
		})
	}
}
