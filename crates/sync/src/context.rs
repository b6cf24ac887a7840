use std::path::{Path, PathBuf};
use std::sync::Arc;

use stencil_worker::CancellationToken;

use crate::options::SyncOptions;

/// Process-scoped server state shared by every routine of one workspace.
///
/// Cheap to clone. Every routine, timer and watcher started by the engine observes
/// [`shutdown_token`](Self::shutdown_token), so [`shutdown`](Self::shutdown) stops them all.
#[derive(Debug, Clone)]
pub struct ServerContext {
	inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
	options: SyncOptions,
	workspace_root: PathBuf,
	shutdown: CancellationToken,
}

impl ServerContext {
	pub fn new(options: SyncOptions, workspace_root: impl Into<PathBuf>) -> Self {
		Self {
			inner: Arc::new(ContextInner {
				options,
				workspace_root: workspace_root.into(),
				shutdown: CancellationToken::new(),
			}),
		}
	}

	pub fn options(&self) -> &SyncOptions {
		&self.inner.options
	}

	pub fn workspace_root(&self) -> &Path {
		&self.inner.workspace_root
	}

	pub fn shutdown_token(&self) -> &CancellationToken {
		&self.inner.shutdown
	}

	pub fn is_shutdown(&self) -> bool {
		self.inner.shutdown.is_cancelled()
	}

	pub fn shutdown(&self) {
		tracing::debug!(root = %self.inner.workspace_root.display(), "sync.context.shutdown");
		self.inner.shutdown.cancel();
	}
}
