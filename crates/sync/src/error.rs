use std::io;
use std::path::PathBuf;

use stencil_worker::DispatchError;

/// A convenient type alias for `Result` with `E` = [`SyncError`].
pub type Result<T, E = SyncError> = std::result::Result<T, E>;

/// Operational failures of the sync engine.
///
/// Mapping misses, stale background results and malformed project snapshots are not errors;
/// they surface as `None`, [`ApplyOutcome::Stale`](crate::ApplyOutcome::Stale) and a project
/// reset respectively.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SyncError {
	/// The foreground executor stopped or background work was cancelled.
	#[error(transparent)]
	Dispatch(#[from] DispatchError),
	#[error("{0}")]
	Io(#[from] io::Error),
	#[error("invalid json: {0}")]
	Json(#[from] serde_json::Error),
	/// The filesystem watcher could not be created or attached.
	#[error("watch failed: {0}")]
	Watch(#[from] notify::Error),
	/// Start-up was cancelled through the server's shutdown token.
	#[error("cancelled")]
	Cancelled,
	/// An edit or query named a document the engine does not track.
	#[error("unknown document: {}", .0.display())]
	UnknownDocument(PathBuf),
}
