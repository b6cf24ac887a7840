use std::future::Future;
use std::sync::LazyLock;

use tokio::runtime::{Handle, Runtime};
use tokio::task::{JoinError, JoinHandle};

use crate::{DispatchError, TaskClass};

/// Runtime used when the engine is driven from outside any tokio context.
static FALLBACK_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
	tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.worker_threads(2)
		.thread_name("stencil-worker")
		.build()
		.expect("stencil-worker: cannot build the fallback tokio runtime")
});

/// The caller's runtime if there is one, the fallback runtime otherwise.
pub(crate) fn runtime_handle() -> Handle {
	Handle::try_current().unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
}

/// Spawns an async task tagged with its execution class.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn");
	runtime_handle().spawn(fut)
}

/// Spawns blocking work on the background pool.
pub fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "worker.spawn_blocking");
	runtime_handle().spawn_blocking(f)
}

/// Runs blocking work on the background pool and waits for its value.
///
/// A panic inside `f` is resumed on the awaiting task; a task torn down with its runtime yields
/// [`DispatchError::Cancelled`].
pub async fn run_blocking<F, R>(class: TaskClass, f: F) -> Result<R, DispatchError>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	join_blocking(spawn_blocking(class, f).await)
}

pub(crate) fn join_blocking<R>(joined: Result<R, JoinError>) -> Result<R, DispatchError> {
	match joined {
		Ok(value) => Ok(value),
		Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
		Err(_) => Err(DispatchError::Cancelled),
	}
}
