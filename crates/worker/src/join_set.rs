use std::future::Future;

use tokio::task::{JoinError, JoinSet};

use crate::TaskClass;

/// A batch of tasks of one class, joined in completion order.
///
/// Tasks are attached to the worker runtime even when the caller runs outside of it. Dropping the
/// set aborts whatever is still running.
#[derive(Debug)]
pub struct WorkerJoinSet<T> {
	class: TaskClass,
	inner: JoinSet<T>,
}

impl<T> WorkerJoinSet<T>
where
	T: Send + 'static,
{
	pub fn new(class: TaskClass) -> Self {
		Self {
			class,
			inner: JoinSet::new(),
		}
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = T> + Send + 'static,
	{
		tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "worker.join_set.spawn");
		let handle = crate::spawn::runtime_handle();
		let _guard = handle.enter();
		self.inner.spawn(fut);
	}

	/// Next finished task; `None` once the set is empty.
	pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.join_next().await
	}

	/// Waits for every task. Panicked and aborted tasks are logged and left out of the result.
	pub async fn join_all(&mut self) -> Vec<T> {
		let mut finished = Vec::with_capacity(self.inner.len());
		while let Some(joined) = self.inner.join_next().await {
			match joined {
				Ok(value) => finished.push(value),
				Err(error) if error.is_panic() => {
					tracing::warn!(worker_class = self.class.as_str(), %error, "worker.join_set.panicked");
				}
				Err(error) => tracing::debug!(worker_class = self.class.as_str(), %error, "worker.join_set.aborted"),
			}
		}
		finished
	}

	pub fn abort_all(&mut self) {
		if !self.inner.is_empty() {
			tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "worker.join_set.abort");
		}
		self.inner.abort_all();
	}
}
