//! Ordered foreground actor plus background pool.
//!
//! A [`Dispatcher`] owns one state value `S`. Closures posted to it run against `&mut S` one at a
//! time, in post order, on a single task. Because nothing else can reach the state it needs no
//! locks. Cross-executor hand-off is always explicit:
//!
//! ```text
//! let input = dispatcher.run_foreground(|state| state.snapshot()).await?;
//! let output = dispatcher.run_background(move || expensive(input)).await?;
//! dispatcher.run_foreground(move |state| state.install(output)).await?;
//! ```
//!
//! While one logical task is suspended on background work the foreground queue keeps draining
//! other posted closures.

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::TaskClass;
use crate::spawn::join_blocking;

type ForegroundJob<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Dispatch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
	/// The foreground actor has stopped (shutdown or a panicking closure).
	#[error("foreground executor closed")]
	Closed,
	/// Background work was cancelled before it produced a value.
	#[error("background work cancelled")]
	Cancelled,
}

/// Handle to a foreground actor owning state `S`, plus access to the background pool.
pub struct Dispatcher<S> {
	name: &'static str,
	tx: mpsc::UnboundedSender<ForegroundJob<S>>,
	cancel: CancellationToken,
}

impl<S> Clone for Dispatcher<S> {
	fn clone(&self) -> Self {
		Self {
			name: self.name,
			tx: self.tx.clone(),
			cancel: self.cancel.clone(),
		}
	}
}

impl<S> fmt::Debug for Dispatcher<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Dispatcher")
			.field("name", &self.name)
			.field("closed", &self.is_closed())
			.finish()
	}
}

impl<S> Dispatcher<S> {
	/// Returns the actor name.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns `true` once the actor no longer accepts work.
	pub fn is_closed(&self) -> bool {
		self.cancel.is_cancelled() || self.tx.is_closed()
	}

	/// Stops the actor. Queued closures are dropped; their callers observe [`DispatchError::Closed`].
	pub fn shutdown(&self) {
		tracing::debug!(dispatcher = self.name, "worker.foreground.shutdown");
		self.cancel.cancel();
	}
}

impl<S> Dispatcher<S>
where
	S: Send + 'static,
{
	/// Starts the foreground actor that owns `state`.
	pub fn spawn(name: &'static str, state: S) -> Self {
		let (tx, mut rx) = mpsc::unbounded_channel::<ForegroundJob<S>>();
		let cancel = CancellationToken::new();
		let task_cancel = cancel.clone();
		crate::spawn(TaskClass::Foreground, async move {
			let mut state = state;
			loop {
				let job = tokio::select! {
					biased;
					_ = task_cancel.cancelled() => break,
					job = rx.recv() => {
						let Some(job) = job else {
							break;
						};
						job
					}
				};
				job(&mut state);
			}
			tracing::debug!(dispatcher = name, pending = rx.len(), "worker.foreground.stopped");
		});

		Self { name, tx, cancel }
	}

	/// Posts a closure to the foreground queue without waiting for it to run.
	pub fn post<F>(&self, f: F) -> Result<(), DispatchError>
	where
		F: FnOnce(&mut S) + Send + 'static,
	{
		if self.cancel.is_cancelled() {
			return Err(DispatchError::Closed);
		}
		self.tx.send(Box::new(f)).map_err(|_| DispatchError::Closed)
	}

	/// Posts a closure to the foreground queue and waits for its result.
	pub async fn run_foreground<R, F>(&self, f: F) -> Result<R, DispatchError>
	where
		F: FnOnce(&mut S) -> R + Send + 'static,
		R: Send + 'static,
	{
		let (reply_tx, reply_rx) = oneshot::channel();
		self.post(move |state| {
			let _ = reply_tx.send(f(state));
		})?;
		reply_rx.await.map_err(|_| DispatchError::Closed)
	}

	/// Runs `f` on the background pool.
	///
	/// A panic inside `f` is resumed on the awaiting task.
	pub async fn run_background<R, F>(&self, f: F) -> Result<R, DispatchError>
	where
		F: FnOnce() -> R + Send + 'static,
		R: Send + 'static,
	{
		crate::run_blocking(TaskClass::Blocking, f).await
	}

	/// Runs `f` on the background pool, giving up as soon as `cancel` fires.
	///
	/// `f` receives a child token it may poll to stop early; its result is discarded once the
	/// caller has observed [`DispatchError::Cancelled`].
	pub async fn run_background_cancellable<R, F>(&self, cancel: &CancellationToken, f: F) -> Result<R, DispatchError>
	where
		F: FnOnce(CancellationToken) -> R + Send + 'static,
		R: Send + 'static,
	{
		if cancel.is_cancelled() {
			return Err(DispatchError::Cancelled);
		}
		let token = cancel.child_token();
		let worker_token = token.clone();
		let handle = crate::spawn_blocking(TaskClass::Blocking, move || f(worker_token));
		tokio::select! {
			biased;
			_ = cancel.cancelled() => {
				token.cancel();
				Err(DispatchError::Cancelled)
			}
			result = handle => join_blocking(result),
		}
	}
}
