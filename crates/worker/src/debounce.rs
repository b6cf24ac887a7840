//! Single-instance debounce timer.
//!
//! A [`Debouncer`] coalesces bursts of "work is available" signals into one firing of its action.
//! At most one timer is armed at a time; a signal that arrives while the action is executing
//! re-arms the timer once the action returns, so no signal is lost and no two firings overlap.
//! A panicking action counts as a finished firing.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::TaskClass;

type DebounceAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
	Idle,
	Armed,
	Running { rearm: bool },
}

struct DebounceInner {
	name: &'static str,
	delay: Duration,
	action: DebounceAction,
	state: Mutex<DebounceState>,
	cancel: CancellationToken,
}

/// Coalescing timer that runs an async action after a quiet period.
#[derive(Clone)]
pub struct Debouncer {
	inner: Arc<DebounceInner>,
}

impl std::fmt::Debug for Debouncer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Debouncer")
			.field("name", &self.inner.name)
			.field("delay", &self.inner.delay)
			.field("state", &*self.inner.state.lock())
			.finish()
	}
}

impl Debouncer {
	/// Creates an idle debouncer.
	pub fn new<F, Fut>(name: &'static str, delay: Duration, action: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		Self::with_cancel(name, delay, CancellationToken::new(), action)
	}

	/// Creates an idle debouncer that stops permanently when `cancel` fires.
	pub fn with_cancel<F, Fut>(name: &'static str, delay: Duration, cancel: CancellationToken, action: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let action: DebounceAction = Arc::new(move || action().boxed());
		Self {
			inner: Arc::new(DebounceInner {
				name,
				delay,
				action,
				state: Mutex::new(DebounceState::Idle),
				cancel,
			}),
		}
	}

	/// Signals that work is available.
	///
	/// Returns `true` when this call armed a new timer.
	pub fn schedule(&self) -> bool {
		if self.inner.cancel.is_cancelled() {
			return false;
		}
		let mut state = self.inner.state.lock();
		match *state {
			DebounceState::Idle => {
				*state = DebounceState::Armed;
				drop(state);
				tracing::trace!(debouncer = self.inner.name, "worker.debounce.armed");
				crate::spawn(TaskClass::Background, Arc::clone(&self.inner).run());
				true
			}
			DebounceState::Armed => false,
			DebounceState::Running { .. } => {
				*state = DebounceState::Running { rearm: true };
				false
			}
		}
	}

	/// Returns `true` while a firing is armed or executing.
	pub fn is_pending(&self) -> bool {
		*self.inner.state.lock() != DebounceState::Idle
	}

	/// Stops the timer permanently. An executing action runs to completion.
	pub fn cancel(&self) {
		self.inner.cancel.cancel();
	}
}

impl DebounceInner {
	async fn run(self: Arc<Self>) {
		loop {
			tokio::select! {
				biased;
				_ = self.cancel.cancelled() => {
					*self.state.lock() = DebounceState::Idle;
					return;
				}
				_ = tokio::time::sleep(self.delay) => {}
			}

			*self.state.lock() = DebounceState::Running { rearm: false };
			tracing::trace!(debouncer = self.name, "worker.debounce.fire");
			if let Err(panic) = AssertUnwindSafe((self.action)()).catch_unwind().await {
				let message = panic
					.downcast_ref::<&str>()
					.copied()
					.or_else(|| panic.downcast_ref::<String>().map(String::as_str))
					.unwrap_or("<non-string panic>");
				tracing::warn!(debouncer = self.name, panic = message, "worker.debounce.action_panicked");
			}

			let rearm = {
				let mut state = self.state.lock();
				let rearm = matches!(*state, DebounceState::Running { rearm: true }) && !self.cancel.is_cancelled();
				*state = if rearm { DebounceState::Armed } else { DebounceState::Idle };
				rearm
			};
			if !rearm {
				return;
			}
		}
	}
}

#[cfg(test)]
mod tests;
