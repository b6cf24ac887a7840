//! Execution primitives for the stencil sync engine.
//!
//! The engine runs on exactly two logical executors:
//!
//! * a single ordered **foreground** actor ([`Dispatcher`]) that owns all document, projection
//!   and version state and runs posted closures strictly in the order they were posted;
//! * an unordered **background** pool for compilation and diffing, reached through
//!   [`Dispatcher::run_background`].
//!
//! Background work never touches foreground state. It computes a value and the caller posts that
//! value back with [`Dispatcher::run_foreground`]. Timers that coalesce bursts of work
//! ([`Debouncer`]) are single-instance: at most one firing is pending per concern.

mod class;
mod debounce;
mod dispatcher;
mod join_set;
mod spawn;

pub use class::TaskClass;
pub use debounce::Debouncer;
pub use dispatcher::{DispatchError, Dispatcher};
pub use join_set::WorkerJoinSet;
pub use spawn::{run_blocking, spawn, spawn_blocking};
pub use tokio_util::sync::CancellationToken;
