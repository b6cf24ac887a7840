//! Incremental projection synchronization for stencil templates.
//!
//! A [`SyncEngine`] keeps two generated projections of every tracked template, one for the host
//! language and one markup-only, in step with the authored text:
//!
//! 1. host edits land on the foreground actor, which updates the [`ProjectGraph`] and the
//!    [`VersionCache`];
//! 2. after a quiet period the pending documents are compiled on the background pool by the
//!    [`DocumentCompiler`];
//! 3. results still matching the cached version are stored in their [`ProjectionContainer`],
//!    which announces changed projections to the [`ProjectionPublisher`];
//! 4. the publisher sends each [`BufferConsumer`] the minimal edits from what it last received.
//!
//! Project configuration artifacts found by the [`ConfigWatcher`] are applied through the
//! debounced [`ConfigSynchronizer`].

mod compiler;
mod config;
mod config_sync;
mod consumer;
mod context;
mod diagnostics;
mod engine;
mod error;
mod options;
mod project;
mod projection;
mod publisher;
mod store;
mod version;
mod watcher;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use compiler::{CompileOutput, CompiledDocument, DocumentCompiler};
pub use config::{DocumentSnapshot, ProjectConfiguration, ProjectSnapshot};
pub use config_sync::{
	ConfigChange, ConfigChangeKind, ConfigChangeReceiver, ConfigChangeSender, ConfigSynchronizer, ProjectUpdater,
};
pub use consumer::{BufferConsumer, BufferUpdate, ChannelBufferConsumer, ConsumerError};
pub use context::ServerContext;
pub use diagnostics::{ChannelDiagnosticsSink, DiagnosticsSink, DiagnosticsUpdate};
pub use engine::{ApplyOutcome, EngineRoles, EngineState, SyncEngine};
pub use error::{Result, SyncError};
pub use options::{DEFAULT_CONFIG_FILE_NAME, SyncOptions};
pub use project::{DocumentKind, Project, ProjectGraph, ProjectKey, ProjectUpdate, TrackedDocument};
pub use projection::{
	GeneratedProjection, ProjectionContainer, ProjectionEvent, ProjectionEventReceiver, ProjectionEventSender,
	ProjectionTarget,
};
pub use publisher::ProjectionPublisher;
pub use store::ProjectionStore;
pub use version::{DocumentVersion, VersionCache};
pub use watcher::ConfigWatcher;
