use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::time::Instant;

use super::*;
use crate::test_support::{RecordingUpdater, UpdaterCall};

const WINDOW: Duration = Duration::from_millis(250);

struct Harness {
	dir: TempDir,
	updater: Arc<RecordingUpdater>,
	changes: ConfigChangeSender,
	cancel: CancellationToken,
}

impl Harness {
	fn start() -> Self {
		let dir = tempfile::tempdir().unwrap();
		let updater = Arc::new(RecordingUpdater::new());
		let (changes, rx) = mpsc::unbounded_channel();
		let cancel = CancellationToken::new();
		let synchronizer = ConfigSynchronizer::new(updater.clone(), WINDOW);
		tokio::spawn(synchronizer.run(rx, cancel.clone()));
		Self {
			dir,
			updater,
			changes,
			cancel,
		}
	}

	fn artifact(&self) -> PathBuf {
		self.dir.path().join("project.stencil.json")
	}

	fn project(&self, name: &str) -> PathBuf {
		self.dir.path().join(name)
	}

	fn write(&self, project: &str, namespace: &str) -> ProjectSnapshot {
		let snapshot = ProjectSnapshot {
			project_file_path: self.project(project),
			root_namespace: Some(namespace.to_owned()),
			configuration: Default::default(),
			documents: Vec::new(),
		};
		fs::write(self.artifact(), serde_json::to_vec(&snapshot).unwrap()).unwrap();
		snapshot
	}

	fn send(&self, kind: ConfigChangeKind) {
		self.changes.send(ConfigChange::new(kind, self.artifact())).unwrap();
	}
}

impl Drop for Harness {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

#[tokio::test(start_paused = true)]
async fn burst_of_changes_applies_once_with_the_latest_snapshot() {
	let harness = Harness::start();
	let start = Instant::now();

	harness.write("site.proj", "First");
	harness.send(ConfigChangeKind::Added);
	tokio::time::sleep(Duration::from_millis(40)).await;
	harness.write("site.proj", "Second");
	harness.send(ConfigChangeKind::Changed);
	tokio::time::sleep(Duration::from_millis(40)).await;
	let last = harness.write("site.proj", "Third");
	harness.send(ConfigChangeKind::Changed);

	harness.updater.wait_for_calls(2).await;
	assert!(start.elapsed() >= WINDOW);
	assert_eq!(
		harness.updater.calls(),
		vec![
			UpdaterCall::Add(harness.project("site.proj")),
			UpdaterCall::Update(harness.project("site.proj"), Some(last)),
		]
	);

	tokio::time::sleep(WINDOW * 4).await;
	assert_eq!(harness.updater.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn malformed_added_artifact_is_ignored() {
	let harness = Harness::start();
	fs::write(harness.artifact(), b"{ not json").unwrap();
	harness.send(ConfigChangeKind::Added);
	harness.send(ConfigChangeKind::Changed);

	tokio::time::sleep(WINDOW * 4).await;
	assert!(harness.updater.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn malformed_change_resets_a_tracked_project() {
	let harness = Harness::start();
	harness.write("site.proj", "Site");
	harness.send(ConfigChangeKind::Added);
	harness.updater.wait_for_calls(2).await;

	fs::write(harness.artifact(), b"{ not json").unwrap();
	harness.send(ConfigChangeKind::Changed);
	harness.updater.wait_for_calls(3).await;
	assert_eq!(
		harness.updater.calls().last(),
		Some(&UpdaterCall::Update(harness.project("site.proj"), None))
	);
}

#[tokio::test(start_paused = true)]
async fn untracked_change_is_treated_as_added() {
	let harness = Harness::start();
	let snapshot = harness.write("site.proj", "Site");
	harness.send(ConfigChangeKind::Changed);

	harness.updater.wait_for_calls(2).await;
	assert_eq!(
		harness.updater.calls(),
		vec![
			UpdaterCall::Add(harness.project("site.proj")),
			UpdaterCall::Update(harness.project("site.proj"), Some(snapshot)),
		]
	);
}

#[tokio::test(start_paused = true)]
async fn removed_artifact_resets_its_project() {
	let harness = Harness::start();
	harness.write("site.proj", "Site");
	harness.send(ConfigChangeKind::Added);
	harness.updater.wait_for_calls(2).await;

	fs::remove_file(harness.artifact()).unwrap();
	harness.send(ConfigChangeKind::Removed);
	harness.updater.wait_for_calls(3).await;
	assert_eq!(
		harness.updater.calls().last(),
		Some(&UpdaterCall::Update(harness.project("site.proj"), None))
	);

	// a second removal has nothing left to reset
	harness.send(ConfigChangeKind::Removed);
	tokio::time::sleep(WINDOW * 4).await;
	assert_eq!(harness.updater.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn artifact_naming_another_project_moves_the_mapping() {
	let harness = Harness::start();
	harness.write("old.proj", "Old");
	harness.send(ConfigChangeKind::Added);
	harness.updater.wait_for_calls(2).await;

	let moved = harness.write("new.proj", "New");
	harness.send(ConfigChangeKind::Changed);
	harness.updater.wait_for_calls(5).await;

	let calls = harness.updater.calls();
	assert_eq!(calls[2], UpdaterCall::Add(harness.project("new.proj")));
	let applied = &calls[3..];
	assert!(applied.contains(&UpdaterCall::Update(harness.project("old.proj"), None)));
	assert!(applied.contains(&UpdaterCall::Update(harness.project("new.proj"), Some(moved))));
}
