use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Version number the editor assigns to an open document.
pub type DocumentVersion = i32;

/// Latest host-assigned version of every open document.
///
/// Background results carry the version they were computed against; a result whose version no
/// longer matches the cache is stale.
#[derive(Debug, Default)]
pub struct VersionCache {
	versions: HashMap<PathBuf, DocumentVersion>,
}

impl VersionCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, path: &Path) -> Option<DocumentVersion> {
		self.versions.get(path).copied()
	}

	pub fn set(&mut self, path: impl Into<PathBuf>, version: DocumentVersion) {
		self.versions.insert(path.into(), version);
	}

	pub fn evict(&mut self, path: &Path) -> Option<DocumentVersion> {
		self.versions.remove(path)
	}

	/// Whether `version` is what the cache currently holds for `path` (both may be absent).
	pub fn is_current(&self, path: &Path, version: Option<DocumentVersion>) -> bool {
		self.get(path) == version
	}

	pub fn len(&self) -> usize {
		self.versions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.versions.is_empty()
	}
}
