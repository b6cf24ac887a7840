//! Project configuration artifacts.
//!
//! A project is described by a JSON snapshot written next to the project file:
//!
//! ```json
//! {
//!   "projectFilePath": "/work/site/site.proj",
//!   "rootNamespace": "Site",
//!   "configuration": { "languageVersion": "3.0", "extensions": ["forms"] },
//!   "documents": [{ "filePath": "Pages/Index.stencil", "fileKind": "component" }]
//! }
//! ```
//!
//! Relative document paths resolve against the project file's directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::project::DocumentKind;

/// Compiler-facing settings of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfiguration {
	pub language_version: Option<String>,
	pub extensions: Vec<String>,
}

/// One document entry of a [`ProjectSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
	pub file_path: PathBuf,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_path: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub file_kind: Option<DocumentKind>,
}

impl DocumentSnapshot {
	/// Kind declared by the snapshot, or inferred from the file name.
	pub fn kind(&self) -> DocumentKind {
		self.file_kind.unwrap_or_else(|| DocumentKind::from_path(&self.file_path))
	}
}

/// Deserialized configuration artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
	pub project_file_path: PathBuf,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub root_namespace: Option<String>,
	#[serde(default)]
	pub configuration: ProjectConfiguration,
	#[serde(default)]
	pub documents: Vec<DocumentSnapshot>,
}

impl ProjectSnapshot {
	/// Parses an artifact; malformed input is logged and yields `None`.
	pub fn parse(bytes: &[u8]) -> Option<Self> {
		match serde_json::from_slice::<Self>(bytes) {
			Ok(snapshot) => Some(snapshot),
			Err(error) => {
				tracing::warn!(%error, "sync.config.malformed_snapshot");
				None
			}
		}
	}

	/// Reads and parses the artifact at `path`; unreadable files are logged and yield `None`.
	pub fn read(path: &Path) -> Option<Self> {
		match std::fs::read(path) {
			Ok(bytes) => Self::parse(&bytes),
			Err(error) => {
				tracing::warn!(path = %path.display(), %error, "sync.config.unreadable_snapshot");
				None
			}
		}
	}

	/// Absolute path of `document`.
	pub fn resolve(&self, document: &DocumentSnapshot) -> PathBuf {
		if document.file_path.is_absolute() {
			return document.file_path.clone();
		}
		let base = self.project_file_path.parent().unwrap_or_else(|| Path::new(""));
		base.join(&document.file_path)
	}

	/// Absolute paths and kinds of every listed document.
	pub fn resolved_documents(&self) -> impl Iterator<Item = (PathBuf, DocumentKind)> + '_ {
		self.documents
			.iter()
			.map(|document| (self.resolve(document), document.kind()))
	}
}
