//! Projects and the documents they own.
//!
//! Every tracked document belongs to exactly one project. Documents the host opens that no
//! project lists belong to the built-in miscellaneous project; they are dropped again on close.
//! Closed documents stay tracked only while a project lists them.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use lsp_types::TextDocumentContentChangeEvent;
use ropey::Rope;
use serde::{Deserialize, Serialize};
use stencil_mapping::{OffsetEncoding, lsp_position_to_byte};

use crate::config::{ProjectConfiguration, ProjectSnapshot};
use crate::error::{Result, SyncError};

const IMPORTS_FILE_NAME: &str = "_Imports.stencil";

/// Role of a template within its project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
	Template,
	Component,
	/// Directives shared by every template in its directory and below.
	Import,
}

impl DocumentKind {
	/// Infers the kind from the file name alone.
	pub fn from_path(path: &Path) -> Self {
		match path.file_name().and_then(|name| name.to_str()) {
			Some(name) if name.eq_ignore_ascii_case(IMPORTS_FILE_NAME) => Self::Import,
			_ => Self::Template,
		}
	}
}

/// Identity of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProjectKey {
	/// Owner of open documents no project claims.
	Miscellaneous,
	/// A project identified by its project file.
	File(PathBuf),
}

impl ProjectKey {
	pub fn file(path: impl Into<PathBuf>) -> Self {
		Self::File(path.into())
	}
}

#[derive(Debug, Clone)]
pub struct Project {
	key: ProjectKey,
	configuration: ProjectConfiguration,
	root_namespace: Option<String>,
	documents: BTreeSet<PathBuf>,
}

impl Project {
	fn new(key: ProjectKey) -> Self {
		Self {
			key,
			configuration: ProjectConfiguration::default(),
			root_namespace: None,
			documents: BTreeSet::new(),
		}
	}

	pub fn key(&self) -> &ProjectKey {
		&self.key
	}

	pub fn configuration(&self) -> &ProjectConfiguration {
		&self.configuration
	}

	pub fn root_namespace(&self) -> Option<&str> {
		self.root_namespace.as_deref()
	}

	pub fn documents(&self) -> impl Iterator<Item = &Path> {
		self.documents.iter().map(PathBuf::as_path)
	}
}

/// A template the engine tracks.
#[derive(Debug, Clone)]
pub struct TrackedDocument {
	path: PathBuf,
	kind: DocumentKind,
	project: ProjectKey,
	/// Current text while the host has the document open.
	text: Option<Rope>,
	/// Bumped on every text mutation, including open and close.
	revision: u64,
}

impl TrackedDocument {
	fn new(path: PathBuf, kind: DocumentKind, project: ProjectKey) -> Self {
		Self {
			path,
			kind,
			project,
			text: None,
			revision: 0,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn kind(&self) -> DocumentKind {
		self.kind
	}

	pub fn project(&self) -> &ProjectKey {
		&self.project
	}

	pub fn is_open(&self) -> bool {
		self.text.is_some()
	}

	pub fn text(&self) -> Option<&Rope> {
		self.text.as_ref()
	}

	pub fn revision(&self) -> u64 {
		self.revision
	}
}

/// Documents affected by a project update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
	/// Still tracked, with a configuration that may have changed.
	pub affected: Vec<PathBuf>,
	/// No longer tracked at all.
	pub untracked: Vec<PathBuf>,
}

/// Owner of every project and tracked document.
#[derive(Debug)]
pub struct ProjectGraph {
	projects: HashMap<ProjectKey, Project>,
	documents: HashMap<PathBuf, TrackedDocument>,
}

impl Default for ProjectGraph {
	fn default() -> Self {
		let mut projects = HashMap::new();
		projects.insert(ProjectKey::Miscellaneous, Project::new(ProjectKey::Miscellaneous));
		Self {
			projects,
			documents: HashMap::new(),
		}
	}
}

impl ProjectGraph {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn document(&self, path: &Path) -> Option<&TrackedDocument> {
		self.documents.get(path)
	}

	pub fn documents(&self) -> impl Iterator<Item = &TrackedDocument> {
		self.documents.values()
	}

	pub fn project(&self, key: &ProjectKey) -> Option<&Project> {
		self.projects.get(key)
	}

	pub fn projects(&self) -> impl Iterator<Item = &Project> {
		self.projects.values()
	}

	/// Project owning the document at `path`.
	pub fn project_of(&self, path: &Path) -> Option<&Project> {
		self.documents
			.get(path)
			.and_then(|document| self.projects.get(&document.project))
	}

	/// Whether anything still needs projections for `path`: it is open or listed by a project.
	pub fn is_live(&self, path: &Path) -> bool {
		self.documents.contains_key(path)
	}

	/// Records the host opening `path` with `text`.
	pub fn open(&mut self, path: &Path, text: &str) -> &TrackedDocument {
		let document = self.documents.entry(path.to_path_buf()).or_insert_with(|| {
			TrackedDocument::new(path.to_path_buf(), DocumentKind::from_path(path), ProjectKey::Miscellaneous)
		});
		if document.project == ProjectKey::Miscellaneous
			&& let Some(misc) = self.projects.get_mut(&ProjectKey::Miscellaneous)
		{
			misc.documents.insert(path.to_path_buf());
		}
		document.text = Some(Rope::from_str(text));
		document.revision += 1;
		document
	}

	/// Applies host edits to an open document, in order.
	///
	/// Ranged edits are interpreted against the text left by the previous edit; ranges reaching
	/// past the last line clamp to the end of the text.
	pub fn apply_changes(
		&mut self,
		path: &Path,
		changes: &[TextDocumentContentChangeEvent],
		encoding: OffsetEncoding,
	) -> Result<&TrackedDocument> {
		let Some(document) = self.documents.get_mut(path) else {
			return Err(SyncError::UnknownDocument(path.to_path_buf()));
		};
		let Some(rope) = document.text.as_mut() else {
			return Err(SyncError::UnknownDocument(path.to_path_buf()));
		};

		for change in changes {
			let Some(range) = change.range else {
				*rope = Rope::from_str(&change.text);
				continue;
			};
			let len = rope.len_bytes();
			let start = lsp_position_to_byte(rope, range.start, encoding).unwrap_or(len);
			let end = lsp_position_to_byte(rope, range.end, encoding).unwrap_or(len);
			let (start, end) = (start.min(end), start.max(end));
			let start_char = rope.byte_to_char(start);
			let end_char = rope.byte_to_char(end);
			rope.remove(start_char..end_char);
			rope.insert(start_char, &change.text);
		}

		document.revision += 1;
		Ok(&*document)
	}

	/// Records the host closing `path`. Returns whether the document is still tracked.
	pub fn close(&mut self, path: &Path) -> bool {
		let Some(document) = self.documents.get_mut(path) else {
			return false;
		};
		document.text = None;
		document.revision += 1;
		if document.project != ProjectKey::Miscellaneous {
			return true;
		}
		self.documents.remove(path);
		if let Some(misc) = self.projects.get_mut(&ProjectKey::Miscellaneous) {
			misc.documents.remove(path);
		}
		false
	}

	/// Creates an empty project for `project_file`. Returns `false` if it already existed.
	pub fn add_project(&mut self, project_file: &Path) -> bool {
		let key = ProjectKey::file(project_file);
		if self.projects.contains_key(&key) {
			return false;
		}
		self.projects.insert(key.clone(), Project::new(key));
		true
	}

	pub fn contains_project(&self, project_file: &Path) -> bool {
		self.projects.contains_key(&ProjectKey::file(project_file))
	}

	/// Removes a project. Its open documents move to the miscellaneous project.
	pub fn remove_project(&mut self, project_file: &Path) -> ProjectUpdate {
		let Some(project) = self.projects.remove(&ProjectKey::file(project_file)) else {
			return ProjectUpdate::default();
		};
		let mut update = ProjectUpdate::default();
		for path in project.documents {
			self.release(path, &mut update);
		}
		update
	}

	/// Applies a project snapshot; `None` resets the project to an empty default configuration.
	///
	/// Listed documents move into the project, creating closed entries for documents the host
	/// has not opened. Documents the project no longer lists are released.
	pub fn update_project(&mut self, project_file: &Path, snapshot: Option<&ProjectSnapshot>) -> ProjectUpdate {
		let key = ProjectKey::file(project_file);
		let project = self
			.projects
			.entry(key.clone())
			.or_insert_with(|| Project::new(key.clone()));

		let listed: BTreeMap<PathBuf, DocumentKind> = snapshot
			.map(|snapshot| snapshot.resolved_documents().collect())
			.unwrap_or_default();
		project.configuration = snapshot.map(|s| s.configuration.clone()).unwrap_or_default();
		project.root_namespace = snapshot.and_then(|s| s.root_namespace.clone());
		let previous = std::mem::take(&mut project.documents);

		let mut update = ProjectUpdate::default();
		for path in previous {
			if !listed.contains_key(&path) {
				self.release(path, &mut update);
			}
		}
		for (path, kind) in listed {
			self.claim(&key, path.clone(), kind);
			update.affected.push(path);
		}
		update
	}

	/// Moves `path` into the project `key`, tracking it if needed.
	fn claim(&mut self, key: &ProjectKey, path: PathBuf, kind: DocumentKind) {
		let document = self
			.documents
			.entry(path.clone())
			.or_insert_with(|| TrackedDocument::new(path.clone(), kind, key.clone()));
		document.kind = kind;
		if document.project != *key {
			let previous = std::mem::replace(&mut document.project, key.clone());
			if let Some(owner) = self.projects.get_mut(&previous) {
				owner.documents.remove(&path);
			}
		}
		if let Some(project) = self.projects.get_mut(key) {
			project.documents.insert(path);
		}
	}

	/// Detaches `path` from its project: open documents fall back to the miscellaneous project,
	/// closed ones stop being tracked.
	fn release(&mut self, path: PathBuf, update: &mut ProjectUpdate) {
		let Some(document) = self.documents.get_mut(&path) else {
			return;
		};
		if document.is_open() {
			document.project = ProjectKey::Miscellaneous;
			if let Some(misc) = self.projects.get_mut(&ProjectKey::Miscellaneous) {
				misc.documents.insert(path.clone());
			}
			update.affected.push(path);
		} else {
			self.documents.remove(&path);
			update.untracked.push(path);
		}
	}
}
