use lsp_types::{DiagnosticSeverity, Position, Range};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use super::*;
use crate::projection::{ProjectionEvent, ProjectionEventReceiver};
use crate::test_support::{FakeCompiler, RecordingDiagnosticsSink};

const PAGE: &str = "/w/page.stencil";

fn state() -> (EngineState, ProjectionEventReceiver, Arc<RecordingDiagnosticsSink>) {
	let (tx, rx) = mpsc::unbounded_channel();
	let sink = Arc::new(RecordingDiagnosticsSink::new());
	(EngineState::new(tx, sink.clone(), OffsetEncoding::Utf16), rx, sink)
}

fn compile_pending(state: &mut EngineState) -> Vec<CompileResult> {
	let compiler = FakeCompiler::new();
	state
		.drain_pending()
		.into_iter()
		.map(|item| item.compile(&compiler).unwrap())
		.collect()
}

fn range(start: (u32, u32), end: (u32, u32)) -> Range {
	Range::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
}

fn diagnostic(range: Range, severity: DiagnosticSeverity, message: &str) -> Diagnostic {
	Diagnostic {
		range,
		severity: Some(severity),
		message: message.to_owned(),
		..Diagnostic::default()
	}
}

#[test]
fn result_for_an_outdated_version_is_discarded() {
	let (mut state, mut rx, _) = state();
	let path = Path::new(PAGE);
	state.open(path, "<p>@{a}</p>", 5);
	let [result]: [CompileResult; 1] = compile_pending(&mut state).try_into().unwrap();
	assert_eq!(result.version, Some(5));

	state.versions.set(path, 7);
	assert_eq!(state.apply_result(result), ApplyOutcome::Stale);
	assert!(!state.store.contains(path));
	assert!(rx.try_recv().is_err());

	state.pending.insert(path.to_path_buf());
	let [result]: [CompileResult; 1] = compile_pending(&mut state).try_into().unwrap();
	assert_eq!(state.apply_result(result), ApplyOutcome::Applied);
	let projection = state.store.get(path).unwrap().projection(ProjectionTarget::Host).unwrap();
	assert_eq!(projection.input_version(), Some(7));
	assert_eq!(&**projection.text(), "a");
}

#[test]
fn result_for_an_outdated_revision_is_discarded() {
	let (mut state, _, _) = state();
	let path = Path::new(PAGE);
	state.open(path, "<p>@{a}</p>", 1);
	let [result]: [CompileResult; 1] = compile_pending(&mut state).try_into().unwrap();

	// same version, newer text
	state.change(path, &[], 1).unwrap();
	assert_eq!(state.apply_result(result), ApplyOutcome::Stale);
}

#[test]
fn changes_to_unknown_documents_are_rejected() {
	let (mut state, _, _) = state();
	let result = state.change(Path::new(PAGE), &[], 1);
	assert!(matches!(result, Err(crate::SyncError::UnknownDocument(_))));
	assert!(state.pending.is_empty());
}

#[test]
fn template_diagnostics_are_published_with_the_compile() {
	let (mut state, _, sink) = state();
	let path = Path::new(PAGE);
	state.open(path, "<p>@{a", 1);
	for result in compile_pending(&mut state) {
		state.apply_result(result);
	}

	let published = sink.latest(path).unwrap();
	assert_eq!(published.len(), 1);
	assert_eq!(published[0].range, range((0, 3), (0, 6)));
	assert_eq!(published[0].source.as_deref(), Some(stencil_mapping::TEMPLATE_DIAGNOSTIC_SOURCE));
	assert_eq!(sink.updates()[0].version, Some(1));
}

#[test]
fn host_diagnostics_are_mapped_onto_the_template() {
	let (mut state, _, sink) = state();
	let path = Path::new(PAGE);
	state.open(path, "<p>@{a}</p>", 1);
	for result in compile_pending(&mut state) {
		state.apply_result(result);
	}

	let host = vec![diagnostic(range((0, 0), (0, 1)), DiagnosticSeverity::ERROR, "unknown name")];
	assert_eq!(state.set_host_diagnostics(path, Some(0), host.clone()), ApplyOutcome::Stale);
	assert_eq!(state.set_host_diagnostics(path, Some(1), host), ApplyOutcome::Applied);

	let published = sink.latest(path).unwrap();
	assert_eq!(
		published,
		vec![diagnostic(range((0, 5), (0, 6)), DiagnosticSeverity::ERROR, "unknown name")]
	);
}

#[test]
fn markup_diagnostics_inside_code_are_dropped() {
	let (mut state, _, sink) = state();
	let path = Path::new(PAGE);
	state.open(path, "<p>@{a}</p>", 1);
	for result in compile_pending(&mut state) {
		state.apply_result(result);
	}

	let markup = vec![
		diagnostic(range((0, 0), (0, 3)), DiagnosticSeverity::WARNING, "unknown element"),
		diagnostic(range((0, 5), (0, 6)), DiagnosticSeverity::WARNING, "stray text"),
	];
	assert_eq!(state.set_markup_diagnostics(path, Some(1), markup), ApplyOutcome::Applied);
	let published = sink.latest(path).unwrap();
	assert_eq!(published.len(), 1);
	assert_eq!(published[0].message, "unknown element");
}

#[test]
fn diagnostics_before_the_first_compile_are_stale() {
	let (mut state, _, _) = state();
	let path = Path::new(PAGE);
	state.open(path, "<p></p>", 1);
	assert_eq!(state.set_host_diagnostics(path, Some(1), Vec::new()), ApplyOutcome::Stale);
}

#[test]
fn closing_a_loose_document_clears_it_and_sweeps_its_projections() {
	let (mut state, mut rx, sink) = state();
	let path = Path::new(PAGE);
	state.open(path, "<p>@{a}</p>", 1);
	for result in compile_pending(&mut state) {
		state.apply_result(result);
	}
	while rx.try_recv().is_ok() {}

	assert!(!state.close(path));
	assert_eq!(state.versions.get(path), None);
	assert_eq!(sink.latest(path), Some(Vec::new()));

	assert_eq!(state.sweep(), vec![PathBuf::from(PAGE)]);
	assert!(matches!(rx.try_recv(), Ok(ProjectionEvent::Removed { path: removed }) if removed == Path::new(PAGE)));
}

#[test]
fn unopened_project_documents_are_compiled_from_disk() {
	let dir = tempfile::tempdir().unwrap();
	let page = dir.path().join("page.stencil");
	std::fs::write(&page, "<b>@{disk}</b>").unwrap();
	let project = dir.path().join("site.proj");
	let snapshot: ProjectSnapshot = serde_json::from_value(serde_json::json!({
		"projectFilePath": project,
		"configuration": { "languageVersion": "2.0" },
		"documents": [{ "filePath": "page.stencil" }, { "filePath": "missing.stencil" }],
	}))
	.unwrap();

	let (mut state, _, _) = state();
	let update = state.graph.update_project(&project, Some(&snapshot));
	state.apply_project_update(update);

	let compiler = FakeCompiler::new();
	let items = state.drain_pending();
	assert_eq!(items.len(), 2);
	assert!(items.iter().all(|item| item.text.is_none() && item.version.is_none()));
	assert_eq!(items[0].configuration.language_version.as_deref(), Some("2.0"));

	let mut results = items.into_iter().map(|item| item.compile(&compiler));
	let result = results.find_map(|result| result.ok()).unwrap();
	assert_eq!(result.path, page);
	assert_eq!(state.apply_result(result), ApplyOutcome::Applied);
	let host = state.store.get(&page).unwrap().projection(ProjectionTarget::Host).unwrap();
	assert_eq!(&**host.text(), "disk");
	assert_eq!(host.input_version(), None);
}
