use super::*;
use crate::compiler::CompileOutput;

fn compiled(source: &str, host: &str, markup: &str) -> CompiledDocument {
	CompileOutput {
		host_text: host.to_owned(),
		markup_text: markup.to_owned(),
		..CompileOutput::default()
	}
	.into_document(source)
}

fn drain(rx: &mut ProjectionEventReceiver) -> Vec<(ProjectionTarget, Option<DocumentVersion>)> {
	let mut events = Vec::new();
	while let Ok(event) = rx.try_recv() {
		if let ProjectionEvent::Changed { target, projection, .. } = event {
			events.push((target, projection.input_version()));
		}
	}
	events
}

#[test]
fn first_output_announces_both_targets() {
	let (tx, mut rx) = mpsc::unbounded_channel();
	let mut container = ProjectionContainer::new(PathBuf::from("/w/a.stencil"), tx);
	assert!(container.code_document().is_none());

	let sent = container.set_output(Some(1), &compiled("@x", "x;", "  "));
	assert_eq!(sent, 2);
	assert_eq!(
		drain(&mut rx),
		vec![(ProjectionTarget::Host, Some(1)), (ProjectionTarget::Markup, Some(1))]
	);
	assert_eq!(container.code_document().unwrap().source(), "@x");
}

#[test]
fn identical_recompute_is_silent() {
	let (tx, mut rx) = mpsc::unbounded_channel();
	let mut container = ProjectionContainer::new(PathBuf::from("/w/a.stencil"), tx);
	container.set_output(Some(1), &compiled("@x", "x;", "  "));
	drain(&mut rx);

	assert_eq!(container.set_output(Some(1), &compiled("@x", "x;", "  ")), 0);
	assert!(drain(&mut rx).is_empty());
}

#[test]
fn new_input_version_is_announced_but_output_versions_stick() {
	let (tx, mut rx) = mpsc::unbounded_channel();
	let mut container = ProjectionContainer::new(PathBuf::from("/w/a.stencil"), tx);
	container.set_output(Some(1), &compiled("@x", "x;", "  "));
	drain(&mut rx);

	// markup unchanged, host changed
	assert_eq!(container.set_output(Some(2), &compiled("@y", "y;", "  ")), 2);
	let host = container.projection(ProjectionTarget::Host).unwrap();
	let markup = container.projection(ProjectionTarget::Markup).unwrap();
	assert_eq!(host.input_version(), Some(2));
	assert_eq!(host.host_output_version(), Some(2));
	assert_eq!(markup.markup_output_version(), Some(1));
	assert_eq!(&**markup.text(), "  ");
}

#[test]
fn missing_publisher_is_tolerated() {
	let (tx, rx) = mpsc::unbounded_channel();
	drop(rx);
	let mut container = ProjectionContainer::new(PathBuf::from("/w/a.stencil"), tx);
	assert_eq!(container.set_output(None, &compiled("", "", "")), 2);
}
