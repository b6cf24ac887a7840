/// Execution classes used for scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// The ordered actor that owns document and projection state.
	Foreground,
	/// Async work that may be delayed or coalesced (timers, routines).
	Background,
	/// CPU-heavy or blocking work executed on the blocking pool.
	Blocking,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Foreground => "foreground",
			Self::Background => "background",
			Self::Blocking => "blocking",
		}
	}
}
