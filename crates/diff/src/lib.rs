//! Minimum edit distance diffing for projection synchronization.
//!
//! [`diff`] implements the linear-space variant of Myers' O(ND) algorithm over any pair of
//! sequences described by [`DiffSequences`]. The text layer runs it at character or line
//! granularity ([`Granularity`]) and collapses the raw insert/delete script into the fewest
//! contiguous [`TextChange`]s ([`collapse_to_minimal_ranges`]), which is what downstream buffer
//! consumers receive.
//!
//! All spans are UTF-8 byte offsets into the *old* text. Changes are sorted and never overlap, so
//! [`apply_changes`] can replay them in a single forward pass.

mod apply;
mod myers;
mod text;

pub use apply::{ApplyError, apply_changes};
pub use myers::{DiffEdit, DiffHunk, DiffSequences, diff, hunks};
pub use text::{
	DEFAULT_LINE_DIFF_THRESHOLD, Granularity, TextChange, TextDiffer, TextSpan, TextUnits, collapse_to_minimal_ranges,
	diff_units, text_changes,
};
