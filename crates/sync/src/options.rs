use std::time::Duration;

use serde::{Deserialize, Serialize};
use stencil_diff::DEFAULT_LINE_DIFF_THRESHOLD;
use stencil_mapping::OffsetEncoding;

/// Default file name of project configuration artifacts.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "project.stencil.json";

/// Engine options, read from the client's initialization options.
///
/// Durations are milliseconds on the wire. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncOptions {
	/// File name of project configuration artifacts to watch for.
	pub config_file_name: String,
	/// Quiet period after an edit before projections are regenerated.
	pub publish_delay_ms: u64,
	/// Quiet period after a close or project change before unused projections are swept.
	pub sweep_delay_ms: u64,
	/// Quiet period before a changed project configuration is applied.
	pub config_apply_delay_ms: u64,
	/// Combined text size in bytes up to which projections are diffed per character.
	pub line_diff_threshold: usize,
	/// Encoding of the `character` field in positions exchanged with the client.
	pub position_encoding: OffsetEncoding,
}

impl Default for SyncOptions {
	fn default() -> Self {
		Self {
			config_file_name: DEFAULT_CONFIG_FILE_NAME.to_owned(),
			publish_delay_ms: 100,
			sweep_delay_ms: 1000,
			config_apply_delay_ms: 250,
			line_diff_threshold: DEFAULT_LINE_DIFF_THRESHOLD,
			position_encoding: OffsetEncoding::default(),
		}
	}
}

impl SyncOptions {
	/// Reads options from initialization options; `null` yields the defaults.
	pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
		if value.is_null() {
			return Ok(Self::default());
		}
		serde_json::from_value(value)
	}

	pub fn publish_delay(&self) -> Duration {
		Duration::from_millis(self.publish_delay_ms)
	}

	pub fn sweep_delay(&self) -> Duration {
		Duration::from_millis(self.sweep_delay_ms)
	}

	pub fn config_apply_delay(&self) -> Duration {
		Duration::from_millis(self.config_apply_delay_ms)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn missing_fields_take_defaults() {
		let options = SyncOptions::from_json(json!({ "publishDelayMs": 5 })).unwrap();
		assert_eq!(options.publish_delay(), Duration::from_millis(5));
		assert_eq!(options.config_file_name, DEFAULT_CONFIG_FILE_NAME);
		assert_eq!(options.config_apply_delay(), Duration::from_millis(250));
	}

	#[test]
	fn null_is_default() {
		assert_eq!(SyncOptions::from_json(serde_json::Value::Null).unwrap(), SyncOptions::default());
	}

	#[test]
	fn position_encoding_uses_lsp_names() {
		let options = SyncOptions::from_json(json!({ "positionEncoding": "utf-8" })).unwrap();
		assert_eq!(options.position_encoding, OffsetEncoding::Utf8);
		assert!(SyncOptions::from_json(json!({ "positionEncoding": "latin-1" })).is_err());
	}
}
