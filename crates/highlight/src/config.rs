//! Merge configuration.
//!
//! Configuration is plain TOML with kebab-case keys; every field has a
//! default, so an empty document is valid:
//!
//! ```toml
//! strategy = "auto"          # "auto" | "direct" | "mark-stream"
//! split-offsets = false
//! mark-stream-layer-limit = 4
//! ```

use serde::Deserialize;

use crate::error::Result;

/// Which merge engine the compound manager should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyPreference {
	/// Pick per layer-set composition.
	#[default]
	Auto,
	/// Always use the direct boundary merge.
	Direct,
	/// Always use the mark-stream merge.
	MarkStream,
}

/// Options controlling how layers are merged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct HighlightsConfig {
	/// Engine selection policy.
	pub strategy: StrategyPreference,
	/// Keep sub-character shifts at boundaries instead of collapsing them.
	pub split_offsets: bool,
	/// Largest layer count for which `Auto` picks the mark-stream merge.
	pub mark_stream_layer_limit: usize,
}

impl Default for HighlightsConfig {
	fn default() -> Self {
		Self {
			strategy: StrategyPreference::Auto,
			split_offsets: false,
			mark_stream_layer_limit: 4,
		}
	}
}

impl HighlightsConfig {
	/// Parses a configuration from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self> {
		Ok(toml::from_str(text)?)
	}
}
