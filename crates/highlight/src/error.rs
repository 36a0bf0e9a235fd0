//! Error types for highlight queries and layer management.

use strata_primitives::{CharIdx, RangeError};
use thiserror::Error;

use crate::layer::LayerId;

/// Errors that can occur when querying or mutating highlight layers.
///
/// Stale iteration is deliberately absent: an invalidated sequence simply
/// stops yielding runs.
#[derive(Debug, Error)]
pub enum HighlightError {
	/// A query or mutation range with `end < start`.
	#[error("invalid range: start {start} > end {end}")]
	InvalidRange {
		/// Requested start offset.
		start: CharIdx,
		/// Requested end offset.
		end: CharIdx,
	},

	/// Runs handed to a layer overlap or are out of order.
	#[error("malformed layer {layer:?}: {reason}")]
	MalformedLayer {
		/// Name of the offending layer.
		layer: String,
		/// What was wrong with the input.
		reason: String,
	},

	/// No layer with this id is registered.
	#[error("unknown layer: {0:?}")]
	UnknownLayer(LayerId),

	/// Insertion index past the end of the layer list.
	#[error("layer index {index} out of bounds for {len} layers")]
	IndexOutOfBounds {
		/// Requested index.
		index: usize,
		/// Current number of layers.
		len: usize,
	},

	/// Configuration could not be parsed.
	#[error("config parse error: {0}")]
	Config(#[from] toml::de::Error),
}

impl From<RangeError> for HighlightError {
	fn from(err: RangeError) -> Self {
		match err {
			RangeError::Inverted { start, end } => Self::InvalidRange { start, end },
		}
	}
}

/// Result type for highlight operations.
pub type Result<T> = std::result::Result<T, HighlightError>;

/// Validates a `[start, end)` query range.
pub(crate) fn check_range(start: CharIdx, end: CharIdx) -> Result<()> {
	if end < start {
		return Err(HighlightError::InvalidRange { start, end });
	}
	Ok(())
}
