//! Layered highlight merging for text views.
//!
//! Independent producers (syntax, selection, search matches, diagnostics)
//! each contribute a [`Layer`] of ordered, non-overlapping highlight runs.
//! [`CompoundHighlights`] stacks them and merges on query into one gap-free
//! partition whose cells carry the composed attributes of every layer
//! covering them. [`HighlightsReader`] regroups that partition into
//! same-font spans for line layout.
//!
//! # Snapshots
//!
//! Queries never observe a half-applied mutation. Every sequence and reader
//! is bound to the generation of the layer stack it was created from; after
//! any later mutation `move_next` returns `false` instead of yielding runs.
//!
//! ```
//! use strata_highlight::{CompoundHighlights, HighlightsSequence, Layer};
//! use strata_primitives::AttributeSet;
//!
//! let mut stack = CompoundHighlights::default();
//! let mut syntax = Layer::fixed("syntax");
//! syntax.add_highlight(0, 5, AttributeSet::from_pairs([("fg", "blue")])).unwrap();
//! stack.push_layer(syntax);
//!
//! let mut seq = stack.highlights(0, 8).unwrap();
//! assert!(seq.move_next());
//! assert_eq!((seq.start(), seq.end()), (0, 5));
//! assert!(seq.move_next());
//! assert!(seq.attributes().is_empty());
//! ```

mod compound;
/// Merge configuration.
pub mod config;
mod error;
/// Fixed and edit-tracked highlight layers.
pub mod layer;
/// Direct and mark-stream merge engines.
pub mod merge;
/// Same-font span grouping for layout.
pub mod reader;
/// The highlight sequence contract and change notification.
pub mod sequence;
/// Edit-following offset lists.
pub mod tracker;

pub use compound::CompoundHighlights;
pub use config::{HighlightsConfig, StrategyPreference};
pub use error::{HighlightError, Result};
pub use layer::{FixedLayer, Layer, LayerContent, LayerId, TrackedLayer};
pub use merge::{MergeEngine, MergeStrategy, MergedSequence};
pub use reader::{
	CompoundAttributes, CutAttributes, Font, FontStyle, HighlightItem, HighlightsList, HighlightsReader,
};
pub use sequence::{
	EmptySequence, GenerationCounter, HighlightRun, HighlightsChangeEvent, HighlightsSequence, ListenerId,
	RunsSequence, SnapshotGuard, SplitOffset, collect_runs,
};
pub use tracker::{OffsetGapList, Position, ZeroOffsetMode};
