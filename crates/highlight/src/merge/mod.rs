//! Merging layered highlight sequences into one partition.
//!
//! Two engines produce the same output by different means:
//!
//! - [`DirectMergeSequence`] walks every layer's run boundaries in lock-step
//!   and folds the runs covering each cell. It also supports split offsets.
//! - [`MarkStreamMergeSequence`] flattens each layer into boundary marks and
//!   sweeps them with a k-way heap merge.
//!
//! Both cover the whole query range once any layer intersects it: cells with
//! no contributing layer carry the empty [`AttributeSet`]. Attributes are
//! folded bottom-to-top, so later layers override earlier ones.

mod direct;
mod mark_stream;

use std::sync::Arc;

pub use direct::DirectMergeSequence;
pub use mark_stream::{Mark, MarkStream, MarkStreamMergeSequence};
use strata_primitives::{AttributeSet, CharIdx};

use crate::error::{Result, check_range};
use crate::sequence::{
	EmptySequence, HighlightRun, HighlightsSequence, RunsSequence, SnapshotGuard, SplitOffset,
};


/// Which engine merges a layer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeStrategy {
	/// Lock-step boundary walk.
	Direct,
	/// Boundary marks swept through a heap.
	MarkStream,
}

/// Pulls runs from one input sequence in the shape the engines expect.
///
/// Runs are clipped to the query, stripped of shifts unless split offsets
/// are on, and clamped so they never start before the previous run's end.
/// Empty remainders are skipped.
#[derive(Debug)]
pub(crate) struct RunSource<S> {
	seq: S,
	layer: usize,
	split: bool,
	query_end: SplitOffset,
	/// Highest run end seen so far, starting at the query start.
	last_end: SplitOffset,
	seen: bool,
	exhausted: bool,
}

impl<S: HighlightsSequence> RunSource<S> {
	pub(crate) fn new(seq: S, layer: usize, split: bool, start: CharIdx, end: CharIdx) -> Self {
		Self {
			seq,
			layer,
			split,
			query_end: SplitOffset::new(end.max(start)),
			last_end: SplitOffset::new(start),
			seen: false,
			exhausted: false,
		}
	}

	pub(crate) fn next_run(&mut self) -> Option<HighlightRun> {
		while !self.exhausted && self.seq.move_next() {
			let mut run = self.seq.current_run();
			if !self.split {
				run = run.unshifted();
			}
			if run.start >= self.query_end {
				break;
			}
			if self.seen && run.start < self.last_end {
				tracing::warn!(
					layer = self.layer,
					start = run.start(),
					previous_end = self.last_end.offset,
					"overlapping run clamped"
				);
			}
			let floor = self.last_end;
			self.seen = true;
			self.last_end = self.last_end.max(run.end);
			if let Some(clipped) = run.clip(floor, self.query_end) {
				return Some(clipped);
			}
		}
		self.exhausted = true;
		None
	}
}

/// An immutable snapshot of a layer set, ready to answer queries.
///
/// Layers are ordered bottom-to-top. Cloning is cheap; every clone shares
/// the run arrays and the snapshot guard.
#[derive(Debug, Clone)]
pub struct MergeEngine {
	layers: Arc<[Arc<[HighlightRun]>]>,
	strategy: MergeStrategy,
	split_offsets: bool,
	guard: Option<SnapshotGuard>,
}

impl MergeEngine {
	/// Builds an engine over per-layer run snapshots.
	pub fn new(layers: Vec<Arc<[HighlightRun]>>, strategy: MergeStrategy, split_offsets: bool) -> Self {
		Self {
			layers: layers.into(),
			strategy,
			split_offsets,
			guard: None,
		}
	}

	/// Ties every sequence from this engine to a snapshot guard.
	pub fn with_guard(mut self, guard: SnapshotGuard) -> Self {
		self.guard = Some(guard);
		self
	}

	/// Returns the engine's strategy.
	pub fn strategy(&self) -> MergeStrategy {
		self.strategy
	}

	/// Returns true if boundary shifts are preserved.
	pub fn split_offsets(&self) -> bool {
		self.split_offsets
	}

	/// Returns the number of merged layers.
	pub fn layer_count(&self) -> usize {
		self.layers.len()
	}

	/// Returns true if the snapshot guard, if any, is still current.
	pub fn is_current(&self) -> bool {
		self.guard.as_ref().is_none_or(SnapshotGuard::is_current)
	}

	/// Returns the merged highlights over `[start, end)`.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::InvalidRange`](crate::HighlightError::InvalidRange)
	/// if `end < start`.
	pub fn highlights(&self, start: CharIdx, end: CharIdx) -> Result<MergedSequence> {
		check_range(start, end)?;
		if self.layers.is_empty() || start == end {
			return Ok(MergedSequence::Empty(EmptySequence::new()));
		}

		let inputs = self
			.layers
			.iter()
			.map(|runs| RunsSequence::new(Arc::clone(runs), start, end))
			.collect();
		let seq = match self.strategy {
			MergeStrategy::Direct => {
				let mut seq = DirectMergeSequence::new(inputs, start, end, self.split_offsets);
				if let Some(guard) = &self.guard {
					seq = seq.with_guard(guard.clone());
				}
				MergedSequence::Direct(seq)
			}
			MergeStrategy::MarkStream => {
				let mut seq = MarkStreamMergeSequence::new(inputs, start, end, self.split_offsets);
				if let Some(guard) = &self.guard {
					seq = seq.with_guard(guard.clone());
				}
				MergedSequence::MarkStream(seq)
			}
		};
		Ok(seq)
	}
}

/// A merged sequence produced by a [`MergeEngine`].
#[derive(Debug)]
pub enum MergedSequence {
	/// Nothing to merge.
	Empty(EmptySequence),
	/// Produced by the lock-step engine.
	Direct(DirectMergeSequence<RunsSequence>),
	/// Produced by the mark-stream engine.
	MarkStream(MarkStreamMergeSequence<RunsSequence>),
}

impl HighlightsSequence for MergedSequence {
	fn move_next(&mut self) -> bool {
		match self {
			Self::Empty(seq) => seq.move_next(),
			Self::Direct(seq) => seq.move_next(),
			Self::MarkStream(seq) => seq.move_next(),
		}
	}

	fn start(&self) -> CharIdx {
		match self {
			Self::Empty(seq) => seq.start(),
			Self::Direct(seq) => seq.start(),
			Self::MarkStream(seq) => seq.start(),
		}
	}

	fn end(&self) -> CharIdx {
		match self {
			Self::Empty(seq) => seq.end(),
			Self::Direct(seq) => seq.end(),
			Self::MarkStream(seq) => seq.end(),
		}
	}

	fn attributes(&self) -> &AttributeSet {
		match self {
			Self::Empty(seq) => seq.attributes(),
			Self::Direct(seq) => seq.attributes(),
			Self::MarkStream(seq) => seq.attributes(),
		}
	}

	fn start_shift(&self) -> u32 {
		match self {
			Self::Empty(seq) => seq.start_shift(),
			Self::Direct(seq) => seq.start_shift(),
			Self::MarkStream(seq) => seq.start_shift(),
		}
	}

	fn end_shift(&self) -> u32 {
		match self {
			Self::Empty(seq) => seq.end_shift(),
			Self::Direct(seq) => seq.end_shift(),
			Self::MarkStream(seq) => seq.end_shift(),
		}
	}
}
