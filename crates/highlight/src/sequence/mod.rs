//! The highlight sequence contract shared by layers, merge engines and the
//! font-run reader.
//!
//! A [`HighlightsSequence`] is a lazy, forward-only cursor over
//! `(start, end, attributes)` runs. Sequences are snapshot-bound: once the
//! source they were created from mutates, `move_next` returns `false` for
//! good instead of yielding runs from a torn state.

mod events;
mod generation;

use std::cmp::Ordering;
use std::sync::Arc;

pub use events::{ChangeListeners, HighlightsChangeEvent, ListenerId};
pub use generation::{GenerationCounter, SnapshotGuard};
use strata_primitives::{AttributeSet, CharIdx};

/// A character offset refined by a sub-character shift.
///
/// Shifts address positions inside one wide character, such as the columns
/// of a tab or a visually collapsed region. Ordering is by offset, then shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SplitOffset {
	/// Character offset.
	pub offset: CharIdx,
	/// Sub-character shift at `offset`.
	pub shift: u32,
}

impl SplitOffset {
	/// Creates an unshifted offset.
	pub const fn new(offset: CharIdx) -> Self {
		Self { offset, shift: 0 }
	}

	/// Creates a shifted offset.
	pub const fn shifted(offset: CharIdx, shift: u32) -> Self {
		Self { offset, shift }
	}

	/// Drops the shift.
	#[inline]
	pub const fn unshifted(self) -> Self {
		Self::new(self.offset)
	}
}

impl From<CharIdx> for SplitOffset {
	fn from(offset: CharIdx) -> Self {
		Self::new(offset)
	}
}

/// A `[start, end)` range tagged with attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HighlightRun {
	/// Start boundary (inclusive).
	pub start: SplitOffset,
	/// End boundary (exclusive).
	pub end: SplitOffset,
	/// Attributes applied over the run.
	pub attrs: AttributeSet,
}

impl HighlightRun {
	/// Creates a run over plain character offsets.
	pub fn new(start: CharIdx, end: CharIdx, attrs: AttributeSet) -> Self {
		Self {
			start: SplitOffset::new(start),
			end: SplitOffset::new(end),
			attrs,
		}
	}

	/// Creates a run whose boundaries carry sub-character shifts.
	pub fn split(start: SplitOffset, end: SplitOffset, attrs: AttributeSet) -> Self {
		Self { start, end, attrs }
	}

	/// Start character offset.
	#[inline]
	pub fn start(&self) -> CharIdx {
		self.start.offset
	}

	/// End character offset.
	#[inline]
	pub fn end(&self) -> CharIdx {
		self.end.offset
	}

	/// Returns true if the run covers nothing.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.start >= self.end
	}

	/// Returns the run with both shifts dropped.
	pub fn unshifted(&self) -> Self {
		Self {
			start: self.start.unshifted(),
			end: self.end.unshifted(),
			attrs: self.attrs.clone(),
		}
	}

	/// Clips the run to `[start, end)`; `None` if nothing remains.
	pub fn clip(&self, start: SplitOffset, end: SplitOffset) -> Option<Self> {
		let clipped = Self {
			start: self.start.max(start),
			end: self.end.min(end),
			attrs: self.attrs.clone(),
		};
		(!clipped.is_empty()).then_some(clipped)
	}
}

/// A forward-only cursor over highlight runs.
///
/// `start`, `end` and `attributes` are only meaningful after `move_next`
/// returned `true`.
pub trait HighlightsSequence {
	/// Advances to the next run. Returns false when exhausted or invalidated.
	fn move_next(&mut self) -> bool;

	/// Start offset of the current run.
	fn start(&self) -> CharIdx;

	/// End offset of the current run.
	fn end(&self) -> CharIdx;

	/// Attributes of the current run.
	fn attributes(&self) -> &AttributeSet;

	/// Sub-character shift at the current run's start.
	fn start_shift(&self) -> u32 {
		0
	}

	/// Sub-character shift at the current run's end.
	fn end_shift(&self) -> u32 {
		0
	}

	/// Returns the current run as an owned value.
	fn current_run(&self) -> HighlightRun {
		HighlightRun::split(
			SplitOffset::shifted(self.start(), self.start_shift()),
			SplitOffset::shifted(self.end(), self.end_shift()),
			self.attributes().clone(),
		)
	}
}

impl<S: HighlightsSequence + ?Sized> HighlightsSequence for Box<S> {
	fn move_next(&mut self) -> bool {
		(**self).move_next()
	}

	fn start(&self) -> CharIdx {
		(**self).start()
	}

	fn end(&self) -> CharIdx {
		(**self).end()
	}

	fn attributes(&self) -> &AttributeSet {
		(**self).attributes()
	}

	fn start_shift(&self) -> u32 {
		(**self).start_shift()
	}

	fn end_shift(&self) -> u32 {
		(**self).end_shift()
	}
}

/// Drains a sequence into a vector of runs.
pub fn collect_runs<S: HighlightsSequence + ?Sized>(seq: &mut S) -> Vec<HighlightRun> {
	let mut runs = Vec::new();
	while seq.move_next() {
		runs.push(seq.current_run());
	}
	runs
}

/// A sequence that never yields a run.
#[derive(Debug, Clone, Default)]
pub struct EmptySequence {
	attrs: AttributeSet,
}

impl EmptySequence {
	/// Creates an exhausted sequence.
	pub fn new() -> Self {
		Self::default()
	}
}

impl HighlightsSequence for EmptySequence {
	fn move_next(&mut self) -> bool {
		false
	}

	fn start(&self) -> CharIdx {
		0
	}

	fn end(&self) -> CharIdx {
		0
	}

	fn attributes(&self) -> &AttributeSet {
		&self.attrs
	}
}

/// Sequence over a shared, sorted run slice, clipped to a query range.
#[derive(Debug, Clone)]
pub struct RunsSequence {
	runs: Arc<[HighlightRun]>,
	next: usize,
	query_start: SplitOffset,
	query_end: SplitOffset,
	current: Option<HighlightRun>,
	guard: Option<SnapshotGuard>,
	empty: AttributeSet,
}

impl RunsSequence {
	/// Creates a sequence over the runs intersecting `[start, end)`.
	///
	/// `runs` must be sorted and non-overlapping.
	pub fn new(runs: Arc<[HighlightRun]>, start: CharIdx, end: CharIdx) -> Self {
		let query_start = SplitOffset::new(start);
		let query_end = SplitOffset::new(end.max(start));
		let next = runs.partition_point(|r| r.end <= query_start);
		Self {
			runs,
			next,
			query_start,
			query_end,
			current: None,
			guard: None,
			empty: AttributeSet::empty(),
		}
	}

	/// Ties the sequence to a snapshot; it stops once the guard goes stale.
	pub fn with_guard(mut self, guard: SnapshotGuard) -> Self {
		self.guard = Some(guard);
		self
	}

	fn is_stale(&self) -> bool {
		self.guard.as_ref().is_some_and(|g| !g.is_current())
	}
}

impl HighlightsSequence for RunsSequence {
	fn move_next(&mut self) -> bool {
		if self.is_stale() {
			self.current = None;
			self.next = self.runs.len();
			return false;
		}

		while let Some(run) = self.runs.get(self.next) {
			self.next += 1;
			if run.start >= self.query_end {
				break;
			}
			if let Some(clipped) = run.clip(self.query_start, self.query_end) {
				self.current = Some(clipped);
				return true;
			}
		}

		self.next = self.runs.len();
		self.current = None;
		false
	}

	fn start(&self) -> CharIdx {
		self.current.as_ref().map_or(0, HighlightRun::start)
	}

	fn end(&self) -> CharIdx {
		self.current.as_ref().map_or(0, HighlightRun::end)
	}

	fn attributes(&self) -> &AttributeSet {
		self.current.as_ref().map_or(&self.empty, |r| &r.attrs)
	}

	fn start_shift(&self) -> u32 {
		self.current.as_ref().map_or(0, |r| r.start.shift)
	}

	fn end_shift(&self) -> u32 {
		self.current.as_ref().map_or(0, |r| r.end.shift)
	}
}

/// Checks that runs are sorted and pairwise non-overlapping.
pub(crate) fn check_ordering(runs: &[HighlightRun]) -> Result<(), String> {
	for pair in runs.windows(2) {
		let (prev, next) = (&pair[0], &pair[1]);
		match next.start.cmp(&prev.end) {
			Ordering::Less if next.start < prev.start => {
				return Err(format!(
					"run at {} starts before preceding run at {}",
					next.start(),
					prev.start()
				));
			}
			Ordering::Less => {
				return Err(format!(
					"run at {} overlaps preceding run ending at {}",
					next.start(),
					prev.end()
				));
			}
			_ => {}
		}
	}
	for run in runs {
		if run.end < run.start {
			return Err(format!("run ends at {} before its start {}", run.end(), run.start()));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests;
