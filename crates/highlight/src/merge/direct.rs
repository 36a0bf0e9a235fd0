use smallvec::SmallVec;
use strata_primitives::{AttributeSet, CharIdx};

use super::RunSource;
use crate::sequence::{HighlightRun, HighlightsSequence, SnapshotGuard, SplitOffset};

/// One layer's position in the lock-step walk.
#[derive(Debug)]
struct Cursor<S> {
	source: RunSource<S>,
	/// Run the cell start is in or before; `None` once the layer is drained.
	run: Option<HighlightRun>,
}

impl<S: HighlightsSequence> Cursor<S> {
	/// The next boundary strictly after `pos`: the pending run's start, or its
	/// end once the run is active.
	fn next_boundary(&self, pos: SplitOffset) -> Option<SplitOffset> {
		let run = self.run.as_ref()?;
		Some(if run.start > pos { run.start } else { run.end })
	}

	fn active_at(&self, pos: SplitOffset) -> Option<&AttributeSet> {
		self.run.as_ref().filter(|r| r.start <= pos && pos < r.end).map(|r| &r.attrs)
	}

	fn advance_past(&mut self, pos: SplitOffset) {
		while self.run.as_ref().is_some_and(|r| r.end <= pos) {
			self.run = self.source.next_run();
		}
	}
}

/// Merges layers by walking all of their boundaries in lock-step.
///
/// Each emitted cell spans from one boundary to the nearest next boundary of
/// any layer, and carries the fold of the runs covering it in layer order.
/// With split offsets on, boundary shifts survive into the output and
/// order boundaries at the same character offset.
#[derive(Debug)]
pub struct DirectMergeSequence<S> {
	cursors: Vec<Cursor<S>>,
	query_end: SplitOffset,
	/// Start of the next cell to emit.
	pos: SplitOffset,
	primed: bool,
	done: bool,
	current: Option<HighlightRun>,
	guard: Option<SnapshotGuard>,
	empty: AttributeSet,
}

impl<S: HighlightsSequence> DirectMergeSequence<S> {
	/// Creates a merge over `layers`, ordered bottom-to-top, clipped to
	/// `[start, end)`.
	pub fn new(layers: Vec<S>, start: CharIdx, end: CharIdx, split_offsets: bool) -> Self {
		let cursors = layers
			.into_iter()
			.enumerate()
			.map(|(index, seq)| Cursor {
				source: RunSource::new(seq, index, split_offsets, start, end),
				run: None,
			})
			.collect();
		Self {
			cursors,
			query_end: SplitOffset::new(end.max(start)),
			pos: SplitOffset::new(start),
			primed: false,
			done: false,
			current: None,
			guard: None,
			empty: AttributeSet::empty(),
		}
	}

	/// Stops the sequence once `guard` goes stale.
	pub fn with_guard(mut self, guard: SnapshotGuard) -> Self {
		self.guard = Some(guard);
		self
	}

	fn finish(&mut self) -> bool {
		self.done = true;
		self.current = None;
		false
	}

	fn prime(&mut self) -> bool {
		self.primed = true;
		for cursor in &mut self.cursors {
			cursor.run = cursor.source.next_run();
		}
		self.cursors.iter().any(|c| c.run.is_some())
	}
}

impl<S: HighlightsSequence> HighlightsSequence for DirectMergeSequence<S> {
	fn move_next(&mut self) -> bool {
		if self.done || self.guard.as_ref().is_some_and(|g| !g.is_current()) {
			return self.finish();
		}
		if !self.primed && !self.prime() {
			return self.finish();
		}
		if self.pos >= self.query_end {
			return self.finish();
		}

		let pos = self.pos;
		let next = self
			.cursors
			.iter()
			.filter_map(|c| c.next_boundary(pos))
			.min()
			.unwrap_or(self.query_end)
			.min(self.query_end);

		let attrs = {
			let active: SmallVec<[&AttributeSet; 4]> =
				self.cursors.iter().filter_map(|c| c.active_at(pos)).collect();
			match active.as_slice() {
				[] => AttributeSet::empty(),
				[only] => (*only).clone(),
				many => AttributeSet::compose_all(many.iter().copied()),
			}
		};

		self.current = Some(HighlightRun::split(pos, next, attrs));
		self.pos = next;
		for cursor in &mut self.cursors {
			cursor.advance_past(next);
		}
		true
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
