use std::cmp::Reverse;
use std::collections::BinaryHeap;

use strata_primitives::{AttributeSet, CharIdx};

use super::RunSource;
use crate::sequence::{HighlightRun, HighlightsSequence, SnapshotGuard, SplitOffset};

/// A transition point: from `offset` on, `attrs` are in effect (`None`: no
/// highlight).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
	/// Where the transition happens.
	pub offset: SplitOffset,
	/// Attributes at or after `offset`.
	pub attrs: Option<AttributeSet>,
}

/// Flattens one layer's runs into a stream of [`Mark`]s.
///
/// A run `[s, e)` becomes a mark at `s` carrying its attributes and a mark at
/// `e` carrying `None`, unless the next run starts exactly at `e`, in which
/// case the closing mark carries that run's attributes instead.
#[derive(Debug)]
pub struct MarkStream<S> {
	source: RunSource<S>,
	lookahead: Option<HighlightRun>,
	/// End of the last opened run whose closing mark is still due.
	open_until: Option<SplitOffset>,
	current: Option<Mark>,
	previous: Option<Mark>,
}

impl<S: HighlightsSequence> MarkStream<S> {
	/// Creates a stream over the runs of `seq` inside `[start, end)`.
	pub fn new(seq: S, start: CharIdx, end: CharIdx, split_offsets: bool) -> Self {
		Self::from_source(RunSource::new(seq, 0, split_offsets, start, end))
	}

	fn from_source(source: RunSource<S>) -> Self {
		Self {
			source,
			lookahead: None,
			open_until: None,
			current: None,
			previous: None,
		}
	}

	fn next_run(&mut self) -> Option<HighlightRun> {
		self.lookahead.take().or_else(|| self.source.next_run())
	}

	/// Advances to the next mark. Returns false once the layer is drained.
	pub fn move_next(&mut self) -> bool {
		let mark = match self.open_until.take() {
			Some(end) => match self.next_run() {
				Some(run) if run.start == end => {
					self.open_until = Some(run.end);
					Mark {
						offset: end,
						attrs: Some(run.attrs),
					}
				}
				other => {
					self.lookahead = other;
					Mark {
						offset: end,
						attrs: None,
					}
				}
			},
			None => match self.next_run() {
				Some(run) => {
					self.open_until = Some(run.end);
					Mark {
						offset: run.start,
						attrs: Some(run.attrs),
					}
				}
				None => {
					self.previous = self.current.take();
					return false;
				}
			},
		};
		self.previous = self.current.replace(mark);
		true
	}

	/// The mark the stream is positioned on.
	pub fn current(&self) -> Option<&Mark> {
		self.current.as_ref()
	}

	/// The mark before the current one: the state in effect just before
	/// [`current`](Self::current).
	pub fn previous(&self) -> Option<&Mark> {
		self.previous.as_ref()
	}
}

/// Merges layers by sweeping their mark streams in offset order.
///
/// All marks at one offset are applied together, then the active attribute
/// sets are folded in layer order. Every distinct mark offset inside the
/// query is a cell boundary.
#[derive(Debug)]
pub struct MarkStreamMergeSequence<S> {
	streams: Vec<MarkStream<S>>,
	/// Attribute state per layer, as of the last applied mark.
	active: Vec<Option<AttributeSet>>,
	heap: BinaryHeap<Reverse<(SplitOffset, usize)>>,
	query_end: SplitOffset,
	pos: SplitOffset,
	primed: bool,
	done: bool,
	current: Option<HighlightRun>,
	guard: Option<SnapshotGuard>,
	empty: AttributeSet,
}

impl<S: HighlightsSequence> MarkStreamMergeSequence<S> {
	/// Creates a merge over `layers`, ordered bottom-to-top, clipped to
	/// `[start, end)`.
	pub fn new(layers: Vec<S>, start: CharIdx, end: CharIdx, split_offsets: bool) -> Self {
		let streams: Vec<MarkStream<S>> = layers
			.into_iter()
			.enumerate()
			.map(|(index, seq)| MarkStream::from_source(RunSource::new(seq, index, split_offsets, start, end)))
			.collect();
		Self {
			active: vec![None; streams.len()],
			heap: BinaryHeap::with_capacity(streams.len()),
			streams,
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

	/// Returns true once every layer's mark stream is drained.
	///
	/// A sequence can finish its streams before reaching the query end; the
	/// remaining trailing cell is still emitted.
	pub fn is_finished(&self) -> bool {
		self.primed && self.heap.is_empty()
	}

	fn push(&mut self, layer: usize) {
		if self.streams[layer].move_next()
			&& let Some(mark) = self.streams[layer].current()
		{
			self.heap.push(Reverse((mark.offset, layer)));
		}
	}

	fn finish(&mut self) -> bool {
		self.done = true;
		self.current = None;
		false
	}
}

impl<S: HighlightsSequence> HighlightsSequence for MarkStreamMergeSequence<S> {
	fn move_next(&mut self) -> bool {
		if self.done || self.guard.as_ref().is_some_and(|g| !g.is_current()) {
			return self.finish();
		}
		if !self.primed {
			self.primed = true;
			for layer in 0..self.streams.len() {
				self.push(layer);
			}
			if self.heap.is_empty() {
				return self.finish();
			}
		}
		if self.pos >= self.query_end {
			return self.finish();
		}

		let pos = self.pos;
		while let Some(&Reverse((offset, layer))) = self.heap.peek() {
			if offset > pos {
				break;
			}
			self.heap.pop();
			self.active[layer] = self.streams[layer].current().and_then(|m| m.attrs.clone());
			self.push(layer);
		}

		let next = self
			.heap
			.peek()
			.map_or(self.query_end, |Reverse((offset, _))| *offset)
			.min(self.query_end);
		let attrs = AttributeSet::compose_all(self.active.iter().flatten());

		self.current = Some(HighlightRun::split(pos, next, attrs));
		self.pos = next;
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
