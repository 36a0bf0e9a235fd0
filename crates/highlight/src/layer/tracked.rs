use strata_primitives::{AttributeSet, CharIdx, DocumentEdit, OffsetRange};

use crate::sequence::HighlightRun;
use crate::tracker::{OffsetGapList, Position, ZeroOffsetMode};

/// A boundary position: the attributes in effect at and after it, or `None`
/// for "no highlight from here on".
pub type Boundary = Position<Option<AttributeSet>>;

/// Highlights whose boundaries move with document edits.
///
/// Each boundary is a tracked [`Position`]. Boundary offsets are strictly
/// increasing, the first boundary always opens a run and the last one always
/// closes it, so the layer never holds dangling positions.
#[derive(Debug, Clone, Default)]
pub struct TrackedLayer {
	boundaries: OffsetGapList<Boundary>,
}

impl TrackedLayer {
	/// Creates an empty layer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an empty layer whose boundaries at offset zero stay anchored
	/// to the document start.
	pub fn with_zero_mode(mode: ZeroOffsetMode) -> Self {
		Self {
			boundaries: OffsetGapList::with_zero_mode(mode),
		}
	}

	/// Returns the zero-offset behaviour of the boundaries.
	pub fn zero_mode(&self) -> ZeroOffsetMode {
		self.boundaries.zero_mode()
	}

	/// Returns the number of tracked boundary positions.
	pub fn boundary_count(&self) -> usize {
		self.boundaries.len()
	}

	/// Returns true if the layer holds no runs.
	pub fn is_empty(&self) -> bool {
		self.boundaries.is_empty()
	}

	/// Returns the attributes in effect at `offset`.
	pub fn attributes_at(&self, offset: CharIdx) -> Option<&AttributeSet> {
		let idx = self.boundaries.find_offset_upper(offset);
		idx.checked_sub(1)
			.and_then(|i| self.boundaries.get(i))
			.and_then(|b| b.value.as_ref())
	}

	/// Returns the covered extent, from the first to the last boundary.
	pub fn extent(&self) -> Option<OffsetRange> {
		let start = self.boundaries.offset(0)?;
		let end = self.boundaries.offset(self.boundaries.len() - 1)?;
		Some(OffsetRange { start, end })
	}

	/// Replaces everything in `[start, end]` by one boundary at `start`
	/// carrying `value`, restoring the previous state at `end`.
	fn overwrite(&mut self, start: CharIdx, end: CharIdx, value: Option<AttributeSet>) {
		let after = self.attributes_at(end).cloned();
		let from = self.boundaries.find_offset_index(start);
		let to = self.boundaries.find_offset_upper(end);
		self.boundaries.remove_range(from..to);
		self.boundaries.insert(start, Position::new(value));
		self.boundaries.insert(end, Position::new(after));
		self.normalize();
	}

	/// Adds a run over `[start, end)`, overwriting what it covers.
	pub fn add_highlight(&mut self, start: CharIdx, end: CharIdx, attrs: AttributeSet) -> Option<OffsetRange> {
		if start >= end {
			return None;
		}
		self.overwrite(start, end, Some(attrs));
		Some(OffsetRange { start, end })
	}

	/// Removes highlights inside `[start, end)`.
	///
	/// With `clip`, partially covered runs keep their outside part; without
	/// it they are removed whole.
	pub fn remove_highlights(&mut self, start: CharIdx, end: CharIdx, clip: bool) -> Option<OffsetRange> {
		if start >= end {
			return None;
		}
		let inside = self.boundaries.find_offset_upper(start) < self.boundaries.find_offset_index(end);
		if !inside && self.attributes_at(start).is_none() {
			return None;
		}

		let (mut from, mut to) = (start, end);
		if !clip {
			let first = self.boundaries.find_offset_upper(start);
			if self.attributes_at(start).is_some()
				&& let Some(offset) = first.checked_sub(1).and_then(|i| self.boundaries.offset(i))
			{
				from = offset;
			}
			let last = self.boundaries.find_offset_index(end);
			if last > 0
				&& self.boundaries.get(last - 1).is_some_and(|b| b.value.is_some())
				&& let Some(offset) = self.boundaries.offset(last)
			{
				to = offset;
			}
		}

		self.overwrite(from, to, None);
		Some(OffsetRange { start: from, end: to })
	}

	/// Removes every run. Returns the previously covered extent.
	pub fn clear(&mut self) -> Option<OffsetRange> {
		let extent = self.extent();
		self.boundaries.clear();
		extent
	}

	/// Moves boundaries for a document edit.
	///
	/// Returns true if collapsed boundaries had to be pruned, i.e. some run
	/// vanished or lost its start.
	pub fn apply_edit(&mut self, edit: &DocumentEdit) -> bool {
		self.boundaries.apply_edit(edit);
		if edit.removed == 0 {
			return false;
		}
		let before = self.boundaries.len();
		self.normalize();
		self.boundaries.len() != before
	}

	/// Restores the boundary invariants after overwrites or collapsing edits:
	/// one boundary per offset (the last one wins), no leading or repeated
	/// `None` boundaries.
	fn normalize(&mut self) {
		let count = self.boundaries.len();
		let mut keep = vec![true; count];
		let mut open = false;
		for (i, slot) in keep.iter_mut().enumerate() {
			let offset = self.boundaries.offset(i);
			if i + 1 < count && self.boundaries.offset(i + 1) == offset {
				*slot = false;
				continue;
			}
			let opens = self.boundaries.get(i).is_some_and(|b| b.value.is_some());
			if !opens && !open {
				*slot = false;
				continue;
			}
			open = opens;
		}
		self.boundaries.retain(|i, _, _| keep[i]);
	}

	/// Returns the current runs in offset order.
	pub fn runs(&self) -> Vec<HighlightRun> {
		let mut runs = Vec::with_capacity(self.boundaries.len());
		let mut iter = self.boundaries.iter().peekable();
		while let Some((start, boundary)) = iter.next() {
			let (Some(attrs), Some(&(end, _))) = (&boundary.value, iter.peek()) else {
				continue;
			};
			if start < end {
				runs.push(HighlightRun::new(start, end, attrs.clone()));
			}
		}
		runs
	}
}
