//! Regrouping merged highlights into same-font runs for line layout.
//!
//! Layout measures text one font at a time, while merged highlights change
//! on every color or decoration boundary. [`HighlightsReader`] reads a merged
//! sequence lazily and hands out the longest spans that share one font. A
//! span built from several highlight cells comes back as
//! [`CompoundAttributes`], which still exposes the individual cells.

mod font;

use std::collections::VecDeque;

pub use font::{Font, FontStyle};
use strata_primitives::{AttributeSet, CharIdx, keys};

use crate::error::{HighlightError, Result};
use crate::sequence::{HighlightsSequence, SnapshotGuard};


/// One cell of a [`HighlightsList`]: attributes up to `end_offset`.
///
/// The cell starts where the previous one ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightItem {
	/// End of the cell (exclusive).
	pub end_offset: CharIdx,
	/// Attributes over the cell.
	pub attrs: AttributeSet,
}

impl HighlightItem {
	/// Creates an item.
	pub fn new(end_offset: CharIdx, attrs: AttributeSet) -> Self {
		Self { end_offset, attrs }
	}

	fn prepends_text(&self) -> bool {
		self.attrs.contains_key(keys::VIRTUAL_TEXT_PREPEND)
	}
}

/// Contiguous cells starting at `start_offset`, consumed from the front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightsList {
	start_offset: CharIdx,
	items: VecDeque<HighlightItem>,
}

impl HighlightsList {
	/// Creates an empty list positioned at `start_offset`.
	pub fn new(start_offset: CharIdx) -> Self {
		Self {
			start_offset,
			items: VecDeque::new(),
		}
	}

	/// Start of the first unconsumed cell.
	pub fn start_offset(&self) -> CharIdx {
		self.start_offset
	}

	/// End of the last cell read so far.
	pub fn end_offset(&self) -> CharIdx {
		self.items.back().map_or(self.start_offset, |item| item.end_offset)
	}

	/// Number of buffered cells.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Returns true if nothing is buffered.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Buffered cells in offset order.
	pub fn items(&self) -> impl Iterator<Item = &HighlightItem> {
		self.items.iter()
	}

	fn push(&mut self, end_offset: CharIdx, attrs: AttributeSet) {
		if end_offset > self.end_offset() {
			self.items.push_back(HighlightItem::new(end_offset, attrs));
		}
	}

	/// Drops everything before `offset`.
	fn cut(&mut self, offset: CharIdx) {
		while self.items.front().is_some_and(|item| item.end_offset <= offset) {
			self.items.pop_front();
		}
		self.start_offset = offset;
	}
}

/// Several highlight cells rendered with one font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundAttributes {
	start_offset: CharIdx,
	items: Vec<HighlightItem>,
}

impl CompoundAttributes {
	/// Start of the span.
	pub fn start_offset(&self) -> CharIdx {
		self.start_offset
	}

	/// End of the span.
	pub fn end_offset(&self) -> CharIdx {
		self.items.last().map_or(self.start_offset, |item| item.end_offset)
	}

	/// The cells of the span, in order.
	pub fn items(&self) -> &[HighlightItem] {
		&self.items
	}

	/// Returns the attributes of the cell covering `offset`.
	pub fn attributes_at(&self, offset: CharIdx) -> Option<&AttributeSet> {
		if offset < self.start_offset {
			return None;
		}
		let idx = self.items.partition_point(|item| item.end_offset <= offset);
		self.items.get(idx).map(|item| &item.attrs)
	}
}

/// Result of [`HighlightsReader::cut_same_font`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CutAttributes {
	/// The span is a single highlight cell (or part of one).
	Single(AttributeSet),
	/// The span joins several cells sharing a font.
	Compound(CompoundAttributes),
}

impl CutAttributes {
	/// Returns the attributes in effect at `offset` within the span.
	///
	/// A single cell covers the whole span, so any offset answers.
	pub fn attributes_at(&self, offset: CharIdx) -> Option<&AttributeSet> {
		match self {
			Self::Single(attrs) => Some(attrs),
			Self::Compound(compound) => compound.attributes_at(offset),
		}
	}
}

/// Lazily groups a merged sequence into same-font spans.
///
/// The reader only pulls as many cells from the sequence as one span needs.
/// If the sequence ends before the requested offset (exhausted or
/// invalidated), the rest is treated as unhighlighted.
#[derive(Debug)]
pub struct HighlightsReader<S> {
	seq: S,
	list: HighlightsList,
	seq_done: bool,
	guard: Option<SnapshotGuard>,
}

impl<S: HighlightsSequence> HighlightsReader<S> {
	/// Creates a reader over `seq`, whose first cell starts at `start_offset`.
	pub fn new(seq: S, start_offset: CharIdx) -> Self {
		Self {
			seq,
			list: HighlightsList::new(start_offset),
			seq_done: false,
			guard: None,
		}
	}

	/// Ties staleness reporting to `guard`.
	pub fn with_guard(mut self, guard: SnapshotGuard) -> Self {
		self.guard = Some(guard);
		self
	}

	/// Start of the next span.
	pub fn start_offset(&self) -> CharIdx {
		self.list.start_offset()
	}

	/// The cells read ahead but not yet consumed.
	pub fn list(&self) -> &HighlightsList {
		&self.list
	}

	/// Returns true if the highlights changed since the reader was created.
	///
	/// Spans handed out after that point are padded, not real highlights.
	pub fn is_stale(&self) -> bool {
		self.guard.as_ref().is_some_and(|g| !g.is_current())
	}

	/// Reads until the list reaches `need`; pads up to `pad_to` if the
	/// sequence runs dry first.
	fn fill(&mut self, need: CharIdx, pad_to: CharIdx) {
		while self.list.end_offset() < need && !self.seq_done {
			if !self.seq.move_next() {
				self.seq_done = true;
				break;
			}
			let (start, end) = (self.seq.start(), self.seq.end());
			let list_end = self.list.end_offset();
			if end <= list_end {
				continue;
			}
			if start > list_end {
				self.list.push(start, AttributeSet::empty());
			}
			self.list.push(end, self.seq.attributes().clone());
		}

		let list_end = self.list.end_offset();
		if list_end < need {
			tracing::trace!(from = list_end, to = pad_to, stale = self.is_stale(), "highlights ended early");
			if let Some(last) = self.list.items.back_mut().filter(|last| last.attrs.is_empty()) {
				last.end_offset = pad_to;
			} else {
				self.list.push(pad_to, AttributeSet::empty());
			}
		}
	}

	/// Cuts the next span that renders with one font.
	///
	/// `font` is the default font that cell attributes are applied to. The
	/// span starts at [`start_offset`](Self::start_offset) and ends at the
	/// earliest of `limit_offset`, `query_end`, `hint` (if past the start),
	/// the first font change and the first cell carrying prepended virtual
	/// text. A cell with prepended virtual text is always returned alone.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::InvalidRange`] if the span would end at or
	/// before its start.
	pub fn cut_same_font(
		&mut self,
		font: &Font,
		limit_offset: CharIdx,
		query_end: CharIdx,
		hint: Option<CharIdx>,
	) -> Result<CutAttributes> {
		let start = self.list.start_offset();
		let mut end = limit_offset.min(query_end);
		if let Some(hint) = hint.filter(|&hint| hint > start) {
			end = end.min(hint);
		}
		if end <= start {
			return Err(HighlightError::InvalidRange { start, end });
		}

		self.fill(start + 1, end);
		let Some(first) = self.list.items.front().cloned() else {
			return Err(HighlightError::InvalidRange { start, end });
		};
		if first.prepends_text() || first.end_offset >= end {
			self.list.cut(first.end_offset.min(end));
			return Ok(CutAttributes::Single(first.attrs));
		}

		let first_font = font.derive(&first.attrs);
		let mut count = 1;
		let mut cut = first.end_offset;
		while cut < end {
			self.fill(cut + 1, end);
			let Some(item) = self.list.items.get(count) else {
				break;
			};
			if item.prepends_text() || font.derive(&item.attrs) != first_font {
				break;
			}
			cut = item.end_offset.min(end);
			count += 1;
		}

		if count == 1 {
			self.list.cut(cut);
			return Ok(CutAttributes::Single(first.attrs));
		}

		let mut items: Vec<HighlightItem> = self.list.items.iter().take(count).cloned().collect();
		if let Some(last) = items.last_mut() {
			last.end_offset = cut;
		}
		self.list.cut(cut);
		Ok(CutAttributes::Compound(CompoundAttributes {
			start_offset: start,
			items,
		}))
	}
}
