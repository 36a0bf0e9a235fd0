//! Offset position tracking across document edits.
//!
//! [`OffsetGapList`] keeps a sorted list of offset-bearing entries correct
//! while the document is edited. Entries store a *raw* offset: offsets below
//! the gap start are stored as-is, offsets at or above it are stored with the
//! gap length added. An edit then only has to move the gap to the edit point
//! and resize it; entries far away from the edit keep their raw value.
//!
//! # Update rules
//!
//! - Insert at `s` of `n`: entries with offset `>= s` move by `+n`.
//! - Remove at `s` of `n`: entries in `(s, s + n]` collapse onto `s`, entries
//!   past `s + n` move by `-n`. Nothing ever goes below `s`.
//! - [`ZeroOffsetMode::Fixed`]: an entry at exactly offset 0 stays at 0 when
//!   text is inserted at offset 0. Once it has a nonzero offset it follows the
//!   default rule.

use strata_primitives::{CharIdx, CharLen, DocumentEdit};


/// Raw storage offset. Wider than [`CharIdx`] so that every offset up to
/// `CharIdx::MAX` stays representable above the gap.
pub type RawOffset = u128;

/// Gap length used on construction and after renormalization.
const INITIAL_GAP_LEN: RawOffset = 1 << 64;

/// Upper bound for the gap length before raw offsets are renormalized.
const MAX_GAP_LEN: RawOffset = 1 << 120;

/// An entry whose offset is maintained by an [`OffsetGapList`].
///
/// The raw offset is owned by the list; implementors only store it.
pub trait OffsetEntry {
	/// Returns the stored raw offset.
	fn raw_offset(&self) -> RawOffset;

	/// Replaces the stored raw offset.
	fn set_raw_offset(&mut self, raw: RawOffset);
}

/// How entries at offset zero react to an insertion at offset zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroOffsetMode {
	/// Entries at zero move like every other entry.
	#[default]
	Default,
	/// Entries at zero stay anchored to the document start.
	Fixed,
}

/// A tracked offset carrying a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position<T> {
	raw: RawOffset,
	/// Data attached to the position.
	pub value: T,
}

impl<T> Position<T> {
	/// Creates a detached position; the list assigns its offset on insertion.
	pub fn new(value: T) -> Self {
		Self { raw: 0, value }
	}
}

impl<T> OffsetEntry for Position<T> {
	fn raw_offset(&self) -> RawOffset {
		self.raw
	}

	fn set_raw_offset(&mut self, raw: RawOffset) {
		self.raw = raw;
	}
}

/// A sorted list of entries whose offsets follow document edits.
#[derive(Debug, Clone)]
pub struct OffsetGapList<E> {
	entries: Vec<E>,
	/// First offset stored above the gap.
	gap_start: CharIdx,
	gap_len: RawOffset,
	zero_mode: ZeroOffsetMode,
}

impl<E: OffsetEntry> Default for OffsetGapList<E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E: OffsetEntry> OffsetGapList<E> {
	/// Creates an empty list using [`ZeroOffsetMode::Default`].
	pub fn new() -> Self {
		Self::with_zero_mode(ZeroOffsetMode::Default)
	}

	/// Creates an empty list with the given zero-offset behaviour.
	pub fn with_zero_mode(zero_mode: ZeroOffsetMode) -> Self {
		Self {
			entries: Vec::new(),
			gap_start: CharIdx::MAX,
			gap_len: INITIAL_GAP_LEN,
			zero_mode,
		}
	}

	/// Returns the zero-offset behaviour.
	pub fn zero_mode(&self) -> ZeroOffsetMode {
		self.zero_mode
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if the list has no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	#[inline]
	fn raw_for(&self, offset: CharIdx) -> RawOffset {
		raw_for(offset, self.gap_start, self.gap_len)
	}

	#[inline]
	fn offset_for(&self, raw: RawOffset) -> CharIdx {
		offset_for(raw, self.gap_start, self.gap_len)
	}

	/// Returns the current offset of an entry stored in this list.
	pub fn entry_offset(&self, entry: &E) -> CharIdx {
		self.offset_for(entry.raw_offset())
	}

	/// Returns the offset of the entry at `index`.
	pub fn offset(&self, index: usize) -> Option<CharIdx> {
		self.entries.get(index).map(|e| self.entry_offset(e))
	}

	/// Returns the entry at `index`.
	pub fn get(&self, index: usize) -> Option<&E> {
		self.entries.get(index)
	}

	/// Returns the entry at `index` for payload mutation.
	///
	/// The raw offset must not be touched through this reference.
	pub fn get_mut(&mut self, index: usize) -> Option<&mut E> {
		self.entries.get_mut(index)
	}

	/// Iterates `(offset, entry)` pairs in offset order.
	pub fn iter(&self) -> impl Iterator<Item = (CharIdx, &E)> + '_ {
		self.entries.iter().map(|e| (self.entry_offset(e), e))
	}

	/// Returns the index of the first entry with offset `>= offset`.
	pub fn find_offset_index(&self, offset: CharIdx) -> usize {
		let raw = self.raw_for(offset);
		self.entries.partition_point(|e| e.raw_offset() < raw)
	}

	/// Returns the index just past the last entry with offset `<= offset`.
	pub fn find_offset_upper(&self, offset: CharIdx) -> usize {
		let raw = self.raw_for(offset);
		self.entries.partition_point(|e| e.raw_offset() <= raw)
	}

	/// Inserts `entry` at `offset`, after any entries already at that offset.
	///
	/// Returns the index the entry landed at.
	pub fn insert(&mut self, offset: CharIdx, mut entry: E) -> usize {
		entry.set_raw_offset(self.raw_for(offset));
		let index = self.find_offset_upper(offset);
		self.entries.insert(index, entry);
		index
	}

	/// Removes and returns the entry at `index`.
	pub fn remove(&mut self, index: usize) -> E {
		self.entries.remove(index)
	}

	/// Removes the entries in `range` (by index).
	pub fn remove_range(&mut self, range: std::ops::Range<usize>) {
		self.entries.drain(range);
	}

	/// Keeps only the entries for which `keep(index, offset, entry)` holds.
	pub fn retain(&mut self, mut keep: impl FnMut(usize, CharIdx, &E) -> bool) {
		let (gap_start, gap_len) = (self.gap_start, self.gap_len);
		let mut index = 0;
		self.entries.retain(|e| {
			let offset = offset_for(e.raw_offset(), gap_start, gap_len);
			let kept = keep(index, offset, e);
			index += 1;
			kept
		});
	}

	/// Removes every entry.
	pub fn clear(&mut self) {
		self.entries.clear();
		self.gap_start = CharIdx::MAX;
		self.gap_len = INITIAL_GAP_LEN;
	}

	/// Moves the gap so that it starts at `offset`.
	fn move_gap(&mut self, offset: CharIdx) {
		if offset == self.gap_start {
			return;
		}
		let gap_len = self.gap_len;
		if offset < self.gap_start {
			// Entries in [offset, gap_start) move above the gap.
			let from = self.entries.partition_point(|e| e.raw_offset() < offset as RawOffset);
			let to = self.entries.partition_point(|e| e.raw_offset() < self.gap_start as RawOffset);
			for e in &mut self.entries[from..to] {
				let raw = e.raw_offset();
				e.set_raw_offset(raw + gap_len);
			}
		} else {
			// Entries in [gap_start, offset) move below the gap.
			let above = self.gap_start as RawOffset + gap_len;
			let limit = offset as RawOffset + gap_len;
			let from = self.entries.partition_point(|e| e.raw_offset() < above);
			let to = self.entries.partition_point(|e| e.raw_offset() < limit);
			for e in &mut self.entries[from..to] {
				let raw = e.raw_offset();
				e.set_raw_offset(raw - gap_len);
			}
		}
		self.gap_start = offset;
	}

	/// Rewrites every raw offset against a fresh gap.
	fn renormalize(&mut self) {
		let offsets: Vec<CharIdx> = self.entries.iter().map(|e| self.entry_offset(e)).collect();
		self.gap_start = CharIdx::MAX;
		self.gap_len = INITIAL_GAP_LEN;
		for (e, offset) in self.entries.iter_mut().zip(offsets) {
			e.set_raw_offset(raw_for(offset, self.gap_start, self.gap_len));
		}
		tracing::trace!(entries = self.entries.len(), "offset gap renormalized");
	}

	/// Updates offsets for `len` characters inserted at `start`.
	pub fn insert_update(&mut self, start: CharIdx, len: CharLen) {
		if len == 0 {
			return;
		}
		let len_raw = len as RawOffset;
		if self.gap_len <= len_raw {
			self.renormalize();
		}

		let pinned = if start == 0 && self.zero_mode == ZeroOffsetMode::Fixed {
			self.find_offset_upper(0)
		} else {
			0
		};

		self.move_gap(start);
		self.gap_start = start.saturating_add(len);
		self.gap_len -= len_raw;

		// Entries anchored at zero sit below the moved gap again.
		for e in &mut self.entries[..pinned] {
			e.set_raw_offset(0);
		}
	}

	/// Updates offsets for `len` characters removed at `start`.
	pub fn remove_update(&mut self, start: CharIdx, len: CharLen) {
		if len == 0 {
			return;
		}
		let len_raw = len as RawOffset;
		if self.gap_len + len_raw > MAX_GAP_LEN {
			self.renormalize();
		}

		let end = start.saturating_add(len);
		self.move_gap(end);

		// Entries in [start, end) are stored below the gap; they all collapse
		// onto `start`, which becomes the new gap start.
		let from = self.entries.partition_point(|e| e.raw_offset() < start as RawOffset);
		let to = self.entries.partition_point(|e| e.raw_offset() < end as RawOffset);
		let new_gap_len = self.gap_len + len_raw;
		for e in &mut self.entries[from..to] {
			e.set_raw_offset(start as RawOffset + new_gap_len);
		}

		self.gap_start = start;
		self.gap_len = new_gap_len;
	}

	/// Applies one document edit: removal first, then insertion.
	pub fn apply_edit(&mut self, edit: &DocumentEdit) {
		self.remove_update(edit.start, edit.removed);
		self.insert_update(edit.start, edit.inserted);
	}
}

#[inline]
fn raw_for(offset: CharIdx, gap_start: CharIdx, gap_len: RawOffset) -> RawOffset {
	if offset < gap_start {
		offset as RawOffset
	} else {
		offset as RawOffset + gap_len
	}
}

#[inline]
fn offset_for(raw: RawOffset, gap_start: CharIdx, gap_len: RawOffset) -> CharIdx {
	if raw < gap_start as RawOffset {
		raw as CharIdx
	} else {
		// Offsets pushed past the end of the index space stay at its end.
		CharIdx::try_from(raw - gap_len).unwrap_or(CharIdx::MAX)
	}
}
