//! Document edit notifications and single-position mapping.

use crate::range::{CharIdx, CharLen};

/// Bias determines how positions at an insertion point are mapped.
///
/// When mapping a position through an insertion, bias determines whether the
/// position moves with the inserted text or stays before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bias {
	/// Position stays before insertions at the same location.
	Left,
	/// Position moves after insertions at the same location.
	#[default]
	Right,
}

/// One edit notification delivered by the hosting document.
///
/// The removal is applied first, then `inserted` characters are inserted at
/// `start`. A pure insert has `removed == 0`; a pure removal has
/// `inserted == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentEdit {
	/// Offset at which the edit happens.
	pub start: CharIdx,
	/// Number of characters removed at `start`.
	pub removed: CharLen,
	/// Number of characters inserted at `start` after the removal.
	pub inserted: CharLen,
}

impl DocumentEdit {
	/// Creates an insertion of `len` characters at `start`.
	pub fn insert(start: CharIdx, len: CharLen) -> Self {
		Self {
			start,
			removed: 0,
			inserted: len,
		}
	}

	/// Creates a removal of `len` characters at `start`.
	pub fn remove(start: CharIdx, len: CharLen) -> Self {
		Self {
			start,
			removed: len,
			inserted: 0,
		}
	}

	/// Creates a replacement of `removed` characters by `inserted` new ones.
	pub fn replace(start: CharIdx, removed: CharLen, inserted: CharLen) -> Self {
		Self {
			start,
			removed,
			inserted,
		}
	}

	/// Returns true if the edit changes nothing.
	pub fn is_noop(&self) -> bool {
		self.removed == 0 && self.inserted == 0
	}

	/// Returns the end of the removed region in pre-edit coordinates,
	/// saturating at the end of the index space.
	pub fn removed_end(&self) -> CharIdx {
		self.start.saturating_add(self.removed)
	}

	/// Returns the end of the inserted region in post-edit coordinates,
	/// saturating at the end of the index space.
	pub fn inserted_end(&self) -> CharIdx {
		self.start.saturating_add(self.inserted)
	}

	/// Maps a pre-edit position to its post-edit offset.
	///
	/// Positions inside the removed region collapse onto `start`. A position
	/// exactly at `start` follows `bias` when text is inserted there.
	pub fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		if pos < self.start {
			return pos;
		}

		let after_remove = if pos - self.start >= self.removed {
			pos - self.removed
		} else {
			self.start
		};

		if after_remove == self.start && bias == Bias::Left {
			after_remove
		} else {
			after_remove.saturating_add(self.inserted)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_map_pos_before_edit_unchanged() {
		let edit = DocumentEdit::replace(10, 5, 3);
		assert_eq!(edit.map_pos(9, Bias::Right), 9);
		assert_eq!(edit.map_pos(0, Bias::Left), 0);
	}

	#[test]
	fn test_map_pos_insert_bias() {
		let edit = DocumentEdit::insert(10, 4);
		assert_eq!(edit.map_pos(10, Bias::Right), 14);
		assert_eq!(edit.map_pos(10, Bias::Left), 10);
		assert_eq!(edit.map_pos(11, Bias::Left), 15);
	}

	#[test]
	fn test_map_pos_remove_clamps() {
		let edit = DocumentEdit::remove(10, 5);
		assert_eq!(edit.map_pos(12, Bias::Right), 10);
		assert_eq!(edit.map_pos(15, Bias::Right), 10);
		assert_eq!(edit.map_pos(20, Bias::Right), 15);
	}

	#[test]
	fn test_map_pos_replace() {
		let edit = DocumentEdit::replace(10, 5, 2);
		// Collapsed into the start, then moved past the insertion.
		assert_eq!(edit.map_pos(12, Bias::Right), 12);
		assert_eq!(edit.map_pos(12, Bias::Left), 10);
		assert_eq!(edit.map_pos(30, Bias::Right), 27);
	}

	#[test]
	fn test_ends_saturate() {
		let edit = DocumentEdit::replace(CharIdx::MAX - 2, 10, 10);
		assert_eq!(edit.removed_end(), CharIdx::MAX);
		assert_eq!(edit.inserted_end(), CharIdx::MAX);
		assert_eq!(edit.map_pos(CharIdx::MAX, Bias::Right), CharIdx::MAX);
		assert_eq!(edit.map_pos(CharIdx::MAX, Bias::Left), CharIdx::MAX - 2);
		assert_eq!(DocumentEdit::insert(5, 4).map_pos(CharIdx::MAX, Bias::Right), CharIdx::MAX);
	}

	#[test]
	fn test_noop() {
		assert!(DocumentEdit::insert(3, 0).is_noop());
		assert!(!DocumentEdit::remove(3, 1).is_noop());
	}
}
