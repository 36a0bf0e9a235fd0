/// A position in the text, measured in characters (not bytes).
///
/// This is the canonical coordinate space for highlight runs and tracked
/// positions.
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
///
/// This is distinct from CharIdx to avoid accidentally passing an index
/// where a length is expected or vice versa.
pub type CharLen = usize;

/// Errors produced when constructing an [`OffsetRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
	/// The end offset lies before the start offset.
	#[error("inverted range: end {end} is before start {start}")]
	Inverted {
		/// Requested start offset.
		start: CharIdx,
		/// Requested end offset.
		end: CharIdx,
	},
}

/// A half-open `[start, end)` range of character offsets.
///
/// Unlike a selection range there is no direction: `start <= end` always
/// holds for values built through [`OffsetRange::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OffsetRange {
	/// First offset covered by the range.
	pub start: CharIdx,
	/// First offset past the range.
	pub end: CharIdx,
}

impl OffsetRange {
	/// The range used to signal "everything changed".
	pub const FULL: OffsetRange = OffsetRange {
		start: 0,
		end: CharIdx::MAX,
	};

	/// Creates a range, rejecting `end < start`.
	pub fn new(start: CharIdx, end: CharIdx) -> Result<Self, RangeError> {
		if end < start {
			return Err(RangeError::Inverted { start, end });
		}
		Ok(Self { start, end })
	}

	/// Creates a zero-width range at `pos`.
	pub fn point(pos: CharIdx) -> Self {
		Self { start: pos, end: pos }
	}

	/// Returns the number of characters covered.
	#[inline]
	pub fn len(&self) -> CharLen {
		self.end - self.start
	}

	/// Returns true if the range covers no characters.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}

	/// Returns true if `pos` lies inside the range (exclusive of `end`).
	pub fn contains(&self, pos: CharIdx) -> bool {
		pos >= self.start && pos < self.end
	}

	/// Returns true if the two ranges share at least one character.
	pub fn overlaps(&self, other: &OffsetRange) -> bool {
		self.start < other.end && other.start < self.end
	}

	/// Returns the common part of both ranges, if it is non-empty.
	pub fn intersect(&self, other: &OffsetRange) -> Option<OffsetRange> {
		let start = self.start.max(other.start);
		let end = self.end.min(other.end);
		(start < end).then_some(OffsetRange { start, end })
	}

	/// Returns the smallest range covering both ranges.
	pub fn union(&self, other: &OffsetRange) -> OffsetRange {
		OffsetRange {
			start: self.start.min(other.start),
			end: self.end.max(other.end),
		}
	}
}

impl From<std::ops::Range<CharIdx>> for OffsetRange {
	/// Converts a std range; inverted input collapses to an empty range at `start`.
	fn from(range: std::ops::Range<CharIdx>) -> Self {
		Self {
			start: range.start,
			end: range.end.max(range.start),
		}
	}
}
