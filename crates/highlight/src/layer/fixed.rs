use strata_primitives::{AttributeSet, OffsetRange};

use crate::sequence::{HighlightRun, SplitOffset, check_ordering};

/// Highlights stored at raw offsets that never move under document edits.
///
/// Runs are kept sorted and non-overlapping. Adding a run overwrites whatever
/// it covers: overlapped runs are trimmed or split around it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedLayer {
	runs: Vec<HighlightRun>,
}

impl FixedLayer {
	/// Creates an empty layer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a layer from already ordered runs; empty runs are dropped.
	///
	/// Returns a description of the problem if runs overlap or descend.
	pub fn from_runs(runs: Vec<HighlightRun>) -> Result<Self, String> {
		let runs: Vec<HighlightRun> = runs.into_iter().filter(|r| !r.is_empty()).collect();
		check_ordering(&runs)?;
		Ok(Self { runs })
	}

	/// Returns the stored runs in offset order.
	pub fn runs(&self) -> &[HighlightRun] {
		&self.runs
	}

	/// Returns true if the layer holds no runs.
	pub fn is_empty(&self) -> bool {
		self.runs.is_empty()
	}

	/// Returns the covered extent, from the first run start to the last run end.
	pub fn extent(&self) -> Option<OffsetRange> {
		let first = self.runs.first()?;
		let last = self.runs.last()?;
		Some(OffsetRange {
			start: first.start(),
			end: last.end(),
		})
	}

	/// Indices of the runs overlapping `[start, end)`.
	fn overlapping(&self, start: SplitOffset, end: SplitOffset) -> std::ops::Range<usize> {
		let from = self.runs.partition_point(|r| r.end <= start);
		let to = self.runs.partition_point(|r| r.start < end);
		from..to.max(from)
	}

	/// Adds `run`, overwriting the covered part of existing runs.
	///
	/// Returns the changed range, or `None` for an empty run.
	pub fn add_highlight(&mut self, run: HighlightRun) -> Option<OffsetRange> {
		if run.is_empty() {
			return None;
		}

		let range = self.overlapping(run.start, run.end);
		let mut replacement = Vec::with_capacity(3);
		if let Some(first) = self.runs.get(range.start).filter(|_| !range.is_empty())
			&& first.start < run.start
		{
			replacement.push(HighlightRun::split(first.start, run.start, first.attrs.clone()));
		}
		let changed = OffsetRange {
			start: run.start(),
			end: run.end(),
		};
		let tail = self
			.runs
			.get(range.end.wrapping_sub(1))
			.filter(|_| !range.is_empty())
			.filter(|last| last.end > run.end)
			.map(|last| HighlightRun::split(run.end, last.end, last.attrs.clone()));
		replacement.push(run);
		replacement.extend(tail);

		self.runs.splice(range, replacement);
		Some(changed)
	}

	/// Removes highlights inside `[start, end)`.
	///
	/// With `clip`, partially covered runs are trimmed to the outside part;
	/// without it they are removed whole. Returns the changed range, if any.
	pub fn remove_highlights(&mut self, start: SplitOffset, end: SplitOffset, clip: bool) -> Option<OffsetRange> {
		if start >= end {
			return None;
		}
		let range = self.overlapping(start, end);
		if range.is_empty() {
			return None;
		}

		let first = &self.runs[range.start];
		let last = &self.runs[range.end - 1];
		if !clip {
			let changed = OffsetRange {
				start: first.start(),
				end: last.end(),
			};
			self.runs.drain(range);
			return Some(changed);
		}

		let mut keep = Vec::with_capacity(2);
		if first.start < start {
			keep.push(HighlightRun::split(first.start, start, first.attrs.clone()));
		}
		if last.end > end {
			keep.push(HighlightRun::split(end, last.end, last.attrs.clone()));
		}
		let changed = OffsetRange {
			start: first.start().max(start.offset),
			end: last.end().min(end.offset).max(start.offset),
		};
		self.runs.splice(range, keep);
		Some(changed)
	}

	/// Removes every run. Returns the previously covered extent.
	pub fn clear(&mut self) -> Option<OffsetRange> {
		let extent = self.extent();
		self.runs.clear();
		extent
	}

	/// Returns the attributes covering `offset`, if any.
	pub fn attributes_at(&self, offset: SplitOffset) -> Option<&AttributeSet> {
		let idx = self.runs.partition_point(|r| r.end <= offset);
		self.runs
			.get(idx)
			.filter(|r| r.start <= offset)
			.map(|r| &r.attrs)
	}
}
