//! Highlight layers: one ordered producer of runs each.
//!
//! A [`Layer`] is either fixed-size (raw offsets that never move) or
//! tracked (boundaries are positions that follow document edits). Both
//! kinds hand out snapshot-bound [`RunsSequence`]s over a cached copy of
//! their runs, so a query never observes a half-applied mutation.

mod fixed;
mod tracked;

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

pub use fixed::FixedLayer;
use strata_primitives::{AttributeSet, CharIdx, DocumentEdit, OffsetRange};
pub use tracked::{Boundary, TrackedLayer};

use crate::error::{HighlightError, Result, check_range};
use crate::sequence::{GenerationCounter, HighlightRun, RunsSequence, SplitOffset, check_ordering};
use crate::tracker::ZeroOffsetMode;


/// Identity of a layer registered with a [`CompoundHighlights`](crate::CompoundHighlights).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) u64);

impl fmt::Display for LayerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "layer#{}", self.0)
	}
}

/// Storage behind a layer.
#[derive(Debug, Clone)]
pub enum LayerContent {
	/// Raw offsets; may carry sub-character shifts.
	Fixed(FixedLayer),
	/// Edit-tracked boundaries.
	Tracked(TrackedLayer),
}

impl LayerContent {
	fn runs(&self) -> Vec<HighlightRun> {
		match self {
			Self::Fixed(layer) => layer.runs().to_vec(),
			Self::Tracked(layer) => layer.runs(),
		}
	}
}

type ReleaseHook = Box<dyn FnOnce()>;

/// A named highlight producer.
pub struct Layer {
	name: String,
	content: LayerContent,
	generation: GenerationCounter,
	dirty: Option<OffsetRange>,
	snapshot: OnceCell<Arc<[HighlightRun]>>,
	release: Option<ReleaseHook>,
}

impl Layer {
	fn with_content(name: impl Into<String>, content: LayerContent) -> Self {
		Self {
			name: name.into(),
			content,
			generation: GenerationCounter::new(),
			dirty: None,
			snapshot: OnceCell::new(),
			release: None,
		}
	}

	/// Creates an empty fixed-size layer.
	pub fn fixed(name: impl Into<String>) -> Self {
		Self::with_content(name, LayerContent::Fixed(FixedLayer::new()))
	}

	/// Creates an empty tracked layer.
	pub fn tracked(name: impl Into<String>) -> Self {
		Self::tracked_with_zero_mode(name, ZeroOffsetMode::Default)
	}

	/// Creates an empty tracked layer with the given zero-offset behaviour.
	pub fn tracked_with_zero_mode(name: impl Into<String>, mode: ZeroOffsetMode) -> Self {
		Self::with_content(name, LayerContent::Tracked(TrackedLayer::with_zero_mode(mode)))
	}

	/// Creates a fixed-size layer from ordered, non-overlapping runs.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::MalformedLayer`] if runs overlap or descend.
	pub fn from_runs(name: impl Into<String>, runs: Vec<HighlightRun>) -> Result<Self> {
		let name = name.into();
		let fixed = FixedLayer::from_runs(runs).map_err(|reason| malformed(&name, reason))?;
		Ok(Self::with_content(name, LayerContent::Fixed(fixed)))
	}

	/// Creates a tracked layer from ordered, non-overlapping runs.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::MalformedLayer`] if runs overlap, descend or
	/// carry sub-character shifts.
	pub fn tracked_from_runs(name: impl Into<String>, runs: Vec<HighlightRun>) -> Result<Self> {
		let mut layer = Self::tracked(name);
		layer.set_highlights(runs)?;
		layer.dirty = None;
		Ok(layer)
	}

	/// Attaches a hook invoked once when the layer is released.
	pub fn with_release_hook(mut self, hook: impl FnOnce() + 'static) -> Self {
		self.release = Some(Box::new(hook));
		self
	}

	/// Returns the display name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the underlying storage.
	pub fn content(&self) -> &LayerContent {
		&self.content
	}

	/// Returns true for layers whose offsets never move under edits.
	pub fn is_fixed_size(&self) -> bool {
		matches!(self.content, LayerContent::Fixed(_))
	}

	/// Returns the content version, bumped by every mutation.
	pub fn version(&self) -> u64 {
		self.generation.current()
	}

	/// Returns the current runs as a shared snapshot.
	pub fn snapshot(&self) -> Arc<[HighlightRun]> {
		Arc::clone(self.snapshot.get_or_init(|| self.content.runs().into()))
	}

	/// Returns the runs intersecting `[start, end)`.
	///
	/// The sequence stops yielding once the layer is mutated.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::InvalidRange`] if `end < start`.
	pub fn highlights(&self, start: CharIdx, end: CharIdx) -> Result<RunsSequence> {
		check_range(start, end)?;
		Ok(RunsSequence::new(self.snapshot(), start, end).with_guard(self.generation.guard()))
	}

	/// Takes the range changed since the last call.
	pub fn take_dirty(&mut self) -> Option<OffsetRange> {
		self.dirty.take()
	}

	fn touched(&mut self, changed: Option<OffsetRange>) {
		let Some(changed) = changed else {
			return;
		};
		self.snapshot = OnceCell::new();
		self.generation.bump();
		self.dirty = Some(match self.dirty {
			Some(dirty) => dirty.union(&changed),
			None => changed,
		});
	}

	/// Adds a run over `[start, end)`, overwriting what it covers.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::InvalidRange`] if `end < start`.
	pub fn add_highlight(&mut self, start: CharIdx, end: CharIdx, attrs: AttributeSet) -> Result<()> {
		check_range(start, end)?;
		let changed = match &mut self.content {
			LayerContent::Fixed(layer) => layer.add_highlight(HighlightRun::new(start, end, attrs)),
			LayerContent::Tracked(layer) => layer.add_highlight(start, end, attrs),
		};
		self.touched(changed);
		Ok(())
	}

	/// Adds a run whose boundaries carry sub-character shifts.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::InvalidRange`] for an inverted run and
	/// [`HighlightError::MalformedLayer`] for a tracked layer with nonzero shifts.
	pub fn add_split_highlight(&mut self, run: HighlightRun) -> Result<()> {
		if run.end < run.start {
			return Err(HighlightError::InvalidRange {
				start: run.start(),
				end: run.end(),
			});
		}
		let changed = match &mut self.content {
			LayerContent::Fixed(layer) => layer.add_highlight(run),
			LayerContent::Tracked(_) if run.start.shift != 0 || run.end.shift != 0 => {
				return Err(malformed(&self.name, "tracked layers cannot carry shifts".into()));
			}
			LayerContent::Tracked(layer) => layer.add_highlight(run.start(), run.end(), run.attrs),
		};
		self.touched(changed);
		Ok(())
	}

	/// Removes highlights inside `[start, end)`; see [`FixedLayer::remove_highlights`].
	///
	/// # Errors
	///
	/// Returns [`HighlightError::InvalidRange`] if `end < start`.
	pub fn remove_highlights(&mut self, start: CharIdx, end: CharIdx, clip: bool) -> Result<()> {
		check_range(start, end)?;
		let changed = match &mut self.content {
			LayerContent::Fixed(layer) => layer.remove_highlights(SplitOffset::new(start), SplitOffset::new(end), clip),
			LayerContent::Tracked(layer) => layer.remove_highlights(start, end, clip),
		};
		self.touched(changed);
		Ok(())
	}

	/// Removes every run.
	pub fn clear(&mut self) {
		let changed = match &mut self.content {
			LayerContent::Fixed(layer) => layer.clear(),
			LayerContent::Tracked(layer) => layer.clear(),
		};
		self.touched(changed);
	}

	/// Replaces all runs of the layer, keeping its kind.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::MalformedLayer`] if runs overlap or descend
	/// (or carry shifts on a tracked layer). The layer is unchanged on error.
	pub fn set_highlights(&mut self, runs: Vec<HighlightRun>) -> Result<()> {
		let runs: Vec<HighlightRun> = runs.into_iter().filter(|r| !r.is_empty()).collect();
		check_ordering(&runs).map_err(|reason| malformed(&self.name, reason))?;

		let old = match &self.content {
			LayerContent::Fixed(layer) => layer.extent(),
			LayerContent::Tracked(layer) => layer.extent(),
		};
		let new = runs.first().zip(runs.last()).map(|(first, last)| OffsetRange {
			start: first.start(),
			end: last.end(),
		});

		match &mut self.content {
			LayerContent::Fixed(layer) => {
				*layer = FixedLayer::from_runs(runs).map_err(|reason| malformed(&self.name, reason))?;
			}
			LayerContent::Tracked(layer) => {
				if runs.iter().any(|r| r.start.shift != 0 || r.end.shift != 0) {
					return Err(malformed(&self.name, "tracked layers cannot carry shifts".into()));
				}
				let mut rebuilt = TrackedLayer::with_zero_mode(layer.zero_mode());
				for run in runs {
					rebuilt.add_highlight(run.start(), run.end(), run.attrs);
				}
				*layer = rebuilt;
			}
		}

		let changed = match (old, new) {
			(Some(old), Some(new)) => Some(old.union(&new)),
			(old, new) => old.or(new),
		};
		self.touched(changed);
		Ok(())
	}

	/// Moves tracked boundaries for a document edit.
	///
	/// Fixed layers ignore edits. Returns true if the layer's content moved.
	pub fn apply_edit(&mut self, edit: &DocumentEdit) -> bool {
		if edit.is_noop() {
			return false;
		}
		let LayerContent::Tracked(layer) = &mut self.content else {
			return false;
		};
		if layer.is_empty() {
			return false;
		}
		let pruned = layer.apply_edit(edit);
		if pruned {
			tracing::trace!(layer = %self.name, "collapsed boundaries pruned");
		}
		self.snapshot = OnceCell::new();
		self.generation.bump();
		true
	}

	/// Runs the release hook, if any. Later calls do nothing.
	pub fn release(&mut self) {
		if let Some(hook) = self.release.take() {
			tracing::trace!(layer = %self.name, "layer released");
			hook();
		}
	}
}

impl fmt::Debug for Layer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Layer")
			.field("name", &self.name)
			.field("content", &self.content)
			.field("version", &self.version())
			.field("dirty", &self.dirty)
			.field("has_release_hook", &self.release.is_some())
			.finish()
	}
}

fn malformed(name: &str, reason: String) -> HighlightError {
	tracing::debug!(layer = name, %reason, "rejected malformed runs");
	HighlightError::MalformedLayer {
		layer: name.to_owned(),
		reason,
	}
}
