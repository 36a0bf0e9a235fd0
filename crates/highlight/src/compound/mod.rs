//! The compound layer manager.
//!
//! [`CompoundHighlights`] owns the ordered layer stack of one editing session.
//! It picks a merge strategy for the current composition, caches the merge
//! engine until the next mutation, and republishes layer changes as
//! coalesced [`HighlightsChangeEvent`]s.

use std::cell::OnceCell;

use strata_primitives::{CharIdx, DocumentEdit};

use crate::config::{HighlightsConfig, StrategyPreference};
use crate::error::{HighlightError, Result, check_range};
use crate::layer::{Layer, LayerId};
use crate::merge::{MergeEngine, MergeStrategy, MergedSequence};
use crate::reader::HighlightsReader;
use crate::sequence::{
	ChangeListeners, GenerationCounter, HighlightsChangeEvent, ListenerId, SnapshotGuard,
};

#[cfg(test)]
mod tests;

/// An ordered stack of highlight layers, merged on query.
///
/// Layers are ordered bottom-to-top: a layer later in the stack overrides
/// attributes of earlier ones. Every structural mutation invalidates all
/// sequences and readers handed out before it.
#[derive(Debug)]
pub struct CompoundHighlights {
	config: HighlightsConfig,
	layers: Vec<(LayerId, Layer)>,
	next_id: u64,
	generation: GenerationCounter,
	engine: OnceCell<MergeEngine>,
	listeners: ChangeListeners,
}

impl CompoundHighlights {
	/// Creates an empty manager.
	pub fn new(config: HighlightsConfig) -> Self {
		Self {
			config,
			layers: Vec::new(),
			next_id: 0,
			generation: GenerationCounter::new(),
			engine: OnceCell::new(),
			listeners: ChangeListeners::new(),
		}
	}

	/// Returns the active configuration.
	pub fn config(&self) -> &HighlightsConfig {
		&self.config
	}

	/// Returns the number of layers.
	pub fn len(&self) -> usize {
		self.layers.len()
	}

	/// Returns true if no layer is registered.
	pub fn is_empty(&self) -> bool {
		self.layers.is_empty()
	}

	/// Returns the current generation; it moves on every mutation.
	pub fn generation(&self) -> u64 {
		self.generation.current()
	}

	/// Returns a guard that goes stale on the next mutation.
	pub fn guard(&self) -> SnapshotGuard {
		self.generation.guard()
	}

	/// Returns the layer ids, bottom-to-top.
	pub fn layer_ids(&self) -> Vec<LayerId> {
		self.layers.iter().map(|(id, _)| *id).collect()
	}

	/// Returns the layer registered under `id`.
	pub fn layer(&self, id: LayerId) -> Option<&Layer> {
		self.position(id).map(|index| &self.layers[index].1)
	}

	fn position(&self, id: LayerId) -> Option<usize> {
		self.layers.iter().position(|(lid, _)| *lid == id)
	}

	fn next_layer_id(&mut self) -> LayerId {
		let id = LayerId(self.next_id);
		self.next_id += 1;
		id
	}

	/// Returns the strategy the current composition merges with.
	pub fn strategy(&self) -> MergeStrategy {
		match self.config.strategy {
			StrategyPreference::Direct => MergeStrategy::Direct,
			StrategyPreference::MarkStream => MergeStrategy::MarkStream,
			StrategyPreference::Auto => {
				let all_fixed = self.layers.iter().all(|(_, layer)| layer.is_fixed_size());
				if all_fixed || self.config.split_offsets {
					MergeStrategy::Direct
				} else if self.layers.len() <= self.config.mark_stream_layer_limit {
					MergeStrategy::MarkStream
				} else {
					MergeStrategy::Direct
				}
			}
		}
	}

	/// Invalidates outstanding sequences and the cached engine.
	fn invalidate(&mut self) {
		self.engine = OnceCell::new();
		self.generation.bump();
	}

	fn structure_changed(&mut self) {
		self.invalidate();
		tracing::debug!(
			layers = self.layers.len(),
			strategy = ?self.strategy(),
			"layer stack changed"
		);
		self.listeners.fire(HighlightsChangeEvent::FULL);
	}

	/// Adds `layer` on top of the stack.
	pub fn push_layer(&mut self, mut layer: Layer) -> LayerId {
		let id = self.next_layer_id();
		layer.take_dirty();
		tracing::debug!(layer = %id, name = layer.name(), "layer added");
		self.layers.push((id, layer));
		self.structure_changed();
		id
	}

	/// Inserts `layer` at `index`, shifting higher layers up.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::IndexOutOfBounds`] if `index > len()`.
	pub fn insert_layer(&mut self, index: usize, mut layer: Layer) -> Result<LayerId> {
		if index > self.layers.len() {
			return Err(HighlightError::IndexOutOfBounds {
				index,
				len: self.layers.len(),
			});
		}
		let id = self.next_layer_id();
		layer.take_dirty();
		tracing::debug!(layer = %id, name = layer.name(), index, "layer inserted");
		self.layers.insert(index, (id, layer));
		self.structure_changed();
		Ok(id)
	}

	/// Removes a layer and runs its release hook.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::UnknownLayer`] if `id` is not registered.
	pub fn remove_layer(&mut self, id: LayerId) -> Result<Layer> {
		let index = self.position(id).ok_or(HighlightError::UnknownLayer(id))?;
		let (_, mut layer) = self.layers.remove(index);
		layer.release();
		tracing::debug!(layer = %id, name = layer.name(), "layer removed");
		self.structure_changed();
		Ok(layer)
	}

	/// Replaces the whole stack, releasing every previous layer.
	pub fn set_layers(&mut self, layers: Vec<Layer>) -> Vec<LayerId> {
		for (_, mut old) in std::mem::take(&mut self.layers) {
			old.release();
		}
		let mut ids = Vec::with_capacity(layers.len());
		for mut layer in layers {
			let id = self.next_layer_id();
			layer.take_dirty();
			ids.push(id);
			self.layers.push((id, layer));
		}
		tracing::debug!(layers = ids.len(), "layer stack replaced");
		self.structure_changed();
		ids
	}

	/// Mutates one layer's content.
	///
	/// The range the closure changed is published as a single change event.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::UnknownLayer`] if `id` is not registered.
	pub fn edit_layer<R>(&mut self, id: LayerId, edit: impl FnOnce(&mut Layer) -> R) -> Result<R> {
		let index = self.position(id).ok_or(HighlightError::UnknownLayer(id))?;
		let layer = &mut self.layers[index].1;
		let version = layer.version();
		let result = edit(layer);
		let dirty = layer.take_dirty();
		let moved = layer.version() != version;

		if moved {
			self.invalidate();
		}
		if let Some(range) = dirty {
			tracing::trace!(layer = %id, start = range.start, end = range.end, "layer content changed");
			self.listeners.fire(range.into());
		}
		Ok(result)
	}

	/// Moves tracked layer boundaries for a document edit.
	///
	/// Must be called once per edit, before the next query. Outstanding
	/// sequences are invalidated; no change event is fired since the
	/// document owner already knows about the edit.
	pub fn apply_edit(&mut self, edit: &DocumentEdit) {
		if edit.is_noop() {
			return;
		}
		let mut moved = 0;
		for (_, layer) in &mut self.layers {
			if layer.apply_edit(edit) {
				moved += 1;
			}
		}
		tracing::trace!(
			start = edit.start,
			removed = edit.removed,
			inserted = edit.inserted,
			moved,
			"document edit applied"
		);
		self.invalidate();
	}

	/// Returns the merge engine for the current layer stack.
	pub fn engine(&self) -> &MergeEngine {
		self.engine.get_or_init(|| {
			let strategy = self.strategy();
			let runs = self.layers.iter().map(|(_, layer)| layer.snapshot()).collect();
			tracing::trace!(layers = self.layers.len(), ?strategy, "merge engine rebuilt");
			MergeEngine::new(runs, strategy, self.config.split_offsets).with_guard(self.generation.guard())
		})
	}

	/// Returns the merged highlights over `[start, end)`.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::InvalidRange`] if `end < start`.
	pub fn highlights(&self, start: CharIdx, end: CharIdx) -> Result<MergedSequence> {
		check_range(start, end)?;
		self.engine().highlights(start, end)
	}

	/// Returns a font-run reader over the merged highlights from `start` to `end`.
	///
	/// # Errors
	///
	/// Returns [`HighlightError::InvalidRange`] if `end < start`.
	pub fn reader(&self, start: CharIdx, end: CharIdx) -> Result<HighlightsReader<MergedSequence>> {
		let seq = self.highlights(start, end)?;
		Ok(HighlightsReader::new(seq, start).with_guard(self.generation.guard()))
	}

	/// Registers a change listener.
	pub fn add_change_listener(&mut self, listener: impl FnMut(&HighlightsChangeEvent) + 'static) -> ListenerId {
		self.listeners.add(listener)
	}

	/// Unregisters a change listener. Returns false if `id` was unknown.
	pub fn remove_change_listener(&mut self, id: ListenerId) -> bool {
		self.listeners.remove(id)
	}
}

impl Default for CompoundHighlights {
	fn default() -> Self {
		Self::new(HighlightsConfig::default())
	}
}

impl Drop for CompoundHighlights {
	fn drop(&mut self) {
		for (_, layer) in &mut self.layers {
			layer.release();
		}
	}
}
