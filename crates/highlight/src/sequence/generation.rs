use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared mutation counter for a layer or layer set.
///
/// Every structural mutation bumps the counter. Sequences capture the value
/// at creation through a [`SnapshotGuard`] and stop yielding once it moves.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter(Arc<AtomicU64>);

impl GenerationCounter {
	/// Creates a counter starting at generation zero.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the current generation.
	pub fn current(&self) -> u64 {
		self.0.load(Ordering::Acquire)
	}

	/// Advances the generation, invalidating every outstanding guard.
	pub fn bump(&self) -> u64 {
		self.0.fetch_add(1, Ordering::AcqRel) + 1
	}

	/// Captures the current generation.
	pub fn guard(&self) -> SnapshotGuard {
		SnapshotGuard {
			counter: self.clone(),
			seen: self.current(),
		}
	}
}

/// A generation captured at snapshot time.
#[derive(Debug, Clone)]
pub struct SnapshotGuard {
	counter: GenerationCounter,
	seen: u64,
}

impl SnapshotGuard {
	/// Returns true while no mutation happened since the guard was taken.
	#[inline]
	pub fn is_current(&self) -> bool {
		self.counter.current() == self.seen
	}

	/// Returns the generation observed when the guard was taken.
	pub fn generation(&self) -> u64 {
		self.seen
	}
}
