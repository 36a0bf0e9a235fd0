use strata_primitives::{CharIdx, OffsetRange};

/// Notification that highlights inside `[start, end)` may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightsChangeEvent {
	/// First offset whose highlights may differ.
	pub start: CharIdx,
	/// First offset past the changed area.
	pub end: CharIdx,
}

impl HighlightsChangeEvent {
	/// Event covering the whole document, used for layer add/remove.
	pub const FULL: HighlightsChangeEvent = HighlightsChangeEvent {
		start: OffsetRange::FULL.start,
		end: OffsetRange::FULL.end,
	};

	/// Returns the changed area as a range.
	pub fn range(&self) -> OffsetRange {
		OffsetRange {
			start: self.start,
			end: self.end,
		}
	}
}

impl From<OffsetRange> for HighlightsChangeEvent {
	fn from(range: OffsetRange) -> Self {
		Self {
			start: range.start,
			end: range.end,
		}
	}
}

/// Handle returned by listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&HighlightsChangeEvent)>;

/// Change listeners, invoked synchronously in registration order.
#[derive(Default)]
pub struct ChangeListeners {
	next_id: u64,
	listeners: Vec<(ListenerId, Listener)>,
}

impl ChangeListeners {
	/// Creates an empty listener list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a listener and returns its handle.
	pub fn add(&mut self, listener: impl FnMut(&HighlightsChangeEvent) + 'static) -> ListenerId {
		let id = ListenerId(self.next_id);
		self.next_id += 1;
		self.listeners.push((id, Box::new(listener)));
		id
	}

	/// Unregisters a listener. Returns false if the handle was unknown.
	pub fn remove(&mut self, id: ListenerId) -> bool {
		let before = self.listeners.len();
		self.listeners.retain(|(lid, _)| *lid != id);
		self.listeners.len() < before
	}

	/// Returns the number of registered listeners.
	pub fn len(&self) -> usize {
		self.listeners.len()
	}

	/// Returns true if nobody is listening.
	pub fn is_empty(&self) -> bool {
		self.listeners.is_empty()
	}

	/// Delivers `event` to every listener.
	pub fn fire(&mut self, event: HighlightsChangeEvent) {
		for (_, listener) in &mut self.listeners {
			listener(&event);
		}
	}
}

impl std::fmt::Debug for ChangeListeners {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChangeListeners")
			.field("len", &self.listeners.len())
			.finish_non_exhaustive()
	}
}
