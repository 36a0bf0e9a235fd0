use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use strata_primitives::{AttributeSet, OffsetRange};

use super::*;
use crate::sequence::{HighlightRun, HighlightsSequence, collect_runs};

fn attrs(name: &'static str) -> AttributeSet {
	AttributeSet::from_pairs([("name", name)])
}

fn fixed(name: &str, runs: &[(CharIdx, CharIdx, &'static str)]) -> Layer {
	let runs = runs
		.iter()
		.map(|&(start, end, value)| HighlightRun::new(start, end, attrs(value)))
		.collect();
	Layer::from_runs(name, runs).unwrap()
}

fn tracked(name: &str, runs: &[(CharIdx, CharIdx, &'static str)]) -> Layer {
	let runs = runs
		.iter()
		.map(|&(start, end, value)| HighlightRun::new(start, end, attrs(value)))
		.collect();
	Layer::tracked_from_runs(name, runs).unwrap()
}

fn cells(manager: &CompoundHighlights, start: CharIdx, end: CharIdx) -> Vec<(CharIdx, CharIdx, AttributeSet)> {
	let mut seq = manager.highlights(start, end).unwrap();
	collect_runs(&mut seq)
		.into_iter()
		.map(|r| (r.start(), r.end(), r.attrs))
		.collect()
}

fn event_log(manager: &mut CompoundHighlights) -> Rc<RefCell<Vec<(CharIdx, CharIdx)>>> {
	let log = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&log);
	manager.add_change_listener(move |e| sink.borrow_mut().push((e.start, e.end)));
	log
}

#[test]
fn empty_manager_yields_nothing() {
	let manager = CompoundHighlights::default();
	assert!(manager.is_empty());
	assert!(cells(&manager, 0, 100).is_empty());
}

#[rstest]
#[case::all_fixed(StrategyPreference::Auto, &[true, true], false, MergeStrategy::Direct)]
#[case::mixed(StrategyPreference::Auto, &[true, false], false, MergeStrategy::MarkStream)]
#[case::split_forces_direct(StrategyPreference::Auto, &[false], true, MergeStrategy::Direct)]
#[case::too_many_layers(StrategyPreference::Auto, &[false, false, false], false, MergeStrategy::Direct)]
#[case::forced_mark_stream(StrategyPreference::MarkStream, &[true], false, MergeStrategy::MarkStream)]
#[case::forced_direct(StrategyPreference::Direct, &[false], false, MergeStrategy::Direct)]
fn strategy_selection(
	#[case] preference: StrategyPreference,
	#[case] kinds: &[bool],
	#[case] split_offsets: bool,
	#[case] expected: MergeStrategy,
) {
	let config = HighlightsConfig {
		strategy: preference,
		split_offsets,
		mark_stream_layer_limit: 2,
	};
	let mut manager = CompoundHighlights::new(config);
	for (i, &is_fixed) in kinds.iter().enumerate() {
		let name = format!("layer{i}");
		manager.push_layer(if is_fixed { Layer::fixed(name) } else { Layer::tracked(name) });
	}
	assert_eq!(manager.strategy(), expected);
	assert_eq!(manager.engine().strategy(), expected);
}

#[test]
fn insert_layer_orders_z() {
	let mut manager = CompoundHighlights::default();
	let top = manager.push_layer(fixed("top", &[(0, 10, "top")]));
	let bottom = manager.insert_layer(0, fixed("bottom", &[(0, 10, "bottom")])).unwrap();
	assert_eq!(manager.layer_ids(), vec![bottom, top]);
	assert_eq!(cells(&manager, 0, 10), vec![(0, 10, attrs("top"))]);

	assert!(matches!(
		manager.insert_layer(5, Layer::fixed("x")),
		Err(HighlightError::IndexOutOfBounds { index: 5, len: 2 })
	));
}

#[test]
fn remove_layer_releases_and_notifies() {
	let released = Rc::new(RefCell::new(Vec::new()));
	let mut manager = CompoundHighlights::default();
	let log = event_log(&mut manager);

	let hook = Rc::clone(&released);
	let id = manager.push_layer(fixed("a", &[(0, 4, "a")]).with_release_hook(move || hook.borrow_mut().push("a")));
	let layer = manager.remove_layer(id).unwrap();
	assert_eq!(layer.name(), "a");
	assert_eq!(*released.borrow(), vec!["a"]);
	assert!(matches!(manager.remove_layer(id), Err(HighlightError::UnknownLayer(_))));

	let full = (OffsetRange::FULL.start, OffsetRange::FULL.end);
	assert_eq!(*log.borrow(), vec![full, full]);
}

#[test]
fn set_layers_releases_previous_stack() {
	let released = Rc::new(RefCell::new(0));
	let mut manager = CompoundHighlights::default();
	for name in ["a", "b"] {
		let hook = Rc::clone(&released);
		manager.push_layer(Layer::fixed(name).with_release_hook(move || *hook.borrow_mut() += 1));
	}
	let ids = manager.set_layers(vec![fixed("c", &[(1, 2, "c")])]);
	assert_eq!(*released.borrow(), 2);
	assert_eq!(manager.layer_ids(), ids);
	assert_eq!(manager.layer(ids[0]).map(Layer::name), Some("c"));
}

#[test]
fn dropping_manager_releases_layers() {
	let released = Rc::new(RefCell::new(false));
	{
		let mut manager = CompoundHighlights::default();
		let hook = Rc::clone(&released);
		manager.push_layer(Layer::fixed("a").with_release_hook(move || *hook.borrow_mut() = true));
	}
	assert!(*released.borrow());
}

#[test]
fn edit_layer_fires_coalesced_event() {
	let mut manager = CompoundHighlights::default();
	let id = manager.push_layer(Layer::tracked("t"));
	let log = event_log(&mut manager);

	manager
		.edit_layer(id, |layer| {
			layer.add_highlight(5, 8, attrs("a"))?;
			layer.add_highlight(20, 22, attrs("b"))
		})
		.unwrap()
		.unwrap();
	assert_eq!(*log.borrow(), vec![(5, 22)]);

	// A mutation that changes nothing stays silent.
	manager.edit_layer(id, |layer| layer.remove_highlights(40, 50, true)).unwrap().unwrap();
	assert_eq!(log.borrow().len(), 1);
}

#[test]
fn removed_listener_is_not_called() {
	let mut manager = CompoundHighlights::default();
	let calls = Rc::new(RefCell::new(0));
	let sink = Rc::clone(&calls);
	let id = manager.add_change_listener(move |_| *sink.borrow_mut() += 1);
	manager.push_layer(Layer::fixed("a"));
	assert!(manager.remove_change_listener(id));
	manager.push_layer(Layer::fixed("b"));
	assert_eq!(*calls.borrow(), 1);
}

#[test]
fn edit_layer_invalidates_outstanding_sequences() {
	let mut manager = CompoundHighlights::default();
	let id = manager.push_layer(fixed("a", &[(0, 2, "a"), (4, 6, "b")]));
	let mut seq = manager.highlights(0, 6).unwrap();
	assert!(seq.move_next());

	manager.edit_layer(id, Layer::clear).unwrap();
	assert!(!seq.move_next());
	assert!(cells(&manager, 0, 6).is_empty());
}

#[test]
fn document_edits_move_tracked_layers_only() {
	let mut manager = CompoundHighlights::default();
	manager.push_layer(fixed("f", &[(0, 4, "f")]));
	manager.push_layer(tracked("t", &[(10, 12, "t")]));
	let log = event_log(&mut manager);
	let before = manager.generation();

	manager.apply_edit(&DocumentEdit::insert(2, 3));
	assert!(manager.generation() > before);
	assert!(log.borrow().is_empty());
	assert_eq!(
		cells(&manager, 0, 20),
		vec![
			(0, 4, attrs("f")),
			(4, 13, AttributeSet::empty()),
			(13, 15, attrs("t")),
			(15, 20, AttributeSet::empty()),
		]
	);
}

#[test]
fn engine_is_cached_until_mutation() {
	let mut manager = CompoundHighlights::default();
	manager.push_layer(fixed("a", &[(0, 2, "a")]));
	let engine = manager.engine().clone();
	assert!(engine.is_current());
	assert!(manager.engine().is_current());

	manager.push_layer(fixed("b", &[(2, 4, "b")]));
	assert!(!engine.is_current());
	assert_eq!(manager.engine().layer_count(), 2);
}

#[test]
fn reader_from_manager_tracks_staleness() {
	let mut manager = CompoundHighlights::default();
	manager.push_layer(fixed("a", &[(0, 2, "a")]));
	let reader = manager.reader(0, 4).unwrap();
	assert!(!reader.is_stale());
	manager.push_layer(Layer::fixed("b"));
	assert!(reader.is_stale());
}

#[test]
fn inverted_query_is_rejected() {
	let manager = CompoundHighlights::default();
	assert!(matches!(
		manager.highlights(7, 2),
		Err(HighlightError::InvalidRange { start: 7, end: 2 })
	));
}
