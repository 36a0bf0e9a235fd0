//! End-to-end flows through the compound layer manager.

use pretty_assertions::assert_eq;
use rstest::rstest;
use strata_highlight::{
	CompoundHighlights, HighlightRun, HighlightsConfig, HighlightsSequence, Layer, MergeStrategy,
	StrategyPreference, ZeroOffsetMode, collect_runs,
};
use strata_primitives::{AttrValue, AttributeSet, CharIdx, DocumentEdit};

fn x(value: i64) -> AttributeSet {
	AttributeSet::from_pairs([("x", AttrValue::Int(value))])
}

fn manager(preference: StrategyPreference) -> CompoundHighlights {
	CompoundHighlights::new(HighlightsConfig {
		strategy: preference,
		..HighlightsConfig::default()
	})
}

fn cells(manager: &CompoundHighlights, start: CharIdx, end: CharIdx) -> Vec<(CharIdx, CharIdx, AttributeSet)> {
	let mut seq = manager.highlights(start, end).unwrap();
	collect_runs(&mut seq)
		.into_iter()
		.map(|run| (run.start(), run.end(), run.attrs))
		.collect()
}

fn layer(name: &str, runs: &[(CharIdx, CharIdx, i64)]) -> Layer {
	let runs = runs
		.iter()
		.map(|&(start, end, value)| HighlightRun::new(start, end, x(value)))
		.collect();
	Layer::tracked_from_runs(name, runs).unwrap()
}

#[rstest]
fn upper_layer_overrides_lower(
	#[values(StrategyPreference::Direct, StrategyPreference::MarkStream)] preference: StrategyPreference,
) {
	let mut stack = manager(preference);
	stack.push_layer(layer("a", &[(10, 20, 1)]));
	stack.push_layer(layer("b", &[(15, 25, 2)]));

	assert_eq!(
		cells(&stack, 10, 25),
		vec![(10, 15, x(1)), (15, 20, x(2)), (20, 25, x(2))]
	);
}

#[rstest]
fn requery_is_idempotent(
	#[values(StrategyPreference::Direct, StrategyPreference::MarkStream)] preference: StrategyPreference,
) {
	let mut stack = manager(preference);
	stack.push_layer(layer("a", &[(0, 8, 1), (12, 30, 3)]));
	stack.push_layer(layer("b", &[(5, 14, 2)]));

	let first = cells(&stack, 0, 40);
	assert_eq!(cells(&stack, 0, 40), first);
	assert_eq!(first.first().map(|c| c.0), Some(0));
	assert_eq!(first.last().map(|c| c.1), Some(40));
}

#[test]
fn replacing_layers_invalidates_open_sequence() {
	let mut stack = CompoundHighlights::default();
	for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
		let base = i * 10;
		stack.push_layer(layer(name, &[(base, base + 5, i as i64)]));
	}

	let mut seq = stack.highlights(0, 30).unwrap();
	assert!(seq.move_next());
	stack.set_layers(vec![layer("d", &[(0, 30, 9)])]);
	assert!(!seq.move_next());
	assert!(!seq.move_next());

	assert_eq!(cells(&stack, 0, 30), vec![(0, 30, x(9))]);
}

#[test]
fn edit_round_trip_restores_tracked_runs() {
	let mut stack = CompoundHighlights::default();
	stack.push_layer(layer("a", &[(100, 120, 1)]));

	stack.apply_edit(&DocumentEdit::insert(0, 10));
	assert_eq!(cells(&stack, 100, 140)[1], (110, 130, x(1)));

	stack.apply_edit(&DocumentEdit::remove(0, 10));
	assert_eq!(cells(&stack, 100, 120), vec![(100, 120, x(1))]);
}

#[test]
fn anchored_layer_keeps_document_start() {
	let mut stack = CompoundHighlights::default();
	let mut pinned = Layer::tracked_with_zero_mode("pinned", ZeroOffsetMode::Fixed);
	pinned.add_highlight(0, 5, x(1)).unwrap();
	pinned.add_highlight(100, 105, x(2)).unwrap();
	stack.push_layer(pinned);

	stack.apply_edit(&DocumentEdit::insert(0, 10));
	let cells = cells(&stack, 0, 120);
	assert_eq!(cells[0], (0, 15, x(1)));
	assert!(cells.contains(&(110, 115, x(2))));
}

#[test]
fn strategy_follows_config_file() {
	let config = HighlightsConfig::from_toml_str("strategy = \"direct\"").unwrap();
	let mut stack = CompoundHighlights::new(config);
	stack.push_layer(Layer::tracked("a"));
	assert_eq!(stack.strategy(), MergeStrategy::Direct);

	let mut stack = CompoundHighlights::default();
	stack.push_layer(Layer::tracked("a"));
	assert_eq!(stack.strategy(), MergeStrategy::MarkStream);
}
