use pretty_assertions::assert_eq;
use strata_primitives::AttributeSet;

use super::*;

fn attrs(name: &'static str) -> AttributeSet {
	AttributeSet::from_pairs([("name", name)])
}

fn runs() -> Arc<[HighlightRun]> {
	vec![
		HighlightRun::new(0, 5, attrs("a")),
		HighlightRun::new(5, 5, attrs("empty")),
		HighlightRun::new(10, 20, attrs("b")),
		HighlightRun::new(30, 40, attrs("c")),
	]
	.into()
}

#[test]
fn runs_sequence_clips_to_query() {
	let mut seq = RunsSequence::new(runs(), 3, 35);
	assert_eq!(
		collect_runs(&mut seq),
		vec![
			HighlightRun::new(3, 5, attrs("a")),
			HighlightRun::new(10, 20, attrs("b")),
			HighlightRun::new(30, 35, attrs("c")),
		]
	);
	assert!(!seq.move_next(), "exhausted sequence stays exhausted");
}

#[test]
fn runs_sequence_skips_empty_runs() {
	let mut seq = RunsSequence::new(runs(), 5, 10);
	assert!(!seq.move_next());
}

#[test]
fn runs_sequence_empty_query() {
	let mut seq = RunsSequence::new(runs(), 12, 12);
	assert!(!seq.move_next());
}

#[test]
fn runs_sequence_stops_when_guard_moves() {
	let counter = GenerationCounter::new();
	let mut seq = RunsSequence::new(runs(), 0, 100).with_guard(counter.guard());
	assert!(seq.move_next());
	assert_eq!(seq.start(), 0);
	counter.bump();
	assert!(!seq.move_next());
	assert!(!seq.move_next());
}

#[test]
fn runs_sequence_keeps_shifts_inside_query() {
	let split: Arc<[HighlightRun]> = vec![HighlightRun::split(
		SplitOffset::shifted(4, 1),
		SplitOffset::shifted(6, 2),
		attrs("tab"),
	)]
	.into();
	let mut seq = RunsSequence::new(split.clone(), 0, 10);
	assert!(seq.move_next());
	assert_eq!((seq.start(), seq.start_shift(), seq.end(), seq.end_shift()), (4, 1, 6, 2));

	let mut clipped = RunsSequence::new(split, 0, 6);
	assert!(clipped.move_next());
	assert_eq!((clipped.end(), clipped.end_shift()), (6, 0));
}

#[test]
fn split_offset_ordering() {
	assert!(SplitOffset::shifted(4, 3) < SplitOffset::new(5));
	assert!(SplitOffset::new(4) < SplitOffset::shifted(4, 1));
	assert_eq!(SplitOffset::shifted(4, 3).unshifted(), SplitOffset::new(4));
}

#[test]
fn empty_sequence_never_yields() {
	let mut seq = EmptySequence::new();
	assert!(!seq.move_next());
	assert!(seq.attributes().is_empty());
}

#[test]
fn check_ordering_rejects_overlap_and_descent() {
	let ok = [HighlightRun::new(0, 5, attrs("a")), HighlightRun::new(5, 9, attrs("b"))];
	assert!(check_ordering(&ok).is_ok());

	let overlap = [HighlightRun::new(0, 5, attrs("a")), HighlightRun::new(4, 9, attrs("b"))];
	assert!(check_ordering(&overlap).unwrap_err().contains("overlaps"));

	let descending = [HighlightRun::new(5, 9, attrs("a")), HighlightRun::new(0, 2, attrs("b"))];
	assert!(check_ordering(&descending).unwrap_err().contains("before"));

	let inverted = [HighlightRun::new(9, 5, attrs("a"))];
	assert!(check_ordering(&inverted).is_err());
}

#[test]
fn listeners_fire_in_registration_order() {
	use std::cell::RefCell;
	use std::rc::Rc;

	let log = Rc::new(RefCell::new(Vec::new()));
	let mut listeners = ChangeListeners::new();
	let first = {
		let log = Rc::clone(&log);
		listeners.add(move |e| log.borrow_mut().push(("first", e.start, e.end)))
	};
	{
		let log = Rc::clone(&log);
		listeners.add(move |e| log.borrow_mut().push(("second", e.start, e.end)));
	}

	listeners.fire(HighlightsChangeEvent { start: 1, end: 4 });
	assert!(listeners.remove(first));
	assert!(!listeners.remove(first));
	listeners.fire(HighlightsChangeEvent { start: 7, end: 9 });

	assert_eq!(
		*log.borrow(),
		vec![("first", 1, 4), ("second", 1, 4), ("second", 7, 9)]
	);
}
