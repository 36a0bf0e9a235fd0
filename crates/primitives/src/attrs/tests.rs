use proptest::prelude::*;

use super::*;

fn set(pairs: &[(&'static str, &str)]) -> AttributeSet {
	pairs.iter().map(|&(k, v)| (k, v)).collect()
}

#[test]
fn empty_set() {
	let empty = AttributeSet::empty();
	assert!(empty.is_empty());
	assert_eq!(empty.len(), 0);
	assert_eq!(empty, AttributeSet::default());
	assert_eq!(format!("{empty:?}"), "{}");
}

#[test]
fn order_independent_equality() {
	let a = set(&[("fg", "red"), ("bg", "blue")]);
	let b = set(&[("bg", "blue"), ("fg", "red")]);
	assert_eq!(a, b);
	assert_eq!(a.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["bg", "fg"]);
}

#[test]
fn later_duplicate_wins() {
	let a = AttributeSet::from_pairs([("x", 1), ("x", 2)]);
	assert_eq!(a.len(), 1);
	assert_eq!(a.get("x"), Some(&AttrValue::Int(2)));
}

#[test]
fn compose_overlay_overrides() {
	let base = AttributeSet::from_pairs([("x", AttrValue::Int(1)), ("y", AttrValue::Int(7))]);
	let overlay = AttributeSet::from_pairs([("x", 2)]);
	let composed = AttributeSet::compose(&base, &overlay);
	assert_eq!(composed.get("x"), Some(&AttrValue::Int(2)));
	assert_eq!(composed.get("y"), Some(&AttrValue::Int(7)));
	assert_eq!(composed.len(), 2);
}

#[test]
fn compose_with_empty_shares_storage() {
	let a = set(&[("fg", "red")]);
	let left = AttributeSet::compose(&AttributeSet::empty(), &a);
	let right = AttributeSet::compose(&a, &AttributeSet::empty());
	assert!(left.ptr_eq(&a));
	assert!(right.ptr_eq(&a));
}

#[test]
fn compose_all_folds_bottom_to_top() {
	let layers = [
		set(&[("fg", "red"), ("bg", "white")]),
		set(&[("fg", "green")]),
		set(&[("underline", "wave")]),
	];
	let composed = AttributeSet::compose_all(&layers);
	assert_eq!(composed, set(&[("fg", "green"), ("bg", "white"), ("underline", "wave")]));
	assert!(AttributeSet::compose_all(std::iter::empty()).is_empty());
}

#[test]
fn with_and_without() {
	let a = set(&[("fg", "red")]).with(keys::BOLD, true);
	assert_eq!(a.get(keys::BOLD).and_then(AttrValue::as_bool), Some(true));
	let b = a.without("fg");
	assert_eq!(b.len(), 1);
	assert!(!b.contains_key("fg"));
	assert!(a.without(keys::BOLD).without("fg").is_empty());
}

#[test]
fn value_accessors() {
	assert_eq!(AttrValue::from("mono").as_text(), Some("mono"));
	assert_eq!(AttrValue::from(12).as_int(), Some(12));
	assert_eq!(AttrValue::from(12).as_text(), None);
	assert_eq!(AttrValue::from(false).to_string(), "false");
}

fn arb_set() -> impl Strategy<Value = AttributeSet> {
	prop::collection::vec(("[a-d]", 0i64..4), 0..5).prop_map(|pairs| {
		pairs
			.into_iter()
			.map(|(k, v)| (AttrKey::Owned(k), v))
			.collect()
	})
}

proptest! {
	#[test]
	fn compose_is_associative(a in arb_set(), b in arb_set(), c in arb_set()) {
		let left = AttributeSet::compose(&AttributeSet::compose(&a, &b), &c);
		let right = AttributeSet::compose(&a, &AttributeSet::compose(&b, &c));
		prop_assert_eq!(left, right);
	}

	#[test]
	fn compose_keeps_every_overlay_key(a in arb_set(), b in arb_set()) {
		let composed = AttributeSet::compose(&a, &b);
		for (key, value) in b.iter() {
			prop_assert_eq!(composed.get(key), Some(value));
		}
		for (key, value) in a.iter() {
			if !b.contains_key(key) {
				prop_assert_eq!(composed.get(key), Some(value));
			}
		}
	}
}
