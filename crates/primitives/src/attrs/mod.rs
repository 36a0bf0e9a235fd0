//! Immutable, composable attribute sets.
//!
//! An [`AttributeSet`] is an order-independent map from attribute name to
//! value. Sets are shared behind an [`Arc`], so cloning one is a pointer copy
//! and a single set can back any number of highlight runs.
//!
//! Stacking is expressed with [`AttributeSet::compose`]: the overlay's keys
//! win, the base's remaining keys pass through.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

#[cfg(test)]
mod tests;

/// Well-known attribute names understood by the font-run reader.
pub mod keys {
	/// Font family name (`AttrValue::Text`).
	pub const FONT_FAMILY: &str = "font-family";
	/// Font size in points (`AttrValue::Int`).
	pub const FONT_SIZE: &str = "font-size";
	/// Bold weight (`AttrValue::Bool`).
	pub const BOLD: &str = "bold";
	/// Italic style (`AttrValue::Bool`).
	pub const ITALIC: &str = "italic";
	/// Zero-width virtual text rendered before the run (`AttrValue::Text`).
	pub const VIRTUAL_TEXT_PREPEND: &str = "virtual-text-prepend";
}

/// Attribute name. Static names avoid an allocation.
pub type AttrKey = Cow<'static, str>;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrValue {
	/// Boolean flag such as `bold`.
	Bool(bool),
	/// Integer value such as `font-size`.
	Int(i64),
	/// Text value such as a color name or family name.
	Text(Arc<str>),
}

impl AttrValue {
	/// Returns the boolean payload, if this is a [`AttrValue::Bool`].
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// Returns the integer payload, if this is a [`AttrValue::Int`].
	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(i) => Some(*i),
			_ => None,
		}
	}

	/// Returns the text payload, if this is a [`AttrValue::Text`].
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}
}

impl fmt::Display for AttrValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::Text(s) => f.write_str(s),
		}
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for AttrValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<i32> for AttrValue {
	fn from(value: i32) -> Self {
		Self::Int(value.into())
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		Self::Text(Arc::from(value))
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		Self::Text(Arc::from(value))
	}
}

type Entries = SmallVec<[(AttrKey, AttrValue); 4]>;

/// An immutable map of attribute name to value.
///
/// Entries are kept sorted by key so equality and hashing are independent of
/// insertion order. The empty set carries no allocation and stands for
/// "no contributing layer".
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributeSet(Option<Arc<Entries>>);

impl AttributeSet {
	/// Returns the empty set.
	pub const fn empty() -> Self {
		Self(None)
	}

	/// Builds a set from `(key, value)` pairs. Later duplicates win.
	pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<AttrKey>,
		V: Into<AttrValue>,
	{
		let mut entries = Entries::new();
		for (key, value) in pairs {
			insert_sorted(&mut entries, key.into(), value.into());
		}
		Self::from_entries(entries)
	}

	fn from_entries(entries: Entries) -> Self {
		if entries.is_empty() {
			Self(None)
		} else {
			Self(Some(Arc::new(entries)))
		}
	}

	fn entries(&self) -> &[(AttrKey, AttrValue)] {
		self.0.as_deref().map_or(&[], |e| e.as_slice())
	}

	/// Returns a copy of this set with `key` set to `value`.
	pub fn with(&self, key: impl Into<AttrKey>, value: impl Into<AttrValue>) -> Self {
		let mut entries: Entries = self.entries().iter().cloned().collect();
		insert_sorted(&mut entries, key.into(), value.into());
		Self::from_entries(entries)
	}

	/// Returns a copy of this set without `key`.
	pub fn without(&self, key: &str) -> Self {
		let entries: Entries = self
			.entries()
			.iter()
			.filter(|(k, _)| &**k != key)
			.cloned()
			.collect();
		Self::from_entries(entries)
	}

	/// Returns true if the set has no attributes.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.0.is_none()
	}

	/// Returns the number of attributes.
	#[inline]
	pub fn len(&self) -> usize {
		self.entries().len()
	}

	/// Looks up the value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&AttrValue> {
		let entries = self.entries();
		entries
			.binary_search_by(|(k, _)| (**k).cmp(key))
			.ok()
			.map(|idx| &entries[idx].1)
	}

	/// Returns true if `key` is present.
	pub fn contains_key(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	/// Iterates attributes in key order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
		self.entries().iter().map(|(k, v)| (&**k, v))
	}

	/// Returns true if both handles point at the same shared storage.
	pub fn ptr_eq(&self, other: &AttributeSet) -> bool {
		match (&self.0, &other.0) {
			(None, None) => true,
			(Some(a), Some(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}

	/// Stacks `overlay` on top of `base`.
	///
	/// Keys present in `overlay` override the same keys in `base`; the rest
	/// of `base` passes through. Composing with an empty set returns the
	/// other operand without allocating.
	pub fn compose(base: &AttributeSet, overlay: &AttributeSet) -> AttributeSet {
		if overlay.is_empty() {
			return base.clone();
		}
		if base.is_empty() {
			return overlay.clone();
		}

		let (a, b) = (base.entries(), overlay.entries());
		let mut merged = Entries::with_capacity(a.len() + b.len());
		let (mut i, mut j) = (0, 0);
		while i < a.len() && j < b.len() {
			match a[i].0.cmp(&b[j].0) {
				std::cmp::Ordering::Less => {
					merged.push(a[i].clone());
					i += 1;
				}
				std::cmp::Ordering::Greater => {
					merged.push(b[j].clone());
					j += 1;
				}
				std::cmp::Ordering::Equal => {
					merged.push(b[j].clone());
					i += 1;
					j += 1;
				}
			}
		}
		merged.extend(a[i..].iter().cloned());
		merged.extend(b[j..].iter().cloned());
		Self::from_entries(merged)
	}

	/// Folds sets bottom-to-top: each later set overrides the earlier ones.
	pub fn compose_all<'a>(sets: impl IntoIterator<Item = &'a AttributeSet>) -> AttributeSet {
		sets.into_iter()
			.fold(AttributeSet::empty(), |acc, next| AttributeSet::compose(&acc, next))
	}
}

fn insert_sorted(entries: &mut Entries, key: AttrKey, value: AttrValue) {
	match entries.binary_search_by(|(k, _)| k.cmp(&key)) {
		Ok(idx) => entries[idx].1 = value,
		Err(idx) => entries.insert(idx, (key, value)),
	}
}

impl fmt::Debug for AttributeSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<K, V> FromIterator<(K, V)> for AttributeSet
where
	K: Into<AttrKey>,
	V: Into<AttrValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self::from_pairs(iter)
	}
}
