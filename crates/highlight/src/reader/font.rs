use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use strata_primitives::{AttrValue, AttributeSet, keys};

bitflags! {
	/// Style bits of a rendering font.
	#[derive(Default, Clone, Copy, Eq, PartialEq, Hash)]
	pub struct FontStyle: u8 {
		/// Bold weight.
		const BOLD   = 0b01;
		/// Italic slant.
		const ITALIC = 0b10;
	}
}

impl fmt::Debug for FontStyle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_empty() {
			return write!(f, "PLAIN");
		}
		write!(f, "{}", self.0)
	}
}

/// The font a span of text is rendered with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
	/// Family name.
	pub family: Arc<str>,
	/// Point size.
	pub size: u32,
	/// Weight and slant.
	pub style: FontStyle,
}

impl Default for Font {
	fn default() -> Self {
		Self::new("monospace", 12)
	}
}

impl Font {
	/// Creates a plain font.
	pub fn new(family: &str, size: u32) -> Self {
		Self {
			family: Arc::from(family),
			size,
			style: FontStyle::empty(),
		}
	}

	/// Returns the font with `style` instead of the current style.
	pub fn with_style(mut self, style: FontStyle) -> Self {
		self.style = style;
		self
	}

	/// Applies the font keys of `attrs` on top of this font.
	///
	/// Values of the wrong type are ignored.
	pub fn derive(&self, attrs: &AttributeSet) -> Font {
		let mut font = self.clone();
		if let Some(AttrValue::Text(family)) = attrs.get(keys::FONT_FAMILY) {
			font.family = Arc::clone(family);
		}
		if let Some(size) = attrs
			.get(keys::FONT_SIZE)
			.and_then(AttrValue::as_int)
			.and_then(|size| u32::try_from(size).ok())
		{
			font.size = size;
		}
		if let Some(bold) = attrs.get(keys::BOLD).and_then(AttrValue::as_bool) {
			font.style.set(FontStyle::BOLD, bold);
		}
		if let Some(italic) = attrs.get(keys::ITALIC).and_then(AttrValue::as_bool) {
			font.style.set(FontStyle::ITALIC, italic);
		}
		font
	}
}
