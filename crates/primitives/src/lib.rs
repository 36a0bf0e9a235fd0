//! Core value types shared by highlight producers and the merge engine:
//! character offsets, document edits, and composable attribute sets.

/// Immutable attribute maps and z-order composition.
pub mod attrs;
/// Document edit notifications and position mapping.
pub mod edit;
/// Character offsets and half-open offset ranges.
pub mod range;

pub use attrs::{AttrKey, AttrValue, AttributeSet, keys};
pub use edit::{Bias, DocumentEdit};
pub use range::{CharIdx, CharLen, OffsetRange, RangeError};
