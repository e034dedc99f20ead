//! # folio-delta
//!
//! Attribute algebra for folio documents.
//!
//! An [`AttributeMap`] holds named format values for a range of content
//! (`{"bold": true, "link": "https://…"}`). Maps are never stored per
//! character; they are produced and consumed transiently by the four
//! functions in this crate when an editing layer composes, diffs, inverts or
//! transforms formatting operations.
//!
//! ## Absence vs. null
//!
//! Two different "nothing" values matter here:
//!
//! - a key that is **absent** means "this operation does not touch the
//!   attribute";
//! - a key mapped to [`Value::Null`] means "explicitly remove the attribute".
//!
//! In the same way, `None` in place of a whole map ("no attributes at all")
//! is distinct from `Some` of an empty map. Results of [`compose`], [`diff`]
//! and [`transform`] are `None` rather than an empty map when nothing
//! survives.
//!
//! ## Example
//!
//! ```
//! use folio_delta::{attrs, compose, diff, invert, transform};
//! use serde_json::json;
//!
//! let base = attrs(json!({"bold": true}));
//! let applied = attrs(json!({"italic": true}));
//!
//! let composed = compose(base.as_ref(), applied.as_ref(), false);
//! assert_eq!(composed, attrs(json!({"bold": true, "italic": true})));
//!
//! assert_eq!(diff(base.as_ref(), None), attrs(json!({"bold": null})));
//!
//! let undo = invert(applied.as_ref(), base.as_ref());
//! assert_eq!(Some(undo), attrs(json!({"italic": null})));
//!
//! let ours = attrs(json!({"bold": true}));
//! let theirs = attrs(json!({"bold": false}));
//! assert_eq!(transform(ours.as_ref(), theirs.as_ref(), true), None);
//! ```
//!
//! The functions never fail. Inputs that are not JSON objects are coerced to
//! the empty map by [`attrs`].

mod attributes;

pub use attributes::{AttributeMap, attrs, compose, diff, invert, transform};
pub use serde_json::Value;
