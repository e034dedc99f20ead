//! # Snapshot Testing Support
//!
//! Utilities for testing the tree via snapshot assertions and invariant checks.
//!
//! ## Modules
//!
//! - **`normalize`**: Converts a scroll to a stable, serializable `Snap` tree and
//!   an indented text outline for `insta` snapshot testing
//! - **`invariants`**: Runtime checks for tree consistency (sibling links agree
//!   with parents, lengths add up, host mirrors the tree, children are legal)

pub mod invariants;
pub mod normalize;

pub use invariants::check as invariants;
pub use normalize::{Snap, normalize, outline};
