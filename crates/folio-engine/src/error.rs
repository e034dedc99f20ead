//! Error types for tree operations.

use thiserror::Error;

use crate::{BlotId, NativeId};

/// Errors surfaced by the blot tree.
///
/// Structural legality violations never show up here: they are repaired
/// in place by the normalization pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The schema has no blot kind with this name.
    ///
    /// Callers that requested the creation may fall back to a coarser kind,
    /// as host reconciliation does with unrecognized native content.
    #[error("unknown blot kind: {0:?}")]
    UnknownKind(String),

    /// The handle does not refer to a live blot (removed or never created).
    #[error("blot not found: {0}")]
    UnknownBlot(BlotId),

    /// The host could not describe a native node.
    #[error("native node not recognized by host: {0:?}")]
    UnknownNative(NativeId),

    /// The operation needs a parent and the blot has none (the root).
    #[error("blot {0} has no parent")]
    NoParent(BlotId),

    /// A sub-range starts at or past the end of the blot.
    #[error("cannot isolate a range past the end of blot {0}")]
    PastEnd(BlotId),

    /// The operation needs a branch and the blot is a leaf.
    #[error("blot {0} cannot hold children")]
    NotABranch(BlotId),

    /// A value passed to a factory does not fit the blot kind.
    #[error("invalid value for blot kind {kind:?}: {reason}")]
    InvalidValue { kind: String, reason: String },

    /// The schema is inconsistent.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}
