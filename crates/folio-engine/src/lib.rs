//! # folio-engine
//!
//! The structural core of a rich-text document: a tree of typed nodes
//! ("blots") addressed by linear character offset.
//!
//! ## Architecture
//!
//! - **Schema** ([`Schema`] → [`Registry`]): which blot kinds exist, how they
//!   extend each other, which children each branch accepts. Frozen when a
//!   [`Scroll`] is built.
//! - **Arena and sibling lists**: blots live in an arena and refer to each
//!   other by [`BlotId`]; each branch threads its children through a
//!   doubly-linked list.
//! - **Blots**: leaves hold content (text, embeds, zero-length breaks);
//!   branches hold children and carry a [`Policy`] (generic, container merge,
//!   inline ordering).
//! - **Host** ([`Host`]): the render surface every blot is mirrored onto, seen
//!   only through opaque [`NativeId`]s. [`MemoryHost`] runs headless.
//! - **Reconciliation** ([`Scroll::update`]): folds external host edits back
//!   into the tree.
//!
//! ## Example
//!
//! ```
//! use folio_engine::{Schema, Scroll, snapshot::outline};
//! use serde_json::json;
//!
//! let mut scroll = Scroll::new(Schema::standard())?;
//! scroll.insert_text(0, "hello")?;
//! scroll.format_at(0, 5, "bold", json!(true))?;
//!
//! assert_eq!(scroll.length(), 5);
//! assert_eq!(
//!     outline(&scroll),
//!     "scroll\n  block\n    bold=true\n      text \"hello\""
//! );
//! # Ok::<(), folio_engine::TreeError>(())
//! ```
//!
//! Every public mutating call on [`Scroll`] leaves the tree normalized:
//! illegal children are repaired, empty branches receive their default child
//! or disappear, inline formats are nested in canonical order, adjacent
//! containers of one kind are merged.

mod arena;
mod blot;
mod error;
mod host;
mod list;
mod memory_host;
mod reconcile;
mod registry;
mod runs;
mod schema;
mod scope;
mod scroll;
pub mod snapshot;

pub use arena::BlotId;
pub use blot::{BlotRef, Insert};
pub use error::TreeError;
pub use host::{Host, Mutation, NativeId, NativeSpec};
pub use memory_host::MemoryHost;
pub use registry::{InlineOrder, Registry};
pub use runs::Run;
pub use schema::{AttributeDef, BlotDef, DEFAULT_INLINE_ORDER, Level, Policy, Schema, Shape};
pub use scope::Scope;
pub use scroll::Scroll;

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
