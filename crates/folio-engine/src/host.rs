//! # Host interface
//!
//! The tree mirrors every blot onto a node of some render surface (a DOM, a
//! terminal widget tree, nothing at all). The engine only talks to that
//! surface through [`Host`] and only ever sees opaque [`NativeId`]s.
//!
//! External edits to the surface come back into the tree through
//! [`Scroll::update`](crate::Scroll::update) as a list of [`Mutation`]s.

use folio_delta::AttributeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque handle to a node of the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NativeId(u64);

impl NativeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// What a native node represents, in blot terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeSpec {
    /// Blot kind name. Hosts may report names the schema does not know.
    pub kind: String,
    #[serde(default)]
    pub value: Value,
    /// Character data, for text nodes.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attributes: AttributeMap,
}

impl NativeSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: "text".into(),
            text: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }
}

/// Node factory and tree operations of a render surface.
pub trait Host {
    fn create(&mut self, spec: &NativeSpec) -> NativeId;

    /// Places `child` under `parent`, before `before` or last. Moves the
    /// child if it is attached elsewhere.
    fn insert_before(&mut self, parent: NativeId, child: NativeId, before: Option<NativeId>);

    /// Removes `node` from its parent. The node and its subtree stay valid.
    fn detach(&mut self, node: NativeId);

    /// Drops `node` and its subtree for good. Called once no blot is bound
    /// to the node any more; unknown nodes are ignored.
    fn destroy(&mut self, node: NativeId);

    fn set_text(&mut self, node: NativeId, text: &str);

    fn set_value(&mut self, node: NativeId, value: &Value);

    fn set_attributes(&mut self, node: NativeId, attributes: &AttributeMap);

    /// `None` when the node is unknown to the host.
    fn describe(&self, node: NativeId) -> Option<NativeSpec>;

    fn parent(&self, node: NativeId) -> Option<NativeId>;

    fn children(&self, node: NativeId) -> Vec<NativeId>;
}

/// An externally observed change of the host surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Children of `target` were added or removed.
    ChildList {
        target: NativeId,
        added: Vec<NativeId>,
        removed: Vec<NativeId>,
    },
    /// Character data of `target` changed.
    Text { target: NativeId },
}

impl Mutation {
    pub fn target(&self) -> NativeId {
        match self {
            Mutation::ChildList { target, .. } | Mutation::Text { target } => *target,
        }
    }
}
