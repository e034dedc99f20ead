use std::{
    fmt,
    ops::{Index, IndexMut},
};

use folio_delta::AttributeMap;
use serde_json::Value;

use crate::{NativeId, registry::KindId};

/// Stable handle to a blot.
///
/// Handles carry a generation, so a handle to a removed blot never aliases
/// a blot created later in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlotId {
    index: u32,
    generation: u32,
}

impl fmt::Display for BlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Head, tail and size of a branch's sibling list. The links themselves
/// live on the children (`prev`/`next`).
#[derive(Debug, Default, Clone)]
pub(crate) struct Children {
    pub(crate) head: Option<BlotId>,
    pub(crate) tail: Option<BlotId>,
    pub(crate) len: usize,
    /// Host-only decoration kept first among the native children.
    pub(crate) ui: Option<NativeId>,
}

#[derive(Debug, Clone)]
pub(crate) enum Content {
    Text(String),
    Embed,
    Break,
    Branch(Children),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) kind: KindId,
    /// Format value of a formatting branch, payload of an embed.
    pub(crate) value: Value,
    /// Attribute-style formats on leaves.
    pub(crate) attributes: AttributeMap,
    pub(crate) parent: Option<BlotId>,
    pub(crate) prev: Option<BlotId>,
    pub(crate) next: Option<BlotId>,
    pub(crate) native: NativeId,
    pub(crate) content: Content,
}

impl Node {
    pub(crate) fn new(kind: KindId, value: Value, native: NativeId, content: Content) -> Self {
        Self {
            kind,
            value,
            attributes: AttributeMap::new(),
            parent: None,
            prev: None,
            next: None,
            native,
            content,
        }
    }

    pub(crate) fn children(&self) -> Option<&Children> {
        match &self.content {
            Content::Branch(children) => Some(children),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Children> {
        match &mut self.content {
            Content::Branch(children) => Some(children),
            _ => None,
        }
    }

    pub(crate) fn is_branch(&self) -> bool {
        matches!(self.content, Content::Branch(_))
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Slot storage for every blot of a scroll. Parent, sibling and child
/// references are [`BlotId`]s into this arena.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Arena {
    pub(crate) fn insert(&mut self, node: Node) -> BlotId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return BlotId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        BlotId {
            index,
            generation: 0,
        }
    }

    pub(crate) fn remove(&mut self, id: BlotId) -> Option<Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(node)
    }

    pub(crate) fn get(&self, id: BlotId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: BlotId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn contains(&self, id: BlotId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live blots.
    pub(crate) fn len(&self) -> usize {
        self.live
    }
}

impl Index<BlotId> for Arena {
    type Output = Node;

    fn index(&self, id: BlotId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale blot handle {id}"),
        }
    }
}

impl IndexMut<BlotId> for Arena {
    fn index_mut(&mut self, id: BlotId) -> &mut Node {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale blot handle {id}"),
        }
    }
}
