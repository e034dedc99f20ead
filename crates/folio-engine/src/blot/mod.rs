//! # Blots
//!
//! Leaf and branch behavior of the tree. There is one branch type; what
//! differs between kinds is the [`Policy`] injected by the schema:
//!
//! - `branch`: child-list dispatch, split, unwrap, legality repair
//! - `container`: adjacent same-kind containers merge
//! - `inline`: canonical nesting of overlapping inline formats
//! - `leaf`: text runs, embeds, breaks
//!
//! Each module adds methods to [`Scroll`], which owns the arena and the
//! host. [`BlotRef`] is the read-only view handed out to callers.

mod branch;
mod container;
mod inline;
mod leaf;

use std::fmt;

use folio_delta::{AttributeMap, Value};

use crate::{
    BlotId, Host, NativeId, Result, Scope, Scroll, TreeError,
    arena::{Arena, Content},
    registry::Registry,
    schema::Policy,
};

/// Content handed to an insertion.
#[derive(Debug, Clone, PartialEq)]
pub enum Insert {
    Text(String),
    /// A blot of `kind` created with `value`, typically an embed.
    Embed { kind: String, value: Value },
}

impl Insert {
    pub fn text(content: impl Into<String>) -> Self {
        Insert::Text(content.into())
    }

    pub fn embed(kind: impl Into<String>, value: Value) -> Self {
        Insert::Embed {
            kind: kind.into(),
            value,
        }
    }
}

/// Null, false, zero and the empty string switch a format off.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Borrowed, read-only view of one blot.
#[derive(Clone, Copy)]
pub struct BlotRef<'a> {
    registry: &'a Registry,
    arena: &'a Arena,
    id: BlotId,
}

impl<'a> BlotRef<'a> {
    pub(crate) fn new(registry: &'a Registry, arena: &'a Arena, id: BlotId) -> Self {
        Self {
            registry,
            arena,
            id,
        }
    }

    fn at(&self, id: BlotId) -> BlotRef<'a> {
        BlotRef::new(self.registry, self.arena, id)
    }

    pub fn id(&self) -> BlotId {
        self.id
    }

    pub fn kind(&self) -> &'a str {
        self.registry.name(self.arena[self.id].kind)
    }

    pub fn scope(&self) -> Scope {
        self.registry.scope(self.arena[self.id].kind)
    }

    /// True if this blot's kind is `ancestor` or extends it.
    pub fn is_a(&self, ancestor: &str) -> bool {
        self.registry
            .kind(ancestor)
            .is_some_and(|a| self.registry.is_a(self.arena[self.id].kind, a))
    }

    pub fn is_leaf(&self) -> bool {
        !self.arena[self.id].is_branch()
    }

    pub fn is_branch(&self) -> bool {
        self.arena[self.id].is_branch()
    }

    pub fn length(&self) -> usize {
        self.arena.length(self.id)
    }

    /// Offset within the parent.
    pub fn offset(&self) -> usize {
        self.arena.offset(self.id)
    }

    pub fn value(&self) -> &'a Value {
        &self.arena[self.id].value
    }

    pub fn text(&self) -> Option<&'a str> {
        match &self.arena[self.id].content {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn attributes(&self) -> &'a AttributeMap {
        &self.arena[self.id].attributes
    }

    /// Formats this blot contributes to its content: `{kind: value}` for
    /// formatting branches, plus per-instance attributes.
    pub fn formats(&self) -> AttributeMap {
        let node = &self.arena[self.id];
        let mut formats = node.attributes.clone();
        if self.registry.formats(node.kind) {
            formats.insert(self.kind().to_string(), node.value.clone());
        }
        formats
    }

    pub fn native(&self) -> NativeId {
        self.arena[self.id].native
    }

    pub fn parent(&self) -> Option<BlotRef<'a>> {
        self.arena[self.id].parent.map(|id| self.at(id))
    }

    pub fn prev(&self) -> Option<BlotRef<'a>> {
        self.arena[self.id].prev.map(|id| self.at(id))
    }

    pub fn next(&self) -> Option<BlotRef<'a>> {
        self.arena[self.id].next.map(|id| self.at(id))
    }

    pub fn children(&self) -> impl Iterator<Item = BlotRef<'a>> + use<'a> {
        let (registry, arena) = (self.registry, self.arena);
        arena
            .children_of(self.id)
            .map(move |id| BlotRef::new(registry, arena, id))
    }
}

impl fmt::Debug for BlotRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlotRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .finish()
    }
}

impl<H: Host> Scroll<H> {
    pub(crate) fn policy_of(&self, id: BlotId) -> Option<Policy> {
        self.registry.policy(self.arena[id].kind)
    }

    pub(crate) fn formats_of(&self, id: BlotId) -> AttributeMap {
        BlotRef::new(&self.registry, &self.arena, id).formats()
    }

    pub(crate) fn insert_into(&mut self, id: BlotId, index: usize, insert: &Insert) -> Result<()> {
        if self.arena[id].is_branch() {
            self.branch_insert(id, index, insert)
        } else {
            self.leaf_insert(id, index, insert)
        }
    }

    pub(crate) fn delete_from(&mut self, id: BlotId, index: usize, length: usize) {
        if self.arena[id].is_branch() {
            self.branch_delete(id, index, length);
        } else {
            self.leaf_delete(id, index, length);
        }
    }

    pub(crate) fn format_range(
        &mut self,
        id: BlotId,
        index: usize,
        length: usize,
        name: &str,
        value: &Value,
    ) {
        if length == 0 {
            return;
        }
        match self.policy_of(id) {
            Some(Policy::Inline) => self.inline_format(id, index, length, name, value),
            Some(_) => self.branch_format(id, index, length, name, value),
            None => self.leaf_format(id, index, length, name, value),
        }
    }

    /// Splits `id` at `index`, returning the blot that now starts there.
    pub(crate) fn split_blot(&mut self, id: BlotId, index: usize, force: bool) -> Result<Option<BlotId>> {
        if self.arena[id].is_branch() {
            self.branch_split(id, index, force)
        } else {
            self.leaf_split(id, index, force)
        }
    }

    /// Splits off `[index, index + length)` of `id` into a blot of its own.
    pub(crate) fn isolate_blot(&mut self, id: BlotId, index: usize, length: usize) -> Result<BlotId> {
        let target = self
            .split_blot(id, index, false)?
            .ok_or(TreeError::PastEnd(id))?;
        self.split_blot(target, length, false)?;
        Ok(target)
    }

    pub(crate) fn optimize_blot(&mut self, id: BlotId) {
        match self.policy_of(id) {
            Some(policy) => {
                if !self.branch_optimize(id) {
                    return;
                }
                match policy {
                    Policy::Generic => {}
                    Policy::Container => self.container_optimize(id),
                    Policy::Inline => self.inline_optimize(id),
                }
            }
            None => self.leaf_optimize(id),
        }
    }
}
