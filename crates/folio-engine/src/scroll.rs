//! # Scroll
//!
//! The root of a blot tree and the owner of everything around it: the
//! frozen [`Registry`], the node arena, the [`Host`] and the native-node
//! bindings. All index-based editing goes through here; every public
//! mutating call leaves the tree normalized before it returns.

use std::collections::HashMap;

use folio_delta::{AttributeMap, Value};
use tracing::{trace, warn};

use crate::{
    BlotId, Result, TreeError,
    arena::{Arena, Children, Content, Node},
    blot::{BlotRef, Insert},
    host::{Host, Mutation, NativeId, NativeSpec},
    memory_host::MemoryHost,
    registry::{KindId, Registry},
    schema::{Schema, Shape},
};

/// Upper bound on whole-tree normalization passes.
const MAX_OPTIMIZE_PASSES: usize = 100;

/// A blot tree bound to a host surface.
pub struct Scroll<H: Host = MemoryHost> {
    pub(crate) registry: Registry,
    pub(crate) arena: Arena,
    pub(crate) host: H,
    pub(crate) bindings: HashMap<NativeId, BlotId>,
    pub(crate) root: BlotId,
    /// Bumped by every structural change; `optimize` runs until it settles.
    pub(crate) mutations: u64,
}

impl Scroll<MemoryHost> {
    /// A headless scroll backed by a [`MemoryHost`].
    pub fn new(schema: Schema) -> Result<Self> {
        Self::with_host(schema, MemoryHost::new())
    }
}

impl<H: Host> Scroll<H> {
    /// An empty document on `host`. The root's native node is created
    /// through the host and left unattached for the caller to mount.
    pub fn with_host(schema: Schema, mut host: H) -> Result<Self> {
        let registry = schema.build()?;
        let native = host.create(&NativeSpec::new(registry.root_name()));
        let mut scroll = Self::from_parts(registry, host, native);
        scroll.optimize();
        Ok(scroll)
    }

    /// Builds a tree for an existing native subtree rooted at `native`.
    pub fn attach(schema: Schema, host: H, native: NativeId) -> Result<Self> {
        let registry = schema.build()?;
        let spec = host
            .describe(native)
            .ok_or(TreeError::UnknownNative(native))?;
        if registry.kind(&spec.kind) != Some(registry.root()) {
            return Err(TreeError::InvalidValue {
                kind: registry.root_name().to_string(),
                reason: format!("native root describes {:?}", spec.kind),
            });
        }
        let mut scroll = Self::from_parts(registry, host, native);
        scroll.build_children(scroll.root)?;
        scroll.optimize();
        Ok(scroll)
    }

    fn from_parts(registry: Registry, host: H, native: NativeId) -> Self {
        let mut arena = Arena::default();
        let root = arena.insert(Node::new(
            registry.root(),
            Value::Null,
            native,
            Content::Branch(Children::default()),
        ));
        Self {
            registry,
            arena,
            host,
            bindings: HashMap::from([(native, root)]),
            root,
            mutations: 0,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Direct access to the host, e.g. to edit it and then call
    /// [`update`](Self::update) with the resulting mutations.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn root(&self) -> BlotRef<'_> {
        BlotRef::new(&self.registry, &self.arena, self.root)
    }

    pub fn blot(&self, id: BlotId) -> Option<BlotRef<'_>> {
        self.arena
            .contains(id)
            .then(|| BlotRef::new(&self.registry, &self.arena, id))
    }

    /// The blot bound to a native node.
    pub fn find(&self, native: NativeId) -> Option<BlotRef<'_>> {
        self.bindings.get(&native).and_then(|&id| self.blot(id))
    }

    /// Number of live blots, the root included.
    pub fn blot_count(&self) -> usize {
        self.arena.len()
    }

    pub fn length(&self) -> usize {
        self.arena.length(self.root)
    }

    pub(crate) fn check(&self, id: BlotId) -> Result<()> {
        if self.arena.contains(id) {
            Ok(())
        } else {
            Err(TreeError::UnknownBlot(id))
        }
    }

    pub(crate) fn check_branch(&self, id: BlotId) -> Result<()> {
        self.check(id)?;
        if self.arena[id].is_branch() {
            Ok(())
        } else {
            Err(TreeError::NotABranch(id))
        }
    }

    // Primitives. Everything structural funnels through these so the
    // arena, the host and the bindings never drift apart.

    pub(crate) fn create_kind(&mut self, kind: KindId, value: Value) -> BlotId {
        let name = self.registry.name(kind).to_string();
        let (content, value) = match self.registry.info(kind).def.shape {
            Shape::Text => (
                Content::Text(value.as_str().unwrap_or_default().to_string()),
                Value::Null,
            ),
            Shape::Embed => (Content::Embed, value),
            Shape::Break => (Content::Break, Value::Null),
            Shape::Branch { .. } => (Content::Branch(Children::default()), value),
        };
        let spec = NativeSpec {
            kind: name,
            value: value.clone(),
            text: match &content {
                Content::Text(text) => Some(text.clone()),
                _ => None,
            },
            attributes: AttributeMap::new(),
        };
        let native = self.host.create(&spec);
        let id = self.arena.insert(Node::new(kind, value, native, content));
        self.bindings.insert(native, id);
        id
    }

    /// Creates an unattached blot of kind `name`.
    ///
    /// Text kinds take a string value. Fails with
    /// [`TreeError::UnknownKind`] when the schema has no such kind.
    ///
    /// The blot and its native node stay allocated until it is linked with
    /// [`insert_before`](Self::insert_before) or dropped with
    /// [`remove`](Self::remove). `optimize` never visits unlinked blots.
    pub fn create(&mut self, name: &str, value: Value) -> Result<BlotId> {
        let kind = self
            .registry
            .kind(name)
            .ok_or_else(|| TreeError::UnknownKind(name.to_string()))?;
        if self.registry.info(kind).def.shape == Shape::Text && !value.is_string() {
            return Err(TreeError::InvalidValue {
                kind: name.to_string(),
                reason: format!("expected a string, got {value}"),
            });
        }
        Ok(self.create_kind(kind, value))
    }

    pub(crate) fn create_insert(&mut self, insert: &Insert) -> Result<BlotId> {
        match insert {
            Insert::Text(text) => {
                let kind = self
                    .registry
                    .text_kind()
                    .ok_or_else(|| TreeError::UnknownKind("text".into()))?;
                Ok(self.create_kind(kind, Value::String(text.clone())))
            }
            Insert::Embed { kind, value } => self.create(kind, value.clone()),
        }
    }

    /// A childless copy of `id`: same kind, value and attributes.
    pub(crate) fn clone_blot(&mut self, id: BlotId) -> BlotId {
        let (kind, value, attributes) = {
            let node = &self.arena[id];
            (node.kind, node.value.clone(), node.attributes.clone())
        };
        let clone = self.create_kind(kind, value);
        if !attributes.is_empty() {
            self.set_attributes(clone, attributes);
        }
        clone
    }

    /// Moves `child` under `parent`, before `before` or last.
    pub(crate) fn link_before(&mut self, parent: BlotId, child: BlotId, before: Option<BlotId>) {
        if before == Some(child) {
            return;
        }
        debug_assert!(
            !self.is_ancestor(child, parent),
            "moving {child} under its own descendant {parent}"
        );
        self.arena.unlink(child);
        self.arena.link(parent, child, before);
        let parent_native = self.arena[parent].native;
        let child_native = self.arena[child].native;
        let before_native = self.arena[child].next.map(|next| self.arena[next].native);
        self.host
            .insert_before(parent_native, child_native, before_native);
        self.mutations += 1;
    }

    fn is_ancestor(&self, ancestor: BlotId, id: BlotId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.arena.get(node).and_then(|n| n.parent);
        }
        false
    }

    /// Detaches `id` from the tree and the host, and frees its subtree.
    pub(crate) fn remove_blot(&mut self, id: BlotId) {
        let native = self.arena[id].native;
        self.arena.unlink(id);
        self.host.detach(native);
        self.free_subtree(id);
        self.mutations += 1;
    }

    /// Like [`remove_blot`](Self::remove_blot), for blots whose native node
    /// the host already dropped.
    pub(crate) fn forget(&mut self, id: BlotId) {
        self.arena.unlink(id);
        self.free_subtree(id);
        self.mutations += 1;
    }

    /// Frees `id` and its descendants along with their native nodes.
    fn free_subtree(&mut self, id: BlotId) {
        for child in self.arena.child_ids(id) {
            self.free_subtree(child);
        }
        if let Some(node) = self.arena.remove(id) {
            self.bindings.remove(&node.native);
            self.host.destroy(node.native);
        }
    }

    pub(crate) fn set_text(&mut self, id: BlotId, text: String) {
        let native = self.arena[id].native;
        self.host.set_text(native, &text);
        if let Content::Text(current) = &mut self.arena[id].content {
            *current = text;
        }
        self.mutations += 1;
    }

    pub(crate) fn set_value(&mut self, id: BlotId, value: Value) {
        let native = self.arena[id].native;
        self.host.set_value(native, &value);
        self.arena[id].value = value;
        self.mutations += 1;
    }

    pub(crate) fn set_attributes(&mut self, id: BlotId, attributes: AttributeMap) {
        let native = self.arena[id].native;
        self.host.set_attributes(native, &attributes);
        self.arena[id].attributes = attributes;
        self.mutations += 1;
    }

    // Index-based editing.

    /// Inserts `content` at `index`: text when `value` is `None`, otherwise
    /// a blot of kind `content` created with `value`.
    pub fn insert_at(&mut self, index: usize, content: &str, value: Option<Value>) -> Result<()> {
        let insert = match value {
            None => Insert::text(content),
            Some(value) => Insert::embed(content, value),
        };
        self.insert(index, &insert)
    }

    pub fn insert_text(&mut self, index: usize, text: &str) -> Result<()> {
        self.insert(index, &Insert::text(text))
    }

    pub fn insert_embed(&mut self, index: usize, kind: &str, value: Value) -> Result<()> {
        self.insert(index, &Insert::embed(kind, value))
    }

    pub fn insert(&mut self, index: usize, insert: &Insert) -> Result<()> {
        let length = self.length();
        debug_assert!(index <= length, "insert at {index} past length {length}");
        if index >= length {
            self.append(insert)?;
        } else {
            self.insert_into(self.root, index, insert)?;
        }
        self.optimize();
        Ok(())
    }

    /// Inserts at the end of the document: into the last line, or as a new
    /// top-level blot when the content is itself block-level.
    fn append(&mut self, insert: &Insert) -> Result<()> {
        let blot = self.create_insert(insert)?;
        if self.registry.scope(self.arena[blot].kind).is_block() {
            self.link_before(self.root, blot, None);
            return Ok(());
        }
        let mut line = self.root;
        while let Some(last) = self.arena.tail(line)
            && self.arena[last].is_branch()
            && self.registry.scope(self.arena[last].kind).is_block()
        {
            line = last;
        }
        if line == self.root {
            let default = self
                .registry
                .default_child(self.registry.root())
                .ok_or_else(|| {
                    TreeError::InvalidSchema(format!(
                        "root kind {:?} has no default child",
                        self.registry.root_name()
                    ))
                })?;
            line = self.create_kind(default, Value::Null);
            self.link_before(self.root, line, None);
        }
        self.link_before(line, blot, None);
        self.enforce_allowed_children(line);
        Ok(())
    }

    pub fn delete_at(&mut self, index: usize, length: usize) {
        debug_assert!(
            index <= self.length(),
            "delete at {index} past length {}",
            self.length()
        );
        self.delete_from(self.root, index, length);
        self.optimize();
    }

    /// Applies format `name` to `[index, index + length)`. Null or falsy
    /// values remove it.
    pub fn format_at(&mut self, index: usize, length: usize, name: &str, value: Value) -> Result<()> {
        debug_assert!(
            index <= self.length(),
            "format at {index} past length {}",
            self.length()
        );
        match self.registry.kind(name) {
            Some(kind) if !self.registry.formats(kind) => {
                return Err(TreeError::InvalidValue {
                    kind: name.to_string(),
                    reason: "kind is not a format".into(),
                });
            }
            Some(_) => {}
            None if self.registry.attribute(name).is_some() => {}
            None => return Err(TreeError::UnknownKind(name.to_string())),
        }
        self.format_range(self.root, index, length, name, &value);
        self.optimize();
        Ok(())
    }

    /// Blots from the root down to the leaf at `index`, each with the
    /// offset local to it.
    pub fn path(&self, index: usize, inclusive: bool) -> Vec<(BlotRef<'_>, usize)> {
        let mut out = vec![(self.root(), index)];
        let mut current = self.root;
        let mut index = index;
        while let Some((child, offset)) = self.arena.find(current, index, inclusive) {
            out.push((BlotRef::new(&self.registry, &self.arena, child), offset));
            if !self.arena[child].is_branch() {
                break;
            }
            current = child;
            index = offset;
        }
        out
    }

    /// First blot on the path to `index` satisfying `predicate`, with its
    /// local offset.
    pub fn descendant<F>(&self, predicate: F, index: usize) -> Option<(BlotRef<'_>, usize)>
    where
        F: Fn(BlotRef<'_>) -> bool,
    {
        let mut current = self.root;
        let mut index = index;
        loop {
            let (child, offset) = self.arena.find(current, index, false)?;
            let blot = BlotRef::new(&self.registry, &self.arena, child);
            if predicate(blot) {
                return Some((blot, offset));
            }
            if !blot.is_branch() {
                return None;
            }
            current = child;
            index = offset;
        }
    }

    pub fn descendant_of_kind(&self, kind: &str, index: usize) -> Option<(BlotRef<'_>, usize)> {
        self.descendant(|blot| blot.is_a(kind), index)
    }

    /// Every blot overlapping `[index, index + length)` that satisfies
    /// `predicate`, in document order, parents before children.
    pub fn descendants<F>(&self, predicate: F, index: usize, length: usize) -> Vec<BlotRef<'_>>
    where
        F: Fn(BlotRef<'_>) -> bool,
    {
        let mut out = Vec::new();
        self.collect_descendants(self.root, &predicate, index, length, &mut out);
        out
    }

    pub fn descendants_of_kind(&self, kind: &str, index: usize, length: usize) -> Vec<BlotRef<'_>> {
        self.descendants(|blot| blot.is_a(kind), index, length)
    }

    fn collect_descendants<'s, F>(
        &'s self,
        id: BlotId,
        predicate: &F,
        index: usize,
        length: usize,
        out: &mut Vec<BlotRef<'s>>,
    ) where
        F: Fn(BlotRef<'_>) -> bool,
    {
        let mut remaining = length;
        for (child, offset, overlap) in self.arena.window(id, index, length) {
            let blot = BlotRef::new(&self.registry, &self.arena, child);
            if predicate(blot) {
                out.push(blot);
            }
            if blot.is_branch() {
                self.collect_descendants(child, predicate, offset, remaining, out);
            }
            remaining = remaining.saturating_sub(overlap);
        }
    }

    // Structural operations on explicit blots. These do not normalize; call
    // `optimize` when done.

    /// Splits `id` at `index` and returns the blot that starts there.
    ///
    /// Without `force`, splitting at `0` returns `id` and splitting at its
    /// length returns its next sibling; nothing is created. Splitting the
    /// root anywhere else fails with [`TreeError::NoParent`].
    pub fn split(&mut self, id: BlotId, index: usize, force: bool) -> Result<Option<BlotId>> {
        self.check(id)?;
        self.split_blot(id, index, force)
    }

    /// Moves every sibling after `child` into a copy of its parent placed
    /// right after the parent. Returns the copy.
    pub fn split_after(&mut self, child: BlotId) -> Result<BlotId> {
        self.check(child)?;
        let branch = self.arena[child].parent.ok_or(TreeError::NoParent(child))?;
        let grand = self.arena[branch].parent.ok_or(TreeError::NoParent(branch))?;
        Ok(self.split_siblings_after(grand, branch, child))
    }

    /// Hoists the children of `id` into its parent and removes it.
    pub fn unwrap(&mut self, id: BlotId) -> Result<()> {
        self.check(id)?;
        let parent = self.arena[id].parent.ok_or(TreeError::NoParent(id))?;
        self.unwrap_into(parent, id);
        Ok(())
    }

    /// Splits `[index, index + length)` of `id` into a blot of its own.
    pub fn isolate(&mut self, id: BlotId, index: usize, length: usize) -> Result<BlotId> {
        self.check(id)?;
        self.isolate_blot(id, index, length)
    }

    /// Wraps `id` in a new blot of kind `name`, placed where `id` was.
    pub fn wrap(&mut self, id: BlotId, name: &str, value: Value) -> Result<BlotId> {
        self.check(id)?;
        let parent = self.arena[id].parent.ok_or(TreeError::NoParent(id))?;
        let wrapper = self.create(name, value)?;
        if !self.arena[wrapper].is_branch() {
            self.free_subtree(wrapper);
            return Err(TreeError::NotABranch(wrapper));
        }
        self.wrap_with(parent, id, wrapper);
        Ok(wrapper)
    }

    /// Moves every child of `from` into `to`, before `before` or last.
    pub fn move_children(&mut self, from: BlotId, to: BlotId, before: Option<BlotId>) -> Result<()> {
        self.check_branch(from)?;
        self.check_branch(to)?;
        if let Some(before) = before {
            self.check(before)?;
        }
        self.move_children_into(from, to, before);
        Ok(())
    }

    /// Places `child` in `parent` before `before` (or last), moving it if it
    /// is attached elsewhere.
    pub fn insert_before(&mut self, parent: BlotId, child: BlotId, before: Option<BlotId>) -> Result<()> {
        self.check_branch(parent)?;
        self.check(child)?;
        if child == self.root || self.is_ancestor(child, parent) {
            return Err(TreeError::InvalidValue {
                kind: self.registry.name(self.arena[child].kind).to_string(),
                reason: format!("{child} cannot move under {parent}"),
            });
        }
        self.link_before(parent, child, before);
        Ok(())
    }

    /// Removes `id` and its subtree, linked or not. The root cannot be
    /// removed.
    pub fn remove(&mut self, id: BlotId) -> Result<()> {
        self.check(id)?;
        if id == self.root {
            return Err(TreeError::NoParent(id));
        }
        self.remove_blot(id);
        Ok(())
    }

    /// Mounts a host-only native node as the first native child of
    /// `branch`. It never becomes a blot and `optimize` keeps it first.
    pub fn attach_ui(&mut self, branch: BlotId, ui: NativeId) -> Result<()> {
        self.check_branch(branch)?;
        let native = self.arena[branch].native;
        let previous = self.arena[branch]
            .children_mut()
            .and_then(|children| children.ui.replace(ui));
        if let Some(previous) = previous
            && previous != ui
        {
            self.host.detach(previous);
        }
        let first = self.host.children(native).first().copied();
        self.host.insert_before(native, ui, first);
        Ok(())
    }

    /// Applies externally observed host mutations, then normalizes.
    pub fn update(&mut self, mutations: &[Mutation]) -> Result<()> {
        self.reconcile(mutations)?;
        self.optimize();
        Ok(())
    }

    /// Normalizes the whole tree: repeated children-first passes until a
    /// pass changes nothing.
    pub fn optimize(&mut self) {
        for pass in 0..MAX_OPTIMIZE_PASSES {
            let before = self.mutations;
            for id in self.post_order() {
                if self.arena.contains(id) {
                    self.optimize_blot(id);
                }
            }
            let changes = self.mutations - before;
            trace!(pass, changes, "optimize pass");
            if changes == 0 {
                return;
            }
        }
        warn!(
            passes = MAX_OPTIMIZE_PASSES,
            "tree normalization did not settle"
        );
    }

    fn post_order(&self) -> Vec<BlotId> {
        let mut out = Vec::with_capacity(self.arena.len());
        let mut stack = vec![(self.root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            let children = self.arena.child_ids(id);
            stack.extend(children.into_iter().rev().map(|child| (child, false)));
        }
        out
    }
}
