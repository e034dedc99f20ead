use folio_delta::{Value, compose};
use tracing::debug;

use super::{Insert, is_truthy};
use crate::{BlotId, Host, Result, Scroll, TreeError, registry::KindId, schema::Level};

impl<H: Host> Scroll<H> {
    pub(super) fn branch_insert(&mut self, id: BlotId, index: usize, insert: &Insert) -> Result<()> {
        match self.arena.find(id, index, false) {
            Some((child, offset)) => self.insert_into(child, offset, insert)?,
            None => {
                let blot = self.create_insert(insert)?;
                self.link_before(id, blot, None);
            }
        }
        if self.arena.contains(id) {
            self.enforce_allowed_children(id);
        }
        Ok(())
    }

    pub(super) fn branch_delete(&mut self, id: BlotId, index: usize, length: usize) {
        if id != self.root && index == 0 && length == self.arena.length(id) {
            self.remove_blot(id);
            return;
        }
        for (child, offset, overlap) in self.arena.window(id, index, length) {
            if self.arena.contains(child) {
                self.delete_from(child, offset, overlap);
            }
        }
        if self.arena.contains(id) {
            self.enforce_allowed_children(id);
        }
    }

    pub(super) fn branch_format(
        &mut self,
        id: BlotId,
        index: usize,
        length: usize,
        name: &str,
        value: &Value,
    ) {
        if self.is_line(id)
            && let Some(def) = self.registry.attribute(name)
            && def.level == Level::Block
        {
            let applied = [(name.to_string(), value.clone())].into_iter().collect();
            let attributes =
                compose(Some(&self.arena[id].attributes), Some(&applied), false).unwrap_or_default();
            self.set_attributes(id, attributes);
            return;
        }
        if id != self.root
            && self.is_line(id)
            && let Some(kind) = self.registry.format_kind(name)
            && self.registry.scope(kind).is_block()
        {
            self.format_line(id, kind, value);
            return;
        }
        for (child, offset, overlap) in self.arena.window(id, index, length) {
            if self.arena.contains(child) {
                self.format_range(child, offset, overlap, name, value);
            }
        }
    }

    /// Block formats act on the whole line: a truthy value turns the line
    /// into `kind` (or updates its value), a falsy one turns a line of that
    /// kind back into the root's default child.
    fn format_line(&mut self, id: BlotId, kind: KindId, value: &Value) {
        let own = self.arena[id].kind;
        if is_truthy(value) {
            if own == kind {
                self.set_value(id, value.clone());
            } else {
                self.replace_kind(id, kind, value.clone());
            }
        } else if own == kind
            && let Some(default) = self.registry.default_child(self.registry.root())
        {
            self.replace_kind(id, default, Value::Null);
        }
    }

    /// Swaps `id` for a new blot of `kind` that takes over its children and
    /// attributes.
    fn replace_kind(&mut self, id: BlotId, kind: KindId, value: Value) {
        let Some(parent) = self.arena[id].parent else {
            return;
        };
        debug!(
            blot = %id,
            kind = self.registry.name(kind),
            "replacing line kind"
        );
        let replacement = self.create_kind(kind, value);
        let attributes = self.arena[id].attributes.clone();
        if !attributes.is_empty() {
            self.set_attributes(replacement, attributes);
        }
        self.link_before(parent, replacement, Some(id));
        self.move_children_into(id, replacement, None);
        self.remove_blot(id);
    }

    /// A block-level branch holding inline content.
    pub(crate) fn is_line(&self, id: BlotId) -> bool {
        let node = &self.arena[id];
        node.is_branch()
            && self.registry.scope(node.kind).is_block()
            && self
                .arena
                .children_of(id)
                .all(|child| !self.registry.scope(self.arena[child].kind).is_block())
    }

    pub(super) fn branch_split(&mut self, id: BlotId, index: usize, force: bool) -> Result<Option<BlotId>> {
        let length = self.arena.length(id);
        if !force {
            if index == 0 {
                return Ok(Some(id));
            }
            if index == length {
                return Ok(self.arena[id].next);
            }
        }
        let parent = self.arena[id].parent.ok_or(TreeError::NoParent(id))?;
        let after = self.clone_blot(id);
        let next = self.arena[id].next;
        self.link_before(parent, after, next);
        for (child, offset, _) in self.arena.window(id, index, length) {
            if let Some(piece) = self.split_blot(child, offset, force)? {
                self.link_before(after, piece, None);
            }
        }
        Ok(Some(after))
    }

    /// Moves the siblings after `child` into a copy of `branch` inserted
    /// after it in `grand`.
    pub(crate) fn split_siblings_after(&mut self, grand: BlotId, branch: BlotId, child: BlotId) -> BlotId {
        let after = self.clone_blot(branch);
        while let Some(next) = self.arena[child].next {
            self.link_before(after, next, None);
        }
        let next = self.arena[branch].next;
        self.link_before(grand, after, next);
        after
    }

    pub(crate) fn unwrap_into(&mut self, parent: BlotId, id: BlotId) {
        let next = self.arena[id].next;
        self.move_children_into(id, parent, next);
        self.remove_blot(id);
    }

    pub(crate) fn move_children_into(&mut self, from: BlotId, to: BlotId, before: Option<BlotId>) {
        for child in self.arena.child_ids(from) {
            self.link_before(to, child, before);
        }
    }

    /// Puts `wrapper` where `id` sits in `parent` and moves `id` into it.
    pub(crate) fn wrap_with(&mut self, parent: BlotId, id: BlotId, wrapper: BlotId) {
        let next = self.arena[id].next;
        self.link_before(parent, wrapper, next);
        self.link_before(wrapper, id, None);
    }

    /// Repairs children the schema does not allow under `id`.
    ///
    /// Each round repairs the first violation: a block-level child is split
    /// out of `id` and hoisted to the parent level (which ends the repair,
    /// since `id` is gone), another branch is unwrapped, a leaf is dropped.
    /// Every round removes a blot, so the loop terminates.
    pub(crate) fn enforce_allowed_children(&mut self, id: BlotId) {
        let kind = self.arena[id].kind;
        loop {
            let Some(child) = self
                .arena
                .children_of(id)
                .find(|&child| !self.registry.allows(kind, self.arena[child].kind))
            else {
                return;
            };
            let child_kind = self.arena[child].kind;
            let scope = self.registry.scope(child_kind);

            if id == self.root
                && scope.is_inline()
                && let Some(default) = self.registry.default_child(kind)
            {
                self.wrap_inline_run(id, child, default);
                continue;
            }

            if scope.is_block()
                && let Some(grand) = self.arena[id].parent
            {
                debug!(
                    parent = %id,
                    child = %child,
                    kind = self.registry.name(child_kind),
                    "hoisting block out of disallowed parent"
                );
                if self.arena[child].next.is_some() {
                    self.split_siblings_after(grand, id, child);
                }
                if let Some(prev) = self.arena[child].prev {
                    self.split_siblings_after(grand, id, prev);
                }
                if let Some(holder) = self.arena[child].parent {
                    self.unwrap_into(grand, holder);
                }
                return;
            }

            if self.arena[child].is_branch() {
                debug!(
                    parent = %id,
                    child = %child,
                    kind = self.registry.name(child_kind),
                    "unwrapping disallowed child"
                );
                self.unwrap_into(id, child);
            } else {
                debug!(
                    parent = %id,
                    child = %child,
                    kind = self.registry.name(child_kind),
                    "removing disallowed child"
                );
                self.remove_blot(child);
            }
        }
    }

    /// Collects the inline run starting at `first` into a fresh default
    /// child of `id`.
    fn wrap_inline_run(&mut self, id: BlotId, first: BlotId, default: KindId) {
        debug!(parent = %id, child = %first, "wrapping stray inline content");
        let wrapper = self.create_kind(default, Value::Null);
        self.link_before(id, wrapper, Some(first));
        let mut cursor = Some(first);
        while let Some(child) = cursor
            && self.registry.scope(self.arena[child].kind).is_inline()
        {
            cursor = self.arena[child].next;
            self.link_before(wrapper, child, None);
        }
    }

    /// Generic normalization. Returns false once `id` has removed itself.
    pub(super) fn branch_optimize(&mut self, id: BlotId) -> bool {
        self.enforce_allowed_children(id);
        if !self.arena.contains(id) {
            return false;
        }
        self.reposition_ui(id);
        if self.arena.child_count(id) == 0 {
            match self.registry.default_child(self.arena[id].kind) {
                Some(default) => {
                    let child = self.create_kind(default, Value::Null);
                    self.link_before(id, child, None);
                }
                None if id != self.root => {
                    debug!(blot = %id, "removing empty branch");
                    self.remove_blot(id);
                    return false;
                }
                None => {}
            }
        }
        true
    }

    fn reposition_ui(&mut self, id: BlotId) {
        let Some(ui) = self.arena[id].children().and_then(|children| children.ui) else {
            return;
        };
        let native = self.arena[id].native;
        let first = self.host.children(native).first().copied();
        if first != Some(ui) {
            self.host.insert_before(native, ui, first);
        }
    }
}
