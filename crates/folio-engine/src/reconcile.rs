//! # Host reconciliation
//!
//! Folds externally observed host mutations back into the tree. This is
//! the only path through which structure changes without going through
//! the index-based API: natives removed by the host are forgotten, natives
//! added by the host are adopted (or built) as blots and placed in host
//! order.

use std::collections::{HashMap, HashSet};

use folio_delta::Value;
use tracing::{trace, warn};

use crate::{
    BlotId, Host, Result, Scroll, TreeError,
    arena::{Children, Content, Node},
    host::{Mutation, NativeId},
    schema::Shape,
};

impl<H: Host> Scroll<H> {
    pub(crate) fn reconcile(&mut self, mutations: &[Mutation]) -> Result<()> {
        let mut child_lists: Vec<NativeId> = Vec::new();
        let mut added: HashMap<NativeId, Vec<NativeId>> = HashMap::new();
        let mut removed: HashMap<NativeId, Vec<NativeId>> = HashMap::new();

        for mutation in mutations {
            match mutation {
                Mutation::Text { target } => self.reload_text(*target),
                Mutation::ChildList {
                    target,
                    added: add,
                    removed: remove,
                } => {
                    if !child_lists.contains(target) {
                        child_lists.push(*target);
                    }
                    added.entry(*target).or_default().extend(add);
                    removed.entry(*target).or_default().extend(remove);
                }
            }
        }

        for target in child_lists {
            let Some(&branch) = self.bindings.get(&target) else {
                trace!(native = ?target, "mutation target has no blot");
                continue;
            };
            if !self.arena.contains(branch) || !self.arena[branch].is_branch() {
                continue;
            }
            let removed = removed.remove(&target).unwrap_or_default();
            let added = added.remove(&target).unwrap_or_default();
            self.update_children(branch, &removed, &added)?;
        }
        Ok(())
    }

    fn reload_text(&mut self, native: NativeId) {
        let Some(&id) = self.bindings.get(&native) else {
            return;
        };
        let Some(text) = self.host.describe(native).and_then(|spec| spec.text) else {
            return;
        };
        if let Some(node) = self.arena.get_mut(id)
            && let Content::Text(current) = &mut node.content
            && *current != text
        {
            *current = text;
            self.mutations += 1;
        }
    }

    /// Brings the children of `branch` in line with its native children.
    fn update_children(&mut self, branch: BlotId, removed: &[NativeId], added: &[NativeId]) -> Result<()> {
        let native = self.arena[branch].native;

        for &node in removed {
            if self.host.parent(node).is_some() {
                continue;
            }
            let Some(&blot) = self.bindings.get(&node) else {
                continue;
            };
            if self.arena.get(blot).is_some_and(|n| n.parent.is_none() || n.parent == Some(branch)) {
                self.forget(blot);
            }
        }

        let ui = self.arena[branch].children().and_then(|children| children.ui);
        let order = self.host.children(native);
        let added: HashSet<NativeId> = added.iter().copied().collect();
        // Last first, so every node's native successor is already placed.
        // Successors are read live: building a blot may swap natives out.
        for &node in order.iter().rev() {
            if !added.contains(&node) || Some(node) == ui {
                continue;
            }
            let reference = self
                .native_next_sibling(native, node)
                .and_then(|next| self.bindings.get(&next).copied())
                .filter(|&next| self.arena.get(next).is_some_and(|n| n.parent == Some(branch)));
            let blot = self.make_attached(node)?;
            let placed = &self.arena[blot];
            if placed.parent != Some(branch) || placed.next != reference || placed.next.is_none() {
                self.attach_before(branch, blot, reference);
            }
        }

        self.enforce_allowed_children(branch);
        Ok(())
    }

    fn native_next_sibling(&self, parent: NativeId, node: NativeId) -> Option<NativeId> {
        let children = self.host.children(parent);
        let position = children.iter().position(|&child| child == node)?;
        children.get(position + 1).copied()
    }

    /// Links `child` into `branch` without touching the host, which already
    /// holds the natives in place.
    fn attach_before(&mut self, branch: BlotId, child: BlotId, before: Option<BlotId>) {
        self.arena.unlink(child);
        self.arena.link(branch, child, before);
        self.mutations += 1;
    }

    /// The blot bound to `native`, building one if there is none.
    ///
    /// Natives of unknown kinds are replaced by a plain inline wrapper that
    /// adopts their children.
    fn make_attached(&mut self, native: NativeId) -> Result<BlotId> {
        if let Some(&id) = self.bindings.get(&native)
            && self.arena.contains(id)
        {
            return Ok(id);
        }
        match self.create_from_native(native) {
            Ok(id) => Ok(id),
            Err(err @ (TreeError::UnknownKind(_) | TreeError::UnknownNative(_))) => {
                let Some(plain) = self.registry.plain_inline() else {
                    return Err(err);
                };
                warn!(native = ?native, error = %err, "wrapping unrecognized native content");
                let wrapper = self.create_kind(plain, Value::Null);
                let wrapper_native = self.arena[wrapper].native;
                for child in self.host.children(native) {
                    self.host.insert_before(wrapper_native, child, None);
                }
                if let Some(parent) = self.host.parent(native) {
                    self.host.insert_before(parent, wrapper_native, Some(native));
                }
                self.host.destroy(native);
                self.build_children(wrapper)?;
                Ok(wrapper)
            }
            Err(err) => Err(err),
        }
    }

    /// Builds a blot (and, for branches, its subtree) for an existing native.
    fn create_from_native(&mut self, native: NativeId) -> Result<BlotId> {
        let spec = self
            .host
            .describe(native)
            .ok_or(TreeError::UnknownNative(native))?;
        let kind = self
            .registry
            .kind(&spec.kind)
            .ok_or_else(|| TreeError::UnknownKind(spec.kind.clone()))?;
        let content = match self.registry.info(kind).def.shape {
            Shape::Text => Content::Text(spec.text.unwrap_or_default()),
            Shape::Embed => Content::Embed,
            Shape::Break => Content::Break,
            Shape::Branch { .. } => Content::Branch(Children::default()),
        };
        let mut node = Node::new(kind, spec.value, native, content);
        node.attributes = spec.attributes;
        let id = self.arena.insert(node);
        self.bindings.insert(native, id);
        if self.arena[id].is_branch() {
            self.build_children(id)?;
        }
        Ok(id)
    }

    /// Adopts the native children of `id`, in host order.
    pub(crate) fn build_children(&mut self, id: BlotId) -> Result<()> {
        let native = self.arena[id].native;
        for child in self.host.children(native) {
            match self.make_attached(child) {
                Ok(blot) => self.attach_before(id, blot, None),
                Err(err @ (TreeError::UnknownKind(_) | TreeError::UnknownNative(_))) => {
                    warn!(native = ?child, error = %err, "skipping native child");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Scroll,
        host::{Host, NativeSpec},
        schema::Schema,
        snapshot::outline,
    };
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scroll(text: &str) -> Scroll {
        let mut scroll = Scroll::new(Schema::standard()).unwrap();
        scroll.insert_text(0, text).unwrap();
        scroll
    }

    #[test]
    fn text_mutation_reloads_leaf() {
        let mut scroll = scroll("abc");
        let (leaf, _) = scroll.descendant_of_kind("text", 0).unwrap();
        let native = leaf.native();

        let mutation = scroll.host_mut().edit_text(native, "abXc");
        scroll.update(&[mutation]).unwrap();
        assert_eq!(scroll.length(), 4);
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            text "abXc"
        "#);
    }

    #[test]
    fn removed_natives_are_forgotten() {
        let mut scroll = scroll("ab");
        scroll.insert_embed(1, "image", json!("i.png")).unwrap();
        let (image, _) = scroll.descendant_of_kind("image", 1).unwrap();
        let native = image.native();

        let mutation = scroll.host_mut().remove_native(native).unwrap();
        scroll.update(&[mutation]).unwrap();
        assert!(scroll.find(native).is_none());
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            text "ab"
        "#);
    }

    #[test]
    fn unknown_native_falls_back_to_plain_inline() {
        let mut scroll = scroll("ab");
        let line = scroll.root().children().next().unwrap().native();

        let host = scroll.host_mut();
        let mystery = host.create(&NativeSpec::new("marquee"));
        let inner = host.create(&NativeSpec::text("zz"));
        host.insert_before(mystery, inner, None);
        let mutation = host.append_native(line, mystery);

        scroll.update(&[mutation]).unwrap();
        assert!(scroll.find(mystery).is_none());
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            text "abzz"
        "#);
    }
}
