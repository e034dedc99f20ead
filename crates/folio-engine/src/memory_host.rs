use std::collections::HashMap;

use folio_delta::AttributeMap;
use serde_json::Value;

use crate::host::{Host, Mutation, NativeId, NativeSpec};

#[derive(Debug, Clone)]
struct NativeNode {
    spec: NativeSpec,
    parent: Option<NativeId>,
    children: Vec<NativeId>,
}

/// A headless [`Host`] keeping native nodes in memory.
///
/// Besides serving the tree, it can be edited "from the outside" the way a
/// user edits a DOM. Those methods return the [`Mutation`] an observer
/// would have reported, ready to be passed to
/// [`Scroll::update`](crate::Scroll::update).
#[derive(Debug, Default, Clone)]
pub struct MemoryHost {
    next_id: u64,
    nodes: HashMap<NativeId, NativeNode>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live native nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn spec(&self, node: NativeId) -> Option<&NativeSpec> {
        self.nodes.get(&node).map(|n| &n.spec)
    }

    /// Concatenated character data of the subtree.
    pub fn text_content(&self, node: NativeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NativeId, out: &mut String) {
        let Some(n) = self.nodes.get(&node) else {
            return;
        };
        if let Some(text) = &n.spec.text {
            out.push_str(text);
        }
        for &child in &n.children {
            self.collect_text(child, out);
        }
    }

    fn unlink(&mut self, node: NativeId) -> Option<NativeId> {
        let parent = self.nodes.get_mut(&node)?.parent.take()?;
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|&c| c != node);
        }
        Some(parent)
    }

    /// Appends `child` to `parent`, as an outside edit.
    pub fn append_native(&mut self, parent: NativeId, child: NativeId) -> Mutation {
        self.insert_native(parent, child, None)
    }

    /// Inserts `child` into `parent` before `before`, as an outside edit.
    pub fn insert_native(
        &mut self,
        parent: NativeId,
        child: NativeId,
        before: Option<NativeId>,
    ) -> Mutation {
        self.insert_before(parent, child, before);
        Mutation::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        }
    }

    /// Removes `node` from its parent, as an outside edit.
    pub fn remove_native(&mut self, node: NativeId) -> Option<Mutation> {
        let parent = self.unlink(node)?;
        Some(Mutation::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![node],
        })
    }

    /// Replaces the character data of a text node, as an outside edit.
    pub fn edit_text(&mut self, node: NativeId, text: &str) -> Mutation {
        self.set_text(node, text);
        Mutation::Text { target: node }
    }
}

impl Host for MemoryHost {
    fn create(&mut self, spec: &NativeSpec) -> NativeId {
        let id = NativeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            NativeNode {
                spec: spec.clone(),
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    fn insert_before(&mut self, parent: NativeId, child: NativeId, before: Option<NativeId>) {
        if before == Some(child) || !self.nodes.contains_key(&child) {
            return;
        }
        self.unlink(child);
        let Some(p) = self.nodes.get_mut(&parent) else {
            return;
        };
        let at = before
            .and_then(|b| p.children.iter().position(|&c| c == b))
            .unwrap_or(p.children.len());
        p.children.insert(at, child);
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
    }

    fn detach(&mut self, node: NativeId) {
        self.unlink(node);
    }

    fn destroy(&mut self, node: NativeId) {
        self.unlink(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&id) {
                stack.extend(removed.children);
            }
        }
    }

    fn set_text(&mut self, node: NativeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.spec.text = Some(text.to_string());
        }
    }

    fn set_value(&mut self, node: NativeId, value: &Value) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.spec.value = value.clone();
        }
    }

    fn set_attributes(&mut self, node: NativeId, attributes: &AttributeMap) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.spec.attributes = attributes.clone();
        }
    }

    fn describe(&self, node: NativeId) -> Option<NativeSpec> {
        self.spec(node).cloned()
    }

    fn parent(&self, node: NativeId) -> Option<NativeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn children(&self, node: NativeId) -> Vec<NativeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }
}
