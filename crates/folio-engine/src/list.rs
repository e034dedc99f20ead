//! Ordered sibling lists.
//!
//! Every branch owns a doubly-linked list of children threaded through the
//! arena: the branch keeps `head`/`tail`/`len`, each child keeps
//! `prev`/`next` and its `parent`. Linking and unlinking are O(1) given a
//! neighbor. Offsets are character offsets into the branch's own content.

use crate::arena::{Arena, BlotId, Content};

/// Iterator over a sibling list, starting at some child.
pub(crate) struct Siblings<'a> {
    arena: &'a Arena,
    next: Option<BlotId>,
}

impl Iterator for Siblings<'_> {
    type Item = BlotId;

    fn next(&mut self) -> Option<BlotId> {
        let current = self.next?;
        self.next = self.arena.get(current).and_then(|node| node.next);
        Some(current)
    }
}

impl Arena {
    pub(crate) fn head(&self, parent: BlotId) -> Option<BlotId> {
        self.get(parent)?.children()?.head
    }

    pub(crate) fn tail(&self, parent: BlotId) -> Option<BlotId> {
        self.get(parent)?.children()?.tail
    }

    pub(crate) fn child_count(&self, parent: BlotId) -> usize {
        self.get(parent)
            .and_then(|node| node.children())
            .map_or(0, |children| children.len)
    }

    pub(crate) fn siblings_from(&self, start: Option<BlotId>) -> Siblings<'_> {
        Siblings {
            arena: self,
            next: start,
        }
    }

    pub(crate) fn children_of(&self, parent: BlotId) -> Siblings<'_> {
        self.siblings_from(self.head(parent))
    }

    /// Snapshot of the children, safe to hold across mutation.
    pub(crate) fn child_ids(&self, parent: BlotId) -> Vec<BlotId> {
        self.children_of(parent).collect()
    }

    /// Links an unattached `child` into `parent`, before `before` or last.
    pub(crate) fn link(&mut self, parent: BlotId, child: BlotId, before: Option<BlotId>) {
        debug_assert!(self[child].parent.is_none(), "linking an attached blot");
        let before = before.filter(|&b| self.get(b).is_some_and(|n| n.parent == Some(parent)));
        let prev = match before {
            Some(b) => self[b].prev,
            None => self.tail(parent),
        };

        {
            let node = &mut self[child];
            node.parent = Some(parent);
            node.prev = prev;
            node.next = before;
        }
        match prev {
            Some(p) => self[p].next = Some(child),
            None => {
                if let Some(children) = self[parent].children_mut() {
                    children.head = Some(child);
                }
            }
        }
        match before {
            Some(b) => self[b].prev = Some(child),
            None => {
                if let Some(children) = self[parent].children_mut() {
                    children.tail = Some(child);
                }
            }
        }
        if let Some(children) = self[parent].children_mut() {
            children.len += 1;
        }
    }

    /// Unlinks `child` from its parent's list. Returns the former parent.
    pub(crate) fn unlink(&mut self, child: BlotId) -> Option<BlotId> {
        let (parent, prev, next) = {
            let node = self.get_mut(child)?;
            let parent = node.parent.take()?;
            (parent, node.prev.take(), node.next.take())
        };
        match prev {
            Some(p) => self[p].next = next,
            None => {
                if let Some(children) = self[parent].children_mut() {
                    children.head = next;
                }
            }
        }
        match next {
            Some(n) => self[n].prev = prev,
            None => {
                if let Some(children) = self[parent].children_mut() {
                    children.tail = prev;
                }
            }
        }
        if let Some(children) = self[parent].children_mut() {
            children.len -= 1;
        }
        Some(parent)
    }

    /// Length of a blot: characters for text, one for embeds, zero for
    /// breaks, the sum of the children for branches.
    pub(crate) fn length(&self, id: BlotId) -> usize {
        match self.get(id).map(|node| &node.content) {
            Some(Content::Text(text)) => text.chars().count(),
            Some(Content::Embed) => 1,
            Some(Content::Break) | None => 0,
            Some(Content::Branch(_)) => self.children_of(id).map(|c| self.length(c)).sum(),
        }
    }

    /// Offset of `id` within its parent.
    pub(crate) fn offset(&self, id: BlotId) -> usize {
        let Some(parent) = self.get(id).and_then(|node| node.parent) else {
            return 0;
        };
        self.children_of(parent)
            .take_while(|&c| c != id)
            .map(|c| self.length(c))
            .sum()
    }

    /// Child of `parent` owning `index`, with the offset inside that child.
    ///
    /// At a boundary between two children the later one owns the index,
    /// unless `inclusive` is set: then the earlier one does, provided the
    /// later one is not zero-length.
    pub(crate) fn find(&self, parent: BlotId, index: usize, inclusive: bool) -> Option<(BlotId, usize)> {
        let mut index = index;
        for child in self.children_of(parent) {
            let length = self.length(child);
            let next_nonzero = || match self[child].next {
                Some(next) => self.length(next) != 0,
                None => true,
            };
            if index < length || (inclusive && index == length && next_nonzero()) {
                return Some((child, index));
            }
            index -= length;
        }
        None
    }

    /// Children overlapping `[index, index + length)`, each with the local
    /// offset and the length of the overlap.
    ///
    /// Computed up front, so callers may restructure the visited children.
    pub(crate) fn window(&self, parent: BlotId, index: usize, length: usize) -> Vec<(BlotId, usize, usize)> {
        let mut out = Vec::new();
        if length == 0 {
            return out;
        }
        let Some((start, offset)) = self.find(parent, index, false) else {
            return out;
        };
        let end = index.saturating_add(length);
        let mut position = index - offset;
        for child in self.siblings_from(Some(start)) {
            if position >= end {
                break;
            }
            let child_len = self.length(child);
            if index > position {
                out.push((child, index - position, length.min(position + child_len - index)));
            } else {
                out.push((child, 0, child_len.min(end - position)));
            }
            position += child_len;
        }
        out
    }
}
