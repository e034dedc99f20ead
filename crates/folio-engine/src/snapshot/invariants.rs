use crate::{BlotId, Host, Scroll, arena::Content};

/// Validates tree invariants.
///
/// Asserts that:
/// - Every child's parent pointer names the branch whose list holds it
/// - `prev`/`next` links are symmetric and `head`/`tail`/`len` match the list
/// - The root length equals the summed content of all leaves
/// - Every blot is bound to its native node, and each branch's native
///   children are its blots' natives in the same order
/// - Every child is allowed by its parent's kind
/// - No blot is unreachable from the root
///
/// # Panics
/// Panics with a descriptive message if any invariant is violated.
pub fn check<H: Host>(scroll: &Scroll<H>) {
    let mut reachable = 0;
    let mut leaf_length = 0;
    check_subtree(scroll, scroll.root, &mut reachable, &mut leaf_length);

    assert_eq!(
        scroll.length(),
        leaf_length,
        "root length does not match summed leaf content"
    );
    assert_eq!(
        reachable,
        scroll.arena.len(),
        "arena holds blots unreachable from the root"
    );
}

fn check_subtree<H: Host>(scroll: &Scroll<H>, id: BlotId, reachable: &mut usize, leaf_length: &mut usize) {
    let arena = &scroll.arena;
    let node = &arena[id];
    *reachable += 1;

    assert_eq!(
        scroll.bindings.get(&node.native),
        Some(&id),
        "blot {id} is not bound to its native node"
    );

    let children = match &node.content {
        Content::Text(text) => {
            *leaf_length += text.chars().count();
            return;
        }
        Content::Embed => {
            *leaf_length += 1;
            return;
        }
        Content::Break => return,
        Content::Branch(children) => children,
    };

    let mut prev = None;
    let mut count = 0;
    let mut natives = Vec::new();
    for child in arena.children_of(id) {
        let child_node = &arena[child];
        assert_eq!(
            child_node.parent,
            Some(id),
            "child {child} is listed under {id} but points to {:?}",
            child_node.parent
        );
        assert_eq!(child_node.prev, prev, "broken prev link at {child}");
        assert!(
            scroll.registry.allows(node.kind, child_node.kind),
            "{} is not allowed under {}",
            scroll.registry.name(child_node.kind),
            scroll.registry.name(node.kind)
        );
        natives.push(child_node.native);
        prev = Some(child);
        count += 1;
        check_subtree(scroll, child, reachable, leaf_length);
    }
    assert_eq!(children.tail, prev, "tail of {id} is not its last child");
    assert_eq!(children.len, count, "child count of {id} is stale");

    let mut host_children = scroll.host.children(node.native);
    if let Some(ui) = children.ui {
        assert_eq!(host_children.first(), Some(&ui), "ui node of {id} is not first");
        host_children.remove(0);
    }
    assert_eq!(host_children, natives, "host children of {id} diverge from the tree");
}
