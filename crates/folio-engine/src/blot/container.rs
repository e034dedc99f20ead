use tracing::debug;

use crate::{BlotId, Host, Scroll};

impl<H: Host> Scroll<H> {
    /// Absorbs a directly following container of the same kind.
    pub(super) fn container_optimize(&mut self, id: BlotId) {
        let node = &self.arena[id];
        let Some(next) = node.next else {
            return;
        };
        if self.arena.child_count(id) == 0 || self.arena[next].kind != node.kind {
            return;
        }
        debug!(blot = %id, next = %next, "merging adjacent containers");
        self.move_children_into(next, id, None);
        self.remove_blot(next);
    }
}

#[cfg(test)]
mod tests {
    use crate::{Scroll, schema::Schema, snapshot::outline};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    /// Two lists side by side, built without normalizing in between.
    fn two_lists() -> Scroll {
        let mut scroll = Scroll::new(Schema::standard()).unwrap();
        let root = scroll.root().id();
        for text in ["one", "two"] {
            let list = scroll.create("list", Value::Null).unwrap();
            let item = scroll.create("list-item", Value::Bool(true)).unwrap();
            let leaf = scroll.create("text", Value::String(text.into())).unwrap();
            scroll.insert_before(item, leaf, None).unwrap();
            scroll.insert_before(list, item, None).unwrap();
            scroll.insert_before(root, list, None).unwrap();
        }
        let block = scroll.root().children().next().unwrap().id();
        scroll.remove(block).unwrap();
        scroll
    }

    #[test]
    fn adjacent_lists_merge_in_order() {
        let mut scroll = two_lists();
        assert_eq!(scroll.descendants_of_kind("list", 0, 6).len(), 2);

        scroll.optimize();
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          list
            list-item=true
              text "one"
            list-item=true
              text "two"
        "#);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut scroll = two_lists();
        scroll.optimize();
        let before = outline(&scroll);
        let count = scroll.blot_count();

        scroll.optimize();
        assert_eq!(outline(&scroll), before);
        assert_eq!(scroll.blot_count(), count);
    }
}
