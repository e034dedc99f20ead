use std::cmp::Ordering;

use folio_delta::Value;
use tracing::debug;

use super::is_truthy;
use crate::{BlotId, Host, Scroll, schema::Policy};

impl<H: Host> Scroll<H> {
    /// Formatting inside an inline branch.
    ///
    /// A format that outranks this branch's kind wraps an isolated copy of
    /// the range, so it lands outside. This branch's own kind replaces or
    /// drops its value on the isolated range. Anything else goes down to
    /// the children.
    pub(super) fn inline_format(
        &mut self,
        id: BlotId,
        index: usize,
        length: usize,
        name: &str,
        value: &Value,
    ) {
        let own = self.registry.name(self.arena[id].kind);
        if own == name {
            let Ok(target) = self.isolate_blot(id, index, length) else {
                return;
            };
            if is_truthy(value) {
                self.set_value(target, value.clone());
            } else if let Some(parent) = self.arena[target].parent {
                self.unwrap_into(parent, target);
            }
            return;
        }

        if let Some(kind) = self.registry.inline_format(name)
            && self.registry.order().compare(own, name) == Ordering::Less
        {
            let Ok(target) = self.isolate_blot(id, index, length) else {
                return;
            };
            if is_truthy(value)
                && let Some(parent) = self.arena[target].parent
            {
                let wrapper = self.create_kind(kind, value.clone());
                self.wrap_with(parent, target, wrapper);
            }
            return;
        }

        self.branch_format(id, index, length, name, value);
    }

    /// Inline normalization, after the generic pass.
    pub(super) fn inline_optimize(&mut self, id: BlotId) {
        let formats = self.formats_of(id);
        if formats.is_empty() {
            if let Some(parent) = self.arena[id].parent {
                self.unwrap_into(parent, id);
            }
            return;
        }

        if let Some(next) = self.arena[id].next
            && self.arena[next].prev == Some(id)
            && self.policy_of(next) == Some(Policy::Inline)
            && self.formats_of(next) == formats
        {
            self.move_children_into(next, id, None);
            self.remove_blot(next);
        }

        let Some(parent) = self.arena[id].parent else {
            return;
        };
        if self.policy_of(parent) != Some(Policy::Inline) {
            return;
        }
        let own = self.registry.name(self.arena[id].kind);
        let outer = self.registry.name(self.arena[parent].kind);
        let length = self.arena.length(id);
        if length == 0 || self.registry.order().compare(own, outer) != Ordering::Greater {
            return;
        }

        debug!(blot = %id, parent = %parent, "lifting inline format above its parent");
        let offset = self.arena.offset(id);
        let Ok(isolated) = self.isolate_blot(parent, offset, length) else {
            return;
        };
        let Some(grand) = self.arena[isolated].parent else {
            return;
        };
        self.move_children_into(id, isolated, None);
        self.wrap_with(grand, isolated, id);
    }
}

#[cfg(test)]
mod tests {
    use crate::{Scroll, schema::Schema, snapshot::outline};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scroll(text: &str) -> Scroll {
        let mut scroll = Scroll::new(Schema::standard()).unwrap();
        scroll.insert_text(0, text).unwrap();
        scroll
    }

    #[test]
    fn higher_ranked_format_nests_outside() {
        let mut scroll = scroll("abc");
        scroll.format_at(0, 3, "italic", json!(true)).unwrap();
        scroll.format_at(1, 1, "bold", json!(true)).unwrap();
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            italic=true
              text "a"
            bold=true
              italic=true
                text "b"
            italic=true
              text "c"
        "#);
    }

    #[test]
    fn nesting_is_independent_of_application_order() {
        let mut first = scroll("abc");
        first.format_at(0, 3, "italic", json!(true)).unwrap();
        first.format_at(0, 3, "bold", json!(true)).unwrap();

        let mut second = scroll("abc");
        second.format_at(0, 3, "bold", json!(true)).unwrap();
        second.format_at(0, 3, "italic", json!(true)).unwrap();

        assert_eq!(outline(&first), outline(&second));
        assert_snapshot!(outline(&first), @r#"
        scroll
          block
            bold=true
              italic=true
                text "abc"
        "#);
    }

    #[test]
    fn own_format_replaces_or_drops_value() {
        let mut scroll = scroll("abcd");
        scroll.format_at(0, 4, "link", json!("https://a.example")).unwrap();
        scroll.format_at(2, 2, "link", json!("https://b.example")).unwrap();
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            link="https://a.example"
              text "ab"
            link="https://b.example"
              text "cd"
        "#);

        scroll.format_at(0, 4, "link", json!(null)).unwrap();
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            text "abcd"
        "#);
    }

    #[test]
    fn equal_neighbours_merge() {
        let mut scroll = scroll("abcd");
        scroll.format_at(0, 2, "bold", json!(true)).unwrap();
        scroll.format_at(2, 2, "bold", json!(true)).unwrap();
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            bold=true
              text "abcd"
        "#);
    }

    #[test]
    fn plain_inline_wrapper_dissolves() {
        let mut scroll = scroll("ab");
        let (text, _) = scroll.descendant_of_kind("text", 0).unwrap();
        let text = text.id();
        scroll.wrap(text, "inline", json!(null)).unwrap();
        scroll.optimize();
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            text "ab"
        "#);
    }
}
