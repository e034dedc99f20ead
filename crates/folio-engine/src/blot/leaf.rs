use folio_delta::{AttributeMap, Value, compose};

use super::{Insert, is_truthy};
use crate::{BlotId, Host, Result, Scroll, TreeError, arena::Content, schema::Level};

/// Byte position of the `index`-th character.
fn byte_index(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map_or(text.len(), |(byte, _)| byte)
}

impl<H: Host> Scroll<H> {
    pub(super) fn leaf_insert(&mut self, id: BlotId, index: usize, insert: &Insert) -> Result<()> {
        if let (Content::Text(current), Insert::Text(added)) = (&self.arena[id].content, insert) {
            let at = byte_index(current, index);
            let mut text = String::with_capacity(current.len() + added.len());
            text.push_str(&current[..at]);
            text.push_str(added);
            text.push_str(&current[at..]);
            self.set_text(id, text);
            return Ok(());
        }
        let parent = self.arena[id].parent.ok_or(TreeError::NoParent(id))?;
        let blot = self.create_insert(insert)?;
        let reference = self.leaf_split(id, index, false)?;
        self.link_before(parent, blot, reference);
        Ok(())
    }

    pub(super) fn leaf_delete(&mut self, id: BlotId, index: usize, length: usize) {
        if let Content::Text(current) = &self.arena[id].content {
            let start = byte_index(current, index);
            let end = byte_index(current, index.saturating_add(length));
            let text = format!("{}{}", &current[..start], &current[end..]);
            self.set_text(id, text);
            return;
        }
        // Embeds and breaks are atomic: any overlap removes them.
        self.remove_blot(id);
    }

    pub(super) fn leaf_format(
        &mut self,
        id: BlotId,
        index: usize,
        length: usize,
        name: &str,
        value: &Value,
    ) {
        if matches!(self.arena[id].content, Content::Break) {
            return;
        }
        let Ok(target) = self.isolate_blot(id, index, length) else {
            return;
        };
        if let Some(kind) = self.registry.format_kind(name) {
            if is_truthy(value) {
                let wrapper = self.create_kind(kind, value.clone());
                if let Some(parent) = self.arena[target].parent {
                    self.wrap_with(parent, target, wrapper);
                }
            }
        } else if self
            .registry
            .attribute(name)
            .is_some_and(|def| def.level == Level::Inline)
        {
            let applied: AttributeMap = [(
                name.to_string(),
                if is_truthy(value) {
                    value.clone()
                } else {
                    Value::Null
                },
            )]
            .into_iter()
            .collect();
            let attributes = compose(Some(&self.arena[target].attributes), Some(&applied), false)
                .unwrap_or_default();
            self.set_attributes(target, attributes);
        }
    }

    pub(super) fn leaf_split(&mut self, id: BlotId, index: usize, force: bool) -> Result<Option<BlotId>> {
        let length = self.arena.length(id);
        if !force {
            if index == 0 {
                return Ok(Some(id));
            }
            if index == length {
                return Ok(self.arena[id].next);
            }
        }
        let Content::Text(current) = &self.arena[id].content else {
            return Ok(if index == 0 { Some(id) } else { self.arena[id].next });
        };
        let parent = self.arena[id].parent.ok_or(TreeError::NoParent(id))?;
        let at = byte_index(current, index);
        let tail = current[at..].to_string();
        let head = current[..at].to_string();
        let kind = self.arena[id].kind;
        let attributes = self.arena[id].attributes.clone();

        self.set_text(id, head);
        let after = self.create_kind(kind, Value::String(tail));
        if !attributes.is_empty() {
            self.set_attributes(after, attributes);
        }
        let next = self.arena[id].next;
        self.link_before(parent, after, next);
        Ok(Some(after))
    }

    pub(super) fn leaf_optimize(&mut self, id: BlotId) {
        let node = &self.arena[id];
        match &node.content {
            Content::Text(text) if text.is_empty() => self.remove_blot(id),
            Content::Text(text) => {
                let Some(next) = node.next else {
                    return;
                };
                let other = &self.arena[next];
                if let Content::Text(following) = &other.content
                    && other.kind == node.kind
                    && other.attributes == node.attributes
                {
                    let merged = format!("{text}{following}");
                    self.remove_blot(next);
                    self.set_text(id, merged);
                }
            }
            Content::Break if node.prev.is_some() || node.next.is_some() => self.remove_blot(id),
            Content::Break | Content::Embed | Content::Branch(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Scroll, schema::Schema, snapshot::outline};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("héllo", 0, 0)]
    #[case("héllo", 2, 3)]
    #[case("héllo", 5, 6)]
    #[case("héllo", 9, 6)]
    fn byte_index_counts_characters(#[case] text: &str, #[case] index: usize, #[case] expected: usize) {
        assert_eq!(byte_index(text, index), expected);
    }

    #[test]
    fn text_edits_are_character_based() {
        let mut scroll = Scroll::new(Schema::standard()).unwrap();
        scroll.insert_text(0, "naïve").unwrap();
        scroll.insert_text(3, "-").unwrap();
        scroll.delete_at(1, 2);
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            text "n-ve"
        "#);
        assert_eq!(scroll.length(), 4);
    }

    #[test]
    fn embed_insert_splits_text() {
        let mut scroll = Scroll::new(Schema::standard()).unwrap();
        scroll.insert_text(0, "abcd").unwrap();
        scroll.insert_embed(2, "formula", json!("x^2")).unwrap();
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            text "ab"
            formula "x^2"
            text "cd"
        "#);

        scroll.delete_at(2, 1);
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            text "abcd"
        "#);
    }

    #[test]
    fn attributes_split_and_merge_with_text() {
        let mut scroll = Scroll::new(Schema::standard()).unwrap();
        scroll.insert_text(0, "abcd").unwrap();
        scroll.format_at(1, 2, "color", json!("red")).unwrap();
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            text "a"
            text "bc" {"color":"red"}
            text "d"
        "#);

        scroll.format_at(0, 4, "color", json!(null)).unwrap();
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            text "abcd"
        "#);
    }

    #[test]
    fn break_yields_to_content() {
        let mut scroll = Scroll::new(Schema::standard()).unwrap();
        assert_snapshot!(outline(&scroll), @r"
        scroll
          block
            break
        ");
        scroll.insert_embed(0, "image", json!("a.png")).unwrap();
        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            image "a.png"
        "#);
    }
}
