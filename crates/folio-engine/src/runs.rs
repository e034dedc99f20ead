//! Flattening the tree into formatted runs.
//!
//! Each leaf becomes a run whose attributes are the formats of its inline
//! ancestors composed outside-in, then the leaf's own attributes. Every
//! line ends with a `"\n"` run carrying the formats of the line and its
//! block ancestors. Adjacent text runs with equal attributes are joined.

use folio_delta::{AttributeMap, compose};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{BlotId, Host, Insert, Scroll, arena::Content};

/// A stretch of content with uniform formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub insert: Insert,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AttributeMap>,
}

/// Text as a string, anything else as `{kind: value}`.
impl Serialize for Insert {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Insert::Text(text) => serializer.serialize_str(text),
            Insert::Embed { kind, value } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(kind, value)?;
                map.end()
            }
        }
    }
}

impl<H: Host> Scroll<H> {
    /// The document as formatted runs.
    pub fn runs(&self) -> Vec<Run> {
        let mut runs = Vec::new();
        self.collect_runs(self.root, None, &mut runs);
        runs
    }

    fn collect_runs(&self, id: BlotId, block: Option<AttributeMap>, runs: &mut Vec<Run>) {
        for child in self.arena.children_of(id) {
            let formats = self.formats_of(child);
            let formats = compose(block.as_ref(), Some(&formats), false);
            if self.is_line(child) {
                self.collect_line(child, None, runs);
                push(
                    runs,
                    Run {
                        insert: Insert::text("\n"),
                        attributes: formats,
                    },
                );
            } else if self.arena[child].is_branch() {
                self.collect_runs(child, formats, runs);
            } else {
                self.push_leaf(child, formats, runs);
            }
        }
    }

    fn collect_line(&self, id: BlotId, inline: Option<AttributeMap>, runs: &mut Vec<Run>) {
        for child in self.arena.children_of(id) {
            let formats = self.formats_of(child);
            let formats = compose(inline.as_ref(), Some(&formats), false);
            if self.arena[child].is_branch() {
                self.collect_line(child, formats, runs);
            } else {
                self.push_leaf(child, formats, runs);
            }
        }
    }

    fn push_leaf(&self, id: BlotId, attributes: Option<AttributeMap>, runs: &mut Vec<Run>) {
        let node = &self.arena[id];
        let insert = match &node.content {
            Content::Text(text) => Insert::Text(text.clone()),
            Content::Embed => Insert::Embed {
                kind: self.registry.name(node.kind).to_string(),
                value: node.value.clone(),
            },
            Content::Break | Content::Branch(_) => return,
        };
        push(runs, Run { insert, attributes });
    }
}

fn push(runs: &mut Vec<Run>, run: Run) {
    if let Some(last) = runs.last_mut()
        && last.attributes == run.attributes
        && let (Insert::Text(text), Insert::Text(more)) = (&mut last.insert, &run.insert)
    {
        text.push_str(more);
        return;
    }
    runs.push(run);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn runs_compose_nested_formats() {
        let mut scroll = Scroll::new(Schema::standard()).unwrap();
        scroll.insert_text(0, "abc").unwrap();
        scroll.format_at(0, 3, "italic", json!(true)).unwrap();
        scroll.format_at(1, 1, "bold", json!(true)).unwrap();
        scroll.format_at(2, 1, "color", json!("red")).unwrap();

        let json = serde_json::to_string(&scroll.runs()).unwrap();
        assert_snapshot!(json, @r#"[{"insert":"a","attributes":{"italic":true}},{"insert":"b","attributes":{"bold":true,"italic":true}},{"insert":"c","attributes":{"color":"red","italic":true}},{"insert":"\n"}]"#);
    }

    #[test]
    fn embeds_and_line_formats() {
        let mut scroll = Scroll::new(Schema::standard()).unwrap();
        scroll.insert_text(0, "ab").unwrap();
        scroll.insert_embed(1, "image", json!("i.png")).unwrap();
        scroll.format_at(0, 3, "align", json!("right")).unwrap();

        assert_eq!(
            scroll.runs(),
            vec![
                Run {
                    insert: Insert::text("a"),
                    attributes: None,
                },
                Run {
                    insert: Insert::embed("image", json!("i.png")),
                    attributes: None,
                },
                Run {
                    insert: Insert::text("b"),
                    attributes: None,
                },
                Run {
                    insert: Insert::text("\n"),
                    attributes: Some([("align".to_string(), json!("right"))].into_iter().collect()),
                },
            ]
        );
    }
}
