use std::fmt;

use folio_delta::{AttributeMap, Value};
use serde::Serialize;

use crate::{BlotRef, Host, Scroll};

/// Snapshot of a blot subtree for testing with `insta`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snap {
    /// Blot kind name.
    pub kind: String,
    /// Format value of a branch, payload of an embed.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub value: Value,
    /// Content of a text leaf.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "AttributeMap::is_empty")]
    pub attributes: AttributeMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Snap>,
    #[serde(skip)]
    branch: bool,
}

impl Snap {
    fn of(blot: BlotRef<'_>) -> Self {
        Self {
            kind: blot.kind().to_string(),
            value: blot.value().clone(),
            text: blot.text().map(str::to_string),
            attributes: blot.attributes().clone(),
            children: blot.children().map(Snap::of).collect(),
            branch: blot.is_branch(),
        }
    }

    fn write_lines(&self, depth: usize, lines: &mut Vec<String>) {
        let mut line = format!("{:indent$}{}", "", self.kind, indent = depth * 2);
        if let Some(text) = &self.text {
            line.push(' ');
            line.push_str(&Value::String(text.clone()).to_string());
        } else if !self.value.is_null() {
            line.push(if self.branch { '=' } else { ' ' });
            line.push_str(&self.value.to_string());
        }
        if !self.attributes.is_empty() {
            line.push(' ');
            line.push_str(&Value::Object(self.attributes.clone().into_iter().collect()).to_string());
        }
        lines.push(line);
        for child in &self.children {
            child.write_lines(depth + 1, lines);
        }
    }
}

/// One line per blot, children indented under their parent:
///
/// ```text
/// scroll
///   block
///     bold=true
///       text "hello"
/// ```
impl fmt::Display for Snap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        self.write_lines(0, &mut lines);
        f.write_str(&lines.join("\n"))
    }
}

/// Converts the whole tree into a serializable snapshot.
pub fn normalize<H: Host>(scroll: &Scroll<H>) -> Snap {
    Snap::of(scroll.root())
}

/// Indented text rendering of the tree, see [`Snap`]'s `Display`.
pub fn outline<H: Host>(scroll: &Scroll<H>) -> String {
    normalize(scroll).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use insta::assert_snapshot;
    use serde_json::json;

    #[test]
    fn snap_serializes_without_empty_fields() {
        let mut scroll = Scroll::new(Schema::standard()).unwrap();
        scroll.insert_text(0, "hi").unwrap();
        scroll.format_at(0, 2, "bold", json!(true)).unwrap();

        let json = serde_json::to_string(&normalize(&scroll)).unwrap();
        assert_snapshot!(json, @r#"{"kind":"scroll","children":[{"kind":"block","children":[{"kind":"bold","value":true,"children":[{"kind":"text","text":"hi"}]}]}]}"#);
    }

    #[test]
    fn outline_quotes_text_and_prints_attributes() {
        let mut scroll = Scroll::new(Schema::standard()).unwrap();
        scroll.insert_text(0, "say \"hi\"").unwrap();
        scroll.format_at(0, 3, "font", json!("serif")).unwrap();

        assert_snapshot!(outline(&scroll), @r#"
        scroll
          block
            text "say" {"font":"serif"}
            text " \"hi\""
        "#);
    }
}
