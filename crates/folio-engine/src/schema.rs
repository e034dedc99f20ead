//! # Blot schema
//!
//! Declares which blot kinds exist and how they relate. A [`Schema`] is a
//! plain, serializable description that can be extended (for example from a
//! configuration file) and is then frozen into a [`Registry`] when a
//! [`Scroll`](crate::Scroll) is constructed. The registry is never mutated
//! afterwards.
//!
//! Kinds form an `extends` hierarchy. A branch that allows `inline` as a
//! child accepts every kind that extends `inline` (`bold`, `link`, …).

use serde::{Deserialize, Serialize};

use crate::{Result, Scope, registry::Registry};

/// Inline or block level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Inline,
    Block,
}

impl Level {
    fn scope(self) -> Scope {
        match self {
            Level::Inline => Scope::INLINE,
            Level::Block => Scope::BLOCK,
        }
    }
}

/// Normalization policy injected into a branch kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Legality repair and default child only.
    #[default]
    Generic,
    /// Merges into a preceding sibling of the identical kind.
    Container,
    /// Canonical nesting order among overlapping inline formats.
    Inline,
}

/// Structural shape of a blot kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Shape {
    /// A run of text; length is its character count.
    Text,
    /// An atomic object of length one.
    Embed,
    /// A zero-length placeholder that keeps an otherwise empty branch
    /// renderable. It removes itself once it has siblings.
    Break,
    /// A container of child blots.
    Branch {
        /// Kinds (or ancestors of kinds) accepted as direct children.
        #[serde(default)]
        allowed_children: Vec<String>,
        /// Inserted when the branch becomes empty; without one the branch
        /// removes itself instead.
        #[serde(default)]
        default_child: Option<String>,
        #[serde(default)]
        policy: Policy,
        /// Whether the branch represents a format (`{name: value}`).
        #[serde(default)]
        formats: bool,
    },
}

/// Declaration of one blot kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlotDef {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    pub level: Level,
    #[serde(flatten)]
    pub shape: Shape,
}

impl BlotDef {
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, Level::Inline, Shape::Text)
    }

    pub fn embed(name: impl Into<String>, level: Level) -> Self {
        Self::new(name, level, Shape::Embed)
    }

    pub fn line_break(name: impl Into<String>) -> Self {
        Self::new(name, Level::Inline, Shape::Break)
    }

    pub fn branch(name: impl Into<String>, level: Level) -> Self {
        Self::new(
            name,
            level,
            Shape::Branch {
                allowed_children: Vec::new(),
                default_child: None,
                policy: Policy::Generic,
                formats: false,
            },
        )
    }

    fn new(name: impl Into<String>, level: Level, shape: Shape) -> Self {
        Self {
            name: name.into(),
            extends: None,
            level,
            shape,
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// Adds accepted child kinds. No effect on leaf kinds.
    pub fn allow(mut self, kinds: &[&str]) -> Self {
        if let Shape::Branch {
            allowed_children, ..
        } = &mut self.shape
        {
            allowed_children.extend(kinds.iter().map(|k| k.to_string()));
        }
        self
    }

    pub fn default_child(mut self, kind: impl Into<String>) -> Self {
        if let Shape::Branch { default_child, .. } = &mut self.shape {
            *default_child = Some(kind.into());
        }
        self
    }

    pub fn policy(mut self, value: Policy) -> Self {
        if let Shape::Branch { policy, .. } = &mut self.shape {
            *policy = value;
        }
        self
    }

    pub fn formatting(mut self) -> Self {
        if let Shape::Branch { formats, .. } = &mut self.shape {
            *formats = true;
        }
        self
    }

    pub fn scope(&self) -> Scope {
        let kind = match self.shape {
            Shape::Branch { .. } => Scope::BRANCH,
            _ => Scope::LEAF,
        };
        kind | self.level.scope()
    }
}

/// Declaration of an attribute-style format stored on leaf instances
/// (`color`, `font`, …) rather than as a wrapping branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    pub level: Level,
}

impl AttributeDef {
    pub fn inline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: Level::Inline,
        }
    }

    pub fn block(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: Level::Block,
        }
    }
}

/// Inline kinds in nesting order: later entries end up outside earlier ones.
pub const DEFAULT_INLINE_ORDER: &[&str] = &[
    "cursor",
    "inline",
    "link",
    "underline",
    "strike",
    "italic",
    "bold",
    "script",
    "code",
];

const INLINE_CONTENT: &[&str] = &["inline", "embed", "text", "break"];

/// A mutable description of blot kinds, frozen by [`Schema::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Kind of the root blot.
    pub root: String,
    pub blots: Vec<BlotDef>,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    #[serde(default)]
    pub inline_order: Vec<String>,
}

impl Schema {
    /// An empty schema whose root kind still has to be registered.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            blots: Vec::new(),
            attributes: Vec::new(),
            inline_order: Vec::new(),
        }
    }

    /// The rich-text kinds most documents need: paragraphs, headers, lists,
    /// inline formats, text, embeds.
    pub fn standard() -> Self {
        let format = |name: &str| {
            BlotDef::branch(name, Level::Inline)
                .extends("inline")
                .allow(INLINE_CONTENT)
                .policy(Policy::Inline)
                .formatting()
        };

        let mut schema = Self::new("scroll");
        schema.blots = vec![
            BlotDef::branch("scroll", Level::Block)
                .allow(&["block", "block-embed", "container"])
                .default_child("block"),
            BlotDef::branch("container", Level::Block)
                .allow(&["block", "block-embed", "container"])
                .policy(Policy::Container),
            BlotDef::branch("list", Level::Block)
                .extends("container")
                .allow(&["list-item"])
                .policy(Policy::Container),
            BlotDef::branch("block", Level::Block)
                .allow(INLINE_CONTENT)
                .default_child("break"),
            BlotDef::branch("header", Level::Block)
                .extends("block")
                .allow(INLINE_CONTENT)
                .default_child("break")
                .formatting(),
            BlotDef::branch("list-item", Level::Block)
                .extends("block")
                .allow(INLINE_CONTENT)
                .default_child("break")
                .formatting(),
            BlotDef::branch("inline", Level::Inline)
                .allow(INLINE_CONTENT)
                .policy(Policy::Inline),
            format("link"),
            format("underline"),
            format("strike"),
            format("italic"),
            format("bold"),
            format("script"),
            format("code"),
            BlotDef::text("text"),
            BlotDef::line_break("break"),
            BlotDef::embed("embed", Level::Inline),
            BlotDef::embed("image", Level::Inline).extends("embed"),
            BlotDef::embed("formula", Level::Inline).extends("embed"),
            BlotDef::embed("block-embed", Level::Block),
            BlotDef::embed("video", Level::Block).extends("block-embed"),
        ];
        schema.attributes = vec![
            AttributeDef::inline("color"),
            AttributeDef::inline("background"),
            AttributeDef::inline("font"),
            AttributeDef::inline("size"),
            AttributeDef::block("align"),
        ];
        schema.inline_order = DEFAULT_INLINE_ORDER.iter().map(|k| k.to_string()).collect();
        schema
    }

    /// Adds a kind, replacing any existing kind with the same name.
    pub fn register(&mut self, def: BlotDef) -> &mut Self {
        match self.blots.iter_mut().find(|d| d.name == def.name) {
            Some(existing) => *existing = def,
            None => self.blots.push(def),
        }
        self
    }

    /// Adds an attribute, replacing any existing one with the same name.
    pub fn register_attribute(&mut self, def: AttributeDef) -> &mut Self {
        match self.attributes.iter_mut().find(|d| d.name == def.name) {
            Some(existing) => *existing = def,
            None => self.attributes.push(def),
        }
        self
    }

    /// Replaces the inline nesting order table.
    pub fn set_inline_order<I, S>(&mut self, order: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inline_order = order.into_iter().map(Into::into).collect();
        self
    }

    pub fn get(&self, name: &str) -> Option<&BlotDef> {
        self.blots.iter().find(|d| d.name == name)
    }

    /// Validates the schema and freezes it.
    pub fn build(self) -> Result<Registry> {
        Registry::from_schema(self)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_schema_builds() {
        let registry = Schema::standard().build().unwrap();
        assert_eq!(registry.root_name(), "scroll");
    }

    #[test]
    fn register_replaces_by_name() {
        let mut schema = Schema::standard();
        let before = schema.blots.len();
        schema.register(BlotDef::embed("image", Level::Block).extends("block-embed"));
        assert_eq!(schema.blots.len(), before);
        assert_eq!(schema.get("image").unwrap().level, Level::Block);
    }

    #[test]
    fn scope_combines_shape_and_level() {
        assert_eq!(BlotDef::text("text").scope(), Scope::INLINE_LEAF);
        assert_eq!(
            BlotDef::embed("video", Level::Block).scope(),
            Scope::BLOCK_LEAF
        );
        assert_eq!(
            BlotDef::branch("block", Level::Block).scope(),
            Scope::BLOCK_BRANCH
        );
    }

    #[test]
    fn builder_methods_ignore_leaf_shapes() {
        let def = BlotDef::text("text").allow(&["x"]).default_child("y").formatting();
        assert_eq!(def.shape, Shape::Text);
    }

    #[test]
    fn schema_deserializes_from_json() {
        let def: BlotDef = serde_json::from_str(
            r#"{"name": "mention", "extends": "embed", "level": "inline", "shape": "embed"}"#,
        )
        .unwrap();
        assert_eq!(def.shape, Shape::Embed);
        assert_eq!(def.extends.as_deref(), Some("embed"));

        let def: BlotDef = serde_json::from_str(
            r#"{"name": "callout", "level": "block", "shape": "branch",
                "allowed_children": ["block"], "policy": "container"}"#,
        )
        .unwrap();
        assert_eq!(
            def.shape,
            Shape::Branch {
                allowed_children: vec!["block".into()],
                default_child: None,
                policy: Policy::Container,
                formats: false,
            }
        );
    }
}
