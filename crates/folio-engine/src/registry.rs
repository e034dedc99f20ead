use std::{cmp::Ordering, collections::HashMap};

use crate::{
    Result, Scope, TreeError,
    schema::{AttributeDef, BlotDef, Level, Policy, Schema, Shape},
};

/// Index of a blot kind inside a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct KindId(usize);

#[cfg(test)]
impl KindId {
    pub(crate) fn for_tests(index: usize) -> Self {
        Self(index)
    }
}

/// Fixed nesting order over inline format kinds.
///
/// Kinds in the table compare by position. Kinds missing from the table sort
/// after every tabled kind and compare lexically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineOrder {
    order: Vec<String>,
}

impl InlineOrder {
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: order.into_iter().map(Into::into).collect(),
        }
    }

    fn position(&self, kind: &str) -> Option<usize> {
        self.order.iter().position(|k| k == kind)
    }

    /// `Greater` means `a` outranks `b` and nests outside it.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match (self.position(a), self.position(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}

#[derive(Debug)]
pub(crate) struct KindInfo {
    pub(crate) def: BlotDef,
    pub(crate) scope: Scope,
    /// The kind itself followed by its `extends` chain.
    pub(crate) lineage: Vec<KindId>,
    pub(crate) allowed: Vec<KindId>,
    pub(crate) default_child: Option<KindId>,
}

/// A validated, frozen [`Schema`].
#[derive(Debug)]
pub struct Registry {
    kinds: Vec<KindInfo>,
    by_name: HashMap<String, KindId>,
    attributes: HashMap<String, AttributeDef>,
    order: InlineOrder,
    root: KindId,
    plain_inline: Option<KindId>,
}

impl Registry {
    pub(crate) fn from_schema(schema: Schema) -> Result<Self> {
        let mut by_name = HashMap::new();
        for (index, def) in schema.blots.iter().enumerate() {
            if by_name.insert(def.name.clone(), KindId(index)).is_some() {
                return Err(TreeError::InvalidSchema(format!(
                    "kind {:?} declared twice",
                    def.name
                )));
            }
        }
        let lookup = |name: &str| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| TreeError::UnknownKind(name.to_string()))
        };

        let mut kinds = Vec::with_capacity(schema.blots.len());
        for (index, def) in schema.blots.iter().enumerate() {
            let mut lineage = vec![KindId(index)];
            let mut current = def;
            while let Some(parent) = &current.extends {
                let parent_id = lookup(parent)?;
                if lineage.contains(&parent_id) {
                    return Err(TreeError::InvalidSchema(format!(
                        "kind {:?} extends itself",
                        def.name
                    )));
                }
                lineage.push(parent_id);
                current = &schema.blots[parent_id.0];
            }

            let (allowed, default_child) = match &def.shape {
                Shape::Branch {
                    allowed_children,
                    default_child,
                    ..
                } => (
                    allowed_children
                        .iter()
                        .map(|name| lookup(name))
                        .collect::<Result<Vec<_>>>()?,
                    default_child.as_deref().map(lookup).transpose()?,
                ),
                _ => (Vec::new(), None),
            };

            kinds.push(KindInfo {
                def: def.clone(),
                scope: def.scope(),
                lineage,
                allowed,
                default_child,
            });
        }

        let root = lookup(&schema.root)?;
        if !kinds[root.0].scope.is_branch() {
            return Err(TreeError::InvalidSchema(format!(
                "root kind {:?} must be a branch",
                schema.root
            )));
        }

        let plain_inline = kinds
            .iter()
            .position(|info| {
                matches!(
                    info.def.shape,
                    Shape::Branch {
                        policy: Policy::Inline,
                        formats: false,
                        ..
                    }
                ) && info.def.level == Level::Inline
            })
            .map(KindId);

        let attributes = schema
            .attributes
            .into_iter()
            .map(|def| (def.name.clone(), def))
            .collect();

        Ok(Self {
            kinds,
            by_name,
            attributes,
            order: InlineOrder::new(schema.inline_order),
            root,
            plain_inline,
        })
    }

    pub(crate) fn info(&self, kind: KindId) -> &KindInfo {
        &self.kinds[kind.0]
    }

    pub(crate) fn kind(&self, name: &str) -> Option<KindId> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn root(&self) -> KindId {
        self.root
    }

    pub(crate) fn plain_inline(&self) -> Option<KindId> {
        self.plain_inline
    }

    pub(crate) fn name(&self, kind: KindId) -> &str {
        &self.info(kind).def.name
    }

    pub(crate) fn scope(&self, kind: KindId) -> Scope {
        self.info(kind).scope
    }

    pub(crate) fn policy(&self, kind: KindId) -> Option<Policy> {
        match self.info(kind).def.shape {
            Shape::Branch { policy, .. } => Some(policy),
            _ => None,
        }
    }

    pub(crate) fn formats(&self, kind: KindId) -> bool {
        matches!(self.info(kind).def.shape, Shape::Branch { formats: true, .. })
    }

    /// True if `kind` is `ancestor` or extends it, directly or not.
    pub(crate) fn is_a(&self, kind: KindId, ancestor: KindId) -> bool {
        self.info(kind).lineage.contains(&ancestor)
    }

    pub(crate) fn allows(&self, parent: KindId, child: KindId) -> bool {
        self.info(parent)
            .allowed
            .iter()
            .any(|&allowed| self.is_a(child, allowed))
    }

    /// Looks up a kind by name, restricted to kinds matching `scope`.
    pub(crate) fn query(&self, name: &str, scope: Scope) -> Option<KindId> {
        self.kind(name)
            .filter(|&kind| self.scope(kind).matches(scope))
    }

    /// A kind that can wrap inline content as a format.
    pub(crate) fn inline_format(&self, name: &str) -> Option<KindId> {
        self.query(name, Scope::INLINE_BRANCH)
            .filter(|&kind| self.formats(kind))
    }

    /// Any kind that wraps content as a format, inline or block.
    pub(crate) fn format_kind(&self, name: &str) -> Option<KindId> {
        self.kind(name).filter(|&kind| self.formats(kind))
    }

    pub(crate) fn default_child(&self, kind: KindId) -> Option<KindId> {
        self.info(kind).default_child
    }

    /// The kind created for plain inserted text.
    pub(crate) fn text_kind(&self) -> Option<KindId> {
        self.kind("text")
            .filter(|&kind| self.info(kind).def.shape == Shape::Text)
            .or_else(|| {
                self.kinds
                    .iter()
                    .position(|info| info.def.shape == Shape::Text)
                    .map(KindId)
            })
    }

    pub fn root_name(&self) -> &str {
        self.name(self.root)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.get(name)
    }

    pub fn order(&self) -> &InlineOrder {
        &self.order
    }

    /// Resolves `kind` against the `extends` hierarchy by name.
    pub fn kind_is_a(&self, kind: &str, ancestor: &str) -> bool {
        match (self.kind(kind), self.kind(ancestor)) {
            (Some(kind), Some(ancestor)) => self.is_a(kind, ancestor),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn standard() -> Registry {
        Schema::standard().build().unwrap()
    }

    #[rstest]
    #[case("bold", "italic", Ordering::Greater)]
    #[case("cursor", "code", Ordering::Less)]
    #[case("link", "link", Ordering::Equal)]
    #[case("mention", "code", Ordering::Greater)]
    #[case("code", "mention", Ordering::Less)]
    #[case("alpha", "beta", Ordering::Less)]
    #[case("beta", "alpha", Ordering::Greater)]
    fn inline_order_compare(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(standard().order().compare(a, b), expected);
    }

    #[test]
    fn extends_chain_drives_membership() {
        let registry = standard();
        assert!(registry.kind_is_a("bold", "inline"));
        assert!(registry.kind_is_a("video", "block-embed"));
        assert!(registry.kind_is_a("list", "container"));
        assert!(!registry.kind_is_a("inline", "bold"));

        let block = registry.kind("block").unwrap();
        let bold = registry.kind("bold").unwrap();
        let video = registry.kind("video").unwrap();
        assert!(registry.allows(block, bold));
        assert!(!registry.allows(block, video));
    }

    #[test]
    fn plain_inline_is_the_unformatted_wrapper() {
        let registry = standard();
        assert_eq!(registry.plain_inline(), registry.kind("inline"));
    }

    #[test]
    fn unknown_reference_fails_build() {
        let mut schema = Schema::standard();
        schema.register(BlotDef::branch("aside", Level::Block).allow(&["nope"]));
        assert_eq!(
            schema.build().unwrap_err(),
            TreeError::UnknownKind("nope".into())
        );
    }

    #[test]
    fn extends_cycle_fails_build() {
        let mut schema = Schema::standard();
        schema.register(BlotDef::embed("a", Level::Inline).extends("b"));
        schema.register(BlotDef::embed("b", Level::Inline).extends("a"));
        assert!(matches!(
            schema.build().unwrap_err(),
            TreeError::InvalidSchema(_)
        ));
    }

    #[test]
    fn leaf_root_fails_build() {
        let mut schema = Schema::standard();
        schema.root = "text".into();
        assert!(matches!(
            schema.build().unwrap_err(),
            TreeError::InvalidSchema(_)
        ));
    }

    #[test]
    fn query_filters_by_scope() {
        let registry = standard();
        assert!(registry.query("bold", Scope::INLINE).is_some());
        assert!(registry.query("bold", Scope::BLOCK).is_none());
        assert!(registry.inline_format("bold").is_some());
        assert!(registry.inline_format("inline").is_none());
        assert!(registry.inline_format("text").is_none());
    }
}
