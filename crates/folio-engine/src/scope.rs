use bitflags::bitflags;

bitflags! {
    /// Classification of a blot kind along two axes.
    ///
    /// The low two bits give the type (leaf holds content, branch holds
    /// children); the high two bits give the level (inline or block).
    /// Composite values such as [`Scope::ANY`] or [`Scope::INLINE`] are used
    /// as queries with [`Scope::matches`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Scope: u8 {
        /// Content-bearing node (text run, embed).
        const LEAF = 0b0001;
        /// Child-holding node.
        const BRANCH = 0b0010;
        /// Inline level.
        const INLINE = 0b0100;
        /// Block level.
        const BLOCK = 0b1000;

        const TYPE = Self::LEAF.bits() | Self::BRANCH.bits();
        const LEVEL = Self::INLINE.bits() | Self::BLOCK.bits();

        const INLINE_LEAF = Self::INLINE.bits() | Self::LEAF.bits();
        const INLINE_BRANCH = Self::INLINE.bits() | Self::BRANCH.bits();
        const BLOCK_LEAF = Self::BLOCK.bits() | Self::LEAF.bits();
        const BLOCK_BRANCH = Self::BLOCK.bits() | Self::BRANCH.bits();

        const ANY = Self::TYPE.bits() | Self::LEVEL.bits();
    }
}

impl Scope {
    /// Returns true if this scope satisfies `query` on both axes.
    ///
    /// A query that sets no bit on an axis (e.g. [`Scope::INLINE`] says
    /// nothing about the type) accepts any value on that axis.
    pub fn matches(self, query: Scope) -> bool {
        let kind = query & Scope::TYPE;
        let level = query & Scope::LEVEL;
        (kind.is_empty() || self.intersects(kind)) && (level.is_empty() || self.intersects(level))
    }

    pub fn is_leaf(self) -> bool {
        self.contains(Scope::LEAF)
    }

    pub fn is_branch(self) -> bool {
        self.contains(Scope::BRANCH)
    }

    pub fn is_block(self) -> bool {
        self.contains(Scope::BLOCK)
    }

    pub fn is_inline(self) -> bool {
        self.contains(Scope::INLINE)
    }
}
