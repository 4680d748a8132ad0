use bitflags::bitflags;

bitflags! {
    /// Flags recorded on declaration/statement nodes by the parser.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u32 {
        const NONE = 0;
        /// `let` variable declaration.
        const LET = 1 << 0;
        /// `const` variable declaration.
        const CONST = 1 << 1;
        /// `using` variable declaration.
        const USING = 1 << 2;
        /// `await using` variable declaration.
        const AWAIT_USING = 1 << 3;
        /// Namespace declared with a dotted name, expanded into nesting.
        const NESTED_NAMESPACE = 1 << 4;
        /// `declare` ambient context.
        const AMBIENT = 1 << 5;
        /// Node or a descendant failed to parse cleanly.
        const THIS_NODE_HAS_ERROR = 1 << 6;
        const THIS_NODE_OR_ANY_SUBNODE_HAS_ERROR = 1 << 7;
        /// Fresh object/array literal written directly at the use site.
        const FRESH_LITERAL = 1 << 8;
        /// Definite-assignment marker (`let x!: T`).
        const DEFINITE_ASSIGNMENT = 1 << 9;
        /// Optional-chain member/index/call access (`?.`).
        const OPTIONAL_CHAIN = 1 << 10;

        const BLOCK_SCOPED = Self::LET.bits() | Self::CONST.bits() | Self::USING.bits() | Self::AWAIT_USING.bits();
        const CONSTANT = Self::CONST.bits() | Self::USING.bits() | Self::AWAIT_USING.bits();
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::NONE
    }
}

bitflags! {
    /// Syntactic modifiers attached to declarations and class members.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModifierFlags: u32 {
        const NONE = 0;
        const PUBLIC = 1 << 0;
        const PRIVATE = 1 << 1;
        const PROTECTED = 1 << 2;
        const READONLY = 1 << 3;
        const OVERRIDE = 1 << 4;
        const EXPORT = 1 << 5;
        const ABSTRACT = 1 << 6;
        const STATIC = 1 << 7;
        const ASYNC = 1 << 8;
        const DEFAULT = 1 << 9;
        const IN = 1 << 10;
        const OUT = 1 << 11;
        const AMBIENT = 1 << 12;

        const ACCESSIBILITY = Self::PUBLIC.bits() | Self::PRIVATE.bits() | Self::PROTECTED.bits();
        const PARAMETER_PROPERTY = Self::ACCESSIBILITY.bits() | Self::READONLY.bits() | Self::OVERRIDE.bits();
    }
}

impl Default for ModifierFlags {
    fn default() -> Self {
        Self::NONE
    }
}

/// Declared variance for a type parameter (spec §3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variance {
    #[default]
    Invariant,
    In,
    Out,
    InOut,
}
