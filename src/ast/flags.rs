//! Per-node flag words.
//!
//! `NodeFlags` carries static modifiers and parse facts; `TransformFlags`
//! carries the precomputed hints the down-leveler dispatches on. Both are
//! packed bitsets so the dispatcher's three-way gate stays a pair of mask
//! tests.

use bitflags::bitflags;

bitflags! {
    /// Static modifiers and syntactic facts recorded at parse time.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct NodeFlags: u16 {
        const EXPORT      = 1 << 0;
        const STATIC      = 1 << 1;
        const LET         = 1 << 2;
        const CONST       = 1 << 3;
        const MULTI_LINE  = 1 << 4;
        const SINGLE_LINE = 1 << 5;
        /// Synthesized by an earlier phase rather than written in source
        /// (e.g. the implicit super-call statement of a default constructor).
        const GENERATED   = 1 << 6;

        const BLOCK_SCOPED = Self::LET.bits() | Self::CONST.bits();
    }
}

bitflags! {
    /// Transformation hints, computed bottom-up over the tree.
    ///
    /// Two bits per concern: `X` means this very node must be rewritten,
    /// `CONTAINS_X` means some descendant must be. `CONTAINS_ES6` is monotone
    /// up the tree; the lexical-this bits are cropped at function boundaries
    /// and the spread bit at the consuming call/new/array node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TransformFlags: u32 {
        /// This node is ES2015 syntax and must be rewritten.
        const ES6 = 1 << 0;
        /// Some node in this subtree must be rewritten.
        const CONTAINS_ES6 = 1 << 1;
        /// The subtree mentions `this` lexically (not crossing a non-arrow
        /// function boundary).
        const CONTAINS_LEXICAL_THIS = 1 << 2;
        /// An arrow function below captures the enclosing `this`.
        const CONTAINS_CAPTURED_LEXICAL_THIS = 1 << 3;
        /// A parameter below carries a default initializer.
        const CONTAINS_DEFAULT_VALUE_ASSIGNMENTS = 1 << 4;
        /// A spread element sits directly below (consumed by the containing
        /// call, new, or array literal).
        const CONTAINS_SPREAD_ELEMENT_EXPRESSION = 1 << 5;
        /// A `let`/`const` declaration list sits below.
        const CONTAINS_LET_OR_CONST = 1 << 6;
        /// Marker: the flag pass has visited this node.
        const HAS_COMPUTED_FLAGS = 1 << 31;

        const ES6_SUBTREE = Self::ES6.bits() | Self::CONTAINS_ES6.bits();
    }
}

impl TransformFlags {
    /// The bits a parent aggregates from a child by default. The own-node
    /// `ES6` bit turns into `CONTAINS_ES6` one level up.
    pub fn subtree_flags(self) -> TransformFlags {
        let mut up = self & !(TransformFlags::ES6 | TransformFlags::HAS_COMPUTED_FLAGS);
        if self.contains(TransformFlags::ES6) {
            up |= TransformFlags::CONTAINS_ES6;
        }
        up
    }
}

/// Hint for the temp-variable allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TempFlags {
    /// Any fresh name: `_a` through `_z`, then `_N`.
    Auto,
    /// Prefer the canonical loop counter `_i`.
    LoopCounter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn es6_bit_becomes_contains_bit_upward() {
        let own = TransformFlags::ES6 | TransformFlags::CONTAINS_LEXICAL_THIS;
        let up = own.subtree_flags();
        assert!(up.contains(TransformFlags::CONTAINS_ES6));
        assert!(!up.contains(TransformFlags::ES6));
        assert!(up.contains(TransformFlags::CONTAINS_LEXICAL_THIS));
    }

    #[test]
    fn computed_marker_never_propagates() {
        let up = TransformFlags::HAS_COMPUTED_FLAGS.subtree_flags();
        assert!(up.is_empty());
    }
}
