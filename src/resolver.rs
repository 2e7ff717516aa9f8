//! Semantic queries the down-leveler needs from the checker.
//!
//! The transform runs after type checking and consults the checker through
//! this narrow interface: per-node check flags, plus the nested-redeclaration
//! queries that drive `let`/`const` renaming. A table-backed implementation
//! is provided for hosts that precompute the answers (and for tests).

use crate::ast::NodeIndex;
use bitflags::bitflags;
use rustc_hash::{FxHashMap, FxHashSet};

bitflags! {
    /// Lazily computed facts the checker records per node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct NodeCheckFlags: u32 {
        /// The function captures the lexical `this` of its container.
        const CAPTURE_THIS                  = 1 << 0;
        /// The `super` reference is an instance-member access.
        const SUPER_INSTANCE                = 1 << 1;
        /// The `super` reference is a static-member access.
        const SUPER_STATIC                  = 1 << 2;
        /// The binding is a block-scoped binding declared inside a loop.
        const BLOCK_SCOPED_BINDING_IN_LOOP  = 1 << 3;
    }
}

pub trait EmitResolver {
    fn node_check_flags(&self, node: NodeIndex) -> NodeCheckFlags;

    /// For an identifier reference, the shadowing `let`/`const` declaration
    /// it resolves to, when that declaration must be renamed during
    /// down-leveling.
    fn referenced_nested_redeclaration(&self, reference: NodeIndex) -> Option<NodeIndex>;

    /// Whether a declaration shadows a hoisted binding from an enclosing
    /// block and must be renamed.
    fn is_nested_redeclaration(&self, declaration: NodeIndex) -> bool;
}

/// Table-backed resolver. Empty tables give the null answers, which is
/// correct for sources without shadowed block-scoped bindings or `super`.
#[derive(Debug, Default)]
pub struct TableResolver {
    check_flags: FxHashMap<NodeIndex, NodeCheckFlags>,
    nested_redeclarations: FxHashSet<NodeIndex>,
    references: FxHashMap<NodeIndex, NodeIndex>,
}

impl TableResolver {
    pub fn new() -> TableResolver {
        TableResolver::default()
    }

    pub fn set_check_flags(&mut self, node: NodeIndex, flags: NodeCheckFlags) {
        self.check_flags.insert(node, flags);
    }

    pub fn mark_nested_redeclaration(&mut self, declaration: NodeIndex) {
        self.nested_redeclarations.insert(declaration);
    }

    pub fn record_reference(&mut self, reference: NodeIndex, declaration: NodeIndex) {
        self.references.insert(reference, declaration);
    }
}

impl EmitResolver for TableResolver {
    fn node_check_flags(&self, node: NodeIndex) -> NodeCheckFlags {
        self.check_flags.get(&node).copied().unwrap_or_default()
    }

    fn referenced_nested_redeclaration(&self, reference: NodeIndex) -> Option<NodeIndex> {
        let decl = self.references.get(&reference)?;
        self.nested_redeclarations.contains(decl).then_some(*decl)
    }

    fn is_nested_redeclaration(&self, declaration: NodeIndex) -> bool {
        self.nested_redeclarations.contains(&declaration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tables_answer_null() {
        let resolver = TableResolver::new();
        let n = NodeIndex::new(1);
        assert_eq!(resolver.node_check_flags(n), NodeCheckFlags::empty());
        assert!(resolver.referenced_nested_redeclaration(n).is_none());
        assert!(!resolver.is_nested_redeclaration(n));
    }

    #[test]
    fn reference_requires_marked_declaration() {
        let mut resolver = TableResolver::new();
        let reference = NodeIndex::new(1);
        let decl = NodeIndex::new(2);
        resolver.record_reference(reference, decl);
        assert!(resolver.referenced_nested_redeclaration(reference).is_none());
        resolver.mark_nested_redeclaration(decl);
        assert_eq!(
            resolver.referenced_nested_redeclaration(reference),
            Some(decl)
        );
    }
}
