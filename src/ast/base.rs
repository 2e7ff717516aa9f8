//! Handles into the node arena.
//!
//! `NodeIndex` is the sole way AST nodes refer to one another. It doubles as
//! the stable node id used by side tables (generated names, substitution
//! suppression): a node keeps its index for the lifetime of the arena, and
//! the arena is append-only during a transform.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A handle to a node in a `NodeArena`.
///
/// `NodeIndex::NONE` plays the role of an absent child (no else-branch, no
/// initializer, anonymous function expression, ...).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// The absent-node sentinel.
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub fn new(raw: u32) -> NodeIndex {
        NodeIndex(raw)
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }

    /// Raw index into the arena's node vector.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Debug for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "NodeIndex(NONE)")
        } else {
            write!(f, "NodeIndex({})", self.0)
        }
    }
}

/// An ordered list of child nodes (statements, parameters, arguments, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeList {
    pub nodes: Vec<NodeIndex>,
}

impl NodeList {
    pub fn new(nodes: Vec<NodeIndex>) -> NodeList {
        NodeList { nodes }
    }

    pub fn empty() -> NodeList {
        NodeList { nodes: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeIndex> {
        self.nodes.iter()
    }
}

impl FromIterator<NodeIndex> for NodeList {
    fn from_iter<T: IntoIterator<Item = NodeIndex>>(iter: T) -> Self {
        NodeList {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a NodeIndex;
    type IntoIter = std::slice::Iter<'a, NodeIndex>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_sentinel_round_trip() {
        assert!(NodeIndex::NONE.is_none());
        assert!(!NodeIndex::new(0).is_none());
        assert_eq!(NodeIndex::default(), NodeIndex::NONE);
    }

    #[test]
    fn node_list_from_iterator() {
        let list: NodeList = (0..3).map(NodeIndex::new).collect();
        assert_eq!(list.len(), 3);
        assert_eq!(list.nodes[2], NodeIndex::new(2));
    }
}
