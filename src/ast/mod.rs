//! The AST: thin node headers in an append-only arena, typed data pools,
//! precomputed transform hints, and synthetic-node constructors.

pub mod base;
pub mod factory;
pub mod flags;
pub mod node;
pub mod syntax_kind;
pub mod transform_flags;

pub use base::{NodeIndex, NodeList};
pub use flags::{NodeFlags, TempFlags, TransformFlags};
pub use node::{Node, NodeArena, SYNTHETIC_POS, node_is_synthesized};
pub use syntax_kind::SyntaxKind;
pub use transform_flags::compute_transform_flags;
