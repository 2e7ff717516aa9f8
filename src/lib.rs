//! ES2015-to-ES5 down-leveling over TypeScript/JavaScript ASTs.
//!
//! Given a parsed and type-checked source file whose tree may contain
//! ES2015 constructs, [`transform_source_file`] produces a semantically
//! equivalent tree using only ES5 syntax, ready for a printer. The input is
//! never mutated; unchanged subtrees are shared by reference between input
//! and output, and the whole pass is O(touched nodes) thanks to the
//! `TransformFlags` precomputed per node.
//!
//! # Example
//!
//! ```ignore
//! let mut arena = NodeArena::new();
//! let file = /* built by the parser */;
//! compute_transform_flags(&mut arena, file);
//! let mut ctx = TransformContext::new(arena, CompilerOptions::es5(), resolver);
//! let lowered = transform_source_file(&mut ctx, file);
//! // hand `lowered` (and ctx's substitution hooks) to the emitter
//! ```

pub mod ast;
pub mod diagnostics;
pub mod options;
pub mod resolver;
pub mod source_file;
pub mod span;
pub mod transformer;
pub mod transforms;

#[cfg(test)]
pub(crate) mod testing;

pub use ast::{
    NodeArena, NodeFlags, NodeIndex, NodeList, SyntaxKind, TempFlags, TransformFlags,
    compute_transform_flags,
};
pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticSeverity};
pub use options::{CompilerOptions, ScriptTarget};
pub use resolver::{EmitResolver, NodeCheckFlags, TableResolver};
pub use source_file::SourceFile;
pub use transformer::TransformContext;
pub use transforms::es6::transform_source_file;
