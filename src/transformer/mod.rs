//! The transform context.
//!
//! One `TransformContext` lives for exactly one file transform. It owns the
//! arena and every piece of mutable transform state: the lexical-environment
//! stack for hoisted declarations, the temp/generated-name allocator, the
//! traversal stack backing ancestor queries, and the substitution pipeline
//! the emitter consults per reference.
//!
//! Substitution stages are plain `fn(&mut TransformContext, NodeIndex) ->
//! NodeIndex` values run in registration order, so chaining on previously
//! installed hooks is just list traversal.

pub mod accept;

use crate::ast::{NodeArena, NodeIndex, SyntaxKind, TempFlags};
use crate::ast::transform_flags::children_of;
use crate::diagnostics::{Diagnostic, DiagnosticBag};
use crate::options::CompilerOptions;
use crate::resolver::EmitResolver;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

/// One stage of the identifier/this rewrite pipeline.
pub type SubstitutionFn = fn(&mut TransformContext, NodeIndex) -> NodeIndex;

struct LexicalEnvironment {
    hoisted: Vec<NodeIndex>,
}

pub struct TransformContext {
    pub arena: NodeArena,
    options: CompilerOptions,
    resolver: Box<dyn EmitResolver>,
    diagnostics: DiagnosticBag,

    env_stack: Vec<LexicalEnvironment>,

    /// Every identifier spelled in the source file plus every name this
    /// transform has handed out; generated names must miss this set.
    used_names: FxHashSet<String>,
    temp_count: u32,
    generated_names: FxHashMap<NodeIndex, String>,

    expression_substitutions: Vec<SubstitutionFn>,
    binding_substitutions: Vec<SubstitutionFn>,
    no_substitution: FxHashSet<NodeIndex>,

    node_stack: Vec<NodeIndex>,
}

impl TransformContext {
    pub fn new(
        arena: NodeArena,
        options: CompilerOptions,
        resolver: Box<dyn EmitResolver>,
    ) -> TransformContext {
        TransformContext {
            arena,
            options,
            resolver,
            diagnostics: DiagnosticBag::new(),
            env_stack: Vec::new(),
            used_names: FxHashSet::default(),
            temp_count: 0,
            generated_names: FxHashMap::default(),
            expression_substitutions: Vec::new(),
            binding_substitutions: Vec::new(),
            no_substitution: FxHashSet::default(),
            node_stack: Vec::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn resolver(&self) -> &dyn EmitResolver {
        self.resolver.as_ref()
    }

    pub fn diagnostics(&self) -> &DiagnosticBag {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticBag {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Index every identifier under `root` so generated names cannot collide
    /// with source names. Called once before visitation starts.
    pub fn prime_source_names(&mut self, root: NodeIndex) {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            if self.arena.kind(idx) == SyntaxKind::Identifier
                && let Some(text) = self.arena.identifier_text(idx)
            {
                self.used_names.insert(text.to_string());
            }
            stack.extend(children_of(&self.arena, idx));
        }
    }

    // -------------------------------------------------------------------------
    // Lexical environments
    // -------------------------------------------------------------------------

    pub fn start_lexical_environment(&mut self) {
        trace!(depth = self.env_stack.len(), "start lexical environment");
        self.env_stack.push(LexicalEnvironment {
            hoisted: Vec::new(),
        });
    }

    /// Register a `var` for the innermost environment. `name` must be an
    /// identifier node.
    pub fn hoist_variable_declaration(&mut self, name: NodeIndex) {
        let decl = self.arena.var_declaration(name, NodeIndex::NONE);
        match self.env_stack.last_mut() {
            Some(env) => env.hoisted.push(decl),
            None => {
                self.diagnostics.push(Diagnostic::error(
                    "hoistVariableDeclaration outside a lexical environment",
                    "",
                    0,
                    0,
                ));
            }
        }
    }

    /// Close the innermost environment, flushing its hoisted declarations as
    /// a single `var` statement for the top of the block being built.
    pub fn end_lexical_environment(&mut self) -> Option<NodeIndex> {
        trace!(depth = self.env_stack.len(), "end lexical environment");
        let Some(env) = self.env_stack.pop() else {
            debug_assert!(false, "unbalanced lexical environment");
            self.diagnostics.push(Diagnostic::error(
                "endLexicalEnvironment without a matching start",
                "",
                0,
                0,
            ));
            return None;
        };
        if env.hoisted.is_empty() {
            return None;
        }
        Some(self.arena.var_statement(env.hoisted))
    }

    pub fn lexical_environment_depth(&self) -> usize {
        self.env_stack.len()
    }

    // -------------------------------------------------------------------------
    // Name allocation
    // -------------------------------------------------------------------------

    /// Allocate a fresh temp identifier. `Auto` names are unique across the
    /// whole file transform; the `LoopCounter` hint reuses the canonical `_i`.
    pub fn create_temp_variable(&mut self, flags: TempFlags) -> NodeIndex {
        if flags == TempFlags::LoopCounter && !self.used_names.contains("_i") {
            // Reusable by explicit hint only, so not recorded as used.
            return self.arena.identifier("_i");
        }
        let name = loop {
            let candidate = if self.temp_count < 26 {
                format!("_{}", (b'a' + self.temp_count as u8) as char)
            } else {
                format!("_{}", self.temp_count - 25)
            };
            self.temp_count += 1;
            // `_i` belongs to the loop-counter hint, never to `Auto`.
            if candidate != "_i" && !self.used_names.contains(&candidate) {
                break candidate;
            }
        };
        trace!(name = %name, "create temp variable");
        self.used_names.insert(name.clone());
        self.arena.identifier(&name)
    }

    /// The stable generated name for a node, as a fresh identifier node.
    /// Repeated calls agree on the text.
    pub fn get_generated_name_for_node(&mut self, node: NodeIndex) -> NodeIndex {
        if let Some(name) = self.generated_names.get(&node) {
            let name = name.clone();
            let id = self.arena.identifier(&name);
            self.arena.set_original(id, node);
            return id;
        }
        let base = self.name_hint_for(node);
        let mut counter = 1u32;
        let name = loop {
            let candidate = format!("{base}_{counter}");
            if !self.used_names.contains(&candidate) {
                break candidate;
            }
            counter += 1;
        };
        self.used_names.insert(name.clone());
        self.generated_names.insert(node, name.clone());
        let id = self.arena.identifier(&name);
        self.arena.set_original(id, node);
        id
    }

    fn name_hint_for(&self, node: NodeIndex) -> String {
        let named = match self.arena.kind(node) {
            SyntaxKind::Identifier => node,
            SyntaxKind::VariableDeclaration => self
                .arena
                .get(node)
                .and_then(|n| self.arena.get_variable_declaration(n))
                .map(|d| d.name)
                .unwrap_or(NodeIndex::NONE),
            SyntaxKind::FunctionDeclaration
            | SyntaxKind::FunctionExpression
            | SyntaxKind::ClassDeclaration
            | SyntaxKind::ClassExpression => self
                .arena
                .get(node)
                .and_then(|n| match self.arena.kind(node) {
                    SyntaxKind::ClassDeclaration | SyntaxKind::ClassExpression => {
                        self.arena.get_class(n).map(|d| d.name)
                    }
                    _ => self.arena.get_function(n).map(|d| d.name),
                })
                .unwrap_or(NodeIndex::NONE),
            _ => NodeIndex::NONE,
        };
        self.arena
            .identifier_text(named)
            .unwrap_or("_n")
            .to_string()
    }

    // -------------------------------------------------------------------------
    // Traversal stack
    // -------------------------------------------------------------------------

    pub fn push_node(&mut self, node: NodeIndex) {
        self.node_stack.push(node);
    }

    pub fn pop_node(&mut self) {
        self.node_stack.pop();
    }

    /// The node enclosing the one currently on top of the stack.
    pub fn parent_node(&self) -> Option<NodeIndex> {
        let len = self.node_stack.len();
        if len < 2 {
            return None;
        }
        Some(self.node_stack[len - 2])
    }

    /// Nearest strict ancestor (top of stack excluded) matching `predicate`.
    pub fn find_ancestor(
        &self,
        predicate: impl Fn(&NodeArena, NodeIndex) -> bool,
    ) -> Option<NodeIndex> {
        let len = self.node_stack.len();
        if len < 2 {
            return None;
        }
        self.node_stack[..len - 1]
            .iter()
            .rev()
            .copied()
            .find(|&n| predicate(&self.arena, n))
    }

    // -------------------------------------------------------------------------
    // Substitution pipeline
    // -------------------------------------------------------------------------

    pub fn set_expression_substitution(&mut self, stage: SubstitutionFn) {
        self.expression_substitutions.push(stage);
    }

    pub fn set_binding_identifier_substitution(&mut self, stage: SubstitutionFn) {
        self.binding_substitutions.push(stage);
    }

    /// Suppress further substitution for a node id (used for names the
    /// renaming machinery just produced).
    pub fn disable_substitution(&mut self, node: NodeIndex) {
        self.no_substitution.insert(node);
    }

    pub fn is_substitution_disabled(&self, node: NodeIndex) -> bool {
        self.no_substitution.contains(&node)
    }

    /// Run the expression pipeline for a reference site.
    pub fn substitute_expression(&mut self, node: NodeIndex) -> NodeIndex {
        if self.no_substitution.contains(&node) {
            return node;
        }
        let stages = self.expression_substitutions.clone();
        let mut current = node;
        for stage in stages {
            current = stage(self, current);
        }
        current
    }

    /// Run the binding-identifier pipeline for a declaration site.
    pub fn substitute_binding_identifier(&mut self, node: NodeIndex) -> NodeIndex {
        if self.no_substitution.contains(&node) {
            return node;
        }
        let stages = self.binding_substitutions.clone();
        let mut current = node;
        for stage in stages {
            current = stage(self, current);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TempFlags;
    use crate::options::CompilerOptions;
    use crate::resolver::TableResolver;

    fn ctx() -> TransformContext {
        TransformContext::new(
            NodeArena::new(),
            CompilerOptions::es5(),
            Box::new(TableResolver::new()),
        )
    }

    #[test]
    fn environments_pair_and_flush() {
        let mut ctx = ctx();
        ctx.start_lexical_environment();
        assert_eq!(ctx.lexical_environment_depth(), 1);
        let name = ctx.arena.identifier("_a");
        ctx.hoist_variable_declaration(name);
        let flushed = ctx.end_lexical_environment().expect("hoisted var");
        assert_eq!(ctx.arena.kind(flushed), SyntaxKind::VariableStatement);
        assert_eq!(ctx.lexical_environment_depth(), 0);
    }

    #[test]
    fn empty_environment_flushes_nothing() {
        let mut ctx = ctx();
        ctx.start_lexical_environment();
        assert!(ctx.end_lexical_environment().is_none());
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn temp_variables_skip_source_names() {
        let mut ctx = ctx();
        ctx.used_names.insert("_a".to_string());
        let t = ctx.create_temp_variable(TempFlags::Auto);
        assert_eq!(ctx.arena.identifier_text(t), Some("_b"));
    }

    #[test]
    fn auto_temps_never_take_the_loop_counter_name() {
        let mut ctx = ctx();
        for _ in 0..30 {
            let temp = ctx.create_temp_variable(TempFlags::Auto);
            assert_ne!(ctx.arena.identifier_text(temp), Some("_i"));
        }
    }

    #[test]
    fn loop_counter_hint_reuses_i() {
        let mut ctx = ctx();
        let first = ctx.create_temp_variable(TempFlags::LoopCounter);
        let second = ctx.create_temp_variable(TempFlags::LoopCounter);
        assert_eq!(ctx.arena.identifier_text(first), Some("_i"));
        assert_eq!(ctx.arena.identifier_text(second), Some("_i"));
    }

    #[test]
    fn generated_names_are_stable_per_node() {
        let mut ctx = ctx();
        let decl_name = ctx.arena.identifier("x");
        let decl = ctx.arena.var_declaration(decl_name, NodeIndex::NONE);
        ctx.used_names.insert("x_1".to_string());
        let a = ctx.get_generated_name_for_node(decl);
        let b = ctx.get_generated_name_for_node(decl);
        assert_eq!(ctx.arena.identifier_text(a), Some("x_2"));
        assert_eq!(ctx.arena.identifier_text(b), Some("x_2"));
    }

    #[test]
    fn find_ancestor_skips_current_node() {
        let mut ctx = ctx();
        let outer = ctx.arena.identifier("outer");
        let inner = ctx.arena.identifier("inner");
        ctx.push_node(outer);
        ctx.push_node(inner);
        let found = ctx.find_ancestor(|arena, n| arena.identifier_text(n) == Some("outer"));
        assert_eq!(found, Some(outer));
        let not_found = ctx.find_ancestor(|arena, n| arena.identifier_text(n) == Some("inner"));
        assert_eq!(not_found, None);
    }
}
