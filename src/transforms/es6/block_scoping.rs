//! `let`/`const` declaration lists.
//!
//! Lists lower to `var` lists by stripping the block-scoped flags. Two
//! wrinkles keep the semantics:
//!
//! - an uninitialized `let` declared inside a loop body would leak the prior
//!   iteration's value once hoisted, so it receives an explicit `void 0`
//!   initializer (the loop's own `for-in`/`for-of` head binding excepted);
//! - a binding that shadows another hoisted `let`/`const` is renamed at the
//!   declaration site, with reference sites following through the
//!   substitution pipeline.
//!
//! Binding-pattern declarations flatten through the destructuring helper in
//! the same pass.

use super::Es6Transform;
use crate::ast::node::VariableListData;
use crate::ast::{NodeFlags, NodeIndex, SyntaxKind, SYNTHETIC_POS};
use crate::resolver::NodeCheckFlags;
use crate::transformer::accept::NodeVisitor;
use crate::transforms::destructuring_es5::flatten_variable_destructuring;

impl Es6Transform<'_> {
    pub(crate) fn visit_variable_declaration_list(&mut self, node: NodeIndex) -> NodeIndex {
        let Some(header) = self.ctx.arena.get(node).copied() else {
            return node;
        };
        let Some(data) = self.ctx.arena.get_variable_list(&header).cloned() else {
            return node;
        };

        let is_let = header.flags.contains(NodeFlags::LET);
        let in_for_in_of_head = matches!(
            self.ctx
                .parent_node()
                .map(|p| self.ctx.arena.kind(p)),
            Some(SyntaxKind::ForInStatement) | Some(SyntaxKind::ForOfStatement)
        );

        let mut declarations = Vec::with_capacity(data.declarations.len());
        for &decl_idx in &data.declarations {
            let Some(decl) = self
                .ctx
                .arena
                .get(decl_idx)
                .and_then(|n| self.ctx.arena.get_variable_declaration(n))
                .cloned()
            else {
                declarations.push(decl_idx);
                continue;
            };

            if self.ctx.arena.kind(decl.name).is_binding_pattern() {
                let value = self.visit_expression(decl.initializer);
                flatten_variable_destructuring(self, decl.name, value, &mut declarations);
                continue;
            }

            let name = if self.ctx.resolver().is_nested_redeclaration(decl_idx) {
                let generated = self.ctx.get_generated_name_for_node(decl_idx);
                self.ctx.disable_substitution(generated);
                generated
            } else {
                decl.name
            };

            let mut initializer = if decl.initializer.is_some() {
                self.visit_expression(decl.initializer)
            } else {
                NodeIndex::NONE
            };
            if initializer.is_none()
                && is_let
                && !in_for_in_of_head
                && self
                    .ctx
                    .resolver()
                    .node_check_flags(decl_idx)
                    .contains(NodeCheckFlags::BLOCK_SCOPED_BINDING_IN_LOOP)
            {
                initializer = self.ctx.arena.void_zero();
            }

            if name == decl.name && initializer == decl.initializer {
                declarations.push(decl_idx);
            } else {
                let arena = &mut self.ctx.arena;
                let rebuilt = arena.var_declaration(name, initializer);
                arena.set_original(rebuilt, decl_idx);
                declarations.push(rebuilt);
            }
        }

        let rebuilt = self.ctx.arena.alloc_variable_list(
            SyntaxKind::VariableDeclarationList,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            VariableListData {
                declarations: declarations.into_iter().collect(),
            },
        );
        let arena = &mut self.ctx.arena;
        arena.set_span(rebuilt, header.pos, header.end);
        arena.set_flags(rebuilt, header.flags - NodeFlags::BLOCK_SCOPED);
        arena.set_original(rebuilt, node);
        rebuilt
    }

    /// `{x}` to `{x: x}`, cloning the identifier for the value position so
    /// reference-site substitution applies to it independently.
    pub(crate) fn visit_shorthand_property(&mut self, node: NodeIndex) -> NodeIndex {
        let Some(data) = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_shorthand_property(n))
            .cloned()
        else {
            return node;
        };
        let arena = &mut self.ctx.arena;
        let value = arena.clone_identifier(data.name);
        let property = arena.property_assignment(data.name, value);
        arena.set_original(property, node);
        property
    }

    /// `[a, b] = rhs` and `{x} = rhs` outside declaration position.
    pub(crate) fn visit_destructuring_assignment(&mut self, node: NodeIndex) -> NodeIndex {
        let Some(data) = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_binary_expr(n))
            .cloned()
        else {
            return node;
        };
        if data.operator_token != SyntaxKind::EqualsToken
            || !matches!(
                self.ctx.arena.kind(data.left),
                SyntaxKind::ArrayLiteralExpression | SyntaxKind::ObjectLiteralExpression
            )
        {
            return crate::transformer::accept::accept(self, node);
        }
        let need_value = self
            .ctx
            .parent_node()
            .map(|p| self.ctx.arena.kind(p) != SyntaxKind::ExpressionStatement)
            .unwrap_or(true);
        let value = self.visit_expression(data.right);
        let result =
            crate::transforms::destructuring_es5::flatten_destructuring_assignment(
                self, data.left, value, need_value,
            );
        self.ctx.arena.set_original(result, node);
        result
    }
}
