//! `for-of` lowering to an index-based `for` loop.
//!
//! ```text
//! for (let x of arr) { log(x); }
//! // for (var _i = 0; _i < arr.length; _i++) { var x = arr[_i]; log(x); }
//!
//! for (let x of f()) { log(x); }
//! // for (var _i = 0, _a = f(); _i < _a.length; _i++) {
//! //     var x = _a[_i]; log(x);
//! // }
//! ```
//!
//! An identifier RHS is read directly; anything else is captured in a temp
//! so it evaluates once. The body is always emitted as a block, with the
//! LHS initialization as its first statement.

use super::Es6Transform;
use crate::ast::node::UnaryExprData;
use crate::ast::{NodeIndex, SyntaxKind, TempFlags, SYNTHETIC_POS};
use crate::transformer::accept::NodeVisitor;
use crate::transforms::destructuring_es5::{
    flatten_destructuring_assignment, flatten_variable_destructuring,
};

impl Es6Transform<'_> {
    pub(crate) fn visit_for_of_statement(&mut self, node: NodeIndex, out: &mut Vec<NodeIndex>) {
        let Some(data) = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_for_in_of(n))
            .cloned()
        else {
            out.push(node);
            return;
        };

        let rhs = self.visit_expression(data.expression);
        let counter = self.ctx.create_temp_variable(TempFlags::LoopCounter);

        let mut head_declarations = Vec::new();
        {
            let arena = &mut self.ctx.arena;
            let zero = arena.numeric_literal("0");
            head_declarations.push(arena.var_declaration(counter, zero));
        }
        let array = if self.ctx.arena.kind(rhs) == SyntaxKind::Identifier {
            rhs
        } else {
            let temp = self.ctx.create_temp_variable(TempFlags::Auto);
            let capture = self.ctx.arena.var_declaration(temp, rhs);
            head_declarations.push(capture);
            temp
        };

        let arena = &mut self.ctx.arena;
        let head = arena.var_declaration_list(head_declarations);
        let length = arena.prop_access(array, "length");
        let condition = arena.binary(counter, SyntaxKind::LessThanToken, length);
        let incrementor = arena.alloc_unary_expr(
            SyntaxKind::PostfixUnaryExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            UnaryExprData {
                operator: SyntaxKind::PlusPlusToken,
                operand: counter,
            },
        );
        let element = arena.elem_access(array, counter);

        let mut body_statements = Vec::new();
        self.emit_loop_binding(data.initializer, element, &mut body_statements);

        if data.statement.is_some() {
            if self.ctx.arena.kind(data.statement) == SyntaxKind::Block {
                let block = self
                    .ctx
                    .arena
                    .get(data.statement)
                    .and_then(|n| self.ctx.arena.get_block(n))
                    .cloned();
                if let Some(block) = block {
                    for &stmt in &block.statements {
                        self.visit_statement(stmt, &mut body_statements);
                    }
                }
            } else {
                self.visit_statement(data.statement, &mut body_statements);
            }
        }

        let arena = &mut self.ctx.arena;
        let body = arena.block(body_statements, true);
        let lowered = arena.for_statement(head, condition, incrementor, body);
        arena.set_original(lowered, node);
        out.push(lowered);
    }

    /// The first body statement binding the current element to the LHS.
    fn emit_loop_binding(
        &mut self,
        initializer: NodeIndex,
        element: NodeIndex,
        out: &mut Vec<NodeIndex>,
    ) {
        match self.ctx.arena.kind(initializer) {
            SyntaxKind::VariableDeclarationList => {
                let declarations = self
                    .ctx
                    .arena
                    .get(initializer)
                    .and_then(|n| self.ctx.arena.get_variable_list(n))
                    .map(|d| d.declarations.clone())
                    .unwrap_or_default();
                match declarations.nodes.first().copied() {
                    None => {
                        // Error-recovery: an empty head still consumes the
                        // element into a discard temp.
                        let temp = self.ctx.create_temp_variable(TempFlags::Auto);
                        let arena = &mut self.ctx.arena;
                        let decl = arena.var_declaration(temp, element);
                        out.push(arena.var_statement(vec![decl]));
                    }
                    Some(decl_idx) => {
                        let decl = self
                            .ctx
                            .arena
                            .get(decl_idx)
                            .and_then(|n| self.ctx.arena.get_variable_declaration(n))
                            .cloned();
                        let Some(decl) = decl else {
                            return;
                        };
                        if self.ctx.arena.kind(decl.name).is_binding_pattern() {
                            let mut declarations = Vec::new();
                            flatten_variable_destructuring(
                                self,
                                decl.name,
                                element,
                                &mut declarations,
                            );
                            if !declarations.is_empty() {
                                let stmt = self.ctx.arena.var_statement(declarations);
                                out.push(stmt);
                            }
                        } else {
                            let arena = &mut self.ctx.arena;
                            let bound = arena.var_declaration(decl.name, element);
                            let stmt = arena.var_statement(vec![bound]);
                            arena.set_original(stmt, decl_idx);
                            out.push(stmt);
                        }
                    }
                }
            }
            SyntaxKind::ArrayLiteralExpression | SyntaxKind::ObjectLiteralExpression => {
                let assignment =
                    flatten_destructuring_assignment(self, initializer, element, false);
                let stmt = self.ctx.arena.expression_statement(assignment);
                out.push(stmt);
            }
            _ => {
                let lhs = self.visit_expression(initializer);
                let arena = &mut self.ctx.arena;
                let assignment = arena.assign(lhs, element);
                out.push(arena.expression_statement(assignment));
            }
        }
    }
}
