//! Function-like lowering: arrows, default parameters, rest parameters,
//! binding-pattern parameters, and captured `this`.
//!
//! ```text
//! function f(a, b = 1, ...rest) { return rest.length; }
//! // function f(a, b) {
//! //     if (b === void 0) { b = 1; }
//! //     var rest = [];
//! //     for (var _i = 2; _i < arguments.length; _i++) {
//! //         rest[_i - 2] = arguments[_i];
//! //     }
//! //     return rest.length;
//! // }
//! ```

use super::Es6Transform;
use crate::ast::node::{FunctionData, UnaryExprData};
use crate::ast::{NodeIndex, NodeList, SyntaxKind, TempFlags, TransformFlags, SYNTHETIC_POS};
use crate::transformer::accept::NodeVisitor;
use crate::transforms::destructuring_es5::flatten_variable_destructuring;

impl Es6Transform<'_> {
    /// Arrow function to function expression. The arrow never gets its own
    /// `var _this = this;`: it borrows the capture of its enclosing function.
    pub(crate) fn visit_arrow_function(&mut self, node: NodeIndex) -> NodeIndex {
        let (parameters, body) = self.lower_function_like(node, false);
        let result = self.ctx.arena.alloc_function(
            SyntaxKind::FunctionExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            FunctionData {
                name: NodeIndex::NONE,
                parameters,
                body,
            },
        );
        self.ctx.arena.set_original(result, node);
        result
    }

    pub(crate) fn visit_function_expression(&mut self, node: NodeIndex) -> NodeIndex {
        self.lower_plain_function(node, SyntaxKind::FunctionExpression)
    }

    pub(crate) fn visit_function_declaration(&mut self, node: NodeIndex) -> NodeIndex {
        self.lower_plain_function(node, SyntaxKind::FunctionDeclaration)
    }

    fn lower_plain_function(&mut self, node: NodeIndex, kind: SyntaxKind) -> NodeIndex {
        let emit_this = self
            .ctx
            .arena
            .get(node)
            .map(|n| {
                n.transform_flags
                    .contains(TransformFlags::CONTAINS_CAPTURED_LEXICAL_THIS)
            })
            .unwrap_or(false);
        let name = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_function(n))
            .map(|d| d.name)
            .unwrap_or(NodeIndex::NONE);
        let flags = self.ctx.arena.get(node).map(|n| n.flags).unwrap_or_default();
        let (parameters, body) = self.lower_function_like(node, emit_this);
        let result = self.ctx.arena.alloc_function(
            kind,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            FunctionData {
                name,
                parameters,
                body,
            },
        );
        self.ctx.arena.set_flags(result, flags);
        self.ctx.arena.set_original(result, node);
        result
    }

    /// Accessors keep their kind (get/set syntax is ES5 in object literals);
    /// only the parameter list and body are lowered.
    pub(crate) fn visit_accessor(&mut self, node: NodeIndex) -> NodeIndex {
        let Some(header) = self.ctx.arena.get(node).copied() else {
            return node;
        };
        let name = self
            .ctx
            .arena
            .get_function(&header)
            .map(|d| d.name)
            .unwrap_or(NodeIndex::NONE);
        let emit_this = header
            .transform_flags
            .contains(TransformFlags::CONTAINS_CAPTURED_LEXICAL_THIS);
        let (parameters, body) = self.lower_function_like(node, emit_this);
        let result = self.ctx.arena.alloc_function(
            header.kind,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            FunctionData {
                name,
                parameters,
                body,
            },
        );
        self.ctx.arena.set_flags(result, header.flags);
        self.ctx.arena.set_original(result, node);
        result
    }

    /// A concise method outside a class: `{ m() {} }` to `{ m: function () {} }`.
    pub(crate) fn visit_object_literal_method(&mut self, node: NodeIndex) -> NodeIndex {
        let name = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_function(n))
            .map(|d| d.name)
            .unwrap_or(NodeIndex::NONE);
        let func = self.method_to_function_expression(node);
        let property = self.ctx.arena.property_assignment(name, func);
        self.ctx.arena.set_original(property, node);
        property
    }

    /// Lower a method, accessor, or constructor member into an anonymous
    /// function expression (used by both class and object-literal lowering).
    pub(crate) fn method_to_function_expression(&mut self, member: NodeIndex) -> NodeIndex {
        let emit_this = self
            .ctx
            .arena
            .get(member)
            .map(|n| {
                n.transform_flags
                    .contains(TransformFlags::CONTAINS_CAPTURED_LEXICAL_THIS)
            })
            .unwrap_or(false);
        let (parameters, body) = self.lower_function_like(member, emit_this);
        let result = self.ctx.arena.alloc_function(
            SyntaxKind::FunctionExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            FunctionData {
                name: NodeIndex::NONE,
                parameters,
                body,
            },
        );
        self.ctx.arena.set_original(result, member);
        result
    }

    /// Shared body assembly for every function-like node, in order: bracket a
    /// lexical environment, capture `this` if needed, parameter preludes
    /// (defaults, pattern flattening, rest), the visited body, then the
    /// environment's hoisted declarations at the top of the block.
    pub(crate) fn lower_function_like(
        &mut self,
        node: NodeIndex,
        emit_this: bool,
    ) -> (NodeList, NodeIndex) {
        let Some(data) = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_function(n))
            .cloned()
        else {
            return (NodeList::empty(), NodeIndex::NONE);
        };

        let was_in_derived_constructor = self.in_derived_constructor;
        if self.ctx.arena.kind(node) != SyntaxKind::Constructor {
            self.in_derived_constructor = false;
        }

        self.ctx.start_lexical_environment();
        let mut statements = Vec::new();
        if emit_this {
            let capture = self.captured_this_statement();
            statements.push(capture);
        }
        let parameters = self.lower_parameters(&data.parameters, &mut statements);

        let mut multi_line = true;
        if data.body.is_some() {
            if self.ctx.arena.kind(data.body) == SyntaxKind::Block {
                let block = self
                    .ctx
                    .arena
                    .get(data.body)
                    .and_then(|n| self.ctx.arena.get_block(n))
                    .cloned();
                if let Some(block) = block {
                    multi_line = block.multi_line;
                    for &stmt in &block.statements {
                        self.visit_statement(stmt, &mut statements);
                    }
                }
            } else {
                // Concise arrow body: wrap the visited expression in a return.
                let expression = self.visit_expression(data.body);
                let ret = self.ctx.arena.return_statement(expression);
                statements.push(ret);
                multi_line = false;
            }
        }

        let insert_at = usize::from(emit_this);
        if let Some(hoisted) = self.ctx.end_lexical_environment() {
            statements.insert(insert_at.min(statements.len()), hoisted);
        }
        self.in_derived_constructor = was_in_derived_constructor;

        let multi_line = multi_line || statements.len() > 1;
        let body = self.ctx.arena.block(statements, multi_line);
        (parameters, body)
    }

    /// Rewrite the parameter list, appending the prelude statements each
    /// parameter needs: pattern parameters read a fresh temp, defaulted
    /// parameters get a `=== void 0` guard, the rest parameter is collected
    /// from `arguments` and elided from the list.
    fn lower_parameters(
        &mut self,
        parameters: &NodeList,
        statements: &mut Vec<NodeIndex>,
    ) -> NodeList {
        let mut lowered = Vec::with_capacity(parameters.len());
        let count = parameters.len();
        for (index, &param_idx) in parameters.iter().enumerate() {
            let Some(param) = self
                .ctx
                .arena
                .get(param_idx)
                .and_then(|n| self.ctx.arena.get_parameter(n))
                .cloned()
            else {
                lowered.push(param_idx);
                continue;
            };

            if param.dot_dot_dot_token && index == count - 1 {
                self.emit_rest_parameter(param.name, index, statements);
                continue;
            }

            if self.ctx.arena.kind(param.name).is_binding_pattern() {
                let temp = self.ctx.create_temp_variable(TempFlags::Auto);
                lowered.push(self.ctx.arena.parameter(temp));
                // For an empty pattern the guard alone evaluates the
                // initializer for its side effects.
                if param.initializer.is_some() {
                    let initializer = self.visit_expression(param.initializer);
                    let guard = self.default_value_assignment(temp, initializer);
                    statements.push(guard);
                }
                let pattern_empty = {
                    let arena = &self.ctx.arena;
                    arena
                        .get(param.name)
                        .and_then(|n| arena.get_binding_pattern(n))
                        .map(|d| d.elements.is_empty())
                        .unwrap_or(true)
                };
                if !pattern_empty {
                    let mut declarations = Vec::new();
                    flatten_variable_destructuring(self, param.name, temp, &mut declarations);
                    if !declarations.is_empty() {
                        let stmt = self.ctx.arena.var_statement(declarations);
                        statements.push(stmt);
                    }
                }
            } else if param.initializer.is_some() {
                lowered.push(self.ctx.arena.parameter(param.name));
                let initializer = self.visit_expression(param.initializer);
                let guard = self.default_value_assignment(param.name, initializer);
                statements.push(guard);
            } else {
                lowered.push(param_idx);
            }
        }
        NodeList::new(lowered)
    }

    /// `if (name === void 0) { name = initializer; }`
    fn default_value_assignment(&mut self, name: NodeIndex, initializer: NodeIndex) -> NodeIndex {
        let arena = &mut self.ctx.arena;
        let test_name = arena.clone_identifier(name);
        let vz = arena.void_zero();
        let test = arena.strict_equals(test_name, vz);
        let target = arena.clone_identifier(name);
        let assignment = arena.assign(target, initializer);
        let stmt = arena.expression_statement(assignment);
        let then_block = arena.block(vec![stmt], false);
        arena.if_statement(test, then_block, NodeIndex::NONE)
    }

    /// ```text
    /// var name = [];
    /// for (var _i = restIndex; _i < arguments.length; _i++) {
    ///     name[_i - restIndex] = arguments[_i];
    /// }
    /// ```
    /// The `- restIndex` adjustment is omitted for a leading rest parameter.
    fn emit_rest_parameter(
        &mut self,
        name: NodeIndex,
        rest_index: usize,
        statements: &mut Vec<NodeIndex>,
    ) {
        let arena = &mut self.ctx.arena;

        let empty = arena.array_literal(vec![]);
        let init_decl = arena.var_declaration(name, empty);
        statements.push(arena.var_statement(vec![init_decl]));

        let counter = self.ctx.create_temp_variable(TempFlags::LoopCounter);
        let arena = &mut self.ctx.arena;
        let start = arena.numeric_literal(&rest_index.to_string());
        let counter_decl = arena.var_declaration(counter, start);
        let head = arena.var_declaration_list(vec![counter_decl]);

        let arguments = arena.identifier("arguments");
        let arguments_length = arena.prop_access(arguments, "length");
        let condition = arena.binary(counter, SyntaxKind::LessThanToken, arguments_length);

        let incrementor = arena.alloc_unary_expr(
            SyntaxKind::PostfixUnaryExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            UnaryExprData {
                operator: SyntaxKind::PlusPlusToken,
                operand: counter,
            },
        );

        let slot = if rest_index == 0 {
            counter
        } else {
            let offset = arena.numeric_literal(&rest_index.to_string());
            arena.binary(counter, SyntaxKind::MinusToken, offset)
        };
        let target_name = arena.clone_identifier(name);
        let target = arena.elem_access(target_name, slot);
        let arguments = arena.identifier("arguments");
        let value = arena.elem_access(arguments, counter);
        let store = arena.assign(target, value);
        let body_stmt = arena.expression_statement(store);
        let body = arena.block(vec![body_stmt], true);

        statements.push(arena.for_statement(head, condition, incrementor, body));
    }
}
