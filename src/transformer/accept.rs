//! Generic copy-visitation.
//!
//! `accept` reconstructs a node with each child replaced by its visited
//! form. When every child comes back unchanged the original node is returned
//! as-is, which is what keeps clean subtrees shared by reference between the
//! input and output trees. Rebuilt nodes keep the original's source range,
//! flags, and a back-pointer for source-map attribution.

use super::TransformContext;
use crate::ast::node::*;
use crate::ast::{NodeIndex, NodeList, SyntaxKind};

/// The visitation surface a transform exposes to shared machinery (the
/// copy-visitor and the destructuring flattener).
pub trait NodeVisitor {
    fn context(&mut self) -> &mut TransformContext;

    /// Visit a node in expression position; one node in, one node out.
    fn visit_expression(&mut self, node: NodeIndex) -> NodeIndex;

    /// Visit a node in statement position, emitting zero or more
    /// replacements into `out` in evaluation order.
    fn visit_statement(&mut self, node: NodeIndex, out: &mut Vec<NodeIndex>);

    /// Visit any other node category (declarations, lists, clauses, names).
    fn visit_node(&mut self, node: NodeIndex) -> NodeIndex;

    /// Visit a single embedded statement slot (an if-branch, a loop body),
    /// wrapping multi-statement expansions in a synthesized block.
    fn visit_statement_single(&mut self, node: NodeIndex) -> NodeIndex {
        if node.is_none() {
            return node;
        }
        let mut out = Vec::new();
        self.visit_statement(node, &mut out);
        match out.len() {
            0 => self.context().arena.empty_statement(),
            1 => out[0],
            _ => self.context().arena.block(out, true),
        }
    }
}

fn visit_opt_expression<V: NodeVisitor + ?Sized>(v: &mut V, node: NodeIndex) -> NodeIndex {
    if node.is_none() {
        NodeIndex::NONE
    } else {
        v.visit_expression(node)
    }
}

fn visit_opt_node<V: NodeVisitor + ?Sized>(v: &mut V, node: NodeIndex) -> NodeIndex {
    if node.is_none() {
        NodeIndex::NONE
    } else {
        v.visit_node(node)
    }
}

fn visit_each_node<V: NodeVisitor + ?Sized>(v: &mut V, list: &NodeList) -> (NodeList, bool) {
    let mut changed = false;
    let mut nodes = Vec::with_capacity(list.len());
    for &child in list {
        let new = visit_opt_node(v, child);
        changed |= new != child;
        nodes.push(new);
    }
    (NodeList::new(nodes), changed)
}

fn visit_each_expression<V: NodeVisitor + ?Sized>(v: &mut V, list: &NodeList) -> (NodeList, bool) {
    let mut changed = false;
    let mut nodes = Vec::with_capacity(list.len());
    for &child in list {
        let new = visit_opt_expression(v, child);
        changed |= new != child;
        nodes.push(new);
    }
    (NodeList::new(nodes), changed)
}

fn visit_statement_list<V: NodeVisitor + ?Sized>(v: &mut V, list: &NodeList) -> (NodeList, bool) {
    let mut out = Vec::with_capacity(list.len());
    for &child in list {
        v.visit_statement(child, &mut out);
    }
    let changed = out.len() != list.len() || out.iter().zip(list).any(|(a, b)| a != b);
    (NodeList::new(out), changed)
}

/// Give a rebuilt node the original's identity: source range, flags, and the
/// attribution back-pointer.
fn finish(ctx: &mut TransformContext, rebuilt: NodeIndex, original: NodeIndex) -> NodeIndex {
    if let Some(o) = ctx.arena.get(original).copied() {
        ctx.arena.set_span(rebuilt, o.pos, o.end);
        ctx.arena.set_flags(rebuilt, o.flags);
        ctx.arena.set_transform_flags(rebuilt, o.transform_flags);
        ctx.arena.set_original(rebuilt, original);
    }
    rebuilt
}

/// Rebuild `idx` with visited children, preserving it untouched when nothing
/// below changed.
pub fn accept<V: NodeVisitor + ?Sized>(v: &mut V, idx: NodeIndex) -> NodeIndex {
    let Some(node) = v.context().arena.get(idx).copied() else {
        return idx;
    };
    match node.kind {
        SyntaxKind::Block | SyntaxKind::CaseBlock => {
            let data = v.context().arena.get_block(&node).cloned().unwrap();
            let (statements, changed) = if node.kind == SyntaxKind::Block {
                visit_statement_list(v, &data.statements)
            } else {
                visit_each_node(v, &data.statements)
            };
            if !changed {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_block(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                BlockData {
                    statements,
                    multi_line: data.multi_line,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::VariableStatement => {
            let data = v.context().arena.get_variable_statement(&node).cloned().unwrap();
            let list = visit_opt_node(v, data.declaration_list);
            if list == data.declaration_list {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_variable_statement(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                VariableStatementData {
                    declaration_list: list,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::VariableDeclarationList => {
            let data = v.context().arena.get_variable_list(&node).cloned().unwrap();
            let (declarations, changed) = visit_each_node(v, &data.declarations);
            if !changed {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_variable_list(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                VariableListData { declarations },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::VariableDeclaration => {
            let data = v.context().arena.get_variable_declaration(&node).cloned().unwrap();
            let name = visit_opt_node(v, data.name);
            let initializer = visit_opt_expression(v, data.initializer);
            if name == data.name && initializer == data.initializer {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_variable_declaration(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                VariableDeclarationData { name, initializer },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::ExpressionStatement => {
            let data = v.context().arena.get_expression_statement(&node).cloned().unwrap();
            let expression = v.visit_expression(data.expression);
            if expression == data.expression {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.expression_statement(expression);
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::ReturnStatement | SyntaxKind::ThrowStatement => {
            let data = v.context().arena.get_return(&node).cloned().unwrap();
            let expression = visit_opt_expression(v, data.expression);
            if expression == data.expression {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_return(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                ReturnData { expression },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::IfStatement => {
            let data = v.context().arena.get_if_statement(&node).cloned().unwrap();
            let expression = v.visit_expression(data.expression);
            let then_statement = v.visit_statement_single(data.then_statement);
            let else_statement = if data.else_statement.is_none() {
                NodeIndex::NONE
            } else {
                v.visit_statement_single(data.else_statement)
            };
            if expression == data.expression
                && then_statement == data.then_statement
                && else_statement == data.else_statement
            {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.if_statement(expression, then_statement, else_statement);
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::ForStatement | SyntaxKind::WhileStatement | SyntaxKind::DoStatement => {
            let data = v.context().arena.get_loop(&node).cloned().unwrap();
            // A for-initializer is either a declaration list or an expression.
            let initializer = if data.initializer.is_none() {
                NodeIndex::NONE
            } else if v.context().arena.kind(data.initializer) == SyntaxKind::VariableDeclarationList {
                v.visit_node(data.initializer)
            } else {
                v.visit_expression(data.initializer)
            };
            let condition = visit_opt_expression(v, data.condition);
            let incrementor = visit_opt_expression(v, data.incrementor);
            let statement = v.visit_statement_single(data.statement);
            if initializer == data.initializer
                && condition == data.condition
                && incrementor == data.incrementor
                && statement == data.statement
            {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_loop(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                LoopData {
                    initializer,
                    condition,
                    incrementor,
                    statement,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::ForInStatement | SyntaxKind::ForOfStatement => {
            let data = v.context().arena.get_for_in_of(&node).cloned().unwrap();
            let initializer = if v.context().arena.kind(data.initializer)
                == SyntaxKind::VariableDeclarationList
            {
                v.visit_node(data.initializer)
            } else {
                v.visit_expression(data.initializer)
            };
            let expression = v.visit_expression(data.expression);
            let statement = v.visit_statement_single(data.statement);
            if initializer == data.initializer
                && expression == data.expression
                && statement == data.statement
            {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_for_in_of(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                ForInOfData {
                    initializer,
                    expression,
                    statement,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::SwitchStatement => {
            let data = v.context().arena.get_switch(&node).cloned().unwrap();
            let expression = v.visit_expression(data.expression);
            let case_block = v.visit_node(data.case_block);
            if expression == data.expression && case_block == data.case_block {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_switch(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                SwitchData {
                    expression,
                    case_block,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::CaseClause | SyntaxKind::DefaultClause => {
            let data = v.context().arena.get_case_clause(&node).cloned().unwrap();
            let expression = visit_opt_expression(v, data.expression);
            let (statements, changed) = visit_statement_list(v, &data.statements);
            if expression == data.expression && !changed {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_case_clause(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                CaseClauseData {
                    expression,
                    statements,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::LabeledStatement => {
            let data = v.context().arena.get_labeled(&node).cloned().unwrap();
            let statement = v.visit_statement_single(data.statement);
            if statement == data.statement {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_labeled(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                LabeledData {
                    label: data.label,
                    statement,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::TryStatement => {
            let data = v.context().arena.get_try(&node).cloned().unwrap();
            let try_block = visit_opt_node(v, data.try_block);
            let catch_clause = visit_opt_node(v, data.catch_clause);
            let finally_block = visit_opt_node(v, data.finally_block);
            if try_block == data.try_block
                && catch_clause == data.catch_clause
                && finally_block == data.finally_block
            {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_try(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                TryData {
                    try_block,
                    catch_clause,
                    finally_block,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::CatchClause => {
            let data = v.context().arena.get_catch_clause(&node).cloned().unwrap();
            let variable_declaration = visit_opt_node(v, data.variable_declaration);
            let block = visit_opt_node(v, data.block);
            if variable_declaration == data.variable_declaration && block == data.block {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_catch_clause(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                CatchClauseData {
                    variable_declaration,
                    block,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::FunctionDeclaration
        | SyntaxKind::FunctionExpression
        | SyntaxKind::ArrowFunction
        | SyntaxKind::MethodDeclaration
        | SyntaxKind::GetAccessor
        | SyntaxKind::SetAccessor
        | SyntaxKind::Constructor => {
            let data = v.context().arena.get_function(&node).cloned().unwrap();
            let (parameters, params_changed) = visit_each_node(v, &data.parameters);
            let body = if data.body.is_none() {
                NodeIndex::NONE
            } else if v.context().arena.kind(data.body) == SyntaxKind::Block {
                // A function body is a hoisting scope even on the generic
                // path: temps requested below surface at its top.
                v.context().start_lexical_environment();
                let visited = v.visit_node(data.body);
                match v.context().end_lexical_environment() {
                    None => visited,
                    Some(hoisted) => {
                        let ctx = v.context();
                        let block = ctx.arena.get(visited).copied();
                        let block_data = block
                            .as_ref()
                            .and_then(|n| ctx.arena.get_block(n))
                            .cloned();
                        match block_data {
                            Some(block_data) => {
                                let mut statements = block_data.statements.nodes;
                                statements.insert(0, hoisted);
                                let rebuilt = ctx.arena.block(statements, true);
                                finish(ctx, rebuilt, visited)
                            }
                            None => visited,
                        }
                    }
                }
            } else {
                v.visit_expression(data.body)
            };
            if !params_changed && body == data.body {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_function(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                FunctionData {
                    name: data.name,
                    parameters,
                    body,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::Parameter => {
            let data = v.context().arena.get_parameter(&node).cloned().unwrap();
            let name = visit_opt_node(v, data.name);
            let initializer = visit_opt_expression(v, data.initializer);
            if name == data.name && initializer == data.initializer {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_parameter(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                ParameterData {
                    dot_dot_dot_token: data.dot_dot_dot_token,
                    name,
                    initializer,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::ObjectBindingPattern | SyntaxKind::ArrayBindingPattern => {
            let data = v.context().arena.get_binding_pattern(&node).cloned().unwrap();
            let (elements, changed) = visit_each_node(v, &data.elements);
            if !changed {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_binding_pattern(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                BindingPatternData { elements },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::BindingElement => {
            let data = v.context().arena.get_binding_element(&node).cloned().unwrap();
            let name = visit_opt_node(v, data.name);
            let initializer = visit_opt_expression(v, data.initializer);
            if name == data.name && initializer == data.initializer {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_binding_element(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                BindingElementData {
                    dot_dot_dot_token: data.dot_dot_dot_token,
                    property_name: data.property_name,
                    name,
                    initializer,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::BinaryExpression => {
            let data = v.context().arena.get_binary_expr(&node).cloned().unwrap();
            let left = v.visit_expression(data.left);
            let right = v.visit_expression(data.right);
            if left == data.left && right == data.right {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.binary(left, data.operator_token, right);
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::PrefixUnaryExpression | SyntaxKind::PostfixUnaryExpression => {
            let data = v.context().arena.get_unary_expr(&node).cloned().unwrap();
            let operand = v.visit_expression(data.operand);
            if operand == data.operand {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_unary_expr(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                UnaryExprData {
                    operator: data.operator,
                    operand,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::SpreadElement
        | SyntaxKind::DeleteExpression
        | SyntaxKind::TypeOfExpression
        | SyntaxKind::VoidExpression => {
            let data = v.context().arena.get_unary_expr_ex(&node).cloned().unwrap();
            let expression = v.visit_expression(data.expression);
            if expression == data.expression {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_unary_expr_ex(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                UnaryExprExData { expression },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::ParenthesizedExpression => {
            let data = v.context().arena.get_parenthesized(&node).cloned().unwrap();
            let expression = v.visit_expression(data.expression);
            if expression == data.expression {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.paren(expression);
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::CallExpression | SyntaxKind::NewExpression => {
            let data = v.context().arena.get_call_expr(&node).cloned().unwrap();
            let expression = v.visit_expression(data.expression);
            let (arguments, args_changed) = match &data.arguments {
                Some(args) => {
                    let (list, changed) = visit_each_expression(v, args);
                    (Some(list), changed)
                }
                None => (None, false),
            };
            if expression == data.expression && !args_changed {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_call_expr(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                CallExprData {
                    expression,
                    arguments,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::PropertyAccessExpression | SyntaxKind::ElementAccessExpression => {
            let data = v.context().arena.get_access_expr(&node).cloned().unwrap();
            let expression = v.visit_expression(data.expression);
            let name_or_argument = if node.kind == SyntaxKind::ElementAccessExpression {
                v.visit_expression(data.name_or_argument)
            } else {
                data.name_or_argument
            };
            if expression == data.expression && name_or_argument == data.name_or_argument {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_access_expr(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                AccessExprData {
                    expression,
                    name_or_argument,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::ConditionalExpression => {
            let data = v.context().arena.get_conditional_expr(&node).cloned().unwrap();
            let condition = v.visit_expression(data.condition);
            let when_true = v.visit_expression(data.when_true);
            let when_false = v.visit_expression(data.when_false);
            if condition == data.condition
                && when_true == data.when_true
                && when_false == data.when_false
            {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.conditional(condition, when_true, when_false);
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::ArrayLiteralExpression => {
            let data = v.context().arena.get_literal_expr(&node).cloned().unwrap();
            let (elements, changed) = visit_each_expression(v, &data.elements);
            if !changed {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_literal_expr(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                LiteralExprData {
                    elements,
                    multi_line: data.multi_line,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::ObjectLiteralExpression => {
            let data = v.context().arena.get_literal_expr(&node).cloned().unwrap();
            let (elements, changed) = visit_each_node(v, &data.elements);
            if !changed {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_literal_expr(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                LiteralExprData {
                    elements,
                    multi_line: data.multi_line,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::PropertyAssignment => {
            let data = v.context().arena.get_property_assignment(&node).cloned().unwrap();
            let name = visit_opt_node(v, data.name);
            let initializer = v.visit_expression(data.initializer);
            if name == data.name && initializer == data.initializer {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.property_assignment(name, initializer);
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::ComputedPropertyName => {
            let data = v.context().arena.get_computed_property(&node).cloned().unwrap();
            let expression = v.visit_expression(data.expression);
            if expression == data.expression {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_computed_property(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                ComputedPropertyData { expression },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::TemplateSpan => {
            let data = v.context().arena.get_template_span(&node).cloned().unwrap();
            let expression = v.visit_expression(data.expression);
            if expression == data.expression {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_template_span(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                TemplateSpanData {
                    expression,
                    literal: data.literal,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::HeritageClause => {
            let data = v.context().arena.get_heritage_clause(&node).cloned().unwrap();
            let (types, changed) = visit_each_node(v, &data.types);
            if !changed {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_heritage_clause(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                HeritageClauseData {
                    token: data.token,
                    types,
                },
            );
            finish(ctx, rebuilt, idx)
        }
        SyntaxKind::ExpressionWithTypeArguments => {
            let data = v.context().arena.get_expr_type_args(&node).cloned().unwrap();
            let expression = v.visit_expression(data.expression);
            if expression == data.expression {
                return idx;
            }
            let ctx = v.context();
            let rebuilt = ctx.arena.alloc_expr_type_args(
                node.kind,
                SYNTHETIC_POS,
                SYNTHETIC_POS,
                ExprTypeArgsData { expression },
            );
            finish(ctx, rebuilt, idx)
        }
        // Leaves: identifiers, literals, keywords, jumps, empty statements.
        _ => idx,
    }
}
