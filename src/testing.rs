//! Test support: a compact single-line JavaScript printer and a transform
//! harness. The printer exists so transform tests can assert on emitted
//! shapes with `contains`-style checks; it is not the production emitter.

use crate::ast::{NodeArena, NodeIndex, SyntaxKind, compute_transform_flags};
use crate::options::CompilerOptions;
use crate::resolver::{EmitResolver, TableResolver};
use crate::transformer::TransformContext;
use crate::transforms::es6;

/// Run the ES6 transform over a file built in `arena`, with a null resolver.
pub(crate) fn transform(arena: NodeArena, file: NodeIndex) -> (TransformContext, NodeIndex) {
    transform_with_resolver(arena, file, Box::new(TableResolver::new()))
}

pub(crate) fn transform_with_resolver(
    mut arena: NodeArena,
    file: NodeIndex,
    resolver: Box<dyn EmitResolver>,
) -> (TransformContext, NodeIndex) {
    compute_transform_flags(&mut arena, file);
    let mut ctx = TransformContext::new(arena, CompilerOptions::es5(), resolver);
    let result = es6::transform_source_file(&mut ctx, file);
    (ctx, result)
}

pub(crate) fn print(arena: &NodeArena, idx: NodeIndex) -> String {
    let mut out = String::new();
    print_node(arena, idx, &mut out);
    out
}

fn escape_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn print_list(arena: &NodeArena, nodes: &[NodeIndex], separator: &str, out: &mut String) {
    for (i, &node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        print_node(arena, node, out);
    }
}

fn print_node(arena: &NodeArena, idx: NodeIndex, out: &mut String) {
    if idx.is_none() {
        return;
    }
    let Some(node) = arena.get(idx) else {
        return;
    };
    match node.kind {
        SyntaxKind::Identifier => {
            out.push_str(&arena.get_identifier(node).unwrap().escaped_text);
        }
        SyntaxKind::StringLiteral => {
            out.push('"');
            out.push_str(&escape_string(&arena.get_literal(node).unwrap().text));
            out.push('"');
        }
        SyntaxKind::NumericLiteral | SyntaxKind::RegularExpressionLiteral => {
            out.push_str(&arena.get_literal(node).unwrap().text);
        }
        SyntaxKind::ThisKeyword => out.push_str("this"),
        SyntaxKind::SuperKeyword => out.push_str("super"),
        SyntaxKind::NullKeyword => out.push_str("null"),
        SyntaxKind::TrueKeyword => out.push_str("true"),
        SyntaxKind::FalseKeyword => out.push_str("false"),
        SyntaxKind::BinaryExpression => {
            let d = arena.get_binary_expr(node).unwrap();
            print_node(arena, d.left, out);
            if d.operator_token == SyntaxKind::CommaToken {
                out.push_str(", ");
            } else {
                out.push(' ');
                out.push_str(d.operator_token.operator_text());
                out.push(' ');
            }
            print_node(arena, d.right, out);
        }
        SyntaxKind::PrefixUnaryExpression => {
            let d = arena.get_unary_expr(node).unwrap();
            out.push_str(d.operator.operator_text());
            print_node(arena, d.operand, out);
        }
        SyntaxKind::PostfixUnaryExpression => {
            let d = arena.get_unary_expr(node).unwrap();
            print_node(arena, d.operand, out);
            out.push_str(d.operator.operator_text());
        }
        SyntaxKind::VoidExpression => {
            out.push_str("void ");
            print_node(arena, arena.get_unary_expr_ex(node).unwrap().expression, out);
        }
        SyntaxKind::TypeOfExpression => {
            out.push_str("typeof ");
            print_node(arena, arena.get_unary_expr_ex(node).unwrap().expression, out);
        }
        SyntaxKind::DeleteExpression => {
            out.push_str("delete ");
            print_node(arena, arena.get_unary_expr_ex(node).unwrap().expression, out);
        }
        SyntaxKind::SpreadElement => {
            out.push_str("...");
            print_node(arena, arena.get_unary_expr_ex(node).unwrap().expression, out);
        }
        SyntaxKind::ParenthesizedExpression => {
            out.push('(');
            print_node(arena, arena.get_parenthesized(node).unwrap().expression, out);
            out.push(')');
        }
        SyntaxKind::PropertyAccessExpression => {
            let d = arena.get_access_expr(node).unwrap();
            print_node(arena, d.expression, out);
            out.push('.');
            print_node(arena, d.name_or_argument, out);
        }
        SyntaxKind::ElementAccessExpression => {
            let d = arena.get_access_expr(node).unwrap();
            print_node(arena, d.expression, out);
            out.push('[');
            print_node(arena, d.name_or_argument, out);
            out.push(']');
        }
        SyntaxKind::CallExpression => {
            let d = arena.get_call_expr(node).unwrap();
            print_node(arena, d.expression, out);
            out.push('(');
            if let Some(args) = &d.arguments {
                print_list(arena, &args.nodes, ", ", out);
            }
            out.push(')');
        }
        SyntaxKind::NewExpression => {
            let d = arena.get_call_expr(node).unwrap();
            out.push_str("new ");
            print_node(arena, d.expression, out);
            if let Some(args) = &d.arguments {
                out.push('(');
                print_list(arena, &args.nodes, ", ", out);
                out.push(')');
            }
        }
        SyntaxKind::ConditionalExpression => {
            let d = arena.get_conditional_expr(node).unwrap();
            print_node(arena, d.condition, out);
            out.push_str(" ? ");
            print_node(arena, d.when_true, out);
            out.push_str(" : ");
            print_node(arena, d.when_false, out);
        }
        SyntaxKind::ArrayLiteralExpression => {
            let d = arena.get_literal_expr(node).unwrap();
            out.push('[');
            print_list(arena, &d.elements.nodes, ", ", out);
            out.push(']');
        }
        SyntaxKind::ObjectLiteralExpression => {
            let d = arena.get_literal_expr(node).unwrap();
            if d.elements.is_empty() {
                out.push_str("{}");
            } else {
                out.push_str("{ ");
                print_list(arena, &d.elements.nodes, ", ", out);
                out.push_str(" }");
            }
        }
        SyntaxKind::PropertyAssignment => {
            let d = arena.get_property_assignment(node).unwrap();
            print_property_name(arena, d.name, out);
            out.push_str(": ");
            print_node(arena, d.initializer, out);
        }
        SyntaxKind::ShorthandPropertyAssignment => {
            print_node(arena, arena.get_shorthand_property(node).unwrap().name, out);
        }
        SyntaxKind::ComputedPropertyName => {
            out.push('[');
            print_node(arena, arena.get_computed_property(node).unwrap().expression, out);
            out.push(']');
        }
        SyntaxKind::GetAccessor | SyntaxKind::SetAccessor => {
            let d = arena.get_function(node).unwrap();
            out.push_str(if node.kind == SyntaxKind::GetAccessor {
                "get "
            } else {
                "set "
            });
            print_property_name(arena, d.name, out);
            out.push('(');
            print_list(arena, &d.parameters.nodes, ", ", out);
            out.push_str(") ");
            print_node(arena, d.body, out);
        }
        SyntaxKind::FunctionExpression | SyntaxKind::FunctionDeclaration => {
            let d = arena.get_function(node).unwrap();
            out.push_str("function ");
            if d.name.is_some() {
                print_node(arena, d.name, out);
            }
            out.push('(');
            print_list(arena, &d.parameters.nodes, ", ", out);
            out.push_str(") ");
            print_node(arena, d.body, out);
        }
        SyntaxKind::ArrowFunction => {
            let d = arena.get_function(node).unwrap();
            out.push('(');
            print_list(arena, &d.parameters.nodes, ", ", out);
            out.push_str(") => ");
            print_node(arena, d.body, out);
        }
        SyntaxKind::Parameter => {
            let d = arena.get_parameter(node).unwrap();
            if d.dot_dot_dot_token {
                out.push_str("...");
            }
            print_node(arena, d.name, out);
            if d.initializer.is_some() {
                out.push_str(" = ");
                print_node(arena, d.initializer, out);
            }
        }
        SyntaxKind::Block => {
            let d = arena.get_block(node).unwrap();
            if d.statements.is_empty() {
                out.push_str("{ }");
            } else {
                out.push_str("{ ");
                print_list(arena, &d.statements.nodes, " ", out);
                out.push_str(" }");
            }
        }
        SyntaxKind::VariableStatement => {
            let d = arena.get_variable_statement(node).unwrap();
            print_node(arena, d.declaration_list, out);
            out.push(';');
        }
        SyntaxKind::VariableDeclarationList => {
            out.push_str(var_keyword(node));
            out.push(' ');
            let d = arena.get_variable_list(node).unwrap();
            print_list(arena, &d.declarations.nodes, ", ", out);
        }
        SyntaxKind::VariableDeclaration => {
            let d = arena.get_variable_declaration(node).unwrap();
            print_node(arena, d.name, out);
            if d.initializer.is_some() {
                out.push_str(" = ");
                print_node(arena, d.initializer, out);
            }
        }
        SyntaxKind::ExpressionStatement => {
            print_node(arena, arena.get_expression_statement(node).unwrap().expression, out);
            out.push(';');
        }
        SyntaxKind::ReturnStatement => {
            let d = arena.get_return(node).unwrap();
            if d.expression.is_some() {
                out.push_str("return ");
                print_node(arena, d.expression, out);
                out.push(';');
            } else {
                out.push_str("return;");
            }
        }
        SyntaxKind::ThrowStatement => {
            out.push_str("throw ");
            print_node(arena, arena.get_return(node).unwrap().expression, out);
            out.push(';');
        }
        SyntaxKind::IfStatement => {
            let d = arena.get_if_statement(node).unwrap();
            out.push_str("if (");
            print_node(arena, d.expression, out);
            out.push_str(") ");
            print_node(arena, d.then_statement, out);
            if d.else_statement.is_some() {
                out.push_str(" else ");
                print_node(arena, d.else_statement, out);
            }
        }
        SyntaxKind::ForStatement => {
            let d = arena.get_loop(node).unwrap();
            out.push_str("for (");
            print_node(arena, d.initializer, out);
            out.push_str("; ");
            print_node(arena, d.condition, out);
            out.push_str("; ");
            print_node(arena, d.incrementor, out);
            out.push_str(") ");
            print_node(arena, d.statement, out);
        }
        SyntaxKind::WhileStatement => {
            let d = arena.get_loop(node).unwrap();
            out.push_str("while (");
            print_node(arena, d.condition, out);
            out.push_str(") ");
            print_node(arena, d.statement, out);
        }
        SyntaxKind::DoStatement => {
            let d = arena.get_loop(node).unwrap();
            out.push_str("do ");
            print_node(arena, d.statement, out);
            out.push_str(" while (");
            print_node(arena, d.condition, out);
            out.push_str(");");
        }
        SyntaxKind::ForInStatement | SyntaxKind::ForOfStatement => {
            let d = arena.get_for_in_of(node).unwrap();
            out.push_str("for (");
            print_node(arena, d.initializer, out);
            out.push_str(if node.kind == SyntaxKind::ForInStatement {
                " in "
            } else {
                " of "
            });
            print_node(arena, d.expression, out);
            out.push_str(") ");
            print_node(arena, d.statement, out);
        }
        SyntaxKind::EmptyStatement => out.push(';'),
        SyntaxKind::BreakStatement => out.push_str("break;"),
        SyntaxKind::ContinueStatement => out.push_str("continue;"),
        SyntaxKind::LabeledStatement => {
            let d = arena.get_labeled(node).unwrap();
            print_node(arena, d.label, out);
            out.push_str(": ");
            print_node(arena, d.statement, out);
        }
        SyntaxKind::SourceFile => {
            let d = arena.get_source_file(node).unwrap();
            print_list(arena, &d.statements.nodes, " ", out);
        }
        other => {
            out.push_str(&format!("<unprintable:{other:?}>"));
        }
    }
}

fn print_property_name(arena: &NodeArena, name: NodeIndex, out: &mut String) {
    print_node(arena, name, out);
}

fn var_keyword(node: &crate::ast::Node) -> &'static str {
    use crate::ast::NodeFlags;
    if node.flags.contains(NodeFlags::LET) {
        "let"
    } else if node.flags.contains(NodeFlags::CONST) {
        "const"
    } else {
        "var"
    }
}
