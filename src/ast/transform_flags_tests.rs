use super::compute_transform_flags;
use crate::ast::node::*;
use crate::ast::{NodeFlags, NodeIndex, NodeList, SyntaxKind, TransformFlags};

const SP: u32 = SYNTHETIC_POS;

fn tf(arena: &NodeArena, idx: NodeIndex) -> TransformFlags {
    arena.get(idx).unwrap().transform_flags
}

fn arrow_returning(arena: &mut NodeArena, body: NodeIndex) -> NodeIndex {
    arena.alloc_function(
        SyntaxKind::ArrowFunction,
        SP,
        SP,
        FunctionData {
            name: NodeIndex::NONE,
            parameters: NodeList::empty(),
            body,
        },
    )
}

fn function_with_body(arena: &mut NodeArena, name: &str, statements: Vec<NodeIndex>) -> NodeIndex {
    let name = arena.identifier(name);
    let body = arena.block(statements, true);
    arena.function_declaration(name, vec![], body)
}

#[test]
fn clean_tree_gets_only_the_computed_marker() {
    let mut arena = NodeArena::new();
    let y = arena.identifier("y");
    let one = arena.numeric_literal("1");
    let decl = arena.var_declaration(y, one);
    let stmt = arena.var_statement(vec![decl]);
    compute_transform_flags(&mut arena, stmt);
    assert_eq!(tf(&arena, stmt), TransformFlags::HAS_COMPUTED_FLAGS);
}

#[test]
fn arrow_with_this_marks_the_enclosing_function_captured() {
    let mut arena = NodeArena::new();
    let this = arena.this_expression();
    let lambda = arrow_returning(&mut arena, this);
    let stmt = arena.expression_statement(lambda);
    let outer = function_with_body(&mut arena, "outer", vec![stmt]);
    let wrapper_stmt = arena.expression_statement(outer);
    let wrapper = function_with_body(&mut arena, "wrapper", vec![wrapper_stmt]);
    compute_transform_flags(&mut arena, wrapper);

    let lambda_flags = tf(&arena, lambda);
    assert!(lambda_flags.contains(TransformFlags::ES6));
    assert!(lambda_flags.contains(TransformFlags::CONTAINS_CAPTURED_LEXICAL_THIS));

    let outer_flags = tf(&arena, outer);
    assert!(outer_flags.contains(TransformFlags::CONTAINS_CAPTURED_LEXICAL_THIS));
    assert!(outer_flags.contains(TransformFlags::ES6));

    // The capture stops at the function that owns the `this`.
    let wrapper_flags = tf(&arena, wrapper);
    assert!(!wrapper_flags.contains(TransformFlags::CONTAINS_CAPTURED_LEXICAL_THIS));
    assert!(wrapper_flags.contains(TransformFlags::CONTAINS_ES6));
    assert!(!wrapper_flags.contains(TransformFlags::ES6));
}

#[test]
fn spread_is_consumed_by_the_containing_call() {
    let mut arena = NodeArena::new();
    let f = arena.identifier("f");
    let xs = arena.identifier("xs");
    let sp = arena.alloc_unary_expr_ex(
        SyntaxKind::SpreadElement,
        SP,
        SP,
        UnaryExprExData { expression: xs },
    );
    let call = arena.call(f, vec![sp]);
    let stmt = arena.expression_statement(call);
    compute_transform_flags(&mut arena, stmt);

    assert!(tf(&arena, sp).contains(TransformFlags::ES6));
    assert!(tf(&arena, call).contains(TransformFlags::ES6));
    let stmt_flags = tf(&arena, stmt);
    assert!(stmt_flags.contains(TransformFlags::CONTAINS_ES6));
    assert!(!stmt_flags.contains(TransformFlags::CONTAINS_SPREAD_ELEMENT_EXPRESSION));
}

#[test]
fn let_list_is_marked_for_rewrite() {
    let mut arena = NodeArena::new();
    let x = arena.identifier("x");
    let one = arena.numeric_literal("1");
    let decl = arena.var_declaration(x, one);
    let list = arena.var_declaration_list(vec![decl]);
    arena.add_flags(list, NodeFlags::LET);
    let stmt = arena.var_statement_from_list(list);
    compute_transform_flags(&mut arena, stmt);

    let list_flags = tf(&arena, list);
    assert!(list_flags.contains(TransformFlags::ES6));
    assert!(list_flags.contains(TransformFlags::CONTAINS_LET_OR_CONST));
    assert!(tf(&arena, stmt).contains(TransformFlags::CONTAINS_ES6));
}

#[test]
fn defaulted_parameter_marks_the_function() {
    let mut arena = NodeArena::new();
    let one = arena.numeric_literal("1");
    let b = arena.identifier("b");
    let param = arena.alloc_parameter(
        SyntaxKind::Parameter,
        SP,
        SP,
        ParameterData {
            dot_dot_dot_token: false,
            name: b,
            initializer: one,
        },
    );
    let name = arena.identifier("f");
    let body = arena.block(vec![], false);
    let f = arena.alloc_function(
        SyntaxKind::FunctionDeclaration,
        SP,
        SP,
        FunctionData {
            name,
            parameters: NodeList::new(vec![param]),
            body,
        },
    );
    compute_transform_flags(&mut arena, f);

    let flags = tf(&arena, f);
    assert!(flags.contains(TransformFlags::ES6));
    assert!(flags.contains(TransformFlags::CONTAINS_DEFAULT_VALUE_ASSIGNMENTS));
}

#[test]
fn contains_es6_is_monotone_up_the_tree() {
    let mut arena = NodeArena::new();
    let name = arena.identifier("K");
    let class = arena.alloc_class(
        SyntaxKind::ClassDeclaration,
        SP,
        SP,
        ClassData {
            name,
            heritage_clauses: None,
            members: NodeList::empty(),
        },
    );
    let block = arena.block(vec![class], true);
    compute_transform_flags(&mut arena, block);

    assert!(tf(&arena, class).contains(TransformFlags::ES6));
    assert!(tf(&arena, block).contains(TransformFlags::CONTAINS_ES6));
    assert!(!tf(&arena, block).contains(TransformFlags::ES6));
}
