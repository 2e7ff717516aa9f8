//! Bottom-up `TransformFlags` computation.
//!
//! The dispatcher's three-way gate relies on every node carrying precomputed
//! hints: `ES6` when the node itself must be rewritten, `CONTAINS_ES6` when
//! some descendant must be. The parser/binder of the host pipeline normally
//! computes these while building the tree; this pass computes them over an
//! already-built tree so the transform can also be driven standalone.
//!
//! Propagation is monotone for `CONTAINS_ES6`. The lexical-this bits are
//! cropped at non-arrow function boundaries (each function captures its own
//! `this`), and the spread bit is consumed by the containing call, `new`, or
//! array literal.

use super::base::NodeIndex;
use super::flags::{NodeFlags, TransformFlags};
use super::node::NodeArena;
use super::syntax_kind::SyntaxKind;

/// Compute and store transform flags for `root` and its whole subtree.
pub fn compute_transform_flags(arena: &mut NodeArena, root: NodeIndex) {
    compute(arena, root);
}

fn compute(arena: &mut NodeArena, idx: NodeIndex) -> TransformFlags {
    let Some(node) = arena.get(idx).copied() else {
        return TransformFlags::empty();
    };
    let kind = node.kind;

    let mut aggregate = TransformFlags::empty();
    for child in children_of(arena, idx) {
        aggregate |= compute(arena, child);
    }

    let mut own = TransformFlags::empty();
    match kind {
        SyntaxKind::ThisKeyword => {
            aggregate |= TransformFlags::CONTAINS_LEXICAL_THIS;
        }
        SyntaxKind::SuperKeyword => {
            own |= TransformFlags::ES6;
        }
        SyntaxKind::ArrowFunction => {
            own |= TransformFlags::ES6;
            if aggregate.contains(TransformFlags::CONTAINS_LEXICAL_THIS) {
                own |= TransformFlags::CONTAINS_CAPTURED_LEXICAL_THIS;
            }
        }
        SyntaxKind::FunctionDeclaration
        | SyntaxKind::FunctionExpression
        | SyntaxKind::MethodDeclaration
        | SyntaxKind::GetAccessor
        | SyntaxKind::SetAccessor
        | SyntaxKind::Constructor => {
            own |= parameter_list_flags(arena, idx);
            if aggregate.contains(TransformFlags::CONTAINS_CAPTURED_LEXICAL_THIS) {
                own |= TransformFlags::ES6;
            }
            if kind == SyntaxKind::MethodDeclaration {
                // Concise methods are ES2015 syntax wherever they appear.
                own |= TransformFlags::ES6;
            }
        }
        SyntaxKind::ClassDeclaration | SyntaxKind::ClassExpression => {
            own |= TransformFlags::ES6;
        }
        SyntaxKind::TemplateExpression
        | SyntaxKind::TaggedTemplateExpression
        | SyntaxKind::NoSubstitutionTemplateLiteral => {
            own |= TransformFlags::ES6;
        }
        SyntaxKind::ForOfStatement => {
            own |= TransformFlags::ES6;
        }
        SyntaxKind::ShorthandPropertyAssignment => {
            own |= TransformFlags::ES6;
        }
        SyntaxKind::SpreadElement => {
            own |= TransformFlags::ES6;
        }
        SyntaxKind::CallExpression | SyntaxKind::NewExpression => {
            if aggregate.contains(TransformFlags::CONTAINS_SPREAD_ELEMENT_EXPRESSION) {
                own |= TransformFlags::ES6;
            }
            if callee_involves_super(arena, idx) {
                own |= TransformFlags::ES6;
            }
        }
        SyntaxKind::ArrayLiteralExpression => {
            if aggregate.contains(TransformFlags::CONTAINS_SPREAD_ELEMENT_EXPRESSION) {
                own |= TransformFlags::ES6;
            }
        }
        SyntaxKind::ObjectLiteralExpression => {
            if has_computed_property(arena, idx) {
                own |= TransformFlags::ES6;
            }
        }
        SyntaxKind::PropertyAccessExpression | SyntaxKind::ElementAccessExpression => {
            if access_base_is_super(arena, idx) {
                own |= TransformFlags::ES6;
            }
        }
        SyntaxKind::VariableDeclarationList => {
            if node.flags.intersects(NodeFlags::BLOCK_SCOPED) {
                own |= TransformFlags::ES6 | TransformFlags::CONTAINS_LET_OR_CONST;
            }
            if list_has_pattern_declaration(arena, idx) {
                own |= TransformFlags::ES6;
            }
        }
        SyntaxKind::BinaryExpression => {
            if is_destructuring_assignment(arena, idx) {
                own |= TransformFlags::ES6;
            }
        }
        _ => {}
    }

    // The spread hint is consumed by the node that restructures the list.
    if matches!(
        kind,
        SyntaxKind::CallExpression | SyntaxKind::NewExpression | SyntaxKind::ArrayLiteralExpression
    ) {
        aggregate -= TransformFlags::CONTAINS_SPREAD_ELEMENT_EXPRESSION;
    }

    let stored = own | aggregate | TransformFlags::HAS_COMPUTED_FLAGS;
    arena.set_transform_flags(idx, stored);

    let mut up = stored.subtree_flags();
    if kind == SyntaxKind::SpreadElement {
        up |= TransformFlags::CONTAINS_SPREAD_ELEMENT_EXPRESSION;
    }
    if kind.is_this_container() {
        up -= TransformFlags::CONTAINS_LEXICAL_THIS
            | TransformFlags::CONTAINS_CAPTURED_LEXICAL_THIS
            | TransformFlags::CONTAINS_DEFAULT_VALUE_ASSIGNMENTS;
    } else if kind == SyntaxKind::ArrowFunction {
        up -= TransformFlags::CONTAINS_DEFAULT_VALUE_ASSIGNMENTS;
    }
    up
}

fn parameter_list_flags(arena: &NodeArena, func: NodeIndex) -> TransformFlags {
    let mut flags = TransformFlags::empty();
    let Some(node) = arena.get(func) else {
        return flags;
    };
    let Some(data) = arena.get_function(node) else {
        return flags;
    };
    for &param_idx in &data.parameters {
        let Some(param_node) = arena.get(param_idx) else {
            continue;
        };
        let Some(param) = arena.get_parameter(param_node) else {
            continue;
        };
        if param.dot_dot_dot_token {
            flags |= TransformFlags::ES6;
        }
        if param.initializer.is_some() {
            flags |= TransformFlags::ES6 | TransformFlags::CONTAINS_DEFAULT_VALUE_ASSIGNMENTS;
        }
        if arena.kind(param.name).is_binding_pattern() {
            flags |= TransformFlags::ES6;
        }
    }
    flags
}

fn callee_involves_super(arena: &NodeArena, call: NodeIndex) -> bool {
    let Some(node) = arena.get(call) else {
        return false;
    };
    let Some(data) = arena.get_call_expr(node) else {
        return false;
    };
    match arena.kind(data.expression) {
        SyntaxKind::SuperKeyword => true,
        SyntaxKind::PropertyAccessExpression | SyntaxKind::ElementAccessExpression => {
            access_base_is_super(arena, data.expression)
        }
        _ => false,
    }
}

fn access_base_is_super(arena: &NodeArena, access: NodeIndex) -> bool {
    let Some(node) = arena.get(access) else {
        return false;
    };
    arena
        .get_access_expr(node)
        .map(|d| arena.kind(d.expression) == SyntaxKind::SuperKeyword)
        .unwrap_or(false)
}

fn has_computed_property(arena: &NodeArena, object: NodeIndex) -> bool {
    let Some(node) = arena.get(object) else {
        return false;
    };
    let Some(data) = arena.get_literal_expr(node) else {
        return false;
    };
    data.elements.iter().any(|&member| {
        property_name_of(arena, member)
            .map(|name| arena.kind(name) == SyntaxKind::ComputedPropertyName)
            .unwrap_or(false)
    })
}

/// The name node of an object-literal or class member, if it has one.
pub(crate) fn property_name_of(arena: &NodeArena, member: NodeIndex) -> Option<NodeIndex> {
    let node = arena.get(member)?;
    match node.kind {
        SyntaxKind::PropertyAssignment => arena.get_property_assignment(node).map(|d| d.name),
        SyntaxKind::ShorthandPropertyAssignment => {
            arena.get_shorthand_property(node).map(|d| d.name)
        }
        SyntaxKind::MethodDeclaration | SyntaxKind::GetAccessor | SyntaxKind::SetAccessor => {
            arena.get_function(node).map(|d| d.name)
        }
        _ => None,
    }
}

fn list_has_pattern_declaration(arena: &NodeArena, list: NodeIndex) -> bool {
    let Some(node) = arena.get(list) else {
        return false;
    };
    let Some(data) = arena.get_variable_list(node) else {
        return false;
    };
    data.declarations.iter().any(|&decl| {
        arena
            .get(decl)
            .and_then(|n| arena.get_variable_declaration(n))
            .map(|d| arena.kind(d.name).is_binding_pattern())
            .unwrap_or(false)
    })
}

fn is_destructuring_assignment(arena: &NodeArena, binary: NodeIndex) -> bool {
    let Some(node) = arena.get(binary) else {
        return false;
    };
    let Some(data) = arena.get_binary_expr(node) else {
        return false;
    };
    data.operator_token == SyntaxKind::EqualsToken
        && matches!(
            arena.kind(data.left),
            SyntaxKind::ArrayLiteralExpression | SyntaxKind::ObjectLiteralExpression
        )
}

/// Children of a node, in source order.
pub(crate) fn children_of(arena: &NodeArena, idx: NodeIndex) -> Vec<NodeIndex> {
    let mut out = Vec::new();
    let Some(node) = arena.get(idx) else {
        return out;
    };
    let mut push = |child: NodeIndex| {
        if child.is_some() {
            out.push(child);
        }
    };
    match node.kind {
        SyntaxKind::SourceFile => {
            if let Some(d) = arena.get_source_file(node) {
                d.statements.iter().copied().for_each(&mut push);
            }
        }
        SyntaxKind::Block | SyntaxKind::CaseBlock => {
            if let Some(d) = arena.get_block(node) {
                d.statements.iter().copied().for_each(&mut push);
            }
        }
        SyntaxKind::VariableStatement => {
            if let Some(d) = arena.get_variable_statement(node) {
                push(d.declaration_list);
            }
        }
        SyntaxKind::VariableDeclarationList => {
            if let Some(d) = arena.get_variable_list(node) {
                d.declarations.iter().copied().for_each(&mut push);
            }
        }
        SyntaxKind::VariableDeclaration => {
            if let Some(d) = arena.get_variable_declaration(node) {
                push(d.name);
                push(d.initializer);
            }
        }
        SyntaxKind::ExpressionStatement => {
            if let Some(d) = arena.get_expression_statement(node) {
                push(d.expression);
            }
        }
        SyntaxKind::ReturnStatement | SyntaxKind::ThrowStatement => {
            if let Some(d) = arena.get_return(node) {
                push(d.expression);
            }
        }
        SyntaxKind::IfStatement => {
            if let Some(d) = arena.get_if_statement(node) {
                push(d.expression);
                push(d.then_statement);
                push(d.else_statement);
            }
        }
        SyntaxKind::ForStatement | SyntaxKind::WhileStatement | SyntaxKind::DoStatement => {
            if let Some(d) = arena.get_loop(node) {
                push(d.initializer);
                push(d.condition);
                push(d.incrementor);
                push(d.statement);
            }
        }
        SyntaxKind::ForInStatement | SyntaxKind::ForOfStatement => {
            if let Some(d) = arena.get_for_in_of(node) {
                push(d.initializer);
                push(d.expression);
                push(d.statement);
            }
        }
        SyntaxKind::SwitchStatement => {
            if let Some(d) = arena.get_switch(node) {
                push(d.expression);
                push(d.case_block);
            }
        }
        SyntaxKind::CaseClause | SyntaxKind::DefaultClause => {
            if let Some(d) = arena.get_case_clause(node) {
                push(d.expression);
                d.statements.iter().copied().for_each(&mut push);
            }
        }
        SyntaxKind::LabeledStatement => {
            if let Some(d) = arena.get_labeled(node) {
                push(d.label);
                push(d.statement);
            }
        }
        SyntaxKind::BreakStatement | SyntaxKind::ContinueStatement => {
            if let Some(d) = arena.get_jump(node) {
                push(d.label);
            }
        }
        SyntaxKind::TryStatement => {
            if let Some(d) = arena.get_try(node) {
                push(d.try_block);
                push(d.catch_clause);
                push(d.finally_block);
            }
        }
        SyntaxKind::CatchClause => {
            if let Some(d) = arena.get_catch_clause(node) {
                push(d.variable_declaration);
                push(d.block);
            }
        }
        SyntaxKind::FunctionDeclaration
        | SyntaxKind::FunctionExpression
        | SyntaxKind::ArrowFunction
        | SyntaxKind::MethodDeclaration
        | SyntaxKind::GetAccessor
        | SyntaxKind::SetAccessor
        | SyntaxKind::Constructor => {
            if let Some(d) = arena.get_function(node) {
                push(d.name);
                d.parameters.iter().copied().for_each(&mut push);
                push(d.body);
            }
        }
        SyntaxKind::Parameter => {
            if let Some(d) = arena.get_parameter(node) {
                push(d.name);
                push(d.initializer);
            }
        }
        SyntaxKind::ObjectBindingPattern | SyntaxKind::ArrayBindingPattern => {
            if let Some(d) = arena.get_binding_pattern(node) {
                d.elements.iter().copied().for_each(&mut push);
            }
        }
        SyntaxKind::BindingElement => {
            if let Some(d) = arena.get_binding_element(node) {
                push(d.property_name);
                push(d.name);
                push(d.initializer);
            }
        }
        SyntaxKind::ClassDeclaration | SyntaxKind::ClassExpression => {
            if let Some(d) = arena.get_class(node) {
                push(d.name);
                if let Some(clauses) = &d.heritage_clauses {
                    clauses.iter().copied().for_each(&mut push);
                }
                d.members.iter().copied().for_each(&mut push);
            }
        }
        SyntaxKind::HeritageClause => {
            if let Some(d) = arena.get_heritage_clause(node) {
                d.types.iter().copied().for_each(&mut push);
            }
        }
        SyntaxKind::ExpressionWithTypeArguments => {
            if let Some(d) = arena.get_expr_type_args(node) {
                push(d.expression);
            }
        }
        SyntaxKind::PropertyAssignment => {
            if let Some(d) = arena.get_property_assignment(node) {
                push(d.name);
                push(d.initializer);
            }
        }
        SyntaxKind::ShorthandPropertyAssignment => {
            if let Some(d) = arena.get_shorthand_property(node) {
                push(d.name);
            }
        }
        SyntaxKind::ComputedPropertyName => {
            if let Some(d) = arena.get_computed_property(node) {
                push(d.expression);
            }
        }
        SyntaxKind::BinaryExpression => {
            if let Some(d) = arena.get_binary_expr(node) {
                push(d.left);
                push(d.right);
            }
        }
        SyntaxKind::PrefixUnaryExpression | SyntaxKind::PostfixUnaryExpression => {
            if let Some(d) = arena.get_unary_expr(node) {
                push(d.operand);
            }
        }
        SyntaxKind::SpreadElement
        | SyntaxKind::DeleteExpression
        | SyntaxKind::TypeOfExpression
        | SyntaxKind::VoidExpression => {
            if let Some(d) = arena.get_unary_expr_ex(node) {
                push(d.expression);
            }
        }
        SyntaxKind::ParenthesizedExpression => {
            if let Some(d) = arena.get_parenthesized(node) {
                push(d.expression);
            }
        }
        SyntaxKind::CallExpression | SyntaxKind::NewExpression => {
            if let Some(d) = arena.get_call_expr(node) {
                push(d.expression);
                if let Some(args) = &d.arguments {
                    args.iter().copied().for_each(&mut push);
                }
            }
        }
        SyntaxKind::PropertyAccessExpression | SyntaxKind::ElementAccessExpression => {
            if let Some(d) = arena.get_access_expr(node) {
                push(d.expression);
                push(d.name_or_argument);
            }
        }
        SyntaxKind::ConditionalExpression => {
            if let Some(d) = arena.get_conditional_expr(node) {
                push(d.condition);
                push(d.when_true);
                push(d.when_false);
            }
        }
        SyntaxKind::ArrayLiteralExpression | SyntaxKind::ObjectLiteralExpression => {
            if let Some(d) = arena.get_literal_expr(node) {
                d.elements.iter().copied().for_each(&mut push);
            }
        }
        SyntaxKind::TemplateExpression => {
            if let Some(d) = arena.get_template_expr(node) {
                push(d.head);
                d.spans.iter().copied().for_each(&mut push);
            }
        }
        SyntaxKind::TemplateSpan => {
            if let Some(d) = arena.get_template_span(node) {
                push(d.expression);
                push(d.literal);
            }
        }
        SyntaxKind::TaggedTemplateExpression => {
            if let Some(d) = arena.get_tagged_template(node) {
                push(d.tag);
                push(d.template);
            }
        }
        _ => {}
    }
    out
}

#[cfg(test)]
#[path = "transform_flags_tests.rs"]
mod transform_flags_tests;
