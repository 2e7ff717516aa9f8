//! Destructuring pattern flattening.
//!
//! Binding patterns in declarations and parameters flatten to a sequence of
//! simple variable declarations reading off a once-evaluated source:
//!
//! ```text
//! var { x, y: renamed, z = 10 } = obj;
//! // var _a = obj, x = _a.x, renamed = _a.y,
//! //     z = _a.z === void 0 ? 10 : _a.z;
//!
//! var [first, ...rest] = arr;
//! // var _a = arr, first = _a[0], rest = _a.slice(1);
//!
//! var { a, ...others } = obj;
//! // var a = obj.a, others = __rest(obj, ["a"]);
//! ```
//!
//! Destructuring assignment expressions flatten to a parenthesized comma
//! sequence over a hoisted temp, optionally ending in the temp so the
//! assignment keeps its value. Defaults stay short-circuiting: the default
//! expression is only evaluated behind a `=== void 0` test. Sub-expressions
//! (defaults, nested targets, computed keys) are lowered through the active
//! visitor.

use crate::ast::{NodeIndex, SyntaxKind, TempFlags};
use crate::transformer::accept::NodeVisitor;
use tracing::trace;

/// Flatten a binding pattern initialized from `value` (already visited) into
/// simple `VariableDeclaration`s appended to `out`.
pub fn flatten_variable_destructuring<V: NodeVisitor + ?Sized>(
    v: &mut V,
    pattern: NodeIndex,
    value: NodeIndex,
    out: &mut Vec<NodeIndex>,
) {
    trace!(?pattern, "flatten variable destructuring");
    let base = ensure_declared_base(v, pattern, value, out);
    if base.is_none() {
        return;
    }
    flatten_pattern_into_declarations(v, pattern, base, out);
}

/// Flatten a destructuring assignment (`[a, b] = rhs`, `{ x } = rhs`) into a
/// comma expression. When `need_value` is set the sequence ends in the temp
/// so the whole expression still yields the assigned value.
pub fn flatten_destructuring_assignment<V: NodeVisitor + ?Sized>(
    v: &mut V,
    target: NodeIndex,
    value: NodeIndex,
    need_value: bool,
) -> NodeIndex {
    let mut exprs = Vec::new();
    let base = if v.context().arena.kind(value) == SyntaxKind::Identifier && !need_value {
        value
    } else {
        let temp = v.context().create_temp_variable(TempFlags::Auto);
        v.context().hoist_variable_declaration(temp);
        let assignment = v.context().arena.assign(temp, value);
        exprs.push(assignment);
        temp
    };
    flatten_target_into_assignments(v, target, base, &mut exprs);
    if need_value {
        exprs.push(base);
    }
    let ctx = v.context();
    let chain = ctx.arena.comma_chain(exprs);
    ctx.arena.paren(chain)
}

/// Pick (and if needed declare) the simple base the pattern reads from. For
/// an empty pattern this still declares the temp so the initializer's side
/// effects happen.
fn ensure_declared_base<V: NodeVisitor + ?Sized>(
    v: &mut V,
    pattern: NodeIndex,
    value: NodeIndex,
    out: &mut Vec<NodeIndex>,
) -> NodeIndex {
    if value.is_none() {
        return NodeIndex::NONE;
    }
    if v.context().arena.kind(value) == SyntaxKind::Identifier && !pattern_is_empty(v, pattern) {
        return value;
    }
    let ctx = v.context();
    let temp = ctx.create_temp_variable(TempFlags::Auto);
    let decl = ctx.arena.var_declaration(temp, value);
    out.push(decl);
    temp
}

fn pattern_is_empty<V: NodeVisitor + ?Sized>(v: &mut V, pattern: NodeIndex) -> bool {
    let arena = &v.context().arena;
    arena
        .get(pattern)
        .and_then(|n| arena.get_binding_pattern(n))
        .map(|d| d.elements.is_empty())
        .unwrap_or(true)
}

fn flatten_pattern_into_declarations<V: NodeVisitor + ?Sized>(
    v: &mut V,
    pattern: NodeIndex,
    base: NodeIndex,
    out: &mut Vec<NodeIndex>,
) {
    let Some(node) = v.context().arena.get(pattern).copied() else {
        return;
    };
    let Some(data) = v.context().arena.get_binding_pattern(&node).cloned() else {
        return;
    };
    let is_array = node.kind == SyntaxKind::ArrayBindingPattern;
    // Property keys claimed so far, excluded from an object rest element.
    let mut rest_excluded: Vec<String> = Vec::new();

    for (index, &element_idx) in data.elements.iter().enumerate() {
        if v.context().arena.kind(element_idx) == SyntaxKind::OmittedExpression {
            continue;
        }
        let Some(element_node) = v.context().arena.get(element_idx).copied() else {
            continue;
        };
        let Some(element) = v.context().arena.get_binding_element(&element_node).cloned() else {
            continue;
        };

        if element.dot_dot_dot_token {
            let ctx = v.context();
            let rest_value = if is_array {
                // Everything from this index on.
                let slice = ctx.arena.prop_access(base, "slice");
                let start = ctx.arena.numeric_literal(&index.to_string());
                ctx.arena.call(slice, vec![start])
            } else {
                // Unclaimed properties: __rest(base, ["a", ...]).
                let excluded = rest_excluded
                    .iter()
                    .map(|key| ctx.arena.string_literal(key))
                    .collect();
                let keys = ctx.arena.array_literal(excluded);
                let helper = ctx.arena.identifier("__rest");
                ctx.arena.call(helper, vec![base, keys])
            };
            let decl = ctx.arena.var_declaration(element.name, rest_value);
            out.push(decl);
            continue;
        }

        let mut element_value = if is_array {
            let ctx = v.context();
            let i = ctx.arena.numeric_literal(&index.to_string());
            ctx.arena.elem_access(base, i)
        } else {
            if let Some(key) =
                property_key_text(&v.context().arena, element.property_name, element.name)
            {
                rest_excluded.push(key);
            }
            object_member_access(v, base, element.property_name, element.name)
        };

        if element.initializer.is_some() {
            let default = v.visit_expression(element.initializer);
            let ctx = v.context();
            let vz = ctx.arena.void_zero();
            let test = ctx.arena.strict_equals(element_value, vz);
            element_value = ctx.arena.conditional(test, default, element_value);
        }

        if v.context().arena.kind(element.name).is_binding_pattern() {
            // Nested pattern: read into a temp, then recurse off it.
            let ctx = v.context();
            let temp = ctx.create_temp_variable(TempFlags::Auto);
            let decl = ctx.arena.var_declaration(temp, element_value);
            out.push(decl);
            flatten_pattern_into_declarations(v, element.name, temp, out);
        } else {
            let decl = v
                .context()
                .arena
                .var_declaration(element.name, element_value);
            out.push(decl);
        }
    }
}

/// The literal key text of an object-pattern member, for the `__rest`
/// exclusion list. Computed keys have no static text.
fn property_key_text(
    arena: &crate::ast::NodeArena,
    property_name: NodeIndex,
    binding_name: NodeIndex,
) -> Option<String> {
    let key = if property_name.is_some() {
        property_name
    } else {
        binding_name
    };
    let node = arena.get(key)?;
    match node.kind {
        SyntaxKind::Identifier => Some(arena.get_identifier(node)?.escaped_text.clone()),
        SyntaxKind::StringLiteral | SyntaxKind::NumericLiteral => {
            Some(arena.get_literal(node)?.text.clone())
        }
        _ => None,
    }
}

/// The read for one object-pattern member: `base.prop` for identifier keys,
/// `base[key]` for string/numeric/computed keys.
fn object_member_access<V: NodeVisitor + ?Sized>(
    v: &mut V,
    base: NodeIndex,
    property_name: NodeIndex,
    binding_name: NodeIndex,
) -> NodeIndex {
    let key = if property_name.is_some() {
        property_name
    } else {
        binding_name
    };
    match v.context().arena.kind(key) {
        SyntaxKind::Identifier => {
            let text = v
                .context()
                .arena
                .identifier_text(key)
                .unwrap_or_default()
                .to_string();
            v.context().arena.prop_access(base, &text)
        }
        SyntaxKind::ComputedPropertyName => {
            let expr = {
                let arena = &v.context().arena;
                arena
                    .get(key)
                    .and_then(|n| arena.get_computed_property(n))
                    .map(|d| d.expression)
                    .unwrap_or(NodeIndex::NONE)
            };
            let visited = v.visit_expression(expr);
            v.context().arena.elem_access(base, visited)
        }
        _ => v.context().arena.elem_access(base, key),
    }
}

fn flatten_target_into_assignments<V: NodeVisitor + ?Sized>(
    v: &mut V,
    target: NodeIndex,
    base: NodeIndex,
    out: &mut Vec<NodeIndex>,
) {
    let Some(node) = v.context().arena.get(target).copied() else {
        return;
    };
    match node.kind {
        SyntaxKind::ObjectLiteralExpression => {
            let data = v.context().arena.get_literal_expr(&node).cloned().unwrap();
            for &member in &data.elements {
                flatten_object_assignment_member(v, member, base, out);
            }
        }
        SyntaxKind::ArrayLiteralExpression => {
            let data = v.context().arena.get_literal_expr(&node).cloned().unwrap();
            for (index, &element) in data.elements.iter().enumerate() {
                flatten_array_assignment_element(v, element, base, index, out);
            }
        }
        _ => {}
    }
}

fn flatten_object_assignment_member<V: NodeVisitor + ?Sized>(
    v: &mut V,
    member: NodeIndex,
    base: NodeIndex,
    out: &mut Vec<NodeIndex>,
) {
    let Some(node) = v.context().arena.get(member).copied() else {
        return;
    };
    match node.kind {
        SyntaxKind::PropertyAssignment => {
            let data = v
                .context()
                .arena
                .get_property_assignment(&node)
                .cloned()
                .unwrap();
            let read = object_member_access(v, base, data.name, NodeIndex::NONE);
            emit_assignment_for_target(v, data.initializer, read, out);
        }
        SyntaxKind::ShorthandPropertyAssignment => {
            let data = v
                .context()
                .arena
                .get_shorthand_property(&node)
                .cloned()
                .unwrap();
            let read = object_member_access(v, base, data.name, NodeIndex::NONE);
            let target = v.context().arena.clone_identifier(data.name);
            let assignment = v.context().arena.assign(target, read);
            out.push(assignment);
        }
        _ => {}
    }
}

fn flatten_array_assignment_element<V: NodeVisitor + ?Sized>(
    v: &mut V,
    element: NodeIndex,
    base: NodeIndex,
    index: usize,
    out: &mut Vec<NodeIndex>,
) {
    if element.is_none() {
        return;
    }
    match v.context().arena.kind(element) {
        SyntaxKind::OmittedExpression => {}
        SyntaxKind::SpreadElement => {
            let inner = {
                let arena = &v.context().arena;
                arena
                    .get(element)
                    .and_then(|n| arena.get_unary_expr_ex(n))
                    .map(|d| d.expression)
                    .unwrap_or(NodeIndex::NONE)
            };
            let ctx = v.context();
            let slice = ctx.arena.prop_access(base, "slice");
            let start = ctx.arena.numeric_literal(&index.to_string());
            let rest_value = ctx.arena.call(slice, vec![start]);
            emit_assignment_for_target(v, inner, rest_value, out);
        }
        _ => {
            let ctx = v.context();
            let i = ctx.arena.numeric_literal(&index.to_string());
            let read = ctx.arena.elem_access(base, i);
            emit_assignment_for_target(v, element, read, out);
        }
    }
}

/// Assign `value` to `target`, recursing when the target is itself a
/// destructuring literal and honoring `target = default` elements.
fn emit_assignment_for_target<V: NodeVisitor + ?Sized>(
    v: &mut V,
    target: NodeIndex,
    value: NodeIndex,
    out: &mut Vec<NodeIndex>,
) {
    if target.is_none() {
        return;
    }
    match v.context().arena.kind(target) {
        SyntaxKind::ObjectLiteralExpression | SyntaxKind::ArrayLiteralExpression => {
            let ctx = v.context();
            let temp = ctx.create_temp_variable(TempFlags::Auto);
            ctx.hoist_variable_declaration(temp);
            let store = ctx.arena.assign(temp, value);
            out.push(store);
            flatten_target_into_assignments(v, target, temp, out);
        }
        SyntaxKind::BinaryExpression => {
            // `target = default` inside the pattern.
            let node = v.context().arena.get(target).copied().unwrap();
            let data = v.context().arena.get_binary_expr(&node).cloned();
            if let Some(data) = data
                && data.operator_token == SyntaxKind::EqualsToken
            {
                let default = v.visit_expression(data.right);
                let ctx = v.context();
                let vz = ctx.arena.void_zero();
                let test = ctx.arena.strict_equals(value, vz);
                let guarded = ctx.arena.conditional(test, default, value);
                emit_assignment_for_target(v, data.left, guarded, out);
            } else {
                let visited = v.visit_expression(target);
                let assignment = v.context().arena.assign(visited, value);
                out.push(assignment);
            }
        }
        _ => {
            let visited = v.visit_expression(target);
            let assignment = v.context().arena.assign(visited, value);
            out.push(assignment);
        }
    }
}
