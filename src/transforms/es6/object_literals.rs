//! Object literals with computed property keys.
//!
//! The literal splits at the first computed key: everything before it stays
//! a plain literal assigned to a hoisted temp, and every remaining property
//! becomes an assignment onto the temp, sequenced in source order so key and
//! value side effects keep their evaluation order. The whole rewrite is a
//! parenthesized comma expression ending in the temp:
//!
//! ```text
//! { a: 1, [k()]: 2, b: 3 }
//! // (_a = { a: 1 }, _a[k()] = 2, _a.b = 3, _a)
//! ```

use super::Es6Transform;
use crate::ast::transform_flags::property_name_of;
use crate::ast::{NodeIndex, SyntaxKind, TempFlags};
use crate::diagnostics::Diagnostic;
use crate::transformer::accept::{NodeVisitor, accept};

impl Es6Transform<'_> {
    pub(crate) fn visit_object_literal(&mut self, node: NodeIndex) -> NodeIndex {
        let Some(data) = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_literal_expr(n))
            .cloned()
        else {
            return node;
        };

        let first_computed = data.elements.iter().position(|&member| {
            property_name_of(&self.ctx.arena, member)
                .map(|name| self.ctx.arena.kind(name) == SyntaxKind::ComputedPropertyName)
                .unwrap_or(false)
        });
        let Some(first_computed) = first_computed else {
            // The flag pass promised a computed key; this is an upstream
            // invariant break.
            let (file_name, line, column) = self.node_location(node);
            self.ctx.push_diagnostic(Diagnostic::error(
                "object literal flagged as containing computed properties contains none",
                file_name,
                line,
                column,
            ));
            return accept(self, node);
        };

        let temp = self.ctx.create_temp_variable(TempFlags::Auto);
        self.ctx.hoist_variable_declaration(temp);

        let mut expressions = Vec::new();

        let mut leading = Vec::with_capacity(first_computed);
        for &member in &data.elements.nodes[..first_computed] {
            leading.push(self.visit_node(member));
        }
        let arena = &mut self.ctx.arena;
        let object = arena.object_literal(leading, data.multi_line);
        expressions.push(arena.assign(temp, object));

        for &member in &data.elements.nodes[first_computed..] {
            self.lower_trailing_member(member, temp, &mut expressions);
        }

        expressions.push(temp);
        let arena = &mut self.ctx.arena;
        let sequence = arena.comma_chain(expressions);
        let result = arena.paren(sequence);
        arena.set_original(result, node);
        result
    }

    /// One property after the split, as an assignment (or defineProperty
    /// call) on the temp.
    fn lower_trailing_member(
        &mut self,
        member: NodeIndex,
        temp: NodeIndex,
        out: &mut Vec<NodeIndex>,
    ) {
        match self.ctx.arena.kind(member) {
            SyntaxKind::PropertyAssignment => {
                let Some(data) = self
                    .ctx
                    .arena
                    .get(member)
                    .and_then(|n| self.ctx.arena.get_property_assignment(n))
                    .cloned()
                else {
                    return;
                };
                let target = self.member_target(temp, data.name);
                let value = self.visit_expression(data.initializer);
                out.push(self.ctx.arena.assign(target, value));
            }
            SyntaxKind::ShorthandPropertyAssignment => {
                let Some(data) = self
                    .ctx
                    .arena
                    .get(member)
                    .and_then(|n| self.ctx.arena.get_shorthand_property(n))
                    .cloned()
                else {
                    return;
                };
                let target = self.member_target(temp, data.name);
                let value = self.ctx.arena.clone_identifier(data.name);
                out.push(self.ctx.arena.assign(target, value));
            }
            SyntaxKind::MethodDeclaration => {
                let name = self
                    .ctx
                    .arena
                    .get(member)
                    .and_then(|n| self.ctx.arena.get_function(n))
                    .map(|d| d.name)
                    .unwrap_or(NodeIndex::NONE);
                let target = self.member_target(temp, name);
                let func = self.method_to_function_expression(member);
                out.push(self.ctx.arena.assign(target, func));
            }
            SyntaxKind::GetAccessor | SyntaxKind::SetAccessor => {
                out.push(self.define_accessor_property(member, temp));
            }
            _ => {}
        }
    }

    /// `Object.defineProperty(_a, key, { get|set, enumerable, configurable })`
    /// for an accessor landing after the computed split.
    fn define_accessor_property(&mut self, member: NodeIndex, temp: NodeIndex) -> NodeIndex {
        let kind = self.ctx.arena.kind(member);
        let name = self
            .ctx
            .arena
            .get(member)
            .and_then(|n| self.ctx.arena.get_function(n))
            .map(|d| d.name)
            .unwrap_or(NodeIndex::NONE);
        let key = self.property_key_expression(name);
        let func = self.method_to_function_expression(member);
        let arena = &mut self.ctx.arena;
        let mut properties = Vec::new();
        let accessor_slot = if kind == SyntaxKind::GetAccessor {
            "get"
        } else {
            "set"
        };
        let slot_name = arena.identifier(accessor_slot);
        properties.push(arena.property_assignment(slot_name, func));
        for flag in ["enumerable", "configurable"] {
            let flag_name = arena.identifier(flag);
            let value = arena.alloc_token(
                SyntaxKind::TrueKeyword,
                crate::ast::SYNTHETIC_POS,
                crate::ast::SYNTHETIC_POS,
            );
            properties.push(arena.property_assignment(flag_name, value));
        }
        let descriptor = arena.object_literal(properties, true);
        let object = arena.identifier("Object");
        let define = arena.prop_access(object, "defineProperty");
        arena.call(define, vec![temp, key, descriptor])
    }

    /// A property name as a key expression: identifier names become string
    /// literals, computed names are their visited expressions, literal names
    /// pass through.
    fn property_key_expression(&mut self, name: NodeIndex) -> NodeIndex {
        match self.ctx.arena.kind(name) {
            SyntaxKind::Identifier => {
                let text = self
                    .ctx
                    .arena
                    .identifier_text(name)
                    .unwrap_or_default()
                    .to_string();
                self.ctx.arena.string_literal(&text)
            }
            SyntaxKind::ComputedPropertyName => {
                let expr = {
                    let arena = &self.ctx.arena;
                    arena
                        .get(name)
                        .and_then(|n| arena.get_computed_property(n))
                        .map(|d| d.expression)
                        .unwrap_or(NodeIndex::NONE)
                };
                self.visit_expression(expr)
            }
            _ => name,
        }
    }
}
