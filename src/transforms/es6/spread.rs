//! Spread lowering and `super` call sites.
//!
//! ```text
//! f(1, ...xs, 2)      // f.apply(void 0, [1].concat(xs, [2]))
//! o.m(...xs)          // o.m.apply(o, xs)
//! g().m(...xs)        // (_a = g(), _a.m.apply(_a, xs))
//! new F(...xs)        // new (F.bind.apply(F, [void 0].concat(xs)))()
//! [...xs, 1]          // xs.concat([1])
//! [...xs]             // xs.slice()
//! super(a)            // _super.call(this, a)
//! super.m(a)          // _super.prototype.m.call(this, a)
//! ```
//!
//! Argument lists segment at each spread: runs of plain arguments group into
//! array-literal segments, spread operands pass through, and the segments
//! join with `concat` off the first one.

use super::Es6Transform;
use crate::ast::node::AccessExprData;
use crate::ast::{NodeIndex, NodeList, SyntaxKind, TempFlags, SYNTHETIC_POS};
use crate::transformer::accept::{NodeVisitor, accept};

/// One `concat` operand: an array-literal segment of plain arguments, or a
/// spread operand used as-is.
enum Segment {
    Literal(NodeIndex),
    Spread(NodeIndex),
}

impl Segment {
    fn expression(&self) -> NodeIndex {
        match *self {
            Segment::Literal(e) | Segment::Spread(e) => e,
        }
    }
}

impl Es6Transform<'_> {
    pub(crate) fn visit_call_expression(&mut self, node: NodeIndex) -> NodeIndex {
        let Some(data) = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_call_expr(n))
            .cloned()
        else {
            return node;
        };
        let arguments = data.arguments.clone().unwrap_or_default();
        let has_spread = self.has_spread_argument(&arguments);
        let callee_kind = self.ctx.arena.kind(data.expression);

        let result = if callee_kind == SyntaxKind::SuperKeyword {
            self.lower_super_call(data.expression, &arguments, has_spread)
        } else if self.is_super_member_callee(data.expression) {
            self.lower_super_method_call(data.expression, &arguments, has_spread)
        } else if has_spread {
            self.lower_spread_call(data.expression, &arguments)
        } else {
            // Flagged under this kind for no reason this rewriter knows.
            return accept(self, node);
        };
        self.ctx.arena.set_original(result, node);
        result
    }

    pub(crate) fn visit_new_expression(&mut self, node: NodeIndex) -> NodeIndex {
        let Some(data) = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_call_expr(n))
            .cloned()
        else {
            return node;
        };
        let arguments = data.arguments.clone().unwrap_or_default();
        if !self.has_spread_argument(&arguments) {
            return accept(self, node);
        }

        // new (F.bind.apply(F, [void 0].concat(args)))()
        let callee = self.visit_expression(data.expression);
        let segments = self.spread_segments(&arguments);
        let arena = &mut self.ctx.arena;
        let vz = arena.void_zero();
        let prefix = arena.array_literal(vec![vz]);
        let args_array = concat_chain(arena, prefix, segments);
        let bind = arena.prop_access(callee, "bind");
        let bind_apply = arena.prop_access(bind, "apply");
        let bound = arena.call(bind_apply, vec![callee, args_array]);
        let parenthesized = arena.paren(bound);
        let result = arena.new_expression(parenthesized, vec![]);
        arena.set_original(result, node);
        result
    }

    pub(crate) fn visit_array_literal(&mut self, node: NodeIndex) -> NodeIndex {
        let Some(data) = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_literal_expr(n))
            .cloned()
        else {
            return node;
        };
        if !self.has_spread_argument(&data.elements) {
            return accept(self, node);
        }

        let segments = self.spread_segments(&data.elements);
        let arena = &mut self.ctx.arena;
        let result = match segments.split_first() {
            Some((Segment::Spread(only), [])) => {
                // A lone spread still copies: [...xs] reads xs fresh.
                let slice = arena.prop_access(*only, "slice");
                arena.call(slice, vec![])
            }
            Some((first, rest)) => {
                let receiver = first.expression();
                let rest: Vec<NodeIndex> = rest.iter().map(Segment::expression).collect();
                let concat = arena.prop_access(receiver, "concat");
                arena.call(concat, rest)
            }
            None => arena.array_literal(vec![]),
        };
        arena.set_original(result, node);
        result
    }

    fn has_spread_argument(&self, arguments: &NodeList) -> bool {
        arguments
            .iter()
            .any(|&a| self.ctx.arena.kind(a) == SyntaxKind::SpreadElement)
    }

    fn is_super_member_callee(&self, callee: NodeIndex) -> bool {
        let arena = &self.ctx.arena;
        let Some(node) = arena.get(callee) else {
            return false;
        };
        matches!(
            node.kind,
            SyntaxKind::PropertyAccessExpression | SyntaxKind::ElementAccessExpression
        ) && arena
            .get_access_expr(node)
            .map(|d| arena.kind(d.expression) == SyntaxKind::SuperKeyword)
            .unwrap_or(false)
    }

    /// `super(...)`: the receiver is `this`, the callee is `_super`.
    fn lower_super_call(
        &mut self,
        _super_node: NodeIndex,
        arguments: &NodeList,
        has_spread: bool,
    ) -> NodeIndex {
        let callee = self.ctx.arena.identifier("_super");
        self.call_with_this_receiver(callee, arguments, has_spread)
    }

    /// `super.m(...)` / `super[k](...)`: resolve the member off `_super`
    /// (`_super.prototype` for instance references) and call it with the
    /// current `this`.
    fn lower_super_method_call(
        &mut self,
        callee: NodeIndex,
        arguments: &NodeList,
        has_spread: bool,
    ) -> NodeIndex {
        let Some(header) = self.ctx.arena.get(callee).copied() else {
            return callee;
        };
        let Some(access) = self.ctx.arena.get_access_expr(&header).cloned() else {
            return callee;
        };
        let receiver = self.super_receiver(access.expression);
        let name_or_argument = if header.kind == SyntaxKind::ElementAccessExpression {
            self.visit_expression(access.name_or_argument)
        } else {
            access.name_or_argument
        };
        let member = self.ctx.arena.alloc_access_expr(
            header.kind,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            AccessExprData {
                expression: receiver,
                name_or_argument,
            },
        );
        self.call_with_this_receiver(member, arguments, has_spread)
    }

    /// `callee.call(this, args...)`, or `callee.apply(this, [..concat..])`
    /// when a spread is present.
    fn call_with_this_receiver(
        &mut self,
        callee: NodeIndex,
        arguments: &NodeList,
        has_spread: bool,
    ) -> NodeIndex {
        if has_spread {
            let segments = self.spread_segments(arguments);
            let arena = &mut self.ctx.arena;
            let args_array = concat_segments(arena, segments);
            let apply = arena.prop_access(callee, "apply");
            let this = arena.this_expression();
            arena.call(apply, vec![this, args_array])
        } else {
            let mut args = Vec::with_capacity(arguments.len() + 1);
            args.push(self.ctx.arena.this_expression());
            for &arg in arguments {
                args.push(self.visit_expression(arg));
            }
            let arena = &mut self.ctx.arena;
            let call = arena.prop_access(callee, "call");
            arena.call(call, args)
        }
    }

    /// `f(a, ...b)` and friends: pick the `this` receiver per the callee
    /// shape and apply the segmented argument array.
    fn lower_spread_call(&mut self, callee: NodeIndex, arguments: &NodeList) -> NodeIndex {
        let callee_kind = self.ctx.arena.kind(callee);
        if matches!(
            callee_kind,
            SyntaxKind::PropertyAccessExpression | SyntaxKind::ElementAccessExpression
        ) {
            let header = self.ctx.arena.get(callee).copied().unwrap();
            let access = self.ctx.arena.get_access_expr(&header).cloned().unwrap();
            let object = self.visit_expression(access.expression);
            let name_or_argument = if header.kind == SyntaxKind::ElementAccessExpression {
                self.visit_expression(access.name_or_argument)
            } else {
                access.name_or_argument
            };

            if matches!(
                self.ctx.arena.kind(object),
                SyntaxKind::Identifier | SyntaxKind::ThisKeyword
            ) {
                // obj.m(...xs) -> obj.m.apply(obj, xs)
                let segments = self.spread_segments(arguments);
                let arena = &mut self.ctx.arena;
                let member = arena.alloc_access_expr(
                    header.kind,
                    SYNTHETIC_POS,
                    SYNTHETIC_POS,
                    AccessExprData {
                        expression: object,
                        name_or_argument,
                    },
                );
                let args_array = concat_segments(arena, segments);
                let apply = arena.prop_access(member, "apply");
                arena.call(apply, vec![object, args_array])
            } else {
                // (_a = g(), _a.m.apply(_a, xs))
                let temp = self.ctx.create_temp_variable(TempFlags::Auto);
                self.ctx.hoist_variable_declaration(temp);
                let segments = self.spread_segments(arguments);
                let arena = &mut self.ctx.arena;
                let capture = arena.assign(temp, object);
                let member = arena.alloc_access_expr(
                    header.kind,
                    SYNTHETIC_POS,
                    SYNTHETIC_POS,
                    AccessExprData {
                        expression: temp,
                        name_or_argument,
                    },
                );
                let args_array = concat_segments(arena, segments);
                let apply = arena.prop_access(member, "apply");
                let invocation = arena.call(apply, vec![temp, args_array]);
                let sequence = arena.comma_chain(vec![capture, invocation]);
                arena.paren(sequence)
            }
        } else {
            // Bare call: the receiver slot is void 0.
            let target = self.visit_expression(callee);
            let segments = self.spread_segments(arguments);
            let arena = &mut self.ctx.arena;
            let args_array = concat_segments(arena, segments);
            let apply = arena.prop_access(target, "apply");
            let vz = arena.void_zero();
            arena.call(apply, vec![vz, args_array])
        }
    }

    /// Visit an argument list and group it into `concat` operands.
    fn spread_segments(&mut self, arguments: &NodeList) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut run: Vec<NodeIndex> = Vec::new();
        for &arg in arguments {
            if self.ctx.arena.kind(arg) == SyntaxKind::SpreadElement {
                if !run.is_empty() {
                    let literal = self.ctx.arena.array_literal(std::mem::take(&mut run));
                    segments.push(Segment::Literal(literal));
                }
                let inner = {
                    let arena = &self.ctx.arena;
                    arena
                        .get(arg)
                        .and_then(|n| arena.get_unary_expr_ex(n))
                        .map(|d| d.expression)
                        .unwrap_or(NodeIndex::NONE)
                };
                let visited = self.visit_expression(inner);
                segments.push(Segment::Spread(visited));
            } else {
                run.push(self.visit_expression(arg));
            }
        }
        if !run.is_empty() {
            let literal = self.ctx.arena.array_literal(run);
            segments.push(Segment::Literal(literal));
        }
        segments
    }
}

/// Join segments into one array expression: the first segment is the
/// receiver, the rest become `concat` arguments. A single spread segment is
/// used as-is (safe under `apply`, which never mutates its argument array).
fn concat_segments(arena: &mut crate::ast::NodeArena, segments: Vec<Segment>) -> NodeIndex {
    match segments.split_first() {
        None => arena.array_literal(vec![]),
        Some((first, [])) => first.expression(),
        Some((first, rest)) => {
            let receiver = first.expression();
            let rest: Vec<NodeIndex> = rest.iter().map(Segment::expression).collect();
            let concat = arena.prop_access(receiver, "concat");
            arena.call(concat, rest)
        }
    }
}

/// Like `concat_segments` with a fixed leading receiver (the `[void 0]` of
/// the `bind.apply` rewrite).
fn concat_chain(
    arena: &mut crate::ast::NodeArena,
    receiver: NodeIndex,
    segments: Vec<Segment>,
) -> NodeIndex {
    let rest: Vec<NodeIndex> = segments.iter().map(Segment::expression).collect();
    let concat = arena.prop_access(receiver, "concat");
    arena.call(concat, rest)
}
