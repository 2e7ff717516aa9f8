//! Class lowering.
//!
//! A class becomes an immediately-invoked function expression producing the
//! constructor function:
//!
//! ```text
//! class C extends B { m() { return super.m(); } }
//! // var C = (function (_super) {
//! //     __extends(C, _super);
//! //     function C() { _super.apply(this, arguments); }
//! //     C.prototype.m = function () { return _super.prototype.m.call(this); };
//! //     return C;
//! // }(B));
//! ```
//!
//! The base-class expression is the IIFE's sole argument; member bodies see
//! it as the local `_super`. Paired accessors install through a single
//! `Object.defineProperty` call; loose semicolons survive as empty
//! statements for source-map fidelity.

use super::Es6Transform;
use crate::ast::{NodeFlags, NodeIndex, SyntaxKind, SYNTHETIC_POS};
use crate::transformer::accept::NodeVisitor;

impl Es6Transform<'_> {
    pub(crate) fn visit_class_declaration(&mut self, node: NodeIndex) -> NodeIndex {
        let name = self.class_name(node);
        let value = self.lower_class_like(node, name);
        let arena = &mut self.ctx.arena;
        let binding = arena.clone_identifier(name);
        let declaration = arena.var_declaration(binding, value);
        let statement = arena.var_statement(vec![declaration]);
        let export = self
            .ctx
            .arena
            .get(node)
            .map(|n| n.flags & NodeFlags::EXPORT)
            .unwrap_or_default();
        self.ctx.arena.add_flags(statement, export);
        self.ctx.arena.set_original(statement, node);
        statement
    }

    pub(crate) fn visit_class_expression(&mut self, node: NodeIndex) -> NodeIndex {
        let name = self.class_name(node);
        self.lower_class_like(node, name)
    }

    /// The identifier the lowered members hang off. Anonymous class
    /// expressions get a generated one.
    fn class_name(&mut self, node: NodeIndex) -> NodeIndex {
        let name = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_class(n))
            .map(|d| d.name)
            .unwrap_or(NodeIndex::NONE);
        if name.is_some() {
            name
        } else {
            self.ctx.get_generated_name_for_node(node)
        }
    }

    fn lower_class_like(&mut self, node: NodeIndex, name: NodeIndex) -> NodeIndex {
        let Some(data) = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_class(n))
            .cloned()
        else {
            return node;
        };

        let base = self.extends_expression(&data.heritage_clauses);
        let visited_base = if base.is_some() {
            self.visit_expression(base)
        } else {
            NodeIndex::NONE
        };
        let has_base = base.is_some();

        // The IIFE is a new hoisting scope; temps requested while lowering
        // members surface at the top of its body.
        self.ctx.start_lexical_environment();
        let mut statements = Vec::new();

        if has_base {
            let arena = &mut self.ctx.arena;
            let helper = arena.identifier("__extends");
            let class_ref = arena.clone_identifier(name);
            let super_ref = arena.identifier("_super");
            let call = arena.call(helper, vec![class_ref, super_ref]);
            statements.push(arena.expression_statement(call));
        }

        statements.push(self.lower_constructor(&data.members, name, has_base));
        self.lower_members(&data.members, name, &mut statements);

        if let Some(hoisted) = self.ctx.end_lexical_environment() {
            statements.insert(0, hoisted);
        }
        let arena = &mut self.ctx.arena;
        let result_ref = arena.clone_identifier(name);
        statements.push(arena.return_statement(result_ref));

        let parameters = if has_base {
            let super_param = arena.identifier("_super");
            vec![arena.parameter(super_param)]
        } else {
            Vec::new()
        };
        let body = arena.block(statements, true);
        let wrapper = arena.function_expression(NodeIndex::NONE, parameters, body);
        let arguments = if has_base { vec![visited_base] } else { Vec::new() };
        let invocation = arena.call(wrapper, arguments);
        let value = arena.paren(invocation);
        arena.set_original(value, node);
        value
    }

    fn extends_expression(&self, heritage: &Option<crate::ast::NodeList>) -> NodeIndex {
        let Some(clauses) = heritage else {
            return NodeIndex::NONE;
        };
        let arena = &self.ctx.arena;
        for &clause_idx in clauses {
            let Some(clause_node) = arena.get(clause_idx) else {
                continue;
            };
            let Some(clause) = arena.get_heritage_clause(clause_node) else {
                continue;
            };
            if clause.token != SyntaxKind::ExtendsKeyword {
                continue;
            }
            let Some(&first) = clause.types.nodes.first() else {
                continue;
            };
            let Some(first_node) = arena.get(first) else {
                continue;
            };
            if first_node.kind == SyntaxKind::ExpressionWithTypeArguments {
                if let Some(d) = arena.get_expr_type_args(first_node) {
                    return d.expression;
                }
            }
            return first;
        }
        NodeIndex::NONE
    }

    /// Synthesize the constructor function declaration. A source constructor
    /// lowers like any function, with generated super-call placeholders
    /// materialized; a missing one becomes empty, or a bare
    /// `_super.apply(this, arguments);` forwarder for derived classes.
    fn lower_constructor(
        &mut self,
        members: &crate::ast::NodeList,
        name: NodeIndex,
        has_base: bool,
    ) -> NodeIndex {
        let ctor = members.iter().copied().find(|&m| {
            self.ctx.arena.kind(m) == SyntaxKind::Constructor
                && self
                    .ctx
                    .arena
                    .get(m)
                    .and_then(|n| self.ctx.arena.get_function(n))
                    .map(|d| d.body.is_some())
                    .unwrap_or(false)
        });

        let ctor_name = self.ctx.arena.clone_identifier(name);
        match ctor {
            Some(ctor) => {
                let emit_this = self
                    .ctx
                    .arena
                    .get(ctor)
                    .map(|n| {
                        n.transform_flags.contains(
                            crate::ast::TransformFlags::CONTAINS_CAPTURED_LEXICAL_THIS,
                        )
                    })
                    .unwrap_or(false);
                let was = self.in_derived_constructor;
                self.in_derived_constructor = has_base;
                let (parameters, body) = self.lower_function_like(ctor, emit_this);
                self.in_derived_constructor = was;
                let arena = &mut self.ctx.arena;
                let result = arena.alloc_function(
                    SyntaxKind::FunctionDeclaration,
                    SYNTHETIC_POS,
                    SYNTHETIC_POS,
                    crate::ast::node::FunctionData {
                        name: ctor_name,
                        parameters,
                        body,
                    },
                );
                arena.set_original(result, ctor);
                result
            }
            None => {
                let mut body_statements = Vec::new();
                if has_base {
                    body_statements.push(self.default_super_call_statement(NodeIndex::NONE));
                }
                let arena = &mut self.ctx.arena;
                let body = arena.block(body_statements, has_base);
                arena.function_declaration(ctor_name, Vec::new(), body)
            }
        }
    }

    fn lower_members(
        &mut self,
        members: &crate::ast::NodeList,
        name: NodeIndex,
        out: &mut Vec<NodeIndex>,
    ) {
        let mut installed_accessors: Vec<String> = Vec::new();

        for &member in members {
            let kind = self.ctx.arena.kind(member);
            match kind {
                SyntaxKind::Constructor => {}
                SyntaxKind::SemicolonClassElement => {
                    let stmt = self.ctx.arena.empty_statement();
                    self.ctx.arena.set_original(stmt, member);
                    out.push(stmt);
                }
                SyntaxKind::MethodDeclaration => {
                    let has_body = self
                        .ctx
                        .arena
                        .get(member)
                        .and_then(|n| self.ctx.arena.get_function(n))
                        .map(|d| d.body.is_some())
                        .unwrap_or(false);
                    if !has_body {
                        continue;
                    }
                    let receiver = self.member_receiver(member, name);
                    let member_name = self
                        .ctx
                        .arena
                        .get(member)
                        .and_then(|n| self.ctx.arena.get_function(n))
                        .map(|d| d.name)
                        .unwrap_or(NodeIndex::NONE);
                    let target = self.member_target(receiver, member_name);
                    let func = self.method_to_function_expression(member);
                    let arena = &mut self.ctx.arena;
                    let assignment = arena.assign(target, func);
                    let stmt = arena.expression_statement(assignment);
                    arena.set_original(stmt, member);
                    out.push(stmt);
                }
                SyntaxKind::GetAccessor | SyntaxKind::SetAccessor => {
                    let Some(key) = self.accessor_key(member) else {
                        continue;
                    };
                    if installed_accessors.contains(&key) {
                        continue;
                    }
                    installed_accessors.push(key.clone());
                    let stmt = self.install_accessor_pair(members, member, name, &key);
                    out.push(stmt);
                }
                _ => {}
            }
        }
    }

    /// `Name.prototype` for instance members, `Name` for statics.
    fn member_receiver(&mut self, member: NodeIndex, name: NodeIndex) -> NodeIndex {
        let is_static = self
            .ctx
            .arena
            .get(member)
            .map(|n| n.flags.contains(NodeFlags::STATIC))
            .unwrap_or(false);
        let arena = &mut self.ctx.arena;
        let class_ref = arena.clone_identifier(name);
        if is_static {
            class_ref
        } else {
            arena.prop_access(class_ref, "prototype")
        }
    }

    /// Assignment target for a member name: `recv.m`, `recv["m"]`, or
    /// `recv[computed]`.
    pub(crate) fn member_target(&mut self, receiver: NodeIndex, member_name: NodeIndex) -> NodeIndex {
        match self.ctx.arena.kind(member_name) {
            SyntaxKind::Identifier => {
                let text = self
                    .ctx
                    .arena
                    .identifier_text(member_name)
                    .unwrap_or_default()
                    .to_string();
                self.ctx.arena.prop_access(receiver, &text)
            }
            SyntaxKind::ComputedPropertyName => {
                let expr = {
                    let arena = &self.ctx.arena;
                    arena
                        .get(member_name)
                        .and_then(|n| arena.get_computed_property(n))
                        .map(|d| d.expression)
                        .unwrap_or(NodeIndex::NONE)
                };
                let visited = self.visit_expression(expr);
                self.ctx.arena.elem_access(receiver, visited)
            }
            _ => self.ctx.arena.elem_access(receiver, member_name),
        }
    }

    /// Non-computed accessor key text used for pairing get and set.
    fn accessor_key(&self, member: NodeIndex) -> Option<String> {
        let arena = &self.ctx.arena;
        let name = arena
            .get(member)
            .and_then(|n| arena.get_function(n))
            .map(|d| d.name)?;
        let name_node = arena.get(name)?;
        match name_node.kind {
            SyntaxKind::Identifier => Some(arena.get_identifier(name_node)?.escaped_text.clone()),
            SyntaxKind::StringLiteral | SyntaxKind::NumericLiteral => {
                Some(arena.get_literal(name_node)?.text.clone())
            }
            _ => None,
        }
    }

    /// ```text
    /// Object.defineProperty(Name.prototype, "key", {
    ///     get: function () { ... },
    ///     set: function (v) { ... },
    ///     enumerable: true,
    ///     configurable: true
    /// });
    /// ```
    /// emitted at the first accessor of the pair.
    fn install_accessor_pair(
        &mut self,
        members: &crate::ast::NodeList,
        first: NodeIndex,
        name: NodeIndex,
        key: &str,
    ) -> NodeIndex {
        let first_is_static = self
            .ctx
            .arena
            .get(first)
            .map(|n| n.flags.contains(NodeFlags::STATIC))
            .unwrap_or(false);

        let mut getter = NodeIndex::NONE;
        let mut setter = NodeIndex::NONE;
        for &member in members {
            let kind = self.ctx.arena.kind(member);
            if kind != SyntaxKind::GetAccessor && kind != SyntaxKind::SetAccessor {
                continue;
            }
            let is_static = self
                .ctx
                .arena
                .get(member)
                .map(|n| n.flags.contains(NodeFlags::STATIC))
                .unwrap_or(false);
            if is_static != first_is_static || self.accessor_key(member).as_deref() != Some(key) {
                continue;
            }
            if kind == SyntaxKind::GetAccessor {
                getter = member;
            } else {
                setter = member;
            }
        }

        let mut properties = Vec::new();
        if getter.is_some() {
            let func = self.method_to_function_expression(getter);
            let arena = &mut self.ctx.arena;
            let prop_name = arena.identifier("get");
            properties.push(arena.property_assignment(prop_name, func));
        }
        if setter.is_some() {
            let func = self.method_to_function_expression(setter);
            let arena = &mut self.ctx.arena;
            let prop_name = arena.identifier("set");
            properties.push(arena.property_assignment(prop_name, func));
        }
        let receiver = self.member_receiver(first, name);
        let arena = &mut self.ctx.arena;
        for flag in ["enumerable", "configurable"] {
            let prop_name = arena.identifier(flag);
            let value = arena.alloc_token(SyntaxKind::TrueKeyword, SYNTHETIC_POS, SYNTHETIC_POS);
            properties.push(arena.property_assignment(prop_name, value));
        }
        let descriptor = arena.object_literal(properties, true);
        let object = arena.identifier("Object");
        let define = arena.prop_access(object, "defineProperty");
        let key_literal = arena.string_literal(key);
        let call = arena.call(define, vec![receiver, key_literal, descriptor]);
        let stmt = arena.expression_statement(call);
        arena.set_original(stmt, first);
        stmt
    }
}
