//! The ES2015-to-ES5 rewriter.
//!
//! A single top-down pass keyed on precomputed `TransformFlags`. Per node
//! the dispatcher makes a three-way decision: rewrite it here (its own `ES6`
//! bit is set), reconstruct it around visited children (only `CONTAINS_ES6`
//! is set), or hand it back untouched. The pass stays O(touched nodes); a
//! clean subtree is never walked.
//!
//! Construct-specific lowerings live in sibling modules: functions (default
//! parameters, rest, arrows, captured `this`), classes, `for-of`, block
//! scoping, spread, template literals, and object literals. Identifier and
//! `this` rewrites that depend on emit position are registered as
//! substitution stages the emitter consults per reference.

mod block_scoping;
mod classes;
mod for_of;
mod functions;
mod object_literals;
mod spread;
mod templates;

use crate::ast::{NodeFlags, NodeIndex, SyntaxKind, TransformFlags};
use crate::ast::node::SourceFileData;
use crate::diagnostics::Diagnostic;
use crate::options::ScriptTarget;
use crate::source_file::SourceFile;
use crate::transformer::TransformContext;
use crate::transformer::accept::{NodeVisitor, accept};
use std::sync::Arc;
use tracing::{debug, trace};

/// Create and run the ES6 transform over one source file, returning the
/// (possibly identical) replacement source-file node. For an ES2015 target
/// the transform is the identity.
pub fn transform_source_file(ctx: &mut TransformContext, file: NodeIndex) -> NodeIndex {
    if ctx.options().target >= ScriptTarget::ES2015 {
        return file;
    }
    ctx.set_expression_substitution(es6_substitute_expression);
    ctx.set_binding_identifier_substitution(es6_substitute_binding_identifier);
    ctx.prime_source_names(file);

    let source = {
        let arena = &ctx.arena;
        arena
            .get(file)
            .and_then(|n| arena.get_source_file(n))
            .map(|d| d.source.clone())
    };
    let mut transform = Es6Transform {
        ctx,
        source,
        in_derived_constructor: false,
    };
    transform.visit_source_file(file)
}

pub(crate) struct Es6Transform<'a> {
    pub(crate) ctx: &'a mut TransformContext,
    /// The file under transform, for raw-text slicing and diagnostic
    /// locations.
    pub(crate) source: Option<Arc<SourceFile>>,
    /// Set while lowering the body of a constructor in a derived class, so
    /// generated super-call placeholders can be materialized.
    pub(crate) in_derived_constructor: bool,
}

impl NodeVisitor for Es6Transform<'_> {
    fn context(&mut self) -> &mut TransformContext {
        self.ctx
    }

    fn visit_expression(&mut self, node: NodeIndex) -> NodeIndex {
        if node.is_none() {
            return node;
        }
        let flags = self.transform_flags(node);
        if flags.contains(TransformFlags::ES6) {
            self.ctx.push_node(node);
            let result = self.rewrite_expression(node);
            self.ctx.pop_node();
            result
        } else if flags.contains(TransformFlags::CONTAINS_ES6) {
            self.ctx.push_node(node);
            let result = accept(self, node);
            self.ctx.pop_node();
            result
        } else {
            node
        }
    }

    fn visit_statement(&mut self, node: NodeIndex, out: &mut Vec<NodeIndex>) {
        if node.is_none() {
            return;
        }
        if self.in_derived_constructor && self.is_generated_statement(node) {
            out.push(self.default_super_call_statement(node));
            return;
        }
        let flags = self.transform_flags(node);
        if flags.contains(TransformFlags::ES6) {
            self.ctx.push_node(node);
            self.rewrite_statement(node, out);
            self.ctx.pop_node();
        } else if flags.contains(TransformFlags::CONTAINS_ES6) {
            self.ctx.push_node(node);
            let result = accept(self, node);
            self.ctx.pop_node();
            out.push(result);
        } else {
            out.push(node);
        }
    }

    fn visit_node(&mut self, node: NodeIndex) -> NodeIndex {
        if node.is_none() {
            return node;
        }
        let flags = self.transform_flags(node);
        if flags.contains(TransformFlags::ES6) {
            self.ctx.push_node(node);
            let result = self.rewrite_other(node);
            self.ctx.pop_node();
            result
        } else if flags.contains(TransformFlags::CONTAINS_ES6) {
            self.ctx.push_node(node);
            let result = accept(self, node);
            self.ctx.pop_node();
            result
        } else {
            node
        }
    }
}

impl Es6Transform<'_> {
    fn transform_flags(&self, node: NodeIndex) -> TransformFlags {
        self.ctx
            .arena
            .get(node)
            .map(|n| n.transform_flags)
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Source file
    // -------------------------------------------------------------------------

    fn visit_source_file(&mut self, file: NodeIndex) -> NodeIndex {
        let Some(node) = self.ctx.arena.get(file).copied() else {
            return file;
        };
        let Some(data) = self.ctx.arena.get_source_file(&node).cloned() else {
            return file;
        };
        debug!(file = %data.source.file_name(), "transform source file");

        self.ctx.push_node(file);
        self.ctx.start_lexical_environment();

        let mut statements = Vec::with_capacity(data.statements.len());
        let mut rest = &data.statements.nodes[..];

        // Prologue directives pass through unchanged.
        while let Some(&first) = rest.first() {
            if !self.is_prologue_directive(first) {
                break;
            }
            statements.push(first);
            rest = &rest[1..];
        }

        if node
            .transform_flags
            .contains(TransformFlags::CONTAINS_CAPTURED_LEXICAL_THIS)
        {
            statements.push(self.captured_this_statement());
        }

        let body_start = statements.len();
        for &stmt in rest {
            self.visit_statement(stmt, &mut statements);
        }

        if let Some(hoisted) = self.ctx.end_lexical_environment() {
            statements.insert(body_start, hoisted);
        }
        self.ctx.pop_node();

        let unchanged = statements.len() == data.statements.len()
            && statements.iter().zip(&data.statements).all(|(a, b)| a == b);
        if unchanged {
            return file;
        }

        let rebuilt = self.ctx.arena.alloc_source_file(
            node.pos,
            node.end,
            SourceFileData {
                source: data.source,
                statements: statements.into_iter().collect(),
            },
        );
        self.ctx.arena.set_flags(rebuilt, node.flags);
        self.ctx.arena.set_original(rebuilt, file);
        rebuilt
    }

    fn is_prologue_directive(&self, stmt: NodeIndex) -> bool {
        let arena = &self.ctx.arena;
        let Some(node) = arena.get(stmt) else {
            return false;
        };
        arena
            .get_expression_statement(node)
            .map(|d| arena.kind(d.expression) == SyntaxKind::StringLiteral)
            .unwrap_or(false)
    }

    /// `var _this = this;`
    pub(crate) fn captured_this_statement(&mut self) -> NodeIndex {
        let arena = &mut self.ctx.arena;
        let name = arena.identifier("_this");
        let this = arena.this_expression();
        let decl = arena.var_declaration(name, this);
        arena.var_statement(vec![decl])
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    fn rewrite_expression(&mut self, node: NodeIndex) -> NodeIndex {
        trace!(kind = ?self.ctx.arena.kind(node), "rewrite expression");
        match self.ctx.arena.kind(node) {
            SyntaxKind::ArrowFunction => self.visit_arrow_function(node),
            SyntaxKind::FunctionExpression => self.visit_function_expression(node),
            SyntaxKind::ClassExpression => self.visit_class_expression(node),
            SyntaxKind::CallExpression => self.visit_call_expression(node),
            SyntaxKind::NewExpression => self.visit_new_expression(node),
            SyntaxKind::ArrayLiteralExpression => self.visit_array_literal(node),
            SyntaxKind::ObjectLiteralExpression => self.visit_object_literal(node),
            SyntaxKind::TemplateExpression => self.visit_template_expression(node),
            SyntaxKind::NoSubstitutionTemplateLiteral => self.visit_no_substitution_template(node),
            SyntaxKind::TaggedTemplateExpression => self.visit_tagged_template(node),
            SyntaxKind::PropertyAccessExpression | SyntaxKind::ElementAccessExpression => {
                self.visit_super_member_access(node)
            }
            SyntaxKind::SuperKeyword => self.visit_super_keyword(node),
            SyntaxKind::BinaryExpression => self.visit_destructuring_assignment(node),
            _ => {
                self.report_unsupported(node);
                accept(self, node)
            }
        }
    }

    fn rewrite_statement(&mut self, node: NodeIndex, out: &mut Vec<NodeIndex>) {
        trace!(kind = ?self.ctx.arena.kind(node), "rewrite statement");
        match self.ctx.arena.kind(node) {
            SyntaxKind::ClassDeclaration => out.push(self.visit_class_declaration(node)),
            SyntaxKind::FunctionDeclaration => out.push(self.visit_function_declaration(node)),
            SyntaxKind::ForOfStatement => self.visit_for_of_statement(node, out),
            _ => {
                self.report_unsupported(node);
                out.push(accept(self, node));
            }
        }
    }

    fn rewrite_other(&mut self, node: NodeIndex) -> NodeIndex {
        trace!(kind = ?self.ctx.arena.kind(node), "rewrite node");
        match self.ctx.arena.kind(node) {
            SyntaxKind::VariableDeclarationList => self.visit_variable_declaration_list(node),
            SyntaxKind::ShorthandPropertyAssignment => self.visit_shorthand_property(node),
            SyntaxKind::MethodDeclaration => self.visit_object_literal_method(node),
            SyntaxKind::GetAccessor | SyntaxKind::SetAccessor => self.visit_accessor(node),
            _ => {
                self.report_unsupported(node);
                accept(self, node)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Super references (outside call position)
    // -------------------------------------------------------------------------

    /// `super.m` / `super[k]` in a non-call position.
    fn visit_super_member_access(&mut self, node: NodeIndex) -> NodeIndex {
        let Some(header) = self.ctx.arena.get(node).copied() else {
            return node;
        };
        let Some(data) = self.ctx.arena.get_access_expr(&header).cloned() else {
            return node;
        };
        if self.ctx.arena.kind(data.expression) != SyntaxKind::SuperKeyword {
            // Flagged for some other reason under this kind; reconstruct.
            return accept(self, node);
        }
        let receiver = self.super_receiver(data.expression);
        let name_or_argument = if header.kind == SyntaxKind::ElementAccessExpression {
            self.visit_expression(data.name_or_argument)
        } else {
            data.name_or_argument
        };
        let rebuilt = self.ctx.arena.alloc_access_expr(
            header.kind,
            crate::ast::SYNTHETIC_POS,
            crate::ast::SYNTHETIC_POS,
            crate::ast::node::AccessExprData {
                expression: receiver,
                name_or_argument,
            },
        );
        self.ctx.arena.set_original(rebuilt, node);
        rebuilt
    }

    fn visit_super_keyword(&mut self, node: NodeIndex) -> NodeIndex {
        self.super_receiver(node)
    }

    /// `_super.prototype` for instance-member references, `_super` otherwise.
    pub(crate) fn super_receiver(&mut self, super_node: NodeIndex) -> NodeIndex {
        let instance = self
            .ctx
            .resolver()
            .node_check_flags(super_node)
            .contains(crate::resolver::NodeCheckFlags::SUPER_INSTANCE);
        let arena = &mut self.ctx.arena;
        let base = arena.identifier("_super");
        if instance {
            arena.prop_access(base, "prototype")
        } else {
            base
        }
    }

    // -------------------------------------------------------------------------
    // Generated constructor statements
    // -------------------------------------------------------------------------

    fn is_generated_statement(&self, node: NodeIndex) -> bool {
        self.ctx
            .arena
            .get(node)
            .map(|n| {
                n.kind == SyntaxKind::ExpressionStatement && n.flags.contains(NodeFlags::GENERATED)
            })
            .unwrap_or(false)
    }

    /// `_super.apply(this, arguments);`
    pub(crate) fn default_super_call_statement(&mut self, original: NodeIndex) -> NodeIndex {
        let arena = &mut self.ctx.arena;
        let superid = arena.identifier("_super");
        let apply = arena.prop_access(superid, "apply");
        let this = arena.this_expression();
        let arguments = arena.identifier("arguments");
        let call = arena.call(apply, vec![this, arguments]);
        let stmt = arena.expression_statement(call);
        if original.is_some() {
            arena.set_original(stmt, original);
        }
        stmt
    }

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------

    pub(crate) fn report_unsupported(&mut self, node: NodeIndex) {
        let kind = self.ctx.arena.kind(node);
        let (file_name, line, column) = self.node_location(node);
        self.ctx.push_diagnostic(Diagnostic::error(
            format!("unhandled ES2015 syntax kind {kind:?} in ES5 down-level"),
            file_name,
            line,
            column,
        ));
    }

    pub(crate) fn node_location(&self, node: NodeIndex) -> (String, u32, u32) {
        let Some(source) = &self.source else {
            return (String::new(), 0, 0);
        };
        let file_name = source.file_name().to_string();
        match self.ctx.arena.get(node) {
            Some(n) if !n.is_synthesized() => {
                let lc = source.line_column(n.pos);
                (file_name, lc.line, lc.column)
            }
            _ => (file_name, 0, 0),
        }
    }
}

// =============================================================================
// Substitution stages
// =============================================================================

/// Reference-site substitution: identifiers that resolve to renamed nested
/// redeclarations, and `this` inside (lowered) arrow functions.
pub(crate) fn es6_substitute_expression(
    ctx: &mut TransformContext,
    node: NodeIndex,
) -> NodeIndex {
    match ctx.arena.kind(node) {
        SyntaxKind::Identifier => {
            if let Some(decl) = ctx.resolver().referenced_nested_redeclaration(node) {
                return ctx.get_generated_name_for_node(decl);
            }
            node
        }
        SyntaxKind::ThisKeyword => {
            let container = ctx.find_ancestor(|arena, n| {
                let Some(header) = arena.get(n) else {
                    return false;
                };
                header.kind.is_function_like()
                    || arena.kind(header.original) == SyntaxKind::ArrowFunction
            });
            let Some(container) = container else {
                return node;
            };
            let is_arrow = ctx.arena.kind(container) == SyntaxKind::ArrowFunction
                || ctx
                    .arena
                    .get(container)
                    .map(|n| ctx.arena.kind(n.original) == SyntaxKind::ArrowFunction)
                    .unwrap_or(false);
            if is_arrow {
                return ctx.arena.identifier("_this");
            }
            node
        }
        _ => node,
    }
}

/// Declaration-site substitution: rename nested redeclarations, and mark the
/// freshly generated name as final so it is not substituted again.
pub(crate) fn es6_substitute_binding_identifier(
    ctx: &mut TransformContext,
    node: NodeIndex,
) -> NodeIndex {
    if ctx.arena.kind(node) != SyntaxKind::Identifier {
        return node;
    }
    let Some(parent) = ctx.parent_node() else {
        return node;
    };
    if !ctx.resolver().is_nested_redeclaration(parent) {
        return node;
    }
    let name = ctx.get_generated_name_for_node(parent);
    ctx.disable_substitution(name);
    name
}
