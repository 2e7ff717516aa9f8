//! Template-literal lowering.
//!
//! Untagged templates become string concatenation:
//!
//! ```text
//! `hello ${name}!`        // "hello " + name + "!"
//! `${x}${y}`              // x + "" + y   (empty literals keep coercion)
//! ```
//!
//! A substitution whose precedence does not bind tighter than binary `+`
//! is parenthesized so the concatenation does not re-associate, and the
//! whole result is parenthesized when it lands in a callee or member-access
//! base position.
//!
//! Tagged templates build the site object once, with distinct cooked and
//! raw arrays; the raw strings come from the original source text with the
//! template delimiters stripped and line endings normalized:
//!
//! ```text
//! tag`a${x}b`   // (_a = ["a", "b"], _a.raw = ["a", "b"], tag(_a, x))
//! ```

use super::Es6Transform;
use crate::ast::{NodeIndex, SyntaxKind, TempFlags};
use crate::transformer::accept::NodeVisitor;

impl Es6Transform<'_> {
    /// `` `abc` `` with no substitutions is just a string literal.
    pub(crate) fn visit_no_substitution_template(&mut self, node: NodeIndex) -> NodeIndex {
        let text = self.literal_text(node);
        let arena = &mut self.ctx.arena;
        let result = arena.string_literal(&text);
        arena.set_original(result, node);
        result
    }

    pub(crate) fn visit_template_expression(&mut self, node: NodeIndex) -> NodeIndex {
        let Some(data) = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_template_expr(n))
            .cloned()
        else {
            return node;
        };

        let head_text = self.literal_text(data.head);
        let first_span_literal_empty = data
            .spans
            .nodes
            .first()
            .map(|&span| self.span_literal_text(span).is_empty())
            .unwrap_or(true);

        let mut acc = NodeIndex::NONE;
        if !head_text.is_empty() || first_span_literal_empty {
            acc = self.ctx.arena.string_literal(&head_text);
        }

        for &span in &data.spans {
            let (expression, literal) = {
                let arena = &self.ctx.arena;
                arena
                    .get(span)
                    .and_then(|n| arena.get_template_span(n))
                    .map(|d| (d.expression, d.literal))
                    .unwrap_or((NodeIndex::NONE, NodeIndex::NONE))
            };
            let mut visited = self.visit_expression(expression);
            if self.needs_parens_in_concat(visited) {
                visited = self.ctx.arena.paren(visited);
            }
            acc = if acc.is_none() {
                visited
            } else {
                self.ctx
                    .arena
                    .binary(acc, SyntaxKind::PlusToken, visited)
            };
            let literal_text = self.literal_text(literal);
            if !literal_text.is_empty() {
                let arena = &mut self.ctx.arena;
                let lit = arena.string_literal(&literal_text);
                acc = arena.binary(acc, SyntaxKind::PlusToken, lit);
            }
        }

        if acc.is_none() {
            acc = self.ctx.arena.string_literal("");
        }
        if self.template_needs_outer_parens(node) {
            acc = self.ctx.arena.paren(acc);
        }
        self.ctx.arena.set_original(acc, node);
        acc
    }

    pub(crate) fn visit_tagged_template(&mut self, node: NodeIndex) -> NodeIndex {
        let Some(data) = self
            .ctx
            .arena
            .get(node)
            .and_then(|n| self.ctx.arena.get_tagged_template(n))
            .cloned()
        else {
            return node;
        };

        let tag = self.visit_expression(data.tag);

        let mut cooked = Vec::new();
        let mut raw = Vec::new();
        let mut span_expressions = Vec::new();
        if self.ctx.arena.kind(data.template) == SyntaxKind::NoSubstitutionTemplateLiteral {
            cooked.push(self.literal_text(data.template));
            raw.push(self.raw_text(data.template));
        } else if let Some(template) = self
            .ctx
            .arena
            .get(data.template)
            .and_then(|n| self.ctx.arena.get_template_expr(n))
            .cloned()
        {
            cooked.push(self.literal_text(template.head));
            raw.push(self.raw_text(template.head));
            for &span in &template.spans {
                let (expression, literal) = {
                    let arena = &self.ctx.arena;
                    arena
                        .get(span)
                        .and_then(|n| arena.get_template_span(n))
                        .map(|d| (d.expression, d.literal))
                        .unwrap_or((NodeIndex::NONE, NodeIndex::NONE))
                };
                cooked.push(self.literal_text(literal));
                raw.push(self.raw_text(literal));
                span_expressions.push(self.visit_expression(expression));
            }
        }

        let temp = self.ctx.create_temp_variable(TempFlags::Auto);
        self.ctx.hoist_variable_declaration(temp);

        let arena = &mut self.ctx.arena;
        let cooked_elements = cooked.iter().map(|t| arena.string_literal(t)).collect();
        let cooked_array = arena.array_literal(cooked_elements);
        let raw_elements = raw.iter().map(|t| arena.string_literal(t)).collect();
        let raw_array = arena.array_literal(raw_elements);

        let assign_cooked = arena.assign(temp, cooked_array);
        let raw_member = arena.prop_access(temp, "raw");
        let assign_raw = arena.assign(raw_member, raw_array);
        let mut call_args = vec![temp];
        call_args.extend(span_expressions);
        let invocation = arena.call(tag, call_args);
        let sequence = arena.comma_chain(vec![assign_cooked, assign_raw, invocation]);
        let result = arena.paren(sequence);
        arena.set_original(result, node);
        result
    }

    /// Cooked text of a literal node.
    fn literal_text(&self, literal: NodeIndex) -> String {
        let arena = &self.ctx.arena;
        arena
            .get(literal)
            .and_then(|n| arena.get_literal(n))
            .map(|d| d.text.clone())
            .unwrap_or_default()
    }

    fn span_literal_text(&self, span: NodeIndex) -> String {
        let arena = &self.ctx.arena;
        arena
            .get(span)
            .and_then(|n| arena.get_template_span(n))
            .map(|d| d.literal)
            .map(|l| self.literal_text(l))
            .unwrap_or_default()
    }

    /// Raw text of a template chunk: the recorded (or sliced) source text
    /// with the `` ` ``, `${`, `}` delimiters stripped and `\r\n?`
    /// normalized to `\n`.
    fn raw_text(&self, literal: NodeIndex) -> String {
        let Some(node) = self.ctx.arena.get(literal) else {
            return String::new();
        };
        let kind = node.kind;
        let recorded = self
            .ctx
            .arena
            .get_literal(node)
            .and_then(|d| d.raw_text.clone());
        let with_delimiters = match recorded {
            Some(text) => text,
            None => match &self.source {
                Some(source) if !node.is_synthesized() => {
                    source.slice(node.pos, node.end).to_string()
                }
                // No raw source: fall back to the cooked text.
                _ => {
                    return self
                        .ctx
                        .arena
                        .get_literal(node)
                        .map(|d| d.text.clone())
                        .unwrap_or_default();
                }
            },
        };

        let leading = match kind {
            SyntaxKind::NoSubstitutionTemplateLiteral | SyntaxKind::TemplateHead => "`",
            _ => "}",
        };
        let trailing = match kind {
            SyntaxKind::TemplateHead | SyntaxKind::TemplateMiddle => "${",
            _ => "`",
        };
        let stripped = with_delimiters
            .strip_prefix(leading)
            .unwrap_or(&with_delimiters);
        let stripped = stripped.strip_suffix(trailing).unwrap_or(stripped);
        stripped.replace("\r\n", "\n").replace('\r', "\n")
    }

    /// A substitution binds no tighter than `+`: parenthesize it so the
    /// emitted concatenation cannot re-associate.
    fn needs_parens_in_concat(&self, expr: NodeIndex) -> bool {
        let arena = &self.ctx.arena;
        let Some(node) = arena.get(expr) else {
            return false;
        };
        match node.kind {
            SyntaxKind::BinaryExpression => arena
                .get_binary_expr(node)
                .map(|d| {
                    let plus = SyntaxKind::PlusToken.binary_operator_precedence();
                    d.operator_token.binary_operator_precedence() <= plus
                })
                .unwrap_or(false),
            SyntaxKind::ConditionalExpression => true,
            _ => false,
        }
    }

    /// The lowered concatenation itself needs parentheses when the template
    /// sat in a callee or member-access base position.
    fn template_needs_outer_parens(&self, node: NodeIndex) -> bool {
        let Some(parent) = self.ctx.parent_node() else {
            return false;
        };
        let arena = &self.ctx.arena;
        let Some(parent_node) = arena.get(parent) else {
            return false;
        };
        match parent_node.kind {
            SyntaxKind::CallExpression | SyntaxKind::NewExpression => arena
                .get_call_expr(parent_node)
                .map(|d| d.expression == node)
                .unwrap_or(false),
            SyntaxKind::PropertyAccessExpression | SyntaxKind::ElementAccessExpression => arena
                .get_access_expr(parent_node)
                .map(|d| d.expression == node)
                .unwrap_or(false),
            SyntaxKind::TaggedTemplateExpression => arena
                .get_tagged_template(parent_node)
                .map(|d| d.tag == node)
                .unwrap_or(false),
            _ => false,
        }
    }
}
