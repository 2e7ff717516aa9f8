//! Synthetic node constructors.
//!
//! Rewriters build replacement trees through these helpers. Every node made
//! here is synthesized (no source range); callers attach source attribution
//! through `set_original` when the new node stands in for a source node.

use super::base::{NodeIndex, NodeList};
use super::node::*;
use super::syntax_kind::SyntaxKind;
use crate::source_file::SourceFile;
use std::sync::Arc;

impl NodeArena {
    pub fn identifier(&mut self, text: &str) -> NodeIndex {
        self.alloc_identifier(
            SyntaxKind::Identifier,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            IdentifierData {
                escaped_text: text.to_string(),
            },
        )
    }

    /// A synthesized copy of a source identifier, pointing back at it.
    pub fn clone_identifier(&mut self, source: NodeIndex) -> NodeIndex {
        let text = self
            .identifier_text(source)
            .unwrap_or_default()
            .to_string();
        let clone = self.identifier(&text);
        self.set_original(clone, source);
        clone
    }

    pub fn string_literal(&mut self, text: &str) -> NodeIndex {
        self.alloc_literal(
            SyntaxKind::StringLiteral,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            LiteralData {
                text: text.to_string(),
                raw_text: None,
            },
        )
    }

    pub fn numeric_literal(&mut self, text: &str) -> NodeIndex {
        self.alloc_literal(
            SyntaxKind::NumericLiteral,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            LiteralData {
                text: text.to_string(),
                raw_text: None,
            },
        )
    }

    pub fn this_expression(&mut self) -> NodeIndex {
        self.alloc_token(SyntaxKind::ThisKeyword, SYNTHETIC_POS, SYNTHETIC_POS)
    }

    /// `void 0`, the canonical undefined.
    pub fn void_zero(&mut self) -> NodeIndex {
        let zero = self.numeric_literal("0");
        self.alloc_unary_expr_ex(
            SyntaxKind::VoidExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            UnaryExprExData { expression: zero },
        )
    }

    pub fn prop_access(&mut self, expression: NodeIndex, name: &str) -> NodeIndex {
        let name = self.identifier(name);
        self.alloc_access_expr(
            SyntaxKind::PropertyAccessExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            AccessExprData {
                expression,
                name_or_argument: name,
            },
        )
    }

    pub fn prop_access_name(&mut self, expression: NodeIndex, name: NodeIndex) -> NodeIndex {
        self.alloc_access_expr(
            SyntaxKind::PropertyAccessExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            AccessExprData {
                expression,
                name_or_argument: name,
            },
        )
    }

    pub fn elem_access(&mut self, expression: NodeIndex, argument: NodeIndex) -> NodeIndex {
        self.alloc_access_expr(
            SyntaxKind::ElementAccessExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            AccessExprData {
                expression,
                name_or_argument: argument,
            },
        )
    }

    pub fn call(&mut self, expression: NodeIndex, arguments: Vec<NodeIndex>) -> NodeIndex {
        self.alloc_call_expr(
            SyntaxKind::CallExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            CallExprData {
                expression,
                arguments: Some(NodeList::new(arguments)),
            },
        )
    }

    pub fn new_expression(&mut self, expression: NodeIndex, arguments: Vec<NodeIndex>) -> NodeIndex {
        self.alloc_call_expr(
            SyntaxKind::NewExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            CallExprData {
                expression,
                arguments: Some(NodeList::new(arguments)),
            },
        )
    }

    pub fn binary(&mut self, left: NodeIndex, operator: SyntaxKind, right: NodeIndex) -> NodeIndex {
        self.alloc_binary_expr(
            SyntaxKind::BinaryExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            BinaryExprData {
                left,
                operator_token: operator,
                right,
            },
        )
    }

    pub fn assign(&mut self, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.binary(left, SyntaxKind::EqualsToken, right)
    }

    pub fn strict_equals(&mut self, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.binary(left, SyntaxKind::EqualsEqualsEqualsToken, right)
    }

    /// Left-associated comma chain; a single expression passes through.
    pub fn comma_chain(&mut self, exprs: Vec<NodeIndex>) -> NodeIndex {
        let mut iter = exprs.into_iter();
        let Some(mut acc) = iter.next() else {
            return NodeIndex::NONE;
        };
        for next in iter {
            acc = self.binary(acc, SyntaxKind::CommaToken, next);
        }
        acc
    }

    pub fn paren(&mut self, expression: NodeIndex) -> NodeIndex {
        self.alloc_parenthesized(
            SyntaxKind::ParenthesizedExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            ParenthesizedData { expression },
        )
    }

    pub fn conditional(
        &mut self,
        condition: NodeIndex,
        when_true: NodeIndex,
        when_false: NodeIndex,
    ) -> NodeIndex {
        self.alloc_conditional_expr(
            SyntaxKind::ConditionalExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            ConditionalExprData {
                condition,
                when_true,
                when_false,
            },
        )
    }

    pub fn array_literal(&mut self, elements: Vec<NodeIndex>) -> NodeIndex {
        self.alloc_literal_expr(
            SyntaxKind::ArrayLiteralExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            LiteralExprData {
                elements: NodeList::new(elements),
                multi_line: false,
            },
        )
    }

    pub fn object_literal(&mut self, properties: Vec<NodeIndex>, multi_line: bool) -> NodeIndex {
        self.alloc_literal_expr(
            SyntaxKind::ObjectLiteralExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            LiteralExprData {
                elements: NodeList::new(properties),
                multi_line,
            },
        )
    }

    pub fn property_assignment(&mut self, name: NodeIndex, initializer: NodeIndex) -> NodeIndex {
        self.alloc_property_assignment(
            SyntaxKind::PropertyAssignment,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            PropertyAssignmentData { name, initializer },
        )
    }

    pub fn parameter(&mut self, name: NodeIndex) -> NodeIndex {
        self.alloc_parameter(
            SyntaxKind::Parameter,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            ParameterData {
                dot_dot_dot_token: false,
                name,
                initializer: NodeIndex::NONE,
            },
        )
    }

    pub fn block(&mut self, statements: Vec<NodeIndex>, multi_line: bool) -> NodeIndex {
        self.alloc_block(
            SyntaxKind::Block,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            BlockData {
                statements: NodeList::new(statements),
                multi_line,
            },
        )
    }

    pub fn expression_statement(&mut self, expression: NodeIndex) -> NodeIndex {
        self.alloc_expression_statement(
            SyntaxKind::ExpressionStatement,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            ExpressionStatementData { expression },
        )
    }

    pub fn return_statement(&mut self, expression: NodeIndex) -> NodeIndex {
        self.alloc_return(
            SyntaxKind::ReturnStatement,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            ReturnData { expression },
        )
    }

    pub fn if_statement(
        &mut self,
        expression: NodeIndex,
        then_statement: NodeIndex,
        else_statement: NodeIndex,
    ) -> NodeIndex {
        self.alloc_if_statement(
            SyntaxKind::IfStatement,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            IfStatementData {
                expression,
                then_statement,
                else_statement,
            },
        )
    }

    pub fn empty_statement(&mut self) -> NodeIndex {
        self.alloc_token(SyntaxKind::EmptyStatement, SYNTHETIC_POS, SYNTHETIC_POS)
    }

    pub fn var_declaration(&mut self, name: NodeIndex, initializer: NodeIndex) -> NodeIndex {
        self.alloc_variable_declaration(
            SyntaxKind::VariableDeclaration,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            VariableDeclarationData { name, initializer },
        )
    }

    pub fn var_declaration_list(&mut self, declarations: Vec<NodeIndex>) -> NodeIndex {
        self.alloc_variable_list(
            SyntaxKind::VariableDeclarationList,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            VariableListData {
                declarations: NodeList::new(declarations),
            },
        )
    }

    pub fn var_statement(&mut self, declarations: Vec<NodeIndex>) -> NodeIndex {
        let list = self.var_declaration_list(declarations);
        self.var_statement_from_list(list)
    }

    pub fn var_statement_from_list(&mut self, declaration_list: NodeIndex) -> NodeIndex {
        self.alloc_variable_statement(
            SyntaxKind::VariableStatement,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            VariableStatementData { declaration_list },
        )
    }

    pub fn for_statement(
        &mut self,
        initializer: NodeIndex,
        condition: NodeIndex,
        incrementor: NodeIndex,
        statement: NodeIndex,
    ) -> NodeIndex {
        self.alloc_loop(
            SyntaxKind::ForStatement,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            LoopData {
                initializer,
                condition,
                incrementor,
                statement,
            },
        )
    }

    pub fn function_expression(
        &mut self,
        name: NodeIndex,
        parameters: Vec<NodeIndex>,
        body: NodeIndex,
    ) -> NodeIndex {
        self.alloc_function(
            SyntaxKind::FunctionExpression,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            FunctionData {
                name,
                parameters: NodeList::new(parameters),
                body,
            },
        )
    }

    pub fn function_declaration(
        &mut self,
        name: NodeIndex,
        parameters: Vec<NodeIndex>,
        body: NodeIndex,
    ) -> NodeIndex {
        self.alloc_function(
            SyntaxKind::FunctionDeclaration,
            SYNTHETIC_POS,
            SYNTHETIC_POS,
            FunctionData {
                name,
                parameters: NodeList::new(parameters),
                body,
            },
        )
    }

    pub fn source_file(&mut self, source: Arc<SourceFile>, statements: Vec<NodeIndex>) -> NodeIndex {
        let end = source.len();
        self.alloc_source_file(
            0,
            end,
            SourceFileData {
                source,
                statements: NodeList::new(statements),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_zero_shape() {
        let mut arena = NodeArena::new();
        let vz = arena.void_zero();
        let node = *arena.get(vz).unwrap();
        assert_eq!(node.kind, SyntaxKind::VoidExpression);
        let inner = arena.get_unary_expr_ex(&node).unwrap().expression;
        assert_eq!(arena.kind(inner), SyntaxKind::NumericLiteral);
    }

    #[test]
    fn cloned_identifier_points_back_at_source() {
        let mut arena = NodeArena::new();
        let source = arena.alloc_identifier(
            SyntaxKind::Identifier,
            10,
            11,
            IdentifierData {
                escaped_text: "x".to_string(),
            },
        );
        let clone = arena.clone_identifier(source);
        let clone_node = arena.get(clone).unwrap();
        assert!(clone_node.is_synthesized());
        assert_eq!(clone_node.original, source);
        assert_eq!(arena.identifier_text(clone), Some("x"));
    }

    #[test]
    fn comma_chain_folds_left() {
        let mut arena = NodeArena::new();
        let a = arena.identifier("a");
        let b = arena.identifier("b");
        let c = arena.identifier("c");
        let chain = arena.comma_chain(vec![a, b, c]);
        let top = *arena.get(chain).unwrap();
        let data = arena.get_binary_expr(&top).unwrap();
        assert_eq!(data.operator_token, SyntaxKind::CommaToken);
        assert_eq!(data.right, c);
        let left = *arena.get(data.left).unwrap();
        assert_eq!(arena.get_binary_expr(&left).unwrap().left, a);
    }
}
