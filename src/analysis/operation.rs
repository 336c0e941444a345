//! Operation tree for handler lambdas.
//!
//! The tree mirrors how a compiler's operation API presents an anonymous
//! function: the lambda owns a single body block, an expression body is an
//! implicit block whose syntax is the expression itself, and a `return`
//! operation's returned value is its first child.

use super::Location;

/// Identity of a syntax node: document index plus byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntaxId {
    pub file: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

/// The syntax kinds the analyzer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    InvocationExpression,
    LambdaExpression,
    AnonymousMethodExpression,
    Block,
    ReturnStatement,
    ExpressionStatement,
    Other,
}

impl SyntaxKind {
    /// Map a tree-sitter C# node kind.
    pub fn from_ts_kind(kind: &str) -> Self {
        match kind {
            "invocation_expression" => SyntaxKind::InvocationExpression,
            "lambda_expression"
            | "parenthesized_lambda_expression"
            | "simple_lambda_expression" => SyntaxKind::LambdaExpression,
            "anonymous_method_expression" => SyntaxKind::AnonymousMethodExpression,
            "block" => SyntaxKind::Block,
            "return_statement" => SyntaxKind::ReturnStatement,
            "expression_statement" => SyntaxKind::ExpressionStatement,
            _ => SyntaxKind::Other,
        }
    }

    pub fn is_anonymous_function(&self) -> bool {
        matches!(
            self,
            SyntaxKind::LambdaExpression | SyntaxKind::AnonymousMethodExpression
        )
    }
}

/// The originating syntax of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub id: SyntaxId,
    pub kind: SyntaxKind,
    pub location: Location,
}

impl SyntaxNode {
    pub fn is_invocation(&self) -> bool {
        self.kind == SyntaxKind::InvocationExpression
    }
}

/// Kind of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    AnonymousFunction,
    Block,
    Return,
    Invocation,
    ExpressionStatement,
    Other,
}

/// A node in the operation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub syntax: SyntaxNode,
    pub children: Vec<Operation>,
    /// Synthesized by lowering rather than written in source.
    pub is_implicit: bool,
}

impl Operation {
    pub fn new(kind: OperationKind, syntax: SyntaxNode) -> Self {
        Self {
            kind,
            syntax,
            children: Vec::new(),
            is_implicit: false,
        }
    }

    pub fn with_children(mut self, children: Vec<Operation>) -> Self {
        self.children = children;
        self
    }

    pub fn implicit(mut self) -> Self {
        self.is_implicit = true;
        self
    }

    pub fn children(&self) -> &[Operation] {
        &self.children
    }

    pub fn first_child(&self) -> Option<&Operation> {
        self.children.first()
    }

    /// The returned value of a `Return` operation.
    pub fn returned_value(&self) -> Option<&Operation> {
        match self.kind {
            OperationKind::Return => self.children.first(),
            _ => None,
        }
    }

    /// All operations in the subtree, breadth-first, including `self`.
    pub fn descendants(&self) -> Vec<&Operation> {
        let mut out = vec![self];
        let mut index = 0;
        while index < out.len() {
            let current = out[index];
            out.extend(current.children.iter());
            index += 1;
        }
        out
    }
}
