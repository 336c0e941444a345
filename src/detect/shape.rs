//! Structural matching of handler lambdas.
//!
//! Only two shapes are recognized:
//! - `() => M()`: the lambda's single child is rooted at an invocation
//! - `() => { return M(); }`: a block whose only statement returns an invocation
//!
//! Everything else is left alone, including multi-statement bodies.

use crate::analysis::{Operation, OperationKind, SyntaxNode};

/// The invocation a handler lambda stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInvocation {
    pub syntax: SyntaxNode,
}

/// Which shape matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LambdaShape {
    ExpressionBodied,
    SingleReturn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeMatch {
    Matched {
        target: TargetInvocation,
        shape: LambdaShape,
    },
    Unmatched,
}

/// Match a lambda against the recognized shapes, first match wins.
pub fn match_lambda(lambda: &Operation) -> ShapeMatch {
    if lambda.kind != OperationKind::AnonymousFunction {
        return ShapeMatch::Unmatched;
    }

    if let [only] = lambda.children() {
        if only.syntax.is_invocation() {
            return ShapeMatch::Matched {
                target: TargetInvocation {
                    syntax: only.syntax.clone(),
                },
                shape: LambdaShape::ExpressionBodied,
            };
        }
    }

    let Some(block) = lambda.first_child() else {
        return ShapeMatch::Unmatched;
    };
    if block.kind != OperationKind::Block {
        return ShapeMatch::Unmatched;
    }
    let [statement] = block.children() else {
        return ShapeMatch::Unmatched;
    };
    match statement.returned_value() {
        Some(value) if value.kind == OperationKind::Invocation => ShapeMatch::Matched {
            target: TargetInvocation {
                syntax: value.syntax.clone(),
            },
            shape: LambdaShape::SingleReturn,
        },
        _ => ShapeMatch::Unmatched,
    }
}
