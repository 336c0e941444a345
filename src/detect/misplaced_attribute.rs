//! Attributes placed on a method that a route handler lambda merely calls.
//!
//! The routing system reads endpoint metadata from the handler delegate.
//! When the handler is `() => Hello()`, attributes on `Hello` never reach
//! the endpoint, so framework attributes there are reported.

use crate::analysis::{Operation, SemanticModel};

use super::{
    classify, match_lambda, resolve, DiagnosticEmitter, DiagnosticSink, ReservedNamespace,
    Resolution, Severity, ShapeMatch,
};

/// Why a lambda produced no diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ShapeUnmatched,
    SymbolUnresolved,
    NoReservedAttributes,
}

/// What analyzing one lambda did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LambdaOutcome {
    /// Number of diagnostics reported.
    Emitted(usize),
    Skipped(SkipReason),
}

/// Runs shape matching, resolution, classification and emission for each lambda.
#[derive(Debug, Clone, Default)]
pub struct MisplacedAttributeAnalyzer {
    reserved: ReservedNamespace,
    emitter: DiagnosticEmitter,
}

impl MisplacedAttributeAnalyzer {
    pub fn new(reserved: ReservedNamespace, severity: Severity) -> Self {
        Self {
            reserved,
            emitter: DiagnosticEmitter::new(severity),
        }
    }

    pub fn reserved_namespace(&self) -> &ReservedNamespace {
        &self.reserved
    }

    /// Analyze one handler lambda, reporting into `sink`.
    pub fn analyze_lambda(
        &self,
        lambda: &Operation,
        model: &dyn SemanticModel,
        sink: &mut dyn DiagnosticSink,
    ) -> LambdaOutcome {
        let lambda_location = &lambda.syntax.location;

        let target = match match_lambda(lambda) {
            ShapeMatch::Matched { target, shape } => {
                tracing::debug!(location = %lambda_location, ?shape, "handler shape matched");
                target
            }
            ShapeMatch::Unmatched => {
                tracing::debug!(location = %lambda_location, "handler shape not recognized");
                return LambdaOutcome::Skipped(SkipReason::ShapeUnmatched);
            }
        };

        let method = match resolve(&target, model) {
            Resolution::Resolved(method) => method,
            Resolution::Unresolved => {
                tracing::debug!(
                    location = %target.syntax.location,
                    "invocation did not bind to a method"
                );
                return LambdaOutcome::Skipped(SkipReason::SymbolUnresolved);
            }
        };

        let attributes = classify(&method, &self.reserved);
        if attributes.is_empty() {
            tracing::debug!(method = %method.qualified_name(), "no reserved attributes");
            return LambdaOutcome::Skipped(SkipReason::NoReservedAttributes);
        }

        for attribute in &attributes {
            sink.report(self.emitter.emit(lambda_location, attribute, &method));
        }
        LambdaOutcome::Emitted(attributes.len())
    }
}
