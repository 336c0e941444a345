//! Detection of attributes that route handler lambdas cannot see.
//!
//! Each handler lambda goes through four stages:
//! shape match, symbol resolution, namespace classification, emission.
//! Any stage that finds nothing ends the pipeline for that lambda quietly.

mod emit;
mod misplaced_attribute;
mod namespace;
mod resolve;
mod runner;
mod shape;
mod suppress;
mod types;

pub use emit::{DiagnosticEmitter, DiagnosticSink};
pub use misplaced_attribute::{LambdaOutcome, MisplacedAttributeAnalyzer, SkipReason};
pub use namespace::{classify, ReservedNamespace, DEFAULT_RESERVED_NAMESPACE};
pub use resolve::{resolve, Resolution};
pub use runner::Runner;
pub use shape::{match_lambda, LambdaShape, ShapeMatch, TargetInvocation};
pub use suppress::{
    collect_suppressions, filter_suppressed, matches_suppression, parse_suppressions,
    SuppressedDiagnostic, Suppression, SuppressionType,
};
pub use types::{
    DetectionResult, Diagnostic, DiagnosticDescriptor, Severity, MISPLACED_LAMBDA_ATTRIBUTE,
};
