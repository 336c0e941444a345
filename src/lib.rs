//! lambdacheck - misplaced attribute analyzer for minimal API handlers.
//!
//! A route handler lambda such as `app.MapGet("/", () => Hello())` only
//! carries the attributes written on the lambda itself. Framework attributes
//! on `Hello` (authorization, caching, filters) are silently ignored.
//! lambdacheck finds those handlers and reports each such attribute as
//! `ASP0005`.
//!
//! # Architecture
//!
//! - `analysis`: tree-sitter C# front end, operation trees and the
//!   compilation model that binds attributes and invocations
//! - `detect`: the analyzer pipeline, suppressions and the runner
//! - `harness`: async helpers that compile sources and collect diagnostics
//! - `config`: YAML configuration
//! - `report`: Output formatting (pretty, JSON, SARIF)
//! - `cli`: the `lint` and `init` commands

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detect;
pub mod harness;
pub mod report;

pub use analysis::{
    register_analyzers, CSharpAnalyzer, Compilation, CompilationOptions, Document,
    LanguageAnalyzer, MetadataReference, Operation, OutputKind, Project, SemanticModel,
};
pub use config::Config;
pub use detect::{
    DetectionResult, Diagnostic, MisplacedAttributeAnalyzer, Runner, Severity,
    MISPLACED_LAMBDA_ATTRIBUTE,
};
pub use harness::AnalyzerRunner;

/// Initialize all subsystems.
///
/// Call this once at startup.
pub fn init() {
    register_analyzers();
}
