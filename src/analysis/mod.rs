//! Source analysis for C# projects.
//!
//! This module turns C# documents into the semantic facts the detection
//! rules consume. Parsing uses tree-sitter; binding is done by a small
//! compilation model that knows about types, methods, attributes and
//! metadata references.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ Project         │────▶│ CSharp       │────▶│ FileFacts     │
//! │ (Documents,     │     │ Analyzer     │     │ (Declarations,│
//! │  References)    │     └──────────────┘     │  Lambdas, etc)│
//! └─────────────────┘                          └───────────────┘
//!                                                      │
//!                                                      ▼
//!                         ┌──────────────┐     ┌───────────────┐
//!                         │ Detection    │◀────│ Compilation   │
//!                         │ Rules        │     │(SemanticModel)│
//!                         └──────────────┘     └───────────────┘
//! ```

mod compilation;
mod facts;
mod languages;
mod operation;
mod project;
mod symbols;
mod traits;

pub use compilation::{Compilation, CompilerDiagnostic};
pub use facts::{
    AttributeSyntax, EndpointRegistration, FileFacts, InvocationSite, Location, MemberKey,
    MethodDeclaration, MethodKind, ParameterShape, Receiver, Scope, Span, TypeDeclaration,
    TypeKind, UsingDirective,
};
pub use languages::{get_analyzer, get_analyzer_by_id, register_analyzers, CSharpAnalyzer};
pub use operation::{Operation, OperationKind, SyntaxId, SyntaxKind, SyntaxNode};
pub use project::{
    reference_stem, CompilationOptions, Document, MetadataReference, OutputKind, Project,
    ReferenceError, ReferencedType, DEFAULT_REGISTRATION_METHODS,
};
pub use symbols::{
    AttributeData, CandidateReason, MethodSymbol, NamespaceSymbol, SymbolInfo, SymbolOrigin,
    TypeSymbol,
};
pub use traits::{LanguageAnalyzer, ParsedFile, SemanticModel};
