//! Core traits for language front ends and semantic queries.

use std::path::Path;

use super::{FileFacts, SymbolInfo, SyntaxNode};

/// Holds a parsed tree-sitter tree and associated metadata.
///
/// This is kept separate from FileFacts so the tree can be reused for
/// several extraction passes without re-parsing.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The original source code (kept for node text extraction).
    pub source: Vec<u8>,
    /// The document path or name (for locations).
    pub path: String,
    /// Index of the document in its compilation.
    pub file_index: usize,
}

impl ParsedFile {
    /// Get the source code as a string slice.
    pub fn source_str(&self) -> &str {
        std::str::from_utf8(&self.source).unwrap_or("")
    }

    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}

/// Language front end.
///
/// # Thread Safety
///
/// tree_sitter::Parser is not Sync, so implementations create parsers as
/// needed.
pub trait LanguageAnalyzer: Send + Sync {
    /// Returns the language identifier (e.g., "csharp").
    fn language_id(&self) -> &'static str;

    /// Returns file extensions this analyzer handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse a document into a tree-sitter tree.
    ///
    /// Partial parse errors still produce a valid tree with ERROR nodes.
    fn parse(&self, path: &Path, source: &[u8], file_index: usize) -> anyhow::Result<ParsedFile>;

    /// Extract declarations, usings and endpoint registrations.
    ///
    /// `registration_methods` lists the callee names that register a route
    /// handler.
    fn extract_facts(
        &self,
        parsed: &ParsedFile,
        registration_methods: &[String],
    ) -> anyhow::Result<FileFacts>;

    /// Check if this analyzer handles the given file extension.
    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions()
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(ext))
    }
}

/// Read-only semantic query surface consumed by the detection rules.
///
/// Attributes and namespaces are reachable from the returned symbols, so
/// binding an invocation is the only query that needs the host.
pub trait SemanticModel: Send + Sync {
    /// Bind an invocation expression to a method, or to candidates when
    /// binding is ambiguous.
    fn symbol_info(&self, invocation: &SyntaxNode) -> SymbolInfo;
}
