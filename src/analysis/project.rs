//! Projects: documents, metadata references and compilation options.
//!
//! A metadata reference stands in for a compiled library. It is a JSON
//! manifest listing the types the library exports:
//!
//! ```json
//! { "assembly": "Contoso.Auth", "types": [{ "namespace": "Contoso.Auth", "name": "RequireTenantAttribute" }] }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default route registration methods.
pub const DEFAULT_REGISTRATION_METHODS: &[&str] = &[
    "Map",
    "MapGet",
    "MapPost",
    "MapPut",
    "MapDelete",
    "MapPatch",
    "MapMethods",
    "MapFallback",
];

/// Built-in framework references, added to every project.
const FRAMEWORK_REFERENCES: &[(&str, &str)] = &[
    (
        "Microsoft.AspNetCore.App.json",
        include_str!("references/Microsoft.AspNetCore.App.json"),
    ),
    (
        "System.Runtime.json",
        include_str!("references/System.Runtime.json"),
    ),
];

/// Errors from loading metadata references.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("cannot read reference {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid reference manifest {display}: {source}")]
    Parse {
        display: String,
        #[source]
        source: serde_json::Error,
    },
}

/// What the compilation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    ConsoleApplication,
    WindowsApplication,
    #[default]
    DynamicallyLinkedLibrary,
}

impl OutputKind {
    /// Whether the output has an entry point (top-level statements allowed).
    pub fn is_executable(&self) -> bool {
        !matches!(self, OutputKind::DynamicallyLinkedLibrary)
    }
}

/// Options applied when compiling a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationOptions {
    pub output_kind: OutputKind,
    /// Callee names that register a route handler.
    pub registration_methods: Vec<String>,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            output_kind: OutputKind::default(),
            registration_methods: DEFAULT_REGISTRATION_METHODS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl CompilationOptions {
    pub fn with_output_kind(mut self, output_kind: OutputKind) -> Self {
        self.output_kind = output_kind;
        self
    }

    pub fn with_registration_methods(mut self, methods: Vec<String>) -> Self {
        self.registration_methods = methods;
        self
    }
}

/// A source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path or synthetic name used in locations.
    pub name: String,
    pub text: String,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A type exported by a metadata reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedType {
    /// Containing namespace; absent for the global namespace.
    #[serde(default)]
    pub namespace: Option<String>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ReferenceManifest {
    assembly: String,
    #[serde(default)]
    types: Vec<ReferencedType>,
}

/// A compiled library the project references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataReference {
    /// Display name, usually the manifest path.
    pub display: String,
    pub assembly: String,
    pub types: Vec<ReferencedType>,
}

impl MetadataReference {
    /// Parse a manifest from JSON text.
    pub fn from_json(display: &str, json: &str) -> Result<Self, ReferenceError> {
        let manifest: ReferenceManifest =
            serde_json::from_str(json).map_err(|source| ReferenceError::Parse {
                display: display.to_string(),
                source,
            })?;
        Ok(Self {
            display: display.to_string(),
            assembly: manifest.assembly,
            types: manifest.types,
        })
    }

    /// Load a manifest from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&path.to_string_lossy(), &json)
    }

    /// The built-in framework references.
    pub fn framework_defaults() -> Vec<Self> {
        FRAMEWORK_REFERENCES
            .iter()
            .filter_map(|(display, json)| match Self::from_json(display, json) {
                Ok(reference) => Some(reference),
                Err(e) => {
                    tracing::error!("built-in reference is invalid: {}", e);
                    None
                }
            })
            .collect()
    }

    /// File name of the display path without its extension.
    pub fn file_stem(&self) -> String {
        reference_stem(Path::new(&self.display))
    }
}

/// File name without extension, used to match references.
pub fn reference_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// A set of documents compiled together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Project {
    pub documents: Vec<Document>,
    pub metadata_references: Vec<MetadataReference>,
    pub options: CompilationOptions,
}

impl Project {
    /// Create a project from raw sources named `Test0.cs`, `Test1.cs`, ...
    /// with the framework references.
    pub fn create(sources: &[&str]) -> Self {
        let documents = sources
            .iter()
            .enumerate()
            .map(|(i, text)| Document::new(format!("Test{}.cs", i), *text))
            .collect();
        Self::from_documents(documents)
    }

    /// Create a project from documents with the framework references.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self {
            documents,
            metadata_references: MetadataReference::framework_defaults(),
            options: CompilationOptions::default(),
        }
    }

    pub fn add_metadata_reference(mut self, reference: MetadataReference) -> Self {
        self.metadata_references.push(reference);
        self
    }

    pub fn with_options(mut self, options: CompilationOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether a reference with this file stem is present (case-insensitive).
    pub fn has_reference_named(&self, stem: &str) -> bool {
        self.metadata_references
            .iter()
            .any(|r| r.file_stem().eq_ignore_ascii_case(stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_defaults_load() {
        let refs = MetadataReference::framework_defaults();
        assert_eq!(refs.len(), 2);
        assert!(refs[0]
            .types
            .iter()
            .any(|t| t.name == "AuthorizeAttribute"
                && t.namespace.as_deref() == Some("Microsoft.AspNetCore.Authorization")));
    }

    #[test]
    fn test_create_names_documents() {
        let project = Project::create(&["class A {}", "class B {}"]);
        let names: Vec<_> = project.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Test0.cs", "Test1.cs"]);
        assert_eq!(project.options.output_kind, OutputKind::DynamicallyLinkedLibrary);
    }

    #[test]
    fn test_has_reference_named_ignores_case_and_extension() {
        let project = Project::create(&[]);
        assert!(project.has_reference_named("microsoft.aspnetcore.app"));
        assert!(project.has_reference_named("SYSTEM.RUNTIME"));
        assert!(!project.has_reference_named("Contoso.Auth"));
    }

    #[test]
    fn test_invalid_manifest() {
        let err = MetadataReference::from_json("broken.json", "{ not json").unwrap_err();
        assert!(matches!(err, ReferenceError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_output_kind_executable() {
        assert!(OutputKind::ConsoleApplication.is_executable());
        assert!(!OutputKind::DynamicallyLinkedLibrary.is_executable());
    }
}
