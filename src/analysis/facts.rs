//! Fact structures extracted from C# syntax trees.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::{Operation, SyntaxId};

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed).
    pub end_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column + 1,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A span inside a named document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    /// Document path or name (e.g. `Test0.cs`).
    pub file: String,
    pub span: Span,
}

impl Location {
    pub fn new(file: impl Into<String>, span: Span) -> Self {
        Self {
            file: file.into(),
            span,
        }
    }

    /// 1-indexed start line.
    pub fn line(&self) -> usize {
        self.span.start_line
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.span)
    }
}

/// Identifies the member body that owns a piece of code.
///
/// Local functions are visible to every lambda inside the same member, so
/// invocation sites and local functions are both tagged with the outermost
/// member they appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKey {
    /// A method, constructor, property or field, keyed by its start byte.
    Member { file: usize, start_byte: usize },
    /// The top-level statements of a file.
    TopLevel { file: usize },
}

/// Lexical position of a declaration or expression.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scope {
    /// Index of the document in the compilation.
    pub file: usize,
    /// Enclosing namespace parts, outermost first.
    pub namespace: Vec<String>,
    /// Enclosing type names, outermost first.
    pub containing_types: Vec<String>,
    /// Outermost enclosing member, if any.
    pub member: Option<MemberKey>,
}

impl Scope {
    /// Containers to search for a simple name, innermost first.
    ///
    /// Each entry is a dotted prefix: enclosing types, then enclosing
    /// namespaces, ending with the global namespace (empty string).
    pub fn lookup_containers(&self) -> Vec<String> {
        let mut containers = Vec::new();
        for depth in (1..=self.containing_types.len()).rev() {
            let mut parts = self.namespace.clone();
            parts.extend(self.containing_types[..depth].iter().cloned());
            containers.push(parts.join("."));
        }
        for depth in (1..=self.namespace.len()).rev() {
            containers.push(self.namespace[..depth].join("."));
        }
        containers.push(String::new());
        containers
    }

    /// Fully qualified names of the enclosing types, innermost first.
    pub fn enclosing_type_names(&self) -> Vec<String> {
        (1..=self.containing_types.len())
            .rev()
            .map(|depth| {
                let mut parts = self.namespace.clone();
                parts.extend(self.containing_types[..depth].iter().cloned());
                parts.join(".")
            })
            .collect()
    }
}

/// Kind of type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Record,
    Interface,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Record => "record",
            TypeKind::Interface => "interface",
        }
    }
}

/// A type declared in source.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub name: String,
    pub kind: TypeKind,
    pub namespace: Vec<String>,
    pub containing_types: Vec<String>,
    pub span: Span,
}

impl TypeDeclaration {
    /// Dotted name including namespace and containing types.
    pub fn qualified_name(&self) -> String {
        let mut parts = self.namespace.clone();
        parts.extend(self.containing_types.iter().cloned());
        parts.push(self.name.clone());
        parts.join(".")
    }
}

/// An attribute application as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSyntax {
    /// Name as written, without type arguments or a `global::` prefix.
    pub name: String,
    pub span: Span,
}

/// How many arguments a method accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterShape {
    pub required: usize,
    pub optional: usize,
    pub has_params: bool,
    /// First parameter carries the `this` modifier.
    pub is_extension: bool,
}

impl ParameterShape {
    /// Whether a call with `argument_count` arguments can bind to this shape.
    ///
    /// `via_receiver` marks `x.M(...)` calls, where an extension method's
    /// `this` parameter is supplied by the receiver.
    pub fn accepts(&self, argument_count: usize, via_receiver: bool) -> bool {
        let mut required = self.required;
        let mut optional = self.optional;
        if self.is_extension && via_receiver {
            if required > 0 {
                required -= 1;
            } else if optional > 0 {
                optional -= 1;
            }
        }
        argument_count >= required && (self.has_params || argument_count <= required + optional)
    }
}

/// Kind of callable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Method,
    LocalFunction,
}

/// A method or local function declared in source.
#[derive(Debug, Clone)]
pub struct MethodDeclaration {
    pub name: String,
    pub kind: MethodKind,
    pub attributes: Vec<AttributeSyntax>,
    pub parameters: ParameterShape,
    /// Where the declaration sits. For methods, `containing_types` ends with
    /// the declaring type; for local functions, `member` is the owner.
    pub scope: Scope,
    pub span: Span,
}

/// A `using` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    /// Imported namespace, or alias target.
    pub target: String,
    pub alias: Option<String>,
    pub is_global: bool,
    pub is_static: bool,
    /// Namespace the directive appears in (empty at file level).
    pub scope: Vec<String>,
}

impl UsingDirective {
    /// Whether the directive is in effect inside `namespace`.
    pub fn applies_to(&self, namespace: &[String]) -> bool {
        self.is_global || namespace.starts_with(&self.scope)
    }
}

/// Receiver of an invocation, as far as syntax can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// Unqualified call: `M()`.
    None,
    /// `this.M()`.
    This,
    /// `base.M()`.
    Base,
    /// A dotted name that may denote a type or a variable: `Foo.M()`, `svc.M()`.
    Named(String),
    /// `new T().M()`.
    New(String),
    /// A receiver whose type is known to be outside the compilation (`string.Join`).
    External,
    /// Any other expression.
    Expression,
}

impl Receiver {
    pub fn is_none(&self) -> bool {
        matches!(self, Receiver::None)
    }
}

/// Everything needed to bind one invocation expression.
#[derive(Debug, Clone)]
pub struct InvocationSite {
    /// Simple name of the invoked member.
    pub name: String,
    pub receiver: Receiver,
    pub argument_count: usize,
    pub scope: Scope,
}

/// A route registration call with a lambda handler.
#[derive(Debug, Clone)]
pub struct EndpointRegistration {
    /// Registration method name (`MapGet`, `Map`, ...).
    pub method: String,
    /// Route pattern when the first argument is a string literal.
    pub pattern: Option<String>,
    /// Location of the registration call.
    pub location: Location,
    /// Lowered handler lambda.
    pub lambda: Operation,
}

/// All facts extracted from a single document.
#[derive(Debug, Clone)]
pub struct FileFacts {
    /// Document path or name.
    pub path: String,
    /// Index of the document in the compilation.
    pub file_index: usize,
    pub types: Vec<TypeDeclaration>,
    pub methods: Vec<MethodDeclaration>,
    pub usings: Vec<UsingDirective>,
    pub registrations: Vec<EndpointRegistration>,
    /// Invocation sites inside handler lambdas, keyed by syntax.
    pub invocation_sites: HashMap<SyntaxId, InvocationSite>,
    /// Whether the document contains top-level statements.
    pub has_global_statements: bool,
    /// Whether the document had parse errors.
    pub has_parse_errors: bool,
}

impl FileFacts {
    /// Create empty facts for a document.
    pub fn empty(path: &str, file_index: usize) -> Self {
        Self {
            path: path.to_string(),
            file_index,
            types: Vec::new(),
            methods: Vec::new(),
            usings: Vec::new(),
            registrations: Vec::new(),
            invocation_sites: HashMap::new(),
            has_global_statements: false,
            has_parse_errors: false,
        }
    }

    /// Find a method or local function by name.
    pub fn find_method(&self, name: &str) -> Option<&MethodDeclaration> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_containers_innermost_first() {
        let scope = Scope {
            file: 0,
            namespace: vec!["App".to_string(), "Api".to_string()],
            containing_types: vec!["Outer".to_string(), "Inner".to_string()],
            member: None,
        };

        assert_eq!(
            scope.lookup_containers(),
            vec![
                "App.Api.Outer.Inner".to_string(),
                "App.Api.Outer".to_string(),
                "App.Api".to_string(),
                "App".to_string(),
                String::new(),
            ]
        );
    }

    #[test]
    fn test_parameter_shape_accepts() {
        let shape = ParameterShape {
            required: 1,
            optional: 1,
            has_params: false,
            is_extension: false,
        };
        assert!(!shape.accepts(0, false));
        assert!(shape.accepts(1, false));
        assert!(shape.accepts(2, false));
        assert!(!shape.accepts(3, false));

        let variadic = ParameterShape {
            has_params: true,
            ..Default::default()
        };
        assert!(variadic.accepts(0, false));
        assert!(variadic.accepts(7, false));
    }

    #[test]
    fn test_extension_shape_drops_this_parameter() {
        let shape = ParameterShape {
            required: 2,
            optional: 0,
            has_params: false,
            is_extension: true,
        };
        assert!(shape.accepts(1, true));
        assert!(!shape.accepts(1, false));
    }

    #[test]
    fn test_using_scope() {
        let using = UsingDirective {
            target: "Microsoft.AspNetCore.Authorization".to_string(),
            alias: None,
            is_global: false,
            is_static: false,
            scope: vec!["App".to_string()],
        };
        assert!(using.applies_to(&["App".to_string(), "Api".to_string()]));
        assert!(!using.applies_to(&["Other".to_string()]));
    }
}
