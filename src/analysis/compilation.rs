//! Compilation: parsed documents bound against source and referenced types.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use super::{
    get_analyzer, AttributeData, CandidateReason, CompilationOptions, Document, FileFacts,
    InvocationSite, Location, MemberKey, MethodDeclaration, MethodKind, MethodSymbol,
    NamespaceSymbol, Project, Receiver, Scope, SemanticModel, SymbolInfo, SymbolOrigin,
    SyntaxNode, TypeSymbol, UsingDirective,
};

/// A diagnostic produced by the compilation itself, not by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerDiagnostic {
    pub id: String,
    pub message: String,
    pub location: Option<Location>,
    pub is_error: bool,
}

impl fmt::Display for CompilerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}: {}", location, self.id, self.message),
            None => write!(f, "{}: {}", self.id, self.message),
        }
    }
}

/// Top-level statements in a library project.
pub const TOP_LEVEL_STATEMENTS_IN_LIBRARY: &str = "CS8805";

/// Syntax errors in a document.
pub const SYNTAX_ERROR: &str = "CS1525";

/// A bound set of documents.
pub struct Compilation {
    options: CompilationOptions,
    documents: Vec<Document>,
    files: Vec<FileFacts>,
    /// Using directives in effect per document (its own plus every global one).
    usings: Vec<Vec<UsingDirective>>,
    types: HashMap<String, Arc<TypeSymbol>>,
    methods: Vec<Arc<MethodSymbol>>,
    methods_by_type: HashMap<String, Vec<usize>>,
    local_functions: HashMap<MemberKey, Vec<usize>>,
    methods_by_name: HashMap<String, Vec<usize>>,
    diagnostics: Vec<CompilerDiagnostic>,
}

impl Compilation {
    /// Parse and bind every document of a project.
    pub fn create(project: &Project) -> anyhow::Result<Self> {
        let analyzer =
            get_analyzer("cs").ok_or_else(|| anyhow::anyhow!("no analyzer registered for C#"))?;
        let registration_methods = &project.options.registration_methods;

        let files = project
            .documents
            .par_iter()
            .enumerate()
            .map(|(index, document)| {
                let parsed =
                    analyzer.parse(Path::new(&document.name), document.text.as_bytes(), index)?;
                analyzer.extract_facts(&parsed, registration_methods)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let global_usings: Vec<UsingDirective> = files
            .iter()
            .flat_map(|f| f.usings.iter().filter(|u| u.is_global).cloned())
            .collect();
        let usings = files
            .iter()
            .map(|f| {
                let mut in_effect: Vec<UsingDirective> =
                    f.usings.iter().filter(|u| !u.is_global).cloned().collect();
                in_effect.extend(global_usings.iter().cloned());
                in_effect
            })
            .collect();

        let mut compilation = Self {
            options: project.options.clone(),
            documents: project.documents.clone(),
            files,
            usings,
            types: HashMap::new(),
            methods: Vec::new(),
            methods_by_type: HashMap::new(),
            local_functions: HashMap::new(),
            methods_by_name: HashMap::new(),
            diagnostics: Vec::new(),
        };

        compilation.declare_types(project);
        compilation.declare_methods();
        compilation.collect_diagnostics();

        tracing::debug!(
            documents = compilation.documents.len(),
            types = compilation.types.len(),
            methods = compilation.methods.len(),
            "compilation created"
        );

        Ok(compilation)
    }

    fn declare_types(&mut self, project: &Project) {
        for file in &self.files {
            for decl in &file.types {
                let symbol = TypeSymbol {
                    name: decl.name.clone(),
                    containing_namespace: Some(NamespaceSymbol::from_parts(decl.namespace.clone())),
                    containing_types: decl.containing_types.clone(),
                    origin: SymbolOrigin::Source,
                };
                self.types
                    .entry(symbol.full_name())
                    .or_insert_with(|| Arc::new(symbol));
            }
        }

        for reference in &project.metadata_references {
            for ty in &reference.types {
                let namespace = ty
                    .namespace
                    .as_deref()
                    .map(NamespaceSymbol::parse)
                    .unwrap_or_else(NamespaceSymbol::global);
                let symbol = TypeSymbol {
                    name: ty.name.clone(),
                    containing_namespace: Some(namespace),
                    containing_types: Vec::new(),
                    origin: SymbolOrigin::Metadata(reference.display.clone()),
                };
                self.types
                    .entry(symbol.full_name())
                    .or_insert_with(|| Arc::new(symbol));
            }
        }
    }

    fn declare_methods(&mut self) {
        let mut bound = Vec::new();
        for (file, usings) in self.files.iter().zip(&self.usings) {
            for decl in &file.methods {
                let owner = decl.scope.member.unwrap_or(MemberKey::TopLevel {
                    file: decl.scope.file,
                });
                bound.push((self.bind_method(file, decl, usings), owner));
            }
        }

        for (symbol, owner) in bound {
            let index = self.methods.len();
            match symbol.kind {
                MethodKind::Method => {
                    if let Some(ty) = &symbol.containing_type {
                        self.methods_by_type.entry(ty.clone()).or_default().push(index);
                    }
                }
                MethodKind::LocalFunction => {
                    self.local_functions.entry(owner).or_default().push(index);
                }
            }
            self.methods_by_name
                .entry(symbol.name.clone())
                .or_default()
                .push(index);
            self.methods.push(Arc::new(symbol));
        }
    }

    fn bind_method(
        &self,
        file: &FileFacts,
        decl: &MethodDeclaration,
        usings: &[UsingDirective],
    ) -> MethodSymbol {
        let attributes = decl
            .attributes
            .iter()
            .map(|attr| {
                let attribute_class = self.bind_attribute(&attr.name, &decl.scope, usings);
                if attribute_class.is_none() {
                    tracing::debug!(attribute = %attr.name, method = %decl.name, "unresolved attribute");
                }
                AttributeData {
                    attribute_class,
                    syntax_name: attr.name.clone(),
                    location: Some(Location::new(file.path.clone(), attr.span.clone())),
                }
            })
            .collect();

        MethodSymbol {
            name: decl.name.clone(),
            kind: decl.kind,
            containing_type: decl.scope.enclosing_type_names().into_iter().next(),
            parameters: decl.parameters,
            attributes,
            location: Location::new(file.path.clone(), decl.span.clone()),
        }
    }

    /// Bind `[Name]` by trying `NameAttribute` first, then `Name`.
    fn bind_attribute(
        &self,
        name: &str,
        scope: &Scope,
        usings: &[UsingDirective],
    ) -> Option<Arc<TypeSymbol>> {
        let suffixed = format!("{}Attribute", name);
        self.resolve_type_name(&suffixed, scope, usings)
            .or_else(|| self.resolve_type_name(name, scope, usings))
    }

    /// Resolve a possibly dotted type name as seen from `scope`.
    fn resolve_type_name(
        &self,
        name: &str,
        scope: &Scope,
        usings: &[UsingDirective],
    ) -> Option<Arc<TypeSymbol>> {
        for container in scope.lookup_containers() {
            if let Some(found) = self.types.get(&join_name(&container, name)) {
                return Some(found.clone());
            }
        }

        let applicable: Vec<&UsingDirective> = usings
            .iter()
            .filter(|u| u.applies_to(&scope.namespace))
            .collect();

        let (head, rest) = match name.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };
        for using in applicable.iter().filter(|u| u.alias.as_deref() == Some(head)) {
            let key = match rest {
                Some(rest) => join_name(&using.target, rest),
                None => using.target.clone(),
            };
            if let Some(found) = self.types.get(&key) {
                return Some(found.clone());
            }
        }

        for using in applicable.iter().filter(|u| u.alias.is_none()) {
            if let Some(found) = self.types.get(&join_name(&using.target, name)) {
                return Some(found.clone());
            }
        }

        None
    }

    fn collect_diagnostics(&mut self) {
        for file in &self.files {
            if file.has_parse_errors {
                self.diagnostics.push(CompilerDiagnostic {
                    id: SYNTAX_ERROR.to_string(),
                    message: format!("{} contains syntax errors", file.path),
                    location: None,
                    is_error: true,
                });
            }
        }

        if !self.options.output_kind.is_executable() {
            if self.files.iter().any(|f| f.has_global_statements) {
                self.diagnostics.push(CompilerDiagnostic {
                    id: TOP_LEVEL_STATEMENTS_IN_LIBRARY.to_string(),
                    message: "Program using top-level statements must be an executable."
                        .to_string(),
                    location: None,
                    is_error: true,
                });
            }
        }
    }

    /// Candidate method indexes for a site, plus whether the receiver
    /// supplies an extension method's `this` argument.
    fn candidates_for(&self, site: &InvocationSite, usings: &[UsingDirective]) -> (Vec<usize>, bool) {
        let named = |indexes: Option<&Vec<usize>>| -> Vec<usize> {
            indexes
                .map(|ix| {
                    ix.iter()
                        .copied()
                        .filter(|&i| self.methods[i].name == site.name)
                        .collect()
                })
                .unwrap_or_default()
        };
        let by_name = || -> Vec<usize> {
            self.methods_by_name
                .get(&site.name)
                .map(|ix| {
                    ix.iter()
                        .copied()
                        .filter(|&i| self.methods[i].kind == MethodKind::Method)
                        .collect()
                })
                .unwrap_or_default()
        };

        match &site.receiver {
            Receiver::None => {
                if let Some(member) = site.scope.member {
                    let locals = named(self.local_functions.get(&member));
                    if !locals.is_empty() {
                        return (locals, false);
                    }
                }
                for ty in site.scope.enclosing_type_names() {
                    let found = named(self.methods_by_type.get(&ty));
                    if !found.is_empty() {
                        return (found, false);
                    }
                }
                (Vec::new(), false)
            }
            Receiver::This | Receiver::Base => {
                let found = site
                    .scope
                    .enclosing_type_names()
                    .first()
                    .map(|ty| named(self.methods_by_type.get(ty)))
                    .unwrap_or_default();
                (found, false)
            }
            Receiver::Named(ty) => match self.resolve_type_name(ty, &site.scope, usings) {
                Some(symbol) => (named(self.methods_by_type.get(&symbol.full_name())), false),
                None => (by_name(), true),
            },
            Receiver::New(ty) => {
                let found = self
                    .resolve_type_name(ty, &site.scope, usings)
                    .map(|symbol| named(self.methods_by_type.get(&symbol.full_name())))
                    .unwrap_or_default();
                (found, false)
            }
            Receiver::External => (Vec::new(), false),
            Receiver::Expression => (by_name(), true),
        }
    }

    pub fn options(&self) -> &CompilationOptions {
        &self.options
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Extracted facts, one per document, in document order.
    pub fn files(&self) -> &[FileFacts] {
        &self.files
    }

    /// Text of the document at `index`.
    pub fn document_text(&self, index: usize) -> Option<&str> {
        self.documents.get(index).map(|d| d.text.as_str())
    }

    /// Look up a type by fully qualified name.
    pub fn lookup_type(&self, full_name: &str) -> Option<Arc<TypeSymbol>> {
        self.types.get(full_name).cloned()
    }

    /// All bound methods, in declaration order.
    pub fn methods(&self) -> &[Arc<MethodSymbol>] {
        &self.methods
    }

    pub fn compiler_diagnostics(&self) -> &[CompilerDiagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error)
    }
}

impl SemanticModel for Compilation {
    fn symbol_info(&self, invocation: &SyntaxNode) -> SymbolInfo {
        let Some(file) = self.files.get(invocation.id.file) else {
            return SymbolInfo::none();
        };
        let Some(site) = file.invocation_sites.get(&invocation.id) else {
            return SymbolInfo::none();
        };
        let usings = self
            .usings
            .get(invocation.id.file)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let (candidates, via_receiver) = self.candidates_for(site, usings);
        if candidates.is_empty() {
            return SymbolInfo::none();
        }

        let applicable: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| {
                self.methods[i]
                    .parameters
                    .accepts(site.argument_count, via_receiver)
            })
            .collect();

        match applicable.len() {
            1 => SymbolInfo::bound(self.methods[applicable[0]].clone()),
            0 => SymbolInfo::with_candidates(
                candidates.iter().map(|&i| self.methods[i].clone()).collect(),
                CandidateReason::OverloadResolutionFailure,
            ),
            _ => SymbolInfo::with_candidates(
                applicable.iter().map(|&i| self.methods[i].clone()).collect(),
                CandidateReason::Ambiguous,
            ),
        }
    }
}

fn join_name(container: &str, name: &str) -> String {
    if container.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", container, name)
    }
}
