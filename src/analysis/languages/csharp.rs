//! C# language front end using tree-sitter.
//!
//! Extracts:
//! - Type declarations (class, struct, record, interface), with nesting
//! - Methods and local functions, with attributes and parameter shapes
//! - Using directives (plain, global, alias)
//! - Endpoint registrations whose handler is a lambda, lowered to operations

use std::collections::HashMap;
use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::{
    AttributeSyntax, EndpointRegistration, FileFacts, InvocationSite, LanguageAnalyzer, Location,
    MemberKey, MethodDeclaration, MethodKind, Operation, OperationKind, ParameterShape,
    ParsedFile, Receiver, Scope, Span, SyntaxId, SyntaxKind, SyntaxNode, TypeDeclaration,
    TypeKind, UsingDirective,
};

/// Tree-sitter query for invocations; registration filtering happens in code.
const INVOCATION_QUERY: &str = r#"
(invocation_expression
  function: (_) @callee
  arguments: (argument_list) @arguments
) @call
"#;

/// C# language analyzer.
pub struct CSharpAnalyzer {
    language: Language,
}

impl CSharpAnalyzer {
    /// Create a new C# analyzer.
    pub fn new() -> Self {
        Self {
            language: tree_sitter_c_sharp::LANGUAGE.into(),
        }
    }

    /// Create a new parser for this thread.
    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Find route registrations with lambda handlers and lower each handler.
    fn extract_registrations(
        &self,
        parsed: &ParsedFile,
        registration_methods: &[String],
        file_namespace: &[String],
        facts: &mut FileFacts,
    ) -> anyhow::Result<()> {
        let query = Query::new(&self.language, INVOCATION_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        let mut found: Vec<(Node, Node, Node)> = Vec::new();
        while let Some(m) = matches.next() {
            let mut call = None;
            let mut callee = None;
            let mut arguments = None;
            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "call" => call = Some(capture.node),
                    "callee" => callee = Some(capture.node),
                    "arguments" => arguments = Some(capture.node),
                    _ => {}
                }
            }
            if let (Some(call), Some(callee), Some(arguments)) = (call, callee, arguments) {
                found.push((call, callee, arguments));
            }
        }
        found.sort_by_key(|(call, _, _)| call.start_byte());
        found.dedup_by_key(|(call, _, _)| call.id());

        for (call, callee, arguments) in found {
            let Some((name, _)) = callee_parts(callee, parsed) else {
                continue;
            };
            if !registration_methods.iter().any(|m| *m == name) {
                continue;
            }

            let args = argument_values(arguments);
            let handlers: Vec<Node> = args
                .iter()
                .copied()
                .filter(|arg| is_anonymous_function_kind(arg.kind()))
                .collect();
            if handlers.is_empty() {
                continue;
            }

            let scope = enclosing_scope(call, parsed, file_namespace);
            let pattern = args
                .first()
                .and_then(|arg| extract_string_literal(*arg, parsed));
            let location = Location::new(parsed.path.clone(), Span::from_node(call));

            for handler in handlers {
                let mut lowering = Lowering {
                    parsed,
                    scope: &scope,
                    sites: &mut facts.invocation_sites,
                };
                let lambda = lowering.lower_anonymous_function(handler);
                facts.registrations.push(EndpointRegistration {
                    method: name.clone(),
                    pattern: pattern.clone(),
                    location: location.clone(),
                    lambda,
                });
            }
        }

        Ok(())
    }
}

impl Default for CSharpAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for CSharpAnalyzer {
    fn language_id(&self) -> &'static str {
        "csharp"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["cs"]
    }

    fn parse(&self, path: &Path, source: &[u8], file_index: usize) -> anyhow::Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse {}", path.display()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_string_lossy().to_string(),
            file_index,
        })
    }

    fn extract_facts(
        &self,
        parsed: &ParsedFile,
        registration_methods: &[String],
    ) -> anyhow::Result<FileFacts> {
        let mut facts = FileFacts::empty(&parsed.path, parsed.file_index);
        let root = parsed.tree.root_node();
        facts.has_parse_errors = root.has_error();

        let file_namespace = file_scoped_namespace(root, parsed);
        walk_compilation_unit(root, parsed, &file_namespace, &mut facts);
        self.extract_registrations(parsed, registration_methods, &file_namespace, &mut facts)?;

        Ok(facts)
    }
}

// =============================================================================
// Declarations
// =============================================================================

#[derive(Clone, Default)]
struct WalkContext {
    namespace: Vec<String>,
    containing_types: Vec<String>,
    member: Option<MemberKey>,
}

impl WalkContext {
    fn scope(&self, file: usize) -> Scope {
        Scope {
            file,
            namespace: self.namespace.clone(),
            containing_types: self.containing_types.clone(),
            member: self.member,
        }
    }
}

fn file_scoped_namespace(root: Node, parsed: &ParsedFile) -> Vec<String> {
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() == "file_scoped_namespace_declaration" {
            return child
                .child_by_field_name("name")
                .map(|n| namespace_parts(parsed.node_text(n)))
                .unwrap_or_default();
        }
    }
    Vec::new()
}

fn walk_compilation_unit(
    root: Node,
    parsed: &ParsedFile,
    file_namespace: &[String],
    facts: &mut FileFacts,
) {
    let mut ctx = WalkContext::default();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() == "file_scoped_namespace_declaration" {
            ctx.namespace = file_namespace.to_vec();
            let name_id = child.child_by_field_name("name").map(|n| n.id());
            let mut inner = child.walk();
            for grandchild in child.named_children(&mut inner) {
                if Some(grandchild.id()) != name_id {
                    walk_node(grandchild, &ctx, parsed, facts);
                }
            }
            continue;
        }
        walk_node(child, &ctx, parsed, facts);
    }
}

fn walk_node(node: Node, ctx: &WalkContext, parsed: &ParsedFile, facts: &mut FileFacts) {
    let kind = node.kind();
    match kind {
        "namespace_declaration" => {
            let mut next = ctx.clone();
            if let Some(name) = node.child_by_field_name("name") {
                next.namespace
                    .extend(namespace_parts(parsed.node_text(name)));
            }
            match node.child_by_field_name("body") {
                Some(body) => walk_children(body, &next, parsed, facts),
                None => walk_children(node, &next, parsed, facts),
            }
        }
        k if type_kind(k).is_some() => {
            let Some(name) = node
                .child_by_field_name("name")
                .map(|n| parsed.node_text(n).to_string())
                .filter(|n| !n.is_empty())
            else {
                return;
            };
            if let Some(type_kind) = type_kind(k) {
                facts.types.push(TypeDeclaration {
                    name: name.clone(),
                    kind: type_kind,
                    namespace: ctx.namespace.clone(),
                    containing_types: ctx.containing_types.clone(),
                    span: Span::from_node(node),
                });
            }
            let mut next = ctx.clone();
            next.containing_types.push(name);
            let body = node.child_by_field_name("body").or_else(|| {
                let mut cursor = node.walk();
                let found = node
                    .named_children(&mut cursor)
                    .find(|c| c.kind() == "declaration_list");
                found
            });
            if let Some(body) = body {
                walk_children(body, &next, parsed, facts);
            }
        }
        "method_declaration" => {
            if let Some(method) = method_declaration(node, ctx, parsed, MethodKind::Method) {
                facts.methods.push(method);
            }
            let mut next = ctx.clone();
            if next.member.is_none() {
                next.member = Some(MemberKey::Member {
                    file: parsed.file_index,
                    start_byte: node.start_byte(),
                });
            }
            walk_children(node, &next, parsed, facts);
        }
        "local_function_statement" => {
            if let Some(method) = method_declaration(node, ctx, parsed, MethodKind::LocalFunction) {
                facts.methods.push(method);
            }
            walk_children(node, ctx, parsed, facts);
        }
        "global_statement" => {
            facts.has_global_statements = true;
            let mut next = ctx.clone();
            next.member = Some(MemberKey::TopLevel {
                file: parsed.file_index,
            });
            walk_children(node, &next, parsed, facts);
        }
        "using_directive" => {
            if let Some(using) = using_directive(node, parsed, &ctx.namespace) {
                facts.usings.push(using);
            }
        }
        k if is_member_kind(k) => {
            let mut next = ctx.clone();
            if next.member.is_none() {
                next.member = Some(MemberKey::Member {
                    file: parsed.file_index,
                    start_byte: node.start_byte(),
                });
            }
            walk_children(node, &next, parsed, facts);
        }
        _ => walk_children(node, ctx, parsed, facts),
    }
}

fn walk_children(node: Node, ctx: &WalkContext, parsed: &ParsedFile, facts: &mut FileFacts) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk_node(child, ctx, parsed, facts);
    }
}

fn method_declaration(
    node: Node,
    ctx: &WalkContext,
    parsed: &ParsedFile,
    kind: MethodKind,
) -> Option<MethodDeclaration> {
    let name = node
        .child_by_field_name("name")
        .map(|n| parsed.node_text(n).to_string())
        .filter(|n| !n.is_empty())?;

    Some(MethodDeclaration {
        name,
        kind,
        attributes: attributes_for_node(node, parsed),
        parameters: parameter_shape(node, parsed),
        scope: ctx.scope(parsed.file_index),
        span: Span::from_node(node),
    })
}

/// Method-targeted attributes attached directly to a declaration.
fn attributes_for_node(node: Node, parsed: &ParsedFile) -> Vec<AttributeSyntax> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for list in node.named_children(&mut cursor) {
        if list.kind() != "attribute_list" {
            continue;
        }
        if !targets_method(list, parsed) {
            continue;
        }
        let mut list_cursor = list.walk();
        for attr in list.named_children(&mut list_cursor) {
            if attr.kind() != "attribute" {
                continue;
            }
            let Some(name_node) = attr.child_by_field_name("name") else {
                continue;
            };
            let name = normalize_attribute_name(parsed.node_text(name_node));
            if name.is_empty() {
                continue;
            }
            out.push(AttributeSyntax {
                name,
                span: Span::from_node(attr),
            });
        }
    }
    out
}

/// `[return: X]` and friends do not land on the method.
fn targets_method(list: Node, parsed: &ParsedFile) -> bool {
    let mut cursor = list.walk();
    let specifier = list
        .named_children(&mut cursor)
        .find(|c| c.kind() == "attribute_target_specifier");
    match specifier {
        Some(spec) => parsed
            .node_text(spec)
            .trim_end_matches(':')
            .trim()
            .eq("method"),
        None => true,
    }
}

fn normalize_attribute_name(raw: &str) -> String {
    let name = raw.trim();
    let name = name.strip_prefix("global::").unwrap_or(name);
    let name = name.split('<').next().unwrap_or(name);
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

fn parameter_shape(node: Node, parsed: &ParsedFile) -> ParameterShape {
    let mut shape = ParameterShape::default();
    let list = node.child_by_field_name("parameters").or_else(|| {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "parameter_list");
        found
    });
    let Some(list) = list else {
        return shape;
    };

    let mut cursor = list.walk();
    for (position, param) in list.named_children(&mut cursor).enumerate() {
        match param.kind() {
            "parameter" => {
                if position == 0 && has_token(param, parsed, "this") {
                    shape.is_extension = true;
                }
                if has_token(param, parsed, "params") {
                    shape.has_params = true;
                } else if has_token(param, parsed, "=") || has_kind(param, "equals_value_clause") {
                    shape.optional += 1;
                } else {
                    shape.required += 1;
                }
            }
            "parameter_array" => shape.has_params = true,
            _ => {}
        }
    }
    shape
}

/// Whether `node` has a direct child token or modifier spelled `word`.
fn has_token(node: Node, parsed: &ParsedFile, word: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| c.kind() == word || (c.kind() == "modifier" && parsed.node_text(c) == word));
    found
}

fn has_kind(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).any(|c| c.kind() == kind);
    found
}

fn using_directive(node: Node, parsed: &ParsedFile, namespace: &[String]) -> Option<UsingDirective> {
    let mut is_global = false;
    let mut is_static = false;
    let mut has_equals = false;
    let mut names = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "global" => is_global = true,
            "static" => is_static = true,
            "=" => has_equals = true,
            "qualified_name" | "identifier" | "generic_name" | "alias_qualified_name" => {
                let text = parsed.node_text(child).trim();
                if !text.is_empty() {
                    names.push(text.strip_prefix("global::").unwrap_or(text).to_string());
                }
            }
            _ => {}
        }
    }

    let target = names.last()?.clone();
    let alias = if has_equals && names.len() >= 2 {
        Some(names[0].clone())
    } else {
        None
    };

    Some(UsingDirective {
        target,
        alias,
        is_global,
        is_static,
        scope: namespace.to_vec(),
    })
}

// =============================================================================
// Registrations and lowering
// =============================================================================

/// Callee simple name and receiver for an invocation's function node.
fn callee_parts(function: Node, parsed: &ParsedFile) -> Option<(String, Receiver)> {
    match function.kind() {
        "identifier" => Some((parsed.node_text(function).to_string(), Receiver::None)),
        "generic_name" => Some((simple_name(function, parsed), Receiver::None)),
        "member_access_expression" => {
            let name = function
                .child_by_field_name("name")
                .map(|n| simple_name(n, parsed))
                .filter(|n| !n.is_empty())?;
            let receiver = function
                .child_by_field_name("expression")
                .map(|expr| classify_receiver(expr, parsed))
                .unwrap_or(Receiver::Expression);
            Some((name, receiver))
        }
        _ => None,
    }
}

fn simple_name(node: Node, parsed: &ParsedFile) -> String {
    let text = parsed.node_text(node);
    text.split('<').next().unwrap_or(text).trim().to_string()
}

fn classify_receiver(node: Node, parsed: &ParsedFile) -> Receiver {
    let text = parsed.node_text(node).trim();
    if text == "this" {
        return Receiver::This;
    }
    if text == "base" {
        return Receiver::Base;
    }
    match node.kind() {
        "predefined_type" => Receiver::External,
        "object_creation_expression" => node
            .child_by_field_name("type")
            .map(|t| Receiver::New(simple_name(t, parsed)))
            .unwrap_or(Receiver::Expression),
        "generic_name" => Receiver::Named(simple_name(node, parsed)),
        "identifier" | "qualified_name" | "member_access_expression" | "alias_qualified_name"
            if is_simple_dotted(text) =>
        {
            Receiver::Named(text.strip_prefix("global::").unwrap_or(text).to_string())
        }
        _ => Receiver::Expression,
    }
}

fn is_simple_dotted(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '@' || ch == ':')
}

fn is_anonymous_function_kind(kind: &str) -> bool {
    SyntaxKind::from_ts_kind(kind).is_anonymous_function()
}

fn type_kind(kind: &str) -> Option<TypeKind> {
    match kind {
        "class_declaration" => Some(TypeKind::Class),
        "struct_declaration" => Some(TypeKind::Struct),
        "record_declaration" | "record_struct_declaration" => Some(TypeKind::Record),
        "interface_declaration" => Some(TypeKind::Interface),
        _ => None,
    }
}

fn is_member_kind(kind: &str) -> bool {
    matches!(
        kind,
        "constructor_declaration"
            | "destructor_declaration"
            | "property_declaration"
            | "indexer_declaration"
            | "field_declaration"
            | "event_declaration"
            | "event_field_declaration"
            | "operator_declaration"
            | "conversion_operator_declaration"
    )
}

fn is_comment(node: Node) -> bool {
    node.kind() == "comment"
}

/// Scope of an expression, computed from its ancestors.
fn enclosing_scope(node: Node, parsed: &ParsedFile, file_namespace: &[String]) -> Scope {
    let mut namespace_segments: Vec<Vec<String>> = Vec::new();
    let mut types: Vec<String> = Vec::new();
    let mut member = None;
    let mut saw_file_scoped = false;

    let mut current = node.parent();
    while let Some(n) = current {
        match n.kind() {
            "namespace_declaration" | "file_scoped_namespace_declaration" => {
                if n.kind() == "file_scoped_namespace_declaration" {
                    saw_file_scoped = true;
                }
                if let Some(name) = n.child_by_field_name("name") {
                    namespace_segments.push(namespace_parts(parsed.node_text(name)));
                }
            }
            "global_statement" => {
                member = Some(MemberKey::TopLevel {
                    file: parsed.file_index,
                });
            }
            k if type_kind(k).is_some() => {
                if let Some(name) = n.child_by_field_name("name") {
                    types.push(parsed.node_text(name).to_string());
                }
            }
            k if k == "method_declaration" || is_member_kind(k) => {
                // Outermost member wins; keep overwriting while walking up.
                member = Some(MemberKey::Member {
                    file: parsed.file_index,
                    start_byte: n.start_byte(),
                });
            }
            _ => {}
        }
        current = n.parent();
    }

    namespace_segments.reverse();
    types.reverse();

    let mut namespace = if saw_file_scoped {
        Vec::new()
    } else {
        file_namespace.to_vec()
    };
    for segment in namespace_segments {
        namespace.extend(segment);
    }

    Scope {
        file: parsed.file_index,
        namespace,
        containing_types: types,
        member,
    }
}

fn namespace_parts(name: &str) -> Vec<String> {
    name.replace("::", ".")
        .split('.')
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "global")
        .map(str::to_string)
        .collect()
}

fn argument_values(node: Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "argument" {
            continue;
        }
        let mut arg_cursor = child.walk();
        let mut expr = None;
        for grandchild in child.named_children(&mut arg_cursor) {
            if !is_comment(grandchild) {
                expr = Some(grandchild);
            }
        }
        if let Some(expr) = expr {
            out.push(expr);
        }
    }
    out
}

/// Value of a constant string argument. Interpolated strings have none.
fn extract_string_literal(node: Node, parsed: &ParsedFile) -> Option<String> {
    let raw = parsed.node_text(node);
    match node.kind() {
        "string_literal" => Some(
            content_children(node, parsed, &["string_literal_content", "escape_sequence"])
                .unwrap_or_else(|| raw.trim_matches('"').to_string()),
        ),
        "raw_string_literal" => Some(
            content_children(node, parsed, &["raw_string_content"])
                .unwrap_or_else(|| raw.trim_matches('"').to_string()),
        ),
        "verbatim_string_literal" => {
            let inner = raw
                .strip_prefix("@\"")
                .and_then(|r| r.strip_suffix('"'))
                .unwrap_or(raw);
            Some(inner.replace("\"\"", "\""))
        }
        _ => None,
    }
}

/// Concatenated text of the named children of the given kinds, if any.
fn content_children(node: Node, parsed: &ParsedFile, kinds: &[&str]) -> Option<String> {
    let mut cursor = node.walk();
    let parts: Vec<&str> = node
        .named_children(&mut cursor)
        .filter(|c| kinds.contains(&c.kind()))
        .map(|c| parsed.node_text(c))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.concat())
    }
}

/// Lowers handler lambdas into operation trees and records invocation sites.
struct Lowering<'a> {
    parsed: &'a ParsedFile,
    scope: &'a Scope,
    sites: &'a mut HashMap<SyntaxId, InvocationSite>,
}

impl Lowering<'_> {
    fn syntax(&self, node: Node) -> SyntaxNode {
        SyntaxNode {
            id: SyntaxId {
                file: self.parsed.file_index,
                start_byte: node.start_byte(),
                end_byte: node.end_byte(),
            },
            kind: SyntaxKind::from_ts_kind(node.kind()),
            location: Location::new(self.parsed.path.clone(), Span::from_node(node)),
        }
    }

    fn lower_anonymous_function(&mut self, node: Node) -> Operation {
        let body = node.child_by_field_name("body").or_else(|| {
            let mut cursor = node.walk();
            let last = node
                .named_children(&mut cursor)
                .filter(|c| !is_comment(*c))
                .last();
            last
        });

        let children = match body {
            Some(body) if body.kind() == "block" => vec![self.lower_block(body)],
            Some(expr) => vec![self.lower_expression_body(expr)],
            None => Vec::new(),
        };

        Operation::new(OperationKind::AnonymousFunction, self.syntax(node)).with_children(children)
    }

    /// `() => expr` becomes an implicit block holding an implicit return.
    fn lower_expression_body(&mut self, expr: Node) -> Operation {
        let value = self.lower_expression(expr);
        let ret = Operation::new(OperationKind::Return, self.syntax(expr))
            .implicit()
            .with_children(vec![value]);
        Operation::new(OperationKind::Block, self.syntax(expr))
            .implicit()
            .with_children(vec![ret])
    }

    fn lower_block(&mut self, block: Node) -> Operation {
        let mut statements = Vec::new();
        let mut cursor = block.walk();
        for child in block.named_children(&mut cursor) {
            if is_comment(child) {
                continue;
            }
            statements.push(self.lower_statement(child));
        }
        Operation::new(OperationKind::Block, self.syntax(block)).with_children(statements)
    }

    fn lower_statement(&mut self, node: Node) -> Operation {
        match node.kind() {
            "block" => self.lower_block(node),
            "return_statement" => {
                let children = first_expression(node)
                    .map(|expr| vec![self.lower_expression(expr)])
                    .unwrap_or_default();
                Operation::new(OperationKind::Return, self.syntax(node)).with_children(children)
            }
            "expression_statement" => {
                let children = first_expression(node)
                    .map(|expr| vec![self.lower_expression(expr)])
                    .unwrap_or_default();
                Operation::new(OperationKind::ExpressionStatement, self.syntax(node))
                    .with_children(children)
            }
            _ => Operation::new(OperationKind::Other, self.syntax(node)),
        }
    }

    fn lower_expression(&mut self, node: Node) -> Operation {
        match node.kind() {
            "invocation_expression" => self.lower_invocation(node),
            // Parentheses produce no operation of their own.
            "parenthesized_expression" => match first_expression(node) {
                Some(inner) => self.lower_expression(inner),
                None => Operation::new(OperationKind::Other, self.syntax(node)),
            },
            k if is_anonymous_function_kind(k) => self.lower_anonymous_function(node),
            _ => Operation::new(OperationKind::Other, self.syntax(node)),
        }
    }

    fn lower_invocation(&mut self, node: Node) -> Operation {
        let function = node.child_by_field_name("function");
        let arguments = node
            .child_by_field_name("arguments")
            .map(argument_values)
            .unwrap_or_default();

        let mut children = Vec::new();
        if let Some(receiver) = function
            .filter(|f| f.kind() == "member_access_expression")
            .and_then(|f| f.child_by_field_name("expression"))
        {
            children.push(self.lower_expression(receiver));
        }
        for arg in &arguments {
            children.push(self.lower_expression(*arg));
        }

        let syntax = self.syntax(node);
        if let Some((name, receiver)) = function.and_then(|f| callee_parts(f, self.parsed)) {
            self.sites.insert(
                syntax.id,
                InvocationSite {
                    name,
                    receiver,
                    argument_count: arguments.len(),
                    scope: self.scope.clone(),
                },
            );
        }

        Operation::new(OperationKind::Invocation, syntax).with_children(children)
    }
}

fn first_expression(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|c| !is_comment(*c));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DEFAULT_REGISTRATION_METHODS;

    fn registration_methods() -> Vec<String> {
        DEFAULT_REGISTRATION_METHODS
            .iter()
            .map(|m| m.to_string())
            .collect()
    }

    fn facts_for(source: &str) -> FileFacts {
        let analyzer = CSharpAnalyzer::new();
        let parsed = analyzer
            .parse(Path::new("Test0.cs"), source.as_bytes(), 0)
            .unwrap();
        analyzer
            .extract_facts(&parsed, &registration_methods())
            .unwrap()
    }

    #[test]
    fn test_extracts_types_and_methods() {
        let facts = facts_for(
            r#"
namespace App.Api
{
    public class Foo
    {
        [Authorize]
        [Produces("text/plain")]
        public static string Hello(int id, string name = "x") => "hi";

        public class Inner
        {
            void Helper(params int[] values) { }
        }
    }
}
"#,
        );

        assert_eq!(facts.types.len(), 2);
        assert_eq!(facts.types[0].qualified_name(), "App.Api.Foo");
        assert_eq!(facts.types[1].qualified_name(), "App.Api.Foo.Inner");

        let hello = facts.find_method("Hello").unwrap();
        assert_eq!(hello.kind, MethodKind::Method);
        let names: Vec<_> = hello.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Authorize", "Produces"]);
        assert_eq!(hello.parameters.required, 1);
        assert_eq!(hello.parameters.optional, 1);
        assert_eq!(hello.scope.namespace, vec!["App".to_string(), "Api".to_string()]);
        assert_eq!(hello.scope.containing_types, vec!["Foo".to_string()]);

        let helper = facts.find_method("Helper").unwrap();
        assert!(helper.parameters.has_params);
        assert_eq!(
            helper.scope.containing_types,
            vec!["Foo".to_string(), "Inner".to_string()]
        );
    }

    #[test]
    fn test_return_targeted_attributes_are_skipped() {
        let facts = facts_for(
            r#"
class Foo
{
    [return: Description("value")]
    [Authorize]
    static string Hello() => "hi";
}
"#,
        );
        let hello = facts.find_method("Hello").unwrap();
        let names: Vec<_> = hello.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Authorize"]);
    }

    #[test]
    fn test_extracts_usings() {
        let facts = facts_for(
            r#"
using System;
using Microsoft.AspNetCore.Authorization;
using Auth = Microsoft.AspNetCore.Authorization.AuthorizeAttribute;

class Foo { }
"#,
        );

        assert_eq!(facts.usings.len(), 3);
        assert_eq!(facts.usings[1].target, "Microsoft.AspNetCore.Authorization");
        assert_eq!(facts.usings[1].alias, None);
        assert_eq!(facts.usings[2].alias.as_deref(), Some("Auth"));
        assert_eq!(
            facts.usings[2].target,
            "Microsoft.AspNetCore.Authorization.AuthorizeAttribute"
        );
    }

    #[test]
    fn test_expression_bodied_lambda_lowering() {
        let facts = facts_for(
            r#"
class Foo
{
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.MapGet("/", () => Hello());
    }
}
"#,
        );

        assert_eq!(facts.registrations.len(), 1);
        let registration = &facts.registrations[0];
        assert_eq!(registration.method, "MapGet");
        assert_eq!(registration.pattern.as_deref(), Some("/"));

        let lambda = &registration.lambda;
        assert_eq!(lambda.kind, OperationKind::AnonymousFunction);
        assert_eq!(lambda.children().len(), 1);

        let body = &lambda.children()[0];
        assert_eq!(body.kind, OperationKind::Block);
        assert!(body.is_implicit);
        assert!(body.syntax.is_invocation());

        let site = facts.invocation_sites.get(&body.syntax.id).unwrap();
        assert_eq!(site.name, "Hello");
        assert_eq!(site.receiver, Receiver::None);
        assert_eq!(site.argument_count, 0);
        assert_eq!(site.scope.containing_types, vec!["Foo".to_string()]);
        assert!(matches!(site.scope.member, Some(MemberKey::Member { .. })));
    }

    #[test]
    fn test_parse_accepts_grammar() {
        let analyzer = CSharpAnalyzer::new();
        let parsed = analyzer
            .parse(Path::new("Test0.cs"), b"class Foo { }", 0)
            .unwrap();
        assert_eq!(parsed.tree.root_node().kind(), "compilation_unit");
        assert!(!parsed.tree.root_node().has_error());
    }

    #[test]
    fn test_parenthesized_invocation_lowering() {
        let facts = facts_for(
            r#"
class Foo
{
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.MapGet("/a", () => (Hello()));
        app.MapGet("/b", () => { return ((Hello())); });
    }
}
"#,
        );

        assert_eq!(facts.registrations.len(), 2);

        let expression = &facts.registrations[0].lambda;
        let body = expression.first_child().unwrap();
        assert!(body.is_implicit);
        assert!(!body.syntax.is_invocation());
        let value = body.first_child().unwrap().returned_value().unwrap();
        assert_eq!(value.kind, OperationKind::Invocation);
        assert_eq!(facts.invocation_sites.get(&value.syntax.id).unwrap().name, "Hello");

        let block = facts.registrations[1].lambda.first_child().unwrap();
        let value = block.first_child().unwrap().returned_value().unwrap();
        assert_eq!(value.kind, OperationKind::Invocation);
        assert!(facts.invocation_sites.contains_key(&value.syntax.id));
    }

    #[test]
    fn test_registration_patterns() {
        let facts = facts_for(
            r#"
class Foo
{
    static void Configure(WebApplication app, string id)
    {
        app.MapGet("/todos/{id}", () => Hello());
        app.MapGet(@"/say ""hi""", () => Hello());
        app.MapGet("""/raw""", () => Hello());
        app.MapGet($"/items/{id}", () => Hello());
        app.MapGet("", () => Hello());
    }
}
"#,
        );

        let patterns: Vec<Option<&str>> = facts
            .registrations
            .iter()
            .map(|r| r.pattern.as_deref())
            .collect();
        assert_eq!(
            patterns,
            vec![
                Some("/todos/{id}"),
                Some("/say \"hi\""),
                Some("/raw"),
                None,
                Some(""),
            ]
        );
    }

    #[test]
    fn test_block_lambda_lowering() {
        let facts = facts_for(
            r#"
class Foo
{
    static void Configure(WebApplication app)
    {
        app.MapPost("/", () => { return Foo.Hello(); });
        app.MapPut("/", () =>
        {
            Hello();
            return "foo";
        });
    }
}
"#,
        );

        assert_eq!(facts.registrations.len(), 2);

        let single = &facts.registrations[0].lambda;
        let block = single.first_child().unwrap();
        assert_eq!(block.kind, OperationKind::Block);
        assert!(!block.is_implicit);
        let ret = block.first_child().unwrap();
        assert_eq!(ret.kind, OperationKind::Return);
        let value = ret.returned_value().unwrap();
        assert_eq!(value.kind, OperationKind::Invocation);
        let site = facts.invocation_sites.get(&value.syntax.id).unwrap();
        assert_eq!(site.receiver, Receiver::Named("Foo".to_string()));

        let multi = &facts.registrations[1].lambda;
        let block = multi.first_child().unwrap();
        assert_eq!(block.children().len(), 2);
        assert_eq!(block.children()[0].kind, OperationKind::ExpressionStatement);
        assert_eq!(block.children()[1].kind, OperationKind::Return);
    }

    #[test]
    fn test_top_level_statements_and_local_functions() {
        let facts = facts_for(
            r#"
var app = WebApplication.Create();
app.MapGet("/", () => Hello());
app.Run();

[Authorize]
static string Hello() => "hi";
"#,
        );

        assert!(facts.has_global_statements);
        assert_eq!(facts.registrations.len(), 1);

        let hello = facts.find_method("Hello").unwrap();
        assert_eq!(hello.kind, MethodKind::LocalFunction);
        assert_eq!(hello.scope.member, Some(MemberKey::TopLevel { file: 0 }));

        let body = facts.registrations[0].lambda.first_child().unwrap();
        let site = facts.invocation_sites.get(&body.syntax.id).unwrap();
        assert_eq!(site.scope.member, Some(MemberKey::TopLevel { file: 0 }));
    }

    #[test]
    fn test_non_registration_calls_are_ignored() {
        let facts = facts_for(
            r#"
class Foo
{
    static void Configure(Builder app)
    {
        app.Use(() => Hello());
        app.MapGet("/", Handler);
    }
}
"#,
        );
        assert!(facts.registrations.is_empty());
    }

    #[test]
    fn test_file_scoped_namespace() {
        let facts = facts_for(
            r#"
namespace App.Endpoints;

class Routes
{
    static void Configure(WebApplication app)
    {
        app.MapGet("/", () => Hello());
    }

    static string Hello() => "hi";
}
"#,
        );

        assert_eq!(facts.types[0].qualified_name(), "App.Endpoints.Routes");
        let body = facts.registrations[0].lambda.first_child().unwrap();
        let site = facts.invocation_sites.get(&body.syntax.id).unwrap();
        assert_eq!(
            site.scope.namespace,
            vec!["App".to_string(), "Endpoints".to_string()]
        );
    }

    #[test]
    fn test_normalize_attribute_name() {
        assert_eq!(normalize_attribute_name("global::Foo.Bar"), "Foo.Bar");
        assert_eq!(normalize_attribute_name("Produces<Todo>"), "Produces");
        assert_eq!(normalize_attribute_name(" Authorize "), "Authorize");
    }
}
