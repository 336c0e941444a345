//! Integration tests for the analyzer harness.
//!
//! Each test compiles C# sources in memory with the framework references and
//! checks the diagnostics the misplaced-attribute analyzer reports.

use std::path::PathBuf;

use lambdacheck::analysis::{Document, OutputKind, Project};
use lambdacheck::detect::Severity;
use lambdacheck::harness::AnalyzerRunner;
use tempfile::TempDir;

fn references_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join("references")
}

/// A runner that ignores whatever sits next to the test binary.
fn runner(dir: &TempDir) -> AnalyzerRunner {
    AnalyzerRunner::new().with_reference_dir(dir.path())
}

#[tokio::test]
async fn test_attribute_on_called_method_is_reported() {
    let temp = TempDir::new().unwrap();
    let source = r#"
using Microsoft.AspNetCore.Authorization;

class Foo
{
    [Authorize]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.Map("/", () => Hello());
    }
}
"#;

    let diagnostics = runner(&temp).get_diagnostics(source).await.unwrap();

    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.id(), "ASP0005");
    assert_eq!(diagnostic.severity, Severity::Warning);
    assert_eq!(diagnostic.arguments, vec!["AuthorizeAttribute", "Hello"]);
    assert_eq!(diagnostic.file(), "Test0.cs");
    assert_eq!(diagnostic.line(), 11);
    assert_eq!(
        diagnostic.message(),
        "'AuthorizeAttribute' should be placed directly on the route handler lambda to be effective"
    );
}

#[tokio::test]
async fn test_block_with_single_return_matches_expression_body() {
    let temp = TempDir::new().unwrap();
    let expression = r#"
using Microsoft.AspNetCore.Authorization;

class Foo
{
    [Authorize]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.MapGet("/", () => Hello());
    }
}
"#;
    let block = r#"
using Microsoft.AspNetCore.Authorization;

class Foo
{
    [Authorize]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.MapGet("/", () => { return Hello(); });
    }
}
"#;

    let runner = runner(&temp);
    let from_expression = runner.get_diagnostics(expression).await.unwrap();
    let from_block = runner.get_diagnostics(block).await.unwrap();

    assert_eq!(from_expression.len(), 1);
    assert_eq!(from_block.len(), 1);
    assert_eq!(from_expression[0].arguments, from_block[0].arguments);
    assert_eq!(from_expression[0].line(), from_block[0].line());
    assert_eq!(
        from_expression[0].location.span.start_col,
        from_block[0].location.span.start_col
    );
}

#[tokio::test]
async fn test_multi_statement_lambda_is_ignored() {
    let temp = TempDir::new().unwrap();
    let source = r#"
using Microsoft.AspNetCore.Authorization;

class Foo
{
    [Authorize]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.MapGet("/", () =>
        {
            var greeting = Hello();
            return greeting;
        });
    }
}
"#;

    let diagnostics = runner(&temp).get_diagnostics(source).await.unwrap();
    assert!(diagnostics.is_empty());
}

#[tokio::test]
async fn test_attributes_outside_reserved_namespace_are_ignored() {
    let temp = TempDir::new().unwrap();
    let source = r#"
using System;
using System.Diagnostics;

class Foo
{
    [Obsolete]
    [DebuggerStepThrough]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.MapGet("/", () => Hello());
    }
}
"#;

    let diagnostics = runner(&temp).get_diagnostics(source).await.unwrap();
    assert!(diagnostics.is_empty());
}

#[tokio::test]
async fn test_each_reserved_attribute_reported_in_declaration_order() {
    let temp = TempDir::new().unwrap();
    let source = r#"
using System;
using Microsoft.AspNetCore.Authorization;
using Microsoft.AspNetCore.Http;

class Foo
{
    [Tags("greetings")]
    [Obsolete]
    [Authorize]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.MapGet("/", () => Hello());
    }
}
"#;

    let diagnostics = runner(&temp).get_diagnostics(source).await.unwrap();

    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].arguments, vec!["TagsAttribute", "Hello"]);
    assert_eq!(diagnostics[1].arguments, vec!["AuthorizeAttribute", "Hello"]);
    assert_eq!(diagnostics[0].location, diagnostics[1].location);
}

#[tokio::test]
async fn test_analysis_is_repeatable() {
    let temp = TempDir::new().unwrap();
    let source = r#"
using Microsoft.AspNetCore.Authorization;

class Foo
{
    [Authorize]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.MapGet("/", () => Hello());
        app.MapPost("/", () => Hello());
    }
}
"#;

    let runner = runner(&temp);
    let first = runner.get_diagnostics(source).await.unwrap();
    let second = runner.get_diagnostics(source).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_handler_in_another_document() {
    let temp = TempDir::new().unwrap();
    let handlers = r#"
using Microsoft.AspNetCore.Authorization;

namespace App.Handlers
{
    public static class Greetings
    {
        [AllowAnonymous]
        public static string Hello() => "hi";
    }
}
"#;
    let routes = r#"
using App.Handlers;

class Routes
{
    static void Configure(WebApplication app)
    {
        app.MapGet("/", () => Greetings.Hello());
    }
}
"#;

    let diagnostics = runner(&temp)
        .get_diagnostics_for_sources(&[handlers, routes])
        .await
        .unwrap();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].arguments, vec!["AllowAnonymousAttribute", "Hello"]);
    assert_eq!(diagnostics[0].file(), "Test1.cs");
}

#[tokio::test]
async fn test_top_level_statements_in_library_raise_compiler_diagnostic() {
    let temp = TempDir::new().unwrap();
    let source = r#"
using Microsoft.AspNetCore.Authorization;

var app = WebApplication.Create();
app.MapGet("/", () => Hello());

[Authorize]
static string Hello() => "hi";
"#;

    let library = runner(&temp);
    let project = library
        .create_project_with_references_in_bin_dir(&[source])
        .unwrap();
    let result = library.analyze_project(project).await.unwrap();
    assert!(result
        .compiler_diagnostics
        .iter()
        .any(|d| d.id == "CS8805" && d.is_error));

    let application = runner(&temp).with_output_kind(OutputKind::ConsoleApplication);
    let project = application
        .create_project_with_references_in_bin_dir(&[source])
        .unwrap();
    let result = application.analyze_project(project).await.unwrap();
    assert!(result.compiler_diagnostics.is_empty());
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].arguments, vec!["AuthorizeAttribute", "Hello"]);
}

#[tokio::test]
async fn test_manifest_in_reference_dir_is_loaded() {
    let source = r#"
using Microsoft.AspNetCore.Contoso;
using Contoso.Auth;

class Foo
{
    [Tenant]
    [Audit]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.MapGet("/", () => Hello());
    }
}
"#;

    let diagnostics = AnalyzerRunner::new()
        .with_reference_dir(references_path())
        .get_diagnostics(source)
        .await
        .unwrap();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].arguments, vec!["TenantAttribute", "Hello"]);
}

#[tokio::test]
async fn test_pragma_suppresses_in_harness() {
    let temp = TempDir::new().unwrap();
    let source = r#"
using Microsoft.AspNetCore.Authorization;

class Foo
{
    [Authorize]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
#pragma warning disable ASP0005
        app.MapGet("/", () => Hello());
#pragma warning restore ASP0005
    }
}
"#;

    let runner = runner(&temp);
    let project = Project::from_documents(vec![Document::new("Routes.cs", source)]);
    let result = runner.analyze_project(project).await.unwrap();

    assert!(result.diagnostics.is_empty());
    assert_eq!(result.suppressed.len(), 1);
    assert_eq!(result.suppressed[0].diagnostic.file(), "Routes.cs");
}

#[tokio::test]
async fn test_parenthesized_invocation_is_reported() {
    let temp = TempDir::new().unwrap();
    let source = r#"
using Microsoft.AspNetCore.Authorization;

class Foo
{
    [Authorize]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.MapGet("/a", () => (Hello()));
        app.MapGet("/b", () => { return (Hello()); });
    }
}
"#;

    let diagnostics = runner(&temp).get_diagnostics(source).await.unwrap();

    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].line(), 11);
    assert_eq!(diagnostics[1].line(), 12);
    for diagnostic in &diagnostics {
        assert_eq!(diagnostic.arguments, vec!["AuthorizeAttribute", "Hello"]);
    }
}

#[tokio::test]
async fn test_restore_after_bare_disable_reenables_rule() {
    let temp = TempDir::new().unwrap();
    let source = r#"
using Microsoft.AspNetCore.Authorization;

class Foo
{
    [Authorize]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
#pragma warning disable
        app.MapGet("/quiet", () => Hello());
#pragma warning restore ASP0005
        app.MapGet("/", () => Hello());
    }
}
"#;

    let runner = runner(&temp);
    let project = runner
        .create_project_with_references_in_bin_dir(&[source])
        .unwrap();
    let result = runner.analyze_project(project).await.unwrap();

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].line(), 14);
    assert_eq!(result.suppressed.len(), 1);
    assert_eq!(result.suppressed[0].diagnostic.line(), 12);
}
