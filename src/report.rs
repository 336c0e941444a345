//! Output formatting for lambdacheck results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::analysis::CompilerDiagnostic;
use crate::detect::{
    DetectionResult, Diagnostic, DiagnosticDescriptor, Severity, SuppressedDiagnostic,
    SuppressionType,
};

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    pub passed: bool,
    pub files_scanned: usize,
    pub diagnostics: Vec<JsonDiagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compiler_diagnostics: Vec<JsonCompilerDiagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<JsonSuppressedDiagnostic>,
    pub suppressed_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub id: String,
    pub severity: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub arguments: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonCompilerDiagnostic {
    pub id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub is_error: bool,
}

/// Suppressed diagnostic with suppression info.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSuppressedDiagnostic {
    pub diagnostic: JsonDiagnostic,
    pub suppression: JsonSuppression,
}

/// Suppression directive info.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSuppression {
    pub rule: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    pub file: String,
    pub line: usize,
    #[serde(rename = "type")]
    pub suppression_type: String,
}

/// Build the JSON report for a run.
pub fn build_json_report(
    path: &str,
    config_path: Option<&str>,
    result: &DetectionResult,
    passed: bool,
) -> JsonReport {
    let suppressed = result
        .suppressed
        .iter()
        .map(|sd| JsonSuppressedDiagnostic {
            diagnostic: diagnostic_to_json(&sd.diagnostic),
            suppression: JsonSuppression {
                rule: sd.suppression.rule.clone(),
                reason: sd.suppression.reason.clone(),
                file: sd.suppression.file.clone(),
                line: sd.suppression.line,
                suppression_type: format!("{:?}", sd.suppression.suppression_type).to_lowercase(),
            },
        })
        .collect();

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        config: config_path.map(str::to_string),
        passed,
        files_scanned: result.scanned,
        diagnostics: result.diagnostics.iter().map(diagnostic_to_json).collect(),
        compiler_diagnostics: result
            .compiler_diagnostics
            .iter()
            .map(compiler_diagnostic_to_json)
            .collect(),
        suppressed,
        suppressed_count: result.suppressed.len(),
    }
}

/// Write results in JSON format.
pub fn write_json(
    path: &str,
    config_path: Option<&str>,
    result: &DetectionResult,
    passed: bool,
) -> anyhow::Result<()> {
    let report = build_json_report(path, config_path, result, passed);
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

fn diagnostic_to_json(d: &Diagnostic) -> JsonDiagnostic {
    JsonDiagnostic {
        id: d.id().to_string(),
        severity: d.severity.to_string(),
        file: d.file().to_string(),
        line: d.line(),
        column: d.location.span.start_col,
        message: d.message(),
        arguments: d.arguments.clone(),
    }
}

fn compiler_diagnostic_to_json(d: &CompilerDiagnostic) -> JsonCompilerDiagnostic {
    JsonCompilerDiagnostic {
        id: d.id.clone(),
        message: d.message.clone(),
        file: d.location.as_ref().map(|l| l.file.clone()),
        line: d.location.as_ref().map(|l| l.line()),
        is_error: d.is_error,
    }
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "lambdacheck";

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifReport {
    pub version: String,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    pub rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRule {
    pub id: String,
    pub name: String,
    #[serde(rename = "shortDescription")]
    pub short_description: SarifMessage,
    #[serde(rename = "messageFormat", skip_serializing_if = "Option::is_none")]
    pub message_format: Option<SarifMessage>,
    #[serde(rename = "defaultConfiguration")]
    pub default_config: SarifRuleConfig,
    pub properties: SarifRuleProperties,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRuleConfig {
    pub level: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRuleProperties {
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifResult {
    #[serde(rename = "ruleId")]
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    pub physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    pub artifact_location: SarifArtifact,
    pub region: SarifRegion,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifArtifact {
    pub uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SarifRegion {
    #[serde(rename = "startLine")]
    pub start_line: usize,
    #[serde(rename = "startColumn")]
    pub start_column: usize,
    #[serde(rename = "endLine")]
    pub end_line: usize,
    #[serde(rename = "endColumn")]
    pub end_column: usize,
}

fn map_severity_to_level(severity: &Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

fn make_relative_path(file_path: &str, base_path: &Path) -> String {
    if base_path.to_string_lossy().is_empty() {
        return file_path.to_string();
    }

    let file = Path::new(file_path);

    // If they're the same (single file scan), return just the filename
    if file == base_path {
        return file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string());
    }

    file.strip_prefix(base_path)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file_path.to_string())
}

fn rule_name(descriptor: &DiagnosticDescriptor) -> String {
    descriptor
        .title
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Build the SARIF log for a run.
pub fn build_sarif_report(base_path: &Path, result: &DetectionResult) -> SarifReport {
    // Unique rules, ordered by id
    let descriptors: BTreeMap<&str, &DiagnosticDescriptor> = result
        .diagnostics
        .iter()
        .map(|d| (d.id(), d.descriptor))
        .collect();

    let rules = descriptors
        .values()
        .map(|descriptor| SarifRule {
            id: descriptor.id.to_string(),
            name: rule_name(descriptor),
            short_description: SarifMessage {
                text: descriptor.title.to_string(),
            },
            message_format: Some(SarifMessage {
                text: descriptor.message_format.to_string(),
            }),
            default_config: SarifRuleConfig {
                level: map_severity_to_level(&descriptor.default_severity).to_string(),
            },
            properties: SarifRuleProperties {
                category: descriptor.category.to_string(),
            },
        })
        .collect();

    let results = result
        .diagnostics
        .iter()
        .map(|d| {
            let span = &d.location.span;
            SarifResult {
                rule_id: d.id().to_string(),
                level: map_severity_to_level(&d.severity).to_string(),
                message: SarifMessage { text: d.message() },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifact {
                            uri: make_relative_path(d.file(), base_path),
                        },
                        region: SarifRegion {
                            start_line: span.start_line.max(1),
                            start_column: span.start_col.max(1),
                            end_line: span.end_line.max(1),
                            end_column: span.end_col.max(1),
                        },
                    },
                }],
            }
        })
        .collect();

    SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    rules,
                },
            },
            results,
        }],
    }
}

/// Write results in SARIF format.
pub fn write_sarif(base_path: &Path, result: &DetectionResult) -> anyhow::Result<()> {
    let report = build_sarif_report(base_path, result);
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(
    path: &str,
    config_path: Option<&str>,
    result: &DetectionResult,
    passed: bool,
    show_suppressed: bool,
) {
    // Header
    println!();
    print!("  ");
    print!("{}", "lambdacheck".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", path);
    print!("  {}", "Config:   ".dimmed());
    println!("{}", config_path.unwrap_or("(defaults)"));
    println!();

    write_result_summary(result, passed);
    println!();

    if !result.compiler_diagnostics.is_empty() {
        write_compiler_diagnostics(&result.compiler_diagnostics);
        println!();
    }

    if !result.diagnostics.is_empty() {
        write_diagnostics(&result.diagnostics);
        println!();
    }

    if !result.suppressed.is_empty() {
        write_suppressed_summary(&result.suppressed, show_suppressed);
        println!();
    }
}

fn write_result_summary(result: &DetectionResult, passed: bool) {
    if passed {
        print!("  {}", "✓ PASS".green());
    } else {
        print!("  {}", "✗ FAIL".red());
    }

    print!(
        "  {} files, {} errors, {} warnings",
        result.scanned,
        result.count_by_severity(Severity::Error),
        result.count_by_severity(Severity::Warning)
    );

    if !result.suppressed.is_empty() {
        print!(
            "  {}",
            format!("({} suppressed)", result.suppressed.len()).dimmed()
        );
    }

    println!();
}

fn write_diagnostics(diagnostics: &[Diagnostic]) {
    println!("  {} ({}):", "Diagnostics".bold(), diagnostics.len());
    println!();

    for d in diagnostics {
        write_severity_tag(&d.severity);
        print!("   ");
        print!("{:<10}", d.id().dimmed());
        print!("{}", d.file().blue());
        print!("{}", format!(":{}", d.location.span).dimmed());
        println!();

        // Message on next line, indented
        println!("            {}", d.message());
        println!();
    }
}

fn write_compiler_diagnostics(diagnostics: &[CompilerDiagnostic]) {
    println!("  {} ({}):", "Compiler".bold(), diagnostics.len());
    for d in diagnostics {
        let tag = if d.is_error { "ERROR".red() } else { "WARN ".yellow() };
        println!("    {} {}", tag, d);
    }
}

fn write_severity_tag(severity: &Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
        Severity::Info => print!("    {} ", "INFO ".blue()),
    }
}

fn write_suppressed_summary(suppressed: &[SuppressedDiagnostic], show_details: bool) {
    println!("  {} ({}):", "Suppressed".dimmed(), suppressed.len());

    if !show_details {
        println!("    {}", "(use --show-suppressed to see details)".dimmed());
        return;
    }

    println!();
    for sd in suppressed {
        let d = &sd.diagnostic;
        let s = &sd.suppression;

        print!("    {:<10}", d.id().dimmed());
        print!("{}", d.file().blue());
        if s.suppression_type == SuppressionType::File {
            print!("{}", ":* (file)".dimmed());
        } else {
            print!("{}", format!(":{}", d.line()).dimmed());
        }
        println!();

        if !s.reason.is_empty() {
            println!("            {}", format!("reason: {:?}", s.reason).dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Location, Span};
    use crate::detect::{Suppression, MISPLACED_LAMBDA_ATTRIBUTE};

    fn diagnostic(file: &str, line: usize) -> Diagnostic {
        Diagnostic {
            descriptor: &MISPLACED_LAMBDA_ATTRIBUTE,
            severity: Severity::Warning,
            location: Location::new(
                file,
                Span {
                    start_byte: 0,
                    end_byte: 13,
                    start_line: line,
                    start_col: 25,
                    end_line: line,
                    end_col: 38,
                },
            ),
            arguments: vec!["AuthorizeAttribute".to_string(), "Hello".to_string()],
        }
    }

    fn sample_result() -> DetectionResult {
        DetectionResult {
            diagnostics: vec![diagnostic("/repo/src/Program.cs", 7)],
            suppressed: vec![SuppressedDiagnostic {
                diagnostic: diagnostic("/repo/src/Program.cs", 9),
                suppression: Suppression {
                    rule: "ASP0005".to_string(),
                    reason: "documented".to_string(),
                    file: "/repo/src/Program.cs".to_string(),
                    line: 8,
                    end_line: None,
                    reenabled: Vec::new(),
                    suppression_type: SuppressionType::NextLine,
                },
            }],
            compiler_diagnostics: Vec::new(),
            scanned: 3,
        }
    }

    #[test]
    fn test_json_report() {
        let report = build_json_report("/repo", Some("lambdacheck.yaml"), &sample_result(), true);
        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.diagnostics[0].id, "ASP0005");
        assert_eq!(report.diagnostics[0].column, 25);
        assert_eq!(report.suppressed_count, 1);
        assert_eq!(report.suppressed[0].suppression.suppression_type, "nextline");

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("compiler_diagnostics").is_none());
        assert_eq!(json["diagnostics"][0]["arguments"][1], "Hello");
    }

    #[test]
    fn test_sarif_report() {
        let report = build_sarif_report(Path::new("/repo"), &sample_result());
        let run = &report.runs[0];

        assert_eq!(report.version, "2.1.0");
        assert_eq!(run.tool.driver.rules.len(), 1);
        assert_eq!(run.tool.driver.rules[0].id, "ASP0005");
        assert_eq!(
            run.tool.driver.rules[0].name,
            "DoNotPlaceAttributeOnMethodCalledByRouteHandlerLambda"
        );
        assert_eq!(run.results[0].level, "warning");
        assert_eq!(
            run.results[0].locations[0].physical_location.artifact_location.uri,
            "src/Program.cs"
        );
        assert_eq!(run.results[0].locations[0].physical_location.region.start_line, 7);
    }
}
