//! Core types for detection results.

use serde::{Deserialize, Serialize};

use crate::analysis::{CompilerDiagnostic, Location};

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Static description of a rule.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    /// Message with positional placeholders (`{0}`, `{1}`, ...).
    pub message_format: &'static str,
    pub category: &'static str,
    pub default_severity: Severity,
}

impl DiagnosticDescriptor {
    /// Substitute positional arguments into the message format.
    pub fn format_message(&self, arguments: &[String]) -> String {
        let mut message = self.message_format.to_string();
        for (i, arg) in arguments.iter().enumerate() {
            message = message.replace(&format!("{{{}}}", i), arg);
        }
        message
    }
}

/// Attribute placed on a method called by a route handler lambda.
pub static MISPLACED_LAMBDA_ATTRIBUTE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "ASP0005",
    title: "Do not place attribute on method called by route handler lambda",
    message_format: "'{0}' should be placed directly on the route handler lambda to be effective",
    category: "Usage",
    default_severity: Severity::Warning,
};

/// A single reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub descriptor: &'static DiagnosticDescriptor,
    pub severity: Severity,
    pub location: Location,
    /// Message arguments, in placeholder order.
    pub arguments: Vec<String>,
}

impl Diagnostic {
    pub fn id(&self) -> &'static str {
        self.descriptor.id
    }

    pub fn message(&self) -> String {
        self.descriptor.format_message(&self.arguments)
    }

    pub fn file(&self) -> &str {
        &self.location.file
    }

    pub fn line(&self) -> usize {
        self.location.line()
    }
}

/// Results of running detection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostics silenced by pragmas or suppression comments.
    pub suppressed: Vec<super::SuppressedDiagnostic>,
    /// Problems reported by the compilation itself.
    pub compiler_diagnostics: Vec<CompilerDiagnostic>,
    /// Number of documents analyzed
    pub scanned: usize,
}

impl DetectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: DetectionResult) {
        self.diagnostics.extend(other.diagnostics);
        self.suppressed.extend(other.suppressed);
        self.compiler_diagnostics.extend(other.compiler_diagnostics);
        self.scanned += other.scanned;
    }

    /// Number of suppressed diagnostics.
    pub fn suppressed_count(&self) -> usize {
        self.suppressed.len()
    }

    /// Check if there are any error-severity diagnostics.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Span;

    fn location() -> Location {
        Location::new(
            "Test0.cs",
            Span {
                start_byte: 10,
                end_byte: 20,
                start_line: 3,
                start_col: 5,
                end_line: 3,
                end_col: 15,
            },
        )
    }

    #[test]
    fn test_message_formatting() {
        let diagnostic = Diagnostic {
            descriptor: &MISPLACED_LAMBDA_ATTRIBUTE,
            severity: Severity::Warning,
            location: location(),
            arguments: vec!["AuthorizeAttribute".to_string(), "Hello".to_string()],
        };

        assert_eq!(diagnostic.id(), "ASP0005");
        assert_eq!(
            diagnostic.message(),
            "'AuthorizeAttribute' should be placed directly on the route handler lambda to be effective"
        );
        assert_eq!(diagnostic.line(), 3);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("Warning".parse::<Severity>().unwrap(), Severity::Warning);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_has_errors() {
        let mut result = DetectionResult::new();
        assert!(!result.has_errors());

        result.diagnostics.push(Diagnostic {
            descriptor: &MISPLACED_LAMBDA_ATTRIBUTE,
            severity: Severity::Error,
            location: location(),
            arguments: Vec::new(),
        });
        assert!(result.has_errors());
        assert_eq!(result.count_by_severity(Severity::Error), 1);
        assert_eq!(result.count_by_severity(Severity::Warning), 0);
    }
}
