//! Diagnostic construction and reporting.

use crate::analysis::{AttributeData, Location, MethodSymbol};

use super::{Diagnostic, DiagnosticDescriptor, Severity, MISPLACED_LAMBDA_ATTRIBUTE};

/// Receives reported diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Builds diagnostics for one rule at a configured severity.
#[derive(Debug, Clone)]
pub struct DiagnosticEmitter {
    descriptor: &'static DiagnosticDescriptor,
    severity: Severity,
}

impl DiagnosticEmitter {
    pub fn new(severity: Severity) -> Self {
        Self {
            descriptor: &MISPLACED_LAMBDA_ATTRIBUTE,
            severity,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// A diagnostic anchored at the lambda, never at the attribute.
    pub fn emit(
        &self,
        lambda_location: &Location,
        attribute: &AttributeData,
        method: &MethodSymbol,
    ) -> Diagnostic {
        Diagnostic {
            descriptor: self.descriptor,
            severity: self.severity,
            location: lambda_location.clone(),
            arguments: vec![attribute.class_name().to_string(), method.name.clone()],
        }
    }
}

impl Default for DiagnosticEmitter {
    fn default() -> Self {
        Self::new(MISPLACED_LAMBDA_ATTRIBUTE.default_severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{MethodKind, ParameterShape, Span};

    fn location(line: usize) -> Location {
        Location::new(
            "Test0.cs",
            Span {
                start_byte: 0,
                end_byte: 1,
                start_line: line,
                start_col: 1,
                end_line: line,
                end_col: 2,
            },
        )
    }

    #[test]
    fn test_emit_uses_lambda_location() {
        let attribute = AttributeData {
            attribute_class: None,
            syntax_name: "Authorize".to_string(),
            location: Some(location(2)),
        };
        let method = MethodSymbol {
            name: "Hello".to_string(),
            kind: MethodKind::Method,
            containing_type: Some("Foo".to_string()),
            parameters: ParameterShape::default(),
            attributes: vec![attribute.clone()],
            location: location(3),
        };

        let mut sink: Vec<Diagnostic> = Vec::new();
        let emitter = DiagnosticEmitter::default();
        sink.report(emitter.emit(&location(9), &attribute, &method));

        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].line(), 9);
        assert_eq!(sink[0].severity, Severity::Warning);
        assert_eq!(sink[0].arguments, vec!["Authorize".to_string(), "Hello".to_string()]);
    }
}
