//! Detection runner that visits every endpoint registration in a compilation.

use rayon::prelude::*;

use crate::analysis::Compilation;

use super::{
    collect_suppressions, filter_suppressed, DetectionResult, Diagnostic, LambdaOutcome,
    MisplacedAttributeAnalyzer,
};

/// Runs the analyzer over all handler lambdas of a compilation.
pub struct Runner {
    analyzer: MisplacedAttributeAnalyzer,
    apply_suppressions: bool,
}

impl Runner {
    pub fn new(analyzer: MisplacedAttributeAnalyzer) -> Self {
        Self {
            analyzer,
            apply_suppressions: true,
        }
    }

    /// Set whether pragmas and suppression comments are honored.
    pub fn apply_suppressions(mut self, apply: bool) -> Self {
        self.apply_suppressions = apply;
        self
    }

    /// Analyze every registration, in document then source order.
    pub fn run(&self, compilation: &Compilation) -> DetectionResult {
        let per_file: Vec<Vec<Diagnostic>> = compilation
            .files()
            .par_iter()
            .map(|file| {
                let mut diagnostics = Vec::new();
                for registration in &file.registrations {
                    let outcome =
                        self.analyzer
                            .analyze_lambda(&registration.lambda, compilation, &mut diagnostics);
                    if let LambdaOutcome::Emitted(count) = outcome {
                        tracing::debug!(
                            file = %file.path,
                            method = %registration.method,
                            count,
                            "reported misplaced attributes"
                        );
                    }
                }
                diagnostics
            })
            .collect();

        let diagnostics: Vec<Diagnostic> = per_file.into_iter().flatten().collect();

        let mut result = DetectionResult {
            compiler_diagnostics: compilation.compiler_diagnostics().to_vec(),
            scanned: compilation.files().len(),
            ..Default::default()
        };

        if self.apply_suppressions {
            let suppression_map = collect_suppressions(
                compilation
                    .documents()
                    .iter()
                    .map(|d| (d.name.as_str(), d.text.as_str())),
            );
            let all_suppressions: Vec<_> = suppression_map.into_values().flatten().collect();
            let (active, suppressed) = filter_suppressed(diagnostics, &all_suppressions);
            result.diagnostics = active;
            result.suppressed = suppressed;
        } else {
            result.diagnostics = diagnostics;
        }

        result
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(MisplacedAttributeAnalyzer::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Project;

    const SOURCE: &str = r#"using Microsoft.AspNetCore.Authorization;

class Foo
{
    [Authorize]
    static string Hello() => "hi";

    static void Configure(WebApplication app)
    {
        app.MapGet("/", () => Hello());
#pragma warning disable ASP0005
        app.MapGet("/quiet", () => Hello());
#pragma warning restore ASP0005
    }
}
"#;

    #[test]
    fn test_runner_reports_and_suppresses() {
        let compilation = Compilation::create(&Project::create(&[SOURCE])).unwrap();
        let result = Runner::default().run(&compilation);

        assert_eq!(result.scanned, 1);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].line(), 10);
        assert_eq!(result.suppressed.len(), 1);
        assert_eq!(result.suppressed[0].diagnostic.line(), 12);
    }

    #[test]
    fn test_runner_without_suppressions() {
        let compilation = Compilation::create(&Project::create(&[SOURCE])).unwrap();
        let result = Runner::default().apply_suppressions(false).run(&compilation);

        assert_eq!(result.diagnostics.len(), 2);
        assert!(result.suppressed.is_empty());
    }
}
