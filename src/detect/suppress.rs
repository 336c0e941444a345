//! Inline suppression of diagnostics.
//!
//! Two forms are understood:
//! - `#pragma warning disable ASP0005` / `#pragma warning restore ASP0005`
//!   (a bare `disable` silences every rule; a later `restore <id>` re-enables
//!   just that rule)
//! - `// lambdacheck:ignore <rule> - <reason>`, with `-next-line` and
//!   `-file` variants

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use super::Diagnostic;

/// How a suppression applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuppressionType {
    /// Applies to the same line
    Line,
    /// Applies to the next line
    NextLine,
    /// Applies to the entire file
    File,
    /// Applies from a `#pragma warning disable` to its `restore`
    Pragma,
}

/// An inline suppression directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suppression {
    /// Rule id to suppress (e.g. "ASP0005") or "*" for all
    pub rule: String,
    /// Human-readable reason
    pub reason: String,
    /// File containing the suppression
    pub file: String,
    /// Line number (0 for file-level)
    pub line: usize,
    /// Last line covered by a pragma range; `None` runs to end of file.
    pub end_line: Option<usize>,
    /// Rules restored while a wildcard pragma range is open.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reenabled: Vec<String>,
    /// How the suppression applies
    pub suppression_type: SuppressionType,
}

/// A diagnostic that was suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuppressedDiagnostic {
    pub diagnostic: Diagnostic,
    pub suppression: Suppression,
}

lazy_static::lazy_static! {
    /// Patterns for matching suppression comments.
    static ref SUPPRESSION_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"//\s*lambdacheck:(ignore(?:-file|-next-line)?)\s+(\S+)\s*(?:-\s*(.*))?").unwrap(),
        Regex::new(r"/\*\s*lambdacheck:(ignore(?:-file|-next-line)?)\s+(\S+)\s*(?:-\s*(.*?))?\s*\*/").unwrap(),
    ];

    /// `#pragma warning disable|restore [ids]`
    static ref PRAGMA_PATTERN: Regex =
        Regex::new(r"^\s*#\s*pragma\s+warning\s+(disable|restore)\b([^/]*)(?://\s*(.*))?$").unwrap();
}

/// Parse suppression directives from file content.
pub fn parse_suppressions(file_path: &str, content: &str) -> Vec<Suppression> {
    let mut suppressions = Vec::new();
    let mut pragmas = PragmaState::default();
    let mut in_header = true;

    for (line_num, line) in content.lines().enumerate() {
        let line_number = line_num + 1;
        let trimmed = line.trim();

        if in_header && !is_comment_or_empty(trimmed) {
            in_header = false;
        }

        if let Some(caps) = PRAGMA_PATTERN.captures(line) {
            let action = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let rules = pragma_rules(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
            let reason = caps
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();

            let pragma = Pragma {
                file: file_path,
                line: line_number,
                reason: &reason,
            };
            match action {
                "disable" => pragmas.disable(&rules, &pragma, &mut suppressions),
                _ => pragmas.restore(&rules, &pragma, &mut suppressions),
            }
            continue;
        }

        for pattern in SUPPRESSION_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(line) {
                let directive = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                let rule = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                let reason = caps
                    .get(3)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default();

                let suppression_type = match directive {
                    "ignore-file" => {
                        // File-level suppressions must be at the top of the file
                        if !in_header && line_number > 10 {
                            continue;
                        }
                        SuppressionType::File
                    }
                    "ignore-next-line" => SuppressionType::NextLine,
                    "ignore" => {
                        // Alone on its line: applies to the next line.
                        let alone = caps
                            .get(0)
                            .map(|m| line[..m.start()].trim().is_empty())
                            .unwrap_or(true);
                        if alone {
                            SuppressionType::NextLine
                        } else {
                            SuppressionType::Line
                        }
                    }
                    _ => continue,
                };

                suppressions.push(Suppression {
                    rule: rule.to_string(),
                    reason,
                    file: file_path.to_string(),
                    line: if suppression_type == SuppressionType::File {
                        0
                    } else {
                        line_number
                    },
                    end_line: None,
                    reenabled: Vec::new(),
                    suppression_type,
                });
                break; // Only one suppression per line
            }
        }
    }

    pragmas.finish(&mut suppressions);
    suppressions
}

/// Where a `#pragma warning` line sits.
struct Pragma<'a> {
    file: &'a str,
    line: usize,
    reason: &'a str,
}

impl Pragma<'_> {
    fn open(&self, rule: &str, reenabled: Vec<String>) -> Suppression {
        Suppression {
            rule: rule.to_string(),
            reason: self.reason.to_string(),
            file: self.file.to_string(),
            line: self.line,
            end_line: None,
            reenabled,
            suppression_type: SuppressionType::Pragma,
        }
    }
}

/// Open pragma ranges while scanning a file.
///
/// A bare `disable` opens a wildcard range. Restoring a single rule inside it
/// splits the range so that rule is active again from that line on.
#[derive(Default)]
struct PragmaState {
    wildcard: Option<Suppression>,
    rules: Vec<Suppression>,
}

impl PragmaState {
    fn disable(&mut self, rules: &[String], at: &Pragma, out: &mut Vec<Suppression>) {
        for rule in rules {
            if rule == "*" {
                self.split_wildcard(at, out, |_| Vec::new());
                if self.wildcard.is_none() {
                    self.wildcard = Some(at.open("*", Vec::new()));
                }
                continue;
            }

            let restored = self
                .wildcard
                .as_ref()
                .map_or(false, |w| contains_rule(&w.reenabled, rule));
            if restored {
                self.split_wildcard(at, out, |reenabled| {
                    reenabled
                        .iter()
                        .filter(|r| !r.eq_ignore_ascii_case(rule))
                        .cloned()
                        .collect()
                });
            }
            if !contains_open(&self.rules, rule) {
                self.rules.push(at.open(rule, Vec::new()));
            }
        }
    }

    fn restore(&mut self, rules: &[String], at: &Pragma, out: &mut Vec<Suppression>) {
        for rule in rules {
            if rule == "*" {
                for mut open in self.rules.drain(..).chain(self.wildcard.take()) {
                    open.end_line = Some(at.line);
                    out.push(open);
                }
                continue;
            }

            let mut still_open = Vec::new();
            for mut open in self.rules.drain(..) {
                if open.rule.eq_ignore_ascii_case(rule) {
                    open.end_line = Some(at.line);
                    out.push(open);
                } else {
                    still_open.push(open);
                }
            }
            self.rules = still_open;

            let silenced = self
                .wildcard
                .as_ref()
                .map_or(false, |w| !contains_rule(&w.reenabled, rule));
            if silenced {
                self.split_wildcard(at, out, |reenabled| {
                    let mut next = reenabled.to_vec();
                    next.push(rule.clone());
                    next
                });
            }
        }
    }

    /// Close the open wildcard range here and reopen it with new re-enabled rules.
    fn split_wildcard<F>(&mut self, at: &Pragma, out: &mut Vec<Suppression>, reenabled: F)
    where
        F: FnOnce(&[String]) -> Vec<String>,
    {
        if let Some(mut open) = self.wildcard.take() {
            let next = at.open("*", reenabled(&open.reenabled));
            open.end_line = Some(at.line);
            out.push(open);
            self.wildcard = Some(next);
        }
    }

    fn finish(self, out: &mut Vec<Suppression>) {
        out.extend(self.rules);
        out.extend(self.wildcard);
    }
}

fn contains_rule(rules: &[String], rule: &str) -> bool {
    rules.iter().any(|r| r.eq_ignore_ascii_case(rule))
}

fn contains_open(open: &[Suppression], rule: &str) -> bool {
    open.iter().any(|s| s.rule.eq_ignore_ascii_case(rule))
}


/// Rule ids listed after `disable`/`restore`; none means all rules.
fn pragma_rules(list: &str) -> Vec<String> {
    let rules: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    if rules.is_empty() {
        vec!["*".to_string()]
    } else {
        rules
    }
}

fn is_comment_or_empty(line: &str) -> bool {
    line.is_empty() || line.starts_with("//") || line.starts_with("/*") || line.starts_with('*')
}

/// Check if a diagnostic matches a suppression.
pub fn matches_suppression(diagnostic: &Diagnostic, suppression: &Suppression) -> bool {
    if diagnostic.file() != suppression.file {
        return false;
    }

    if suppression.rule != "*" && !suppression.rule.eq_ignore_ascii_case(diagnostic.id()) {
        return false;
    }
    if contains_rule(&suppression.reenabled, diagnostic.id()) {
        return false;
    }

    let line = diagnostic.line();
    match suppression.suppression_type {
        SuppressionType::File => true,
        SuppressionType::Line => line == suppression.line,
        SuppressionType::NextLine => line == suppression.line + 1,
        SuppressionType::Pragma => {
            line > suppression.line && suppression.end_line.map_or(true, |end| line < end)
        }
    }
}

/// Separate diagnostics into active and suppressed.
pub fn filter_suppressed(
    diagnostics: Vec<Diagnostic>,
    suppressions: &[Suppression],
) -> (Vec<Diagnostic>, Vec<SuppressedDiagnostic>) {
    let mut active = Vec::new();
    let mut suppressed = Vec::new();

    for diagnostic in diagnostics {
        match suppressions
            .iter()
            .find(|s| matches_suppression(&diagnostic, s))
        {
            Some(suppression) => suppressed.push(SuppressedDiagnostic {
                diagnostic,
                suppression: suppression.clone(),
            }),
            None => active.push(diagnostic),
        }
    }

    (active, suppressed)
}

/// Parse suppressions for a set of in-memory documents, keyed by name.
pub fn collect_suppressions<'a, I>(documents: I) -> HashMap<String, Vec<Suppression>>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut result = HashMap::new();
    for (name, text) in documents {
        let suppressions = parse_suppressions(name, text);
        if !suppressions.is_empty() {
            result.insert(name.to_string(), suppressions);
        }
    }
    result
}
