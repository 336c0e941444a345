//! Language-specific analyzer implementations.

mod csharp;

pub use csharp::CSharpAnalyzer;

use super::LanguageAnalyzer;
use once_cell::sync::OnceCell;

/// Static storage for the C# analyzer.
static CSHARP_ANALYZER: OnceCell<CSharpAnalyzer> = OnceCell::new();

/// Register all available language analyzers.
///
/// This is idempotent - calling it multiple times is safe.
pub fn register_analyzers() {
    csharp();
}

fn csharp() -> &'static dyn LanguageAnalyzer {
    CSHARP_ANALYZER.get_or_init(CSharpAnalyzer::new)
}

/// Get an analyzer for the given file extension (without dot).
///
/// Returns None if no analyzer is registered for the extension.
pub fn get_analyzer(ext: &str) -> Option<&'static dyn LanguageAnalyzer> {
    if ext.eq_ignore_ascii_case("cs") {
        Some(csharp())
    } else {
        None
    }
}

/// Get an analyzer by language ID.
pub fn get_analyzer_by_id(lang_id: &str) -> Option<&'static dyn LanguageAnalyzer> {
    match lang_id {
        "csharp" => Some(csharp()),
        _ => None,
    }
}
