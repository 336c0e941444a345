//! Semantic symbols bound from declarations and metadata references.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::{Location, MethodKind, ParameterShape};

/// A namespace, as a list of dotted parts. The empty list is the global namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct NamespaceSymbol {
    parts: Vec<String>,
}

impl NamespaceSymbol {
    pub fn global() -> Self {
        Self { parts: Vec::new() }
    }

    pub fn from_parts(parts: Vec<String>) -> Self {
        Self { parts }
    }

    /// Parse a dotted name; blank segments are dropped.
    pub fn parse(dotted: &str) -> Self {
        Self {
            parts: dotted
                .split('.')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_global(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Fully qualified dotted name, or `<global namespace>`.
    pub fn display_string(&self) -> String {
        if self.is_global() {
            "<global namespace>".to_string()
        } else {
            self.parts.join(".")
        }
    }
}

impl fmt::Display for NamespaceSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_string())
    }
}

/// Where a type symbol came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolOrigin {
    Source,
    /// Metadata reference, by display name.
    Metadata(String),
}

/// A named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeSymbol {
    /// Simple name (e.g. `AuthorizeAttribute`).
    pub name: String,
    pub containing_namespace: Option<NamespaceSymbol>,
    /// Outer type names for nested types, outermost first.
    pub containing_types: Vec<String>,
    pub origin: SymbolOrigin,
}

impl TypeSymbol {
    /// Dotted name including namespace and containing types.
    pub fn full_name(&self) -> String {
        let mut parts: Vec<String> = self
            .containing_namespace
            .as_ref()
            .map(|ns| ns.parts().to_vec())
            .unwrap_or_default();
        parts.extend(self.containing_types.iter().cloned());
        parts.push(self.name.clone());
        parts.join(".")
    }
}

/// A single attribute application on a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeData {
    /// Bound attribute type; `None` when the name could not be resolved.
    pub attribute_class: Option<Arc<TypeSymbol>>,
    /// Name as written in source.
    pub syntax_name: String,
    pub location: Option<Location>,
}

impl AttributeData {
    /// Simple name of the attribute type, falling back to the written name.
    pub fn class_name(&self) -> &str {
        self.attribute_class
            .as_ref()
            .map(|class| class.name.as_str())
            .unwrap_or(&self.syntax_name)
    }

    /// Containing namespace of the attribute type, when resolvable.
    pub fn containing_namespace(&self) -> Option<&NamespaceSymbol> {
        self.attribute_class
            .as_ref()
            .and_then(|class| class.containing_namespace.as_ref())
    }
}

/// A resolved method or local function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSymbol {
    pub name: String,
    pub kind: MethodKind,
    /// Qualified name of the declaring type, `None` for top-level local functions.
    pub containing_type: Option<String>,
    pub parameters: ParameterShape,
    /// Attributes in declaration order.
    pub attributes: Vec<AttributeData>,
    pub location: Location,
}

impl MethodSymbol {
    pub fn attributes(&self) -> &[AttributeData] {
        &self.attributes
    }

    /// `Type.Method`, or just the name for top-level local functions.
    pub fn qualified_name(&self) -> String {
        match &self.containing_type {
            Some(ty) if !ty.is_empty() => format!("{}.{}", ty, self.name),
            _ => self.name.clone(),
        }
    }
}

/// Why binding produced candidates instead of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateReason {
    None,
    /// More than one candidate is applicable.
    Ambiguous,
    /// Candidates exist but none accepts the arguments.
    OverloadResolutionFailure,
}

/// Result of binding an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub symbol: Option<Arc<MethodSymbol>>,
    pub candidates: Vec<Arc<MethodSymbol>>,
    pub reason: CandidateReason,
}

impl SymbolInfo {
    /// Nothing was found.
    pub fn none() -> Self {
        Self {
            symbol: None,
            candidates: Vec::new(),
            reason: CandidateReason::None,
        }
    }

    pub fn bound(symbol: Arc<MethodSymbol>) -> Self {
        Self {
            symbol: Some(symbol),
            candidates: Vec::new(),
            reason: CandidateReason::None,
        }
    }

    pub fn with_candidates(candidates: Vec<Arc<MethodSymbol>>, reason: CandidateReason) -> Self {
        Self {
            symbol: None,
            candidates,
            reason,
        }
    }
}
