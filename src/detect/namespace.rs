//! Reserved-namespace classification of attributes.

use crate::analysis::{AttributeData, MethodSymbol, NamespaceSymbol};

/// Framework namespace whose attributes only take effect on the handler.
pub const DEFAULT_RESERVED_NAMESPACE: &str = "Microsoft.AspNetCore";

/// A namespace prefix matched case-insensitively (ASCII) against the
/// dotted display name of an attribute's containing namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedNamespace {
    prefix: String,
}

impl ReservedNamespace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Plain string prefix test; `Microsoft.AspNetCoreX` also matches.
    pub fn contains(&self, namespace: &NamespaceSymbol) -> bool {
        let display = namespace.display_string();
        display
            .get(..self.prefix.len())
            .map_or(false, |head| head.eq_ignore_ascii_case(&self.prefix))
    }
}

impl Default for ReservedNamespace {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_NAMESPACE)
    }
}

/// Attributes of `method` declared in the reserved namespace, in declaration order.
///
/// Attributes that could not be bound, or whose type has no containing
/// namespace, are never in scope.
pub fn classify<'m>(method: &'m MethodSymbol, reserved: &ReservedNamespace) -> Vec<&'m AttributeData> {
    method
        .attributes()
        .iter()
        .filter(|attr| {
            attr.containing_namespace()
                .map_or(false, |namespace| reserved.contains(namespace))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::analysis::{Location, MethodKind, ParameterShape, Span, SymbolOrigin, TypeSymbol};

    fn span() -> Span {
        Span {
            start_byte: 0,
            end_byte: 1,
            start_line: 1,
            start_col: 1,
            end_line: 1,
            end_col: 2,
        }
    }

    fn attribute(namespace: Option<&str>, name: &str) -> AttributeData {
        AttributeData {
            attribute_class: Some(Arc::new(TypeSymbol {
                name: name.to_string(),
                containing_namespace: namespace.map(NamespaceSymbol::parse),
                containing_types: Vec::new(),
                origin: SymbolOrigin::Source,
            })),
            syntax_name: name.trim_end_matches("Attribute").to_string(),
            location: None,
        }
    }

    fn method(attributes: Vec<AttributeData>) -> MethodSymbol {
        MethodSymbol {
            name: "Hello".to_string(),
            kind: MethodKind::Method,
            containing_type: Some("Foo".to_string()),
            parameters: ParameterShape::default(),
            attributes,
            location: Location::new("Test0.cs", span()),
        }
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let reserved = ReservedNamespace::default();
        assert!(reserved.contains(&NamespaceSymbol::parse("Microsoft.AspNetCore.Authorization")));
        assert!(reserved.contains(&NamespaceSymbol::parse("microsoft.aspnetcore.http")));
        assert!(reserved.contains(&NamespaceSymbol::parse("Microsoft.AspNetCore")));
        assert!(!reserved.contains(&NamespaceSymbol::parse("Microsoft.Extensions")));
        assert!(!reserved.contains(&NamespaceSymbol::global()));
    }

    #[test]
    fn test_classify_keeps_declaration_order() {
        let method = method(vec![
            attribute(Some("Microsoft.AspNetCore.Authorization"), "AuthorizeAttribute"),
            attribute(Some("System"), "ObsoleteAttribute"),
            attribute(None, "OrphanAttribute"),
            AttributeData {
                attribute_class: None,
                syntax_name: "Missing".to_string(),
                location: None,
            },
            attribute(Some("Microsoft.AspNetCore.Http"), "TagsAttribute"),
        ]);

        let names: Vec<_> = classify(&method, &ReservedNamespace::default())
            .iter()
            .map(|a| a.class_name())
            .collect();
        assert_eq!(names, vec!["AuthorizeAttribute", "TagsAttribute"]);
    }

    #[test]
    fn test_custom_reserved_namespace() {
        let method = method(vec![
            attribute(Some("Contoso.Web.Filters"), "AuditAttribute"),
            attribute(Some("Microsoft.AspNetCore.Authorization"), "AuthorizeAttribute"),
        ]);

        let names: Vec<_> = classify(&method, &ReservedNamespace::new("Contoso.Web"))
            .iter()
            .map(|a| a.class_name())
            .collect();
        assert_eq!(names, vec!["AuditAttribute"]);
    }
}
