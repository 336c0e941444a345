//! Binding a target invocation to the method it calls.

use std::sync::Arc;

use crate::analysis::{MethodSymbol, SemanticModel};

use super::TargetInvocation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Arc<MethodSymbol>),
    Unresolved,
}

/// Use the bound symbol, else the first candidate the model offers.
///
/// Falling back to the first candidate means an ambiguous call is treated as
/// a call to whichever overload the model lists first.
pub fn resolve(target: &TargetInvocation, model: &dyn SemanticModel) -> Resolution {
    let info = model.symbol_info(&target.syntax);
    if let Some(symbol) = info.symbol {
        return Resolution::Resolved(symbol);
    }

    match info.candidates.into_iter().next() {
        Some(candidate) => {
            tracing::debug!(
                method = %candidate.qualified_name(),
                reason = ?info.reason,
                "using first candidate for unbound invocation"
            );
            Resolution::Resolved(candidate)
        }
        None => Resolution::Unresolved,
    }
}
