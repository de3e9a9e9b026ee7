//! Overload resolution for calls, operators and constructors.
//!
//! ## Algorithm
//!
//! 1. Keep candidates whose parameter count equals the argument count
//! 2. Check each argument's castability to the parameter type
//! 3. Sum the castability distances of each viable candidate
//! 4. Pick the unique minimum (see [`find_best_match`])
//!
//! Results are never cached across call sites. Callers resolve the
//! prototypes of same-arity candidates before calling [`resolve_overload`].

mod ranking;

pub use ranking::find_best_match;

use quill_core::{SemanticError, Span};
use quill_registry::{FuncId, Registry, TypeId};

/// Result of successful overload resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverloadMatch {
    pub func: FuncId,
    /// Sum of the argument castability distances.
    pub total_cost: u32,
}

/// Select the best overload of `name` for `arg_types`.
///
/// No viable candidate is an [`SemanticError::UndefinedSymbol`] naming the
/// argument types; a tie is [`SemanticError::AmbiguousOverload`].
pub fn resolve_overload(
    candidates: &[FuncId],
    arg_types: &[TypeId],
    registry: &Registry<'_>,
    name: &str,
    span: Span,
) -> Result<OverloadMatch, SemanticError> {
    let viable: Vec<OverloadMatch> = candidates
        .iter()
        .filter_map(|&func| try_match_candidate(func, arg_types, registry))
        .collect();

    if viable.is_empty() {
        let arguments: Vec<&str> = arg_types.iter().map(|&ty| registry.name(ty)).collect();
        return Err(SemanticError::no_matching_function(name, &arguments.join(", "), span));
    }

    find_best_match(&viable, registry, name, span)
}

/// Cost of calling `func` with `arg_types`, `None` if not viable.
pub fn try_match_candidate(func: FuncId, arg_types: &[TypeId], registry: &Registry<'_>) -> Option<OverloadMatch> {
    let signature = registry.function(func).signature.as_ref()?;
    if signature.params.len() != arg_types.len() {
        return None;
    }
    let mut total_cost = 0;
    for (&arg, &param) in arg_types.iter().zip(&signature.params) {
        total_cost += registry.castable(arg, param)?;
    }
    Some(OverloadMatch { func, total_cost })
}

/// Whether `func` takes `arity` arguments, judged from its declaration.
pub fn has_arity(registry: &Registry<'_>, func: FuncId, arity: usize) -> bool {
    registry.function(func).params.len() == arity
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::PrimitiveKind;

    #[test]
    fn widening_picks_double_add() {
        let registry = Registry::new();
        let int = registry.primitive(PrimitiveKind::Int);
        let double = registry.primitive(PrimitiveKind::Double);
        let candidates = registry.static_candidates(double, "+");

        let found = resolve_overload(&candidates, &[int, double], &registry, "+", Span::default()).unwrap();
        assert_eq!(registry.canonical_name(found.func), "Double.+(Double,Double)");
        assert_eq!(found.total_cost, 3);
    }

    #[test]
    fn print_selects_closest_overload() {
        let registry = Registry::new();
        let short = registry.primitive(PrimitiveKind::Short);
        let candidates = registry.global_candidates("print");

        let found = resolve_overload(&candidates, &[short], &registry, "print", Span::default()).unwrap();
        assert_eq!(registry.canonical_name(found.func), "print(Int)");
    }

    #[test]
    fn no_viable_candidate_names_arguments() {
        let registry = Registry::new();
        let string = registry.builtins().string;
        let double = registry.primitive(PrimitiveKind::Double);
        let candidates = registry.static_candidates(double, "+");

        let err = resolve_overload(&candidates, &[string, double], &registry, "+", Span::new(3, 7, 1)).unwrap_err();
        assert!(matches!(
            err,
            SemanticError::UndefinedSymbol { ref name, .. } if name == "+(String, Double)"
        ));
    }

    #[test]
    fn arity_filters_candidates() {
        let registry = Registry::new();
        let int = registry.primitive(PrimitiveKind::Int);
        let candidates = registry.static_candidates(int, "+");
        assert!(try_match_candidate(candidates[0], &[int], &registry).is_none());
        assert!(has_arity(&registry, candidates[0], 2));
    }
}
