//! Cost-based ranking for overload resolution.
//!
//! The viable candidate with the lowest total castability distance wins.
//! There are no tie-breakers: two candidates sharing the minimum make the
//! call ambiguous.

use quill_core::{SemanticError, Span};
use quill_registry::Registry;

use super::OverloadMatch;

/// Find the best match from viable candidates.
///
/// # Returns
///
/// * `Ok(OverloadMatch)` - The unique cheapest candidate
/// * `Err(SemanticError::AmbiguousOverload)` - Several candidates share the minimum
pub fn find_best_match(
    viable: &[OverloadMatch],
    registry: &Registry<'_>,
    name: &str,
    span: Span,
) -> Result<OverloadMatch, SemanticError> {
    let Some(best) = viable.iter().map(|m| m.total_cost).min() else {
        return Err(SemanticError::undefined("function", name, span));
    };

    let cheapest: Vec<&OverloadMatch> = viable.iter().filter(|m| m.total_cost == best).collect();
    match cheapest.as_slice() {
        [winner] => Ok(**winner),
        tied => Err(SemanticError::AmbiguousOverload {
            name: name.to_string(),
            candidates: tied.iter().map(|m| registry.canonical_name(m.func)).collect(),
            span,
        }),
    }
}
