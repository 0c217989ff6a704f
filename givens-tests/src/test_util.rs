#![cfg(test)]

//! Shared scaffolding for the scenario tests in `test/`.

use std::collections::HashMap;

use givens_ir::{Symbol, TermRef, TermRefSet};
use givens_integration::{lower, FixtureOracle, Ty};
use givens_solve::ContextualImplicits;

/// Lowers `source`, panicking with the lowering error on failure -- tests
/// want a loud failure pointing at the fixture source, not a `Result` to
/// thread through.
pub(crate) fn lower_ok(source: &str) -> (FixtureOracle, HashMap<String, Symbol>) {
    lower(source).unwrap_or_else(|e| panic!("invalid fixture source: {e}"))
}

/// Builds a one-level [`ContextualImplicits`] scope out of a flat list of
/// `(symbol, prefix)` pairs. `prefix` only matters when the symbol is
/// `private to`-restricted; tests that don't care can all pass the same
/// placeholder type.
pub(crate) fn contextual_scope(entries: &[(Symbol, Ty)]) -> ContextualImplicits<Ty> {
    let mut refs = TermRefSet::new();
    for &(symbol, prefix) in entries {
        refs.insert(TermRef::new(symbol, prefix));
    }
    ContextualImplicits::root(refs)
}
