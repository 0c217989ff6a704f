//! Top-level entry points (spec §2, §6): `inferImplicit`, `inferView`, and
//! the auxiliary queries built on top of `best_implicit`.
//!
//! Grounded on `chalk-solve::Solver`'s public `solve`/`solve_multiple`
//! surface: a thin, stateless-looking facade in front of the recursive
//! engine, owning nothing across calls beyond what's passed in.

use givens_engine::SearchHistory;
use givens_ir::{Candidate, Oracle, Prototype, SearchResult, Symbol};
use givens_solve::{ContextualImplicits, ScopeCache};

use crate::dictionary::DictionaryBuilder;
use crate::rank::{best_implicit, SearchCtx};
use crate::SearchConfig;

/// `inferImplicit(pt)` (spec §2): find a term of the expected type `pt`,
/// owned by `owner` (used to parent any synthetic symbols this search
/// allocates), searching `contextual` before the companion-derived scope.
/// Runs the full search to completion, including dictionary synthesis for
/// any by-name implicit tied to itself along the way.
pub fn infer_implicit<O: Oracle>(
    oracle: &mut O,
    owner: Symbol,
    contextual: Option<&ContextualImplicits<O::Type>>,
    pt: &Prototype<O::Type>,
    config: SearchConfig,
) -> SearchResult<O::Type, O::Tree, O::Commit> {
    let history = SearchHistory::new_root();
    let mut scope_cache = ScopeCache::new();
    let ctx = SearchCtx {
        owner,
        contextual,
        config: &config,
    };

    let explore_only = config.explore_only;
    let result = best_implicit(oracle, &history, &mut scope_cache, &ctx, pt, None);
    match result {
        SearchResult::Success(success) if explore_only => SearchResult::Success(success),
        SearchResult::Success(success) => {
            oracle.commit(success.commit.clone());
            let tree = DictionaryBuilder::finalize(
                oracle,
                &history,
                &mut scope_cache,
                &ctx,
                owner,
                success.tree,
            );
            SearchResult::Success(givens_ir::Success { tree, ..success })
        }
        failure => failure,
    }
}

/// `inferView(from, to)` (spec §4.4, §6): find a conversion from a value
/// of type `from` to something compatible with `to`, given the
/// already-elaborated `argument` tree for `from`.
pub fn infer_view<O: Oracle>(
    oracle: &mut O,
    owner: Symbol,
    contextual: Option<&ContextualImplicits<O::Type>>,
    from: O::Type,
    to: O::Type,
    argument: O::Tree,
    config: SearchConfig,
) -> SearchResult<O::Type, O::Tree, O::Commit> {
    let pt = Prototype::View {
        arg_type: from,
        res_type: Box::new(Prototype::Value(to)),
    };
    let history = SearchHistory::new_root();
    let mut scope_cache = ScopeCache::new();
    let explore_only = config.explore_only;
    let ctx = SearchCtx {
        owner,
        contextual,
        config: &config,
    };
    let result = best_implicit(oracle, &history, &mut scope_cache, &ctx, &pt, Some(argument));
    if !explore_only {
        if let SearchResult::Success(success) = &result {
            oracle.commit(success.commit.clone());
        }
    }
    result
}

/// `viewExists(from, to)` (spec §6): a yes/no probe, stopping at the first
/// type-checking candidate rather than running the full rank/disambiguate
/// pass -- used by the extension-method and "can this even convert"
/// checks that don't need (and shouldn't pay for) a unique answer.
pub fn view_exists<O: Oracle>(
    oracle: &mut O,
    owner: Symbol,
    contextual: Option<&ContextualImplicits<O::Type>>,
    from: O::Type,
    to: O::Type,
    argument: O::Tree,
) -> bool {
    infer_view(
        oracle,
        owner,
        contextual,
        from,
        to,
        argument,
        SearchConfig::explore_only(),
    )
    .is_success()
}

/// Every candidate (from both the contextual chain and the
/// companion-derived scope) that classifies as a match for `pt`, without
/// picking a winner -- used by diagnostics and the REPL's `:implicits`
/// listing (spec §7's "all are values", generalized to "list them all").
pub fn all_implicits<O: Oracle>(
    oracle: &O,
    contextual: Option<&ContextualImplicits<O::Type>>,
    scope_cache: &mut ScopeCache<O::Type>,
    pt: &Prototype<O::Type>,
) -> Vec<Candidate<O::Type>> {
    let anchor = crate::rank::anchor_type(pt);
    let mut found = Vec::new();
    if let Some(chain) = contextual {
        found.extend(chain.eligible(oracle, pt));
    }
    let scope = scope_cache.implicit_scope(oracle, &anchor);
    found.extend(scope.eligible(oracle, pt).iter().cloned());
    found
}
