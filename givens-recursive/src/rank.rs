//! `RankingEngine` (spec §4.6): the best-implicit search -- sort eligible
//! candidates, try each respecting divergence, and disambiguate successes
//! pairwise.
//!
//! Grounded on `chalk-solve/src/recursive/solve.rs`'s iterate-candidates-
//! and-combine shape, and on `chalk-solve/src/recursive/fulfill.rs`'s
//! `Fulfill` -- a disposable, per-trial state that is either committed or
//! silently dropped -- for `try_implicit`'s per-candidate trial discipline.

use std::cmp::Ordering;
use std::collections::VecDeque;

use givens_engine::SearchHistory;
use givens_ir::{
    AdaptError, Candidate, ImplicitRef, KindMask, Oracle, Prototype, SearchFailureType,
    SearchResult, ShadowProbe, Success, Symbol, TermRef, TypeShape,
};
use givens_solve::ContextualImplicits;

use crate::SearchConfig;

/// Per-call context threaded through ranking that doesn't change between
/// recursive calls within one top-level `infer`: the symbol new synthetic
/// definitions (dictionary entries, `Not[_]` witnesses) are owned by, the
/// lexical chain (if any), and the tuning knobs.
pub struct SearchCtx<'a, T> {
    pub owner: Symbol,
    pub contextual: Option<&'a ContextualImplicits<T>>,
    pub config: &'a SearchConfig,
}

/// `bestImplicit(pt, argument, contextual)` (spec §4.6).
pub fn best_implicit<O: Oracle>(
    oracle: &mut O,
    history: &SearchHistory<O::Type, O::Tree>,
    scope_cache: &mut givens_solve::ScopeCache<O::Type>,
    ctx: &SearchCtx<O::Type>,
    pt: &Prototype<O::Type>,
    argument: Option<O::Tree>,
) -> SearchResult<O::Type, O::Tree, O::Commit> {
    let anchor = anchor_type(pt);

    if let Some(reference) = history.recursive_ref(oracle, &anchor, false, |oracle, widened| {
        let sym = oracle.fresh_symbol(ctx.owner, "$dictionary");
        ImplicitRef::Plain(TermRef::new(sym, widened.clone()))
    }) {
        let tree = oracle.tree_ident(reference.term_ref().symbol);
        return SearchResult::Success(Success {
            tree,
            reference,
            level: 0,
            commit: oracle.trivial_commit(),
        });
    }

    if let Some(chain) = ctx.contextual {
        let eligible = chain.eligible(oracle, pt);
        let result = search_implicits(
            oracle,
            history,
            scope_cache,
            ctx,
            pt,
            argument.clone(),
            eligible,
            true,
        );
        match &result {
            SearchResult::Success(_) => return result,
            SearchResult::Failure(f) => {
                if f.is_ambiguous()
                    || matches!(f, SearchFailureType::Diverging(_))
                    || matches!(f, SearchFailureType::Shadowed { .. })
                {
                    return result;
                }
            }
        }
    }

    let scope = scope_cache.implicit_scope(oracle, &anchor);
    let derived_eligible = scope.eligible(oracle, pt).to_vec();
    search_implicits(
        oracle,
        history,
        scope_cache,
        ctx,
        pt,
        argument,
        derived_eligible,
        false,
    )
}

/// Resolves the right-hand side for a dictionary entry tied during an
/// earlier search. Unlike `best_implicit`, this does not start by asking
/// `SearchHistory::recursive_ref` whether an entry already exists for
/// `widened` -- it *is* that entry's own defining search, so taking that
/// shortcut would just hand back the entry's own identifier as its
/// right-hand side. A deeper recursive request for the same widened type
/// from inside the candidate this finds still ties to `reference`
/// normally, through `recursive_ref`'s existing-entry check -- that's the
/// legitimate self-reference a by-name dictionary field is built from.
pub(crate) fn resolve_dictionary_entry<O: Oracle>(
    oracle: &mut O,
    history: &SearchHistory<O::Type, O::Tree>,
    scope_cache: &mut givens_solve::ScopeCache<O::Type>,
    ctx: &SearchCtx<O::Type>,
    reference: &ImplicitRef<O::Type>,
    widened: &O::Type,
) -> SearchResult<O::Type, O::Tree, O::Commit> {
    let pt = Prototype::Value(widened.clone());
    let nested = history.nest(reference.clone(), widened.clone(), true);

    if let Some(chain) = ctx.contextual {
        let eligible = chain.eligible(oracle, &pt);
        let result = search_implicits(
            oracle,
            &nested,
            scope_cache,
            ctx,
            &pt,
            None,
            eligible,
            true,
        );
        match &result {
            SearchResult::Success(_) => return result,
            SearchResult::Failure(f) => {
                if f.is_ambiguous()
                    || matches!(f, SearchFailureType::Diverging(_))
                    || matches!(f, SearchFailureType::Shadowed { .. })
                {
                    return result;
                }
            }
        }
    }

    let scope = scope_cache.implicit_scope(oracle, widened);
    let derived_eligible = scope.eligible(oracle, &pt).to_vec();
    search_implicits(oracle, &nested, scope_cache, ctx, &pt, None, derived_eligible, false)
}

#[allow(clippy::too_many_arguments)]
fn search_implicits<O: Oracle>(
    oracle: &mut O,
    history: &SearchHistory<O::Type, O::Tree>,
    scope_cache: &mut givens_solve::ScopeCache<O::Type>,
    ctx: &SearchCtx<O::Type>,
    pt: &Prototype<O::Type>,
    argument: Option<O::Tree>,
    mut eligible: Vec<Candidate<O::Type>>,
    contextual: bool,
) -> SearchResult<O::Type, O::Tree, O::Commit> {
    sort_candidates(oracle, &mut eligible);
    rank(oracle, history, scope_cache, ctx, pt, argument, eligible, contextual)
}

/// `sort(eligible)`: most-preferred-first, via `Oracle::compare` (spec
/// §4.6's level/owner/arity order *is* `compare`'s own order -- both
/// combine the same three keys, so there is nothing left for this
/// function to do beyond picking a direction). Stability is not relied
/// upon for correctness, only for determinism of trial order among
/// truly-equal candidates (spec §8's determinism property).
fn sort_candidates<O: Oracle>(oracle: &O, eligible: &mut [Candidate<O::Type>]) {
    eligible.sort_by(|a, b| {
        let a_sym = a.reference.term_ref().symbol;
        let b_sym = b.reference.term_ref().symbol;
        oracle.compare(a_sym, b_sym, a.level, b.level).reverse()
    });
    tracing::debug!(count = eligible.len(), "sorted eligible candidates");
}

/// `rank(pending, found, rfailures)` (spec §4.6).
#[allow(clippy::too_many_arguments)]
fn rank<O: Oracle>(
    oracle: &mut O,
    history: &SearchHistory<O::Type, O::Tree>,
    scope_cache: &mut givens_solve::ScopeCache<O::Type>,
    ctx: &SearchCtx<O::Type>,
    pt: &Prototype<O::Type>,
    argument: Option<O::Tree>,
    pending: Vec<Candidate<O::Type>>,
    contextual: bool,
) -> SearchResult<O::Type, O::Tree, O::Commit> {
    let anchor = anchor_type(pt);
    let negated = oracle.is_not_prototype(&anchor);

    let mut pending: VecDeque<Candidate<O::Type>> = pending.into();
    let mut found: Option<Success<O::Type, O::Tree, O::Commit>> = None;
    let mut failures: Vec<SearchFailureType<O::Type, O::Tree>> = Vec::new();
    let mut ambiguity_healed_by_success = false;

    while let Some(cand) = pending.pop_front() {
        let raw = try_implicit(
            oracle,
            history,
            scope_cache,
            ctx,
            &cand,
            pt,
            argument.clone(),
            contextual,
            false,
        );
        let result = if negated {
            negate_result(oracle, ctx.owner, raw)
        } else {
            raw
        };

        match result {
            SearchResult::Failure(f) => {
                if f.is_ambiguous() {
                    if ctx.config.legacy_ambiguity_warnings {
                        ambiguity_healed_by_success = true;
                        failures.push(f);
                        continue;
                    }
                    return heal_ambiguous(
                        oracle,
                        history,
                        scope_cache,
                        ctx,
                        pt,
                        argument,
                        pending.into_iter().collect(),
                        f,
                        contextual,
                    );
                }
                failures.push(f);
            }
            SearchResult::Success(best) => {
                if ctx.config.explore_only || oracle.is_coherence_tagged(&anchor) {
                    return SearchResult::Success(best);
                }
                match found {
                    None => {
                        prune_dominated(oracle, &best, &mut pending);
                        found = Some(best);
                    }
                    Some(prev) => {
                        let diff = oracle.compare(
                            prev.reference.term_ref().symbol,
                            best.reference.term_ref().symbol,
                            prev.level,
                            best.level,
                        );
                        debug_assert_ne!(
                            diff,
                            Ordering::Greater,
                            "sort + pruning should have already excluded anything strictly worse than `found`"
                        );
                        match diff {
                            Ordering::Equal => {
                                return SearchResult::Failure(SearchFailureType::Ambiguous(
                                    Box::new(prev.erase_commit()),
                                    Box::new(best.erase_commit()),
                                ));
                            }
                            _ => {
                                prune_dominated(oracle, &best, &mut pending);
                                found = Some(best);
                            }
                        }
                    }
                }
            }
        }
    }

    match found {
        Some(success) => {
            if ctx.config.legacy_ambiguity_warnings && ambiguity_healed_by_success {
                tracing::warn!(
                    "implicit search succeeded after passing over an ambiguous candidate pair (legacy mode)"
                );
            }
            SearchResult::Success(success)
        }
        None => SearchResult::Failure(
            failures
                .into_iter()
                .next_back()
                .unwrap_or(SearchFailureType::NoMatching),
        ),
    }
}

/// Drop any remaining candidate that `winner` is strictly preferred over
/// -- it cannot change the eventual result (spec §4.6's "continue with
/// remaining filtered so every retained cand satisfies compare(best,
/// cand) <= 0").
fn prune_dominated<O: Oracle>(
    oracle: &O,
    winner: &Success<O::Type, O::Tree, O::Commit>,
    pending: &mut VecDeque<Candidate<O::Type>>,
) {
    let winner_sym = winner.reference.term_ref().symbol;
    pending.retain(|cand| {
        let cand_sym = cand.reference.term_ref().symbol;
        oracle.compare(winner_sym, cand_sym, winner.level, cand.level) != Ordering::Greater
    });
}

/// `healAmbiguous(remaining, ambiguousFailure)` (spec §4.6).
#[allow(clippy::too_many_arguments)]
fn heal_ambiguous<O: Oracle>(
    oracle: &mut O,
    history: &SearchHistory<O::Type, O::Tree>,
    scope_cache: &mut givens_solve::ScopeCache<O::Type>,
    ctx: &SearchCtx<O::Type>,
    pt: &Prototype<O::Type>,
    argument: Option<O::Tree>,
    mut remaining: Vec<Candidate<O::Type>>,
    ambiguous: SearchFailureType<O::Type, O::Tree>,
    contextual: bool,
) -> SearchResult<O::Type, O::Tree, O::Commit> {
    let (a, b) = match &ambiguous {
        SearchFailureType::Ambiguous(a, b) => (a.as_ref(), b.as_ref()),
        _ => unreachable!("heal_ambiguous called with a non-Ambiguous failure"),
    };
    remaining.retain(|cand| {
        let cand_sym = cand.reference.term_ref().symbol;
        let a_sym = a.reference.term_ref().symbol;
        let b_sym = b.reference.term_ref().symbol;
        oracle.compare(a_sym, cand_sym, a.level, cand.level) == Ordering::Less
            && oracle.compare(b_sym, cand_sym, b.level, cand.level) == Ordering::Less
    });
    match rank(oracle, history, scope_cache, ctx, pt, argument, remaining, contextual) {
        SearchResult::Failure(_) => SearchResult::Failure(ambiguous),
        success => success,
    }
}

/// `negated`: swap success/failure for a `Not[_]` prototype search,
/// synthesizing a trivial witness tree on success-by-negation.
fn negate_result<O: Oracle>(
    oracle: &mut O,
    owner: Symbol,
    result: SearchResult<O::Type, O::Tree, O::Commit>,
) -> SearchResult<O::Type, O::Tree, O::Commit> {
    match result {
        SearchResult::Success(success) => {
            SearchResult::Failure(SearchFailureType::Mismatched(success.reference))
        }
        SearchResult::Failure(_) => {
            let witness = oracle.fresh_symbol(owner, "$not");
            let prefix = oracle.companion_prefix(witness);
            SearchResult::Success(Success {
                tree: oracle.tree_new(witness),
                reference: ImplicitRef::Plain(TermRef::new(witness, prefix)),
                level: 0,
                commit: oracle.trivial_commit(),
            })
        }
    }
}

/// `tryImplicit` (spec §4.6): the actual type-check of one candidate
/// against `pt`, including the shadowing probe.
#[allow(clippy::too_many_arguments)]
fn try_implicit<O: Oracle>(
    oracle: &mut O,
    history: &SearchHistory<O::Type, O::Tree>,
    scope_cache: &mut givens_solve::ScopeCache<O::Type>,
    ctx: &SearchCtx<O::Type>,
    candidate: &Candidate<O::Type>,
    pt: &Prototype<O::Type>,
    argument: Option<O::Tree>,
    contextual: bool,
    in_shadow_probe: bool,
) -> SearchResult<O::Type, O::Tree, O::Commit> {
    let reference = candidate.reference.clone();
    let term_ref = reference.term_ref().clone();
    let anchor = anchor_type(pt);

    tracing::debug!(symbol = ?term_ref.symbol, level = candidate.level, "trying implicit candidate");

    if history.check_divergence(oracle, &reference, &anchor) {
        return SearchResult::Failure(SearchFailureType::Diverging(reference));
    }

    let declared = oracle.type_of_symbol(term_ref.symbol);
    let own_type = oracle.as_seen_from(&declared, &term_ref.prefix);
    let by_name = has_by_name_param(oracle, &own_type);
    let nested = history.nest(reference.clone(), anchor.clone(), by_name);

    let base_tree = oracle.tree_ident(term_ref.symbol);
    let trial = match argument {
        None => resolve_value(oracle, &nested, scope_cache, ctx, &own_type, base_tree, &anchor),
        Some(arg) => resolve_conversion(oracle, candidate, base_tree, pt, arg),
    };

    let result = match trial {
        Ok((tree, commit)) => SearchResult::Success(Success {
            tree,
            reference: reference.clone(),
            level: candidate.level,
            commit,
        }),
        Err(_) => SearchResult::Failure(SearchFailureType::Mismatched(reference.clone())),
    };

    if !contextual || in_shadow_probe || !result.is_success() {
        return result;
    }

    let declared_name = oracle.name_of(term_ref.symbol);
    let implicit_name = reference.implicit_name(&declared_name).to_string();
    match oracle.probe_bare_name(&implicit_name, term_ref.symbol) {
        ShadowProbe::SameOrCompatible => result,
        ShadowProbe::ShadowedBy(shadowing) => {
            SearchResult::Failure(SearchFailureType::Shadowed {
                candidate: reference,
                shadowing,
            })
        }
    }
}

/// Applies every curried implicit parameter clause of `own_type`,
/// resolving each parameter recursively (by-name parameters are resolved
/// through the same, already by-name-tagged, nested history so that
/// `SearchHistory::recursive_ref` can tie a self-referential knot), then
/// adapts the fully-applied result to `pt`.
#[allow(clippy::too_many_arguments)]
fn resolve_value<O: Oracle>(
    oracle: &mut O,
    history: &SearchHistory<O::Type, O::Tree>,
    scope_cache: &mut givens_solve::ScopeCache<O::Type>,
    ctx: &SearchCtx<O::Type>,
    own_type: &O::Type,
    base_tree: O::Tree,
    pt: &O::Type,
) -> Result<(O::Tree, O::Commit), AdaptError> {
    let applied = apply_implicit_params(oracle, history, scope_cache, ctx, base_tree, own_type)?;
    oracle.try_adapt(applied, pt)
}

fn apply_implicit_params<O: Oracle>(
    oracle: &mut O,
    history: &SearchHistory<O::Type, O::Tree>,
    scope_cache: &mut givens_solve::ScopeCache<O::Type>,
    ctx: &SearchCtx<O::Type>,
    tree: O::Tree,
    ty: &O::Type,
) -> Result<O::Tree, AdaptError> {
    match oracle.shape(ty) {
        TypeShape::Method {
            implicit: true,
            params,
            result,
        } => {
            let mut args = Vec::with_capacity(params.len());
            for param in &params {
                let param_pt = Prototype::Value(param.clone());
                match best_implicit(oracle, history, scope_cache, ctx, &param_pt, None) {
                    SearchResult::Success(success) => {
                        oracle.commit(success.commit);
                        args.push(success.tree);
                    }
                    SearchResult::Failure(_) => return Err(AdaptError),
                }
            }
            let applied = oracle.tree_apply(tree, args);
            apply_implicit_params(oracle, history, scope_cache, ctx, applied, &result)
        }
        TypeShape::Poly { result } => {
            apply_implicit_params(oracle, history, scope_cache, ctx, tree, &result)
        }
        _ => Ok(tree),
    }
}

fn has_by_name_param<O: Oracle>(oracle: &O, ty: &O::Type) -> bool {
    match oracle.shape(ty) {
        TypeShape::Method {
            implicit: true,
            params,
            result,
        } => params.iter().any(|p| oracle.is_by_name_type(p)) || has_by_name_param(oracle, &result),
        TypeShape::Poly { result } => has_by_name_param(oracle, &result),
        _ => false,
    }
}

/// Conversion/extension trial (spec §4.6's non-empty-`argument` branch).
fn resolve_conversion<O: Oracle>(
    oracle: &mut O,
    candidate: &Candidate<O::Type>,
    base_tree: O::Tree,
    pt: &Prototype<O::Type>,
    argument: O::Tree,
) -> Result<(O::Tree, O::Commit), AdaptError> {
    let selection = selection_of(pt);
    let is_extension = candidate.kind.contains(KindMask::EXTENSION);
    let is_conversion = candidate.kind.contains(KindMask::CONVERSION);

    let extension_trial = if is_extension {
        if let Some((name, ..)) = selection {
            oracle
                .try_extension_apply(base_tree.clone(), name, argument.clone())
                .ok()
        } else {
            None
        }
    } else {
        None
    };

    if is_extension && is_conversion {
        let conversion_trial = oracle.try_conversion_apply(base_tree, argument).ok();
        return match (extension_trial, conversion_trial) {
            (Some(ext), Some(conv)) => {
                if candidates_agree(oracle, &ext.0, &conv.0) {
                    Ok(ext)
                } else {
                    // Both type-checked cleanly but diverge: ambiguous
                    // between the extension and conversion readings.
                    // Reported as a plain type-check failure, since the
                    // ambiguity is between two *applications* of the same
                    // candidate, not two different candidates (spec §3
                    // only models ambiguity between distinct `Candidate`s).
                    Err(AdaptError)
                }
            }
            (Some(ext), None) => Ok(ext),
            (None, Some(conv)) => Ok(conv),
            (None, None) => Err(AdaptError),
        };
    }

    if is_extension {
        return extension_trial.ok_or(AdaptError);
    }

    oracle.try_conversion_apply(base_tree, argument)
}

fn candidates_agree<O: Oracle>(oracle: &O, a: &O::Tree, b: &O::Tree) -> bool {
    oracle.tree_type(a) == oracle.tree_type(b)
}

fn selection_of<T>(pt: &Prototype<T>) -> Option<(&str, &T, bool)> {
    match pt {
        Prototype::Selection {
            name,
            member_type,
            private_ok,
        } => Some((name.as_str(), member_type, *private_ok)),
        Prototype::View { res_type, .. } => selection_of(res_type),
        Prototype::Value(_) => None,
    }
}

/// The anchor [`Oracle::Type`] a [`Prototype`] reduces to for history/
/// divergence bookkeeping, which operates purely on types: a `Value`'s
/// own type, a `Selection`'s member type, or a `View`'s argument type
/// (the side actually being converted -- divergence tracks the growth of
/// what we're trying to convert *from*, not the target we're converting
/// *to*).
pub(crate) fn anchor_type<T: Clone>(pt: &Prototype<T>) -> T {
    match pt {
        Prototype::Value(t) => t.clone(),
        Prototype::Selection { member_type, .. } => member_type.clone(),
        Prototype::View { arg_type, .. } => arg_type.clone(),
    }
}
