//! `DictionaryBuilder` (spec §5): turns a completed search's by-name
//! implicit dictionary into a real class definition and rewires every
//! knot-tied reference to select from one shared instance of it.
//!
//! Grounded on `chalk-solve::solve::slg::aggregate`'s answer-table
//! finalization: both walk a table of entries populated provisionally
//! during a search and turn it into one concrete artifact once the search
//! that populated it has settled, discarding entries that turned out to
//! belong only to abandoned trial branches.

use std::collections::{HashMap, HashSet};

use givens_engine::SearchHistory;
use givens_ir::{ImplicitRef, Oracle, SearchResult, Symbol};

use crate::rank::{resolve_dictionary_entry, SearchCtx};

pub struct DictionaryBuilder;

impl DictionaryBuilder {
    /// Resolves every dictionary entry linked during a completed search to
    /// a concrete right-hand side, synthesizes a private class bundling
    /// the live ones as fields plus one instance of it, and rewrites every
    /// `Ident(sym)` in `top` (and in each entry's own rhs) that names a
    /// live dictionary symbol into a select off that instance.
    ///
    /// Returns `top` unchanged if the dictionary is empty or nothing in
    /// it is actually reachable from `top` -- the common case, since only
    /// self-referential by-name implicits ever populate it at all.
    pub fn finalize<O: Oracle>(
        oracle: &mut O,
        history: &SearchHistory<O::Type, O::Tree>,
        scope_cache: &mut givens_solve::ScopeCache<O::Type>,
        ctx: &SearchCtx<O::Type>,
        owner: Symbol,
        top: O::Tree,
    ) -> O::Tree {
        if history.root().borrow().is_empty() {
            return top;
        }

        Self::resolve_entries(oracle, history, scope_cache, ctx);

        let live = Self::prune_to_fixpoint(oracle, history, &top);
        if live.is_empty() {
            return top;
        }

        let class_sym = oracle.fresh_symbol(owner, "$DictionaryClass");
        let instance_sym = oracle.fresh_symbol(owner, "$dictionaryInstance");
        let instance_ident = oracle.tree_ident(instance_sym);

        let mut subst = HashMap::new();
        for &(sym, _) in &live {
            subst.insert(sym, oracle.tree_select(instance_ident.clone(), sym));
        }

        let fields: Vec<O::Tree> = live
            .iter()
            .map(|(sym, rhs)| {
                let rewritten = oracle.substitute_idents(rhs, &subst);
                oracle.tree_val_def(*sym, rewritten)
            })
            .collect();

        let parents = oracle.dictionary_class_parents();
        let class_def = oracle.tree_class_def(class_sym, parents, fields);
        let instance_def = oracle.tree_val_def(instance_sym, oracle.tree_new(class_sym));
        let rewritten_top = oracle.substitute_idents(&top, &subst);

        oracle.tree_block(vec![class_def, instance_def], rewritten_top)
    }

    /// Drives every unresolved dictionary entry (one with a linked
    /// reference but no `rhs` yet) to a concrete tree, repeating until a
    /// pass over the table links nothing new -- resolving one entry can
    /// itself tie a fresh knot and create another.
    fn resolve_entries<O: Oracle>(
        oracle: &mut O,
        history: &SearchHistory<O::Type, O::Tree>,
        scope_cache: &mut givens_solve::ScopeCache<O::Type>,
        ctx: &SearchCtx<O::Type>,
    ) {
        loop {
            let pending: Vec<(O::Type, ImplicitRef<O::Type>)> = history
                .root()
                .borrow()
                .entries()
                .filter(|(_, _, rhs)| rhs.is_none())
                .map(|(widened, reference, _)| ((*widened).clone(), reference.clone()))
                .collect();
            if pending.is_empty() {
                break;
            }
            for (widened, reference) in pending {
                let result =
                    resolve_dictionary_entry(oracle, history, scope_cache, ctx, &reference, &widened);
                if let SearchResult::Success(success) = result {
                    oracle.commit(success.commit);
                    let _ = history.root().borrow_mut().define(&widened, success.tree);
                }
                // A failure here means a knot tied optimistically during
                // exploration never panned out; the entry is left
                // rhs-less and `prune_to_fixpoint` will drop it along
                // with anything that only referenced it.
            }
        }
    }

    /// Computes the set of dictionary symbols transitively reachable from
    /// `top`, following identifiers into each reached entry's own rhs,
    /// and returns the live entries (symbol, rhs) in that reachable set.
    /// Entries without a resolved rhs are never live.
    fn prune_to_fixpoint<O: Oracle>(
        oracle: &O,
        history: &SearchHistory<O::Type, O::Tree>,
        top: &O::Tree,
    ) -> Vec<(Symbol, O::Tree)> {
        let root = history.root().borrow();
        let mut by_symbol: HashMap<Symbol, O::Tree> = HashMap::new();
        for (_, reference, rhs) in root.entries() {
            if let Some(rhs) = rhs {
                by_symbol.insert(reference.term_ref().symbol, (*rhs).clone());
            }
        }
        drop(root);

        let mut live = HashSet::new();
        let mut frontier: Vec<Symbol> = oracle
            .identifiers_of(top)
            .into_iter()
            .filter(|s| by_symbol.contains_key(s))
            .collect();

        while let Some(sym) = frontier.pop() {
            if !live.insert(sym) {
                continue;
            }
            if let Some(rhs) = by_symbol.get(&sym) {
                for next in oracle.identifiers_of(rhs) {
                    if by_symbol.contains_key(&next) && !live.contains(&next) {
                        frontier.push(next);
                    }
                }
            }
        }

        by_symbol
            .into_iter()
            .filter(|(sym, _)| live.contains(sym))
            .collect()
    }
}
