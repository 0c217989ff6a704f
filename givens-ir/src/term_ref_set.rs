//! `TermRefSet`: a set of term references deduplicated by semantic
//! equality of the `(prefix, symbol)` pair (spec §4.1).

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::symbol::{Symbol, TermRef};

/// Maps each symbol to the list of distinct prefixes it was seen with.
/// Most symbols are reached through exactly one prefix, hence the
/// `SmallVec` inline capacity of 1.
///
/// Iteration order is insertion-stable (symbols in first-seen order, each
/// symbol's prefixes in first-seen order) purely so that diagnostics
/// built from `for_each` are reproducible across runs -- the spec makes
/// no other ordering guarantee.
#[derive(Clone, Debug, Default)]
pub struct TermRefSet<T> {
    by_symbol: IndexMap<Symbol, SmallVec<[T; 1]>>,
}

impl<T: Clone + PartialEq> TermRefSet<T> {
    pub fn new() -> Self {
        TermRefSet {
            by_symbol: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_symbol.values().map(|prefixes| prefixes.len()).sum()
    }

    /// Insert `ref_`, deduplicating against any prefix already recorded
    /// for the same symbol.
    pub fn insert(&mut self, ref_: TermRef<T>) {
        let prefixes = self.by_symbol.entry(ref_.symbol).or_default();
        if !prefixes.contains(&ref_.prefix) {
            prefixes.push(ref_.prefix);
        }
    }

    pub fn union(&mut self, other: &TermRefSet<T>) {
        for (&symbol, prefixes) in &other.by_symbol {
            for prefix in prefixes {
                self.insert(TermRef::new(symbol, prefix.clone()));
            }
        }
    }

    pub fn for_each(&self, mut f: impl FnMut(&TermRef<T>)) {
        for (&symbol, prefixes) in &self.by_symbol {
            for prefix in prefixes {
                let term_ref = TermRef::new(symbol, prefix.clone());
                f(&term_ref);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = TermRef<T>> + '_ {
        self.by_symbol.iter().flat_map(|(&symbol, prefixes)| {
            prefixes.iter().map(move |prefix| TermRef::new(symbol, prefix.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_equal_prefixes() {
        let mut set = TermRefSet::new();
        set.insert(TermRef::new(Symbol::new(1), "A"));
        set.insert(TermRef::new(Symbol::new(1), "A"));
        set.insert(TermRef::new(Symbol::new(1), "B"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn union_merges_and_dedups() {
        let mut a = TermRefSet::new();
        a.insert(TermRef::new(Symbol::new(1), "A"));
        let mut b = TermRefSet::new();
        b.insert(TermRef::new(Symbol::new(1), "A"));
        b.insert(TermRef::new(Symbol::new(2), "B"));
        a.union(&b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn iteration_is_insertion_stable() {
        let mut set = TermRefSet::new();
        set.insert(TermRef::new(Symbol::new(3), "x"));
        set.insert(TermRef::new(Symbol::new(1), "y"));
        set.insert(TermRef::new(Symbol::new(2), "z"));
        let order: Vec<_> = set.iter().map(|r| r.symbol.index()).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }
}
