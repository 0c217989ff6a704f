//! `ImplicitScope` (spec §4.2): the companion-derived set of references
//! reachable from a type's structural parts, memoized per run.

use std::collections::{HashMap, HashSet};

use givens_ir::{Candidate, Oracle, Prototype, Symbol, TermRef, TermRefSet};

use crate::filter;

/// A type's precomputed companion set, plus a lazily-computed and cached
/// `eligible` list keyed by the probed prototype (spec §3's
/// `OfTypeImplicits(T, companionRefs)`).
#[derive(Clone, Debug)]
pub struct OfTypeImplicits<T> {
    root: T,
    refs: TermRefSet<T>,
    eligible_cache: HashMap<ProtoKey<T>, Vec<Candidate<T>>>,
}

impl<T: Clone + PartialEq + Eq + std::hash::Hash> OfTypeImplicits<T> {
    pub fn root(&self) -> &T {
        &self.root
    }

    pub fn refs(&self) -> &TermRefSet<T> {
        &self.refs
    }

    /// `eligible(T) = filterMatching(refs, T)`, computed once per distinct
    /// prototype and cached thereafter (spec §4.2).
    pub fn eligible<O: Oracle<Type = T>>(
        &mut self,
        oracle: &O,
        pt: &Prototype<T>,
    ) -> &[Candidate<T>] {
        let key = ProtoKey::from(pt);
        self.eligible_cache
            .entry(key)
            .or_insert_with(|| filter::filter_matching(oracle, &self.refs, pt, 0))
    }
}

/// Prototypes aren't cheap to use directly as a `HashMap` key shape (views
/// nest a boxed prototype), so cache on a flattened key of just the types
/// actually compared against -- two prototypes with the same shape and the
/// same constituent types are the same cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum ProtoKey<T> {
    Value(T),
    View(T, Box<ProtoKey<T>>),
    Selection(String, T, bool),
}

impl<T: Clone> From<&Prototype<T>> for ProtoKey<T> {
    fn from(pt: &Prototype<T>) -> Self {
        match pt {
            Prototype::Value(t) => ProtoKey::Value(t.clone()),
            Prototype::View { arg_type, res_type } => {
                ProtoKey::View(arg_type.clone(), Box::new(ProtoKey::from(res_type.as_ref())))
            }
            Prototype::Selection {
                name,
                member_type,
                private_ok,
            } => ProtoKey::Selection(name.clone(), member_type.clone(), *private_ok),
        }
    }
}

/// Per-run cache of implicit scopes, keyed by root type, plus the
/// per-class companion-scope cache that backs it. A class's own companion
/// scope depends only on the class's identity and its parents -- never on
/// the applied-type arguments of whatever root type reached it -- so it is
/// memoized separately by [`Symbol`] and shared across every root that
/// structurally reaches that class.
pub struct ScopeCache<T> {
    by_root: HashMap<T, OfTypeImplicits<T>>,
    by_class: HashMap<Symbol, TermRefSet<T>>,
}

impl<T: Clone + PartialEq + Eq + std::hash::Hash + std::fmt::Debug> ScopeCache<T> {
    pub fn new() -> Self {
        ScopeCache {
            by_root: HashMap::new(),
            by_class: HashMap::new(),
        }
    }

    /// `implicitScope(rootT)` (spec §4.2). The root is always cached, even
    /// if computing it touched a cycle -- only per-class sub-results are
    /// withheld from their own cache when incomplete.
    pub fn implicit_scope<O: Oracle<Type = T>>(
        &mut self,
        oracle: &O,
        root: &T,
    ) -> &mut OfTypeImplicits<T> {
        if !self.by_root.contains_key(root) {
            tracing::debug!(?root, "implicit scope cache miss");
            let mut refs = TermRefSet::new();
            for class in Self::lift_to_classes(oracle, root) {
                let mut active = HashSet::new();
                let (scope, _incomplete) = self.companion_scope_of_class(oracle, class, &mut active);
                refs.union(&scope);
            }
            let of_type = OfTypeImplicits {
                root: root.clone(),
                refs,
                eligible_cache: HashMap::new(),
            };
            self.by_root.insert(root.clone(), of_type);
        }
        self.by_root.get_mut(root).expect("just inserted")
    }

    /// `liftToClasses` (spec §4.2): every class symbol reachable from
    /// `root`, recursing into applied-type arguments and other structural
    /// parts rather than only `root`'s own ancestor chain -- `List[Int]`'s
    /// implicit scope includes `Int`'s companion, not only `List`'s.
    fn lift_to_classes<O: Oracle<Type = T>>(oracle: &O, root: &T) -> HashSet<Symbol> {
        let mut seen_types = HashSet::new();
        let mut classes = HashSet::new();
        let mut frontier = vec![root.clone()];
        while let Some(ty) = frontier.pop() {
            if !seen_types.insert(ty.clone()) {
                continue;
            }
            classes.extend(oracle.class_symbols(&ty));
            frontier.extend(oracle.structural_parts(&ty));
        }
        classes
    }

    /// `collectCompanions`, restricted to the per-class recursion through
    /// parents: own companions, unioned with every parent's companion
    /// scope. `active` is the incompleteness set -- a class reached while
    /// it is still on the active path (an F-bounded or otherwise cyclic
    /// hierarchy) contributes nothing back and the whole traversal is
    /// marked incomplete, so the *outer* call does not cache it either.
    /// Returns the class's companion scope together with whether the
    /// traversal that produced it crossed a back-edge (in which case the
    /// caller must not cache it, and must itself propagate `incomplete`).
    fn companion_scope_of_class<O: Oracle<Type = T>>(
        &mut self,
        oracle: &O,
        class: Symbol,
        active: &mut HashSet<Symbol>,
    ) -> (TermRefSet<T>, bool) {
        if let Some(cached) = self.by_class.get(&class) {
            return (cached.clone(), false);
        }
        if active.contains(&class) {
            // Back-edge: this class's own scope is still being computed
            // further up the call stack. Contribute nothing here; every
            // caller between this point and that enclosing call is tainted
            // and must not cache its own result.
            return (TermRefSet::new(), true);
        }
        active.insert(class);

        let mut refs = TermRefSet::new();
        let mut incomplete = false;
        if oracle.is_opaque_alias(class) {
            for companion in oracle.companions_of_opaque_alias(class) {
                refs.insert(TermRef::new(companion, oracle.companion_prefix(companion)));
            }
        } else {
            for companion in oracle.companions_of_class(class) {
                refs.insert(TermRef::new(companion, oracle.companion_prefix(companion)));
            }
            for parent in oracle.parents(class) {
                let (parent_scope, parent_incomplete) =
                    self.companion_scope_of_class(oracle, parent, active);
                refs.union(&parent_scope);
                incomplete |= parent_incomplete;
            }
        }

        active.remove(&class);
        if !incomplete {
            self.by_class.insert(class, refs.clone());
        }
        (refs, incomplete)
    }
}

impl<T: Clone + PartialEq + Eq + std::hash::Hash + std::fmt::Debug> Default for ScopeCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
