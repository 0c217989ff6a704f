//! `ContextualImplicits` (spec §4.3): the cons-linked chain of lexically
//! bound implicit references, innermost first.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use givens_ir::{Candidate, ImplicitRef, Oracle, Prototype, TermRefSet};

use crate::filter;

/// Name used to recognize the synthetic chain link that carries the
/// per-search by-name implicit dictionary reference (spec §4.3's "the
/// head's name is not a lazy-implicit-dictionary name"). No ordinary
/// source-level implicit can declare this name.
pub const DICTIONARY_LINK_NAME: &str = "$dictionary";

struct Node<T> {
    refs: TermRefSet<T>,
    outer: Option<ContextualImplicits<T>>,
    level: u32,
    head_name: Option<String>,
    eligible_cache: RefCell<HashMap<CacheKey<T>, Vec<Candidate<T>>>>,
}

/// A cons-linked chain of implicit reference lists (spec §3). Cloning is
/// cheap -- it shares the chain via `Rc`, matching the "list-indexed
/// lookup" the spec describes rather than a deep tree.
#[derive(Clone)]
pub struct ContextualImplicits<T> {
    node: Rc<Node<T>>,
}

/// `owner`/`scope` identity used for the level rule (spec §4.3): a new
/// link starts a fresh level unless it is physically the same owner and
/// scope as its outer link.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerScope(pub u64, pub u64);

impl<T: Clone + PartialEq + Eq + std::hash::Hash> ContextualImplicits<T> {
    /// The outermost link in a chain: level 1, no outer.
    pub fn root(refs: TermRefSet<T>) -> Self {
        ContextualImplicits {
            node: Rc::new(Node {
                refs,
                outer: None,
                level: 1,
                head_name: None,
                eligible_cache: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Extend the chain with a new innermost link. `head_name`, when
    /// `Some`, identifies the link's own implicit (used to recognize the
    /// dictionary link for the level rule). `same_owner_scope` tells
    /// whether this link's owner/scope are physically identical to
    /// `self`'s -- the caller determines that, since only the host
    /// compiler knows what "the same lexical scope" means.
    pub fn push(&self, refs: TermRefSet<T>, head_name: Option<String>, same_owner_scope: bool) -> Self {
        let is_dictionary_link = head_name.as_deref() == Some(DICTIONARY_LINK_NAME);
        let level = if same_owner_scope && !is_dictionary_link {
            self.node.level
        } else {
            self.node.level + 1
        };
        ContextualImplicits {
            node: Rc::new(Node {
                refs,
                outer: Some(self.clone()),
                level,
                head_name,
                eligible_cache: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn level(&self) -> u32 {
        self.node.level
    }

    pub fn is_outermost(&self) -> bool {
        self.node.outer.is_none()
    }

    pub fn refs(&self) -> &TermRefSet<T> {
        &self.node.refs
    }

    /// `exclude(rootSym)`: drop any own reference whose symbol equals
    /// `root_sym`, used to suppress a wildcard re-import of the same name
    /// as the root.
    pub fn exclude(&self, root_sym: givens_ir::Symbol) -> Self {
        let mut trimmed = TermRefSet::new();
        self.node.refs.for_each(|r| {
            if r.symbol != root_sym {
                trimmed.insert(r.clone());
            }
        });
        ContextualImplicits {
            node: Rc::new(Node {
                refs: trimmed,
                outer: self.node.outer.clone(),
                level: self.node.level,
                head_name: self.node.head_name.clone(),
                eligible_cache: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// `eligible(T)` (spec §4.3): own matches, plus the outer chain's
    /// matches filtered to exclude anything whose implicit name collides
    /// with one of our own. Memoized per distinct prototype per link.
    pub fn eligible<O: Oracle<Type = T>>(&self, oracle: &O, pt: &Prototype<T>) -> Vec<Candidate<T>> {
        let key = CacheKey::from(pt);
        if let Some(hit) = self.node.eligible_cache.borrow().get(&key) {
            return hit.clone();
        }
        let own = filter::filter_matching(oracle, &self.node.refs, pt, self.node.level);

        let result = if let Some(outer) = &self.node.outer {
            let mut own_names: std::collections::HashSet<String> =
                std::collections::HashSet::new();
            for c in &own {
                own_names.insert(implicit_name(oracle, &c.reference));
            }
            let mut merged = own;
            for c in outer.eligible(oracle, pt) {
                if !own_names.contains(&implicit_name(oracle, &c.reference)) {
                    merged.push(c);
                }
            }
            merged
        } else {
            own
        };

        self.node
            .eligible_cache
            .borrow_mut()
            .insert(key, result.clone());
        result
    }
}

fn implicit_name<O: Oracle>(oracle: &O, reference: &ImplicitRef<O::Type>) -> String {
    match reference {
        ImplicitRef::Renamed { alias, .. } => alias.clone(),
        ImplicitRef::Plain(term_ref) => oracle.name_of(term_ref.symbol),
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum CacheKey<T> {
    Value(T),
    View(T, Box<CacheKey<T>>),
    Selection(String, T, bool),
}

impl<T: Clone> From<&Prototype<T>> for CacheKey<T> {
    fn from(pt: &Prototype<T>) -> Self {
        match pt {
            Prototype::Value(t) => CacheKey::Value(t.clone()),
            Prototype::View { arg_type, res_type } => {
                CacheKey::View(arg_type.clone(), Box::new(CacheKey::from(res_type.as_ref())))
            }
            Prototype::Selection {
                name,
                member_type,
                private_ok,
            } => CacheKey::Selection(name.clone(), member_type.clone(), *private_ok),
        }
    }
}
