//! `SearchHistory` and `SearchRoot` (spec §4.5): the stack of in-progress
//! search frames, divergence detection, and the recursive by-name
//! implicit dictionary.
//!
//! Grounded on `chalk-recursive`'s `SearchGraph` -- a stack of in-progress
//! goals consulted to detect and resolve cycles -- generalized from its
//! depth-first-number bookkeeping to the covering-set/type-size predicate
//! this search actually uses.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use givens_ir::{ImplicitRef, Oracle, Symbol};

use crate::fallible::{Fallible, NoSolution};

struct Frame<T> {
    candidate: ImplicitRef<T>,
    pt: T,
    by_name: bool,
}

struct FrameNode<T> {
    frame: Frame<T>,
    outer: Option<Rc<FrameNode<T>>>,
}

/// A single entry in the by-name implicit dictionary: a stable reference,
/// allocated once, and a right-hand-side tree filled in once that
/// reference's own search completes (spec §5: "write-once for `ref` and
/// late-bound for `rhs`").
struct DictionaryEntry<T, Tree> {
    reference: ImplicitRef<T>,
    rhs: Option<Tree>,
}

/// Owns the implicit dictionary for one top-level inference. Shared by
/// reference across every nested `SearchHistory` spawned from the same
/// root (spec §3: "A SearchHistory exclusively owns its dictionary via
/// the root pointer; nested histories share it by reference").
pub struct SearchRoot<T, Tree> {
    dictionary: HashMap<T, DictionaryEntry<T, Tree>>,
}

impl<T: Clone + Eq + Hash, Tree> SearchRoot<T, Tree> {
    pub fn new() -> Self {
        SearchRoot {
            dictionary: HashMap::new(),
        }
    }

    /// `refBynameImplicit`: look up an existing dictionary entry, without
    /// allocating one.
    pub fn ref_byname_implicit(&self, widened: &T) -> Option<ImplicitRef<T>> {
        self.dictionary.get(widened).map(|entry| entry.reference.clone())
    }

    /// `linkBynameImplicit`: return the stable reference for `widened`,
    /// allocating `reference` as the entry if one didn't already exist.
    pub fn link_byname_implicit(&mut self, widened: T, reference: ImplicitRef<T>) -> ImplicitRef<T> {
        self.dictionary
            .entry(widened)
            .or_insert_with(|| DictionaryEntry {
                reference,
                rhs: None,
            })
            .reference
            .clone()
    }

    /// Fill in the right-hand side of a previously linked entry. Fails if
    /// the entry was never linked, or was already defined -- both are
    /// caller bugs, not conditions this search needs to recover from.
    pub fn define(&mut self, widened: &T, rhs: Tree) -> Fallible<()> {
        match self.dictionary.get_mut(widened) {
            Some(entry) if entry.rhs.is_none() => {
                entry.rhs = Some(rhs);
                Ok(())
            }
            _ => Err(NoSolution),
        }
    }

    /// Every linked entry, for `DictionaryBuilder`'s prune pass.
    pub fn entries(&self) -> impl Iterator<Item = (&T, &ImplicitRef<T>, Option<&Tree>)> {
        self.dictionary
            .iter()
            .map(|(ty, entry)| (ty, &entry.reference, entry.rhs.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }
}

impl<T: Clone + Eq + Hash, Tree> Default for SearchRoot<T, Tree> {
    fn default() -> Self {
        Self::new()
    }
}

/// A persistent (cheaply-cloned) stack of search frames plus a shared
/// pointer to the owning root's dictionary.
#[derive(Clone)]
pub struct SearchHistory<T, Tree> {
    top: Option<Rc<FrameNode<T>>>,
    root: Rc<RefCell<SearchRoot<T, Tree>>>,
}

impl<T: Clone + PartialEq + Eq + Hash, Tree> SearchHistory<T, Tree> {
    /// A fresh history for a new top-level `infer` call, owning a fresh,
    /// empty dictionary.
    pub fn new_root() -> Self {
        SearchHistory {
            top: None,
            root: Rc::new(RefCell::new(SearchRoot::new())),
        }
    }

    pub fn root(&self) -> &Rc<RefCell<SearchRoot<T, Tree>>> {
        &self.root
    }

    /// `nest(cand, pt)`: push a new frame, recording whether `pt` is a
    /// by-name prototype. Does not mutate `self` -- returns the extended
    /// history, sharing the same dictionary.
    pub fn nest(&self, candidate: ImplicitRef<T>, pt: T, by_name: bool) -> Self {
        SearchHistory {
            top: Some(Rc::new(FrameNode {
                frame: Frame {
                    candidate,
                    pt,
                    by_name,
                },
                outer: self.top.clone(),
            })),
            root: self.root.clone(),
        }
    }

    fn frames(&self) -> FrameIter<'_, T> {
        FrameIter {
            node: self.top.as_deref(),
        }
    }

    /// `checkDivergence` (spec §4.5). Scans frames newest-first for one
    /// carrying the same candidate reference; reports divergence unless a
    /// by-name frame in between allows the knot to be tied.
    pub fn check_divergence<O: Oracle<Type = T>>(
        &self,
        oracle: &O,
        candidate: &ImplicitRef<T>,
        pt: &T,
    ) -> bool {
        let pt_approx = oracle.wildcard_approximate(pt);
        let pt_size = oracle.type_size(pt);
        let pt_cover = oracle.covering_set(pt);

        let mut crossed_by_name = false;
        for frame in self.frames() {
            if &frame.candidate == candidate {
                if crossed_by_name {
                    let frame_approx = oracle.wildcard_approximate(&frame.pt);
                    if oracle.is_subtype(&pt_approx, &frame_approx) {
                        // The frame's type is a supertype: the knot can be
                        // tied instead of diverging.
                        return false;
                    }
                }
                let frame_approx = oracle.wildcard_approximate(&frame.pt);
                let frame_size = oracle.type_size(&frame.pt);
                let frame_cover = oracle.covering_set(&frame.pt);
                let grew_under_same_cover =
                    frame_size < pt_size && same_symbol_set(&frame_cover, &pt_cover);
                if grew_under_same_cover || frame_approx == pt_approx {
                    tracing::debug!(
                        frame_size,
                        pt_size,
                        "implicit search diverging against an earlier frame"
                    );
                    return true;
                }
                // Neither condition triggered for this frame: keep scanning.
            }
            if frame.by_name {
                crossed_by_name = true;
            }
        }
        false
    }

    /// `recursiveRef` (spec §4.5). Looks for an existing or tie-able
    /// dictionary entry for `pt`'s widened type before falling back to an
    /// ordinary candidate search. `alloc` builds a fresh reference (and
    /// the symbol that backs it) the first time a given widened type is
    /// tied; it is invoked at most once.
    pub fn recursive_ref<O: Oracle<Type = T>>(
        &self,
        oracle: &mut O,
        pt: &T,
        pt_is_by_name: bool,
        alloc: impl FnOnce(&mut O, &T) -> ImplicitRef<T>,
    ) -> Option<ImplicitRef<T>> {
        let widened_pt = oracle.widen(pt);
        if let Some(found) = self.root.borrow().ref_byname_implicit(&widened_pt) {
            return Some(found);
        }

        let any_by_name_active = pt_is_by_name || self.frames().any(|f| f.by_name);
        if !any_by_name_active {
            return None;
        }

        let mut crossed_by_name = false;
        for frame in self.frames() {
            if crossed_by_name {
                let widened_frame = oracle.widen(&frame.pt);
                if oracle.is_subtype(&widened_frame, &widened_pt) {
                    let reference = alloc(oracle, &widened_frame);
                    let linked = self
                        .root
                        .borrow_mut()
                        .link_byname_implicit(widened_frame, reference);
                    return Some(linked);
                }
            }
            if frame.by_name {
                crossed_by_name = true;
            }
        }
        None
    }
}

struct FrameIter<'a, T> {
    node: Option<&'a FrameNode<T>>,
}

impl<'a, T> Iterator for FrameIter<'a, T> {
    type Item = &'a Frame<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        self.node = node.outer.as_deref();
        Some(&node.frame)
    }
}

fn same_symbol_set(a: &[Symbol], b: &[Symbol]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|s| b.contains(s))
}
