//! `SearchResult` and `SearchFailureType` (spec §3, §7): the tagged sums a
//! search returns in place of throwing.

use crate::candidate::ImplicitRef;

/// The outcome of a single implicit search. Never thrown, always a value
/// (spec §7: "Taxonomy ... all are values, not thrown").
#[derive(Clone, Debug)]
pub enum SearchResult<T, Tree, C> {
    Success(Success<T, Tree, C>),
    Failure(SearchFailureType<T, Tree>),
}

impl<T, Tree, C> SearchResult<T, Tree, C> {
    pub fn is_success(&self) -> bool {
        matches!(self, SearchResult::Success(_))
    }

    pub fn as_success(&self) -> Option<&Success<T, Tree, C>> {
        match self {
            SearchResult::Success(s) => Some(s),
            SearchResult::Failure(_) => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, SearchResult::Failure(SearchFailureType::Ambiguous(..)))
    }

    pub fn is_diverging(&self) -> bool {
        matches!(self, SearchResult::Failure(SearchFailureType::Diverging(..)))
    }

    pub fn is_shadowed(&self) -> bool {
        matches!(self, SearchResult::Failure(SearchFailureType::Shadowed { .. }))
    }
}

/// A successful resolution: `tree.type <: pt` is guaranteed to hold once
/// `commit` has been applied via [`crate::Oracle::commit`].
#[derive(Clone, Debug)]
pub struct Success<T, Tree, C> {
    pub tree: Tree,
    pub reference: ImplicitRef<T>,
    pub level: u32,
    pub commit: C,
}

impl<T, Tree, C> Success<T, Tree, C> {
    /// Drop the commit token, keeping only what a diagnostic (or a
    /// `compare` call) needs. Used when packaging an `Ambiguous` failure,
    /// since neither alternative's trial is ever actually committed.
    pub fn erase_commit(self) -> Success<T, Tree, ()> {
        Success {
            tree: self.tree,
            reference: self.reference,
            level: self.level,
            commit: (),
        }
    }
}

/// The five ways a search can fail to produce a usable term (spec §3,
/// §7). Each carries enough payload to build a diagnostic, even though
/// the wording of that diagnostic is explicitly out of scope (spec §1's
/// non-goals).
#[derive(Clone, Debug)]
pub enum SearchFailureType<T, Tree> {
    /// No candidate classified or type-checked at all.
    NoMatching,
    /// Exactly one candidate type-checked as a reference but failed to
    /// adapt to the expected type.
    Mismatched(ImplicitRef<T>),
    /// A candidate that would otherwise have succeeded is shadowed by a
    /// non-implicit binding of the same name at the use site.
    Shadowed {
        candidate: ImplicitRef<T>,
        shadowing: crate::symbol::Symbol,
    },
    /// Two candidates are equally preferred; `compare` could not break
    /// the tie.
    Ambiguous(Box<Success<T, Tree, ()>>, Box<Success<T, Tree, ()>>),
    /// A candidate was excluded because continuing its search would not
    /// terminate (spec §4.5).
    Diverging(ImplicitRef<T>),
}

impl<T, Tree> SearchFailureType<T, Tree> {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, SearchFailureType::Ambiguous(..))
    }
}
