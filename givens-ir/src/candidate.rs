//! `ImplicitRef`, `KindMask`, and `Candidate` (spec §3).

use bitflags::bitflags;

use crate::symbol::TermRef;

/// A reference to an implicit, either as originally declared or as
/// brought into scope under a renaming import (`import foo.{bar => baz}`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImplicitRef<T> {
    Plain(TermRef<T>),
    Renamed { term: TermRef<T>, alias: String },
}

impl<T> ImplicitRef<T> {
    pub fn term_ref(&self) -> &TermRef<T> {
        match self {
            ImplicitRef::Plain(t) => t,
            ImplicitRef::Renamed { term, .. } => term,
        }
    }

    pub fn into_term_ref(self) -> TermRef<T> {
        match self {
            ImplicitRef::Plain(t) => t,
            ImplicitRef::Renamed { term, .. } => term,
        }
    }

    /// The name shadowing compares by: the alias for a renamed reference,
    /// the caller-supplied declared name otherwise. Declared names are
    /// looked up through `Oracle::name_of`, which this type does not have
    /// access to, so callers pass it in explicitly (see
    /// `givens-solve::contextual`).
    pub fn implicit_name<'a>(&'a self, declared_name: &'a str) -> &'a str {
        match self {
            ImplicitRef::Plain(_) => declared_name,
            ImplicitRef::Renamed { alias, .. } => alias,
        }
    }
}

bitflags! {
    /// A non-empty bit-set classification of how a reference may satisfy
    /// a prototype (spec §3, §9 "Dynamic dispatch over candidate kinds →
    /// bitmask"). A `None` classification in spec terms is simply the
    /// absence of a `Candidate` -- there is no `KindMask::NONE` variant
    /// that's ever attached to one.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct KindMask: u8 {
        const VALUE      = 0b001;
        const CONVERSION = 0b010;
        const EXTENSION  = 0b100;
    }
}

/// A candidate implicit reference for a particular search: a reference,
/// the ways it could match (never empty), and the contextual nesting
/// level it was found at (0 for candidates synthesized by knot-tying;
/// see spec §4.6 item 1).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Candidate<T> {
    pub reference: ImplicitRef<T>,
    pub kind: KindMask,
    pub level: u32,
}

impl<T> Candidate<T> {
    /// Builds a candidate, panicking if `kind` is empty -- per spec §3,
    /// "a None classification never yields a Candidate", so an empty mask
    /// reaching this constructor is a bug in the caller (`CandidateFilter`),
    /// not a value this type needs to represent.
    pub fn new(reference: ImplicitRef<T>, kind: KindMask, level: u32) -> Self {
        assert!(!kind.is_empty(), "a Candidate must have a non-empty KindMask");
        Candidate {
            reference,
            kind,
            level,
        }
    }
}
