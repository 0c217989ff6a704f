//! The `Oracle` trait: everything the engine needs from its host type
//! checker, and nothing more.
//!
//! This plays the role `chalk_solve::RustIrDatabase` plays for chalk: the
//! solver (here, the resolution engine) is generic over an implementation
//! of this trait and never reaches into the host compiler's own data
//! structures. A production frontend implements `Oracle` once over its
//! real type representation; `givens-integration::FixtureOracle` is a
//! small in-memory implementation used by tests and the CLI.

use std::fmt::Debug;
use std::hash::Hash;

use crate::symbol::Symbol;

/// A structural classification of a type, used by `CandidateFilter` to
/// decide how (if at all) a reference could satisfy a prototype.
///
/// This is the Rust encoding of the case analysis in spec §4.4
/// (`candidateKind`): rather than a battery of `is_method_type`,
/// `is_poly_type`, ... boolean queries, the oracle peels one layer off a
/// type and hands back a tag the filter can match on directly.
#[derive(Debug)]
pub enum TypeShape<T> {
    /// A method type `(p_1, ..., p_n) => result`. `implicit` is true for
    /// `implicit def`/`using`-style methods. Corresponds to dotc's
    /// `MethodType`.
    Method {
        implicit: bool,
        params: Vec<T>,
        result: T,
    },
    /// `[T_1, ..., T_n] => result`, a polymorphic (type-parameterized)
    /// method. Corresponds to dotc's `PolyType`.
    Poly { result: T },
    /// An ordinary function type `T => U` (as opposed to a method).
    Function { param: T, result: T },
    /// A bare reference whose own type is not yet decomposed further
    /// here (overloaded term references fall in this bucket, per spec
    /// §4.4: "a bare `TermRef`: Conversion|Extension (overloaded; cannot
    /// discard)").
    TermRef(Symbol),
    /// Anything else: a value type, a class type, etc.
    Other,
}

/// Everything the resolution engine needs from the surrounding type
/// checker. One associated `Type` per host frontend; handles are expected
/// to be cheap, `Eq`/`Hash`-comparable, and *interned*, i.e. two handles
/// compare equal exactly when the underlying types are type-equivalent
/// (spec §9: "arena + indices" for type handles). `Symbol` and prefixes are
/// owned by this crate (`crate::symbol`) since term-reference identity is
/// part of the engine's own data model, not the host's.
pub trait Oracle {
    /// Opaque type handle. Must be cheap to clone and compare; equality is
    /// taken as type-equivalence throughout the engine.
    type Type: Clone + Eq + Hash + Debug;
    /// Opaque constructed-term handle (the result of resolution).
    type Tree: Clone + Debug;

    // -- Type operations (spec §3) -----------------------------------

    /// `T <: U`.
    fn is_subtype(&self, sub: &Self::Type, sup: &Self::Type) -> bool;

    /// Widen a singleton/literal type to its underlying type.
    fn widen(&self, ty: &Self::Type) -> Self::Type;

    /// Widen only singleton types appearing as method/poly parameters,
    /// used when adjusting a candidate for a view prototype (spec §4.4).
    fn widen_singleton(&self, ty: &Self::Type) -> Self::Type;

    /// Strip type aliases.
    fn dealias(&self, ty: &Self::Type) -> Self::Type;

    /// Normalize a type for the final compatibility comparison (spec
    /// §4.4: "a compatibility test normalizes both `pt` and ... `ref`").
    fn normalize(&self, ty: &Self::Type) -> Self::Type;

    /// Replace type variables/wildcards with their bounds so that two
    /// types with unresolved variables can still be compared
    /// structurally (spec §4.4, §4.5's divergence check).
    fn wildcard_approximate(&self, ty: &Self::Type) -> Self::Type;

    /// One layer of structural decomposition, used by `candidateKind`.
    fn shape(&self, ty: &Self::Type) -> TypeShape<Self::Type>;

    /// The structural parts of a type reachable for implicit-scope
    /// purposes: prefix, parents, and applied-type arguments (spec §4.2).
    fn structural_parts(&self, ty: &Self::Type) -> Vec<Self::Type>;

    /// Every class symbol structurally reachable from this type (spec
    /// §4.2's `liftToClasses`).
    fn class_symbols(&self, ty: &Self::Type) -> Vec<Symbol>;

    /// True for ordinary value types (as opposed to method/poly types),
    /// used by `candidateKind`'s final fallback case.
    fn is_value_type(&self, ty: &Self::Type) -> bool;

    /// True if `ty` is a by-name parameter type (`=> T`), i.e. one whose
    /// implicit argument should be resolved lazily and is eligible for
    /// knot-tying (spec §4.5, §4.6's recursive-by-name scenario).
    fn is_by_name_type(&self, ty: &Self::Type) -> bool;

    /// A view-prototype target resolves to an extension method on the
    /// widened receiver with the given name, if any (spec §4.4's
    /// Extension classification).
    fn resolve_extension_method(&self, receiver: &Self::Type, name: &str) -> Option<Symbol>;

    /// True if `ty` derives from the host's `Conversion` marker class.
    fn derives_from_conversion_class(&self, ty: &Self::Type) -> bool;

    /// True if `ty` derives from the host's subtype-witness class (e.g.
    /// `T <:< U`), excluding the identity-conforming instance itself.
    fn derives_from_subtype_witness(&self, ty: &Self::Type) -> bool;

    /// Legacy-mode-only: true if `ty` derives from a single-argument
    /// function type, used as a fallback Conversion classification.
    fn derives_from_single_arg_function(&self, ty: &Self::Type) -> bool;

    /// True if `ty` tags the synthesized `Not[_]` coherence prototype
    /// (spec §4.6's `negated`).
    fn is_not_prototype(&self, ty: &Self::Type) -> bool;

    /// True if `ty` is a coherence-tagged equality witness prototype
    /// (spec §4.6: "pt is coherence-tagged (equality witness)").
    fn is_coherence_tagged(&self, ty: &Self::Type) -> bool;

    /// Structural size, for divergence's type-size measure (spec §4.5).
    fn type_size(&self, ty: &Self::Type) -> u32;

    /// The set of named-type constructor symbols appearing anywhere in
    /// `ty`, for divergence's covering-set measure (spec §4.5).
    fn covering_set(&self, ty: &Self::Type) -> Vec<Symbol>;

    /// Whether `ty` is safe to memoize in the per-run implicit-scope
    /// cache: non-provisional and hash-stable (spec §4.2).
    fn is_cacheable(&self, ty: &Self::Type) -> bool;

    // -- Symbol / companion operations (spec §4.2, §6) ----------------

    /// True if `sym` names a class (as opposed to e.g. a type alias).
    fn is_class(&self, sym: Symbol) -> bool;

    /// True if `sym` names an opaque type alias.
    fn is_opaque_alias(&self, sym: Symbol) -> bool;

    /// The companion reference(s) of a class symbol.
    fn companions_of_class(&self, class: Symbol) -> Vec<Symbol>;

    /// The companion reference(s) of an opaque alias's own symbol.
    fn companions_of_opaque_alias(&self, alias: Symbol) -> Vec<Symbol>;

    /// The prefix type under which a companion reference should be used
    /// as a `TermRef`'s prefix (typically the companion's own singleton
    /// type, or a global/no-prefix type for top-level companions).
    fn companion_prefix(&self, companion: Symbol) -> Self::Type;

    /// The canonical type of a class symbol, used to recurse into a
    /// class's own structural parts (e.g. its parents) while computing
    /// an implicit scope.
    fn class_type(&self, class: Symbol) -> Self::Type;

    /// The parent class symbols of a class, for recursing into parents'
    /// scopes (spec §4.2).
    fn parents(&self, class: Symbol) -> Vec<Symbol>;

    /// The declared type of a symbol, not yet adjusted for any particular
    /// prefix (see [`Oracle::as_seen_from`]).
    fn type_of_symbol(&self, sym: Symbol) -> Self::Type;

    /// The symbol's own declared name, used as the default implicit name
    /// for shadowing when a reference was not reached through a renaming
    /// import (spec §4.3).
    fn name_of(&self, sym: Symbol) -> String;

    /// The prefix type of a named type, if any (e.g. `p` in `p.T`).
    fn prefix_of(&self, ty: &Self::Type) -> Option<Self::Type>;

    /// The symbol a named type resolves to, if any.
    fn symbol_of(&self, ty: &Self::Type) -> Option<Symbol>;

    /// `symbol` is accessible starting from `prefix`.
    fn accessible(&self, symbol: Symbol, prefix: &Self::Type) -> bool;

    /// Re-express `ty` as seen from `prefix` (substituting the defining
    /// class's own type parameters by the ones visible at `prefix`).
    fn as_seen_from(&self, ty: &Self::Type, prefix: &Self::Type) -> Self::Type;

    /// Deterministic structural comparator combining nesting level, owner
    /// relation, and arity (spec §2.1, used throughout §4.6).
    /// Returns `Less`/`Equal`/`Greater` in place of spec's `{-1,0,+1}`.
    fn compare(
        &self,
        a: Symbol,
        b: Symbol,
        level_a: u32,
        level_b: u32,
    ) -> std::cmp::Ordering;

    /// A fresh symbol owned by `owner`, used by `DictionaryBuilder` to
    /// allocate the synthetic class, its fields, and the instance val.
    fn fresh_symbol(&mut self, owner: Symbol, name: &str) -> Symbol;

    /// The parents `DictionaryBuilder` gives the synthetic class it
    /// generates for a completed by-name dictionary: the host's object
    /// root and serializability marker, so the generated class is a
    /// well-formed top-level class like any other (spec §4.7).
    fn dictionary_class_parents(&mut self) -> Vec<Symbol>;

    // -- Tree construction (spec §6) -----------------------------------

    fn tree_ident(&self, sym: Symbol) -> Self::Tree;
    fn tree_select(&self, base: Self::Tree, member: Symbol) -> Self::Tree;
    fn tree_apply(&self, func: Self::Tree, args: Vec<Self::Tree>) -> Self::Tree;
    fn tree_new(&self, class: Symbol) -> Self::Tree;
    fn tree_block(&self, stmts: Vec<Self::Tree>, result: Self::Tree) -> Self::Tree;
    fn tree_val_def(&self, sym: Symbol, rhs: Self::Tree) -> Self::Tree;
    fn tree_class_def(
        &self,
        sym: Symbol,
        parents: Vec<Symbol>,
        fields: Vec<Self::Tree>,
    ) -> Self::Tree;

    /// The type of a constructed tree, used to check `tree.type <: pt`.
    fn tree_type(&self, tree: &Self::Tree) -> Self::Type;

    /// Every `Ident` appearing (transitively) inside `tree`, used by
    /// `DictionaryBuilder`'s prune-to-fixpoint pass.
    fn identifiers_of(&self, tree: &Self::Tree) -> Vec<Symbol>;

    /// Rewrite every `Ident(sym)` in `tree` per `subst`, leaving anything
    /// not mentioned in `subst` untouched.
    fn substitute_idents(
        &self,
        tree: &Self::Tree,
        subst: &std::collections::HashMap<Symbol, Self::Tree>,
    ) -> Self::Tree;

    /// A disposable, explorative type-checker state produced by a trial.
    /// Dropping one without passing it to `commit` is a rollback -- per
    /// spec §5 and §9 ("Coroutine-like 'explore, rollback' → scoped
    /// nested typer state"), every nested type-check acquires a fresh
    /// state scoped to that trial, and only the chosen `Success`'s state
    /// is ever committed.
    type Commit: Clone + std::fmt::Debug;

    /// Type-check and adapt `tree` to `pt` under a fresh, disposable
    /// type-checker state. `Err` means the candidate did not type-check
    /// (spec §4.6's `Mismatched`); the returned `Commit` is *not* yet
    /// applied to persistent state -- the caller must call
    /// [`Oracle::commit`] once it has chosen a unique `Success`, and must
    /// otherwise simply drop it.
    fn try_adapt(
        &mut self,
        tree: Self::Tree,
        pt: &Self::Type,
    ) -> Result<(Self::Tree, Self::Commit), AdaptError>;

    /// Build `ref.name(argument)` for an extension-method trial.
    fn try_extension_apply(
        &mut self,
        receiver: Self::Tree,
        name: &str,
        argument: Self::Tree,
    ) -> Result<(Self::Tree, Self::Commit), AdaptError>;

    /// Build `ref(argument)` for a conversion trial.
    fn try_conversion_apply(
        &mut self,
        conversion: Self::Tree,
        argument: Self::Tree,
    ) -> Result<(Self::Tree, Self::Commit), AdaptError>;

    /// Apply a previously-returned `Commit` to persistent type-checker
    /// state. Called exactly once per top-level `infer`, for the single
    /// trial whose `Success` was ultimately chosen.
    fn commit(&mut self, commit: Self::Commit);

    /// A no-op commit for a `Success` synthesized without ever calling
    /// `try_adapt` -- knot-tied recursive references and synthesized
    /// `Not[_]` witnesses never type-check anything, so they have nothing
    /// to commit.
    fn trivial_commit(&self) -> Self::Commit;

    /// Type-check a bare name at the current use site and report the
    /// symbol it resolves to (and whether that symbol shares a
    /// type-owner with `expected`), for the shadowing probe of spec
    /// §4.6 (`tryImplicit`).
    fn probe_bare_name(&mut self, name: &str, expected: Symbol) -> ShadowProbe;
}

/// Outcome of `Oracle::try_adapt`/`try_*_apply`: a type-check failure, with
/// no payload beyond "it failed" -- the engine itself only needs to know
/// whether a trial succeeded, matching chalk's `NoSolution` marker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptError;

/// Result of probing a bare name for the contextual shadowing check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowProbe {
    /// The name resolves to the same symbol, or to a different symbol
    /// that shares a type-owner with it: no shadowing.
    SameOrCompatible,
    /// The name resolves to an unrelated symbol: the candidate is
    /// shadowed by it.
    ShadowedBy(Symbol),
}
