//! Core data model for the implicit resolution engine.
//!
//! This crate defines the vocabulary every other `givens-*` crate builds
//! on: the [`Oracle`] trait through which the engine talks to its host
//! type checker, and the small set of value types (`Symbol`, `TermRef`,
//! `Candidate`, `SearchResult`, ...) that flow between the scope-collection,
//! filtering, history, and ranking stages.
//!
//! Nothing in this crate performs a search. It only describes the shapes
//! that searches are made of.

pub mod candidate;
pub mod oracle;
pub mod proto;
pub mod result;
pub mod symbol;
pub mod term_ref_set;

pub use candidate::{Candidate, ImplicitRef, KindMask};
pub use oracle::{AdaptError, Oracle, ShadowProbe, TypeShape};
pub use proto::Prototype;
pub use result::{SearchFailureType, SearchResult, Success};
pub use symbol::{Prefix, Symbol, TermRef};
pub use term_ref_set::TermRefSet;
