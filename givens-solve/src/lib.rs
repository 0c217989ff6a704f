//! Candidate classification, implicit scope, and contextual implicits
//! (spec §4.2-§4.4): everything needed to turn a type and a lexical
//! context into a list of candidates a search can try.
//!
//! This plays the role `chalk_solve` plays for chalk, minus the actual
//! solving: chalk's clause-building and unification machinery solved a
//! different problem (resolving a logic goal against a clause database),
//! so none of it survives here. What does carry over is the shape --
//! a crate sitting between the bare data model (`givens-ir`) and the
//! search/ranking machinery (`givens-engine`, `givens-recursive`) that
//! consumes it.

pub mod contextual;
pub mod filter;
pub mod scope;

pub use contextual::ContextualImplicits;
pub use filter::{candidate_kind, filter_matching};
pub use scope::{OfTypeImplicits, ScopeCache};
