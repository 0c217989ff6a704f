//! Search history, divergence detection, and the by-name implicit
//! dictionary (spec §4.5).
//!
//! Grounded on `chalk-engine`: that crate's `SearchGraph` tracked
//! in-progress goals to detect and resolve cycles in logic-program
//! solving, and its `fallible` module gave every solving step a uniform
//! "did this produce an answer" result type. Neither chalk concept solves
//! quite the same problem here -- divergence here is a covering-set/
//! type-size heuristic, not an SCC computation over depth-first numbers --
//! but the shape (a stack of active attempts, a uniform no-answer marker)
//! carries over directly.

pub mod fallible;
pub mod history;

pub use fallible::{Fallible, NoSolution};
pub use history::{SearchHistory, SearchRoot};
