//! `std::error::Error`/`Display` glue over the engine's own
//! [`givens_ir::SearchFailureType`], plus [`LoweringError`] for malformed
//! fixture source. Grounded on the corpus's own preference for
//! `thiserror`-derived error enums over hand-rolled `Display` impls.

use givens_ir::{Oracle, SearchFailureType};
use thiserror::Error;

/// A parse/reference error while lowering fixture source (`lowering.rs`).
#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct LoweringError {
    line: usize,
    message: String,
}

impl LoweringError {
    pub fn syntax(expected: &str, line: usize) -> Self {
        LoweringError {
            line,
            message: format!("expected `{expected}`"),
        }
    }

    pub fn unknown(name: &str, line: usize) -> Self {
        LoweringError {
            line,
            message: format!("undeclared name `{name}`"),
        }
    }

    pub fn unknown_directive(directive: &str, line: usize) -> Self {
        LoweringError {
            line,
            message: format!("unknown directive `{directive}`"),
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

/// A display-friendly rendering of a failed search, for the CLI and for
/// tests asserting on failure shape without naming oracle-internal types.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no matching implicit found")]
    NoMatching,
    #[error("a candidate was found but did not type-check")]
    Mismatched,
    #[error("the best candidate is shadowed by a closer binding")]
    Shadowed,
    #[error("ambiguous implicits: more than one equally-good candidate")]
    Ambiguous,
    #[error("divergent implicit search (recursive expansion does not terminate)")]
    Diverging,
}

impl SearchError {
    pub fn from_failure<O: Oracle>(failure: &SearchFailureType<O::Type, O::Tree>) -> Self {
        match failure {
            SearchFailureType::NoMatching => SearchError::NoMatching,
            SearchFailureType::Mismatched(_) => SearchError::Mismatched,
            SearchFailureType::Shadowed { .. } => SearchError::Shadowed,
            SearchFailureType::Ambiguous(_, _) => SearchError::Ambiguous,
            SearchFailureType::Diverging(_) => SearchError::Diverging,
        }
    }
}
