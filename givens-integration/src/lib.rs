//! The in-memory reference `Oracle` implementation, its fixture-source
//! lowering, and the error/logging glue used by `givens-cli` and
//! `givens-tests`. Never pulled in by `givens-recursive` itself -- a real
//! frontend implements `Oracle` over its own types and never touches this
//! crate.

pub mod db;
pub mod error;
pub mod logging;
pub mod lowering;

pub use db::{Commit, FixtureOracle, SymbolKind, Ty, TreeData};
pub use error::{LoweringError, SearchError};
pub use logging::init_tracing;
pub use lowering::lower;
