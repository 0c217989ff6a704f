//! A marker "no useful answer" error and the `Result` alias built on it,
//! mirroring chalk's own `fallible` module: callers never need to inspect
//! *why* an operation didn't produce a value, only that it didn't.

/// No useful answer was produced. Carries no payload -- like chalk's own
/// `NoSolution`, the diagnosable detail lives in the caller's own
/// `SearchFailureType`, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoSolution;

pub type Fallible<T> = Result<T, NoSolution>;
