//! End-to-end scenarios exercising the full search pipeline (contextual
//! lookup, companion scope, conversions, shadowing, divergence, and
//! by-name knot-tying) against [`givens_integration::FixtureOracle`].
//!
//! Grounded on `chalk-tests`' own split: a shared `test_util` module plus
//! one file per scenario family under `test/`.

#[cfg(test)]
mod test_util;

#[cfg(test)]
mod test {
    mod scenarios;
}
