//! Ranking, disambiguation, and by-name dictionary synthesis (spec §4.6,
//! §5): the top layer that turns a sorted candidate list into a single
//! [`givens_ir::SearchResult`], and the post-pass that turns a completed
//! search's dictionary into real class/instance trees.
//!
//! Grounded on `chalk-solve::recursive::solve::SolveIteration`'s
//! iterate-and-combine loop over candidate solutions, and on
//! `chalk-solve::solve::slg::aggregate`'s answer-dictionary synthesis for
//! [`dictionary::DictionaryBuilder`].

pub mod dictionary;
pub mod infer;
pub mod rank;

pub use dictionary::DictionaryBuilder;
pub use infer::{all_implicits, infer_implicit, infer_view, view_exists};
pub use rank::{best_implicit, SearchCtx};

/// Tuning knobs for one top-level inference (spec §9's "explicit config
/// struct over scattered globals"). Constructed once per `infer_*` call
/// (or once per compilation run, and reused) rather than threaded as
/// individual booleans.
#[derive(Clone, Copy, Debug)]
pub struct SearchConfig {
    /// Dotty's `-source 3.0-migration` behavior: keep searching past an
    /// ambiguity instead of failing immediately, only reporting it if no
    /// later candidate succeeds outright (spec §4.6, Open Question 1).
    pub legacy_ambiguity_warnings: bool,
    /// Stop at the first success without running the full
    /// rank/disambiguate pass, used by `view_exists` (spec §6), which only
    /// needs a yes/no answer.
    pub explore_only: bool,
}

impl SearchConfig {
    pub const fn new() -> Self {
        SearchConfig {
            legacy_ambiguity_warnings: false,
            explore_only: false,
        }
    }

    pub const fn explore_only() -> Self {
        SearchConfig {
            legacy_ambiguity_warnings: false,
            explore_only: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::new()
    }
}
