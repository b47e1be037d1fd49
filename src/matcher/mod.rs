//! Pattern matching for rule operators.
//!
//! The matcher system separates compilation from evaluation:
//! - **Compilation**: a pattern is compiled once, at configuration-load
//!   time, together with an optional fast-execution artifact.
//! - **Evaluation**: match calls are read-only and allocate their own
//!   working state, so compiled matchers are shared freely across request
//!   threads. Match-scoped tuning (the backtracking budget) travels as a
//!   call parameter, never as matcher state.
//!
//! ## Core components
//!
//! - [`PatternMatcher`] - the regex wrapper with testing, single-match,
//!   global-scan, and legacy search modes
//! - [`PhraseSet`] - literal multi-phrase matching for set-based operators
//! - [`RegexBackend`] / [`PatternProgram`] - the seam to the backing
//!   regular-expression engine, with [`HybridBackend`] as the shipped
//!   implementation

pub mod backend;
pub mod pattern;
pub mod phrase;
pub mod types;

// Re-export main types for convenience
pub use backend::{
    CompileOptions, ExecOptions, ExecResult, ExecStatus, HybridBackend, PatternProgram,
    RegexBackend, UNSET_OFFSET,
};
pub use pattern::PatternMatcher;
pub use phrase::PhraseSet;
pub use types::{Capture, Match, MatchOutcome};
