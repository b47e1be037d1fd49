//! Error types for the SecRule engine core.
//!
//! Only conditions that make an object unusable are errors: a pattern that
//! does not compile, a phrase set that cannot be built, or a rule-set merge
//! that collides on a rule id. Match-time conditions are not errors; they
//! are reported through [`crate::matcher::MatchOutcome`] so that callers can
//! apply policy (fail closed, skip, retry) instead of unwinding.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The pattern was rejected by the regular-expression compiler.
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A rule id in the incoming rule set is already present somewhere in the
    /// destination set. Rule ids form one namespace across all phases.
    #[error("rule id {0} is duplicated; merge aborted")]
    DuplicateRuleId(i64),

    /// The phrase list could not be turned into a search automaton.
    #[error("invalid phrase set: {0}")]
    InvalidPhraseSet(String),
}
