//! # SecRule Engine Core
//!
//! The two load-bearing pieces of a web-application-firewall rule engine:
//! a phase-indexed rule container with validated cross-fragment merging, and
//! a pattern-matching engine with production matching semantics: global
//! scans that survive zero-length matches, a per-call backtracking budget
//! against adversarial input, capture extraction, and a fast-path/baseline
//! execution strategy.
//!
//! ## Quick Start
//!
//! ### Pattern matching
//!
//! ```rust,ignore
//! use secrule_engine::{MatchOutcome, PatternMatcher};
//!
//! let matcher = PatternMatcher::new(r"(?:union\s+select)", true)?;
//!
//! // Hot-path boolean check
//! assert!(matcher.test("1 UNION SELECT password FROM users"));
//!
//! // Capture extraction with a backtracking budget for this call only
//! let (outcome, captures) = matcher.search_one_match(body, 250_000);
//! if outcome == MatchOutcome::MatchLimitExceeded {
//!     // inconclusive: fail closed or skip, per policy
//! }
//! # Ok::<(), secrule_engine::EngineError>(())
//! ```
//!
//! ### Phase-ordered rules
//!
//! ```rust,ignore
//! use secrule_engine::PhaseRuleContainer;
//!
//! let mut rules = PhaseRuleContainer::new();
//! for rule in parsed_fragment {
//!     if !rules.insert(rule) {
//!         // rule declared a phase beyond the last stage
//!     }
//! }
//!
//! // Merge another configuration fragment; duplicate operator ids across
//! // the whole container abort the merge.
//! let merged = rules.append(&other_fragment)?;
//!
//! // From here on the container is read-only and shared across request
//! // threads; walk phases in order at evaluation time.
//! for phase in 0..secrule_engine::NUMBER_OF_PHASES {
//!     for rule in rules.at(phase).unwrap().iter() {
//!         // evaluate rule against the transaction
//!     }
//! }
//! # Ok::<(), secrule_engine::EngineError>(())
//! ```

pub mod error;
pub mod matcher;
pub mod phases;
pub mod rules;

// Core types and errors
pub use error::{EngineError, Result};

// Phase container
pub use phases::{PhaseRuleContainer, RuleList};
pub use rules::{Phase, Rule, SharedRule, NUMBER_OF_PHASES};

// Matcher system
pub use matcher::{
    Capture, HybridBackend, Match, MatchOutcome, PatternMatcher, PatternProgram, PhraseSet,
    RegexBackend,
};
