//! Evaluation phases and the rule seam.
//!
//! Rules themselves live in the surrounding configuration layer; this core
//! only ever sees them through the [`Rule`] trait: an evaluation phase and,
//! for rules that carry a pattern-matching operator, a numeric id used for
//! duplicate detection during rule-set merges. Everything else about a rule
//! (operators, transformations, actions) is opaque here.

use std::fmt;
use std::sync::Arc;

/// Number of ordered evaluation phases a transaction walks through.
pub const NUMBER_OF_PHASES: usize = 7;

/// The ordered evaluation stages of a transaction.
///
/// Rules execute in phase order, and in insertion order within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connection = 0,
    Uri = 1,
    RequestHeaders = 2,
    RequestBody = 3,
    ResponseHeaders = 4,
    ResponseBody = 5,
    Logging = 6,
}

impl Phase {
    /// Phase for a raw index, if the index is in range.
    pub fn from_index(index: usize) -> Option<Phase> {
        match index {
            0 => Some(Phase::Connection),
            1 => Some(Phase::Uri),
            2 => Some(Phase::RequestHeaders),
            3 => Some(Phase::RequestBody),
            4 => Some(Phase::ResponseHeaders),
            5 => Some(Phase::ResponseBody),
            6 => Some(Phase::Logging),
            _ => None,
        }
    }

    /// Bucket index of this phase.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable stage name, used by diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Connection => "connection",
            Phase::Uri => "uri",
            Phase::RequestHeaders => "request-headers",
            Phase::RequestBody => "request-body",
            Phase::ResponseHeaders => "response-headers",
            Phase::ResponseBody => "response-body",
            Phase::Logging => "logging",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Minimal contract a rule must satisfy to be held by the phase container.
///
/// `operator_id` is the capability query: operator-bearing rules (those whose
/// condition is a pattern match) return their unique id, action-only rules
/// return `None` and are exempt from duplicate detection.
pub trait Rule: fmt::Debug + Send + Sync {
    /// Evaluation phase this rule declares, as a raw bucket index.
    fn phase(&self) -> usize;

    /// Unique rule id when the rule carries a pattern-matching operator.
    fn operator_id(&self) -> Option<i64> {
        None
    }
}

/// Rules are shared between the container and the broader registry; the
/// container never takes exclusive ownership.
pub type SharedRule = Arc<dyn Rule>;
