//! Phase-indexed rule storage.
//!
//! [`PhaseRuleContainer`] is the structural backbone of rule evaluation: one
//! insertion-ordered bucket per evaluation phase. It is populated while a
//! configuration fragment is parsed, combined with other fragments through
//! [`PhaseRuleContainer::append`], and then treated as read-only for the rest
//! of its life, because request-processing threads iterate it concurrently without
//! locking, so no mutation may happen once evaluation starts.

use std::fmt::Write as _;

use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::rules::{Phase, SharedRule, NUMBER_OF_PHASES};

/// One phase's rules, in insertion order.
///
/// Evaluation order within a phase is insertion order, never rule-id order.
#[derive(Debug, Default, Clone)]
pub struct RuleList {
    rules: Vec<SharedRule>,
}

impl RuleList {
    /// Append a rule after all existing entries.
    pub fn insert(&mut self, rule: SharedRule) {
        self.rules.push(rule);
    }

    /// Merge `from` into this list, rejecting any rule whose operator id is
    /// already present in `known_ids`.
    ///
    /// `known_ids` must be sorted; it is the snapshot of every operator id in
    /// the destination container, taken before the merge started, so a
    /// collision anywhere in the destination fails the merge here no matter
    /// which phase the existing rule lives in. Rules without an operator id
    /// are exempt. Returns the number of rules appended.
    pub fn append(&mut self, from: &RuleList, known_ids: &[i64]) -> Result<usize> {
        for rule in &from.rules {
            if let Some(id) = rule.operator_id() {
                if known_ids.binary_search(&id).is_ok() {
                    return Err(EngineError::DuplicateRuleId(id));
                }
            }
        }
        self.rules.extend(from.rules.iter().cloned());
        Ok(from.rules.len())
    }

    /// Number of rules in this list.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in evaluation order.
    pub fn iter(&self) -> std::slice::Iter<'_, SharedRule> {
        self.rules.iter()
    }

    fn dump_into(&self, out: &mut String) {
        for rule in &self.rules {
            let _ = writeln!(out, "  {rule:?}");
        }
    }
}

/// Rules bucketed by evaluation phase.
#[derive(Debug, Default, Clone)]
pub struct PhaseRuleContainer {
    phases: [RuleList; NUMBER_OF_PHASES],
}

impl PhaseRuleContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rule into the bucket its declared phase selects.
    ///
    /// Returns `false`, with no effect, when the rule declares a phase beyond
    /// the last evaluation stage. Duplicate ids are not checked here; only a
    /// cross-container merge enforces id uniqueness.
    pub fn insert(&mut self, rule: SharedRule) -> bool {
        let phase = rule.phase();
        if phase >= NUMBER_OF_PHASES {
            return false;
        }
        self.phases[phase].insert(rule);
        true
    }

    /// Merge every phase of `from` into this container.
    ///
    /// Before anything is moved, the ids of all operator-bearing rules across
    /// all phases of `self` are collected into one sorted list; each phase
    /// merge checks incoming ids against that snapshot, so rule ids are
    /// unique across the whole container, not per phase. The snapshot is not
    /// updated mid-call: rules arriving in this same call do not collide with
    /// each other, only with what was already here.
    ///
    /// Phases merge in order; the first collision aborts with
    /// [`EngineError::DuplicateRuleId`]. Phases merged before the failure are
    /// not rolled back. On success returns the total number of rules merged.
    pub fn append(&mut self, from: &PhaseRuleContainer) -> Result<usize> {
        let mut known_ids: Vec<i64> = Vec::new();
        for list in &self.phases {
            for rule in list.iter() {
                if let Some(id) = rule.operator_id() {
                    known_ids.push(id);
                }
            }
        }
        known_ids.sort_unstable();

        let mut merged = 0;
        for phase in 0..NUMBER_OF_PHASES {
            match self.phases[phase].append(&from.phases[phase], &known_ids) {
                Ok(count) => merged += count,
                Err(err) => {
                    warn!(phase, error = %err, "rule-set merge aborted");
                    return Err(err);
                }
            }
        }

        debug!(merged, "rule-set merge complete");
        Ok(merged)
    }

    /// The rule list for a phase index, when the index is in range.
    pub fn at(&self, phase: usize) -> Option<&RuleList> {
        self.phases.get(phase)
    }

    /// Total number of rules across all phases.
    pub fn rule_count(&self) -> usize {
        self.phases.iter().map(RuleList::len).sum()
    }

    /// Human-readable listing of every phase and its rules.
    ///
    /// Diagnostic output only; the format is unversioned and not meant to be
    /// parsed.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (index, list) in self.phases.iter().enumerate() {
            let name = Phase::from_index(index).map(Phase::name).unwrap_or("?");
            let _ = writeln!(out, "Phase: {index} [{name}] ({} rules)", list.len());
            list.dump_into(&mut out);
        }
        out
    }
}
