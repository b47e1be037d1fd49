//! Literal multi-phrase matching for set-based rule operators.
//!
//! Rules that test a field against a list of literal phrases compile the
//! list into an Aho-Corasick automaton once and scan each subject in a
//! single pass. Matching is ASCII-case-insensitive, as the phrase operators
//! of WAF rule sets conventionally are.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

use crate::error::{EngineError, Result};
use crate::matcher::types::Match;

/// A compiled set of literal phrases.
#[derive(Debug, Clone)]
pub struct PhraseSet {
    automaton: AhoCorasick,
    phrases: Vec<String>,
}

impl PhraseSet {
    /// Compile a phrase set. Fails on an empty list or an automaton the
    /// builder rejects.
    pub fn new<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phrases: Vec<String> = phrases.into_iter().map(Into::into).collect();
        if phrases.is_empty() {
            return Err(EngineError::InvalidPhraseSet(
                "phrase list is empty".to_string(),
            ));
        }
        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostFirst)
            .ascii_case_insensitive(true)
            .build(&phrases)
            .map_err(|err| EngineError::InvalidPhraseSet(err.to_string()))?;
        Ok(Self { automaton, phrases })
    }

    /// Compile from a whitespace-separated phrase list, the form rule
    /// directives carry inline.
    pub fn from_list(list: &str) -> Result<Self> {
        Self::new(list.split_whitespace())
    }

    /// Whether any phrase occurs in `subject`.
    pub fn is_match(&self, subject: &str) -> bool {
        self.automaton.is_match(subject)
    }

    /// The leftmost phrase occurrence, as it appears in the subject.
    pub fn find(&self, subject: &str) -> Option<Match> {
        self.automaton
            .find(subject)
            .map(|m| Match::new(&subject[m.range()], m.start()))
    }

    /// The phrases this set was compiled from.
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}
