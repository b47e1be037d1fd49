//! The pattern-matching wrapper used by operator-bearing rules.
//!
//! A [`PatternMatcher`] owns one compiled pattern and exposes the search
//! modes rule operators need: boolean testing, one match with captures, a
//! global scan that handles zero-length matches without looping forever, and
//! a legacy single-capture search kept for operators that still depend on its
//! shape. Compiled state is immutable after construction; every call
//! allocates its own working state, so one matcher serves any number of
//! request threads concurrently.

use std::fmt;

use tracing::debug;

use crate::error::Result;
use crate::matcher::backend::{
    CompileOptions, ExecOptions, ExecResult, ExecStatus, HybridBackend, PatternProgram,
    RegexBackend,
};
use crate::matcher::types::{Capture, Match, MatchOutcome};

/// One compiled pattern plus its optional fast-execution artifact.
pub struct PatternMatcher {
    pattern: String,
    program: Box<dyn PatternProgram>,
    crlf_is_newline: bool,
}

impl fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMatcher")
            .field("pattern", &self.pattern)
            .field("fast_path", &self.program.has_fast_path())
            .finish()
    }
}

impl PatternMatcher {
    /// Compile `pattern` on the default backend.
    ///
    /// An empty pattern is normalized to `.*` before compilation. Matching
    /// always runs with dot-matches-newline and multiline anchoring;
    /// `ignore_case` additionally makes it caseless. A pattern the backend
    /// rejects surfaces as [`EngineError::InvalidPattern`].
    ///
    /// [`EngineError::InvalidPattern`]: crate::error::EngineError::InvalidPattern
    pub fn new(pattern: &str, ignore_case: bool) -> Result<Self> {
        Self::with_backend(&HybridBackend, pattern, ignore_case)
    }

    /// Compile `pattern` on a caller-supplied backend.
    pub fn with_backend(
        backend: &dyn RegexBackend,
        pattern: &str,
        ignore_case: bool,
    ) -> Result<Self> {
        let normalized = if pattern.is_empty() { ".*" } else { pattern };
        let options = CompileOptions {
            caseless: ignore_case,
            dot_matches_newline: true,
            multiline: true,
        };
        let program = backend.compile(normalized, options)?;
        debug!(
            pattern = normalized,
            fast_path = program.has_fast_path(),
            "compiled pattern"
        );
        Ok(Self {
            pattern: normalized.to_string(),
            program,
            crlf_is_newline: backend.crlf_is_newline(),
        })
    }

    /// The pattern text this matcher was compiled from (after empty-pattern
    /// normalization).
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the backend produced a fast-execution artifact for this
    /// pattern.
    pub fn fast_path_available(&self) -> bool {
        self.program.has_fast_path()
    }

    /// One attempt preferring the fast path, retrying on the baseline when
    /// the fast path reports its own resource-limit condition. The fallback
    /// never changes the match result, only how it is computed.
    fn exec_with_fallback(&self, subject: &str, start: usize, options: ExecOptions) -> ExecResult {
        if self.program.has_fast_path() {
            let result = self.program.exec_fast(subject, start, options, 0);
            if result.status != ExecStatus::FastPathLimit {
                return result;
            }
        }
        self.program.exec(subject, start, options, 0)
    }

    /// Attempt with a caller-supplied backtracking budget. A bounded attempt
    /// stays on the baseline program; the fast artifact cannot account its
    /// work against the budget.
    fn exec_limited(
        &self,
        subject: &str,
        start: usize,
        options: ExecOptions,
        match_limit: u64,
    ) -> ExecResult {
        if match_limit > 0 {
            self.program.exec(subject, start, options, match_limit)
        } else {
            self.exec_with_fallback(subject, start, options)
        }
    }

    fn classify(status: &ExecStatus) -> MatchOutcome {
        match status {
            ExecStatus::Matched(_) | ExecStatus::NoMatch => MatchOutcome::Ok,
            ExecStatus::MatchLimit => MatchOutcome::MatchLimitExceeded,
            ExecStatus::FastPathLimit | ExecStatus::Failed(_) => MatchOutcome::OtherError,
        }
    }

    /// Whether the pattern matches anywhere in `subject`.
    pub fn test(&self, subject: &str) -> bool {
        matches!(
            self.exec_with_fallback(subject, 0, ExecOptions::default())
                .status,
            ExecStatus::Matched(_)
        )
    }

    /// Every non-overlapping match, scanning left to right.
    ///
    /// Each reported group becomes one [`Match`] and the next attempt resumes
    /// after the end of the group processed last; a zero-length group ends
    /// the scan. The returned order is reverse discovery order: the match
    /// found last comes first. Consumers depend on that order; do not change
    /// it here.
    pub fn search_all(&self, subject: &str) -> Vec<Match> {
        let mut found = Vec::new();
        let mut offset = 0usize;
        'scan: loop {
            let result = self.exec_with_fallback(subject, offset, ExecOptions::default());
            let count = match result.status {
                ExecStatus::Matched(count) => count,
                _ => break,
            };
            for i in 0..count {
                let start = result.ovector[2 * i];
                let end = result.ovector[2 * i + 1];
                if end > subject.len() {
                    // Offsets disagree with the subject buffer; abandon the
                    // scan, keeping what was found so far.
                    break 'scan;
                }
                offset = end;
                found.push(Match::new(&subject[start..end], start));
                if end == start {
                    break 'scan;
                }
            }
        }
        found.reverse();
        found
    }

    /// One match attempt from the start of `subject`, extracting the whole
    /// match and every reported capture group.
    ///
    /// A capture whose end offset lies past the subject is dropped. When
    /// `match_limit` is greater than zero it bounds the evaluator's
    /// backtracking for this call only; exhausting it yields
    /// [`MatchOutcome::MatchLimitExceeded`]. A clean no-match is
    /// [`MatchOutcome::Ok`] with no captures.
    pub fn search_one_match(
        &self,
        subject: &str,
        match_limit: u64,
    ) -> (MatchOutcome, Vec<Capture>) {
        let result = self.exec_limited(subject, 0, ExecOptions::default(), match_limit);
        let mut captures = Vec::new();
        if let ExecStatus::Matched(count) = result.status {
            for i in 0..count {
                let start = result.ovector[2 * i];
                let end = result.ovector[2 * i + 1];
                if end > subject.len() {
                    continue;
                }
                captures.push(Capture::new(i, start, end - start));
            }
        }
        (Self::classify(&result.status), captures)
    }

    /// Global scan with correct zero-length-match handling.
    ///
    /// After a zero-length match mid-subject the same position is retried
    /// once with the attempt anchored there and forbidden from matching
    /// empty again; if that finds nothing the scan advances one character
    /// (two when the position sits on a CRLF pair and the backend's newline
    /// convention treats CRLF as one newline). Capture group indices keep
    /// increasing across the whole scan instead of resetting per match.
    /// Match-limit and other evaluator failures abort the scan immediately,
    /// returning the captures collected so far.
    pub fn search_global(&self, subject: &str, match_limit: u64) -> (MatchOutcome, Vec<Capture>) {
        let mut captures: Vec<Capture> = Vec::new();
        let mut start_offset = 0usize;
        let mut prev_was_zero_length = false;

        while start_offset <= subject.len() {
            let options = if prev_was_zero_length {
                ExecOptions {
                    anchored: true,
                    notempty_atstart: true,
                }
            } else {
                ExecOptions::default()
            };
            let result = self
                .program
                .exec(subject, start_offset, options, match_limit);

            match result.status {
                ExecStatus::Matched(count) => {
                    let first_group = captures.len();
                    for i in 0..count {
                        let start = result.ovector[2 * i];
                        let end = result.ovector[2 * i + 1];
                        if end > subject.len() {
                            continue;
                        }
                        let length = end - start;
                        captures.push(Capture::new(first_group + i, start, length));

                        if i == 0 {
                            if length > 0 {
                                // Next attempt starts right after this match.
                                start_offset = end;
                                prev_was_zero_length = false;
                            } else if start_offset == subject.len() {
                                // Zero-length match at the end of the
                                // subject; force the loop to terminate.
                                start_offset += 1;
                            } else {
                                // Zero-length match mid-subject; retry the
                                // same position with the forced options.
                                prev_was_zero_length = true;
                            }
                        }
                    }
                }
                ExecStatus::NoMatch => {
                    if prev_was_zero_length {
                        // The forced retry found nothing; step past the
                        // position that produced the zero-length match.
                        let step = subject[start_offset..]
                            .chars()
                            .next()
                            .map_or(1, char::len_utf8);
                        start_offset += step;
                        if self.crlf_is_newline
                            && start_offset < subject.len()
                            && subject.as_bytes()[start_offset - 1] == b'\r'
                            && subject.as_bytes()[start_offset] == b'\n'
                        {
                            start_offset += 1;
                        }
                        prev_was_zero_length = false;
                    } else {
                        break;
                    }
                }
                other => return (Self::classify(&other), captures),
            }
        }

        (MatchOutcome::Ok, captures)
    }

    /// Legacy single-capture search.
    ///
    /// Builds the returned [`Match`] by indexing the offset vector with the
    /// reported pair count, and records offset 0 on it regardless of where
    /// the text matched. That is only coherent for patterns without explicit
    /// capture groups; with groups present the boundaries come out shifted.
    /// Kept byte-for-byte for the operators that still rely on it; the
    /// offsets are merely clamped to the subject so an out-of-contract
    /// pattern cannot slice out of bounds.
    pub fn search(&self, subject: &str) -> Option<Match> {
        let result = self.exec_with_fallback(subject, 0, ExecOptions::default());
        let count = match result.status {
            ExecStatus::Matched(count) => count,
            _ => return None,
        };
        let start = result.ovector[count - 1].min(subject.len());
        let end = result.ovector[count].max(start).min(subject.len());
        Some(Match::new(&subject[start..end], 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_empty_pattern_matches_anything() {
        let matcher = PatternMatcher::new("", false).unwrap();
        assert_eq!(matcher.pattern(), ".*");
        assert!(matcher.test(""));
        assert!(matcher.test("anything at all"));
    }

    #[test]
    fn test_dot_matches_newline_is_always_on() {
        let matcher = PatternMatcher::new("a.b", false).unwrap();
        assert!(matcher.test("a\nb"));
    }

    #[test]
    fn test_multiline_anchoring_is_always_on() {
        let matcher = PatternMatcher::new("^attack", false).unwrap();
        assert!(matcher.test("clean\nattack"));
    }

    #[test]
    fn test_case_insensitive_compilation() {
        let sensitive = PatternMatcher::new("union select", false).unwrap();
        let insensitive = PatternMatcher::new("union select", true).unwrap();
        assert!(!sensitive.test("UNION SELECT"));
        assert!(insensitive.test("UNION SELECT"));
    }

    #[test]
    fn test_search_returns_whole_match_for_groupless_pattern() {
        let matcher = PatternMatcher::new("a+", false).unwrap();
        let found = matcher.search("baaab").unwrap();
        assert_eq!(found.value, "aaa");
        // The legacy operation always records offset 0.
        assert_eq!(found.offset, 0);
        assert!(matcher.search("zzz").is_none());
    }

    #[test]
    fn test_search_global_zero_length_only_pattern() {
        let matcher = PatternMatcher::new("x*", false).unwrap();
        let (outcome, captures) = matcher.search_global("ab", 0);
        assert_eq!(outcome, MatchOutcome::Ok);
        let positions: Vec<(usize, usize, usize)> = captures
            .iter()
            .map(|c| (c.group, c.offset, c.length))
            .collect();
        assert_eq!(positions, vec![(0, 0, 0), (1, 1, 0), (2, 2, 0)]);
    }

    #[test]
    fn test_search_global_empty_subject() {
        let matcher = PatternMatcher::new("x*", false).unwrap();
        let (outcome, captures) = matcher.search_global("", 0);
        assert_eq!(outcome, MatchOutcome::Ok);
        assert_eq!(captures.len(), 1);
        assert_eq!((captures[0].offset, captures[0].length), (0, 0));
    }

    #[test]
    fn test_search_global_mixed_zero_and_nonzero() {
        // "x*" across "axa": empty at 0, "x" at 1, empty at 2, empty at 3.
        let matcher = PatternMatcher::new("x*", false).unwrap();
        let (outcome, captures) = matcher.search_global("axa", 0);
        assert_eq!(outcome, MatchOutcome::Ok);
        let spans: Vec<(usize, usize)> =
            captures.iter().map(|c| (c.offset, c.length)).collect();
        assert_eq!(spans, vec![(0, 0), (1, 1), (2, 0), (3, 0)]);
        // Group indices grow across the scan.
        let groups: Vec<usize> = captures.iter().map(|c| c.group).collect();
        assert_eq!(groups, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_search_global_group_indices_accumulate_with_captures() {
        let matcher = PatternMatcher::new("(a)(b)", false).unwrap();
        let (outcome, captures) = matcher.search_global("abab", 0);
        assert_eq!(outcome, MatchOutcome::Ok);
        let groups: Vec<usize> = captures.iter().map(|c| c.group).collect();
        assert_eq!(groups, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!((captures[3].offset, captures[3].length), (2, 2));
    }

    // A scripted backend drives the branches a real engine cannot be forced
    // into deterministically: the fast-path resource-limit retry and the
    // CRLF-aware advance past a stuck zero-length match.

    struct RetryProgram;

    impl PatternProgram for RetryProgram {
        fn exec(
            &self,
            _subject: &str,
            _start: usize,
            _options: ExecOptions,
            _match_limit: u64,
        ) -> ExecResult {
            ExecResult {
                status: ExecStatus::Matched(1),
                ovector: vec![0, 1],
            }
        }

        fn has_fast_path(&self) -> bool {
            true
        }

        fn exec_fast(
            &self,
            _subject: &str,
            _start: usize,
            _options: ExecOptions,
            _match_limit: u64,
        ) -> ExecResult {
            ExecResult {
                status: ExecStatus::FastPathLimit,
                ovector: Vec::new(),
            }
        }
    }

    struct RetryBackend;

    impl RegexBackend for RetryBackend {
        fn compile(
            &self,
            _pattern: &str,
            _options: CompileOptions,
        ) -> Result<Box<dyn PatternProgram>> {
            Ok(Box::new(RetryProgram))
        }
    }

    #[test]
    fn test_fast_path_limit_falls_back_to_baseline() {
        let matcher = PatternMatcher::with_backend(&RetryBackend, "irrelevant", false).unwrap();
        assert!(matcher.fast_path_available());
        // The fast path reports its limit; the baseline answer wins.
        assert!(matcher.test("subject"));
        let found = matcher.search("subject").unwrap();
        assert_eq!(found.value, "s");
    }

    type CallLog = Arc<Mutex<Vec<(usize, bool)>>>;

    struct ZeroLengthProgram {
        calls: CallLog,
    }

    impl PatternProgram for ZeroLengthProgram {
        fn exec(
            &self,
            _subject: &str,
            start: usize,
            options: ExecOptions,
            _match_limit: u64,
        ) -> ExecResult {
            let mut calls = self.calls.lock().unwrap();
            let attempt = calls.len();
            calls.push((start, options.anchored));
            if attempt == 0 {
                ExecResult {
                    status: ExecStatus::Matched(1),
                    ovector: vec![0, 0],
                }
            } else {
                ExecResult::no_match()
            }
        }
    }

    struct ZeroLengthBackend {
        crlf: bool,
        calls: CallLog,
    }

    impl RegexBackend for ZeroLengthBackend {
        fn compile(
            &self,
            _pattern: &str,
            _options: CompileOptions,
        ) -> Result<Box<dyn PatternProgram>> {
            Ok(Box::new(ZeroLengthProgram {
                calls: Arc::clone(&self.calls),
            }))
        }

        fn crlf_is_newline(&self) -> bool {
            self.crlf
        }
    }

    #[test]
    fn test_zero_length_advance_skips_crlf_as_one_newline() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let backend = ZeroLengthBackend {
            crlf: true,
            calls: Arc::clone(&calls),
        };
        let matcher = PatternMatcher::with_backend(&backend, "irrelevant", false).unwrap();
        let (outcome, captures) = matcher.search_global("\r\nx", 0);
        assert_eq!(outcome, MatchOutcome::Ok);
        assert_eq!(captures.len(), 1);
        // Attempt at 0, forced retry at 0, then the advance jumps the whole
        // CRLF pair to 2.
        assert_eq!(*calls.lock().unwrap(), vec![(0, false), (0, true), (2, false)]);
    }

    #[test]
    fn test_zero_length_advance_steps_one_char_without_crlf_convention() {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let backend = ZeroLengthBackend {
            crlf: false,
            calls: Arc::clone(&calls),
        };
        let matcher = PatternMatcher::with_backend(&backend, "irrelevant", false).unwrap();
        let (outcome, _) = matcher.search_global("\r\nx", 0);
        assert_eq!(outcome, MatchOutcome::Ok);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![(0, false), (0, true), (1, false)]
        );
    }
}
