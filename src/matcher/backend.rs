//! The evaluator seam: what a backing regular-expression engine must provide.
//!
//! [`PatternMatcher`](crate::matcher::PatternMatcher) never talks to a regex
//! crate directly. It compiles through a [`RegexBackend`] and runs match
//! attempts through the resulting [`PatternProgram`], so the engine behind it
//! is swappable. A program reports results PCRE-style: a status plus a flat
//! offset vector with two entries per reported group pair. Groups that did
//! not participate in a match carry [`UNSET_OFFSET`] in both slots, which the
//! wrapper's end-of-subject bounds check filters out.
//!
//! The shipped implementation is [`HybridBackend`]: a backtracking baseline
//! that honors a per-call backtracking budget, plus an opportunistically
//! compiled linear-time fast program for the pattern subset that supports it.

use fancy_regex::RegexBuilder;
use tracing::debug;

use crate::error::{EngineError, Result};

/// Offset stored for a group that did not participate in the match.
///
/// Mirrors the unset sentinel of PCRE-style offset vectors: an impossible
/// offset, larger than any subject, so the caller's "capture end past the
/// subject" guard discards these pairs without a dedicated code path.
pub const UNSET_OFFSET: usize = usize::MAX;

/// Compile-time pattern options, decided once by the wrapper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub caseless: bool,
    pub dot_matches_newline: bool,
    pub multiline: bool,
}

/// Per-attempt options. Both flags are only ever set together, by the global
/// scan's forced retry after a zero-length match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Accept only a match starting exactly at the attempt offset.
    pub anchored: bool,
    /// Reject a zero-length match at the attempt offset.
    pub notempty_atstart: bool,
}

/// Status of one evaluator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecStatus {
    /// A match was found; the payload is the number of reported group pairs
    /// (at least one, the whole match).
    Matched(usize),
    /// Clean completion without a match.
    NoMatch,
    /// The backtracking budget for this call was exhausted.
    MatchLimit,
    /// The fast path ran out of a resource specific to it; the attempt should
    /// be retried on the baseline program.
    FastPathLimit,
    /// Abnormal termination. Not worth retrying with the same inputs.
    Failed(String),
}

/// Status plus the flat offset vector of the reported pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub status: ExecStatus,
    /// Start/end offsets, two entries per pair reported in `status`.
    pub ovector: Vec<usize>,
}

impl ExecResult {
    pub fn no_match() -> Self {
        Self {
            status: ExecStatus::NoMatch,
            ovector: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ExecStatus::Failed(message.into()),
            ovector: Vec::new(),
        }
    }

    fn match_limit() -> Self {
        Self {
            status: ExecStatus::MatchLimit,
            ovector: Vec::new(),
        }
    }
}

/// One compiled pattern, ready for concurrent match attempts.
///
/// Implementations must not mutate any state during `exec`; every call gets
/// its own working storage so one program can serve many threads.
pub trait PatternProgram: Send + Sync {
    /// Run the baseline evaluator from `start`, bounding its backtracking
    /// work by `match_limit` when that is greater than zero.
    fn exec(&self, subject: &str, start: usize, options: ExecOptions, match_limit: u64)
        -> ExecResult;

    /// Whether a fast-execution artifact was produced for this pattern.
    fn has_fast_path(&self) -> bool {
        false
    }

    /// Run the fast-execution artifact, falling back to the baseline when
    /// none exists. May report [`ExecStatus::FastPathLimit`] to ask the
    /// caller to retry on the baseline.
    fn exec_fast(
        &self,
        subject: &str,
        start: usize,
        options: ExecOptions,
        match_limit: u64,
    ) -> ExecResult {
        self.exec(subject, start, options, match_limit)
    }
}

/// A pluggable regular-expression engine.
pub trait RegexBackend: Send + Sync {
    fn compile(&self, pattern: &str, options: CompileOptions) -> Result<Box<dyn PatternProgram>>;

    /// Whether the engine's newline convention treats a CRLF pair as a single
    /// newline. Decides how far a global scan advances past a stuck
    /// zero-length match.
    fn crlf_is_newline(&self) -> bool {
        false
    }
}

/// The shipped backend: a backtracking baseline plus an opportunistic
/// linear-time fast path.
///
/// The baseline accepts the full backtracking dialect and enforces the
/// per-call budget. The fast program only compiles for patterns without
/// backtracking-only syntax; when it does not, matching silently stays on
/// the baseline. Its newline convention is LF-only, so
/// [`crlf_is_newline`](RegexBackend::crlf_is_newline) is false.
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridBackend;

impl RegexBackend for HybridBackend {
    fn compile(&self, pattern: &str, options: CompileOptions) -> Result<Box<dyn PatternProgram>> {
        let source = decorate(pattern, options);
        let baseline =
            fancy_regex::Regex::new(&source).map_err(|err| EngineError::InvalidPattern {
                pattern: pattern.to_string(),
                message: err.to_string(),
            })?;
        let fast = regex::Regex::new(&source).ok();
        if fast.is_none() {
            debug!(pattern, "no fast path for pattern, baseline engine only");
        }
        Ok(Box::new(HybridProgram {
            source,
            baseline,
            fast,
        }))
    }
}

/// Prefix the pattern with inline flags so both engines compile identical
/// semantics.
fn decorate(pattern: &str, options: CompileOptions) -> String {
    let mut flags = String::new();
    if options.dot_matches_newline {
        flags.push('s');
    }
    if options.multiline {
        flags.push('m');
    }
    if options.caseless {
        flags.push('i');
    }
    if flags.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{flags}){pattern}")
    }
}

struct HybridProgram {
    source: String,
    baseline: fancy_regex::Regex,
    fast: Option<regex::Regex>,
}

impl HybridProgram {
    fn run_baseline(
        &self,
        program: &fancy_regex::Regex,
        subject: &str,
        start: usize,
        options: ExecOptions,
    ) -> ExecResult {
        match program.captures_from_pos(subject, start) {
            Ok(Some(caps)) => {
                let whole = match caps.get(0) {
                    Some(m) => m,
                    None => return ExecResult::failed("match reported without a group 0"),
                };
                if options.anchored && whole.start() != start {
                    return ExecResult::no_match();
                }
                if options.notempty_atstart && whole.start() == start && whole.end() == start {
                    return ExecResult::no_match();
                }
                collect_pairs((0..caps.len()).map(|i| caps.get(i).map(|m| (m.start(), m.end()))))
            }
            Ok(None) => ExecResult::no_match(),
            Err(fancy_regex::Error::RuntimeError(
                fancy_regex::RuntimeError::BacktrackLimitExceeded,
            )) => ExecResult::match_limit(),
            Err(err) => ExecResult::failed(err.to_string()),
        }
    }
}

impl PatternProgram for HybridProgram {
    fn exec(
        &self,
        subject: &str,
        start: usize,
        options: ExecOptions,
        match_limit: u64,
    ) -> ExecResult {
        if match_limit > 0 {
            // The budget is call-scoped: build a bounded copy of the program
            // for this attempt instead of touching the shared one.
            let limited = match RegexBuilder::new(&self.source)
                .backtrack_limit(match_limit as usize)
                .build()
            {
                Ok(program) => program,
                Err(err) => return ExecResult::failed(err.to_string()),
            };
            self.run_baseline(&limited, subject, start, options)
        } else {
            self.run_baseline(&self.baseline, subject, start, options)
        }
    }

    fn has_fast_path(&self) -> bool {
        self.fast.is_some()
    }

    fn exec_fast(
        &self,
        subject: &str,
        start: usize,
        options: ExecOptions,
        match_limit: u64,
    ) -> ExecResult {
        let fast = match &self.fast {
            Some(fast) => fast,
            None => return self.exec(subject, start, options, match_limit),
        };
        match fast.captures_at(subject, start) {
            Some(caps) => {
                let whole = match caps.get(0) {
                    Some(m) => m,
                    None => return ExecResult::failed("match reported without a group 0"),
                };
                if options.anchored && whole.start() != start {
                    return ExecResult::no_match();
                }
                if options.notempty_atstart && whole.start() == start && whole.end() == start {
                    return ExecResult::no_match();
                }
                collect_pairs((0..caps.len()).map(|i| caps.get(i).map(|m| (m.start(), m.end()))))
            }
            None => ExecResult::no_match(),
        }
    }
}

/// Pack group spans into a PCRE-style offset vector.
///
/// The pair count runs up to the highest participating group; trailing unset
/// groups are not reported, unset groups below a participating one are
/// reported as [`UNSET_OFFSET`] pairs.
fn collect_pairs<I>(groups: I) -> ExecResult
where
    I: Iterator<Item = Option<(usize, usize)>>,
{
    let spans: Vec<Option<(usize, usize)>> = groups.collect();
    let count = match spans.iter().rposition(Option::is_some) {
        Some(last) => last + 1,
        None => return ExecResult::failed("match reported without participating groups"),
    };
    let mut ovector = Vec::with_capacity(count * 2);
    for span in spans.iter().take(count) {
        match span {
            Some((start, end)) => {
                ovector.push(*start);
                ovector.push(*end);
            }
            None => {
                ovector.push(UNSET_OFFSET);
                ovector.push(UNSET_OFFSET);
            }
        }
    }
    ExecResult {
        status: ExecStatus::Matched(count),
        ovector,
    }
}
