//! Greedy bytecode regex matcher
//!
//! A compiled pattern is a flat byte program: each instruction starts with an opcode tag,
//! structural instructions carry one-byte lengths so their subtrees can be skipped, and
//! every unreserved byte is a literal. The matcher evaluates a program at one fixed
//! input offset and reports whether it matches a prefix of the input there, recording
//! spans for indexed capture groups along the way.
//!
//! Repetition is greedy and never backtracks. Classification of word bytes is ASCII only.

pub mod assembler;
pub mod error;
pub mod groups;
pub mod matcher;
pub mod opcodes;

use std::ops::Range;

use tracing::{trace, warn};

pub use error::{AssembleError, MatchError, Result};
pub use groups::GroupSet;
pub use matcher::{evaluate, evaluate_with_limits, Outcome};

/// Default bound on program nesting during evaluation.
///
/// Deeper programs fail with `MatchError::DepthExceeded` rather than risk the stack.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Span recorded for one capture group, as offsets into the matched input.
///
/// Offsets stay meaningful only for the input they were produced from; keeping that
/// input around is up to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capture {
    /// Offset of the first captured byte
    pub start: usize,
    /// Offset one past the last captured byte
    pub end: usize,
}

impl Capture {
    /// Span as a range
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of captured bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Captured bytes of `input`, or `None` if the span does not fit it
    pub fn slice<'i>(&self, input: &'i [u8]) -> Option<&'i [u8]> {
        input.get(self.range())
    }
}

/// Configuration for match execution limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecLimits {
    /// Maximum nesting of instructions being evaluated at once
    pub max_depth: usize,
    /// Maximum number of instruction evaluations before timeout
    pub max_ticks: Option<usize>,
}

impl Default for ExecLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_ticks: None,
        }
    }
}

/// An owned compiled program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    buffer: Vec<u8>,
}

impl Program {
    /// Wrap raw bytecode. No validation happens here: malformed programs fail to match.
    pub fn from_bytes(buffer: impl Into<Vec<u8>>) -> Self {
        Self {
            buffer: buffer.into(),
        }
    }

    /// Raw bytecode
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Bytecode length
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the program has no instructions
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Test if the program matches a prefix of `input`
    pub fn is_match(&self, input: &[u8], captures: &mut [Capture]) -> bool {
        is_match(&self.buffer, input, captures)
    }

    /// Match with execution limits, surfacing limit and consistency errors
    pub fn try_match_with_limits(
        &self,
        input: &[u8],
        captures: &mut [Capture],
        limits: ExecLimits,
    ) -> Result<bool> {
        try_match(&self.buffer, input, captures, limits)
    }

    /// Match against `input` with `slots` fresh capture slots.
    ///
    /// Returns the spans of the groups written by a successful match, indexed by group.
    /// Slots at or past [`GroupSet::CAPACITY`] have no bit to prove a write, so they
    /// always come back as `None`; use [`evaluate`] with a caller-owned buffer for those.
    pub fn captures(&self, input: &[u8], slots: usize) -> Option<Vec<Option<Capture>>> {
        let mut captures = vec![Capture::default(); slots];
        let outcome =
            evaluate_with_limits(&self.buffer, input, 0, 0, &mut captures, ExecLimits::default())
                .map_err(|err| warn!(%err, "match aborted"))
                .ok()?;

        if !outcome.matched {
            return None;
        }

        let written = captures
            .into_iter()
            .enumerate()
            .map(|(index, capture)| outcome.groups.contains_group(index).then_some(capture))
            .collect();
        Some(written)
    }
}

impl From<Vec<u8>> for Program {
    fn from(buffer: Vec<u8>) -> Self {
        Self::from_bytes(buffer)
    }
}

/// Test if `program` matches a prefix of `input` starting at offset 0.
///
/// Capacity is `captures.len()`; group indices past it are matched but not recorded.
/// Errors (limits, inconsistent length bytes) are logged and reported as no match.
/// That includes valid programs nesting deeper than [`DEFAULT_MAX_DEPTH`]; use
/// [`try_match`] with a larger `ExecLimits::max_depth` to run those.
pub fn is_match(program: &[u8], input: &[u8], captures: &mut [Capture]) -> bool {
    try_match(program, input, captures, ExecLimits::default()).unwrap_or_else(|err| {
        warn!(%err, "match aborted");
        false
    })
}

/// Like [`is_match`], but returns errors instead of folding them into `false`
pub fn try_match(
    program: &[u8],
    input: &[u8],
    captures: &mut [Capture],
    limits: ExecLimits,
) -> Result<bool> {
    trace!(program_len = program.len(), input_len = input.len(), "match attempt");
    let outcome = evaluate_with_limits(program, input, 0, 0, captures, limits)?;
    trace!(matched = outcome.matched, end = outcome.sp, "match finished");
    Ok(outcome.matched)
}
