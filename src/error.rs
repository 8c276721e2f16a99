//! Error types for matching and assembling programs

use thiserror::Error;

/// Result type for match operations
pub type Result<T> = std::result::Result<T, MatchError>;

/// Errors that abort a match attempt.
///
/// A pattern that simply does not match is not an error, and neither is a truncated
/// program: both come back as an unmatched outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// Nesting went deeper than `ExecLimits::max_depth`
    #[error("program nesting exceeds depth limit of {limit}")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
    },
    /// Evaluated more instructions than `ExecLimits::max_ticks`
    #[error("match execution timed out")]
    Timeout,
    /// A quantifier iteration ended somewhere other than the measured end of its body.
    /// Only reachable when the program's length bytes disagree with its structure.
    #[error("quantifier at {pc}: body ends at {found}, expected {expected}")]
    InconsistentExtent {
        /// Position of the quantifier opcode
        pc: usize,
        /// End measured by walking the bytecode
        expected: usize,
        /// End reported by evaluating the body
        found: usize,
    },
}

/// Errors raised while assembling or disassembling bytecode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    /// A length or skip operand does not fit in one byte
    #[error("{construct} operand spans {len} bytes, at most 255 fit")]
    OperandTooLong {
        /// Construct that owns the operand
        construct: &'static str,
        /// Required operand value
        len: usize,
    },
    /// Quantifier bounds are out of order or collide with the unbounded marker
    #[error("invalid quantifier bounds {{{min},{max}}}")]
    InvalidBounds {
        /// Minimum repetitions
        min: u8,
        /// Maximum repetitions
        max: u8,
    },
    /// Class range with its low byte above its high byte
    #[error("invalid class range {low:#04x}-{high:#04x}")]
    InvalidRange {
        /// Lower bound
        low: u8,
        /// Upper bound
        high: u8,
    },
    /// Program nests deeper than the disassembler follows
    #[error("program nesting too deep")]
    TooComplex,
    /// Program ended in the middle of an instruction
    #[error("program truncated at offset {pc}")]
    Truncated {
        /// Offset of the missing byte
        pc: usize,
    },
}
