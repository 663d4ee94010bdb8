//! Diagnostics produced while parsing, plus the errors of the grammar
//! self-check and scanner state decoding.
//!
//! Parsing never fails: every problem becomes a [`SyntaxError`] collected
//! alongside a tree that still covers every input byte.

use rowan::TextRange;
use thiserror::Error;

use crate::policy::Rule;

/// Category of a parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No rule matched; the offending characters sit in an `ERROR` node.
    LexFailure,
    /// A required piece is missing (operand, tag name, `%}`).
    Expected,
    /// Well-formed pieces that do not fit together, such as a close tag whose
    /// name differs from its open tag.
    StructuralMismatch,
    /// A construct reached end of input without closing.
    UnterminatedConstruct,
    /// Nesting exceeded [`ParseOptions::max_nesting`](crate::ParseOptions).
    NestingLimit,
}

/// A diagnostic attached to a byte range of the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {range:?}")]
pub struct SyntaxError {
    pub kind: ErrorKind,
    pub range: TextRange,
    pub message: String,
}

impl SyntaxError {
    pub fn new(kind: ErrorKind, range: TextRange, message: impl Into<String>) -> Self {
        Self {
            kind,
            range,
            message: message.into(),
        }
    }
}

/// Defects in the block grammar's declared precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("rules {left:?} and {right:?} tie without a declared resolution")]
    AmbiguityUnresolved { left: Rule, right: Rule },
}

/// Failure to decode bytes from [`ScannerState::serialize`](crate::scanner::ScannerState::serialize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("unknown flag bits in {0:#010b}")]
    InvalidFlags(u8),
    #[error("scanner state ends early")]
    Truncated,
    #[error("invalid fence character {0:#04x}")]
    InvalidFence(u8),
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
}
