//! # Parser Events
//!
//! Events are the intermediate representation between parsing and tree
//! building. Instead of building the tree directly, the parser emits a
//! **flat sequence** of events that describe the tree structure.
//!
//! ```text
//! Start(HEADING)          ← Begin a HEADING node
//!   Token(HEADING_MARKER, 2)
//!   Start(HEADING_TEXT)
//!     Token(TEXT, 5)
//!   Finish
//!   Token(NEWLINE, 1)
//! Finish                  ← End the HEADING node
//! ```
//!
//! Tokens carry a byte length rather than an index into a token vector:
//! Markdoc is lexed on demand, in whichever mode the grammar is in, so there
//! is no token vector to index. The [`Sink`](super::sink::Sink) slices the
//! source text by these lengths.
//!
//! ## Forward Parent Links
//!
//! The `forward_parent` field in `Start` handles cases where we need to wrap
//! an already-parsed node, such as the left operand of a binary expression.
//! The Sink resolves these links by following the chain and opening nodes
//! in the correct (outermost-first) order.
//!
//! ## Rewinding
//!
//! Speculative parses (emphasis, `{{ }}` interpolations) record the event
//! count before starting and truncate back to it when they fail. Because
//! events are a flat vector, rewinding is a single `truncate`.

use crate::syntax_kind::SyntaxKind;

/// An event emitted by the parser during tree construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin a new composite node.
    ///
    /// If `forward_parent` is set, it points to another `Start` event that
    /// becomes this node's parent.
    Start {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },

    /// Add a token of `len` bytes to the current node.
    Token { kind: SyntaxKind, len: usize },

    /// Finish the current node.
    Finish,

    /// A placeholder that will be replaced.
    ///
    /// When `parser.start()` is called, a `Placeholder` is pushed. Later,
    /// `marker.complete()` replaces it with a real `Start`, or
    /// `marker.abandon()` leaves it (the Sink ignores placeholders).
    Placeholder,
}

impl Event {
    /// Create a start event with no forward parent.
    pub fn start(kind: SyntaxKind) -> Self {
        Event::Start {
            kind,
            forward_parent: None,
        }
    }

    /// Create a token event.
    pub fn token(kind: SyntaxKind, len: usize) -> Self {
        Event::Token { kind, len }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_start_creation() {
        let event = Event::start(SyntaxKind::PARAGRAPH);
        assert_eq!(
            event,
            Event::Start {
                kind: SyntaxKind::PARAGRAPH,
                forward_parent: None
            }
        );
    }

    #[test]
    fn event_token_creation() {
        let event = Event::token(SyntaxKind::TEXT, 5);
        assert_eq!(
            event,
            Event::Token {
                kind: SyntaxKind::TEXT,
                len: 5
            }
        );
    }
}
