//! # Parser - Event-Based Tree Construction
//!
//! This module implements the core parsing logic, transforming source text
//! into a syntax tree using the **event-based** architecture from
//! rust-analyzer.
//!
//! ## Why Event-Based Parsing?
//!
//! Traditional recursive descent parsers build the tree directly during
//! parsing. That makes backtracking expensive (nodes are already built) and
//! error recovery tricky (partially-built nodes exist). Instead, we emit a
//! flat list of **events** ([`Event`]) that describe the tree structure. The
//! [`Sink`] then builds the actual Rowan tree from events.
//!
//! ## On-Demand Tokens
//!
//! Markdoc cannot be tokenized up front: the same characters mean different
//! things in prose and inside `{% %}`, and many terminals depend on scanner
//! state. The parser therefore keeps a byte cursor and asks for one token at
//! a time:
//!
//! - context-free lexemes come from [`lexer::next_lexeme`](crate::lexer::next_lexeme)
//!   in the current [`Mode`];
//! - context-sensitive terminals come from the [`Scanner`], given the set
//!   of kinds the grammar can accept right now.
//!
//! ## The Marker System
//!
//! When you call `parser.start()`, you get a `Marker`. This marker **must**
//! be either:
//!
//! - Completed with `marker.complete(parser, KIND)` → emits Start+Finish
//! - Abandoned with `marker.abandon(parser)` → removes the placeholder
//!
//! If you drop a marker without doing either, **the program panics**.
//!
//! ```ignore
//! let m = parser.start();
//! parser.bump();
//! m.complete(parser, SyntaxKind::PARAGRAPH);
//! ```
//!
//! ## Forward Parents and Projection
//!
//! `CompletedMarker::precede()` wraps an already-parsed node in a new
//! parent (binary expressions, postfix chains). `CompletedMarker::project()`
//! renames a finished node without touching its children: a paragraph that
//! turns out to be a list item's first line becomes `LIST_PARAGRAPH`, the
//! first row of a table becomes `TABLE_HEADER`.
//!
//! ## Module Structure
//!
//! - [`event`] - The Event enum
//! - [`sink`] - Converts events to a Rowan green tree
//! - `grammar` - Grammar rules (root, block, tag, table, inline, expression)
//!
//! ## Public API
//!
//! ```
//! use markdoc_syntax::parse;
//!
//! let parse = parse("# Hello\n");
//! assert!(parse.errors().is_empty());
//! println!("{}", parse.debug_tree());
//! ```

pub mod event;
pub mod sink;

mod grammar;

use std::collections::HashSet;
use std::fmt::Write as _;
use std::ops::Range;

use log::debug;
use rowan::{GreenNode, NodeOrToken, TextRange, TextSize};

use crate::ast::{AstNode, Document};
use crate::error::{ErrorKind, SyntaxError};
use crate::lexer::{Lexeme, Mode, next_lexeme};
use crate::options::ParseOptions;
use crate::scanner::{Scanned, Scanner, ScannerState};
use crate::syntax_kind::{SyntaxKind, SyntaxNode};
use event::Event;
use sink::Sink;

/// A position where an incremental re-parse may resume.
///
/// Recorded before each top-level block: feeding `state` and the source
/// from `offset` onwards to [`parse_with`] reproduces the same blocks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checkpoint {
    pub offset: TextSize,
    pub state: ScannerState,
}

/// The result of parsing: a green tree plus diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<SyntaxError>,
    checkpoints: Vec<Checkpoint>,
}

impl Parse {
    /// The root `ROOT` node.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// Diagnostics in source order of discovery.
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Typed view of the root.
    pub fn document(&self) -> Document {
        Document::cast(self.syntax()).unwrap_or_else(|| unreachable!("root is always ROOT"))
    }

    /// Indented dump of every node and token with its range.
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        write_tree(&mut out, &self.syntax(), 0);
        out
    }
}

fn write_tree(out: &mut String, node: &SyntaxNode, indent: usize) {
    let prefix = "  ".repeat(indent);
    let _ = writeln!(out, "{}{:?}@{:?}", prefix, node.kind(), node.text_range());
    for child in node.children_with_tokens() {
        match child {
            NodeOrToken::Node(n) => write_tree(out, &n, indent + 1),
            NodeOrToken::Token(t) => {
                let _ = writeln!(out, "{}  {:?}@{:?} {:?}", prefix, t.kind(), t.text_range(), t.text());
            }
        }
    }
}

/// Saved parser position for speculative parses.
pub(crate) struct Snapshot {
    pos: usize,
    events: usize,
    errors: usize,
    state: ScannerState,
}

/// The parser state machine.
///
/// Holds the source, the byte cursor, the scanner state and accumulated
/// events. Grammar functions receive `&mut Parser` and use its methods to:
///
/// - Inspect lexemes: `current()`, `nth()`, `at()`, `at_end()`
/// - Consume: `bump()`, `eat()`, `bump_raw()`, `bump_scanned()`
/// - Ask the scanner: `scan()`, `scan_at()`
/// - Build structure: `start()` → `Marker` → `complete()`/`abandon()`
pub struct Parser<'s> {
    source: &'s str,
    pos: usize,
    mode: Mode,
    events: Vec<Event>,
    errors: Vec<SyntaxError>,
    state: ScannerState,
    options: ParseOptions,
    depth: usize,
    /// Speculative parses known to fail, keyed by (offset, opener, limit).
    failed: HashSet<(usize, SyntaxKind, usize)>,
    limit: Option<usize>,
    line_scoped: bool,
    checkpoints: Vec<Checkpoint>,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str, options: ParseOptions, state: ScannerState) -> Self {
        Self {
            source,
            pos: 0,
            mode: Mode::Markup,
            events: Vec::new(),
            errors: Vec::new(),
            state,
            options,
            depth: 0,
            failed: HashSet::new(),
            limit: None,
            line_scoped: false,
            checkpoints: Vec::new(),
        }
    }

    /// Parse the whole source.
    pub fn parse(mut self) -> Parse {
        grammar::root(&mut self);
        let green = Sink::new(self.source, self.events).finish();
        debug!(
            "parsed {} bytes with {} diagnostics",
            self.source.len(),
            self.errors.len()
        );
        Parse {
            green,
            errors: self.errors,
            checkpoints: self.checkpoints,
        }
    }

    /// Start a new node and return a marker.
    pub fn start(&mut self) -> Marker {
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Byte offset of the cursor.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn state(&self) -> &ScannerState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut ScannerState {
        &mut self.state
    }

    /// End of the region lexemes may come from.
    fn end(&self) -> usize {
        self.limit.unwrap_or(self.source.len())
    }

    fn lexeme_at(&self, at: usize) -> Lexeme {
        let end = self.end();
        if at >= end {
            return Lexeme::EOF;
        }
        next_lexeme(self.mode, &self.source[at..end])
    }

    fn lexeme(&self) -> Lexeme {
        self.lexeme_at(self.pos)
    }

    /// Lexemes from the cursor onwards as `(kind, offset)`, in the current mode.
    pub fn lookahead(&self) -> impl Iterator<Item = (SyntaxKind, usize)> + '_ {
        let mut at = self.pos;
        std::iter::from_fn(move || {
            let lexeme = self.lexeme_at(at);
            if lexeme.len == 0 {
                return None;
            }
            let item = (lexeme.kind, at);
            at += lexeme.len;
            Some(item)
        })
    }

    /// Current lexeme kind, or EOF if past end.
    pub fn current(&self) -> SyntaxKind {
        self.lexeme().kind
    }

    /// Look ahead n lexemes.
    pub fn nth(&self, n: usize) -> SyntaxKind {
        self.lookahead()
            .nth(n)
            .map_or(SyntaxKind::EOF, |(kind, _)| kind)
    }

    /// The next lexeme that is not whitespace or a line break.
    pub fn peek_non_trivia(&self) -> (SyntaxKind, usize) {
        self.lookahead()
            .find(|(kind, _)| !kind.is_trivia())
            .unwrap_or((SyntaxKind::EOF, self.end()))
    }

    /// Get the text of the current lexeme.
    pub fn current_text(&self) -> &'s str {
        let len = self.lexeme().len;
        &self.source[self.pos..self.pos + len]
    }

    /// Check if current lexeme is of given kind.
    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// Check if at end of input (or of the current limit).
    pub fn at_end(&self) -> bool {
        self.pos >= self.end()
    }

    /// At a line break or the end of the current inline region.
    pub fn at_inline_end(&self) -> bool {
        matches!(self.current(), SyntaxKind::NEWLINE | SyntaxKind::EOF)
    }

    /// Consume the current lexeme if it matches.
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume whitespace and line breaks inside `{% %}` / `{{ }}`.
    pub fn eat_trivia(&mut self) {
        while self.current().is_trivia() {
            self.bump();
        }
    }

    /// Consume the current lexeme unconditionally.
    pub fn bump(&mut self) {
        let kind = self.current();
        self.bump_as(kind);
    }

    /// Consume the current lexeme, recording it as `kind`.
    pub fn bump_as(&mut self, kind: SyntaxKind) {
        let lexeme = self.lexeme();
        if lexeme.len == 0 {
            return;
        }
        if lexeme.unterminated {
            self.error(
                ErrorKind::UnterminatedConstruct,
                self.pos..self.pos + lexeme.len,
                "unterminated string",
            );
        }
        self.push_token(kind, lexeme.len);
    }

    /// Consume `len` bytes as one token of `kind`.
    pub fn bump_raw(&mut self, len: usize, kind: SyntaxKind) {
        if len > 0 {
            self.push_token(kind, len);
        }
    }

    fn push_token(&mut self, kind: SyntaxKind, len: usize) {
        self.events.push(Event::token(kind, len));
        if !kind.is_trivia() {
            self.state.mark_emitted();
        }
        self.pos += len;
    }

    /// Ask the scanner for one of `valid` at the cursor.
    pub fn scan(&self, valid: &[SyntaxKind]) -> Option<Scanned> {
        self.scan_at(self.pos, &self.state, valid)
    }

    /// Ask the scanner at an arbitrary offset and state without consuming.
    pub fn scan_at(&self, cursor: usize, state: &ScannerState, valid: &[SyntaxKind]) -> Option<Scanned> {
        let scanned = Scanner::new(self.source, self.options).scan(state, cursor, valid)?;
        (cursor + scanned.len <= self.end()).then_some(scanned)
    }

    /// Consume a scanner result and adopt its successor state.
    pub fn bump_scanned(&mut self, scanned: Scanned) {
        self.state = scanned.state;
        if scanned.len > 0 {
            self.push_token(scanned.kind, scanned.len);
        }
    }

    /// Run `f` with the lexer in `mode`.
    pub fn with_mode<T>(&mut self, mode: Mode, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.mode, mode);
        let result = f(self);
        self.mode = saved;
        result
    }

    /// Run `f` with lexing cut off at `end`; nested limits only narrow.
    pub fn with_limit<T>(&mut self, end: usize, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.limit;
        self.limit = Some(saved.map_or(end, |limit| limit.min(end)));
        let result = f(self);
        self.limit = saved;
        result
    }

    /// Run `f` with block parsing restricted to single-line forms.
    pub(crate) fn line_scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.line_scoped, true);
        let result = f(self);
        self.line_scoped = saved;
        result
    }

    pub(crate) fn is_line_scoped(&self) -> bool {
        self.line_scoped
    }

    /// Record a diagnostic.
    pub fn error(&mut self, kind: ErrorKind, range: Range<usize>, message: impl Into<String>) {
        let error = SyntaxError::new(kind, text_range(range), message);
        debug!("recovered: {error}");
        self.errors.push(error);
    }

    /// Record a diagnostic and leave an empty `ERROR` node at the cursor.
    pub fn missing(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.error(kind, self.pos..self.pos, message);
        let m = self.start();
        m.complete(self, SyntaxKind::ERROR);
    }

    /// Wrap the current lexeme in an `ERROR` node.
    pub fn err_and_bump(&mut self, message: impl Into<String>) {
        let kind = if self.at(SyntaxKind::UNKNOWN) {
            ErrorKind::LexFailure
        } else {
            ErrorKind::Expected
        };
        let len = self.lexeme().len;
        self.error(kind, self.pos..self.pos + len, message);
        let m = self.start();
        self.bump();
        m.complete(self, SyntaxKind::ERROR);
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            events: self.events.len(),
            errors: self.errors.len(),
            state: self.state.clone(),
        }
    }

    /// Discard everything since `snapshot`. Markers started after it must
    /// already be abandoned.
    pub(crate) fn rewind(&mut self, snapshot: Snapshot) {
        self.pos = snapshot.pos;
        self.events.truncate(snapshot.events);
        self.errors.truncate(snapshot.errors);
        self.state = snapshot.state;
    }

    /// Enter one level of nesting; false when the limit is reached.
    pub(crate) fn enter(&mut self) -> bool {
        if self.depth >= self.options.max_nesting {
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn has_failed(&self, kind: SyntaxKind) -> bool {
        self.failed.contains(&(self.pos, kind, self.end()))
    }

    pub(crate) fn mark_failed(&mut self, kind: SyntaxKind) {
        self.failed.insert((self.pos, kind, self.end()));
    }

    pub(crate) fn checkpoint(&mut self) {
        self.checkpoints.push(Checkpoint {
            offset: text_size(self.pos),
            state: self.state.clone(),
        });
    }
}

fn text_size(offset: usize) -> TextSize {
    TextSize::try_from(offset).unwrap_or(TextSize::new(u32::MAX))
}

fn text_range(range: Range<usize>) -> TextRange {
    TextRange::new(text_size(range.start), text_size(range.end))
}

/// A marker for a node being constructed.
///
/// ## The Must-Use Contract
///
/// The `#[must_use]` attribute and the `Drop` impl together enforce that
/// every marker is either:
///
/// - **Completed** via `marker.complete(parser, KIND)` - converts the
///   placeholder to a `Start` event and pushes a `Finish` event
/// - **Abandoned** via `marker.abandon(parser)` - removes the placeholder
///   (only works if nothing was pushed after it)
///
/// If you drop a marker without doing either, **the program panics**. This
/// catches bugs at runtime rather than producing corrupt trees.
#[must_use = "Markers must be completed or abandoned, dropping them is a bug"]
pub struct Marker {
    /// Position in the events vector where our Placeholder lives
    pos: usize,
    /// Tracks whether complete() or abandon() was called
    completed: bool,
}

impl Marker {
    /// Complete this marker, creating a node of the given kind.
    pub fn complete(mut self, p: &mut Parser<'_>, kind: SyntaxKind) -> CompletedMarker {
        self.completed = true;
        let event_at_pos = &mut p.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::Start {
            kind,
            forward_parent: None,
        };
        p.events.push(Event::Finish);
        CompletedMarker { pos: self.pos }
    }

    /// Abandon this marker without creating a node.
    ///
    /// **Note**: This only removes the placeholder if it's the last event.
    /// If other events were pushed after `start()`, the placeholder becomes
    /// inert and is ignored by the Sink.
    pub fn abandon(mut self, p: &mut Parser<'_>) {
        self.completed = true;
        if self.pos + 1 == p.events.len() {
            match p.events.pop() {
                Some(Event::Placeholder) => {}
                _ => unreachable!(),
            }
        }
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be either completed or abandoned");
        }
    }
}

/// A marker for a node that has been completed.
#[derive(Debug, Clone, Copy)]
pub struct CompletedMarker {
    /// Position of the Start event for this completed node
    pos: usize,
}

impl CompletedMarker {
    /// Create a new parent node that will contain this node.
    pub fn precede(self, p: &mut Parser<'_>) -> Marker {
        let new_pos = p.events.len();
        p.events.push(Event::Placeholder);

        if let Event::Start { forward_parent, .. } = &mut p.events[self.pos] {
            *forward_parent = Some(new_pos);
        }

        Marker {
            pos: new_pos,
            completed: false,
        }
    }

    /// Re-report this node under `kind` without altering its children.
    pub fn project(self, p: &mut Parser<'_>, kind: SyntaxKind) -> CompletedMarker {
        if let Event::Start { kind: current, .. } = &mut p.events[self.pos] {
            *current = kind;
        }
        self
    }
}

/// Parse a Markdoc document from the beginning with default options.
pub fn parse(source: &str) -> Parse {
    parse_with(source, &ParseOptions::default(), ScannerState::default())
}

/// Parse with explicit options, starting from `state`.
///
/// Passing a [`Checkpoint::state`] together with the source from the
/// checkpoint's offset re-parses that region as it was parsed originally.
pub fn parse_with(source: &str, options: &ParseOptions, state: ScannerState) -> Parse {
    Parser::new(source, *options, state).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parser(source: &str) -> Parser<'_> {
        Parser::new(source, ParseOptions::default(), ScannerState::default())
    }

    #[test]
    fn parse_empty_input() {
        let tree = parse("").syntax();
        assert_eq!(tree.kind(), SyntaxKind::ROOT);
        assert_eq!(tree.children().count(), 0);
    }

    #[test]
    fn parse_preserves_all_text() {
        let input = "Hello, world!";
        assert_eq!(parse(input).syntax().text(), input);
    }

    #[test]
    fn parse_simple_paragraph() {
        let tree = parse("Hello").syntax();
        let para = tree.children().next().unwrap();
        assert_eq!(para.kind(), SyntaxKind::PARAGRAPH);
    }

    #[test]
    fn marker_must_be_completed() {
        let result = std::panic::catch_unwind(|| {
            let mut parser = parser("test");
            let _marker = parser.start();
            // Marker dropped without completion - should panic
        });
        assert!(result.is_err());
    }

    #[test]
    fn marker_can_be_abandoned() {
        let mut parser = parser("test");
        let marker = parser.start();
        marker.abandon(&mut parser);
        assert!(parser.events.is_empty());
    }

    #[test]
    fn project_renames_completed_node() {
        let mut p = parser("x");
        let m = p.start();
        p.bump();
        let done = m.complete(&mut p, SyntaxKind::PARAGRAPH);
        done.project(&mut p, SyntaxKind::LIST_PARAGRAPH);
        assert_eq!(p.events[0], Event::start(SyntaxKind::LIST_PARAGRAPH));
    }

    #[test]
    fn rewind_discards_events_and_errors() {
        let mut p = parser("abc def");
        let snapshot = p.snapshot();
        p.bump();
        p.error(ErrorKind::Expected, 0..1, "oops");
        p.rewind(snapshot);
        assert_eq!(p.pos(), 0);
        assert!(p.events.is_empty());
        assert!(p.errors.is_empty());
    }

    #[test]
    fn lookahead_follows_mode() {
        let mut p = parser("{% a=1 %}");
        assert_eq!(p.current(), SyntaxKind::TAG_START);
        assert_eq!(p.nth(2), SyntaxKind::TEXT);
        p.with_mode(Mode::Expr, |p| {
            assert_eq!(p.nth(2), SyntaxKind::IDENT);
            assert_eq!(p.nth(3), SyntaxKind::EQ);
        });
    }

    #[test]
    fn limit_cuts_off_lexing() {
        let mut p = parser("link text](url)");
        p.with_limit(9, |p| {
            while !p.at_end() {
                p.bump();
            }
            assert_eq!(p.current(), SyntaxKind::EOF);
        });
        assert_eq!(p.pos(), 9);
        assert_eq!(p.current(), SyntaxKind::R_BRACK);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let mut p = parser("\"open");
        p.with_mode(Mode::Expr, |p| p.bump());
        assert_eq!(p.errors.len(), 1);
        assert_eq!(p.errors[0].kind, ErrorKind::UnterminatedConstruct);
    }

    #[test]
    fn checkpoints_precede_top_level_blocks() {
        let parse = parse("# a\n\nb\n");
        let offsets: Vec<u32> = parse.checkpoints().iter().map(|c| c.offset.into()).collect();
        assert_eq!(offsets, vec![0, 4, 5]);
    }
}
