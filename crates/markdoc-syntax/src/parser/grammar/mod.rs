//! # Grammar Rules
//!
//! This module contains the grammar rules that drive parsing. Each function
//! takes a `&mut Parser` and uses its methods to:
//!
//! 1. Inspect the current lexeme (`p.current()`, `p.at()`, `p.nth()`)
//! 2. Ask the scanner for context-sensitive terminals (`p.scan()`)
//! 3. Consume (`p.bump()`, `p.eat()`, `p.bump_scanned()`)
//! 4. Build tree structure (`p.start()` → marker → `complete()`/`abandon()`)
//!
//! ## Module Structure
//!
//! - [`block`] - Block selection and the line-oriented blocks
//! - [`tag`] - `{% %}` headers, tag blocks and conditionals
//! - [`table`] - Pipe tables and `{% table %}`
//! - [`inline`] - Emphasis, code spans, links, interpolation
//! - [`expression`] - Values inside tags and `{{ }}`
//!
//! ## Writing Grammar Rules
//!
//! A typical grammar function looks like:
//!
//! ```ignore
//! fn thematic_break(p: &mut Parser) {
//!     let m = p.start();                                  // 1. Start a node
//!     if let Some(rule) = p.scan(&[HORIZONTAL_RULE]) {    // 2. Ask the scanner
//!         p.bump_scanned(rule);                           // 3. Consume
//!     }
//!     p.eat(SyntaxKind::NEWLINE);
//!     m.complete(p, SyntaxKind::THEMATIC_BREAK);          // 4. Complete the node
//! }
//! ```
//!
//! ## Error Recovery
//!
//! Grammar functions are lenient and produce a tree for any input:
//!
//! - Unexpected lexemes are wrapped in an `ERROR` node (`p.err_and_bump()`)
//! - A missing piece leaves an empty `ERROR` node (`p.missing()`)
//! - Constructs cut off by end of input are closed where they stand
//!
//! Every recovery records a [`SyntaxError`](crate::SyntaxError). The tree
//! always preserves all input bytes.

mod block;
mod expression;
mod inline;
mod table;
mod tag;

use crate::error::ErrorKind;
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse the root document.
///
/// This is the entry point for parsing. It creates a ROOT node containing
/// all top-level blocks in the document. When parsing resumes from a saved
/// state inside a fence or frontmatter, the open construct is finished first.
pub fn root(p: &mut Parser<'_>) {
    let m = p.start();

    if p.state().fence().is_some() {
        block::resume_fence(p);
    } else if p.state().in_frontmatter() {
        block::resume_frontmatter(p);
    }

    while !p.at_end() {
        p.checkpoint();
        let before = p.pos();
        block::block(p);
        if p.pos() == before {
            p.err_and_bump("unexpected input");
        }
    }

    m.complete(p, SyntaxKind::ROOT);
}

/// Parse blocks until a line for which `stop` holds, or end of input.
pub(super) fn blocks_until(p: &mut Parser<'_>, stop: impl Fn(&Parser<'_>) -> bool) {
    while !p.at_end() && !stop(p) {
        let before = p.pos();
        block::block(p);
        if p.pos() == before {
            p.err_and_bump("unexpected input");
        }
    }
}

/// Wrap the rest of the current line in an `ERROR` node.
pub(super) fn error_line(p: &mut Parser<'_>, kind: ErrorKind, message: &str) {
    let start = p.pos();
    let end = crate::scanner::lines::line_end(p.source(), start);
    let m = p.start();
    p.bump_raw(end - start, SyntaxKind::TEXT);
    p.eat(SyntaxKind::NEWLINE);
    p.error(kind, start..end, message);
    m.complete(p, SyntaxKind::ERROR);
}
