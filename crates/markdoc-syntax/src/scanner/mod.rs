//! # Scanner - Context-Sensitive Terminals
//!
//! Some Markdoc terminals cannot be recognised from the characters at the
//! cursor alone. Whether a line break is a soft break or the end of a block
//! depends on the next line; whether `*` opens emphasis depends on the
//! characters on both sides of the whole delimiter run; whether a line of
//! backticks closes a fence depends on the fence that opened it.
//!
//! The [`Scanner`] handles these. Every call is a pure function of
//! `(state, cursor, valid)`:
//!
//! ```text
//! scan(&ScannerState, cursor, &[SyntaxKind]) -> Option<Scanned { kind, len, state, terminated }>
//! ```
//!
//! The caller names the kinds it can accept at this point of the grammar, the
//! scanner tries them in a fixed priority order and returns the first match
//! together with the successor state. Nothing is mutated, so a caller can
//! probe freely and an external engine can drive the scanner from any saved
//! [`ScannerState`].
//!
//! ```
//! use markdoc_syntax::scanner::{Scanner, ScannerState};
//! use markdoc_syntax::{ParseOptions, SyntaxKind};
//!
//! let source = "one\ntwo\n\nthree";
//! let scanner = Scanner::new(source, ParseOptions::default());
//! let state = ScannerState::default();
//!
//! let valid = [SyntaxKind::SOFT_BREAK, SyntaxKind::NEWLINE];
//! let first = scanner.scan(&state, 3, &valid).unwrap();
//! assert_eq!(first.kind, SyntaxKind::SOFT_BREAK);
//!
//! let second = scanner.scan(&state, 7, &valid).unwrap();
//! assert_eq!(second.kind, SyntaxKind::NEWLINE);
//! ```

pub(crate) mod lines;
mod state;

pub use state::{Fence, ListFrame, ScannerState};

use log::trace;

use crate::options::ParseOptions;
use crate::syntax_kind::SyntaxKind;
use lines::{
    column, content_column, content_end, fence_run, find_comment_close, html_block_name,
    interrupts_paragraph, is_blank, is_close_tag_line, is_comment_open, is_list_marker_line,
    line_start, list_marker, newline_len, next_line, skip_ws, thematic_break_len,
};

/// Priority order used when several valid kinds could match.
const ORDER: &[SyntaxKind] = &[
    SyntaxKind::FRONTMATTER_DELIM,
    SyntaxKind::YAML,
    SyntaxKind::CODE_CONTENT,
    SyntaxKind::FENCE,
    SyntaxKind::COMMENT_TEXT,
    SyntaxKind::HTML_COMMENT_TEXT,
    SyntaxKind::HTML_TEXT,
    SyntaxKind::HORIZONTAL_RULE,
    SyntaxKind::DEDENT,
    SyntaxKind::INDENT,
    SyntaxKind::LIST_MARKER,
    SyntaxKind::BLANK_LINE,
    SyntaxKind::LIST_CONTINUATION,
    SyntaxKind::SOFT_BREAK,
    SyntaxKind::NEWLINE,
    SyntaxKind::STRONG_CLOSE,
    SyntaxKind::EMPHASIS_CLOSE,
    SyntaxKind::STRONG_OPEN,
    SyntaxKind::EMPHASIS_OPEN,
];

/// A terminal recognised by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned {
    pub kind: SyntaxKind,
    /// Byte length; zero for `INDENT` and `DEDENT`.
    pub len: usize,
    /// State after consuming the token.
    pub state: ScannerState,
    /// False when the construct ran into end of input without closing.
    pub terminated: bool,
}

/// Context-sensitive tokenizer over one source text.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'s> {
    source: &'s str,
    options: ParseOptions,
}

impl<'s> Scanner<'s> {
    pub fn new(source: &'s str, options: ParseOptions) -> Self {
        Self { source, options }
    }

    /// Try each kind in `valid` at `cursor`, highest priority first.
    pub fn scan(&self, state: &ScannerState, cursor: usize, valid: &[SyntaxKind]) -> Option<Scanned> {
        if cursor > self.source.len() {
            return None;
        }
        for &kind in ORDER.iter().filter(|k| valid.contains(k)) {
            if let Some(mut scanned) = self.try_kind(kind, state, cursor) {
                if scanned.len > 0 && !kind.is_trivia() {
                    scanned.state.mark_emitted();
                }
                trace!("scanned {:?} len {} at {}", scanned.kind, scanned.len, cursor);
                return Some(scanned);
            }
        }
        None
    }

    fn try_kind(&self, kind: SyntaxKind, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        match kind {
            SyntaxKind::FRONTMATTER_DELIM => self.frontmatter_delim(state, cursor),
            SyntaxKind::YAML => self.yaml(state, cursor),
            SyntaxKind::CODE_CONTENT => self.code_content(state, cursor),
            SyntaxKind::FENCE => self.fence(state, cursor),
            SyntaxKind::COMMENT_TEXT => self.comment_text(state, cursor),
            SyntaxKind::HTML_COMMENT_TEXT => self.html_comment(state, cursor),
            SyntaxKind::HTML_TEXT => self.html_text(state, cursor),
            SyntaxKind::HORIZONTAL_RULE => {
                let len = thematic_break_len(self.source, cursor, self.options.tab_width)?;
                Some(token(kind, len, state.clone()))
            }
            SyntaxKind::DEDENT => self.dedent(state, cursor),
            SyntaxKind::INDENT => self.indent(state, cursor),
            SyntaxKind::LIST_MARKER => self.list_marker(state, cursor),
            SyntaxKind::BLANK_LINE => self.blank_line(state, cursor),
            SyntaxKind::LIST_CONTINUATION => self.list_continuation(state, cursor),
            SyntaxKind::SOFT_BREAK => self.soft_break(state, cursor),
            SyntaxKind::NEWLINE => {
                let len = newline_len(self.source, cursor)?;
                Some(token(kind, len, state.clone()))
            }
            SyntaxKind::STRONG_CLOSE
            | SyntaxKind::EMPHASIS_CLOSE
            | SyntaxKind::STRONG_OPEN
            | SyntaxKind::EMPHASIS_OPEN => self.emphasis(kind, state, cursor),
            _ => None,
        }
    }

    fn at_line_start(&self, cursor: usize) -> bool {
        line_start(self.source, cursor) == cursor
    }

    fn frontmatter_delim(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        if !self.at_line_start(cursor) || !is_delim_line(self.source, cursor) {
            return None;
        }
        let mut next = state.clone();
        if state.in_frontmatter {
            next.in_frontmatter = false;
            return Some(token(SyntaxKind::FRONTMATTER_DELIM, 3, next));
        }
        if !self.options.frontmatter || state.emitted_any {
            return None;
        }
        self.frontmatter_close(next_line(self.source, cursor))?;
        next.in_frontmatter = true;
        Some(token(SyntaxKind::FRONTMATTER_DELIM, 3, next))
    }

    /// Start of the first `---` line at or after `from`.
    fn frontmatter_close(&self, from: usize) -> Option<usize> {
        let mut at = from;
        while at < self.source.len() {
            if is_delim_line(self.source, at) {
                return Some(at);
            }
            at = next_line(self.source, at);
        }
        None
    }

    fn yaml(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        if !state.in_frontmatter || !self.at_line_start(cursor) {
            return None;
        }
        match self.frontmatter_close(cursor) {
            Some(close) if close > cursor => Some(token(SyntaxKind::YAML, close - cursor, state.clone())),
            Some(_) => None,
            None if cursor < self.source.len() => Some(Scanned {
                kind: SyntaxKind::YAML,
                len: self.source.len() - cursor,
                state: state.clone(),
                terminated: false,
            }),
            None => None,
        }
    }

    /// Run length of a fence on the line at `at` that closes `fence`, measured from the
    /// first non-blank character.
    fn closing_fence(&self, state: &ScannerState, fence: Fence, at: usize) -> Option<usize> {
        let first = skip_ws(self.source, at);
        if column(self.source, first, self.options.tab_width) > state.content_col() + 3 {
            return None;
        }
        let bytes = &self.source.as_bytes()[first..];
        let run = bytes.iter().take_while(|&&b| b == fence.ch).count();
        if run < fence.len {
            return None;
        }
        let rest = &self.source[first + run..content_end(self.source, first)];
        rest.bytes().all(|b| matches!(b, b' ' | b'\t')).then_some(run)
    }

    fn fence(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        let mut next = state.clone();
        match state.fence {
            Some(open) => {
                let run = self.closing_fence(state, open, cursor)?;
                if skip_ws(self.source, cursor) != cursor {
                    return None;
                }
                next.fence = None;
                Some(token(SyntaxKind::FENCE, run, next))
            }
            None => {
                let (ch, len) = fence_run(self.source, cursor)?;
                next.fence = Some(Fence { ch, len });
                Some(token(SyntaxKind::FENCE, len, next))
            }
        }
    }

    fn code_content(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        let fence = state.fence?;
        if !self.at_line_start(cursor) {
            return None;
        }
        let mut at = cursor;
        while at < self.source.len() {
            if self.closing_fence(state, fence, at).is_some() {
                return (at > cursor).then(|| token(SyntaxKind::CODE_CONTENT, at - cursor, state.clone()));
            }
            at = next_line(self.source, at);
        }
        (cursor < self.source.len()).then(|| Scanned {
            kind: SyntaxKind::CODE_CONTENT,
            len: self.source.len() - cursor,
            state: state.clone(),
            terminated: false,
        })
    }

    fn comment_text(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        if !is_comment_open(self.source, cursor) {
            return None;
        }
        Some(self.run_to(SyntaxKind::COMMENT_TEXT, state, cursor, find_comment_close(self.source, cursor)))
    }

    fn html_comment(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        if !self.source[cursor..].starts_with("<!--") {
            return None;
        }
        let end = self.source[cursor + 4..].find("-->").map(|i| cursor + 4 + i + 3);
        Some(self.run_to(SyntaxKind::HTML_COMMENT_TEXT, state, cursor, end))
    }

    /// Token from `cursor` to `end`, or to end of input when `end` is unknown.
    fn run_to(&self, kind: SyntaxKind, state: &ScannerState, cursor: usize, end: Option<usize>) -> Scanned {
        Scanned {
            kind,
            len: end.unwrap_or(self.source.len()) - cursor,
            state: state.clone(),
            terminated: end.is_some(),
        }
    }

    fn html_text(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        if self.source[cursor..].starts_with("<!--") {
            return None;
        }
        let name = html_block_name(self.source, cursor)?;

        // The block's extent: up to the last non-blank line before a blank
        // line or end of input.
        let mut region_end = content_end(self.source, cursor);
        let mut at = next_line(self.source, cursor);
        while at < self.source.len() && !is_blank(self.source, at) {
            region_end = content_end(self.source, at);
            at = next_line(self.source, at);
        }

        let end = match lines::find_html_close(self.source, name, cursor + 1, region_end) {
            Some(close) => content_end(self.source, close.saturating_sub(1)),
            None => region_end,
        };
        Some(token(SyntaxKind::HTML_TEXT, end - cursor, state.clone()))
    }

    fn indent(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        if !self.at_line_start(cursor) {
            return None;
        }
        let tab = self.options.tab_width;
        let first = skip_ws(self.source, cursor);
        if !is_list_marker_line(self.source, first, tab) {
            return None;
        }
        let col = column(self.source, first, tab);
        if state.lists.last().is_some_and(|top| col <= top.marker_col) {
            return None;
        }
        let marker_len = list_marker(self.source, first)?;
        let mut next = state.clone();
        next.lists.push(ListFrame {
            marker_col: col,
            content_col: content_column(self.source, first, marker_len, tab),
        });
        Some(token(SyntaxKind::INDENT, 0, next))
    }

    fn dedent(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        let top = *state.lists.last()?;
        let tab = self.options.tab_width;

        let mut at = cursor;
        while at < self.source.len() && is_blank(self.source, at) {
            at = next_line(self.source, at);
        }
        if at < self.source.len() {
            let first = skip_ws(self.source, at);
            let sibling = is_list_marker_line(self.source, first, tab)
                && column(self.source, first, tab) == top.marker_col;
            if sibling {
                return None;
            }
        }
        let mut next = state.clone();
        next.lists.pop();
        Some(token(SyntaxKind::DEDENT, 0, next))
    }

    fn list_marker(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        let tab = self.options.tab_width;
        let len = list_marker(self.source, cursor)?;
        if thematic_break_len(self.source, cursor, tab).is_some() {
            return None;
        }
        let mut next = state.clone();
        if let Some(top) = next.lists.last_mut() {
            top.content_col = content_column(self.source, cursor, len, tab);
        }
        Some(token(SyntaxKind::LIST_MARKER, len, next))
    }

    fn blank_line(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        if !self.at_line_start(cursor) {
            return None;
        }
        let mut at = cursor;
        while at < self.source.len() && is_blank(self.source, at) {
            at = next_line(self.source, at);
        }
        (at > cursor).then(|| token(SyntaxKind::BLANK_LINE, at - cursor, state.clone()))
    }

    /// A line inside the current list item: indented to at least its content
    /// column and not itself a list marker.
    fn continues_item(&self, state: &ScannerState, line: usize) -> Option<usize> {
        let tab = self.options.tab_width;
        let top = state.lists.last()?;
        if line >= self.source.len() || is_blank(self.source, line) {
            return None;
        }
        let first = skip_ws(self.source, line);
        if column(self.source, first, tab) < top.content_col
            || is_list_marker_line(self.source, first, tab)
            || is_close_tag_line(self.source, first)
        {
            return None;
        }
        Some(first)
    }

    fn list_continuation(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        let tab = self.options.tab_width;
        let len = match newline_len(self.source, cursor) {
            Some(nl) if !self.at_line_start(cursor) => {
                let line = cursor + nl;
                let first = self.continues_item(state, line)?;
                if interrupts_paragraph(self.source, line, tab) {
                    return None;
                }
                first - cursor
            }
            Some(_) => return None,
            None if self.at_line_start(cursor) => self.continues_item(state, cursor)? - cursor,
            None => return None,
        };
        Some(token(SyntaxKind::LIST_CONTINUATION, len, state.clone()))
    }

    fn soft_break(&self, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        let nl = newline_len(self.source, cursor)?;
        let line = cursor + nl;
        if line >= self.source.len()
            || is_blank(self.source, line)
            || interrupts_paragraph(self.source, line, self.options.tab_width)
        {
            return None;
        }
        Some(token(SyntaxKind::SOFT_BREAK, nl, state.clone()))
    }

    fn emphasis(&self, kind: SyntaxKind, state: &ScannerState, cursor: usize) -> Option<Scanned> {
        let bytes = self.source.as_bytes();
        let ch = *bytes.get(cursor)?;
        if !matches!(ch, b'*' | b'_') {
            return None;
        }
        let run_start = cursor - bytes[..cursor].iter().rev().take_while(|&&b| b == ch).count();
        let run_end = cursor + bytes[cursor..].iter().take_while(|&&b| b == ch).count();

        let before = self.source[..run_start].chars().next_back();
        let after = self.source[run_end..].chars().next();
        let flank = Flanking::of(before, after);
        let (can_open, can_close) = if ch == b'_' {
            (
                flank.left && (!flank.right || before.is_some_and(is_punctuation)),
                flank.right && (!flank.left || after.is_some_and(is_punctuation)),
            )
        } else {
            (flank.left, flank.right)
        };

        let remaining = run_end - cursor;
        let ok = match kind {
            SyntaxKind::STRONG_CLOSE => can_close && remaining >= 2,
            SyntaxKind::EMPHASIS_CLOSE => can_close,
            SyntaxKind::STRONG_OPEN => can_open && remaining >= 2,
            SyntaxKind::EMPHASIS_OPEN => can_open,
            _ => false,
        };
        let len = if matches!(kind, SyntaxKind::STRONG_CLOSE | SyntaxKind::STRONG_OPEN) {
            2
        } else {
            1
        };
        ok.then(|| token(kind, len, state.clone()))
    }
}

fn token(kind: SyntaxKind, len: usize, state: ScannerState) -> Scanned {
    Scanned {
        kind,
        len,
        state,
        terminated: true,
    }
}

/// A `---` line with nothing but trailing whitespace.
fn is_delim_line(src: &str, at: usize) -> bool {
    src[at..content_end(src, at)].trim_end_matches([' ', '\t']) == "---"
}

/// CommonMark left/right flanking of a delimiter run. Start and end of input
/// count as whitespace.
struct Flanking {
    left: bool,
    right: bool,
}

impl Flanking {
    fn of(before: Option<char>, after: Option<char>) -> Self {
        let before_ws = before.is_none_or(char::is_whitespace);
        let after_ws = after.is_none_or(char::is_whitespace);
        let before_punct = before.is_some_and(is_punctuation);
        let after_punct = after.is_some_and(is_punctuation);
        Self {
            left: !after_ws && (!after_punct || before_ws || before_punct),
            right: !before_ws && (!before_punct || after_ws || after_punct),
        }
    }
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace())
}
