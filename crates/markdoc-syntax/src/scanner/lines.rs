//! Line-oriented predicates over raw source.
//!
//! Everything here is a pure function of `(source, offset)`. The scanner uses
//! these to classify terminals and the block grammar uses them to collect
//! candidate rules at a line start. Columns expand tabs to the next multiple
//! of the configured tab width.

use std::sync::OnceLock;

use regex::Regex;

use crate::lexer::{Mode, next_lexeme};
use crate::syntax_kind::SyntaxKind;

// The patterns below are literals, so `Regex::new` cannot fail on them.
fn comment_open() -> &'static Regex {
    static COMMENT_OPEN: OnceLock<Regex> = OnceLock::new();
    COMMENT_OPEN.get_or_init(|| {
        Regex::new(r"^\{%[ \t]*comment[ \t]*%\}").expect("Invalid comment open regex")
    })
}

fn comment_close() -> &'static Regex {
    static COMMENT_CLOSE: OnceLock<Regex> = OnceLock::new();
    COMMENT_CLOSE.get_or_init(|| {
        Regex::new(r"\{%[ \t]*/comment[ \t]*%\}").expect("Invalid comment close regex")
    })
}

fn delimiter_row() -> &'static Regex {
    static DELIMITER_ROW: OnceLock<Regex> = OnceLock::new();
    DELIMITER_ROW.get_or_init(|| {
        Regex::new(r"^[ \t]*\|?[ \t]*:?-+:?[ \t]*(\|[ \t]*:?-+:?[ \t]*)*\|?[ \t]*$")
            .expect("Invalid delimiter row regex")
    })
}

/// Offset of the first byte of the line containing `at`.
pub(crate) fn line_start(src: &str, at: usize) -> usize {
    src[..at].rfind('\n').map_or(0, |i| i + 1)
}

/// Offset of the `\n` ending the line containing `at`, or end of input.
pub(crate) fn line_end(src: &str, at: usize) -> usize {
    src[at..].find('\n').map_or(src.len(), |i| at + i)
}

/// Like [`line_end`] but excluding a `\r` before the `\n`.
pub(crate) fn content_end(src: &str, at: usize) -> usize {
    let end = line_end(src, at);
    if end > at && src.as_bytes()[end - 1] == b'\r' && end < src.len() {
        end - 1
    } else {
        end
    }
}

/// Offset of the first byte of the following line, or end of input.
pub(crate) fn next_line(src: &str, at: usize) -> usize {
    let end = line_end(src, at);
    if end < src.len() { end + 1 } else { end }
}

/// Length of the line terminator at `at`, if there is one.
pub(crate) fn newline_len(src: &str, at: usize) -> Option<usize> {
    let rest = &src.as_bytes()[at..];
    match rest {
        [b'\n', ..] => Some(1),
        [b'\r', b'\n', ..] => Some(2),
        _ => None,
    }
}

/// True when the line starting at `start` holds only spaces and tabs.
pub(crate) fn is_blank(src: &str, start: usize) -> bool {
    src[start..line_end(src, start)]
        .bytes()
        .all(|b| matches!(b, b' ' | b'\t' | b'\r'))
}

/// First offset at or after `at` that is not a space or tab.
pub(crate) fn skip_ws(src: &str, at: usize) -> usize {
    at + src[at..]
        .bytes()
        .take_while(|b| matches!(b, b' ' | b'\t'))
        .count()
}

/// Display column of `at`, counted from the start of its line.
pub(crate) fn column(src: &str, at: usize, tab_width: usize) -> usize {
    let start = line_start(src, at);
    src.as_bytes()[start..at]
        .iter()
        .fold(0, |col, &b| advance_col(col, b, tab_width))
}

fn advance_col(col: usize, byte: u8, tab_width: usize) -> usize {
    if byte == b'\t' {
        col + tab_width - col % tab_width
    } else {
        col + 1
    }
}

/// Width in columns of the whitespace between `from` and `to`, where `from`
/// sits at column `col`.
fn width(src: &str, from: usize, to: usize, col: usize, tab_width: usize) -> usize {
    src.as_bytes()[from..to]
        .iter()
        .fold(col, |c, &b| advance_col(c, b, tab_width))
        - col
}

/// Length of a bullet (`-`, `*`, `+`) or ordinal (`1.`, `2)`) marker at `at`.
///
/// The marker must be followed by a space, tab or end of line.
pub(crate) fn list_marker(src: &str, at: usize) -> Option<usize> {
    let bytes = &src.as_bytes()[at..];
    let len = match bytes.first()? {
        b'-' | b'*' | b'+' => 1,
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > 9 || !matches!(bytes.get(digits), Some(b'.' | b')')) {
                return None;
            }
            digits + 1
        }
        _ => return None,
    };
    match bytes.get(len) {
        None | Some(b' ' | b'\t' | b'\r' | b'\n') => Some(len),
        _ => None,
    }
}

/// True when the line content beginning at `at` (after indentation) is a list
/// item rather than a thematic break.
pub(crate) fn is_list_marker_line(src: &str, at: usize, tab_width: usize) -> bool {
    let first = skip_ws(src, at);
    list_marker(src, first).is_some() && thematic_break_len(src, first, tab_width).is_none()
}

/// Column where a list item's content starts.
///
/// One to four spaces after the marker set the content column directly; no
/// space or more than four count as a single space.
pub(crate) fn content_column(src: &str, marker: usize, marker_len: usize, tab_width: usize) -> usize {
    let end = marker + marker_len;
    let marker_end = column(src, end, tab_width);
    let text = skip_ws(src, end);
    if newline_len(src, text).is_some() || text >= src.len() {
        return marker_end + 1;
    }
    match width(src, end, text, marker_end, tab_width) {
        w @ 1..=4 => marker_end + w,
        _ => marker_end + 1,
    }
}

/// Length of a thematic break starting at `at`, including up to three columns
/// of indentation and any trailing whitespace.
pub(crate) fn thematic_break_len(src: &str, at: usize, tab_width: usize) -> Option<usize> {
    let first = skip_ws(src, at);
    let col = column(src, at, tab_width);
    if width(src, at, first, col, tab_width) > 3 {
        return None;
    }
    let end = content_end(src, at);
    let marker = *src.as_bytes().get(first)?;
    if !matches!(marker, b'*' | b'-' | b'_') {
        return None;
    }
    let mut count = 0;
    for &b in &src.as_bytes()[first..end] {
        match b {
            b' ' | b'\t' => {}
            b if b == marker => count += 1,
            _ => return None,
        }
    }
    (count >= 3).then_some(end - at)
}

/// Length of an ATX heading marker at `at`: one to six `#` plus trailing
/// spaces or tabs. An empty heading (`#` at end of line) is accepted.
pub(crate) fn heading_marker_len(src: &str, at: usize) -> Option<usize> {
    let bytes = &src.as_bytes()[at..];
    let hashes = bytes.iter().take_while(|&&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    match bytes.get(hashes) {
        None | Some(b'\r' | b'\n') => Some(hashes),
        Some(b' ' | b'\t') => Some(skip_ws(src, at + hashes) - at),
        _ => None,
    }
}

/// Fence character and run length of an opening fence at `at`.
pub(crate) fn fence_run(src: &str, at: usize) -> Option<(u8, usize)> {
    let bytes = &src.as_bytes()[at..];
    let ch = *bytes.first()?;
    if !matches!(ch, b'`' | b'~') {
        return None;
    }
    let run = bytes.iter().take_while(|&&b| b == ch).count();
    if run < 3 {
        return None;
    }
    let info = &src[at + run..content_end(src, at)];
    if ch == b'`' && info.contains('`') {
        return None;
    }
    Some((ch, run))
}

/// True when `at` (after indentation) opens a blockquote line.
pub(crate) fn is_blockquote_line(src: &str, at: usize) -> bool {
    src.as_bytes().get(skip_ws(src, at)) == Some(&b'>')
}

/// Tag name of an HTML block opener (`<div`, `</p`) at `at`.
pub(crate) fn html_block_name(src: &str, at: usize) -> Option<&str> {
    let rest = src[at..].strip_prefix('<')?;
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    let name_len = rest
        .bytes()
        .enumerate()
        .take_while(|&(i, b)| b.is_ascii_alphabetic() || (i > 0 && (b.is_ascii_digit() || b == b'-')))
        .count();
    if name_len == 0 {
        return None;
    }
    match rest.as_bytes().get(name_len) {
        None | Some(b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/') => Some(&rest[..name_len]),
        _ => None,
    }
}

/// Offset just past `</name>` (case-insensitive) between `from` and `to`.
pub(crate) fn find_html_close(src: &str, name: &str, from: usize, to: usize) -> Option<usize> {
    let hay = &src[from..to];
    let mut search = 0;
    while let Some(i) = hay[search..].find("</") {
        let open = search + i + 2;
        let candidate = &hay[open..];
        if candidate.len() >= name.len()
            && candidate.is_char_boundary(name.len())
            && candidate[..name.len()].eq_ignore_ascii_case(name)
        {
            let after = open + name.len();
            let gt = after + hay[after..].bytes().take_while(|b| matches!(b, b' ' | b'\t')).count();
            if hay.as_bytes().get(gt) == Some(&b'>') {
                return Some(from + gt + 1);
            }
        }
        search = open;
    }
    None
}

/// True when `at` opens a `{% comment %}` block.
pub(crate) fn is_comment_open(src: &str, at: usize) -> bool {
    comment_open().is_match(&src[at..])
}

/// Offset just past the matching `{% /comment %}`.
pub(crate) fn find_comment_close(src: &str, from: usize) -> Option<usize> {
    comment_close().find(&src[from..]).map(|m| from + m.end())
}

/// True when the line starting at `at` is a pipe-table delimiter row.
pub(crate) fn is_delimiter_row(src: &str, at: usize) -> bool {
    let line = &src[at..content_end(src, at)];
    line.contains('|') && delimiter_row().is_match(line)
}

/// True when the line at `at` opens a pipe table: it holds a `|` and the
/// following line is a delimiter row.
pub(crate) fn is_pipe_table_start(src: &str, at: usize) -> bool {
    let line = &src[at..content_end(src, at)];
    let next = next_line(src, at);
    line.contains('|') && !is_blank(src, at) && next < src.len() && is_delimiter_row(src, next)
}

/// Offset of the next unescaped `|` in `from..to`, or `to`.
pub(crate) fn next_pipe(src: &str, from: usize, to: usize) -> usize {
    let bytes = src.as_bytes();
    let mut i = from;
    while i < to {
        match bytes[i] {
            b'\\' => i += 2,
            b'|' => return i,
            _ => i += 1,
        }
    }
    to
}

/// Length of a possibly hyphenated name (`data-id`) at `at`.
pub(crate) fn name_len(src: &str, at: usize) -> usize {
    let bytes = &src.as_bytes()[at..];
    if !bytes.first().is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') {
        return 0;
    }
    let mut len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-'))
        .count();
    while bytes[len - 1] == b'-' {
        len -= 1;
    }
    len
}

/// Shape of a `{% ... %}` header found by lexing ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TagProbe<'s> {
    pub name: Option<&'s str>,
    pub closing: bool,
    pub self_closing: bool,
    /// Offset just past `%}` or `/%}`.
    pub end: usize,
    /// Nothing but whitespace follows the header on its last line.
    pub standalone: bool,
}

/// Look for a tag header at `at` (after indentation).
///
/// Returns `None` when there is no `{%` or it is not terminated before the
/// next blank line, another tag opener, or end of input.
pub(crate) fn probe_tag(src: &str, at: usize) -> Option<TagProbe<'_>> {
    let start = skip_ws(src, at);
    if !src[start..].starts_with("{%") {
        return None;
    }
    let mut pos = skip_trivia(src, start + 2);
    let mut closing = false;
    if src[pos..].starts_with('/') && !src[pos..].starts_with("/%}") {
        closing = true;
        pos = skip_trivia(src, pos + 1);
    }

    let mut name = None;
    if let Some(len) = tag_name_len(src, pos) {
        name = Some(&src[pos..pos + len]);
        pos += len;
    }

    loop {
        let lexeme = next_lexeme(Mode::Expr, &src[pos..]);
        match lexeme.kind {
            SyntaxKind::TAG_END | SyntaxKind::SELF_CLOSE_END => {
                let end = pos + lexeme.len;
                let standalone = src[end..content_end(src, end)]
                    .bytes()
                    .all(|b| matches!(b, b' ' | b'\t'));
                return Some(TagProbe {
                    name,
                    closing,
                    self_closing: lexeme.kind == SyntaxKind::SELF_CLOSE_END,
                    end,
                    standalone,
                });
            }
            SyntaxKind::EOF | SyntaxKind::TAG_START | SyntaxKind::INTERP_START => return None,
            SyntaxKind::NEWLINE if is_blank(src, pos + lexeme.len) => return None,
            _ if lexeme.unterminated => return None,
            _ => pos += lexeme.len,
        }
    }
}

/// A `{%` header at `at` that is still open at end of input, either
/// because no `%}` follows or because a string inside it never closes.
/// A blank line on the way means the text is prose, not a header.
pub(crate) fn is_unterminated_tag(src: &str, at: usize) -> bool {
    let start = skip_ws(src, at);
    if !src[start..].starts_with("{%") {
        return false;
    }
    let mut pos = start + 2;
    loop {
        let lexeme = next_lexeme(Mode::Expr, &src[pos..]);
        match lexeme.kind {
            SyntaxKind::EOF => return true,
            _ if lexeme.unterminated => return true,
            SyntaxKind::TAG_END | SyntaxKind::SELF_CLOSE_END => return false,
            SyntaxKind::TAG_START | SyntaxKind::INTERP_START => return false,
            SyntaxKind::NEWLINE if pos + lexeme.len < src.len() && is_blank(src, pos + lexeme.len) => {
                return false;
            }
            _ => pos += lexeme.len,
        }
    }
}

/// Length of an attribute name at `at`, when `=` follows it.
pub(crate) fn attribute_name_len(src: &str, at: usize) -> Option<usize> {
    let len = name_len(src, at);
    if len == 0 {
        return None;
    }
    let after = skip_trivia(src, at + len);
    (next_lexeme(Mode::Expr, &src[after..]).kind == SyntaxKind::EQ).then_some(len)
}

/// Length of a tag name at `at`: a name that is neither an attribute nor a
/// keyword literal.
pub(crate) fn tag_name_len(src: &str, at: usize) -> Option<usize> {
    let len = name_len(src, at);
    let is_keyword = matches!(&src[at..at + len], "true" | "false" | "null");
    (len > 0 && !is_keyword && attribute_name_len(src, at).is_none()).then_some(len)
}

fn skip_trivia(src: &str, mut at: usize) -> usize {
    loop {
        let lexeme = next_lexeme(Mode::Expr, &src[at..]);
        if !lexeme.kind.is_trivia() || lexeme.len == 0 {
            return at;
        }
        at += lexeme.len;
    }
}

/// True when the line content at `at` is a tag header standing alone on its
/// line, the shape that starts or ends a block tag.
pub(crate) fn is_block_tag_line(src: &str, at: usize) -> bool {
    probe_tag(src, at).is_some_and(|t| t.standalone && (t.name.is_some() || t.closing))
}

/// True when the line content at `at` is a standalone closing tag.
pub(crate) fn is_close_tag_line(src: &str, at: usize) -> bool {
    probe_tag(src, at).is_some_and(|t| t.standalone && t.closing)
}

/// True when the line content at `at` starts a block that ends a paragraph.
pub(crate) fn interrupts_paragraph(src: &str, at: usize, tab_width: usize) -> bool {
    let first = skip_ws(src, at);
    heading_marker_len(src, first).is_some()
        || fence_run(src, first).is_some()
        || is_blockquote_line(src, first)
        || thematic_break_len(src, at, tab_width).is_some()
        || is_list_marker_line(src, first, tab_width)
        || is_block_tag_line(src, first)
        || is_unterminated_tag(src, first)
}
