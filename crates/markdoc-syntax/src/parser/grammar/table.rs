//! Pipe tables and `{% table %}` blocks.
//!
//! Both forms produce the same inner shape so consumers never need to know
//! which syntax the author used:
//!
//! ```text
//! TABLE_HEADER (TABLE_CELL)*
//! TABLE_SEPARATOR
//! TABLE_ROW (TABLE_CELL)*
//! ...
//! ```

use crate::error::ErrorKind;
use crate::parser::{CompletedMarker, Parser};
use crate::scanner::lines::{
    content_end, interrupts_paragraph, is_blank, is_list_marker_line, list_marker, next_pipe, skip_ws,
    thematic_break_len,
};
use crate::syntax_kind::SyntaxKind;

use super::{error_line, inline, tag};

/// `| a | b |` header, delimiter row, then body rows until a line without
/// a pipe or one that starts another block.
pub(super) fn pipe_table(p: &mut Parser<'_>) {
    let m = p.start();

    pipe_row(p).project(p, SyntaxKind::TABLE_HEADER);
    delimiter_row(p);
    while at_body_row(p) {
        pipe_row(p);
    }

    m.complete(p, SyntaxKind::PIPE_TABLE);
}

fn at_body_row(p: &Parser<'_>) -> bool {
    let src = p.source();
    let line = p.pos();
    !p.at_end()
        && !is_blank(src, line)
        && src[line..content_end(src, line)].contains('|')
        && !interrupts_paragraph(src, line, p.options().tab_width)
}

fn pipe_row(p: &mut Parser<'_>) -> CompletedMarker {
    let m = p.start();
    let end = content_end(p.source(), p.pos());

    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::PIPE);
    while p.pos() < end {
        let cell_end = next_pipe(p.source(), p.pos(), end);
        let rest = &p.source()[p.pos()..cell_end];
        if cell_end == end && rest.trim_matches([' ', '\t']).is_empty() {
            p.bump_raw(end - p.pos(), SyntaxKind::WHITESPACE);
            break;
        }
        pipe_cell(p, cell_end);
        p.eat(SyntaxKind::PIPE);
    }
    p.eat(SyntaxKind::NEWLINE);

    m.complete(p, SyntaxKind::TABLE_ROW)
}

fn pipe_cell(p: &mut Parser<'_>, end: usize) {
    let m = p.start();
    p.with_limit(end, |p| {
        while !p.at_end() {
            inline::inline_item(p);
        }
    });
    m.complete(p, SyntaxKind::TABLE_CELL);
}

/// `|---|:--:|`
fn delimiter_row(p: &mut Parser<'_>) {
    let m = p.start();
    let end = content_end(p.source(), p.pos());

    while p.pos() < end {
        let src = p.source();
        let at = p.pos();
        match src.as_bytes()[at] {
            b'|' => p.bump_raw(1, SyntaxKind::PIPE),
            b' ' | b'\t' => p.bump_raw(skip_ws(src, at).min(end) - at, SyntaxKind::WHITESPACE),
            _ => {
                let len = src[at..end].find(['|', ' ', '\t']).unwrap_or(end - at);
                p.bump_raw(len, SyntaxKind::TABLE_DELIMITER);
            }
        }
    }
    p.eat(SyntaxKind::NEWLINE);

    m.complete(p, SyntaxKind::TABLE_SEPARATOR);
}

/// `{% table %}` with list-marker cells and `---` row separators.
pub(super) fn tag_table(p: &mut Parser<'_>) {
    let m = p.start();
    let open = tag::header_line(p);

    if open.kind == SyntaxKind::TAG_OPEN && open.terminated {
        let mut first_row = true;
        while !p.at_end() && !tag::at_close_line(p) {
            if let Some(blank) = p.scan(&[SyntaxKind::BLANK_LINE]) {
                p.bump_scanned(blank);
            } else if thematic_break_len(p.source(), p.pos(), p.options().tab_width).is_some() {
                separator(p);
            } else if at_cell(p, p.pos()) {
                let row = cell_row(p);
                if first_row && at_separator(p) {
                    row.project(p, SyntaxKind::TABLE_HEADER);
                }
                first_row = false;
            } else {
                error_line(p, ErrorKind::StructuralMismatch, "expected a table cell or `---`");
            }
        }
        tag::close_line(p, Some("table"));
    }

    m.complete(p, SyntaxKind::TAG_TABLE);
}

fn at_cell(p: &Parser<'_>, line: usize) -> bool {
    line < p.source().len() && is_list_marker_line(p.source(), line, p.options().tab_width)
}

fn at_separator(p: &Parser<'_>) -> bool {
    !p.at_end() && thematic_break_len(p.source(), p.pos(), p.options().tab_width).is_some()
}

fn separator(p: &mut Parser<'_>) {
    let m = p.start();
    if let Some(rule) = p.scan(&[SyntaxKind::HORIZONTAL_RULE]) {
        p.bump_scanned(rule);
    }
    p.eat(SyntaxKind::NEWLINE);
    m.complete(p, SyntaxKind::TABLE_SEPARATOR);
}

/// Consecutive cell lines, allowing blank lines between cells.
fn cell_row(p: &mut Parser<'_>) -> CompletedMarker {
    let m = p.start();
    loop {
        tag_cell(p);
        let blank = p.scan(&[SyntaxKind::BLANK_LINE]);
        let next = p.pos() + blank.as_ref().map_or(0, |b| b.len);
        if !at_cell(p, next) {
            break;
        }
        if let Some(blank) = blank {
            p.bump_scanned(blank);
        }
    }
    m.complete(p, SyntaxKind::TABLE_ROW)
}

/// `* content`, possibly with an annotation such as `{% colspan=2 %}`.
fn tag_cell(p: &mut Parser<'_>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    let marker = list_marker(p.source(), p.pos()).unwrap_or(0);
    p.bump_raw(marker, SyntaxKind::LIST_MARKER);
    p.eat(SyntaxKind::WHITESPACE);
    inline::inline_line(p);
    p.eat(SyntaxKind::NEWLINE);
    m.complete(p, SyntaxKind::TABLE_CELL);
}
