//! Inline grammar: text-level constructs within one line.
//!
//! Dispatch is by the lexeme at the cursor. Each construct either matches
//! completely or its first lexeme falls back to `TEXT`, so every call makes
//! progress. Emphasis never crosses a line break.

use std::ops::Range;

use crate::error::ErrorKind;
use crate::lexer::Mode;
use crate::parser::Parser;
use crate::scanner::lines::{content_end, probe_tag};
use crate::syntax_kind::SyntaxKind;

use super::{expression, tag};

/// Parse inline content up to the end of the line (or current limit).
pub(super) fn inline_line(p: &mut Parser<'_>) {
    while !p.at_inline_end() {
        inline_item(p);
    }
}

/// Parse one inline construct.
pub(super) fn inline_item(p: &mut Parser<'_>) {
    match p.current() {
        SyntaxKind::BACKTICKS => code_span(p),
        SyntaxKind::STAR | SyntaxKind::UNDERSCORE => emphasis(p),
        SyntaxKind::L_BRACK => bracketed(p, SyntaxKind::LINK, SyntaxKind::LINK_TEXT),
        SyntaxKind::IMAGE_START => bracketed(p, SyntaxKind::IMAGE, SyntaxKind::IMAGE_ALT),
        SyntaxKind::LT => html_inline(p),
        SyntaxKind::TAG_START => inline_tag(p),
        SyntaxKind::INTERP_START => interpolation(p),
        SyntaxKind::WHITESPACE | SyntaxKind::ESCAPE => p.bump(),
        _ => p.bump_as(SyntaxKind::TEXT),
    }
}

/// End of the inline region on the cursor's line.
fn line_limit(p: &Parser<'_>) -> usize {
    let end = content_end(p.source(), p.pos());
    end.min(p.end())
}

fn code_span(p: &mut Parser<'_>) {
    let src = p.source();
    let start = p.pos();
    let open = p.current_text().len();
    let Some(close) = closing_backticks(src, start + open, line_limit(p), open) else {
        p.bump_as(SyntaxKind::TEXT);
        return;
    };

    let m = p.start();
    p.bump();
    p.bump_raw(close - p.pos(), SyntaxKind::CODE_TEXT);
    p.bump();
    m.complete(p, SyntaxKind::INLINE_CODE);
}

/// Start of a backtick run of exactly `len` in `from..to`.
fn closing_backticks(src: &str, from: usize, to: usize, len: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = from;
    while i < to {
        if bytes[i] == b'`' {
            let run = bytes[i..to].iter().take_while(|&&b| b == b'`').count();
            if run == len {
                return Some(i);
            }
            i += run;
        } else {
            i += 1;
        }
    }
    None
}

fn emphasis(p: &mut Parser<'_>) {
    let opens = p.scan(&[SyntaxKind::STRONG_OPEN, SyntaxKind::EMPHASIS_OPEN]).is_some();
    if opens && !p.enter() {
        too_deep(p);
        return;
    }
    let strong = delimited(p, SyntaxKind::STRONG_OPEN, SyntaxKind::STRONG_CLOSE, SyntaxKind::STRONG);
    if !strong && !delimited(p, SyntaxKind::EMPHASIS_OPEN, SyntaxKind::EMPHASIS_CLOSE, SyntaxKind::EMPHASIS) {
        p.bump_as(SyntaxKind::TEXT);
    }
    if opens {
        p.leave();
    }
}

/// An opener past `max_nesting` stays as text inside an `ERROR` node.
fn too_deep(p: &mut Parser<'_>) {
    let start = p.pos();
    let len = p.current_text().len();
    p.error(ErrorKind::NestingLimit, start..start + len, "inline markup nested too deeply");
    let m = p.start();
    p.bump_as(SyntaxKind::TEXT);
    m.complete(p, SyntaxKind::ERROR);
}

/// Try `open content close` on the current line. On failure nothing is
/// consumed and the attempt is remembered for this position.
fn delimited(p: &mut Parser<'_>, open: SyntaxKind, close: SyntaxKind, node: SyntaxKind) -> bool {
    if p.has_failed(node) {
        return false;
    }
    let Some(opener) = p.scan(&[open]) else {
        return false;
    };
    let ch = p.source().as_bytes()[p.pos()];

    let snapshot = p.snapshot();
    let m = p.start();
    p.bump_scanned(opener);
    let content = p.pos();

    let mut closed = false;
    while !p.at_inline_end() {
        if p.pos() > content && p.source().as_bytes()[p.pos()] == ch {
            if let Some(closer) = p.scan(&[close]) {
                p.bump_scanned(closer);
                closed = true;
                break;
            }
        }
        inline_item(p);
    }

    if closed {
        m.complete(p, node);
    } else {
        m.abandon(p);
        p.rewind(snapshot);
        p.mark_failed(node);
    }
    closed
}

/// `[text](dest "title")` or `![alt](dest)`.
fn bracketed(p: &mut Parser<'_>, node: SyntaxKind, label: SyntaxKind) {
    let src = p.source();
    let start = p.pos();
    let limit = line_limit(p);
    let open = p.current_text().len();

    let target = closing_bracket(src, start + open, limit)
        .and_then(|close| link_target(src, close + 1, limit).map(|target| (close, target)));
    let Some((close, target)) = target else {
        p.bump_as(SyntaxKind::TEXT);
        return;
    };
    if !p.enter() {
        too_deep(p);
        return;
    }

    let m = p.start();
    p.bump();
    let text = p.start();
    p.with_limit(close, inline_line);
    text.complete(p, label);
    p.leave();
    p.bump_raw(1, SyntaxKind::R_BRACK);

    p.bump_raw(1, SyntaxKind::L_PAREN);
    raw_ws(p, target.destination.start);
    p.bump_raw(target.destination.len(), SyntaxKind::LINK_DESTINATION);
    if let Some(title) = target.title {
        raw_ws(p, title.start);
        p.bump_raw(title.len(), SyntaxKind::LINK_TITLE);
    }
    raw_ws(p, target.close);
    p.bump_raw(1, SyntaxKind::R_PAREN);

    m.complete(p, node);
}

fn raw_ws(p: &mut Parser<'_>, to: usize) {
    let len = to.saturating_sub(p.pos());
    p.bump_raw(len, SyntaxKind::WHITESPACE);
}

/// Offset of the `]` balancing an already-consumed `[`.
fn closing_bracket(src: &str, from: usize, to: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut i = from;
    while i < to {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' => depth += 1,
            b']' if depth == 0 => return Some(i),
            b']' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}

struct LinkTarget {
    destination: Range<usize>,
    title: Option<Range<usize>>,
    /// Offset of the closing `)`.
    close: usize,
}

/// The `(dest "title")` part of a link, starting at `at`.
fn link_target(src: &str, at: usize, to: usize) -> Option<LinkTarget> {
    let bytes = src.as_bytes();
    if at >= to || bytes[at] != b'(' {
        return None;
    }
    let skip = |mut i: usize| {
        while i < to && matches!(bytes[i], b' ' | b'\t') {
            i += 1;
        }
        i
    };

    let dest_start = skip(at + 1);
    let mut i = dest_start;
    if i < to && bytes[i] == b'<' {
        i += 1;
        while i < to && bytes[i] != b'>' {
            i += 1;
        }
        if i >= to {
            return None;
        }
        i += 1;
    } else {
        let mut depth = 0usize;
        while i < to {
            match bytes[i] {
                b' ' | b'\t' => break,
                b'\\' => i += 1,
                b'(' => depth += 1,
                b')' if depth == 0 => break,
                b')' => depth -= 1,
                _ => {}
            }
            i += 1;
        }
        i = i.min(to);
    }
    let destination = dest_start..i;

    let mut i = skip(i);
    let mut title = None;
    if i < to && matches!(bytes[i], b'"' | b'\'') {
        let quote = bytes[i];
        let title_start = i;
        i += 1;
        while i < to && bytes[i] != quote {
            if bytes[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        if i >= to {
            return None;
        }
        i += 1;
        title = Some(title_start..i);
        i = skip(i);
    }

    (i < to && bytes[i] == b')').then_some(LinkTarget {
        destination,
        title,
        close: i,
    })
}

/// An inline HTML tag, comment, declaration or autolink: `<` up to the
/// next `>` on the line.
fn html_inline(p: &mut Parser<'_>) {
    let src = p.source();
    let start = p.pos();
    let limit = line_limit(p);
    let opens_tag = src[start + 1..limit]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
    match src[start..limit].find('>') {
        Some(gt) if opens_tag => p.bump_raw(gt + 1, SyntaxKind::HTML_INLINE),
        _ => p.bump_as(SyntaxKind::TEXT),
    }
}

/// A tag header inside prose. Only headers that close within the current
/// region are tags; anything else is text.
fn inline_tag(p: &mut Parser<'_>) {
    match probe_tag(p.source(), p.pos()) {
        Some(probe) if probe.end <= p.end() => {
            tag::tag_header(p);
        }
        _ => p.bump_as(SyntaxKind::TEXT),
    }
}

/// `{{ expression }}` on one line.
///
/// With a `}}` later on the line the node is kept and anything the
/// expression grammar cannot use becomes an `ERROR` node. Without one the
/// `{{` is text.
fn interpolation(p: &mut Parser<'_>) {
    if p.has_failed(SyntaxKind::INLINE_EXPRESSION) {
        p.bump_as(SyntaxKind::TEXT);
        return;
    }
    let limit = line_limit(p);
    let start = p.pos();
    if !p.source()[start + 2..limit].contains("}}") {
        p.mark_failed(SyntaxKind::INLINE_EXPRESSION);
        p.bump_as(SyntaxKind::TEXT);
        return;
    }

    let m = p.start();
    p.with_limit(limit, |p| {
        p.with_mode(Mode::Expr, |p| {
            p.bump();
            p.eat_trivia();
            if expression::expression(p).is_none() {
                p.missing(ErrorKind::Expected, "expected expression");
            }
            p.eat_trivia();
            while !p.at(SyntaxKind::INTERP_END) && !p.at_end() {
                p.err_and_bump("expected `}}`");
                p.eat_trivia();
            }
            if !p.eat(SyntaxKind::INTERP_END) {
                p.missing(ErrorKind::UnterminatedConstruct, "unclosed `{{`");
            }
        })
    });
    m.complete(p, SyntaxKind::INLINE_EXPRESSION);
}

#[cfg(test)]
mod tests {
    use crate::parse;
    use crate::syntax_kind::{SyntaxElement, SyntaxKind, SyntaxNode};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn paragraph(input: &str) -> SyntaxNode {
        let parse = parse(input);
        assert_eq!(parse.syntax().text().to_string(), input);
        let para = parse.syntax().first_child().unwrap();
        assert_eq!(para.kind(), SyntaxKind::PARAGRAPH);
        para
    }

    /// `(kind, text)` of each direct child.
    fn shape(node: &SyntaxNode) -> Vec<(SyntaxKind, String)> {
        node.children_with_tokens()
            .map(|e| {
                let text = match &e {
                    SyntaxElement::Node(n) => n.text().to_string(),
                    SyntaxElement::Token(t) => t.text().to_string(),
                };
                (e.kind(), text)
            })
            .collect()
    }

    fn has_node(node: &SyntaxNode, kind: SyntaxKind) -> bool {
        node.descendants().any(|n| n.kind() == kind)
    }

    #[test]
    fn emphasis_closes_at_first_flanking_delimiter() {
        let para = paragraph("*a*b*");
        assert_eq!(
            shape(&para),
            vec![
                (SyntaxKind::EMPHASIS, "*a*".to_string()),
                (SyntaxKind::TEXT, "b*".to_string()),
            ]
        );
    }

    #[test]
    fn strong_wraps_emphasis() {
        let para = paragraph("***a***");
        let strong = para.first_child().unwrap();
        assert_eq!(strong.kind(), SyntaxKind::STRONG);
        assert_eq!(strong.first_child().unwrap().kind(), SyntaxKind::EMPHASIS);
    }

    #[rstest]
    #[case("a * b *")]
    #[case("snake_case_name")]
    #[case("*a\nb*")]
    #[case("**open")]
    fn no_emphasis(#[case] input: &str) {
        let para = paragraph(input);
        assert!(!has_node(&para, SyntaxKind::EMPHASIS));
        assert!(!has_node(&para, SyntaxKind::STRONG));
    }

    #[test]
    fn underscore_emphasis() {
        let para = paragraph("_a_ and __b__");
        let kinds: Vec<_> = para.children().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![SyntaxKind::EMPHASIS, SyntaxKind::STRONG]);
    }

    #[test]
    fn code_span_needs_matching_run_length() {
        let para = paragraph("``a`b`` c");
        let code = para.first_child().unwrap();
        assert_eq!(
            shape(&code),
            vec![
                (SyntaxKind::BACKTICKS, "``".to_string()),
                (SyntaxKind::CODE_TEXT, "a`b".to_string()),
                (SyntaxKind::BACKTICKS, "``".to_string()),
            ]
        );

        let para = paragraph("`open only");
        assert!(!has_node(&para, SyntaxKind::INLINE_CODE));
    }

    #[test]
    fn code_span_hides_markup() {
        let para = paragraph("`*not* {{ $x }}`");
        assert_eq!(para.children().map(|n| n.kind()).collect::<Vec<_>>(), vec![SyntaxKind::INLINE_CODE]);
    }

    #[test]
    fn link_with_title() {
        let para = paragraph("see [the *docs*](https://x.dev \"Docs\") now");
        let link = para.first_child().unwrap();
        assert_eq!(link.kind(), SyntaxKind::LINK);
        assert_eq!(
            shape(&link),
            vec![
                (SyntaxKind::L_BRACK, "[".to_string()),
                (SyntaxKind::LINK_TEXT, "the *docs*".to_string()),
                (SyntaxKind::R_BRACK, "]".to_string()),
                (SyntaxKind::L_PAREN, "(".to_string()),
                (SyntaxKind::LINK_DESTINATION, "https://x.dev".to_string()),
                (SyntaxKind::WHITESPACE, " ".to_string()),
                (SyntaxKind::LINK_TITLE, "\"Docs\"".to_string()),
                (SyntaxKind::R_PAREN, ")".to_string()),
            ]
        );
        let text = link.first_child().unwrap();
        assert!(has_node(&text, SyntaxKind::EMPHASIS));
    }

    #[test]
    fn image_alt_and_destination() {
        let para = paragraph("![logo](img/logo.png)");
        let image = para.first_child().unwrap();
        assert_eq!(image.kind(), SyntaxKind::IMAGE);
        assert_eq!(image.first_child().unwrap().kind(), SyntaxKind::IMAGE_ALT);
        assert!(
            image
                .children_with_tokens()
                .any(|e| e.kind() == SyntaxKind::LINK_DESTINATION)
        );
    }

    #[rstest]
    #[case("[no target]")]
    #[case("[a](unclosed")]
    #[case("[a] (b)")]
    fn brackets_without_target_are_text(#[case] input: &str) {
        let para = paragraph(input);
        assert!(!has_node(&para, SyntaxKind::LINK));
    }

    #[test]
    fn inline_html_is_one_token() {
        let para = paragraph("a <b>bold</b> <https://x.dev> 1 < 2");
        let html: Vec<_> = para
            .children_with_tokens()
            .filter(|e| e.kind() == SyntaxKind::HTML_INLINE)
            .map(|e| e.into_token().unwrap().text().to_string())
            .collect();
        assert_eq!(html, vec!["<b>", "</b>", "<https://x.dev>"]);
    }

    #[test]
    fn interpolation_holds_an_expression() {
        let para = paragraph("Hi {{ $user.name }}!");
        let interp = para.first_child().unwrap();
        assert_eq!(interp.kind(), SyntaxKind::INLINE_EXPRESSION);
        assert_eq!(interp.first_child().unwrap().kind(), SyntaxKind::MEMBER_EXPRESSION);
    }

    #[test]
    fn unclosed_interpolation_is_text() {
        let parse = parse("a {{ $x b\n");
        let para = parse.syntax().first_child().unwrap();
        assert!(!has_node(&para, SyntaxKind::INLINE_EXPRESSION));
        assert!(parse.errors().is_empty());
    }

    #[test]
    fn malformed_interpolation_keeps_its_node() {
        let parse = parse("a {{ $a ? }} b\n");
        let para = parse.syntax().first_child().unwrap();
        let interp = para.first_child().unwrap();
        assert_eq!(interp.kind(), SyntaxKind::INLINE_EXPRESSION);
        assert_eq!(interp.text().to_string(), "{{ $a ? }}");
        assert!(has_node(&interp, SyntaxKind::ERROR));
        assert!(!parse.errors().is_empty());
    }

    #[test]
    fn unterminated_string_in_interpolation_is_reported() {
        let input = "{{ \"open }}\n";
        let parse = parse(input);
        assert_eq!(parse.syntax().text().to_string(), input);
        let para = parse.syntax().first_child().unwrap();
        assert_eq!(para.first_child().unwrap().kind(), SyntaxKind::INLINE_EXPRESSION);
        assert!(
            parse
                .errors()
                .iter()
                .any(|e| e.kind == crate::ErrorKind::UnterminatedConstruct)
        );
    }

    #[test]
    fn variables_in_prose_are_text() {
        let para = paragraph("Be careful with $value.");
        assert!(!has_node(&para, SyntaxKind::VARIABLE));
    }

    #[test]
    fn inline_tag_forms() {
        let para = paragraph("a {% $x %} b {% #id .big %} c {% br /%} d {% em %}e{% /em %}");
        let kinds: Vec<_> = para.children().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::INLINE_TAG_EXPRESSION,
                SyntaxKind::TAG_ANNOTATION,
                SyntaxKind::TAG_SELF_CLOSE,
                SyntaxKind::TAG_OPEN,
                SyntaxKind::TAG_CLOSE,
            ]
        );
    }

    #[test]
    fn unterminated_inline_tag_is_text() {
        let para = paragraph("a {% b c");
        assert_eq!(para.children().count(), 0);
    }

    #[test]
    fn escapes_stay_tokens() {
        let para = paragraph(r"\*not emphasis\*");
        assert!(!has_node(&para, SyntaxKind::EMPHASIS));
        assert_eq!(para.first_token().unwrap().kind(), SyntaxKind::ESCAPE);
    }
}
