//! Block-level grammar rules.
//!
//! [`block`] looks at the line under the cursor, collects every rule that
//! could start there and lets [`policy::select`] pick one.

use crate::error::ErrorKind;
use crate::parser::{CompletedMarker, Parser};
use crate::policy::{self, Candidate, Rule};
use crate::scanner::lines::{
    content_end, fence_run, heading_marker_len, html_block_name, is_blockquote_line, is_close_tag_line,
    is_comment_open, is_pipe_table_start, is_unterminated_tag, probe_tag, skip_ws, thematic_break_len,
};
use crate::syntax_kind::SyntaxKind;

use super::{error_line, inline, table, tag};

/// Parse one block, or a run of blank lines.
pub(super) fn block(p: &mut Parser<'_>) {
    if let Some(blank) = p.scan(&[SyntaxKind::BLANK_LINE]) {
        p.bump_scanned(blank);
        return;
    }
    if p.at_end() {
        return;
    }
    if !p.enter() {
        error_line(p, ErrorKind::NestingLimit, "blocks nested too deeply");
        return;
    }

    if !p.is_line_scoped() && is_close_tag_line(p.source(), p.pos()) {
        stray_close(p);
    } else {
        match choose(p) {
            Rule::Frontmatter => frontmatter(p),
            Rule::CommentBlock => comment_block(p),
            Rule::Conditional => tag::conditional(p),
            Rule::Table if is_pipe_table_start(p.source(), p.pos()) => table::pipe_table(p),
            Rule::Table => table::tag_table(p),
            Rule::Tag => tag::tag_block(p),
            Rule::FencedCode => fenced_code(p),
            Rule::Heading => heading(p),
            Rule::ThematicBreak => thematic_break(p),
            Rule::Blockquote => blockquote(p),
            Rule::HtmlBlock => html_block(p),
            Rule::List => list(p),
            Rule::HtmlComment => html_comment(p),
            Rule::Paragraph => {
                paragraph(p);
            }
        }
    }
    p.leave();
}

/// Collect the rules that match at the cursor and select the winner.
fn choose(p: &Parser<'_>) -> Rule {
    let src = p.source();
    let line = p.pos();
    let first = skip_ws(src, line);
    let tab = p.options().tab_width;
    let mut candidates = vec![Candidate::new(Rule::Paragraph, true)];

    if !p.state().emitted_any() && p.options().frontmatter && src[line..].starts_with("---") {
        let confirmed = p.scan(&[SyntaxKind::FRONTMATTER_DELIM]).is_some();
        candidates.push(Candidate::new(Rule::Frontmatter, confirmed));
    }
    if is_comment_open(src, first) {
        candidates.push(Candidate::new(Rule::CommentBlock, true));
    }
    if let Some(probe) = probe_tag(src, line).filter(|t| !t.closing) {
        let block_form = probe.standalone && !probe.self_closing;
        match probe.name {
            Some("if") => candidates.push(Candidate::new(Rule::Conditional, block_form)),
            Some("table") => candidates.push(Candidate::new(Rule::Table, block_form)),
            Some("comment") | None => {}
            Some(_) => candidates.push(Candidate::new(Rule::Tag, probe.standalone)),
        }
    } else if is_unterminated_tag(src, line) {
        candidates.push(Candidate::new(Rule::Tag, true));
    }
    if is_pipe_table_start(src, line) {
        candidates.push(Candidate::new(Rule::Table, true));
    }
    if fence_run(src, first).is_some() {
        candidates.push(Candidate::new(Rule::FencedCode, true));
    }
    if heading_marker_len(src, first).is_some() {
        candidates.push(Candidate::new(Rule::Heading, true));
    }
    if thematic_break_len(src, line, tab).is_some() {
        candidates.push(Candidate::new(Rule::ThematicBreak, true));
    }
    if is_blockquote_line(src, line) {
        candidates.push(Candidate::new(Rule::Blockquote, true));
    }
    if html_block_name(src, first).is_some() {
        candidates.push(Candidate::new(Rule::HtmlBlock, true));
    }
    if p.scan(&[SyntaxKind::INDENT]).is_some() {
        candidates.push(Candidate::new(Rule::List, true));
    }
    if is_html_comment_line(src, first) {
        candidates.push(Candidate::new(Rule::HtmlComment, true));
    }

    if p.is_line_scoped() {
        candidates.retain(|c| {
            matches!(
                c.rule,
                Rule::Heading | Rule::ThematicBreak | Rule::Blockquote | Rule::Paragraph
            )
        });
    }
    policy::select(&candidates).unwrap_or(Rule::Paragraph)
}

/// `<!--` whose `-->` ends its line, or that never closes.
fn is_html_comment_line(src: &str, at: usize) -> bool {
    if !src[at..].starts_with("<!--") {
        return false;
    }
    match src[at + 4..].find("-->") {
        Some(i) => {
            let end = at + 4 + i + 3;
            src[end..content_end(src, end)]
                .bytes()
                .all(|b| matches!(b, b' ' | b'\t'))
        }
        None => true,
    }
}

/// A close tag with nothing open.
fn stray_close(p: &mut Parser<'_>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    let start = p.pos();
    tag::tag_header(p);
    let end = p.pos();
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
    p.error(ErrorKind::StructuralMismatch, start..end, "closing tag without an open tag");
    m.complete(p, SyntaxKind::ERROR);
}

/// Parse a paragraph: inline lines joined by soft breaks.
pub(super) fn paragraph(p: &mut Parser<'_>) -> CompletedMarker {
    let joiners: &[SyntaxKind] = if p.is_line_scoped() {
        &[SyntaxKind::NEWLINE]
    } else {
        &[SyntaxKind::SOFT_BREAK, SyntaxKind::NEWLINE]
    };
    paragraph_with(p, joiners)
}

fn paragraph_with(p: &mut Parser<'_>, joiners: &[SyntaxKind]) -> CompletedMarker {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    loop {
        inline::inline_line(p);
        match p.scan(joiners) {
            Some(end) if end.kind == SyntaxKind::NEWLINE => {
                p.bump_scanned(end);
                break;
            }
            Some(join) => p.bump_scanned(join),
            None => break,
        }
    }
    m.complete(p, SyntaxKind::PARAGRAPH)
}

/// Parse an ATX heading.
fn heading(p: &mut Parser<'_>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);

    let marker = heading_marker_len(p.source(), p.pos()).unwrap_or(0);
    p.bump_raw(marker, SyntaxKind::HEADING_MARKER);

    if !p.at_inline_end() {
        let text = p.start();
        inline::inline_line(p);
        text.complete(p, SyntaxKind::HEADING_TEXT);
    }
    p.eat(SyntaxKind::NEWLINE);

    m.complete(p, SyntaxKind::HEADING);
}

fn thematic_break(p: &mut Parser<'_>) {
    let m = p.start();
    if let Some(rule) = p.scan(&[SyntaxKind::HORIZONTAL_RULE]) {
        p.bump_scanned(rule);
    }
    p.eat(SyntaxKind::NEWLINE);
    m.complete(p, SyntaxKind::THEMATIC_BREAK);
}

/// Parse a blockquote over consecutive `>` lines.
///
/// The content of each line is parsed as a single-line block, so a quoted
/// paragraph is split at each `>`.
fn blockquote(p: &mut Parser<'_>) {
    let m = p.start();

    loop {
        p.eat(SyntaxKind::WHITESPACE);
        p.bump_raw(1, SyntaxKind::BLOCKQUOTE_MARKER);
        p.eat(SyntaxKind::WHITESPACE);

        if p.at_inline_end() {
            p.eat(SyntaxKind::NEWLINE);
        } else {
            p.line_scoped(block);
        }

        if p.is_line_scoped() || p.at_end() || !is_blockquote_line(p.source(), p.pos()) {
            break;
        }
    }

    m.complete(p, SyntaxKind::BLOCKQUOTE);
}

/// Parse a fenced code block.
fn fenced_code(p: &mut Parser<'_>) {
    let m = p.start();

    let open = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    if let Some(fence) = p.scan(&[SyntaxKind::FENCE]) {
        p.bump_scanned(fence);
    }
    p.eat(SyntaxKind::WHITESPACE);
    info_string(p);
    open.complete(p, SyntaxKind::CODE_FENCE_OPEN);

    fence_body(p);
    m.complete(p, SyntaxKind::FENCED_CODE);
}

/// Language word, then everything else on the line as attributes.
fn info_string(p: &mut Parser<'_>) {
    let start = p.pos();
    let end = content_end(p.source(), start);
    if start >= end {
        return;
    }
    let m = p.start();
    let text = &p.source()[start..end];
    let language = text
        .find(|c: char| c.is_whitespace() || c == '{')
        .unwrap_or(text.len());
    p.bump_raw(language, SyntaxKind::LANGUAGE);
    p.eat(SyntaxKind::WHITESPACE);
    let rest = end - p.pos();
    p.bump_raw(rest, SyntaxKind::FENCE_ATTRIBUTES);
    m.complete(p, SyntaxKind::INFO_STRING);
}

/// Everything after the opening fence line.
fn fence_body(p: &mut Parser<'_>) {
    p.eat(SyntaxKind::NEWLINE);

    let mut terminated = true;
    if let Some(code) = p.scan(&[SyntaxKind::CODE_CONTENT]) {
        terminated = code.terminated;
        p.bump_scanned(code);
    }

    if terminated {
        let first = skip_ws(p.source(), p.pos());
        if let Some(fence) = p.scan_at(first, p.state(), &[SyntaxKind::FENCE]) {
            let close = p.start();
            p.eat(SyntaxKind::WHITESPACE);
            p.bump_scanned(fence);
            p.eat(SyntaxKind::WHITESPACE);
            close.complete(p, SyntaxKind::CODE_FENCE_CLOSE);
            p.eat(SyntaxKind::NEWLINE);
            return;
        }
    }

    p.state_mut().clear_fence();
    p.missing(ErrorKind::UnterminatedConstruct, "unclosed code fence");
}

/// Finish a fence whose opening line came before the resumed region.
pub(super) fn resume_fence(p: &mut Parser<'_>) {
    let m = p.start();
    fence_body(p);
    m.complete(p, SyntaxKind::FENCED_CODE);
}

fn frontmatter(p: &mut Parser<'_>) {
    let m = p.start();
    if let Some(open) = p.scan(&[SyntaxKind::FRONTMATTER_DELIM]) {
        p.bump_scanned(open);
    }
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
    frontmatter_body(p);
    m.complete(p, SyntaxKind::FRONTMATTER);
}

fn frontmatter_body(p: &mut Parser<'_>) {
    if let Some(yaml) = p.scan(&[SyntaxKind::YAML]) {
        p.bump_scanned(yaml);
    }
    match p.scan(&[SyntaxKind::FRONTMATTER_DELIM]) {
        Some(close) => {
            p.bump_scanned(close);
            p.eat(SyntaxKind::WHITESPACE);
            p.eat(SyntaxKind::NEWLINE);
        }
        None => {
            p.state_mut().in_frontmatter = false;
            p.missing(ErrorKind::UnterminatedConstruct, "unclosed frontmatter");
        }
    }
}

/// Finish frontmatter whose opening delimiter came before the resumed region.
pub(super) fn resume_frontmatter(p: &mut Parser<'_>) {
    let m = p.start();
    frontmatter_body(p);
    m.complete(p, SyntaxKind::FRONTMATTER);
}

fn html_block(p: &mut Parser<'_>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    if let Some(html) = p.scan(&[SyntaxKind::HTML_TEXT]) {
        p.bump_scanned(html);
    }
    p.eat(SyntaxKind::NEWLINE);
    m.complete(p, SyntaxKind::HTML_BLOCK);
}

fn html_comment(p: &mut Parser<'_>) {
    verbatim(p, SyntaxKind::HTML_COMMENT_TEXT, SyntaxKind::HTML_COMMENT, "unclosed HTML comment");
}

fn comment_block(p: &mut Parser<'_>) {
    verbatim(p, SyntaxKind::COMMENT_TEXT, SyntaxKind::COMMENT_BLOCK, "unclosed comment tag");
}

/// A block that is one scanner token plus the rest of its line.
fn verbatim(p: &mut Parser<'_>, token: SyntaxKind, node: SyntaxKind, unclosed: &str) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    if let Some(text) = p.scan(&[token]) {
        let terminated = text.terminated;
        p.bump_scanned(text);
        if !terminated {
            p.missing(ErrorKind::UnterminatedConstruct, unclosed);
        }
    }
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
    m.complete(p, node);
}

/// Parse a list: items at one indentation, with the blank lines between them.
fn list(p: &mut Parser<'_>) {
    let m = p.start();
    if let Some(indent) = p.scan(&[SyntaxKind::INDENT]) {
        p.bump_scanned(indent);
    }

    loop {
        let before = p.pos();
        list_item(p);
        if let Some(dedent) = p.scan(&[SyntaxKind::DEDENT]) {
            p.bump_scanned(dedent);
            break;
        }
        if p.pos() == before {
            p.state_mut().lists.pop();
            break;
        }
        if let Some(blank) = p.scan(&[SyntaxKind::BLANK_LINE]) {
            p.bump_scanned(blank);
        }
    }

    m.complete(p, SyntaxKind::LIST);
}

fn list_item(p: &mut Parser<'_>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    if let Some(marker) = p.scan(&[SyntaxKind::LIST_MARKER]) {
        p.bump_scanned(marker);
    }
    p.eat(SyntaxKind::WHITESPACE);

    if p.at_inline_end() {
        p.eat(SyntaxKind::NEWLINE);
    } else {
        let joiners = [SyntaxKind::LIST_CONTINUATION, SyntaxKind::NEWLINE];
        paragraph_with(p, &joiners).project(p, SyntaxKind::LIST_PARAGRAPH);
    }

    // Nested lists and indented continuation blocks, possibly after blank lines.
    loop {
        let blank = p.scan(&[SyntaxKind::BLANK_LINE]);
        let at = p.pos() + blank.as_ref().map_or(0, |b| b.len);
        let Some(next) = p.scan_at(at, p.state(), &[SyntaxKind::INDENT, SyntaxKind::LIST_CONTINUATION]) else {
            break;
        };
        if let Some(blank) = blank {
            p.bump_scanned(blank);
        }
        let before = p.pos();
        if next.kind == SyntaxKind::LIST_CONTINUATION {
            p.bump_scanned(next);
        }
        block(p);
        if p.pos() == before {
            break;
        }
    }

    m.complete(p, SyntaxKind::LIST_ITEM);
}

#[cfg(test)]
mod tests {
    use crate::syntax_kind::{SyntaxKind, SyntaxNode};
    use crate::{ErrorKind, ParseOptions, ScannerState, parse, parse_with};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(node: &SyntaxNode) -> Vec<SyntaxKind> {
        node.children().map(|n| n.kind()).collect()
    }

    fn top_level(input: &str) -> Vec<SyntaxKind> {
        let parse = parse(input);
        assert_eq!(parse.syntax().text().to_string(), input);
        kinds(&parse.syntax())
    }

    #[rstest]
    #[case("# Title\n", SyntaxKind::HEADING)]
    #[case("---\n", SyntaxKind::THEMATIC_BREAK)]
    #[case("> quote\n", SyntaxKind::BLOCKQUOTE)]
    #[case("```\ncode\n```\n", SyntaxKind::FENCED_CODE)]
    #[case("<div>\nhi\n</div>\n", SyntaxKind::HTML_BLOCK)]
    #[case("<!-- note -->\n", SyntaxKind::HTML_COMMENT)]
    #[case("{% comment %}\nx\n{% /comment %}\n", SyntaxKind::COMMENT_BLOCK)]
    #[case("- item\n", SyntaxKind::LIST)]
    #[case("{% note %}\nbody\n{% /note %}\n", SyntaxKind::TAG)]
    #[case("{% partial file=\"a.md\" /%}\n", SyntaxKind::TAG)]
    #[case("{% if $x %}\nbody\n{% /if %}\n", SyntaxKind::CONDITIONAL)]
    #[case("| a |\n|---|\n", SyntaxKind::PIPE_TABLE)]
    #[case("plain words\n", SyntaxKind::PARAGRAPH)]
    fn single_block(#[case] input: &str, #[case] expected: SyntaxKind) {
        assert_eq!(top_level(input), vec![expected]);
    }

    #[test]
    fn frontmatter_only_at_document_start() {
        assert_eq!(
            top_level("---\ntitle: x\n---\n# H\n"),
            vec![SyntaxKind::FRONTMATTER, SyntaxKind::HEADING]
        );
        assert_eq!(
            top_level("text\n\n---\na: b\n---\n"),
            vec![
                SyntaxKind::PARAGRAPH,
                SyntaxKind::THEMATIC_BREAK,
                SyntaxKind::PARAGRAPH,
                SyntaxKind::THEMATIC_BREAK,
            ]
        );
    }

    #[test]
    fn unclosed_frontmatter_is_a_thematic_break() {
        assert_eq!(top_level("---\nplain\n"), vec![SyntaxKind::THEMATIC_BREAK, SyntaxKind::PARAGRAPH]);
    }

    #[test]
    fn paragraph_joins_soft_breaks() {
        let parse = parse("one\ntwo\n\nthree\n");
        let root = parse.syntax();
        assert_eq!(kinds(&root), vec![SyntaxKind::PARAGRAPH, SyntaxKind::PARAGRAPH]);
        let first = root.first_child().unwrap();
        assert!(
            first
                .children_with_tokens()
                .any(|e| e.kind() == SyntaxKind::SOFT_BREAK)
        );
    }

    #[test]
    fn heading_interrupts_paragraph() {
        assert_eq!(top_level("text\n# H\n"), vec![SyntaxKind::PARAGRAPH, SyntaxKind::HEADING]);
    }

    #[test]
    fn heading_splits_marker_and_text() {
        let parse = parse("## Sub title\n");
        let heading = parse.syntax().first_child().unwrap();
        let marker = heading.first_token().unwrap();
        assert_eq!(marker.kind(), SyntaxKind::HEADING_MARKER);
        assert_eq!(marker.text(), "## ");
        let text = heading.children().next().unwrap();
        assert_eq!(text.kind(), SyntaxKind::HEADING_TEXT);
        assert_eq!(text.text().to_string(), "Sub title");
    }

    #[test]
    fn fence_with_info_string() {
        let parse = parse("```js {% .x %}\nlet a;\n```\n");
        let code = parse.syntax().first_child().unwrap();
        let open = code.first_child().unwrap();
        let info = open.children().next().unwrap();
        assert_eq!(info.kind(), SyntaxKind::INFO_STRING);
        let tokens: Vec<_> = info
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .map(|t| (t.kind(), t.text().to_string()))
            .collect();
        assert_eq!(
            tokens,
            vec![
                (SyntaxKind::LANGUAGE, "js".to_string()),
                (SyntaxKind::WHITESPACE, " ".to_string()),
                (SyntaxKind::FENCE_ATTRIBUTES, "{% .x %}".to_string()),
            ]
        );
        assert!(parse.errors().is_empty());
    }

    #[test]
    fn unterminated_fence_reports_and_keeps_text() {
        let input = "```\nnever closed\n";
        let parse = parse(input);
        assert_eq!(parse.syntax().text().to_string(), input);
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].kind, ErrorKind::UnterminatedConstruct);
    }

    #[test]
    fn fence_body_is_verbatim() {
        let parse = parse("~~~\n# not a heading\n{% tag %}\n~~~\n");
        let code = parse.syntax().first_child().unwrap();
        let content = code
            .children_with_tokens()
            .find(|e| e.kind() == SyntaxKind::CODE_CONTENT)
            .unwrap();
        assert_eq!(content.as_token().unwrap().text(), "# not a heading\n{% tag %}\n");
    }

    #[test]
    fn blockquote_spans_consecutive_lines() {
        assert_eq!(
            top_level("> a\n> b\n\nafter\n"),
            vec![SyntaxKind::BLOCKQUOTE, SyntaxKind::PARAGRAPH]
        );
    }

    #[test]
    fn nested_lists_follow_indentation() {
        let parse = parse("- a\n  - b\n- c\n");
        let list = parse.syntax().first_child().unwrap();
        assert_eq!(list.kind(), SyntaxKind::LIST);
        assert_eq!(kinds(&list), vec![SyntaxKind::LIST_ITEM, SyntaxKind::LIST_ITEM]);
        let first = list.first_child().unwrap();
        assert_eq!(kinds(&first), vec![SyntaxKind::LIST_PARAGRAPH, SyntaxKind::LIST]);
    }

    #[test]
    fn blank_lines_between_items_stay_in_list() {
        let parse = parse("- a\n\n- b\n");
        let list = parse.syntax().first_child().unwrap();
        assert_eq!(parse.syntax().children().count(), 1);
        assert_eq!(kinds(&list), vec![SyntaxKind::LIST_ITEM, SyntaxKind::LIST_ITEM]);
    }

    #[test]
    fn continuation_block_after_blank_line() {
        let parse = parse("- a\n\n  more\nafter\n");
        let root = parse.syntax();
        assert_eq!(kinds(&root), vec![SyntaxKind::LIST]);
        let item = root.first_child().unwrap().first_child().unwrap();
        assert_eq!(kinds(&item), vec![SyntaxKind::LIST_PARAGRAPH, SyntaxKind::PARAGRAPH]);
    }

    #[test]
    fn stray_close_tag_is_an_error() {
        let parse = parse("{% /foo %}\n");
        assert_eq!(kinds(&parse.syntax()), vec![SyntaxKind::ERROR]);
        assert_eq!(parse.errors()[0].kind, ErrorKind::StructuralMismatch);
    }

    #[test]
    fn inline_tag_line_stays_a_paragraph() {
        assert_eq!(top_level("{% foo %} and text\n"), vec![SyntaxKind::PARAGRAPH]);
    }

    #[test]
    fn deep_blockquotes_hit_the_nesting_limit() {
        let input = format!("{}x\n", "> ".repeat(100));
        let parse = parse(&input);
        assert_eq!(parse.syntax().text().to_string(), input);
        assert!(parse.errors().iter().any(|e| e.kind == ErrorKind::NestingLimit));
    }

    fn nesting_depth(root: &SyntaxNode, kind: SyntaxKind) -> usize {
        root.descendants()
            .filter(|n| n.kind() == kind)
            .map(|n| n.ancestors().filter(|a| a.kind() == kind).count())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn long_line_of_openers_does_not_overflow() {
        let input = format!("{}\n", "*a ".repeat(3000));
        let parse = parse(&input);
        assert_eq!(parse.syntax().text().to_string(), input);

        let input = format!("{}a{}\n", "[".repeat(3000), "](x)".repeat(3000));
        let parse = crate::parse(&input);
        assert_eq!(parse.syntax().text().to_string(), input);
    }

    #[test]
    fn deep_emphasis_hits_the_nesting_limit() {
        let options = ParseOptions { max_nesting: 8, ..ParseOptions::default() };
        let input = format!("{}x{}\n", "*a ".repeat(20), " b*".repeat(20));
        let parse = parse_with(&input, &options, ScannerState::default());
        assert_eq!(parse.syntax().text().to_string(), input);
        assert!(parse.errors().iter().any(|e| e.kind == ErrorKind::NestingLimit));
        let depth = nesting_depth(&parse.syntax(), SyntaxKind::EMPHASIS);
        assert!(depth > 0 && depth <= 8, "depth {depth}");
    }

    #[test]
    fn deep_links_hit_the_nesting_limit() {
        let options = ParseOptions { max_nesting: 8, ..ParseOptions::default() };
        let input = format!("{}a{}\n", "[".repeat(20), "](x)".repeat(20));
        let parse = parse_with(&input, &options, ScannerState::default());
        assert_eq!(parse.syntax().text().to_string(), input);
        assert!(parse.errors().iter().any(|e| e.kind == ErrorKind::NestingLimit));
        let depth = nesting_depth(&parse.syntax(), SyntaxKind::LINK);
        assert!(depth > 0 && depth <= 8, "depth {depth}");
    }
}
