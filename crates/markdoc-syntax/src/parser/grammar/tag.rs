//! Tag grammar: `{% %}` headers, block tags and conditionals.

use std::ops::Range;

use crate::error::ErrorKind;
use crate::lexer::Mode;
use crate::parser::Parser;
use crate::scanner::lines::{attribute_name_len, is_close_tag_line, name_len, probe_tag, tag_name_len};
use crate::syntax_kind::SyntaxKind;

use super::{blocks_until, expression};

/// What a parsed tag header turned out to be.
pub(super) struct TagHeader {
    /// `TAG_OPEN`, `TAG_CLOSE`, `TAG_SELF_CLOSE`, `TAG_ANNOTATION` or
    /// `INLINE_TAG_EXPRESSION`.
    pub kind: SyntaxKind,
    /// Byte range of the tag name.
    pub name: Option<Range<usize>>,
    /// Whole header, `{%` through `%}`.
    pub range: Range<usize>,
    /// Number of positional values.
    pub values: usize,
    /// Reached `%}` or `/%}`.
    pub terminated: bool,
}

/// Parse a tag header starting at `{%`.
pub(super) fn tag_header(p: &mut Parser<'_>) -> TagHeader {
    p.with_mode(Mode::Expr, header)
}

fn header(p: &mut Parser<'_>) -> TagHeader {
    let m = p.start();
    let start = p.pos();
    p.bump();
    p.eat_trivia();

    let closing = p.at(SyntaxKind::SLASH);
    if closing {
        p.bump();
        p.eat_trivia();
    }

    let name = tag_name_len(p.source(), p.pos()).map(|len| {
        let at = p.pos();
        p.bump_raw(len, SyntaxKind::TAG_NAME);
        at..at + len
    });

    let mut values = 0;
    let mut attributes = 0;
    let end = loop {
        p.eat_trivia();
        match p.current() {
            SyntaxKind::TAG_END | SyntaxKind::SELF_CLOSE_END => {
                let end = p.current();
                p.bump();
                break Some(end);
            }
            SyntaxKind::EOF => {
                p.missing(ErrorKind::UnterminatedConstruct, "unclosed tag");
                break None;
            }
            SyntaxKind::TAG_START | SyntaxKind::INTERP_START => {
                p.missing(ErrorKind::Expected, "expected `%}`");
                break None;
            }
            SyntaxKind::HASH => {
                shorthand(p, SyntaxKind::SHORTHAND_ID);
                attributes += 1;
            }
            SyntaxKind::DOT => {
                shorthand(p, SyntaxKind::SHORTHAND_CLASS);
                attributes += 1;
            }
            _ if attribute_name_len(p.source(), p.pos()).is_some() => {
                attribute(p);
                attributes += 1;
            }
            kind if expression::at_expression_start(kind) => {
                expression::expression(p);
                values += 1;
            }
            _ => p.err_and_bump("unexpected token in tag"),
        }
    };

    let kind = if closing {
        SyntaxKind::TAG_CLOSE
    } else if end == Some(SyntaxKind::SELF_CLOSE_END) {
        SyntaxKind::TAG_SELF_CLOSE
    } else if name.is_some() {
        SyntaxKind::TAG_OPEN
    } else if values == 1 && attributes == 0 {
        SyntaxKind::INLINE_TAG_EXPRESSION
    } else {
        SyntaxKind::TAG_ANNOTATION
    };
    m.complete(p, kind);

    TagHeader {
        kind,
        name,
        range: start..p.pos(),
        values,
        terminated: end.is_some(),
    }
}

/// `name = value`
fn attribute(p: &mut Parser<'_>) {
    let m = p.start();
    let len = name_len(p.source(), p.pos());
    p.bump_raw(len, SyntaxKind::ATTRIBUTE_NAME);
    p.eat_trivia();
    p.bump();
    p.eat_trivia();
    if expression::expression(p).is_none() {
        p.missing(ErrorKind::Expected, "expected attribute value");
    }
    m.complete(p, SyntaxKind::ATTRIBUTE);
}

/// `#id` or `.class`
fn shorthand(p: &mut Parser<'_>, kind: SyntaxKind) {
    let m = p.start();
    p.bump();
    let len = name_len(p.source(), p.pos());
    if len == 0 {
        p.missing(ErrorKind::Expected, "expected name");
    } else {
        p.bump_raw(len, SyntaxKind::IDENT);
    }
    m.complete(p, kind);
}

fn name_text<'s>(p: &Parser<'s>, header: &TagHeader) -> Option<&'s str> {
    header.name.clone().map(|range| &p.source()[range])
}

fn at_else_line(p: &Parser<'_>) -> bool {
    probe_tag(p.source(), p.pos()).is_some_and(|t| t.name == Some("else") && !t.closing && t.standalone)
}

pub(super) fn at_close_line(p: &Parser<'_>) -> bool {
    is_close_tag_line(p.source(), p.pos())
}

fn at_branch_end(p: &Parser<'_>) -> bool {
    at_close_line(p) || at_else_line(p)
}

/// Header line of a block construct: the header plus the rest of its line.
pub(super) fn header_line(p: &mut Parser<'_>) -> TagHeader {
    p.eat(SyntaxKind::WHITESPACE);
    let header = tag_header(p);
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
    header
}

/// Parse a block tag: open line, body blocks, close line; or a lone
/// self-closing tag line.
pub(super) fn tag_block(p: &mut Parser<'_>) {
    let m = p.start();
    let open = header_line(p);
    if open.kind == SyntaxKind::TAG_OPEN && open.terminated {
        let name = name_text(p, &open);
        blocks_until(p, at_close_line);
        close_line(p, name);
    }
    m.complete(p, SyntaxKind::TAG);
}

/// Consume the close line ending a block opened with `name`.
///
/// A close with a different name still ends the block; the mismatch is
/// recorded on the close tag's name.
pub(super) fn close_line(p: &mut Parser<'_>, name: Option<&str>) {
    if !at_close_line(p) {
        let label = name.unwrap_or("tag");
        p.missing(ErrorKind::UnterminatedConstruct, format!("unclosed `{label}` block"));
        return;
    }
    let close = header_line(p);
    let close_name = name_text(p, &close);
    if close_name != name {
        let range = close.name.clone().unwrap_or(close.range.clone());
        let message = match (name, close_name) {
            (Some(open), Some(found)) => format!("expected `{{% /{open} %}}`, found `{{% /{found} %}}`"),
            _ => "closing tag does not match its open tag".to_string(),
        };
        p.error(ErrorKind::StructuralMismatch, range, message);
    }
}

/// `{% if cond %} ... {% else /%} ... {% /if %}`
pub(super) fn conditional(p: &mut Parser<'_>) {
    let m = p.start();
    let open = header_line(p);
    if open.values == 0 {
        p.error(ErrorKind::StructuralMismatch, open.range.clone(), "`if` requires a condition");
    }

    blocks_until(p, at_branch_end);
    while at_else_line(p) {
        let clause = p.start();
        header_line(p);
        blocks_until(p, at_branch_end);
        clause.complete(p, SyntaxKind::ELSE_CLAUSE);
    }
    close_line(p, Some("if"));

    m.complete(p, SyntaxKind::CONDITIONAL);
}

#[cfg(test)]
mod tests {
    use crate::syntax_kind::{SyntaxKind, SyntaxNode};
    use crate::{ErrorKind, parse};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn first_node(input: &str) -> SyntaxNode {
        let parse = parse(input);
        assert_eq!(parse.syntax().text().to_string(), input);
        parse.syntax().first_child().unwrap()
    }

    fn child_kinds(node: &SyntaxNode) -> Vec<SyntaxKind> {
        node.children().map(|n| n.kind()).collect()
    }

    #[test]
    fn block_tag_with_body() {
        let tag = first_node("{% callout type=\"note\" %}\nBody.\n{% /callout %}\n");
        assert_eq!(tag.kind(), SyntaxKind::TAG);
        assert_eq!(
            child_kinds(&tag),
            vec![SyntaxKind::TAG_OPEN, SyntaxKind::PARAGRAPH, SyntaxKind::TAG_CLOSE]
        );
        let open = tag.first_child().unwrap();
        assert_eq!(child_kinds(&open), vec![SyntaxKind::ATTRIBUTE]);
    }

    #[test]
    fn nested_tags_close_innermost_first() {
        let tag = first_node("{% a %}\n{% b %}\nx\n{% /b %}\n{% /a %}\n");
        assert_eq!(
            child_kinds(&tag),
            vec![SyntaxKind::TAG_OPEN, SyntaxKind::TAG, SyntaxKind::TAG_CLOSE]
        );
    }

    #[test]
    fn mismatched_close_still_closes() {
        let input = "{% foo %}\ntext\n{% /bar %}\nafter\n";
        let parse = parse(input);
        let root = parse.syntax();
        assert_eq!(child_kinds(&root), vec![SyntaxKind::TAG, SyntaxKind::PARAGRAPH]);
        assert_eq!(parse.errors().len(), 1);
        let error = &parse.errors()[0];
        assert_eq!(error.kind, ErrorKind::StructuralMismatch);
        assert_eq!(&input[error.range], "bar");
    }

    #[test]
    fn unclosed_tag_runs_to_end() {
        let parse = parse("{% note %}\nbody\n");
        let tag = parse.syntax().first_child().unwrap();
        assert_eq!(tag.kind(), SyntaxKind::TAG);
        assert!(tag.children().any(|c| c.kind() == SyntaxKind::ERROR));
        assert_eq!(parse.errors()[0].kind, ErrorKind::UnterminatedConstruct);
    }

    #[rstest]
    #[case("{% callout type=\"a\"\nBody\n")]
    #[case("{% x a=\"open %}\nbody\n")]
    #[case("Intro\n{% note\n")]
    fn unclosed_header_is_a_tag(#[case] input: &str) {
        let parse = parse(input);
        let root = parse.syntax();
        assert_eq!(root.text().to_string(), input);
        let tag = root.children().find(|n| n.kind() == SyntaxKind::TAG);
        assert!(tag.is_some(), "no tag in:\n{}", parse.debug_tree());
        assert!(
            parse
                .errors()
                .iter()
                .any(|e| e.kind == ErrorKind::UnterminatedConstruct)
        );
    }

    #[rstest]
    #[case("{% partial file=\"x.md\" /%}\n", SyntaxKind::TAG_SELF_CLOSE)]
    #[case("{% multi\n   line=true %}\n{% /multi %}\n", SyntaxKind::TAG_OPEN)]
    fn header_shapes(#[case] input: &str, #[case] expected: SyntaxKind) {
        let tag = first_node(input);
        assert_eq!(tag.first_child().unwrap().kind(), expected);
    }

    #[test]
    fn shorthand_attributes() {
        let tag = first_node("{% section #intro .wide .dark %}\n{% /section %}\n");
        let open = tag.first_child().unwrap();
        assert_eq!(
            child_kinds(&open),
            vec![
                SyntaxKind::SHORTHAND_ID,
                SyntaxKind::SHORTHAND_CLASS,
                SyntaxKind::SHORTHAND_CLASS,
            ]
        );
    }

    #[test]
    fn conditional_with_else_branches() {
        let cond = first_node("{% if $a %}\none\n{% else $b /%}\ntwo\n{% else /%}\nthree\n{% /if %}\n");
        assert_eq!(cond.kind(), SyntaxKind::CONDITIONAL);
        assert_eq!(
            child_kinds(&cond),
            vec![
                SyntaxKind::TAG_OPEN,
                SyntaxKind::PARAGRAPH,
                SyntaxKind::ELSE_CLAUSE,
                SyntaxKind::ELSE_CLAUSE,
                SyntaxKind::TAG_CLOSE,
            ]
        );
        let clause = cond.children().nth(2).unwrap();
        assert_eq!(
            child_kinds(&clause),
            vec![SyntaxKind::TAG_SELF_CLOSE, SyntaxKind::PARAGRAPH]
        );
    }

    #[test]
    fn if_without_condition_is_reported() {
        let parse = parse("{% if %}\nx\n{% /if %}\n");
        assert_eq!(parse.syntax().first_child().unwrap().kind(), SyntaxKind::CONDITIONAL);
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].kind, ErrorKind::StructuralMismatch);
    }

    #[test]
    fn unexpected_token_in_header() {
        let parse = parse("{% foo ; %}\n{% /foo %}\n");
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].kind, ErrorKind::LexFailure);
    }
}
