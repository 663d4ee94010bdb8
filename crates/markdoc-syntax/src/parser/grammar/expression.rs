//! Expression grammar for tag attributes and `{{ }}` interpolation.
//!
//! A Pratt parser over [`Mode::Expr`](crate::lexer::Mode) lexemes. Binary
//! operators are left associative; prefix operators bind tighter than any
//! binary operator; member access, calls and indexing bind tightest and
//! must touch their operand (`a.b`, `f(x)`, `a[0]`), which keeps `.class`
//! shorthands in tag headers apart from member access.
//!
//! Trivia between operands is consumed only when an infix operator follows,
//! so an expression node never ends in whitespace.

use crate::error::ErrorKind;
use crate::parser::{CompletedMarker, Parser};
use crate::syntax_kind::SyntaxKind;

const PREFIX_BP: u8 = 13;

/// Binding powers of an infix operator.
fn infix_bp(kind: SyntaxKind) -> Option<(u8, u8)> {
    Some(match kind {
        SyntaxKind::PIPE2 => (1, 2),
        SyntaxKind::AMP2 => (3, 4),
        SyntaxKind::EQ2 | SyntaxKind::NEQ => (5, 6),
        SyntaxKind::LT | SyntaxKind::GT | SyntaxKind::LTEQ | SyntaxKind::GTEQ => (7, 8),
        SyntaxKind::PLUS | SyntaxKind::MINUS => (9, 10),
        SyntaxKind::STAR | SyntaxKind::SLASH | SyntaxKind::PERCENT => (11, 12),
        _ => return None,
    })
}

/// Lexemes that end the enclosing tag or interpolation.
fn is_terminator(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::EOF
            | SyntaxKind::TAG_END
            | SyntaxKind::SELF_CLOSE_END
            | SyntaxKind::INTERP_END
            | SyntaxKind::TAG_START
            | SyntaxKind::INTERP_START
    )
}

/// True when `kind` can begin an expression.
pub(super) fn at_expression_start(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::DOLLAR
            | SyntaxKind::AT
            | SyntaxKind::IDENT
            | SyntaxKind::STRING
            | SyntaxKind::NUMBER
            | SyntaxKind::TRUE_KW
            | SyntaxKind::FALSE_KW
            | SyntaxKind::NULL_KW
            | SyntaxKind::L_BRACK
            | SyntaxKind::L_CURLY
            | SyntaxKind::L_PAREN
            | SyntaxKind::BANG
            | SyntaxKind::MINUS
            | SyntaxKind::PLUS
    )
}

/// Parse one expression. Returns `None` without consuming anything when
/// no expression starts at the cursor.
pub(super) fn expression(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    expr_bp(p, 0)
}

/// Parse an expression, or record that one is missing.
fn expect_expression(p: &mut Parser<'_>, min_bp: u8) {
    if expr_bp(p, min_bp).is_none() {
        p.missing(ErrorKind::Expected, "expected expression");
    }
}

fn expr_bp(p: &mut Parser<'_>, min_bp: u8) -> Option<CompletedMarker> {
    if !at_expression_start(p.current()) {
        return None;
    }
    if !p.enter() {
        return Some(too_deep(p));
    }
    let result = pratt(p, min_bp);
    p.leave();
    result
}

fn pratt(p: &mut Parser<'_>, min_bp: u8) -> Option<CompletedMarker> {
    if min_bp == 0 && at_arrow(p) {
        return Some(arrow_function(p));
    }

    let mut lhs = prefix(p)?;

    loop {
        let (op, _) = p.peek_non_trivia();
        let Some((l_bp, r_bp)) = infix_bp(op) else {
            break;
        };
        if l_bp < min_bp {
            break;
        }
        let m = lhs.precede(p);
        p.eat_trivia();
        p.bump();
        p.eat_trivia();
        expect_expression(p, r_bp);
        lhs = m.complete(p, SyntaxKind::BINARY_EXPRESSION);
    }

    Some(lhs)
}

fn prefix(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    match p.current() {
        SyntaxKind::MINUS if p.nth(1) == SyntaxKind::NUMBER => {
            // `-1` in operand position is a single negative literal
            let m = p.start();
            let len = p.lookahead().nth(2).map_or(p.end(), |(_, at)| at) - p.pos();
            p.bump_raw(len, SyntaxKind::NUMBER);
            let literal = m.complete(p, SyntaxKind::LITERAL);
            Some(postfix(p, literal))
        }
        SyntaxKind::BANG | SyntaxKind::MINUS | SyntaxKind::PLUS => {
            let m = p.start();
            p.bump();
            expect_expression(p, PREFIX_BP);
            Some(m.complete(p, SyntaxKind::UNARY_EXPRESSION))
        }
        _ => {
            let primary = primary(p)?;
            Some(postfix(p, primary))
        }
    }
}

/// Member access, calls and indexing directly after `lhs`.
fn postfix(p: &mut Parser<'_>, mut lhs: CompletedMarker) -> CompletedMarker {
    loop {
        match p.current() {
            SyntaxKind::DOT if p.nth(1) == SyntaxKind::IDENT => {
                let m = lhs.precede(p);
                p.bump();
                identifier(p);
                lhs = m.complete(p, SyntaxKind::MEMBER_EXPRESSION);
            }
            SyntaxKind::L_PAREN => {
                let m = lhs.precede(p);
                let args = p.start();
                p.bump();
                sequence(p, SyntaxKind::R_PAREN, "`)`");
                args.complete(p, SyntaxKind::ARGUMENT_LIST);
                lhs = m.complete(p, SyntaxKind::CALL_EXPRESSION);
            }
            SyntaxKind::L_BRACK => {
                let m = lhs.precede(p);
                p.bump();
                p.eat_trivia();
                expect_expression(p, 0);
                p.eat_trivia();
                if !p.eat(SyntaxKind::R_BRACK) {
                    p.missing(ErrorKind::Expected, "expected `]`");
                }
                lhs = m.complete(p, SyntaxKind::INDEX_EXPRESSION);
            }
            _ => return lhs,
        }
    }
}

fn primary(p: &mut Parser<'_>) -> Option<CompletedMarker> {
    let m = p.start();
    let kind = match p.current() {
        SyntaxKind::DOLLAR => {
            p.bump();
            variable_name(p);
            SyntaxKind::VARIABLE
        }
        SyntaxKind::AT => {
            p.bump();
            variable_name(p);
            SyntaxKind::SPECIAL_VARIABLE
        }
        SyntaxKind::IDENT => {
            p.bump();
            SyntaxKind::IDENTIFIER
        }
        SyntaxKind::STRING
        | SyntaxKind::NUMBER
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW
        | SyntaxKind::NULL_KW => {
            p.bump();
            SyntaxKind::LITERAL
        }
        SyntaxKind::L_BRACK => {
            p.bump();
            sequence(p, SyntaxKind::R_BRACK, "`]`");
            SyntaxKind::ARRAY_LITERAL
        }
        SyntaxKind::L_CURLY => {
            p.bump();
            object_body(p);
            SyntaxKind::OBJECT_LITERAL
        }
        SyntaxKind::L_PAREN => {
            p.bump();
            p.eat_trivia();
            expect_expression(p, 0);
            p.eat_trivia();
            if !p.eat(SyntaxKind::R_PAREN) {
                p.missing(ErrorKind::Expected, "expected `)`");
            }
            SyntaxKind::PARENTHESIZED_EXPRESSION
        }
        _ => {
            m.abandon(p);
            return None;
        }
    };
    Some(m.complete(p, kind))
}

fn variable_name(p: &mut Parser<'_>) {
    if !p.eat(SyntaxKind::IDENT) {
        p.missing(ErrorKind::Expected, "expected variable name");
    }
}

fn identifier(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    m.complete(p, SyntaxKind::IDENTIFIER);
}

/// Comma-separated expressions up to `close`; trailing comma allowed.
fn sequence(p: &mut Parser<'_>, close: SyntaxKind, expected: &str) {
    loop {
        p.eat_trivia();
        let kind = p.current();
        if kind == close {
            p.bump();
            return;
        }
        if is_terminator(kind) {
            p.missing(ErrorKind::Expected, format!("expected {expected}"));
            return;
        }
        if expression(p).is_none() {
            p.err_and_bump("expected expression");
            continue;
        }
        separator(p, close);
    }
}

/// `key: value` pairs up to `}`. A `}}` closing both this object and an
/// enclosing one is split.
fn object_body(p: &mut Parser<'_>) {
    loop {
        p.eat_trivia();
        match p.current() {
            SyntaxKind::R_CURLY => {
                p.bump();
                return;
            }
            SyntaxKind::INTERP_END => {
                p.bump_raw(1, SyntaxKind::R_CURLY);
                return;
            }
            kind if is_terminator(kind) => {
                p.missing(ErrorKind::Expected, "expected `}`");
                return;
            }
            SyntaxKind::IDENT | SyntaxKind::STRING => {
                pair(p);
                separator(p, SyntaxKind::R_CURLY);
            }
            _ => p.err_and_bump("expected object key"),
        }
    }
}

fn pair(p: &mut Parser<'_>) {
    let m = p.start();
    p.bump();
    p.eat_trivia();
    if !p.eat(SyntaxKind::COLON) {
        p.missing(ErrorKind::Expected, "expected `:`");
    }
    p.eat_trivia();
    expect_expression(p, 0);
    m.complete(p, SyntaxKind::PAIR);
}

/// A comma, or a diagnostic when the next item follows without one.
fn separator(p: &mut Parser<'_>, close: SyntaxKind) {
    let (next, at) = p.peek_non_trivia();
    if next == SyntaxKind::COMMA {
        p.eat_trivia();
        p.bump();
    } else if next != close && !(close == SyntaxKind::R_CURLY && next == SyntaxKind::INTERP_END) && !is_terminator(next) {
        p.error(ErrorKind::Expected, at..at, "expected `,`");
    }
}

/// `x =>` or `(a, b) =>` at the cursor.
fn at_arrow(p: &Parser<'_>) -> bool {
    let mut tokens = p.lookahead().map(|(kind, _)| kind).filter(|k| !k.is_trivia());
    match tokens.next() {
        Some(SyntaxKind::IDENT) => tokens.next() == Some(SyntaxKind::FAT_ARROW),
        Some(SyntaxKind::L_PAREN) => {
            let mut depth = 1;
            for kind in tokens.by_ref() {
                match kind {
                    SyntaxKind::L_PAREN => depth += 1,
                    SyntaxKind::R_PAREN => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    k if is_terminator(k) => return false,
                    _ => {}
                }
            }
            depth == 0 && tokens.next() == Some(SyntaxKind::FAT_ARROW)
        }
        _ => false,
    }
}

fn arrow_function(p: &mut Parser<'_>) -> CompletedMarker {
    let m = p.start();
    let params = p.start();
    if p.eat(SyntaxKind::L_PAREN) {
        loop {
            p.eat_trivia();
            match p.current() {
                SyntaxKind::R_PAREN => {
                    p.bump();
                    break;
                }
                SyntaxKind::IDENT => {
                    identifier(p);
                    separator(p, SyntaxKind::R_PAREN);
                }
                kind if is_terminator(kind) => {
                    p.missing(ErrorKind::Expected, "expected `)`");
                    break;
                }
                _ => p.err_and_bump("expected parameter name"),
            }
        }
    } else {
        identifier(p);
    }
    params.complete(p, SyntaxKind::PARAMETER_LIST);

    p.eat_trivia();
    p.bump();
    p.eat_trivia();
    expect_expression(p, 0);
    m.complete(p, SyntaxKind::ARROW_FUNCTION)
}

/// Past the nesting limit: swallow one balanced group into an `ERROR` node.
fn too_deep(p: &mut Parser<'_>) -> CompletedMarker {
    let m = p.start();
    let start = p.pos();
    let mut depth = 0usize;
    loop {
        let kind = p.current();
        match kind {
            k if is_terminator(k) => break,
            SyntaxKind::R_PAREN | SyntaxKind::R_BRACK | SyntaxKind::R_CURLY if depth == 0 => break,
            SyntaxKind::L_PAREN | SyntaxKind::L_BRACK | SyntaxKind::L_CURLY => depth += 1,
            SyntaxKind::R_PAREN | SyntaxKind::R_BRACK | SyntaxKind::R_CURLY => depth -= 1,
            _ => {}
        }
        p.bump();
        if depth == 0 {
            break;
        }
    }
    p.error(ErrorKind::NestingLimit, start..p.pos(), "expression nested too deeply");
    m.complete(p, SyntaxKind::ERROR)
}
