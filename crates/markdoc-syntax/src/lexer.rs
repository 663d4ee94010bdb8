//! # Lexer - Context-Free Lexemes
//!
//! This module provides the context-free half of tokenization, using the
//! [Logos] lexer generator. The context-sensitive half (blank lines, list
//! structure, fences, emphasis delimiters and friends) lives in
//! [`scanner`](crate::scanner).
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Two Modes
//!
//! Markdoc mixes two very different sub-languages, so there are two token
//! enums and a [`Mode`] selecting between them:
//!
//! - [`Mode::Markup`] for prose: text runs, whitespace, escapes, backtick
//!   runs, emphasis characters, brackets and the `{%` / `{{` openers.
//! - [`Mode::Expr`] for the inside of `{% %}` and `{{ }}`: identifiers,
//!   literals, operators and punctuation.
//!
//! The parser lexes on demand, one lexeme at a time, in whichever mode the
//! grammar is currently in.
//!
//! ## The Lossless Guarantee
//!
//! Every byte of the input appears in exactly one lexeme. Bytes no rule
//! accepts become single-character `TEXT` (markup) or `UNKNOWN` (expression)
//! lexemes:
//!
//! ```
//! use markdoc_syntax::lexer::{lex, Mode};
//!
//! let input = "Some *text* with {{ $var }}\n";
//! let tokens = lex(Mode::Markup, input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```

use logos::Logos;

use crate::syntax_kind::SyntaxKind;

/// Which sub-language the lexer is reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Prose and block structure.
    #[default]
    Markup,
    /// Tag headers and `{{ }}` interpolations.
    Expr,
}

/// Lexemes of [`Mode::Markup`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupToken {
    /// Horizontal whitespace (spaces, tabs)
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Line ending (LF or CRLF)
    #[regex(r"\r?\n")]
    Newline,

    /// Backslash followed by ASCII punctuation
    #[regex(r"\\[!-/:-@\[-`{-~]")]
    Escape,

    /// Backtick run for code spans and fences
    #[regex(r"`+")]
    Backticks,

    /// `*` for emphasis
    #[token("*")]
    Star,

    /// `_` for emphasis
    #[token("_")]
    Underscore,

    #[token("![")]
    ImageStart,

    #[token("!")]
    Bang,

    #[token("[")]
    LBrack,

    #[token("]")]
    RBrack,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    /// `<` for inline HTML
    #[token("<")]
    Lt,

    /// `|` for pipe tables
    #[token("|")]
    Pipe,

    #[token("{%")]
    TagStart,

    #[token("{{")]
    InterpStart,

    #[token("{")]
    LCurly,

    /// Plain text - anything not matched by other rules
    #[regex(r"[^ \t\r\n\\`*_\[\]()!<|{]+")]
    Text,
}

impl MarkupToken {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            MarkupToken::Whitespace => SyntaxKind::WHITESPACE,
            MarkupToken::Newline => SyntaxKind::NEWLINE,
            MarkupToken::Escape => SyntaxKind::ESCAPE,
            MarkupToken::Backticks => SyntaxKind::BACKTICKS,
            MarkupToken::Star => SyntaxKind::STAR,
            MarkupToken::Underscore => SyntaxKind::UNDERSCORE,
            MarkupToken::ImageStart => SyntaxKind::IMAGE_START,
            MarkupToken::LBrack => SyntaxKind::L_BRACK,
            MarkupToken::RBrack => SyntaxKind::R_BRACK,
            MarkupToken::LParen => SyntaxKind::L_PAREN,
            MarkupToken::RParen => SyntaxKind::R_PAREN,
            MarkupToken::Lt => SyntaxKind::LT,
            MarkupToken::Pipe => SyntaxKind::PIPE,
            MarkupToken::TagStart => SyntaxKind::TAG_START,
            MarkupToken::InterpStart => SyntaxKind::INTERP_START,
            MarkupToken::Bang | MarkupToken::LCurly | MarkupToken::Text => SyntaxKind::TEXT,
        }
    }
}

/// Lexemes of [`Mode::Expr`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprToken {
    #[regex(r"[ \t]+")]
    Whitespace,

    #[regex(r"\r?\n")]
    Newline,

    #[token("{%")]
    TagStart,

    #[token("%}")]
    TagEnd,

    #[token("/%}")]
    SelfCloseEnd,

    #[token("{{")]
    InterpStart,

    #[token("}}")]
    InterpEnd,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\]|\\(.|\n))*""#)]
    #[regex(r#"'([^'\\]|\\(.|\n))*'"#)]
    String,

    /// A quote that never closes; runs to end of input
    #[regex(r#""([^"\\]|\\(.|\n))*"#)]
    #[regex(r#"'([^'\\]|\\(.|\n))*"#)]
    UnterminatedString,

    #[token("$")]
    Dollar,
    #[token("@")]
    At,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token("{")]
    LCurly,
    #[token("}")]
    RCurly,
    #[token("=")]
    Eq,
    #[token("=>")]
    FatArrow,
    #[token("==")]
    Eq2,
    #[token("!=")]
    Neq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    Amp2,
    #[token("||")]
    Pipe2,
    #[token("!")]
    Bang,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("#")]
    Hash,
}

impl ExprToken {
    /// Convert to SyntaxKind. Unterminated strings still report `STRING`;
    /// see [`Lexeme::unterminated`].
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            ExprToken::Whitespace => SyntaxKind::WHITESPACE,
            ExprToken::Newline => SyntaxKind::NEWLINE,
            ExprToken::TagStart => SyntaxKind::TAG_START,
            ExprToken::TagEnd => SyntaxKind::TAG_END,
            ExprToken::SelfCloseEnd => SyntaxKind::SELF_CLOSE_END,
            ExprToken::InterpStart => SyntaxKind::INTERP_START,
            ExprToken::InterpEnd => SyntaxKind::INTERP_END,
            ExprToken::True => SyntaxKind::TRUE_KW,
            ExprToken::False => SyntaxKind::FALSE_KW,
            ExprToken::Null => SyntaxKind::NULL_KW,
            ExprToken::Ident => SyntaxKind::IDENT,
            ExprToken::Number => SyntaxKind::NUMBER,
            ExprToken::String | ExprToken::UnterminatedString => SyntaxKind::STRING,
            ExprToken::Dollar => SyntaxKind::DOLLAR,
            ExprToken::At => SyntaxKind::AT,
            ExprToken::Dot => SyntaxKind::DOT,
            ExprToken::Comma => SyntaxKind::COMMA,
            ExprToken::Colon => SyntaxKind::COLON,
            ExprToken::LParen => SyntaxKind::L_PAREN,
            ExprToken::RParen => SyntaxKind::R_PAREN,
            ExprToken::LBrack => SyntaxKind::L_BRACK,
            ExprToken::RBrack => SyntaxKind::R_BRACK,
            ExprToken::LCurly => SyntaxKind::L_CURLY,
            ExprToken::RCurly => SyntaxKind::R_CURLY,
            ExprToken::Eq => SyntaxKind::EQ,
            ExprToken::FatArrow => SyntaxKind::FAT_ARROW,
            ExprToken::Eq2 => SyntaxKind::EQ2,
            ExprToken::Neq => SyntaxKind::NEQ,
            ExprToken::Lt => SyntaxKind::LT,
            ExprToken::Gt => SyntaxKind::GT,
            ExprToken::LtEq => SyntaxKind::LTEQ,
            ExprToken::GtEq => SyntaxKind::GTEQ,
            ExprToken::Amp2 => SyntaxKind::AMP2,
            ExprToken::Pipe2 => SyntaxKind::PIPE2,
            ExprToken::Bang => SyntaxKind::BANG,
            ExprToken::Plus => SyntaxKind::PLUS,
            ExprToken::Minus => SyntaxKind::MINUS,
            ExprToken::Star => SyntaxKind::STAR,
            ExprToken::Slash => SyntaxKind::SLASH,
            ExprToken::Percent => SyntaxKind::PERCENT,
            ExprToken::Hash => SyntaxKind::HASH,
        }
    }
}

/// A single lexeme at some position: its kind and byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: SyntaxKind,
    pub len: usize,
    /// A string literal that reached end of input without its closing quote.
    pub unterminated: bool,
}

impl Lexeme {
    /// End of input, or of the region the parser is limited to.
    pub const EOF: Lexeme = Lexeme {
        kind: SyntaxKind::EOF,
        len: 0,
        unterminated: false,
    };
}

/// Lex one lexeme from the start of `text`.
///
/// Returns an `EOF` lexeme of length zero for empty input; every other
/// lexeme is at least one character long.
pub fn next_lexeme(mode: Mode, text: &str) -> Lexeme {
    let Some(first) = text.chars().next() else {
        return Lexeme::EOF;
    };
    let fallback = match mode {
        Mode::Markup => SyntaxKind::TEXT,
        Mode::Expr => SyntaxKind::UNKNOWN,
    };
    let unknown = Lexeme {
        kind: fallback,
        len: first.len_utf8(),
        unterminated: false,
    };

    match mode {
        Mode::Markup => {
            let mut lexer = MarkupToken::lexer(text);
            match lexer.next() {
                Some(Ok(token)) => Lexeme {
                    kind: token.to_syntax_kind(),
                    len: lexer.span().len(),
                    unterminated: false,
                },
                _ => unknown,
            }
        }
        Mode::Expr => {
            let mut lexer = ExprToken::lexer(text);
            match lexer.next() {
                Some(Ok(token)) => Lexeme {
                    kind: token.to_syntax_kind(),
                    len: lexer.span().len(),
                    unterminated: token == ExprToken::UnterminatedString,
                },
                _ => unknown,
            }
        }
    }
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
}

/// Lex the whole input in one mode.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(mode: Mode, input: &str) -> Vec<Token<'_>> {
    lex_with_spans(mode, input)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(mode: Mode, input: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let lexeme = next_lexeme(mode, &input[pos..]);
        let span = pos..pos + lexeme.len;
        tokens.push((
            Token {
                kind: lexeme.kind,
                text: &input[span.clone()],
            },
            span,
        ));
        pos += lexeme.len;
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn token(kind: SyntaxKind, text: &str) -> Token<'_> {
        Token { kind, text }
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex(Mode::Markup, ""), vec![]);
        assert_eq!(next_lexeme(Mode::Expr, "").kind, SyntaxKind::EOF);
    }

    #[test]
    fn lex_plain_text() {
        let tokens = lex(Mode::Markup, "hello, world");
        assert_eq!(
            tokens,
            vec![
                token(SyntaxKind::TEXT, "hello,"),
                token(SyntaxKind::WHITESPACE, " "),
                token(SyntaxKind::TEXT, "world"),
            ]
        );
    }

    #[test]
    fn lex_newline_crlf() {
        let tokens = lex(Mode::Markup, "\r\n");
        assert_eq!(tokens, vec![token(SyntaxKind::NEWLINE, "\r\n")]);
    }

    #[test]
    fn lex_markup_delimiters() {
        let tokens = lex(Mode::Markup, "*a_ `x` ![i]");
        assert_eq!(
            tokens,
            vec![
                token(SyntaxKind::STAR, "*"),
                token(SyntaxKind::TEXT, "a"),
                token(SyntaxKind::UNDERSCORE, "_"),
                token(SyntaxKind::WHITESPACE, " "),
                token(SyntaxKind::BACKTICKS, "`"),
                token(SyntaxKind::TEXT, "x"),
                token(SyntaxKind::BACKTICKS, "`"),
                token(SyntaxKind::WHITESPACE, " "),
                token(SyntaxKind::IMAGE_START, "!["),
                token(SyntaxKind::TEXT, "i"),
                token(SyntaxKind::R_BRACK, "]"),
            ]
        );
    }

    #[test]
    fn lex_markup_tag_openers() {
        let tokens = lex(Mode::Markup, "{% x {{ {");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::TAG_START,
                SyntaxKind::WHITESPACE,
                SyntaxKind::TEXT,
                SyntaxKind::WHITESPACE,
                SyntaxKind::INTERP_START,
                SyntaxKind::WHITESPACE,
                SyntaxKind::TEXT,
            ]
        );
    }

    #[test]
    fn lone_backslash_is_text() {
        let tokens = lex(Mode::Markup, "a\\b\\*");
        assert_eq!(
            tokens,
            vec![
                token(SyntaxKind::TEXT, "a"),
                token(SyntaxKind::TEXT, "\\"),
                token(SyntaxKind::TEXT, "b"),
                token(SyntaxKind::ESCAPE, "\\*"),
            ]
        );
    }

    #[rstest]
    #[case("%}", SyntaxKind::TAG_END)]
    #[case("/%}", SyntaxKind::SELF_CLOSE_END)]
    #[case("}}", SyntaxKind::INTERP_END)]
    #[case("=>", SyntaxKind::FAT_ARROW)]
    #[case("==", SyntaxKind::EQ2)]
    #[case("<=", SyntaxKind::LTEQ)]
    #[case("&&", SyntaxKind::AMP2)]
    #[case("||", SyntaxKind::PIPE2)]
    #[case("true", SyntaxKind::TRUE_KW)]
    #[case("trueish", SyntaxKind::IDENT)]
    #[case("null", SyntaxKind::NULL_KW)]
    #[case("3.25", SyntaxKind::NUMBER)]
    #[case("'it\\'s'", SyntaxKind::STRING)]
    #[case("\"a\"", SyntaxKind::STRING)]
    fn lex_expression_lexemes(#[case] input: &str, #[case] kind: SyntaxKind) {
        let lexeme = next_lexeme(Mode::Expr, input);
        assert_eq!(lexeme.kind, kind);
        assert_eq!(lexeme.len, input.len());
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        let lexeme = next_lexeme(Mode::Expr, "\"open %}\nmore");
        assert_eq!(lexeme.kind, SyntaxKind::STRING);
        assert!(lexeme.unterminated);
        assert_eq!(lexeme.len, "\"open %}\nmore".len());
    }

    #[test]
    fn unknown_expression_character_advances_one_char() {
        let lexeme = next_lexeme(Mode::Expr, "é!");
        assert_eq!(lexeme.kind, SyntaxKind::UNKNOWN);
        assert_eq!(lexeme.len, 'é'.len_utf8());
    }

    #[test]
    fn all_bytes_preserved() {
        let input = "# Héllo\n> quote {% tag a=1 %}\n- item `x` \\*";
        for mode in [Mode::Markup, Mode::Expr] {
            let reconstructed: String = lex(mode, input).iter().map(|t| t.text).collect();
            assert_eq!(input, reconstructed);
        }
    }
}
