//! # markdoc-syntax
//!
//! A lossless syntax tree for [Markdoc] documents using [Rowan] + [Logos],
//! following the [rust-analyzer] architecture model.
//!
//! [Markdoc]: https://markdoc.dev
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! ## What is a Lossless CST?
//!
//! A Concrete Syntax Tree keeps **every byte** of the source: whitespace,
//! delimiters, malformed fragments. Concatenating the leaf tokens of any
//! parse gives back the input exactly, even when the input is broken. Parse
//! problems are reported next to the tree as [`SyntaxError`]s instead of
//! aborting.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source ─┬─ Lexer (Logos, Markup/Expr mode) ─┐
//!         └─ Scanner (ScannerState)  ─────────┴─ Parser → Events → Sink → Rowan Tree
//! ```
//!
//! ### 1. Lexer ([`lexer`])
//!
//! Two Logos token sets: one for prose, one for the insides of `{% %}` and
//! `{{ }}`. The parser lexes one token at a time in whichever mode the
//! grammar is in.
//!
//! ### 2. Scanner ([`scanner`])
//!
//! Terminals that depend on context (indentation, open fences, emphasis
//! flanking, frontmatter) come from a pure function of
//! `(ScannerState, cursor, valid kinds)`. The state is a plain value that
//! can be cloned, compared and serialized.
//!
//! ### 3. Parser ([`parser`])
//!
//! Hand-written recursive descent emitting events. Where several block
//! rules could start on the same line, [`policy`] picks the winner from a
//! declared precedence and conflict table that is checked at compile time.
//!
//! ### 4. Typed view ([`ast`])
//!
//! Thin wrappers over the untyped nodes with accessors such as
//! [`ast::Tag::name`] and [`ast::Heading::level`].
//!
//! ## Module Structure
//!
//! ```text
//! markdoc-syntax/
//! ├── lib.rs           # This file - public API and integration tests
//! ├── syntax_kind.rs   # SyntaxKind enum (tokens + nodes) and Rowan integration
//! ├── lexer.rs         # Logos-based tokenizer, two modes
//! ├── scanner/         # Context-sensitive terminals and ScannerState
//! ├── policy.rs        # Block precedence and conflict table
//! ├── error.rs         # SyntaxError, ErrorKind, GrammarError
//! ├── options.rs       # ParseOptions
//! ├── ast.rs           # Typed accessors, field names, S-expressions
//! └── parser/
//!     ├── mod.rs       # Parser, markers, snapshots, parse()
//!     ├── event.rs     # Event enum
//!     ├── sink.rs      # Converts events to a Rowan GreenNode
//!     └── grammar/     # block, tag, table, inline and expression rules
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use markdoc_syntax::{parse, SyntaxKind};
//!
//! let input = "# Hello\n\n{% note %}\nHi {{ $name }}\n{% /note %}\n";
//! let parse = parse(input);
//!
//! // The tree preserves all text
//! assert_eq!(parse.syntax().text().to_string(), input);
//! assert!(parse.errors().is_empty());
//!
//! // Navigate the tree structure
//! let root = parse.syntax();
//! assert_eq!(root.kind(), SyntaxKind::ROOT);
//! let kinds: Vec<_> = root.children().map(|n| n.kind()).collect();
//! assert_eq!(kinds, [SyntaxKind::HEADING, SyntaxKind::TAG]);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod policy;
pub mod scanner;
pub mod syntax_kind;

pub use error::{ErrorKind, GrammarError, StateError, SyntaxError};
pub use options::ParseOptions;
pub use parser::{Checkpoint, Parse, parse, parse_with};
pub use scanner::ScannerState;
pub use syntax_kind::{MarkdocLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstNode, Block};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Parse a fixture from `src/corpus` and check the invariants every
    /// document must hold. Fixtures named `err_*` must produce diagnostics,
    /// all others must parse cleanly.
    fn corpus_test(name: &str) {
        init_logging();
        let path = format!("{}/src/corpus/{name}.mdoc", env!("CARGO_MANIFEST_DIR"));
        let input = std::fs::read_to_string(&path).unwrap();
        let parse = parse(&input);

        assert_eq!(parse.syntax().text().to_string(), input, "{name} is not lossless");
        assert_eq!(parse.green(), super::parse(&input).green(), "{name} is not deterministic");
        if name.starts_with("err_") {
            assert!(!parse.errors().is_empty(), "{name} should report errors");
        } else {
            assert!(
                parse.errors().is_empty(),
                "{name} reported {:?}\n{}",
                parse.errors(),
                parse.debug_tree()
            );
        }
        for error in parse.errors() {
            assert!(usize::from(error.range.end()) <= input.len());
        }
    }

    include!(concat!(env!("OUT_DIR"), "/corpus_tests.rs"));

    #[test]
    fn snapshot_heading() {
        assert_snapshot!(parse("# Hello\n").debug_tree(), @r##"
        ROOT@0..8
          HEADING@0..8
            HEADING_MARKER@0..2 "# "
            HEADING_TEXT@2..7
              TEXT@2..7 "Hello"
            NEWLINE@7..8 "\n"
        "##);
    }

    #[test]
    fn snapshot_interpolation() {
        assert_snapshot!(parse("{{ $x }}\n").debug_tree(), @r#"
        ROOT@0..9
          PARAGRAPH@0..9
            INLINE_EXPRESSION@0..8
              INTERP_START@0..2 "{{"
              WHITESPACE@2..3 " "
              VARIABLE@3..5
                DOLLAR@3..4 "$"
                IDENT@4..5 "x"
              WHITESPACE@5..6 " "
              INTERP_END@6..8 "}}"
            NEWLINE@8..9 "\n"
        "#);
    }

    #[test]
    fn callout_document() {
        init_logging();
        let input = "# Title\n{% callout type=\"warning\" %}\nBe careful with $value.\n{% /callout %}\n";
        let parse = parse(input);
        assert!(parse.errors().is_empty());

        let blocks: Vec<_> = parse.document().blocks().collect();
        let [Block::Heading(heading), Block::Tag(tag)] = blocks.as_slice() else {
            panic!("unexpected blocks:\n{}", parse.debug_tree());
        };
        assert_eq!(heading.title(), "Title");
        assert_eq!(tag.name().as_deref(), Some("callout"));
        assert_eq!(
            tag.attribute("type").and_then(|v| v.as_str()).as_deref(),
            Some("warning")
        );
        let body: Vec<_> = tag.body().collect();
        let [Block::Paragraph(para)] = body.as_slice() else {
            panic!("unexpected body:\n{}", parse.debug_tree());
        };
        assert_eq!(para.content(), "Be careful with $value.");
        assert!(!para.syntax().descendants().any(|n| n.kind() == SyntaxKind::VARIABLE));
    }

    #[test]
    fn emphasis_stops_at_first_closer() {
        let parse = parse("*a*b*\n");
        let para = parse.syntax().first_child().unwrap();
        let emphasis = para.first_child().unwrap();
        assert_eq!(emphasis.kind(), SyntaxKind::EMPHASIS);
        assert_eq!(emphasis.text().to_string(), "*a*");
        assert_eq!(para.children().count(), 1);
    }

    #[test]
    fn mismatched_close_is_one_diagnostic() {
        let parse = parse("{% foo %}\nx\n{% /bar %}\n");
        let Some(Block::Tag(tag)) = parse.document().blocks().next() else {
            panic!("expected a tag:\n{}", parse.debug_tree());
        };
        assert!(tag.is_mismatched());
        assert_eq!(parse.errors().len(), 1);
        assert_eq!(parse.errors()[0].kind, ErrorKind::StructuralMismatch);
    }

    #[test]
    fn messy_input_keeps_every_byte() {
        let input = r#"---
title: [unclosed
# Draft

{% callout type= %}
Some *half done emphasis and `open code

{% if $a && %}
{{ $x.
```js
never closed
"#;
        let parse = parse(input);
        assert_eq!(parse.syntax().text().to_string(), input);
        assert!(!parse.errors().is_empty());
    }

    #[test]
    fn roundtrip_preserves_text() {
        let inputs = [
            "Hello, world!\n",
            "# Heading\n",
            "> Quote\n",
            "- Item\n  - Nested\n",
            "```\ncode\n```\n",
            "[link](url)\n",
            "*emphasis* and **strong**\n",
            "`code span`\n",
            "{% tag a=1 b=\"x\" #id .c /%}\n",
            "{{ f($a, [1, 2], {k: true}) }}\n",
            "| a | b |\n|---|---|\n| 1 | 2 |\n",
            "\r\nwindows\r\nlines\r\n",
            "",
        ];

        for input in inputs {
            assert_eq!(
                parse(input).syntax().text().to_string(),
                input,
                "Roundtrip failed for: {:?}",
                input
            );
        }
    }

    #[test]
    fn repeated_parses_share_structure() {
        let input = "# A\n\n- one\n- two\n\n{% x %}\nbody\n{% /x %}\n";
        assert_eq!(parse(input).green(), parse(input).green());
        assert_eq!(parse(input).debug_tree(), parse(input).debug_tree());
    }

    #[test]
    fn grammar_table_is_consistent() {
        assert_eq!(policy::validate(), Ok(()));
    }
}
