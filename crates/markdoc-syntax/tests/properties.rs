//! Property-based tests for the parser: every input, well-formed or not,
//! must come back byte for byte from the tree.

use markdoc_syntax::lexer::{Mode, lex};
use markdoc_syntax::{SyntaxKind, parse};
use proptest::prelude::*;

/// Fragments that exercise every construct, glued together at random so
/// they nest, interleave and break each other.
fn fragment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{1,12}",
        Just("\n".to_string()),
        Just("\n\n".to_string()),
        Just("\r\n".to_string()),
        Just("# ".to_string()),
        Just("- ".to_string()),
        Just("1. ".to_string()),
        Just("  ".to_string()),
        Just("\t".to_string()),
        Just("> ".to_string()),
        Just("---".to_string()),
        Just("```".to_string()),
        Just("~~~".to_string()),
        Just("*".to_string()),
        Just("**".to_string()),
        Just("_".to_string()),
        Just("`".to_string()),
        Just("[".to_string()),
        Just("](".to_string()),
        Just(")".to_string()),
        Just("![".to_string()),
        Just("|".to_string()),
        Just("\\".to_string()),
        Just("<b>".to_string()),
        Just("<!--".to_string()),
        Just("-->".to_string()),
        Just("{%".to_string()),
        Just("%}".to_string()),
        Just("/%}".to_string()),
        Just("{% /".to_string()),
        Just("{{".to_string()),
        Just("}}".to_string()),
        Just(" $var".to_string()),
        Just(" @page".to_string()),
        Just(" a=\"x\"".to_string()),
        Just(" #id .cls".to_string()),
        Just(" if ".to_string()),
        Just(" else ".to_string()),
        Just(" table ".to_string()),
        Just(" comment ".to_string()),
        Just(" && || == ! ".to_string()),
        Just(" (1, 2) => ".to_string()),
        Just("[1, {k: 2}]".to_string()),
        Just("\"str\\\"".to_string()),
        Just("é漢".to_string()),
    ]
}

fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment_strategy(), 0..40).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn parse_is_lossless(input in document_strategy()) {
        let parse = parse(&input);
        prop_assert_eq!(parse.syntax().text().to_string(), input);
    }

    #[test]
    fn parse_is_lossless_for_any_text(input in "\\PC{0,200}") {
        let parse = parse(&input);
        prop_assert_eq!(parse.syntax().text().to_string(), input);
    }

    #[test]
    fn parse_is_deterministic(input in document_strategy()) {
        let first = parse(&input);
        let second = parse(&input);
        prop_assert_eq!(first.green(), second.green());
    }

    #[test]
    fn errors_stay_inside_the_input(input in document_strategy()) {
        let parse = parse(&input);
        for error in parse.errors() {
            prop_assert!(usize::from(error.range.end()) <= input.len());
        }
    }

    #[test]
    fn tree_has_one_root_and_no_zero_width_tokens(input in document_strategy()) {
        let root = parse(&input).syntax();
        prop_assert_eq!(root.kind(), SyntaxKind::ROOT);
        for token in root.descendants_with_tokens().filter_map(|e| e.into_token()) {
            prop_assert!(!token.text().is_empty(), "empty {:?}", token.kind());
        }
    }

    #[test]
    fn fence_body_is_verbatim(
        len in 3usize..7,
        lines in prop::collection::vec("[a-z #*{}%<>|-]{0,10}", 1..6),
    ) {
        let fence = "`".repeat(len);
        let body: String = lines.iter().map(|line| format!("{line}\n")).collect();
        let input = format!("{fence}\n{body}{fence}\n");

        let parse = parse(&input);
        prop_assert!(parse.errors().is_empty());
        let root = parse.syntax();
        let code = root.first_child();
        prop_assert_eq!(code.as_ref().map(|n| n.kind()), Some(SyntaxKind::FENCED_CODE));
        let content: Vec<_> = root
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::CODE_CONTENT)
            .map(|t| t.text().to_string())
            .collect();
        prop_assert_eq!(content, vec![body]);
    }

    #[test]
    fn lexer_covers_every_byte(input in document_strategy()) {
        for mode in [Mode::Markup, Mode::Expr] {
            let text: String = lex(mode, &input).iter().map(|t| t.text).collect();
            prop_assert_eq!(&text, &input);
        }
    }
}
