//! SyntaxKind enum for all tokens and nodes in the Markdoc CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree.

/// All syntax kinds for the Markdoc CST.
///
/// This enum represents both tokens (lexer and scanner output) and composite
/// nodes (parser output). The `repr(u16)` ensures efficient storage in rowan's
/// green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Trivia and line structure ===
    /// Horizontal whitespace (spaces, tabs)
    WHITESPACE,
    /// Line ending that closes a block
    NEWLINE,
    /// Line ending that continues a paragraph
    SOFT_BREAK,
    /// One or more whitespace-only lines
    BLANK_LINE,

    // === Markup tokens ===
    /// Plain text content
    TEXT,
    /// Backslash escape (`\*`)
    ESCAPE,
    /// `#` run plus trailing whitespace opening a heading
    HEADING_MARKER,
    /// A whole thematic-break line (`---`, `* * *`)
    HORIZONTAL_RULE,
    /// Bullet or ordinal list marker (`-`, `*`, `+`, `1.`, `2)`)
    LIST_MARKER,
    /// Line break plus indentation continuing a list item
    LIST_CONTINUATION,
    /// Zero-width signal opening a nested list; never stored in the tree
    INDENT,
    /// Zero-width signal closing a list; never stored in the tree
    DEDENT,
    /// `>` opening a blockquote line
    BLOCKQUOTE_MARKER,
    /// Run of three or more backticks or tildes
    FENCE,
    /// Verbatim body of a fenced code block
    CODE_CONTENT,
    /// First word of a fence info string
    LANGUAGE,
    /// Remainder of a fence info string (`{% ... %}`-style attributes)
    FENCE_ATTRIBUTES,
    /// `---` delimiting frontmatter
    FRONTMATTER_DELIM,
    /// Frontmatter body
    YAML,
    /// Raw HTML block
    HTML_TEXT,
    /// `<!-- ... -->`
    HTML_COMMENT_TEXT,
    /// `{% comment %} ... {% /comment %}`
    COMMENT_TEXT,
    /// Delimiter opening emphasis
    EMPHASIS_OPEN,
    /// Delimiter closing emphasis
    EMPHASIS_CLOSE,
    /// Delimiter opening strong emphasis
    STRONG_OPEN,
    /// Delimiter closing strong emphasis
    STRONG_CLOSE,
    /// `_` emphasis character
    UNDERSCORE,
    /// Backtick run for code spans
    BACKTICKS,
    /// Body of a code span
    CODE_TEXT,
    /// `![`
    IMAGE_START,
    /// Link or image target
    LINK_DESTINATION,
    /// Quoted link title
    LINK_TITLE,
    /// Inline HTML tag, comment or autolink
    HTML_INLINE,
    /// `|`
    PIPE,
    /// `---`, `:--`, `--:` cell of a pipe table delimiter row
    TABLE_DELIMITER,

    // === Tag and expression tokens ===
    /// `{%`
    TAG_START,
    /// `%}`
    TAG_END,
    /// `/%}`
    SELF_CLOSE_END,
    /// `{{`
    INTERP_START,
    /// `}}`
    INTERP_END,
    /// Tag name, possibly hyphenated
    TAG_NAME,
    /// Attribute name, possibly hyphenated
    ATTRIBUTE_NAME,
    /// Identifier
    IDENT,
    /// `true`
    TRUE_KW,
    /// `false`
    FALSE_KW,
    /// `null`
    NULL_KW,
    /// Numeric literal, optionally negative
    NUMBER,
    /// Quoted string literal
    STRING,
    /// `$`
    DOLLAR,
    /// `@`
    AT,
    /// `.`
    DOT,
    /// `,`
    COMMA,
    /// `:`
    COLON,
    /// `(`
    L_PAREN,
    /// `)`
    R_PAREN,
    /// `[`
    L_BRACK,
    /// `]`
    R_BRACK,
    /// `{`
    L_CURLY,
    /// `}`
    R_CURLY,
    /// `=`
    EQ,
    /// `=>`
    FAT_ARROW,
    /// `==`
    EQ2,
    /// `!=`
    NEQ,
    /// `<`
    LT,
    /// `>`
    GT,
    /// `<=`
    LTEQ,
    /// `>=`
    GTEQ,
    /// `&&`
    AMP2,
    /// `||`
    PIPE2,
    /// `!`
    BANG,
    /// `+`
    PLUS,
    /// `-`
    MINUS,
    /// `*`
    STAR,
    /// `/`
    SLASH,
    /// `%`
    PERCENT,
    /// `#`
    HASH,
    /// Character no lexer rule accepts
    UNKNOWN,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root document node
    ROOT,
    /// `---` delimited metadata at the top of the document
    FRONTMATTER,
    /// ATX heading (`# ...`)
    HEADING,
    /// Inline content of a heading
    HEADING_TEXT,
    /// Thematic break (`---`, `***`, etc.)
    THEMATIC_BREAK,
    /// Blockquote container (`> ...`)
    BLOCKQUOTE,
    /// Fenced code block
    FENCED_CODE,
    /// Opening fence line
    CODE_FENCE_OPEN,
    /// Language and attributes after an opening fence
    INFO_STRING,
    /// Closing fence line
    CODE_FENCE_CLOSE,
    /// Raw HTML block
    HTML_BLOCK,
    /// Block-level HTML comment
    HTML_COMMENT,
    /// `{% comment %}` block
    COMMENT_BLOCK,
    /// List container (ordered or unordered)
    LIST,
    /// Individual list item
    LIST_ITEM,
    /// First paragraph of a list item
    LIST_PARAGRAPH,
    /// Paragraph block
    PARAGRAPH,
    /// Emphasis `*text*`
    EMPHASIS,
    /// Strong emphasis `**text**`
    STRONG,
    /// Inline code span
    INLINE_CODE,
    /// Standard link `[text](url)`
    LINK,
    /// Bracketed text of a link
    LINK_TEXT,
    /// Image `![alt](url)`
    IMAGE,
    /// Bracketed alt text of an image
    IMAGE_ALT,
    /// `{{ expression }}`
    INLINE_EXPRESSION,
    /// Block tag with body, or standalone self-closing tag
    TAG,
    /// `{% name ... %}`
    TAG_OPEN,
    /// `{% /name %}`
    TAG_CLOSE,
    /// `{% name ... /%}`
    TAG_SELF_CLOSE,
    /// Nameless tag holding only attributes (`{% #id .class %}`)
    TAG_ANNOTATION,
    /// Nameless tag holding an expression (`{% $var %}`)
    INLINE_TAG_EXPRESSION,
    /// `name=value`
    ATTRIBUTE,
    /// `#id`
    SHORTHAND_ID,
    /// `.class`
    SHORTHAND_CLASS,
    /// `{% if %} ... {% /if %}`
    CONDITIONAL,
    /// `{% else %}` and the body following it
    ELSE_CLAUSE,
    /// Pipe-delimited table
    PIPE_TABLE,
    /// `{% table %}` with list rows
    TAG_TABLE,
    /// First row of a table
    TABLE_HEADER,
    /// Delimiter row or `---` between rows
    TABLE_SEPARATOR,
    /// Body row of a table
    TABLE_ROW,
    /// Single table cell
    TABLE_CELL,
    /// `$name`
    VARIABLE,
    /// `@name`
    SPECIAL_VARIABLE,
    /// Bare identifier
    IDENTIFIER,
    /// String, number, boolean or null
    LITERAL,
    /// `[a, b]`
    ARRAY_LITERAL,
    /// `{key: value}`
    OBJECT_LITERAL,
    /// `key: value`
    PAIR,
    /// `(expr)`
    PARENTHESIZED_EXPRESSION,
    /// `(a, b) => body`
    ARROW_FUNCTION,
    /// Parameters of an arrow function
    PARAMETER_LIST,
    /// `a + b`
    BINARY_EXPRESSION,
    /// `!a`, `-a`
    UNARY_EXPRESSION,
    /// `f(a)`
    CALL_EXPRESSION,
    /// Arguments of a call
    ARGUMENT_LIST,
    /// `a.b`
    MEMBER_EXPRESSION,
    /// `a[b]`
    INDEX_EXPRESSION,

    /// Error recovery node
    ERROR,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer or scanner output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true if this kind is trivia (whitespace/newlines).
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE | Self::NEWLINE | Self::SOFT_BREAK | Self::BLANK_LINE
        )
    }

    /// Returns true for blocks that may appear in a document body.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Self::FRONTMATTER
                | Self::HEADING
                | Self::THEMATIC_BREAK
                | Self::BLOCKQUOTE
                | Self::FENCED_CODE
                | Self::HTML_BLOCK
                | Self::HTML_COMMENT
                | Self::COMMENT_BLOCK
                | Self::LIST
                | Self::PARAGRAPH
                | Self::TAG
                | Self::CONDITIONAL
                | Self::PIPE_TABLE
                | Self::TAG_TABLE
                | Self::ERROR
        )
    }

    /// Returns true for the nodes produced by the expression grammar.
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            Self::VARIABLE
                | Self::SPECIAL_VARIABLE
                | Self::IDENTIFIER
                | Self::LITERAL
                | Self::ARRAY_LITERAL
                | Self::OBJECT_LITERAL
                | Self::PARENTHESIZED_EXPRESSION
                | Self::ARROW_FUNCTION
                | Self::BINARY_EXPRESSION
                | Self::UNARY_EXPRESSION
                | Self::CALL_EXPRESSION
                | Self::MEMBER_EXPRESSION
                | Self::INDEX_EXPRESSION
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkdocLang {}

impl rowan::Language for MarkdocLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::ERROR as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<MarkdocLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<MarkdocLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<MarkdocLang>;
