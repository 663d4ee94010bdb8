//! # Typed AST
//!
//! Zero-cost typed views over the untyped [`SyntaxNode`] tree. Each wrapper
//! holds a node of a known kind and exposes the pieces a consumer cares
//! about (a tag's name, a heading's level, an attribute's value) without
//! copying anything out of the green tree.
//!
//! ```
//! use markdoc_syntax::ast::{AstNode, Block};
//! use markdoc_syntax::parse;
//!
//! let parse = parse("{% callout type=\"note\" %}\nHi\n{% /callout %}\n");
//! let doc = parse.document();
//! let Some(Block::Tag(tag)) = doc.blocks().next() else { panic!() };
//! assert_eq!(tag.name().as_deref(), Some("callout"));
//! ```
//!
//! [`field_name`] names the role a child plays in its parent, and
//! [`to_sexp`] renders a tree as an S-expression using those names.

use std::fmt::Write as _;

use rowan::NodeOrToken;

use crate::syntax_kind::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

/// A typed view of a syntax node.
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;

    fn cast(node: SyntaxNode) -> Option<Self>;

    fn syntax(&self) -> &SyntaxNode;

    /// Source text covered by the node.
    fn text(&self) -> String {
        self.syntax().text().to_string()
    }
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident => $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                matches!(kind, $(SyntaxKind::$kind)|+)
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                Self::can_cast(node.kind()).then(|| Self(node))
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

fn child<N: AstNode>(parent: &SyntaxNode) -> Option<N> {
    parent.children().find_map(N::cast)
}

fn token(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(NodeOrToken::into_token)
        .find(|t| t.kind() == kind)
}

fn blocks(parent: &SyntaxNode) -> impl Iterator<Item = Block> {
    parent.children().filter_map(Block::cast)
}

/// Strip matching quotes and resolve backslash escapes.
fn unquote(text: &str) -> String {
    let inner = text
        .get(1..text.len().saturating_sub(1))
        .filter(|_| text.len() >= 2)
        .unwrap_or("");
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            },
            c => out.push(c),
        }
    }
    out
}

ast_node!(
    /// The whole document.
    Document => ROOT
);

impl Document {
    pub fn frontmatter(&self) -> Option<Frontmatter> {
        child(&self.0)
    }

    /// Top-level blocks in source order.
    pub fn blocks(&self) -> impl Iterator<Item = Block> {
        blocks(&self.0)
    }
}

/// Any block-level node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Block {
    Frontmatter(Frontmatter),
    Heading(Heading),
    Paragraph(Paragraph),
    List(List),
    Tag(Tag),
    Conditional(Conditional),
    Table(Table),
    FencedCode(FencedCode),
    Blockquote(Blockquote),
    /// Thematic breaks, HTML, comments and `ERROR` nodes.
    Other(SyntaxNode),
}

impl AstNode for Block {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind.is_block()
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        if !Self::can_cast(node.kind()) {
            return None;
        }
        let block = match node.kind() {
            SyntaxKind::FRONTMATTER => Block::Frontmatter(Frontmatter(node)),
            SyntaxKind::HEADING => Block::Heading(Heading(node)),
            SyntaxKind::PARAGRAPH => Block::Paragraph(Paragraph(node)),
            SyntaxKind::LIST => Block::List(List(node)),
            SyntaxKind::TAG => Block::Tag(Tag(node)),
            SyntaxKind::CONDITIONAL => Block::Conditional(Conditional(node)),
            SyntaxKind::PIPE_TABLE | SyntaxKind::TAG_TABLE => Block::Table(Table(node)),
            SyntaxKind::FENCED_CODE => Block::FencedCode(FencedCode(node)),
            SyntaxKind::BLOCKQUOTE => Block::Blockquote(Blockquote(node)),
            _ => Block::Other(node),
        };
        Some(block)
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Block::Frontmatter(it) => it.syntax(),
            Block::Heading(it) => it.syntax(),
            Block::Paragraph(it) => it.syntax(),
            Block::List(it) => it.syntax(),
            Block::Tag(it) => it.syntax(),
            Block::Conditional(it) => it.syntax(),
            Block::Table(it) => it.syntax(),
            Block::FencedCode(it) => it.syntax(),
            Block::Blockquote(it) => it.syntax(),
            Block::Other(node) => node,
        }
    }
}

ast_node!(Frontmatter => FRONTMATTER);

impl Frontmatter {
    /// The YAML between the delimiters, unparsed.
    pub fn yaml(&self) -> Option<String> {
        token(&self.0, SyntaxKind::YAML).map(|t| t.text().to_string())
    }
}

ast_node!(Heading => HEADING);

impl Heading {
    /// 1 to 6.
    pub fn level(&self) -> usize {
        token(&self.0, SyntaxKind::HEADING_MARKER).map_or(0, |t| t.text().trim_end().len())
    }

    /// Heading text without the marker or trailing whitespace.
    pub fn title(&self) -> String {
        self.0
            .children()
            .find(|n| n.kind() == SyntaxKind::HEADING_TEXT)
            .map(|n| n.text().to_string().trim_end().to_string())
            .unwrap_or_default()
    }
}

ast_node!(
    /// A paragraph, or the first line of a list item.
    Paragraph => PARAGRAPH | LIST_PARAGRAPH
);

impl Paragraph {
    /// Paragraph text without the final line break.
    pub fn content(&self) -> String {
        self.text().trim_end_matches(['\r', '\n']).to_string()
    }
}

ast_node!(Blockquote => BLOCKQUOTE);

impl Blockquote {
    pub fn blocks(&self) -> impl Iterator<Item = Block> {
        blocks(&self.0)
    }
}

ast_node!(FencedCode => FENCED_CODE);

impl FencedCode {
    fn info(&self) -> Option<SyntaxNode> {
        let open = self.0.children().find(|n| n.kind() == SyntaxKind::CODE_FENCE_OPEN)?;
        open.children().find(|n| n.kind() == SyntaxKind::INFO_STRING)
    }

    pub fn language(&self) -> Option<String> {
        token(&self.info()?, SyntaxKind::LANGUAGE).map(|t| t.text().to_string())
    }

    /// Everything after the language on the opening line.
    pub fn attributes(&self) -> Option<String> {
        token(&self.info()?, SyntaxKind::FENCE_ATTRIBUTES).map(|t| t.text().to_string())
    }

    /// The verbatim body.
    pub fn code(&self) -> String {
        token(&self.0, SyntaxKind::CODE_CONTENT)
            .map(|t| t.text().to_string())
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.0.children().any(|n| n.kind() == SyntaxKind::CODE_FENCE_CLOSE)
    }
}

ast_node!(List => LIST);

impl List {
    pub fn items(&self) -> impl Iterator<Item = ListItem> {
        self.0.children().filter_map(ListItem::cast)
    }

    /// Ordered lists use `1.` or `1)` markers.
    pub fn is_ordered(&self) -> bool {
        self.items()
            .next()
            .and_then(|item| item.marker())
            .is_some_and(|m| m.text().starts_with(|c: char| c.is_ascii_digit()))
    }
}

ast_node!(ListItem => LIST_ITEM);

impl ListItem {
    pub fn marker(&self) -> Option<SyntaxToken> {
        token(&self.0, SyntaxKind::LIST_MARKER)
    }

    /// The text on the marker line.
    pub fn content(&self) -> Option<Paragraph> {
        child(&self.0)
    }

    /// Nested lists and continuation blocks.
    pub fn blocks(&self) -> impl Iterator<Item = Block> {
        blocks(&self.0)
    }
}

ast_node!(
    /// A single `{% %}` header, block-level or inline.
    TagHeader => TAG_OPEN | TAG_CLOSE | TAG_SELF_CLOSE | TAG_ANNOTATION | INLINE_TAG_EXPRESSION
);

impl TagHeader {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        token(&self.0, SyntaxKind::TAG_NAME)
    }

    pub fn name(&self) -> Option<String> {
        self.name_token().map(|t| t.text().to_string())
    }

    pub fn is_closing(&self) -> bool {
        self.0.kind() == SyntaxKind::TAG_CLOSE
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> {
        self.0.children().filter_map(Attribute::cast)
    }

    /// Positional values, such as the condition of `{% if $x %}`.
    pub fn values(&self) -> impl Iterator<Item = Expr> {
        self.0.children().filter_map(Expr::cast)
    }

    /// The `#id` shorthand.
    pub fn id(&self) -> Option<String> {
        self.shorthands(SyntaxKind::SHORTHAND_ID).next()
    }

    /// The `.class` shorthands.
    pub fn classes(&self) -> Vec<String> {
        self.shorthands(SyntaxKind::SHORTHAND_CLASS).collect()
    }

    fn shorthands(&self, kind: SyntaxKind) -> impl Iterator<Item = String> {
        self.0
            .children()
            .filter(move |n| n.kind() == kind)
            .filter_map(|n| token(&n, SyntaxKind::IDENT))
            .map(|t| t.text().to_string())
    }
}

ast_node!(Attribute => ATTRIBUTE);

impl Attribute {
    pub fn name(&self) -> Option<String> {
        token(&self.0, SyntaxKind::ATTRIBUTE_NAME).map(|t| t.text().to_string())
    }

    pub fn value(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(
    /// A block tag with body, or a standalone self-closing tag.
    Tag => TAG
);

impl Tag {
    /// The open or self-closing header.
    pub fn open(&self) -> Option<TagHeader> {
        self.0
            .children()
            .filter_map(TagHeader::cast)
            .find(|h| !h.is_closing())
    }

    pub fn close(&self) -> Option<TagHeader> {
        self.0.children().filter_map(TagHeader::cast).find(TagHeader::is_closing)
    }

    pub fn name(&self) -> Option<String> {
        self.open()?.name()
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.open().map(|h| h.attributes().collect()).unwrap_or_default()
    }

    /// Value of the attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<Expr> {
        self.attributes()
            .into_iter()
            .find(|a| a.name().as_deref() == Some(name))
            .and_then(|a| a.value())
    }

    pub fn is_self_closing(&self) -> bool {
        self.open().is_some_and(|h| h.syntax().kind() == SyntaxKind::TAG_SELF_CLOSE)
    }

    /// True when the block was closed by a tag of a different name.
    pub fn is_mismatched(&self) -> bool {
        match (self.open(), self.close()) {
            (Some(open), Some(close)) => open.name() != close.name(),
            _ => false,
        }
    }

    pub fn body(&self) -> impl Iterator<Item = Block> {
        blocks(&self.0)
    }
}

ast_node!(Conditional => CONDITIONAL);

impl Conditional {
    pub fn condition(&self) -> Option<Expr> {
        child::<TagHeader>(&self.0)?.values().next()
    }

    /// Blocks of the first branch.
    pub fn body(&self) -> impl Iterator<Item = Block> {
        blocks(&self.0)
    }

    pub fn else_clauses(&self) -> impl Iterator<Item = ElseClause> {
        self.0.children().filter_map(ElseClause::cast)
    }
}

ast_node!(ElseClause => ELSE_CLAUSE);

impl ElseClause {
    /// `None` for a plain `{% else /%}`.
    pub fn condition(&self) -> Option<Expr> {
        child::<TagHeader>(&self.0)?.values().next()
    }

    pub fn body(&self) -> impl Iterator<Item = Block> {
        blocks(&self.0)
    }
}

ast_node!(
    /// A pipe table or a `{% table %}` block.
    Table => PIPE_TABLE | TAG_TABLE
);

impl Table {
    pub fn is_tag_table(&self) -> bool {
        self.0.kind() == SyntaxKind::TAG_TABLE
    }

    pub fn header(&self) -> Option<TableRow> {
        self.0
            .children()
            .filter_map(TableRow::cast)
            .find(TableRow::is_header)
    }

    /// Body rows.
    pub fn rows(&self) -> impl Iterator<Item = TableRow> {
        self.0
            .children()
            .filter_map(TableRow::cast)
            .filter(|r| !r.is_header())
    }
}

ast_node!(TableRow => TABLE_HEADER | TABLE_ROW);

impl TableRow {
    pub fn is_header(&self) -> bool {
        self.0.kind() == SyntaxKind::TABLE_HEADER
    }

    pub fn cells(&self) -> impl Iterator<Item = TableCell> {
        self.0.children().filter_map(TableCell::cast)
    }
}

ast_node!(TableCell => TABLE_CELL);

impl TableCell {
    /// Annotations such as `{% colspan=2 %}`.
    pub fn annotations(&self) -> impl Iterator<Item = TagHeader> {
        self.0
            .children()
            .filter(|n| n.kind() == SyntaxKind::TAG_ANNOTATION)
            .filter_map(TagHeader::cast)
    }
}

ast_node!(
    /// `[text](destination "title")` or `![alt](destination)`.
    Link => LINK | IMAGE
);

impl Link {
    pub fn is_image(&self) -> bool {
        self.0.kind() == SyntaxKind::IMAGE
    }

    pub fn destination(&self) -> Option<String> {
        token(&self.0, SyntaxKind::LINK_DESTINATION).map(|t| t.text().to_string())
    }

    pub fn title(&self) -> Option<String> {
        token(&self.0, SyntaxKind::LINK_TITLE).map(|t| unquote(t.text()))
    }
}

ast_node!(
    /// `{{ expression }}`
    InlineExpression => INLINE_EXPRESSION
);

impl InlineExpression {
    pub fn expression(&self) -> Option<Expr> {
        child(&self.0)
    }
}

ast_node!(
    /// Any expression node.
    Expr => VARIABLE
        | SPECIAL_VARIABLE
        | IDENTIFIER
        | LITERAL
        | ARRAY_LITERAL
        | OBJECT_LITERAL
        | PARENTHESIZED_EXPRESSION
        | ARROW_FUNCTION
        | BINARY_EXPRESSION
        | UNARY_EXPRESSION
        | CALL_EXPRESSION
        | MEMBER_EXPRESSION
        | INDEX_EXPRESSION
);

impl Expr {
    pub fn kind(&self) -> SyntaxKind {
        self.0.kind()
    }

    fn literal(&self, kind: SyntaxKind) -> Option<SyntaxToken> {
        (self.kind() == SyntaxKind::LITERAL)
            .then(|| token(&self.0, kind))
            .flatten()
    }

    /// Contents of a string literal, unquoted.
    pub fn as_str(&self) -> Option<String> {
        self.literal(SyntaxKind::STRING).map(|t| unquote(t.text()))
    }

    pub fn as_number(&self) -> Option<f64> {
        self.literal(SyntaxKind::NUMBER)?.text().parse().ok()
    }

    pub fn as_bool(&self) -> Option<bool> {
        if self.literal(SyntaxKind::TRUE_KW).is_some() {
            Some(true)
        } else if self.literal(SyntaxKind::FALSE_KW).is_some() {
            Some(false)
        } else {
            None
        }
    }

    /// Name of a `$variable` or `@special` variable.
    pub fn variable_name(&self) -> Option<String> {
        if !matches!(self.kind(), SyntaxKind::VARIABLE | SyntaxKind::SPECIAL_VARIABLE) {
            return None;
        }
        token(&self.0, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }

    /// Operands of a binary, unary, member, index or call expression.
    pub fn operands(&self) -> impl Iterator<Item = Expr> {
        self.0.children().filter_map(Expr::cast)
    }

    /// Operator token of a binary or unary expression.
    pub fn operator(&self) -> Option<SyntaxToken> {
        if !matches!(self.kind(), SyntaxKind::BINARY_EXPRESSION | SyntaxKind::UNARY_EXPRESSION) {
            return None;
        }
        self.0
            .children_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .find(|t| !t.kind().is_trivia())
    }
}

/// The role `child` plays inside `parent`, if it has a named one.
pub fn field_name(parent: &SyntaxNode, child: &SyntaxElement) -> Option<&'static str> {
    use SyntaxKind as K;

    let kind = child.kind();
    let is_token = child.as_token().is_some();
    let first_operand = || {
        let node = child.as_node()?;
        parent.children().find(|c| c.kind().is_expression()).map(|c| &c == node)
    };
    let ordinal = |first: &'static str, second: &'static str| {
        if first_operand().unwrap_or(false) { first } else { second }
    };

    let name = match (parent.kind(), kind) {
        (K::HEADING, K::HEADING_MARKER) => "heading_marker",
        (K::HEADING, K::HEADING_TEXT) => "heading_text",
        (K::FRONTMATTER, K::YAML) => "content",
        (K::FENCED_CODE, K::CODE_FENCE_OPEN) => "open",
        (K::FENCED_CODE, K::CODE_CONTENT) => "code",
        (K::FENCED_CODE, K::CODE_FENCE_CLOSE) => "close",
        (K::CODE_FENCE_OPEN, K::INFO_STRING) => "info",
        (K::INFO_STRING, K::LANGUAGE) => "language",
        (K::INFO_STRING, K::FENCE_ATTRIBUTES) => "attributes",
        (K::LIST_ITEM, K::LIST_MARKER) => "marker",
        (K::LIST_ITEM, K::LIST_PARAGRAPH) => "content",
        (K::TAG | K::CONDITIONAL | K::TAG_TABLE | K::ELSE_CLAUSE, K::TAG_OPEN | K::TAG_SELF_CLOSE) => "open",
        (K::TAG | K::CONDITIONAL | K::TAG_TABLE, K::TAG_CLOSE) => "close",
        (K::TAG_OPEN | K::TAG_CLOSE | K::TAG_SELF_CLOSE, K::TAG_NAME) => "name",
        (K::ATTRIBUTE, K::ATTRIBUTE_NAME) => "name",
        (K::ATTRIBUTE, k) if k.is_expression() => "value",
        (K::LINK, K::LINK_TEXT) => "text",
        (K::IMAGE, K::IMAGE_ALT) => "alt",
        (K::LINK | K::IMAGE, K::LINK_DESTINATION) => "destination",
        (K::LINK | K::IMAGE, K::LINK_TITLE) => "title",
        (K::INLINE_EXPRESSION, k) if k.is_expression() => "expression",
        (K::BINARY_EXPRESSION, k) if k.is_expression() => ordinal("left", "right"),
        (K::BINARY_EXPRESSION | K::UNARY_EXPRESSION, k) if is_token && !k.is_trivia() => "operator",
        (K::UNARY_EXPRESSION, k) if k.is_expression() => "argument",
        (K::CALL_EXPRESSION, K::ARGUMENT_LIST) => "arguments",
        (K::CALL_EXPRESSION, k) if k.is_expression() => "function",
        (K::MEMBER_EXPRESSION, k) if k.is_expression() => ordinal("object", "property"),
        (K::INDEX_EXPRESSION, k) if k.is_expression() => ordinal("object", "index"),
        (K::ARROW_FUNCTION, K::PARAMETER_LIST) => "parameters",
        (K::ARROW_FUNCTION, k) if k.is_expression() => "body",
        (K::PAIR, K::IDENT | K::STRING) => "key",
        (K::PAIR, k) if k.is_expression() => "value",
        _ => return None,
    };
    Some(name)
}

/// Render `node` as an S-expression of its nodes. Children with a field
/// name are prefixed by it; named tokens appear as `field: "text"`.
///
/// ```
/// use markdoc_syntax::{ast, parse};
///
/// let parse = parse("# Hi\n");
/// assert_eq!(
///     ast::to_sexp(&parse.syntax()),
///     "(ROOT (HEADING heading_marker: \"# \" heading_text: (HEADING_TEXT)))"
/// );
/// ```
pub fn to_sexp(node: &SyntaxNode) -> String {
    let mut out = String::new();
    write_sexp(&mut out, node);
    out
}

fn write_sexp(out: &mut String, node: &SyntaxNode) {
    let _ = write!(out, "({:?}", node.kind());
    for child in node.children_with_tokens() {
        let field = field_name(node, &child);
        match child {
            NodeOrToken::Node(n) => {
                out.push(' ');
                if let Some(field) = field {
                    let _ = write!(out, "{field}: ");
                }
                write_sexp(out, &n);
            }
            NodeOrToken::Token(t) => {
                if let Some(field) = field {
                    let _ = write!(out, " {field}: {:?}", t.text());
                }
            }
        }
    }
    out.push(')');
}
