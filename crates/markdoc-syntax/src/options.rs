//! Knobs that change how a document is parsed.

/// Options for [`parse_with`](crate::parse_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseOptions {
    /// Tabs advance to the next multiple of this many columns.
    pub tab_width: usize,
    /// Recognise a leading `---` block as frontmatter.
    pub frontmatter: bool,
    /// Deepest block, inline or expression nesting before the excess is wrapped in
    /// an `ERROR` node.
    pub max_nesting: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            tab_width: 4,
            frontmatter: true,
            max_nesting: 64,
        }
    }
}
