//! # Block Precedence
//!
//! At a line start several block rules can match the same characters: a
//! `---` line may open frontmatter or be a thematic break, a `{% if %}` line
//! is both a tag and a conditional, `| a |` is a paragraph unless the next
//! line is a delimiter row. The block grammar collects every rule whose
//! predicate matches as a [`Candidate`] and picks one by precedence.
//!
//! Each [`Rule`] carries a static level and a dynamic bonus. A candidate that
//! the grammar has *confirmed* by looking further ahead (a closing
//! frontmatter delimiter exists, the tag header stands alone on its line)
//! scores `level + dynamic`; an unconfirmed one scores `level - dynamic`.
//!
//! Two rules whose possible scores coincide must have their tie declared in
//! [`CONFLICTS`]. The check runs at compile time:
//!
//! ```compile_fail
//! use markdoc_syntax::policy::{find_unresolved, Precedence, Rule};
//!
//! const RULES: &[(Rule, Precedence)] = &[
//!     (Rule::Heading, Precedence::flat(3)),
//!     (Rule::List, Precedence::flat(3)),
//! ];
//! const _: () = assert!(find_unresolved(RULES, &[]).is_none());
//! ```

use crate::error::GrammarError;

/// Block-level productions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Frontmatter,
    CommentBlock,
    Conditional,
    Table,
    Tag,
    FencedCode,
    Heading,
    ThematicBreak,
    Blockquote,
    HtmlBlock,
    List,
    HtmlComment,
    Paragraph,
}

const RULE_COUNT: usize = 13;

/// Static level plus the bonus (or penalty) earned by confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Precedence {
    pub level: i32,
    pub dynamic: i32,
}

impl Precedence {
    /// A precedence with no dynamic component.
    pub const fn flat(level: i32) -> Self {
        Self { level, dynamic: 0 }
    }

    const fn new(level: i32, dynamic: i32) -> Self {
        Self { level, dynamic }
    }

    pub const fn score(self, confirmed: bool) -> i32 {
        if confirmed {
            self.level + self.dynamic
        } else {
            self.level - self.dynamic
        }
    }
}

impl Rule {
    /// Every rule, highest static level first.
    pub const ALL: [Rule; RULE_COUNT] = [
        Rule::Frontmatter,
        Rule::CommentBlock,
        Rule::Conditional,
        Rule::Table,
        Rule::Tag,
        Rule::FencedCode,
        Rule::Heading,
        Rule::ThematicBreak,
        Rule::Blockquote,
        Rule::HtmlBlock,
        Rule::List,
        Rule::HtmlComment,
        Rule::Paragraph,
    ];

    pub const fn precedence(self) -> Precedence {
        match self {
            Rule::Frontmatter => Precedence::new(13, 10),
            Rule::CommentBlock => Precedence::flat(12),
            Rule::Conditional => Precedence::new(11, 10),
            Rule::Table => Precedence::new(10, 10),
            Rule::Tag => Precedence::new(9, 10),
            Rule::FencedCode => Precedence::flat(8),
            Rule::Heading => Precedence::flat(7),
            Rule::ThematicBreak => Precedence::flat(6),
            Rule::Blockquote => Precedence::flat(5),
            Rule::HtmlBlock => Precedence::flat(4),
            Rule::List => Precedence::flat(3),
            Rule::HtmlComment => Precedence::flat(2),
            Rule::Paragraph => Precedence::flat(1),
        }
    }
}

/// How a declared tie is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// The higher static level wins.
    Static,
    /// A confirmed candidate wins; between unconfirmed ones the rule without
    /// a dynamic component wins.
    Dynamic,
}

/// A declared tie between two rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conflict {
    pub left: Rule,
    pub right: Rule,
    pub resolution: Resolution,
}

pub const CONFLICTS: &[Conflict] = &[
    // `---` at document start without a closing delimiter
    Conflict {
        left: Rule::Frontmatter,
        right: Rule::List,
        resolution: Resolution::Dynamic,
    },
    // `{% if x %} more text` is prose
    Conflict {
        left: Rule::Conditional,
        right: Rule::Paragraph,
        resolution: Resolution::Dynamic,
    },
];

const fn rule_table() -> [(Rule, Precedence); RULE_COUNT] {
    let mut out = [(Rule::Paragraph, Precedence::flat(0)); RULE_COUNT];
    let mut i = 0;
    while i < RULE_COUNT {
        out[i] = (Rule::ALL[i], Rule::ALL[i].precedence());
        i += 1;
    }
    out
}

const RULES: [(Rule, Precedence); RULE_COUNT] = rule_table();

const _: () = assert!(
    find_unresolved(&RULES, CONFLICTS).is_none(),
    "block rules tie without a declared conflict"
);

const fn scores_overlap(a: Precedence, b: Precedence) -> bool {
    let a_scores = [a.score(true), a.score(false)];
    let b_scores = [b.score(true), b.score(false)];
    let mut i = 0;
    while i < 2 {
        let mut j = 0;
        while j < 2 {
            if a_scores[i] == b_scores[j] {
                return true;
            }
            j += 1;
        }
        i += 1;
    }
    false
}

const fn find_conflict(a: Rule, b: Rule, conflicts: &[Conflict]) -> Option<Conflict> {
    let mut i = 0;
    while i < conflicts.len() {
        let c = conflicts[i];
        let (l, r) = (c.left as usize, c.right as usize);
        if (l == a as usize && r == b as usize) || (l == b as usize && r == a as usize) {
            return Some(c);
        }
        i += 1;
    }
    None
}

/// The first pair of rules whose scores can tie with no declared conflict.
pub const fn find_unresolved(rules: &[(Rule, Precedence)], conflicts: &[Conflict]) -> Option<(Rule, Rule)> {
    let mut i = 0;
    while i < rules.len() {
        let mut j = i + 1;
        while j < rules.len() {
            let (a, pa) = rules[i];
            let (b, pb) = rules[j];
            if scores_overlap(pa, pb) && find_conflict(a, b, conflicts).is_none() {
                return Some((a, b));
            }
            j += 1;
        }
        i += 1;
    }
    None
}

/// Check an arbitrary rule table against a conflict list.
pub fn validate_table(rules: &[(Rule, Precedence)], conflicts: &[Conflict]) -> Result<(), GrammarError> {
    match find_unresolved(rules, conflicts) {
        Some((left, right)) => Err(GrammarError::AmbiguityUnresolved { left, right }),
        None => Ok(()),
    }
}

/// Check the built-in grammar.
pub fn validate() -> Result<(), GrammarError> {
    validate_table(&RULES, CONFLICTS)
}

/// A rule whose predicate matched at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub rule: Rule,
    pub confirmed: bool,
}

impl Candidate {
    pub fn new(rule: Rule, confirmed: bool) -> Self {
        Self { rule, confirmed }
    }

    fn score(self) -> i32 {
        self.rule.precedence().score(self.confirmed)
    }

    fn beats(self, other: Candidate) -> bool {
        let (mine, theirs) = (self.score(), other.score());
        if mine != theirs {
            return mine > theirs;
        }
        let (p, q) = (self.rule.precedence(), other.rule.precedence());
        match find_conflict(self.rule, other.rule, CONFLICTS).map(|c| c.resolution) {
            Some(Resolution::Dynamic) if self.confirmed != other.confirmed => self.confirmed,
            Some(Resolution::Dynamic) if p.dynamic != q.dynamic => p.dynamic < q.dynamic,
            _ => p.level > q.level,
        }
    }
}

/// Pick the winning candidate.
pub(crate) fn select(candidates: &[Candidate]) -> Option<Rule> {
    candidates
        .iter()
        .copied()
        .reduce(|best, c| if c.beats(best) { c } else { best })
        .map(|c| c.rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_grammar_is_unambiguous() {
        assert_eq!(validate(), Ok(()));
    }

    #[test]
    fn undeclared_tie_is_rejected() {
        let rules = [
            (Rule::Heading, Precedence::flat(3)),
            (Rule::List, Precedence::flat(3)),
        ];
        assert_eq!(
            validate_table(&rules, &[]),
            Err(GrammarError::AmbiguityUnresolved {
                left: Rule::Heading,
                right: Rule::List,
            })
        );

        let declared = [Conflict {
            left: Rule::List,
            right: Rule::Heading,
            resolution: Resolution::Static,
        }];
        assert_eq!(validate_table(&rules, &declared), Ok(()));
    }

    #[test]
    fn dynamic_ties_are_detected() {
        let rules = [
            (Rule::Tag, Precedence::new(5, 4)),
            (Rule::Paragraph, Precedence::flat(1)),
        ];
        assert!(validate_table(&rules, &[]).is_err());
    }

    #[test]
    fn confirmed_tag_beats_paragraph() {
        let picked = select(&[
            Candidate::new(Rule::Paragraph, true),
            Candidate::new(Rule::Tag, true),
        ]);
        assert_eq!(picked, Some(Rule::Tag));
    }

    #[test]
    fn unconfirmed_tag_falls_back_to_paragraph() {
        let picked = select(&[
            Candidate::new(Rule::Tag, false),
            Candidate::new(Rule::Paragraph, true),
        ]);
        assert_eq!(picked, Some(Rule::Paragraph));
    }

    #[test]
    fn declared_dynamic_tie_prefers_plain_rule() {
        let picked = select(&[
            Candidate::new(Rule::Conditional, false),
            Candidate::new(Rule::Paragraph, true),
        ]);
        assert_eq!(picked, Some(Rule::Paragraph));
    }

    #[test]
    fn conditional_beats_generic_tag() {
        let picked = select(&[
            Candidate::new(Rule::Tag, true),
            Candidate::new(Rule::Conditional, true),
            Candidate::new(Rule::Paragraph, true),
        ]);
        assert_eq!(picked, Some(Rule::Conditional));
    }
}
