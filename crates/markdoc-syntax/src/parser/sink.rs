//! Sink for converting parser events into a Rowan green tree.

use rowan::{GreenNode, GreenNodeBuilder};

use crate::parser::event::Event;
use crate::syntax_kind::SyntaxKind;

/// Converts parser events into a Rowan green tree, slicing token text from
/// the source.
///
/// Adjacent `TEXT` tokens are merged, so a run of prose that the lexer
/// split at `!`, `{` or an unpaired `*` reads as one token.
pub struct Sink<'s> {
    builder: GreenNodeBuilder<'static>,
    source: &'s str,
    cursor: usize,
    pending_text: usize,
    events: Vec<Event>,
}

impl<'s> Sink<'s> {
    /// Create a new sink.
    pub fn new(source: &'s str, events: Vec<Event>) -> Self {
        Self {
            builder: GreenNodeBuilder::new(),
            source,
            cursor: 0,
            pending_text: 0,
            events,
        }
    }

    /// Consume the sink and build the green tree.
    pub fn finish(mut self) -> GreenNode {
        let mut forward_parents = Vec::new();

        for i in 0..self.events.len() {
            match std::mem::replace(&mut self.events[i], Event::Placeholder) {
                Event::Start {
                    kind,
                    forward_parent,
                } => {
                    self.flush_text();
                    forward_parents.push(kind);
                    let mut fp = forward_parent;

                    while let Some(parent_idx) = fp {
                        match std::mem::replace(&mut self.events[parent_idx], Event::Placeholder) {
                            Event::Start {
                                kind,
                                forward_parent,
                            } => {
                                fp = forward_parent;
                                forward_parents.push(kind);
                            }
                            _ => unreachable!(),
                        }
                    }

                    // Start nodes in reverse order (outermost first)
                    for kind in forward_parents.drain(..).rev() {
                        self.builder.start_node(kind.into());
                    }
                }
                Event::Token { kind, len } => self.token(kind, len),
                Event::Finish => {
                    self.flush_text();
                    self.builder.finish_node();
                }
                Event::Placeholder => {}
            }
        }

        self.flush_text();
        self.builder.finish()
    }

    fn token(&mut self, kind: SyntaxKind, len: usize) {
        if kind == SyntaxKind::TEXT {
            self.pending_text += len;
            return;
        }
        self.flush_text();
        let text = &self.source[self.cursor..self.cursor + len];
        self.builder.token(kind.into(), text);
        self.cursor += len;
    }

    fn flush_text(&mut self) {
        if self.pending_text > 0 {
            let end = self.cursor + self.pending_text;
            self.builder.token(SyntaxKind::TEXT.into(), &self.source[self.cursor..end]);
            self.cursor = end;
            self.pending_text = 0;
        }
    }
}
