//! Deferred classification of ambiguous tokens
//!
//! An ambiguous token arms itself on the stack and buffers everything it is
//! unsure about. When a disambiguating signal arrives it unravels: it pushes
//! the committed flavor of itself, replays the buffer through the normal
//! protocol in original order, and re-feeds the signal. Two instances share
//! the mechanism: the angle bracket (vector fence vs inequality) and the bar
//! (absolute-value fence vs set-builder separator).
use crate::delim::{CloseDelim, OpenDelim};
use crate::error::ParseError;
use crate::ops::{OpShape, Operator, RelationTok};
use crate::stack::{Item, Reaction, Stack};

#[derive(Debug)]
enum Role {
    AngleOpen {
        open: OpenDelim,
        relation: RelationTok,
    },
    AngleClose {
        close: CloseDelim,
        relation: RelationTok,
    },
    Bar {
        open: OpenDelim,
        separator: Operator,
    },
}

/// An ambiguous token, either in flight or armed on the stack
#[derive(Debug)]
pub struct Lookahead {
    role: Role,
    buffer: Vec<Item>,
    saw_comma: bool,
}

impl Lookahead {
    pub(crate) fn angle_open(open: OpenDelim, relation: RelationTok) -> Self {
        Lookahead {
            role: Role::AngleOpen { open, relation },
            buffer: Vec::new(),
            saw_comma: false,
        }
    }

    pub(crate) fn angle_close(close: CloseDelim, relation: RelationTok) -> Self {
        Lookahead {
            role: Role::AngleClose { close, relation },
            buffer: Vec::new(),
            saw_comma: false,
        }
    }

    pub(crate) fn bar(open: OpenDelim, separator: Operator) -> Self {
        Lookahead {
            role: Role::Bar { open, separator },
            buffer: Vec::new(),
            saw_comma: false,
        }
    }

    /// Initial placement: commit immediately where the stack already
    /// disambiguates, otherwise arm and start buffering
    pub(crate) fn follows(
        self,
        stack: &mut Stack,
        pending: &mut Vec<Item>,
    ) -> Result<(), ParseError> {
        if !self.buffer.is_empty() {
            // re-placement after buffering another item
            stack.push(Item::Lookahead(self));
            return Ok(());
        }
        match self.role {
            Role::AngleOpen { open, relation } => {
                // a left operand means inequality; otherwise speculate on a fence
                if matches!(stack.top(), Some(Item::Operand(_))) {
                    pending.push(Item::Relation(relation));
                } else {
                    stack.push(Item::Lookahead(Lookahead {
                        role: Role::AngleOpen { open, relation },
                        buffer: Vec::new(),
                        saw_comma: false,
                    }));
                }
                Ok(())
            }
            Role::AngleClose { close, relation } => {
                if nearest_open_takes(stack, &close.close) {
                    pending.push(Item::Close(close));
                } else {
                    pending.push(Item::Relation(relation));
                }
                Ok(())
            }
            Role::Bar { open, separator } => {
                if nearest_open_takes(stack, &open.open) {
                    pending.push(Item::Close(CloseDelim { close: open.open }));
                } else if matches!(stack.top(), Some(Item::Operand(_))) {
                    pending.push(Item::Operator(separator));
                } else {
                    stack.push(Item::Lookahead(Lookahead {
                        role: Role::Bar { open, separator },
                        buffer: Vec::new(),
                        saw_comma: false,
                    }));
                }
                Ok(())
            }
        }
    }

    /// Armed handling: buffer, or unravel on a disambiguating signal
    pub(crate) fn followed_by(self, incoming: Item) -> Result<Reaction, ParseError> {
        let Lookahead {
            role,
            mut buffer,
            mut saw_comma,
        } = self;
        match role {
            Role::AngleOpen { open, relation } => match incoming {
                // the partner close makes the buffer a vector literal
                Item::Lookahead(partner) if partner.is_angle_close() => {
                    let close = partner.into_close();
                    Ok(commit(Item::Open(open), buffer, Some(Item::Close(close))))
                }
                // any other fence commits the delimiter flavor and replays
                Item::Lookahead(_) | Item::Open(_) => {
                    Ok(commit(Item::Open(open), buffer, Some(incoming)))
                }
                Item::Close(_) | Item::End => {
                    if buffer.is_empty() {
                        Err(ParseError::MissingOperand { symbol: open.open })
                    } else {
                        Ok(commit(Item::Relation(relation), buffer, Some(incoming)))
                    }
                }
                Item::Operator(op) => {
                    if op.symbol == "," {
                        saw_comma = true;
                        buffer.push(Item::Operator(op));
                        Ok(rearm(Role::AngleOpen { open, relation }, buffer, saw_comma))
                    } else if saw_comma || matches!(op.shape, OpShape::Prefix | OpShape::Both) {
                        // sign-like operators may open an operand; after a
                        // comma only the matching close can decide
                        buffer.push(Item::Operator(op));
                        Ok(rearm(Role::AngleOpen { open, relation }, buffer, saw_comma))
                    } else {
                        Ok(commit(
                            Item::Relation(relation),
                            buffer,
                            Some(Item::Operator(op)),
                        ))
                    }
                }
                Item::Relation(_) if !saw_comma => {
                    Ok(commit(Item::Relation(relation), buffer, Some(incoming)))
                }
                incoming => {
                    buffer.push(incoming);
                    Ok(rearm(Role::AngleOpen { open, relation }, buffer, saw_comma))
                }
            },
            Role::Bar { open, separator } => match incoming {
                // a partner bar closes the absolute value
                Item::Lookahead(partner) if partner.is_bar() => {
                    let glyph = open.open.clone();
                    Ok(commit(
                        Item::Open(open),
                        buffer,
                        Some(Item::Close(CloseDelim { close: glyph })),
                    ))
                }
                Item::Lookahead(_) | Item::Open(_) => {
                    Ok(commit(Item::Open(open), buffer, Some(incoming)))
                }
                Item::Close(_) | Item::End => {
                    if buffer.is_empty() {
                        Err(ParseError::MissingOperand { symbol: open.open })
                    } else {
                        Ok(commit(Item::Operator(separator), buffer, Some(incoming)))
                    }
                }
                incoming => {
                    buffer.push(incoming);
                    Ok(rearm(Role::Bar { open, separator }, buffer, saw_comma))
                }
            },
            role @ Role::AngleClose { .. } => Ok(Reaction::Pass(
                Item::Lookahead(Lookahead {
                    role,
                    buffer,
                    saw_comma,
                }),
                incoming,
            )),
        }
    }

    fn is_angle_close(&self) -> bool {
        matches!(self.role, Role::AngleClose { .. })
    }

    fn is_bar(&self) -> bool {
        matches!(self.role, Role::Bar { .. })
    }

    fn into_close(self) -> CloseDelim {
        match self.role {
            Role::AngleClose { close, .. } => close,
            Role::AngleOpen { open, .. } | Role::Bar { open, .. } => CloseDelim { close: open.open },
        }
    }
}

/// Whether the innermost unclosed opener accepts this closing glyph
fn nearest_open_takes(stack: &Stack, close: &str) -> bool {
    for item in stack.items().iter().rev() {
        match item {
            Item::Open(open) => return open.closers.iter().any(|c| c == close),
            Item::Start => return false,
            _ => continue,
        }
    }
    false
}

fn commit(flavor: Item, buffer: Vec<Item>, signal: Option<Item>) -> Reaction {
    let mut items = Vec::with_capacity(buffer.len() + 2);
    items.push(flavor);
    items.extend(buffer);
    items.extend(signal);
    Reaction::Consumed(items)
}

fn rearm(role: Role, buffer: Vec<Item>, saw_comma: bool) -> Reaction {
    Reaction::Consumed(vec![Item::Lookahead(Lookahead {
        role,
        buffer,
        saw_comma,
    })])
}
