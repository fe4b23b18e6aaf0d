//! Delimiter matching and group assembly
//!
//! A closing delimiter (and the end-of-input sentinel, which works the same
//! way against the bottom sentinel) unwinds the stack: pending operators,
//! relations, and application markers resolve into a carried operand until
//! the matching opener surfaces. Groups then splice comma lists, check
//! emptiness, and elide themselves around a single child where configured,
//! feeding the result back through the protocol.
use crate::error::{DelimiterIssue, ParseError};
use crate::parser::TokenConfig;
use crate::stack::{Item, Operand, Stack};
use crate::tree::Node;

/// An opening delimiter resting on the stack
#[derive(Debug, Clone)]
pub struct OpenDelim {
    pub(crate) open: String,
    pub(crate) closers: Vec<String>,
    pub(crate) allow_empty: bool,
    pub(crate) elide: bool,
    pub(crate) splice: bool,
    pub(crate) argument_group: bool,
}

impl OpenDelim {
    pub(crate) fn from_config(open: &str, config: &TokenConfig) -> Self {
        OpenDelim {
            open: open.to_owned(),
            closers: config.closers.clone(),
            allow_empty: config.allow_empty,
            elide: config.elide,
            splice: config.splice,
            argument_group: config.argument_group,
        }
    }
}

/// A closing delimiter in flight
#[derive(Debug, Clone)]
pub struct CloseDelim {
    pub(crate) close: String,
}

enum Unwound {
    Carry(Option<Operand>),
    Open(OpenDelim, Option<Operand>),
    Bottom(Option<Operand>),
}

/// Resolve one stack slot into the carried operand
fn step(stack: &mut Stack, carry: Option<Operand>) -> Result<Unwound, ParseError> {
    match stack.pop() {
        Some(Item::Operand(operand)) => {
            if carry.is_some() {
                return Err(ParseError::MissingOperand {
                    symbol: operand.label(),
                });
            }
            Ok(Unwound::Carry(Some(operand)))
        }
        Some(Item::Operator(op)) => {
            let symbol = op.symbol.clone();
            let operand = carry.ok_or(ParseError::MissingOperand { symbol })?;
            Ok(Unwound::Carry(Some(op.resolve(operand)?)))
        }
        Some(Item::Relation(rel)) => {
            let symbol = rel.symbol().to_owned();
            let operand = carry.ok_or(ParseError::MissingOperand { symbol })?;
            Ok(Unwound::Carry(Some(rel.resolve(operand))))
        }
        Some(Item::Apply(marker)) => Ok(Unwound::Carry(marker.resolve_unwound(carry, stack)?)),
        Some(Item::Open(open)) => Ok(Unwound::Open(open, carry)),
        Some(Item::Start) | None => Ok(Unwound::Bottom(carry)),
        Some(Item::End) | Some(Item::Close(_)) | Some(Item::Lookahead(_)) => {
            unreachable!("transient items never rest on the stack")
        }
    }
}

/// Unwind to the matching opener and build the group
///
/// A closer that surfaces a non-matching opener fails right there with both
/// glyphs named; it does not pop past the opener looking for a deeper match.
pub(crate) fn close_group(
    stack: &mut Stack,
    close: CloseDelim,
    pending: &mut Vec<Item>,
) -> Result<(), ParseError> {
    let mut carry: Option<Operand> = None;
    loop {
        match step(stack, carry.take())? {
            Unwound::Carry(next) => carry = next,
            Unwound::Open(open, carried) => {
                if !open.closers.iter().any(|c| c == &close.close) {
                    return Err(ParseError::DelimiterMismatch(
                        DelimiterIssue::MismatchedPair {
                            open: open.open,
                            close: close.close,
                        },
                    ));
                }
                let operand = finish_group(open, close.close, carried)?;
                pending.push(Item::Operand(operand));
                return Ok(());
            }
            Unwound::Bottom(_) => {
                return Err(ParseError::DelimiterMismatch(DelimiterIssue::ExtraClose(
                    close.close,
                )))
            }
        }
    }
}

/// Unwind to the bottom sentinel at end of input
pub(crate) fn finish(stack: &mut Stack) -> Result<(), ParseError> {
    let mut carry: Option<Operand> = None;
    loop {
        match step(stack, carry.take())? {
            Unwound::Carry(next) => carry = next,
            Unwound::Open(open, _) => {
                return Err(ParseError::DelimiterMismatch(DelimiterIssue::UnclosedOpen(
                    open.open,
                )))
            }
            Unwound::Bottom(carried) => {
                stack.push(Item::Start);
                return match carried {
                    Some(operand) => {
                        stack.push(Item::Operand(operand));
                        Ok(())
                    }
                    None => Err(ParseError::MissingOperand {
                        symbol: "end of input".to_owned(),
                    }),
                };
            }
        }
    }
}

fn finish_group(
    open: OpenDelim,
    close: String,
    carry: Option<Operand>,
) -> Result<Operand, ParseError> {
    let (children, descriptor) = match carry {
        None => {
            if !open.allow_empty {
                return Err(ParseError::EmptyGroup { open: open.open });
            }
            (Vec::new(), None)
        }
        Some(operand) => match operand.node {
            Node::BinaryOp { op, children } if open.splice && op.symbol == "," => (children, None),
            // a lone child keeps its function capability through the fence
            node => (vec![node], operand.descriptor),
        },
    };
    if open.elide && children.len() == 1 {
        let mut children = children;
        return Ok(Operand {
            node: children.swap_remove(0),
            descriptor,
            group_open: Some(open.open),
            elided: true,
        });
    }
    Ok(Operand {
        node: Node::Group {
            open: open.open.clone(),
            close,
            children,
        },
        descriptor: None,
        group_open: Some(open.open),
        elided: false,
    })
}
