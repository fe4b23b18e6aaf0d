//! The parse stack and its negotiation protocol
//!
//! Grammar rules live in the stack items themselves. When a new item arrives,
//! the current top gets first refusal via [`Item::followed_by`]: it either
//! consumes the newcomer and returns a complete replacement for its own slot,
//! or passes, after which the newcomer places itself via [`Item::follows`].
//! Replacements are scheduled on an explicit work list, so stack depth never
//! turns into call depth no matter how deeply an expression nests.
//!
//! The item set is closed. Customization happens by registering token
//! definitions whose constructor entries pick which item a lexeme becomes and
//! with what configuration, not by adding new item variants.
use crate::apply::{ApplyDescriptor, ApplyMarker};
use crate::delim::{self, CloseDelim, OpenDelim};
use crate::error::ParseError;
use crate::lookahead::Lookahead;
use crate::ops::{Operator, RelationTok};
use crate::parser::TokenDef;
use crate::tree::Node;

/// One slot on the parse stack (or in flight toward it)
#[derive(Debug)]
pub enum Item {
    /// Bottom sentinel
    Start,
    /// Input-exhausted sentinel; never rests on the stack
    End,
    /// A resolved value
    Operand(Operand),
    /// An operator awaiting operands
    Operator(Operator),
    /// A relation awaiting its right side, possibly a chain
    Relation(RelationTok),
    /// An opening delimiter
    Open(OpenDelim),
    /// A closing delimiter; never rests on the stack
    Close(CloseDelim),
    /// A pending function application
    Apply(ApplyMarker),
    /// An ambiguous token still gathering context
    Lookahead(Lookahead),
}

/// A resolved value plus the context later items may need
#[derive(Debug)]
pub struct Operand {
    pub(crate) node: Node,
    /// Present when this value can be applied as a function
    pub(crate) descriptor: Option<ApplyDescriptor>,
    /// The opening glyph when this value came directly from closing a group
    pub(crate) group_open: Option<String>,
    /// Whether that group removed its fence around a single child
    pub(crate) elided: bool,
}

impl Operand {
    pub(crate) fn bare(node: Node) -> Self {
        Operand {
            node,
            descriptor: None,
            group_open: None,
            elided: false,
        }
    }

    /// A short label for error messages
    pub(crate) fn label(&self) -> String {
        match &self.node {
            Node::FuncName { name, .. } => name.clone(),
            node => node.to_string(),
        }
    }

    fn follows(self, stack: &mut Stack, pending: &mut Vec<Item>) {
        if let Some(descriptor) = self.descriptor.clone() {
            pending.push(Item::Apply(ApplyMarker::pending(
                descriptor,
                self.label(),
                &stack.config,
            )));
        }
        stack.push(Item::Operand(self));
    }

    fn followed_by(self, incoming: Item, stack: &mut Stack) -> Result<Reaction, ParseError> {
        match incoming {
            // adjacency means multiplication: `2x`, `x(y+1)`
            Item::Operand(_) | Item::Open(_) => match stack.config.implicit_mult.clone() {
                Some(mult) => Ok(Reaction::Consumed(vec![
                    Item::Operand(self),
                    Item::Operator(mult),
                    incoming,
                ])),
                None => Err(ParseError::MissingOperand {
                    symbol: self.label(),
                }),
            },
            incoming => Ok(Reaction::Pass(Item::Operand(self), incoming)),
        }
    }
}

/// The outcome of offering an incoming item to the stack top
pub(crate) enum Reaction {
    /// The top consumed the newcomer; these items are the complete
    /// replacement for both, replayed through the protocol in order
    Consumed(Vec<Item>),
    /// The top declined; restore it and let the newcomer place itself
    Pass(Item, Item),
}

/// Per-parse configuration threaded to every handler
#[derive(Debug)]
pub(crate) struct StackConfig {
    /// Operator template inserted between adjacent operands
    pub implicit_mult: Option<Operator>,
    /// Binding strength of implicit function application
    pub implicit_apply_precedence: u32,
    /// Rendering precedence for expression-headed applications
    pub apply_precedence: u32,
}

/// The authoritative stack for one parse
#[derive(Debug)]
pub(crate) struct Stack {
    items: Vec<Item>,
    pub(crate) config: StackConfig,
}

impl Stack {
    pub(crate) fn new(config: StackConfig) -> Self {
        Stack {
            items: Vec::new(),
            config,
        }
    }

    pub(crate) fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub(crate) fn pop(&mut self) -> Option<Item> {
        self.items.pop()
    }

    pub(crate) fn top(&self) -> Option<&Item> {
        self.items.last()
    }

    pub(crate) fn items(&self) -> &[Item] {
        &self.items
    }

    /// Run one item, and everything it triggers, to quiescence
    pub(crate) fn drive(&mut self, item: Item) -> Result<(), ParseError> {
        let mut pending = vec![item];
        while let Some(item) = pending.pop() {
            match self.items.pop() {
                Some(top) => match top.followed_by(item, self)? {
                    Reaction::Consumed(mut replacement) => {
                        replacement.reverse();
                        pending.extend(replacement);
                    }
                    Reaction::Pass(top, item) => {
                        self.items.push(top);
                        item.follows(self, &mut pending)?;
                    }
                },
                None => item.follows(self, &mut pending)?,
            }
        }
        Ok(())
    }

    /// Extract the final tree after the end sentinel has been driven
    pub(crate) fn into_result(mut self) -> Result<Node, ParseError> {
        match (self.items.pop(), self.items.pop()) {
            (Some(Item::Operand(operand)), Some(Item::Start)) if self.items.is_empty() => {
                Ok(operand.node)
            }
            _ => Err(ParseError::MissingOperand {
                symbol: "end of input".to_owned(),
            }),
        }
    }
}

impl Item {
    fn followed_by(self, incoming: Item, stack: &mut Stack) -> Result<Reaction, ParseError> {
        match self {
            Item::Operand(operand) => operand.followed_by(incoming, stack),
            Item::Apply(marker) => marker.followed_by(incoming, stack),
            Item::Lookahead(lookahead) => lookahead.followed_by(incoming),
            top => Ok(Reaction::Pass(top, incoming)),
        }
    }

    fn follows(self, stack: &mut Stack, pending: &mut Vec<Item>) -> Result<(), ParseError> {
        match self {
            Item::Start => {
                stack.push(Item::Start);
                Ok(())
            }
            Item::End => delim::finish(stack),
            Item::Operand(operand) => {
                operand.follows(stack, pending);
                Ok(())
            }
            Item::Operator(operator) => operator.follows(stack, pending),
            Item::Relation(relation) => relation.follows(stack),
            Item::Open(open) => {
                stack.push(Item::Open(open));
                Ok(())
            }
            Item::Close(close) => delim::close_group(stack, close, pending),
            Item::Apply(marker) => {
                stack.push(Item::Apply(marker));
                Ok(())
            }
            Item::Lookahead(lookahead) => lookahead.follows(stack, pending),
        }
    }
}

// Constructor entries. Each has the signature token definitions expect, so a
// definition's `build` field can name one directly, and custom grammars can
// substitute their own.
impl Item {
    /// A numeric literal operand
    pub fn number(_: &TokenDef, text: &str) -> Item {
        Item::Operand(Operand::bare(Node::num(text)))
    }

    /// An identifier operand
    pub fn name(_: &TokenDef, text: &str) -> Item {
        Item::Operand(Operand::bare(Node::name(text)))
    }

    /// A function-name operand carrying the definition's descriptor
    pub fn function(def: &TokenDef, text: &str) -> Item {
        Item::Operand(Operand {
            node: Node::func_name(text, def.config.inverse.as_deref()),
            descriptor: def.config.descriptor.clone(),
            group_open: None,
            elided: false,
        })
    }

    /// An operator configured by the definition
    pub fn operator(def: &TokenDef, text: &str) -> Item {
        Item::Operator(Operator::from_config(text, &def.config))
    }

    /// A relation configured by the definition
    pub fn relation(def: &TokenDef, text: &str) -> Item {
        Item::Relation(RelationTok::from_config(text, &def.config))
    }

    /// An opening delimiter
    pub fn open(def: &TokenDef, text: &str) -> Item {
        Item::Open(OpenDelim::from_config(text, &def.config))
    }

    /// A closing delimiter
    pub fn close(def: &TokenDef, text: &str) -> Item {
        Item::Close(CloseDelim {
            close: text.to_owned(),
        })
    }

    /// The ambiguous opening angle: vector fence or inequality
    pub fn angle_open(def: &TokenDef, text: &str) -> Item {
        Item::Lookahead(Lookahead::angle_open(
            OpenDelim::from_config(text, &def.config),
            RelationTok::from_config(text, &def.config),
        ))
    }

    /// The ambiguous closing angle: vector fence or inequality
    pub fn angle_close(def: &TokenDef, text: &str) -> Item {
        Item::Lookahead(Lookahead::angle_close(
            CloseDelim {
                close: text.to_owned(),
            },
            RelationTok::from_config(text, &def.config),
        ))
    }

    /// The ambiguous bar: absolute-value fence or set-builder separator
    pub fn bar(def: &TokenDef, text: &str) -> Item {
        Item::Lookahead(Lookahead::bar(
            OpenDelim::from_config(text, &def.config),
            Operator::separator_from_config(text, &def.config),
        ))
    }
}
