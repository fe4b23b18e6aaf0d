//! Operator and relation resolution
//!
//! Arriving operators claim the operand on top of the stack and first let
//! anything that binds tighter resolve into it (precedence climbing over the
//! stack, not the call stack). Combinable operators fuse repeats into one
//! n-ary node instead of nesting. Relations chain: a second compatible
//! relation absorbs into the pending one, so `x < y <= z` becomes a single
//! multi-relation over three operands.
use crate::apply::ApplyState;
use crate::error::ParseError;
use crate::parser::TokenConfig;
use crate::stack::{Item, Operand, Stack};
use crate::tree::{Assoc, Node, OpMeta};

/// Where an operator takes its operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpShape {
    /// Infix, both sides required
    #[default]
    Binary,
    /// Operand on the right only
    Prefix,
    /// Operand on the left only, resolved immediately
    Postfix,
    /// Infix normally, prefix when no left operand exists (like `-`)
    Both,
}

/// An operator token, pending on the stack until its last operand arrives
#[derive(Debug, Clone)]
pub struct Operator {
    pub(crate) symbol: String,
    pub(crate) shape: OpShape,
    pub(crate) precedence: u32,
    pub(crate) unary_precedence: u32,
    pub(crate) assoc: Assoc,
    pub(crate) combinable: bool,
    pub(crate) power_inverse: bool,
    prefix_mode: bool,
    children: Vec<Node>,
    apply: ApplyState,
}

impl Operator {
    pub(crate) fn from_config(symbol: &str, config: &TokenConfig) -> Self {
        Operator {
            symbol: symbol.to_owned(),
            shape: config.shape,
            precedence: config.precedence,
            unary_precedence: config.unary_precedence,
            assoc: config.assoc,
            combinable: config.combinable,
            power_inverse: config.power_inverse,
            prefix_mode: false,
            children: Vec::new(),
            apply: ApplyState::Untouched,
        }
    }

    /// The bar's operator flavor; the same config also describes its fence
    pub(crate) fn separator_from_config(symbol: &str, config: &TokenConfig) -> Self {
        Operator::from_config(symbol, config)
    }

    fn current_precedence(&self) -> u32 {
        if self.prefix_mode {
            self.unary_precedence
        } else {
            self.precedence
        }
    }

    pub(crate) fn binds_tighter(&self, precedence: u32, assoc: Assoc) -> bool {
        let own = self.current_precedence();
        own > precedence || (own == precedence && assoc == Assoc::Left)
    }

    /// Record an operand, updating the function-capability state
    fn observe_child(&mut self, operand: Operand) -> Result<(), ParseError> {
        self.apply = self.apply.clone().observe(operand.descriptor)?;
        self.children.push(operand.node);
        Ok(())
    }

    /// Attach the final operand and collapse into an operand
    pub(crate) fn resolve(mut self, operand: Operand) -> Result<Operand, ParseError> {
        if self.prefix_mode {
            // fold a prefix minus straight into a numeric literal
            if self.symbol == "-" {
                if let Node::Num(text) = &operand.node {
                    if !text.starts_with('-') {
                        return Ok(Operand::bare(Node::num(format!("-{text}"))));
                    }
                }
            }
            return Ok(Operand::bare(Node::UnaryOp {
                op: OpMeta::new(
                    self.symbol,
                    self.unary_precedence,
                    Assoc::Right,
                    false,
                ),
                child: Box::new(operand.node),
            }));
        }
        self.observe_child(operand)?;
        let descriptor = self.apply.descriptor();
        Ok(Operand {
            node: Node::BinaryOp {
                op: OpMeta::new(self.symbol, self.precedence, self.assoc, self.combinable),
                children: self.children,
            },
            descriptor,
            group_open: None,
            elided: false,
        })
    }

    pub(crate) fn follows(
        mut self,
        stack: &mut Stack,
        pending: &mut Vec<Item>,
    ) -> Result<(), ParseError> {
        if self.shape == OpShape::Postfix {
            let operand =
                take_operand(stack, &self.symbol, self.precedence, Assoc::Left, false, false)?;
            pending.push(Item::Operand(Operand::bare(Node::UnaryOp {
                op: OpMeta::new(self.symbol, self.precedence, Assoc::Left, false),
                child: Box::new(operand.node),
            })));
            return Ok(());
        }
        let has_left =
            self.shape != OpShape::Prefix && matches!(stack.top(), Some(Item::Operand(_)));
        if has_left {
            let operand = take_operand(
                stack,
                &self.symbol,
                self.precedence,
                self.assoc,
                self.combinable,
                false,
            )?;
            // repeats of a combinable operator fold into one n-ary node
            match stack.pop() {
                Some(Item::Operator(mut prev))
                    if self.combinable
                        && prev.combinable
                        && !prev.prefix_mode
                        && prev.symbol == self.symbol =>
                {
                    prev.observe_child(operand)?;
                    stack.push(Item::Operator(prev));
                    return Ok(());
                }
                Some(item) => stack.push(item),
                None => {}
            }
            self.observe_child(operand)?;
            stack.push(Item::Operator(self));
            Ok(())
        } else if matches!(self.shape, OpShape::Prefix | OpShape::Both) {
            self.prefix_mode = true;
            stack.push(Item::Operator(self));
            Ok(())
        } else {
            Err(ParseError::MissingOperand {
                symbol: self.symbol,
            })
        }
    }
}

/// A relation token, pending on the stack, possibly mid-chain
#[derive(Debug)]
pub struct RelationTok {
    symbols: Vec<String>,
    /// The chain's comparison direction; `=` until an inequality joins
    chain: char,
    precedence: u32,
    fusable: bool,
    children: Vec<Node>,
}

impl RelationTok {
    pub(crate) fn from_config(symbol: &str, config: &TokenConfig) -> Self {
        RelationTok {
            chain: symbol.chars().next().unwrap_or('='),
            symbols: vec![symbol.to_owned()],
            precedence: config.precedence,
            fusable: config.fusable,
            children: Vec::new(),
        }
    }

    pub(crate) fn binds_tighter(&self, precedence: u32, assoc: Assoc) -> bool {
        self.precedence > precedence || (self.precedence == precedence && assoc == Assoc::Left)
    }

    /// The most recent glyph, for error messages
    pub(crate) fn symbol(&self) -> &str {
        self.symbols.last().map(String::as_str).unwrap_or("=")
    }

    /// Whether a chain can absorb another relation glyph
    fn accepts(&self, symbol: &str) -> bool {
        match symbol.chars().next() {
            Some('=') => true,
            Some(lead) => self.chain == '=' || lead == self.chain,
            None => false,
        }
    }

    fn absorb(&mut self, symbol: String, operand: Operand) {
        if self.chain == '=' {
            if let Some(lead) = symbol.chars().next() {
                if lead != '=' {
                    self.chain = lead;
                }
            }
        }
        self.children.push(operand.node);
        self.symbols.push(symbol);
    }

    /// Attach the final operand and collapse into an operand
    pub(crate) fn resolve(mut self, operand: Operand) -> Operand {
        self.children.push(operand.node);
        let node = if self.symbols.len() == 1 {
            Node::Relation {
                symbol: self.symbols.swap_remove(0),
                precedence: self.precedence,
                children: self.children,
            }
        } else {
            Node::MultiRelation {
                symbols: self.symbols,
                precedence: self.precedence,
                children: self.children,
            }
        };
        Operand::bare(node)
    }

    pub(crate) fn follows(mut self, stack: &mut Stack) -> Result<(), ParseError> {
        let symbol = match self.symbols.last() {
            Some(symbol) => symbol.clone(),
            None => return Err(ParseError::MissingOperand { symbol: "?".into() }),
        };
        let operand = take_operand(
            stack,
            &symbol,
            self.precedence,
            Assoc::Left,
            false,
            self.fusable,
        )?;
        match stack.pop() {
            Some(Item::Relation(mut prev))
                if prev.fusable && self.fusable && prev.accepts(&symbol) =>
            {
                prev.absorb(symbol, operand);
                stack.push(Item::Relation(prev));
            }
            other => {
                if let Some(item) = other {
                    stack.push(item);
                }
                self.children.push(operand.node);
                stack.push(Item::Relation(self));
            }
        }
        Ok(())
    }
}

/// Pop the top operand and resolve everything that binds tighter into it
///
/// `fuse_op` stops reduction at a pending instance of the same combinable
/// operator, and `fuse_rel` at a chainable relation, leaving them for the
/// caller's fusion path.
pub(crate) fn take_operand(
    stack: &mut Stack,
    symbol: &str,
    precedence: u32,
    assoc: Assoc,
    fuse_op: bool,
    fuse_rel: bool,
) -> Result<Operand, ParseError> {
    let mut operand = match stack.pop() {
        Some(Item::Operand(operand)) => operand,
        other => {
            if let Some(item) = other {
                stack.push(item);
            }
            return Err(ParseError::MissingOperand {
                symbol: symbol.to_owned(),
            });
        }
    };
    loop {
        match stack.pop() {
            Some(Item::Operator(op)) => {
                if fuse_op && op.combinable && !op.prefix_mode && op.symbol == symbol {
                    stack.push(Item::Operator(op));
                    break;
                }
                if op.binds_tighter(precedence, assoc) {
                    operand = op.resolve(operand)?;
                } else {
                    stack.push(Item::Operator(op));
                    break;
                }
            }
            Some(Item::Relation(rel)) => {
                if fuse_rel && rel.fusable && rel.accepts(symbol) {
                    stack.push(Item::Relation(rel));
                    break;
                }
                if rel.binds_tighter(precedence, assoc) {
                    operand = rel.resolve(operand);
                } else {
                    stack.push(Item::Relation(rel));
                    break;
                }
            }
            Some(Item::Apply(marker)) if marker.binds_tighter(precedence, assoc) => {
                operand = marker.resolve_implicit(operand, stack)?;
            }
            other => {
                if let Some(item) = other {
                    stack.push(item);
                }
                break;
            }
        }
    }
    Ok(operand)
}
