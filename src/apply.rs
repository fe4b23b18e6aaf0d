//! Function application
//!
//! A function-capable operand arms an [`ApplyMarker`] directly above itself.
//! The marker watches what comes next: an argument group makes it explicit,
//! an operand (or prefix operator) turns it into an implicit application
//! binding at unary precedence, a power token may start the bounded inverse
//! rewrite (`sin^-1` to `arcsin`), and anything else retires it, leaving the
//! bare function value in place.
//!
//! Descriptors travel by value. Operators accumulate them over their
//! children: the first function child adopts, later ones merge, any
//! non-function child revokes for good.
use crate::error::ParseError;
use crate::stack::{Item, Operand, Reaction, Stack, StackConfig};
use crate::tree::{Assoc, Node};

/// How a function-capable value may be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyDescriptor {
    /// Required argument count, or unbounded when `None`
    pub expected_args: Option<usize>,
    /// Whether a bare reference without arguments is an error
    pub explicit_required: bool,
    /// Whether a following operand is captured as an implicit argument
    pub auto_apply: bool,
}

impl ApplyDescriptor {
    /// Combine the descriptors of two values joined by an operator
    ///
    /// Flags must agree exactly; argument counts must agree or one side must
    /// be unbounded.
    pub fn merge(self, other: ApplyDescriptor) -> Result<ApplyDescriptor, ParseError> {
        if self.explicit_required != other.explicit_required {
            return Err(ParseError::IncompatibleFunction {
                reason: "one side requires explicit arguments".to_owned(),
            });
        }
        if self.auto_apply != other.auto_apply {
            return Err(ParseError::IncompatibleFunction {
                reason: "one side applies implicitly".to_owned(),
            });
        }
        let expected_args = match (self.expected_args, other.expected_args) {
            (Some(a), Some(b)) if a != b => {
                return Err(ParseError::IncompatibleFunction {
                    reason: format!("argument counts {a} and {b} differ"),
                })
            }
            (a, b) => a.or(b),
        };
        Ok(ApplyDescriptor {
            expected_args,
            explicit_required: self.explicit_required,
            auto_apply: self.auto_apply,
        })
    }
}

/// An operator's accumulated function capability
#[derive(Debug, Clone)]
pub(crate) enum ApplyState {
    /// No children seen yet
    Untouched,
    /// Every child so far was function-capable
    Fn(ApplyDescriptor),
    /// A non-function child killed the capability
    Revoked,
}

impl ApplyState {
    pub(crate) fn observe(
        self,
        descriptor: Option<ApplyDescriptor>,
    ) -> Result<ApplyState, ParseError> {
        match (self, descriptor) {
            (ApplyState::Untouched, Some(descriptor)) => Ok(ApplyState::Fn(descriptor)),
            (ApplyState::Fn(current), Some(descriptor)) => {
                Ok(ApplyState::Fn(current.merge(descriptor)?))
            }
            _ => Ok(ApplyState::Revoked),
        }
    }

    pub(crate) fn descriptor(&self) -> Option<ApplyDescriptor> {
        match self {
            ApplyState::Fn(descriptor) => Some(descriptor.clone()),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Mode {
    /// Freshly armed, watching the next token
    Pending,
    /// An argument group is open; waiting for its product
    Explicit { open: String },
    /// Binds the next resolved operand as a single implicit argument
    AsOperator,
    /// Buffering a possible literal `-1` exponent
    Power { buffer: Vec<Item> },
}

/// The pending-application marker sitting above a function-capable operand
#[derive(Debug)]
pub struct ApplyMarker {
    descriptor: ApplyDescriptor,
    name: String,
    precedence: u32,
    render_precedence: u32,
    mode: Mode,
}

impl ApplyMarker {
    pub(crate) fn pending(
        descriptor: ApplyDescriptor,
        name: String,
        config: &StackConfig,
    ) -> Self {
        ApplyMarker {
            descriptor,
            name,
            precedence: config.implicit_apply_precedence,
            render_precedence: config.apply_precedence,
            mode: Mode::Pending,
        }
    }

    /// Implicit application reduces like a right-associative unary operator
    pub(crate) fn binds_tighter(&self, precedence: u32, assoc: Assoc) -> bool {
        matches!(self.mode, Mode::AsOperator)
            && (self.precedence > precedence
                || (self.precedence == precedence && assoc == Assoc::Left))
    }

    pub(crate) fn followed_by(
        mut self,
        incoming: Item,
        stack: &mut Stack,
    ) -> Result<Reaction, ParseError> {
        let mode = std::mem::replace(&mut self.mode, Mode::Pending);
        match mode {
            Mode::Pending => self.pending_followed_by(incoming, stack),
            Mode::Explicit { open } => self.explicit_followed_by(open, incoming, stack),
            Mode::AsOperator => {
                self.mode = Mode::AsOperator;
                Ok(Reaction::Pass(Item::Apply(self), incoming))
            }
            Mode::Power { buffer } => self.power_followed_by(buffer, incoming, stack),
        }
    }

    fn pending_followed_by(
        mut self,
        incoming: Item,
        stack: &mut Stack,
    ) -> Result<Reaction, ParseError> {
        match incoming {
            Item::Open(open) if open.argument_group => {
                self.mode = Mode::Explicit {
                    open: open.open.clone(),
                };
                Ok(Reaction::Consumed(vec![Item::Apply(self), Item::Open(open)]))
            }
            Item::Operand(_) if self.descriptor.auto_apply => {
                self.mode = Mode::AsOperator;
                Ok(Reaction::Consumed(vec![Item::Apply(self), incoming]))
            }
            Item::Operator(op) if op.power_inverse && invertible_head(stack) => {
                self.mode = Mode::Power {
                    buffer: vec![Item::Operator(op)],
                };
                Ok(Reaction::Consumed(vec![Item::Apply(self)]))
            }
            Item::Operator(op)
                if self.descriptor.auto_apply
                    && matches!(op.shape, crate::ops::OpShape::Prefix | crate::ops::OpShape::Both) =>
            {
                self.mode = Mode::AsOperator;
                Ok(Reaction::Consumed(vec![Item::Apply(self), Item::Operator(op)]))
            }
            incoming => {
                if self.descriptor.explicit_required {
                    Err(ParseError::MissingOperand { symbol: self.name })
                } else {
                    // retire; the bare function value stays usable
                    Ok(Reaction::Consumed(vec![incoming]))
                }
            }
        }
    }

    fn explicit_followed_by(
        mut self,
        open: String,
        incoming: Item,
        stack: &mut Stack,
    ) -> Result<Reaction, ParseError> {
        match incoming {
            Item::Operand(operand) if operand.group_open.as_deref() == Some(open.as_str()) => {
                let args = match operand.node {
                    Node::Group { children, .. } if !operand.elided => children,
                    node => vec![node],
                };
                let applied = self.build_application(args, true, stack)?;
                Ok(Reaction::Consumed(vec![Item::Operand(applied)]))
            }
            incoming => {
                self.mode = Mode::Explicit { open };
                Ok(Reaction::Pass(Item::Apply(self), incoming))
            }
        }
    }

    fn power_followed_by(
        mut self,
        mut buffer: Vec<Item>,
        incoming: Item,
        stack: &mut Stack,
    ) -> Result<Reaction, ParseError> {
        let accepted = match (buffer.len(), &incoming) {
            (1, Item::Operator(op)) if op.symbol == "-" => true,
            (1, Item::Open(_)) => true,
            (2, Item::Operand(operand))
                if matches!(buffer.get(1), Some(Item::Operator(_))) && is_literal_one(operand) =>
            {
                return self.commit_inverse(buffer, incoming, stack);
            }
            (2, Item::Operator(op))
                if matches!(buffer.get(1), Some(Item::Open(_))) && op.symbol == "-" =>
            {
                true
            }
            (3, Item::Operand(operand)) if is_literal_one(operand) => true,
            (4, Item::Close(close)) => {
                let matched = matches!(
                    buffer.get(1),
                    Some(Item::Open(open)) if open.closers.iter().any(|c| c == &close.close)
                );
                if matched {
                    return self.commit_inverse(buffer, incoming, stack);
                }
                false
            }
            _ => false,
        };
        if accepted {
            buffer.push(incoming);
            self.mode = Mode::Power { buffer };
            Ok(Reaction::Consumed(vec![Item::Apply(self)]))
        } else {
            Ok(unravel(buffer, incoming))
        }
    }

    /// Swap the head for its registered inverse and re-arm
    fn commit_inverse(
        self,
        buffer: Vec<Item>,
        incoming: Item,
        stack: &mut Stack,
    ) -> Result<Reaction, ParseError> {
        match stack.pop() {
            Some(Item::Operand(Operand {
                node:
                    Node::FuncName {
                        name,
                        inverse: Some(inverse),
                    },
                ..
            })) => Ok(Reaction::Consumed(vec![Item::Operand(Operand {
                node: Node::FuncName {
                    name: inverse,
                    inverse: Some(name),
                },
                descriptor: Some(self.descriptor),
                group_open: None,
                elided: false,
            })])),
            other => {
                if let Some(item) = other {
                    stack.push(item);
                }
                Ok(unravel(buffer, incoming))
            }
        }
    }

    /// Resolution during precedence climbing: one implicit argument
    pub(crate) fn resolve_implicit(
        self,
        operand: Operand,
        stack: &mut Stack,
    ) -> Result<Operand, ParseError> {
        self.build_application(vec![operand.node], false, stack)
    }

    /// Resolution during an unwind toward a close or the end sentinel
    pub(crate) fn resolve_unwound(
        self,
        carry: Option<Operand>,
        stack: &mut Stack,
    ) -> Result<Option<Operand>, ParseError> {
        match self.mode {
            Mode::AsOperator => {
                let operand = carry.ok_or(ParseError::MissingOperand {
                    symbol: self.name.clone(),
                })?;
                Ok(Some(self.build_application(vec![operand.node], false, stack)?))
            }
            Mode::Pending if !self.descriptor.explicit_required => Ok(carry),
            _ => Err(ParseError::MissingOperand { symbol: self.name }),
        }
    }

    fn build_application(
        self,
        args: Vec<Node>,
        explicit: bool,
        stack: &mut Stack,
    ) -> Result<Operand, ParseError> {
        if let Some(expected) = self.descriptor.expected_args {
            if args.len() != expected {
                return Err(ParseError::Arity {
                    name: self.name,
                    expected,
                    found: args.len(),
                });
            }
        }
        let head = match stack.pop() {
            Some(Item::Operand(operand)) => operand,
            other => {
                if let Some(item) = other {
                    stack.push(item);
                }
                return Err(ParseError::MissingOperand { symbol: self.name });
            }
        };
        let node = match head.node {
            node @ Node::FuncName { .. } => Node::FuncApply {
                name: Box::new(node),
                args,
                explicit,
            },
            node => Node::FuncExp {
                head: Box::new(node),
                args,
                apply_precedence: self.render_precedence,
            },
        };
        Ok(Operand::bare(node))
    }
}

fn invertible_head(stack: &Stack) -> bool {
    matches!(
        stack.top(),
        Some(Item::Operand(operand))
            if matches!(&operand.node, Node::FuncName { inverse: Some(_), .. })
    )
}

fn is_literal_one(operand: &Operand) -> bool {
    operand.group_open.is_none() && matches!(&operand.node, Node::Num(text) if text == "1")
}

fn unravel(mut buffer: Vec<Item>, incoming: Item) -> Reaction {
    buffer.push(incoming);
    Reaction::Consumed(buffer)
}

#[cfg(test)]
mod tests {
    use super::{ApplyDescriptor, ApplyState};
    use crate::error::ParseError;
    use assert_matches::assert_matches;

    fn unary() -> ApplyDescriptor {
        ApplyDescriptor {
            expected_args: Some(1),
            explicit_required: false,
            auto_apply: true,
        }
    }

    #[test]
    fn merge_keeps_matching_counts() {
        let merged = unary().merge(unary()).unwrap();
        assert_eq!(merged.expected_args, Some(1));
    }

    #[test]
    fn merge_narrows_unbounded_counts() {
        let open = ApplyDescriptor {
            expected_args: None,
            ..unary()
        };
        assert_eq!(open.clone().merge(unary()).unwrap().expected_args, Some(1));
        assert_eq!(unary().merge(open).unwrap().expected_args, Some(1));
    }

    #[test]
    fn merge_rejects_conflicting_counts() {
        let binary = ApplyDescriptor {
            expected_args: Some(2),
            ..unary()
        };
        assert_matches!(
            unary().merge(binary),
            Err(ParseError::IncompatibleFunction { .. })
        );
    }

    #[test]
    fn merge_rejects_conflicting_flags() {
        let manual = ApplyDescriptor {
            auto_apply: false,
            ..unary()
        };
        assert_matches!(
            unary().merge(manual),
            Err(ParseError::IncompatibleFunction { .. })
        );
    }

    #[test]
    fn state_adopts_merges_and_revokes() {
        let state = ApplyState::Untouched.observe(Some(unary())).unwrap();
        assert_matches!(state, ApplyState::Fn(_));
        let state = state.observe(Some(unary())).unwrap();
        assert!(state.descriptor().is_some());
        let state = state.observe(None).unwrap();
        assert_matches!(state, ApplyState::Revoked);
        // revocation is permanent
        let state = state.observe(Some(unary())).unwrap();
        assert_matches!(state, ApplyState::Revoked);
    }
}
