//! The typed tree produced by parsing
//!
//! [`Node`] is a closed set of owned variants:
//!
//! - [`Name`][Node::Name] / [`Num`][Node::Num] - leaf values
//! - [`BinaryOp`][Node::BinaryOp] - an infix operator with two or more children
//! - [`UnaryOp`][Node::UnaryOp] - a prefix or postfix operator
//! - [`Relation`][Node::Relation] / [`MultiRelation`][Node::MultiRelation] - one
//!   comparison, or a fused chain like `x < y <= z`
//! - [`Group`][Node::Group] - a surviving delimiter pair with its children
//! - [`FuncName`][Node::FuncName] / [`FuncApply`][Node::FuncApply] /
//!   [`FuncExp`][Node::FuncExp] - function references and applications
//!
//! Leaves never have children and every child is exclusively owned. Rendering
//! via [`Display`](std::fmt::Display) re-inserts parentheses wherever a
//! child's precedence requires them, so rendering and re-parsing is a
//! fixpoint even though the original text is not kept.
use crate::error::JsonError;
use crate::parser::Parser;
use serde_json::{json, Map, Value};
use std::fmt;

/// Operator associativity
///
/// For unary operators this doubles as placement: right-associative glyphs
/// render as prefixes, left-associative ones as postfixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    /// Groups to the left; equal-precedence neighbors reduce eagerly
    #[default]
    Left,
    /// Groups to the right; equal-precedence neighbors stay open
    Right,
}

impl Assoc {
    fn as_str(self) -> &'static str {
        match self {
            Assoc::Left => "left",
            Assoc::Right => "right",
        }
    }

    fn from_str(raw: &str) -> Result<Self, JsonError> {
        match raw {
            "left" => Ok(Assoc::Left),
            "right" => Ok(Assoc::Right),
            other => Err(JsonError::malformed(format!(
                "bad associativity {other:?}"
            ))),
        }
    }
}

/// Display and binding metadata carried by operator nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpMeta {
    /// The rendered glyph
    pub symbol: String,
    /// Binding strength; higher binds tighter
    pub precedence: u32,
    /// Tie-break direction at equal precedence
    pub assoc: Assoc,
    /// Whether repeats fold into one n-ary node
    pub combinable: bool,
}

impl OpMeta {
    /// Create operator metadata
    pub fn new(symbol: impl Into<String>, precedence: u32, assoc: Assoc, combinable: bool) -> Self {
        OpMeta {
            symbol: symbol.into(),
            precedence,
            assoc,
            combinable,
        }
    }
}

/// A parsed expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An identifier leaf
    Name(String),
    /// A numeric literal leaf, kept as its source text
    Num(String),
    /// An infix operator; combinable operators may hold more than two children
    BinaryOp {
        /// Operator metadata
        op: OpMeta,
        /// The operands in source order
        children: Vec<Node>,
    },
    /// A prefix or postfix operator
    UnaryOp {
        /// Operator metadata; associativity selects prefix vs postfix
        op: OpMeta,
        /// The single operand
        child: Box<Node>,
    },
    /// A single comparison like `x < y`
    Relation {
        /// The comparison glyph
        symbol: String,
        /// Binding strength of relations
        precedence: u32,
        /// Exactly two operands
        children: Vec<Node>,
    },
    /// A fused comparison chain like `x < y <= z`
    MultiRelation {
        /// One glyph per adjacent operand pair
        symbols: Vec<String>,
        /// Binding strength of relations
        precedence: u32,
        /// One more operand than symbols
        children: Vec<Node>,
    },
    /// A delimiter pair that survived elision
    Group {
        /// Opening glyph
        open: String,
        /// Closing glyph
        close: String,
        /// The grouped contents; comma lists arrive spliced
        children: Vec<Node>,
    },
    /// A bare function reference
    FuncName {
        /// The function's name
        name: String,
        /// The registered inverse function, if any
        inverse: Option<String>,
    },
    /// A named function applied to arguments
    FuncApply {
        /// The [`FuncName`][Node::FuncName] head
        name: Box<Node>,
        /// The arguments
        args: Vec<Node>,
        /// Whether the source carried explicit parentheses
        explicit: bool,
    },
    /// An arbitrary expression applied to arguments, e.g. `(f+g)(x)`
    FuncExp {
        /// The head expression
        head: Box<Node>,
        /// The arguments
        args: Vec<Node>,
        /// Precedence of application, used only to parenthesize the head
        apply_precedence: u32,
    },
}

impl Node {
    /// Create a name leaf
    pub fn name(value: impl Into<String>) -> Node {
        Node::Name(value.into())
    }

    /// Create a numeric leaf
    pub fn num(value: impl Into<String>) -> Node {
        Node::Num(value.into())
    }

    /// Create a function name leaf
    pub fn func_name(name: impl Into<String>, inverse: Option<&str>) -> Node {
        Node::FuncName {
            name: name.into(),
            inverse: inverse.map(str::to_owned),
        }
    }

    /// The kind tag used in JSON serialization
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Name(_) => "name",
            Node::Num(_) => "number",
            Node::BinaryOp { .. } => "binaryop",
            Node::UnaryOp { .. } => "unaryop",
            Node::Relation { .. } => "relation",
            Node::MultiRelation { .. } => "multirelation",
            Node::Group { .. } => "group",
            Node::FuncName { .. } => "funcname",
            Node::FuncApply { .. } => "funcapply",
            Node::FuncExp { .. } => "funcexp",
        }
    }

    /// The node's binding strength, if it has one
    ///
    /// Leaves, groups, and resolved applications have none and are never
    /// auto-parenthesized when rendered as operands.
    pub fn precedence(&self) -> Option<u32> {
        match self {
            Node::BinaryOp { op, .. } | Node::UnaryOp { op, .. } => Some(op.precedence),
            Node::Relation { precedence, .. } | Node::MultiRelation { precedence, .. } => {
                Some(*precedence)
            }
            _ => None,
        }
    }

    /// Whether this is a comma list
    pub fn is_list(&self) -> bool {
        matches!(self, Node::BinaryOp { op, .. } if op.symbol == ",")
    }

    /// Append a child to a tree variant, returning a reference to it
    ///
    /// Leaves and unary operators hold no child list and return `None`.
    pub fn append(&mut self, child: Node) -> Option<&mut Node> {
        let children = match self {
            Node::BinaryOp { children, .. }
            | Node::Relation { children, .. }
            | Node::MultiRelation { children, .. }
            | Node::Group { children, .. } => children,
            Node::FuncApply { args, .. } | Node::FuncExp { args, .. } => args,
            _ => return None,
        };
        children.push(child);
        children.last_mut()
    }

    /// Render with parentheses if the threshold requires them
    fn wrapped(&self, threshold: u32, include_equal: bool) -> String {
        match self.precedence() {
            Some(prec) if prec < threshold || (include_equal && prec == threshold) => {
                format!("({self})")
            }
            _ => self.to_string(),
        }
    }

    /// Serialize into a plain nested JSON record
    ///
    /// Every node carries its `kind`, its variant fields, and recursively
    /// serialized `childNodes`; embedded sub-nodes (application heads)
    /// serialize under `node`. Numeric leaves serialize their literal text so
    /// decoding and re-rendering is exact.
    pub fn to_json(&self) -> Value {
        match self {
            Node::Name(value) => json!({ "kind": "name", "value": value }),
            Node::Num(value) => json!({ "kind": "number", "value": value }),
            Node::BinaryOp { op, children } => json!({
                "kind": "binaryop",
                "op": op.symbol,
                "precedence": op.precedence,
                "associativity": op.assoc.as_str(),
                "combinable": op.combinable,
                "childNodes": children.iter().map(Node::to_json).collect::<Vec<_>>(),
            }),
            Node::UnaryOp { op, child } => json!({
                "kind": "unaryop",
                "op": op.symbol,
                "precedence": op.precedence,
                "associativity": op.assoc.as_str(),
                "childNodes": [child.to_json()],
            }),
            Node::Relation {
                symbol,
                precedence,
                children,
            } => json!({
                "kind": "relation",
                "symbol": symbol,
                "precedence": precedence,
                "childNodes": children.iter().map(Node::to_json).collect::<Vec<_>>(),
            }),
            Node::MultiRelation {
                symbols,
                precedence,
                children,
            } => json!({
                "kind": "multirelation",
                "symbols": symbols,
                "precedence": precedence,
                "childNodes": children.iter().map(Node::to_json).collect::<Vec<_>>(),
            }),
            Node::Group {
                open,
                close,
                children,
            } => json!({
                "kind": "group",
                "open": open,
                "close": close,
                "childNodes": children.iter().map(Node::to_json).collect::<Vec<_>>(),
            }),
            Node::FuncName { name, inverse } => json!({
                "kind": "funcname",
                "value": name,
                "inverse": inverse,
            }),
            Node::FuncApply {
                name,
                args,
                explicit,
            } => json!({
                "kind": "funcapply",
                "node": name.to_json(),
                "explicit": explicit,
                "childNodes": args.iter().map(Node::to_json).collect::<Vec<_>>(),
            }),
            Node::FuncExp {
                head,
                args,
                apply_precedence,
            } => json!({
                "kind": "funcexp",
                "node": head.to_json(),
                "applyPrecedence": apply_precedence,
                "childNodes": args.iter().map(Node::to_json).collect::<Vec<_>>(),
            }),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Name(value) | Node::Num(value) => f.write_str(value),
            Node::BinaryOp { op, children } => {
                let joiner = match op.symbol.as_str() {
                    "," => ", ".to_owned(),
                    // set-builder separators read better spaced
                    "|" => " | ".to_owned(),
                    glyph => glyph.to_owned(),
                };
                let rendered: Vec<_> = children
                    .iter()
                    .enumerate()
                    .map(|(i, child)| {
                        // equal precedence keeps its parens on the
                        // associativity-breaking side
                        let include_equal = if i == 0 {
                            op.assoc == Assoc::Right
                        } else {
                            op.assoc == Assoc::Left
                        };
                        child.wrapped(op.precedence, include_equal)
                    })
                    .collect();
                f.write_str(&rendered.join(&joiner))
            }
            Node::UnaryOp { op, child } => {
                let inner = child.wrapped(op.precedence, true);
                match op.assoc {
                    Assoc::Right => write!(f, "{}{inner}", op.symbol),
                    Assoc::Left => write!(f, "{inner}{}", op.symbol),
                }
            }
            Node::Relation {
                symbol,
                precedence,
                children,
            } => {
                let left = children[0].wrapped(*precedence, true);
                let right = children[1].wrapped(*precedence, true);
                write!(f, "{left} {symbol} {right}")
            }
            Node::MultiRelation {
                symbols,
                precedence,
                children,
            } => {
                write!(f, "{}", children[0].wrapped(*precedence, true))?;
                for (symbol, child) in symbols.iter().zip(&children[1..]) {
                    write!(f, " {symbol} {}", child.wrapped(*precedence, true))?;
                }
                Ok(())
            }
            Node::Group {
                open,
                close,
                children,
            } => {
                let inner: Vec<_> = children.iter().map(Node::to_string).collect();
                write!(f, "{open}{}{close}", inner.join(", "))
            }
            Node::FuncName { name, .. } => f.write_str(name),
            Node::FuncApply { name, args, .. } => {
                let rendered: Vec<_> = args.iter().map(Node::to_string).collect();
                write!(f, "{name}({})", rendered.join(", "))
            }
            Node::FuncExp {
                head,
                args,
                apply_precedence,
            } => {
                let rendered: Vec<_> = args.iter().map(Node::to_string).collect();
                write!(
                    f,
                    "{}({})",
                    head.wrapped(*apply_precedence, false),
                    rendered.join(", ")
                )
            }
        }
    }
}

/// A registered JSON decoder for one node kind
pub type NodeDecoder = fn(&Parser, &Map<String, Value>) -> Result<Node, JsonError>;

fn field<'m>(map: &'m Map<String, Value>, key: &str) -> Result<&'m Value, JsonError> {
    map.get(key)
        .ok_or_else(|| JsonError::malformed(format!("missing field {key:?}")))
}

fn str_field(map: &Map<String, Value>, key: &str) -> Result<String, JsonError> {
    match field(map, key)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(JsonError::malformed(format!(
            "field {key:?} should be a string, got {other}"
        ))),
    }
}

fn u32_field(map: &Map<String, Value>, key: &str) -> Result<u32, JsonError> {
    field(map, key)?
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| JsonError::malformed(format!("field {key:?} should be a small integer")))
}

fn bool_field(map: &Map<String, Value>, key: &str) -> Result<bool, JsonError> {
    field(map, key)?
        .as_bool()
        .ok_or_else(|| JsonError::malformed(format!("field {key:?} should be a boolean")))
}

/// Children decode before their parent is constructed
fn children_field(parser: &Parser, map: &Map<String, Value>) -> Result<Vec<Node>, JsonError> {
    match field(map, "childNodes")? {
        Value::Array(raw) => raw.iter().map(|v| parser.node_from_json(v)).collect(),
        other => Err(JsonError::malformed(format!(
            "childNodes should be an array, got {other}"
        ))),
    }
}

fn sub_node(parser: &Parser, map: &Map<String, Value>) -> Result<Node, JsonError> {
    parser.node_from_json(field(map, "node")?)
}

fn op_meta(map: &Map<String, Value>, combinable: bool) -> Result<OpMeta, JsonError> {
    Ok(OpMeta {
        symbol: str_field(map, "op")?,
        precedence: u32_field(map, "precedence")?,
        assoc: Assoc::from_str(&str_field(map, "associativity")?)?,
        combinable,
    })
}

fn decode_name(_: &Parser, map: &Map<String, Value>) -> Result<Node, JsonError> {
    Ok(Node::Name(str_field(map, "value")?))
}

fn decode_number(_: &Parser, map: &Map<String, Value>) -> Result<Node, JsonError> {
    // accept a JSON number for interoperability, but prefer the exact text
    match field(map, "value")? {
        Value::String(s) => Ok(Node::Num(s.clone())),
        Value::Number(n) => Ok(Node::Num(n.to_string())),
        other => Err(JsonError::malformed(format!(
            "number value should be a string or number, got {other}"
        ))),
    }
}

fn decode_binaryop(parser: &Parser, map: &Map<String, Value>) -> Result<Node, JsonError> {
    let combinable = bool_field(map, "combinable")?;
    let children = children_field(parser, map)?;
    if children.len() < 2 {
        return Err(JsonError::malformed("binaryop needs at least two children"));
    }
    Ok(Node::BinaryOp {
        op: op_meta(map, combinable)?,
        children,
    })
}

fn decode_unaryop(parser: &Parser, map: &Map<String, Value>) -> Result<Node, JsonError> {
    let mut children = children_field(parser, map)?;
    let (Some(child), None) = (children.pop(), children.pop()) else {
        return Err(JsonError::malformed("unaryop needs exactly one child"));
    };
    Ok(Node::UnaryOp {
        op: op_meta(map, false)?,
        child: Box::new(child),
    })
}

fn decode_relation(parser: &Parser, map: &Map<String, Value>) -> Result<Node, JsonError> {
    let children = children_field(parser, map)?;
    if children.len() != 2 {
        return Err(JsonError::malformed("relation needs exactly two children"));
    }
    Ok(Node::Relation {
        symbol: str_field(map, "symbol")?,
        precedence: u32_field(map, "precedence")?,
        children,
    })
}

fn decode_multirelation(parser: &Parser, map: &Map<String, Value>) -> Result<Node, JsonError> {
    let symbols = match field(map, "symbols")? {
        Value::Array(raw) => raw
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| JsonError::malformed("symbols should be strings"))
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(JsonError::malformed(format!(
                "symbols should be an array, got {other}"
            )))
        }
    };
    let children = children_field(parser, map)?;
    if children.len() != symbols.len() + 1 {
        return Err(JsonError::malformed(
            "multirelation needs one more child than symbols",
        ));
    }
    Ok(Node::MultiRelation {
        symbols,
        precedence: u32_field(map, "precedence")?,
        children,
    })
}

fn decode_group(parser: &Parser, map: &Map<String, Value>) -> Result<Node, JsonError> {
    Ok(Node::Group {
        open: str_field(map, "open")?,
        close: str_field(map, "close")?,
        children: children_field(parser, map)?,
    })
}

fn decode_funcname(_: &Parser, map: &Map<String, Value>) -> Result<Node, JsonError> {
    let inverse = match map.get("inverse") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            return Err(JsonError::malformed(format!(
                "inverse should be a string, got {other}"
            )))
        }
    };
    Ok(Node::FuncName {
        name: str_field(map, "value")?,
        inverse,
    })
}

fn decode_funcapply(parser: &Parser, map: &Map<String, Value>) -> Result<Node, JsonError> {
    let name = sub_node(parser, map)?;
    if !matches!(name, Node::FuncName { .. }) {
        return Err(JsonError::malformed("funcapply head must be a funcname"));
    }
    Ok(Node::FuncApply {
        name: Box::new(name),
        args: children_field(parser, map)?,
        explicit: bool_field(map, "explicit")?,
    })
}

fn decode_funcexp(parser: &Parser, map: &Map<String, Value>) -> Result<Node, JsonError> {
    Ok(Node::FuncExp {
        head: Box::new(sub_node(parser, map)?),
        args: children_field(parser, map)?,
        apply_precedence: u32_field(map, "applyPrecedence")?,
    })
}

/// The decoders for every built-in node kind
pub(crate) fn builtin_decoders() -> impl Iterator<Item = (&'static str, NodeDecoder)> {
    [
        ("name", decode_name as NodeDecoder),
        ("number", decode_number),
        ("binaryop", decode_binaryop),
        ("unaryop", decode_unaryop),
        ("relation", decode_relation),
        ("multirelation", decode_multirelation),
        ("group", decode_group),
        ("funcname", decode_funcname),
        ("funcapply", decode_funcapply),
        ("funcexp", decode_funcexp),
    ]
    .into_iter()
}

#[cfg(test)]
mod tests {
    use super::{Assoc, Node, OpMeta};

    fn plus(children: Vec<Node>) -> Node {
        Node::BinaryOp {
            op: OpMeta::new("+", 3, Assoc::Left, true),
            children,
        }
    }

    fn times(children: Vec<Node>) -> Node {
        Node::BinaryOp {
            op: OpMeta::new("*", 4, Assoc::Left, true),
            children,
        }
    }

    #[test]
    fn tighter_children_render_bare() {
        let tree = plus(vec![
            Node::num("3"),
            times(vec![Node::num("4"), Node::num("2")]),
        ]);
        assert_eq!(tree.to_string(), "3+4*2");
    }

    #[test]
    fn looser_children_render_wrapped() {
        let tree = times(vec![
            plus(vec![Node::num("3"), Node::num("4")]),
            Node::num("2"),
        ]);
        assert_eq!(tree.to_string(), "(3+4)*2");
    }

    #[test]
    fn equal_precedence_wraps_off_side() {
        let minus = |children| Node::BinaryOp {
            op: OpMeta::new("-", 3, Assoc::Left, false),
            children,
        };
        let tree = minus(vec![
            Node::name("a"),
            minus(vec![Node::name("b"), Node::name("c")]),
        ]);
        assert_eq!(tree.to_string(), "a-(b-c)");
    }

    #[test]
    fn right_assoc_wraps_first() {
        let pow = |children| Node::BinaryOp {
            op: OpMeta::new("^", 6, Assoc::Right, false),
            children,
        };
        let nested = pow(vec![Node::name("x"), Node::name("y")]);
        assert_eq!(
            pow(vec![nested.clone(), Node::name("z")]).to_string(),
            "(x^y)^z"
        );
        assert_eq!(
            pow(vec![Node::name("x"), nested]).to_string(),
            "x^x^y" // inner x^y as the exponent renders bare
        );
    }

    #[test]
    fn unary_wraps_equal_precedence() {
        let neg = |child| Node::UnaryOp {
            op: OpMeta::new("-", 5, Assoc::Right, false),
            child: Box::new(child),
        };
        assert_eq!(neg(neg(Node::name("x"))).to_string(), "-(-x)");
        assert_eq!(
            neg(plus(vec![Node::name("x"), Node::name("y")])).to_string(),
            "-(x+y)"
        );
    }

    #[test]
    fn relations_render_spaced() {
        let tree = Node::MultiRelation {
            symbols: vec!["<".into(), "<=".into()],
            precedence: 2,
            children: vec![Node::name("x"), Node::name("y"), Node::name("z")],
        };
        assert_eq!(tree.to_string(), "x < y <= z");
    }

    #[test]
    fn groups_render_comma_joined() {
        let tree = Node::Group {
            open: "<".into(),
            close: ">".into(),
            children: vec![Node::name("x"), Node::name("y")],
        };
        assert_eq!(tree.to_string(), "<x, y>");
    }

    #[test]
    fn applications_always_parenthesize() {
        let tree = Node::FuncApply {
            name: Box::new(Node::func_name("sin", Some("arcsin"))),
            args: vec![Node::name("x")],
            explicit: false,
        };
        assert_eq!(tree.to_string(), "sin(x)");
    }

    #[test]
    fn func_exp_wraps_loose_heads() {
        let tree = Node::FuncExp {
            head: Box::new(plus(vec![Node::name("f"), Node::name("g")])),
            args: vec![Node::name("x")],
            apply_precedence: 8,
        };
        assert_eq!(tree.to_string(), "(f+g)(x)");
    }

    #[test]
    fn append_returns_the_child() {
        let mut tree = plus(vec![Node::num("1"), Node::num("2")]);
        let child = tree.append(Node::num("3")).expect("tree variant");
        assert_eq!(child, &Node::num("3"));
        assert_eq!(tree.to_string(), "1+2+3");
        assert_eq!(Node::num("7").append(Node::num("8")), None);
    }
}
