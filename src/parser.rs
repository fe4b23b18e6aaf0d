//! The parser facade and its registries
//!
//! A [`Parser`] owns two registries: token definitions, which control how
//! text becomes stack items, and node kinds, which control how JSON becomes
//! tree nodes. Both are open for extension between parses. The combined
//! matcher is compiled lazily on the next parse after any registry change and
//! stays frozen while a parse runs.
use crate::error::{JsonError, ParseError};
use crate::matcher::CompiledMatcher;
use crate::stack::{Item, Stack, StackConfig};
use crate::tree::{self, Node, NodeDecoder};
use serde_json::Value;
use std::collections::HashMap;

/// A token definition's constructor entry
///
/// Maps a matched lexeme to a stack item. The [`Item`] constructors
/// ([`Item::number`], [`Item::operator`], ...) all have this signature, so a
/// definition usually names one of them; custom grammars may substitute their
/// own function.
pub type BuildFn = fn(&TokenDef, &str) -> Item;

/// Behavior knobs shared by every token class
///
/// Each constructor entry reads the fields relevant to it and ignores the
/// rest, so one config type serves operators, relations, delimiters, and
/// functions alike.
#[derive(Debug, Clone, Default)]
pub struct TokenConfig {
    /// Binding strength for operators and relations
    pub precedence: u32,
    /// Binding strength when a both-shape operator acts as a prefix
    pub unary_precedence: u32,
    /// Tie-break direction at equal precedence
    pub assoc: crate::tree::Assoc,
    /// Where the operator takes its operands
    pub shape: crate::ops::OpShape,
    /// Whether repeats fold into one n-ary node
    pub combinable: bool,
    /// Whether this operator can start the literal `-1` inverse rewrite
    pub power_inverse: bool,
    /// Whether this relation chains into multi-relations
    pub fusable: bool,
    /// Closing glyphs accepted by this opening delimiter
    pub closers: Vec<String>,
    /// Whether the delimiter pair may enclose nothing
    pub allow_empty: bool,
    /// Whether a fence around a single child disappears
    pub elide: bool,
    /// Whether a directly enclosed comma list spreads into the group
    pub splice: bool,
    /// Whether this opener carries arguments to a pending application
    pub argument_group: bool,
    /// Function capability attached to the operand
    pub descriptor: Option<crate::apply::ApplyDescriptor>,
    /// Name of the registered inverse function
    pub inverse: Option<String>,
}

/// One registered token
#[derive(Debug, Clone)]
pub struct TokenDef {
    /// Registry key, also reported in pattern errors
    pub id: String,
    /// Exact lexemes; longest match wins within a priority
    pub literals: Vec<String>,
    /// Regex alternative, matched after literals of the same priority
    pub pattern: Option<String>,
    /// Lower numbers match first
    pub priority: u32,
    /// Disabled definitions are skipped at compile time
    pub enabled: bool,
    /// Constructor entry turning a lexeme into a stack item
    pub build: BuildFn,
    /// Behavior configuration read by the constructor entry
    pub config: TokenConfig,
}

impl TokenDef {
    /// A new enabled definition with default configuration
    pub fn new(id: impl Into<String>, priority: u32, build: BuildFn) -> Self {
        TokenDef {
            id: id.into(),
            literals: Vec::new(),
            pattern: None,
            priority,
            enabled: true,
            build,
            config: TokenConfig::default(),
        }
    }

    /// Add exact lexemes
    pub fn with_literals<I, S>(mut self, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.literals.extend(literals.into_iter().map(Into::into));
        self
    }

    /// Set the regex pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the behavior configuration
    pub fn with_config(mut self, config: TokenConfig) -> Self {
        self.config = config;
        self
    }
}

/// An extensible expression parser
pub struct Parser {
    /// Registration order; ties within a priority resolve by position here
    defs: Vec<TokenDef>,
    decoders: HashMap<String, NodeDecoder>,
    matcher: Option<CompiledMatcher>,
    implicit_mult: Option<String>,
    implicit_apply_precedence: u32,
    apply_precedence: u32,
}

impl Parser {
    /// An empty grammar that still decodes the built-in node kinds
    pub fn new() -> Self {
        Parser {
            defs: Vec::new(),
            decoders: tree::builtin_decoders().map(|(k, d)| (k.to_owned(), d)).collect(),
            matcher: None,
            implicit_mult: None,
            implicit_apply_precedence: 0,
            apply_precedence: 0,
        }
    }

    /// Register a token definition
    ///
    /// A repeated id replaces the previous definition in place, keeping its
    /// registration position.
    pub fn register(&mut self, def: TokenDef) {
        self.matcher = None;
        match self.defs.iter_mut().find(|have| have.id == def.id) {
            Some(slot) => *slot = def,
            None => self.defs.push(def),
        }
    }

    /// Remove a definition
    pub fn unregister(&mut self, id: &str) -> Option<TokenDef> {
        self.matcher = None;
        let index = self.defs.iter().position(|def| def.id == id)?;
        Some(self.defs.remove(index))
    }

    /// Toggle a definition without removing it; false when the id is unknown
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.defs.iter_mut().find(|def| def.id == id) {
            Some(def) => {
                self.matcher = None;
                def.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Look up a definition
    pub fn token(&self, id: &str) -> Option<&TokenDef> {
        self.defs.iter().find(|def| def.id == id)
    }

    /// Look up a definition for reconfiguration
    pub fn token_mut(&mut self, id: &str) -> Option<&mut TokenDef> {
        self.matcher = None;
        self.defs.iter_mut().find(|def| def.id == id)
    }

    /// Name the operator definition inserted between adjacent operands
    pub fn set_implicit_multiplication(&mut self, id: Option<&str>) {
        self.implicit_mult = id.map(str::to_owned);
    }

    /// Set the implicit-application and application-rendering precedences
    pub fn set_apply_precedences(&mut self, implicit: u32, render: u32) {
        self.implicit_apply_precedence = implicit;
        self.apply_precedence = render;
    }

    /// Register a JSON decoder for a node kind
    pub fn register_node_kind(&mut self, kind: impl Into<String>, decoder: NodeDecoder) {
        self.decoders.insert(kind.into(), decoder);
    }

    fn ensure_compiled(&mut self) -> Result<(), ParseError> {
        if self.matcher.is_none() {
            let compiled =
                CompiledMatcher::compile(self.defs.iter().filter(|def| def.enabled))?;
            self.matcher = Some(compiled);
        }
        Ok(())
    }

    /// Parse one expression into a tree
    pub fn parse(&mut self, input: &str) -> Result<Node, ParseError> {
        self.ensure_compiled()?;
        let matcher = match &self.matcher {
            Some(matcher) => matcher,
            None => unreachable!("compiled above"),
        };
        let implicit_mult = self.implicit_mult.as_ref().and_then(|id| {
            let def = self.token(id).filter(|def| def.enabled)?;
            let text = def
                .literals
                .first()
                .cloned()
                .unwrap_or_else(|| def.id.clone());
            match (def.build)(def, &text) {
                Item::Operator(op) => Some(op),
                _ => None,
            }
        });
        let mut stack = Stack::new(StackConfig {
            implicit_mult,
            implicit_apply_precedence: self.implicit_apply_precedence,
            apply_precedence: self.apply_precedence,
        });
        stack.drive(Item::Start)?;
        for scanned in matcher.scan(input) {
            let scanned = scanned?;
            let def = match self.token(scanned.id) {
                Some(def) => def,
                None => unreachable!("matcher ids come from the registry"),
            };
            stack.drive((def.build)(def, scanned.text))?;
        }
        stack.drive(Item::End)?;
        stack.into_result()
    }

    /// Decode a tree from its JSON form
    ///
    /// Dispatches on each record's `kind` through the node registry, so
    /// extension kinds registered with [`register_node_kind`] decode the same
    /// way as built-ins.
    ///
    /// [`register_node_kind`]: Parser::register_node_kind
    pub fn node_from_json(&self, value: &Value) -> Result<Node, JsonError> {
        let map = value.as_object().ok_or_else(|| {
            JsonError::malformed(format!("expected a node object, got {value}"))
        })?;
        let kind = map
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonError::malformed("missing kind"))?;
        let decoder = self
            .decoders
            .get(kind)
            .ok_or_else(|| JsonError::UnknownKind {
                kind: kind.to_owned(),
            })?;
        decoder(self, map)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Parser, TokenConfig, TokenDef};
    use crate::error::ParseError;
    use crate::stack::Item;
    use crate::tree::{Assoc, Node};
    use assert_matches::assert_matches;

    fn tiny_grammar() -> Parser {
        let mut parser = Parser::new();
        parser.register(
            TokenDef::new("number", 50, Item::number).with_pattern(r"\d+"),
        );
        parser.register(
            TokenDef::new("plus", 30, Item::operator)
                .with_literals(["+"])
                .with_config(TokenConfig {
                    precedence: 3,
                    assoc: Assoc::Left,
                    combinable: true,
                    ..TokenConfig::default()
                }),
        );
        parser
    }

    #[test]
    fn registered_tokens_parse() {
        let mut parser = tiny_grammar();
        assert_eq!(parser.parse("1+2+3").unwrap().to_string(), "1+2+3");
    }

    #[test]
    fn lone_operand_survives_the_final_unwind() {
        let mut parser = tiny_grammar();
        assert_eq!(parser.parse("7").unwrap(), Node::Num("7".into()));
    }

    #[test]
    fn same_priority_patterns_match_in_registration_order() {
        // both patterns match the same text; the first registered must win,
        // on every construction
        for _ in 0..32 {
            let mut parser = Parser::new();
            parser.register(TokenDef::new("word", 40, Item::name).with_pattern("a"));
            parser.register(TokenDef::new("digit", 40, Item::number).with_pattern("a"));
            assert_matches!(parser.parse("a").unwrap(), Node::Name(_));
        }
    }

    #[test]
    fn disabled_tokens_stop_matching() {
        let mut parser = tiny_grammar();
        assert!(parser.set_enabled("plus", false));
        assert_matches!(
            parser.parse("1+2"),
            Err(ParseError::Lexical { found, offset: 1 }) if found == "+"
        );
        assert!(parser.set_enabled("plus", true));
        assert!(parser.parse("1+2").is_ok());
    }

    #[test]
    fn unregistered_tokens_stop_matching() {
        let mut parser = tiny_grammar();
        assert!(parser.unregister("plus").is_some());
        assert_matches!(parser.parse("1+2"), Err(ParseError::Lexical { .. }));
    }

    #[test]
    fn reconfigured_precedence_takes_effect() {
        let mut parser = tiny_grammar();
        parser.register(
            TokenDef::new("times", 30, Item::operator)
                .with_literals(["*"])
                .with_config(TokenConfig {
                    precedence: 4,
                    combinable: true,
                    ..TokenConfig::default()
                }),
        );
        let tree = parser.parse("1+2*3").unwrap();
        assert_matches!(&tree, Node::BinaryOp { op, .. } if op.symbol == "+");
        // flip multiplication below addition
        if let Some(def) = parser.token_mut("times") {
            def.config.precedence = 2;
        }
        let tree = parser.parse("1+2*3").unwrap();
        assert_matches!(&tree, Node::BinaryOp { op, .. } if op.symbol == "*");
    }

    #[test]
    fn unknown_json_kind_is_rejected() {
        let parser = Parser::new();
        let err = parser
            .node_from_json(&serde_json::json!({ "kind": "matrix" }))
            .unwrap_err();
        assert_matches!(err, crate::error::JsonError::UnknownKind { kind } if kind == "matrix");
    }
}
