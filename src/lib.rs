//! A customizable single-pass math expression parser
//!
//! This crate turns flat expression strings into typed trees ([`Node`]),
//! resolving operator precedence and associativity, implicit multiplication,
//! function application, delimiter matching, and locally ambiguous tokens
//! (`<` as inequality or vector bracket, `|` as absolute value or set-builder
//! separator) in one left-to-right pass with no backtracking. Trees render
//! back to strings with minimal parentheses and round-trip through JSON.
//! Structurally invalid input always fails atomically with a [`ParseError`];
//! there are no partial results.
//!
//! # Usage
//!
//! The default grammar covers everyday math notation:
//!
//! ```
//! use mathexpr_parser::parse;
//!
//! let tree = parse("sin -x^2 + 1")?;
//! assert_eq!(tree.to_string(), "sin(-x^2)+1");
//!
//! let vector = parse("<x, y>")?;
//! assert_eq!(vector.to_string(), "<x, y>");
//! # Ok::<(), mathexpr_parser::ParseError>(())
//! ```
//!
//! Trees serialize to plain JSON records and decode back through the same
//! parser, so consumers in other processes can reconstruct them:
//!
//! ```
//! use mathexpr_parser::default_grammar;
//!
//! let mut parser = default_grammar();
//! let tree = parser.parse("(3+4)*2")?;
//! let json = tree.to_json();
//! assert_eq!(parser.node_from_json(&json)?, tree);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Customization
//!
//! Grammar rules live in token definitions, not in the engine. A definition
//! pairs lexemes (or a regex) with a constructor entry that builds a stack
//! item, plus a configuration bag the constructor reads. Registering,
//! disabling, or reconfiguring definitions between parses changes the
//! accepted language:
//!
//! ```
//! use mathexpr_parser::{default_grammar, Item, TokenConfig, TokenDef};
//!
//! let mut parser = default_grammar();
//! parser.register(
//!     TokenDef::new("modulo", 30, Item::operator)
//!         .with_literals(["%"])
//!         .with_config(TokenConfig {
//!             precedence: 4,
//!             ..TokenConfig::default()
//!         }),
//! );
//! assert_eq!(parser.parse("7%2+1")?.to_string(), "7%2+1");
//! # Ok::<(), mathexpr_parser::ParseError>(())
//! ```
//!
//! JSON decoding is extensible the same way: register a [`NodeDecoder`] for
//! a new `kind` with [`Parser::register_node_kind`].
//!
//! # Design
//!
//! The engine is a shift/reduce automaton whose rules live inside the stack
//! items themselves. Each arriving token is offered to the stack top, which
//! may consume it and schedule a replacement set, or pass and let the token
//! place itself; all precedence comparisons, delimiter matching, and
//! lookahead decisions happen inside these handlers, driven by an explicit
//! work list so nesting depth never grows the call stack. Ambiguous tokens
//! buffer what follows them and replay it once context disambiguates.
mod apply;
mod catalog;
mod delim;
mod error;
mod lookahead;
mod matcher;
mod ops;
mod parser;
mod stack;
mod tree;

pub use apply::ApplyDescriptor;
pub use catalog::default_grammar;
pub use error::{DelimiterIssue, JsonError, ParseError};
pub use ops::OpShape;
pub use parser::{BuildFn, Parser, TokenConfig, TokenDef};
pub use stack::Item;
pub use tree::{Assoc, Node, NodeDecoder, OpMeta};

/// Parse one expression with the default grammar
pub fn parse(input: &str) -> Result<Node, ParseError> {
    default_grammar().parse(input)
}
