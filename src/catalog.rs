//! The default token catalog
//!
//! A usable grammar out of the box: decimal numbers, single-letter and greek
//! names, arithmetic with a both-shape minus and postfix factorial, chainable
//! relations, parenthesis/bracket/brace fences, the ambiguous angle and bar
//! tokens, and the common unary functions with their inverse pairs. All of it
//! is plain registration data; callers can drop, disable, or reconfigure any
//! entry on their own [`Parser`].
use crate::apply::ApplyDescriptor;
use crate::ops::OpShape;
use crate::parser::{Parser, TokenConfig, TokenDef};
use crate::stack::Item;
use crate::tree::Assoc;
use lazy_static::lazy_static;

const COMMA: u32 = 0;
const SEPARATOR: u32 = 1;
const RELATION: u32 = 2;
const ADDITIVE: u32 = 3;
const MULTIPLICATIVE: u32 = 4;
const UNARY: u32 = 5;
const POWER: u32 = 6;
const POSTFIX: u32 = 7;
const APPLY: u32 = 8;

const GREEK: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "pi", "rho", "sigma", "tau", "phi", "chi", "psi", "omega",
];

fn operator(precedence: u32, combinable: bool) -> TokenConfig {
    TokenConfig {
        precedence,
        combinable,
        ..TokenConfig::default()
    }
}

fn relation(fusable: bool) -> TokenConfig {
    TokenConfig {
        precedence: RELATION,
        fusable,
        ..TokenConfig::default()
    }
}

fn unary_function(inverse: Option<&str>) -> TokenConfig {
    TokenConfig {
        descriptor: Some(ApplyDescriptor {
            expected_args: Some(1),
            explicit_required: false,
            auto_apply: true,
        }),
        inverse: inverse.map(str::to_owned),
        ..TokenConfig::default()
    }
}

fn function_def(name: &str, inverse: Option<&str>) -> TokenDef {
    TokenDef::new(name, 10, Item::function)
        .with_literals([name])
        .with_config(unary_function(inverse))
}

fn build_defaults() -> Vec<TokenDef> {
    vec![
        // functions, inverse pairs in both directions
        function_def("sin", Some("arcsin")),
        function_def("cos", Some("arccos")),
        function_def("tan", Some("arctan")),
        function_def("arcsin", Some("sin")),
        function_def("arccos", Some("cos")),
        function_def("arctan", Some("tan")),
        function_def("ln", Some("exp")),
        function_def("exp", Some("ln")),
        function_def("log", None),
        function_def("f", None),
        function_def("g", None),
        // greek letters read as plain names
        TokenDef::new("greek", 20, Item::name).with_literals(GREEK.iter().copied()),
        // arithmetic
        TokenDef::new("plus", 30, Item::operator)
            .with_literals(["+"])
            .with_config(operator(ADDITIVE, true)),
        TokenDef::new("minus", 30, Item::operator)
            .with_literals(["-"])
            .with_config(TokenConfig {
                precedence: ADDITIVE,
                unary_precedence: UNARY,
                shape: OpShape::Both,
                ..TokenConfig::default()
            }),
        TokenDef::new("times", 30, Item::operator)
            .with_literals(["*"])
            .with_config(operator(MULTIPLICATIVE, true)),
        TokenDef::new("divide", 30, Item::operator)
            .with_literals(["/"])
            .with_config(operator(MULTIPLICATIVE, false)),
        TokenDef::new("power", 30, Item::operator)
            .with_literals(["^"])
            .with_config(TokenConfig {
                precedence: POWER,
                assoc: Assoc::Right,
                power_inverse: true,
                ..TokenConfig::default()
            }),
        TokenDef::new("factorial", 30, Item::operator)
            .with_literals(["!"])
            .with_config(TokenConfig {
                precedence: POSTFIX,
                shape: OpShape::Postfix,
                ..TokenConfig::default()
            }),
        TokenDef::new("comma", 30, Item::operator)
            .with_literals([","])
            .with_config(operator(COMMA, true)),
        // relations; `!=` does not chain
        TokenDef::new("equals", 30, Item::relation)
            .with_literals(["="])
            .with_config(relation(true)),
        TokenDef::new("not-equals", 30, Item::relation)
            .with_literals(["!="])
            .with_config(relation(false)),
        TokenDef::new("compare", 30, Item::relation)
            .with_literals(["<=", ">="])
            .with_config(relation(true)),
        // ambiguous tokens
        TokenDef::new("angle-open", 30, Item::angle_open)
            .with_literals(["<"])
            .with_config(TokenConfig {
                precedence: RELATION,
                fusable: true,
                closers: vec![">".to_owned()],
                splice: true,
                ..TokenConfig::default()
            }),
        TokenDef::new("angle-close", 30, Item::angle_close)
            .with_literals([">"])
            .with_config(relation(true)),
        TokenDef::new("bar", 30, Item::bar)
            .with_literals(["|"])
            .with_config(TokenConfig {
                precedence: SEPARATOR,
                closers: vec!["|".to_owned()],
                ..TokenConfig::default()
            }),
        // fences
        TokenDef::new("paren-open", 30, Item::open)
            .with_literals(["("])
            .with_config(TokenConfig {
                closers: vec![")".to_owned()],
                elide: true,
                splice: true,
                argument_group: true,
                ..TokenConfig::default()
            }),
        TokenDef::new("paren-close", 30, Item::close).with_literals([")"]),
        TokenDef::new("bracket-open", 30, Item::open)
            .with_literals(["["])
            .with_config(TokenConfig {
                closers: vec!["]".to_owned()],
                allow_empty: true,
                splice: true,
                ..TokenConfig::default()
            }),
        TokenDef::new("bracket-close", 30, Item::close).with_literals(["]"]),
        TokenDef::new("brace-open", 30, Item::open)
            .with_literals(["{"])
            .with_config(TokenConfig {
                closers: vec!["}".to_owned()],
                allow_empty: true,
                splice: true,
                ..TokenConfig::default()
            }),
        TokenDef::new("brace-close", 30, Item::close).with_literals(["}"]),
        // literals
        TokenDef::new("number", 50, Item::number).with_pattern(r"\d+\.?\d*|\.\d+"),
        TokenDef::new("name", 60, Item::name).with_pattern("[A-Za-z]"),
    ]
}

lazy_static! {
    static ref DEFAULT_DEFS: Vec<TokenDef> = build_defaults();
}

/// A parser loaded with the default catalog
pub fn default_grammar() -> Parser {
    let mut parser = Parser::new();
    for def in DEFAULT_DEFS.iter() {
        parser.register(def.clone());
    }
    parser.set_implicit_multiplication(Some("times"));
    parser.set_apply_precedences(UNARY, APPLY);
    parser
}

#[cfg(test)]
mod tests {
    use super::default_grammar;

    fn rendered(input: &str) -> String {
        default_grammar().parse(input).unwrap().to_string()
    }

    #[test]
    fn arithmetic_shapes() {
        assert_eq!(rendered("3+4*2"), "3+4*2");
        assert_eq!(rendered("(3+4)*2"), "(3+4)*2");
        assert_eq!(rendered("2^3^2"), "2^3^2");
        assert_eq!(rendered("-x^2"), "-x^2");
    }

    #[test]
    fn implicit_multiplication() {
        assert_eq!(rendered("2x"), "2*x");
        assert_eq!(rendered("2 pi r"), "2*pi*r");
    }

    #[test]
    fn functions_apply_implicitly() {
        assert_eq!(rendered("sin x"), "sin(x)");
        assert_eq!(rendered("sin x + 1"), "sin(x)+1");
    }

    #[test]
    fn maximal_munch_keeps_factorial_and_inequality_apart() {
        assert_eq!(rendered("x! = y"), "x! = y");
        assert_eq!(rendered("x != y"), "x != y");
    }
}
