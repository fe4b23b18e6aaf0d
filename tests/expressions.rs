//! End-to-end coverage of the default grammar: parsing, rendering, JSON
//! round-tripping, and the error surface.
use assert_matches::assert_matches;
use mathexpr_parser::{
    default_grammar, parse, ApplyDescriptor, DelimiterIssue, Item, Node, ParseError, TokenConfig,
    TokenDef,
};

fn rendered(input: &str) -> String {
    parse(input).unwrap().to_string()
}

#[test]
fn precedence_and_associativity() {
    assert_eq!(rendered("3+4*2"), "3+4*2");
    assert_eq!(rendered("(3+4)*2"), "(3+4)*2");
    assert_eq!(rendered("a-(b-c)"), "a-(b-c)");
    assert_eq!(rendered("1-2+3"), "1-2+3");
    assert_eq!(rendered("2^3^2"), "2^3^2");
    assert_eq!(rendered("(2^3)^2"), "(2^3)^2");
    assert_eq!(rendered("-x^2"), "-x^2");
    assert_eq!(rendered("-(-x)"), "-(-x)");
    assert_eq!(rendered("x!"), "x!");
}

#[test]
fn combinable_operators_fuse() {
    let tree = parse("1+2+3").unwrap();
    assert_matches!(&tree, Node::BinaryOp { op, children }
        if op.symbol == "+" && children.len() == 3);
    // division never fuses
    let tree = parse("8/4/2").unwrap();
    assert_matches!(&tree, Node::BinaryOp { op, children }
        if op.symbol == "/" && children.len() == 2);
}

#[test]
fn implicit_multiplication() {
    assert_eq!(rendered("2x"), "2*x");
    assert_eq!(rendered("2 pi r"), "2*pi*r");
    assert_eq!(rendered("x(y+1)"), "x*(y+1)");
    assert_eq!(rendered("(a+b)(a-b)"), "(a+b)*(a-b)");
}

#[test]
fn relations_chain_when_compatible() {
    assert_matches!(parse("x < y <= z").unwrap(), Node::MultiRelation { .. });
    assert_eq!(rendered("x < y <= z"), "x < y <= z");
    assert_eq!(rendered("a = b = c"), "a = b = c");
    // opposite directions refuse to chain and nest left instead
    assert_eq!(rendered("a < b > c"), "(a < b) > c");
    // `!=` never chains
    assert_eq!(rendered("x != y != z"), "(x != y) != z");
}

#[test]
fn factorial_and_inequality_stay_apart() {
    assert_eq!(rendered("x! = y"), "x! = y");
    assert_eq!(rendered("x != y"), "x != y");
}

#[test]
fn angle_brackets_resolve_by_context() {
    assert_matches!(parse("x < y").unwrap(), Node::Relation { .. });
    assert_matches!(parse("<x, y>").unwrap(), Node::Group { .. });
    assert_eq!(rendered("<x, y>"), "<x, y>");
    assert_eq!(rendered("<x>"), "<x>");
    assert_eq!(rendered("<-x, y>"), "<-x, y>");
    assert_eq!(rendered("<1, 2> + <3, 4>"), "<1, 2>+<3, 4>");
    assert_eq!(rendered("x < <y, z>"), "x < <y, z>");
    // nesting commits the outer bracket as a delimiter
    assert_eq!(rendered("<<a, b>, c>"), "<<a, b>, c>");
}

#[test]
fn bars_resolve_by_context() {
    assert_matches!(parse("|x|").unwrap(), Node::Group { .. });
    assert_eq!(rendered("|x|"), "|x|");
    assert_eq!(rendered("|x + y|"), "|x+y|");
    assert_eq!(rendered("{x | x > 0}"), "{x | x > 0}");
    assert_eq!(rendered("{x | x > 0}"), rendered(&rendered("{x | x > 0}")));
}

#[test]
fn groups_and_elision() {
    // parentheses around a single child disappear from the tree
    assert_matches!(parse("(x)").unwrap(), Node::Name(name) if name == "x");
    // brackets and braces survive
    assert_matches!(parse("[x]").unwrap(), Node::Group { .. });
    assert_eq!(rendered("[x, y]"), "[x, y]");
    assert_eq!(rendered("[]"), "[]");
    assert_eq!(rendered("{}"), "{}");
}

#[test]
fn functions_apply_implicitly_and_explicitly() {
    assert_eq!(rendered("sin x"), "sin(x)");
    assert_eq!(rendered("sin(x)"), "sin(x)");
    assert_eq!(rendered("sin x + 1"), "sin(x)+1");
    assert_eq!(rendered("sin -x^2"), "sin(-x^2)");
    assert_eq!(rendered("x sin y"), "x*sin(y)");
    assert_matches!(parse("f(x)").unwrap(), Node::FuncApply { explicit: true, .. });
    assert_matches!(parse("sin x").unwrap(), Node::FuncApply { explicit: false, .. });
}

#[test]
fn argument_lists_respect_elision() {
    // a parenthesized tuple is one argument, a bare list is two
    assert_matches!(parse("sin((x, y))").unwrap(), Node::FuncApply { args, .. }
        if args.len() == 1);
    assert_matches!(
        parse("sin(x, y)"),
        Err(ParseError::Arity { expected: 1, found: 2, .. })
    );
}

#[test]
fn power_inverse_rewrites() {
    assert_eq!(rendered("sin^-1 x"), "arcsin(x)");
    assert_eq!(rendered("sin^(-1)(x)"), "arcsin(x)");
    assert_eq!(rendered("ln^-1 x"), "exp(x)");
    // any other exponent is an ordinary power of the bare function
    assert_eq!(rendered("sin^2 x"), "sin^2*x");
    // no function head, no rewrite
    assert_eq!(rendered("x^-1"), "x^-1");
}

#[test]
fn expression_heads_apply() {
    assert_matches!(parse("(f+g)(x)").unwrap(), Node::FuncExp { .. });
    assert_eq!(rendered("(f+g)(x)"), "(f+g)(x)");
}

#[test]
fn mixing_a_function_with_a_value_revokes() {
    // the sum is no longer applicable, so the operand multiplies instead
    assert_eq!(rendered("(f+2)(x)"), "(f+2)*x");
}

#[test]
fn incompatible_descriptors_refuse_to_merge() {
    let mut parser = default_grammar();
    parser.register(
        TokenDef::new("h", 10, Item::function)
            .with_literals(["h"])
            .with_config(TokenConfig {
                descriptor: Some(ApplyDescriptor {
                    expected_args: Some(2),
                    explicit_required: false,
                    auto_apply: true,
                }),
                ..TokenConfig::default()
            }),
    );
    assert_matches!(
        parser.parse("(f+h)(x, y)"),
        Err(ParseError::IncompatibleFunction { .. })
    );
}

#[test]
fn delimiter_errors() {
    assert_matches!(
        parse("(x]"),
        Err(ParseError::DelimiterMismatch(DelimiterIssue::MismatchedPair { open, close }))
            if open == "(" && close == "]"
    );
    assert_matches!(
        parse("(x, y"),
        Err(ParseError::DelimiterMismatch(DelimiterIssue::UnclosedOpen(open))) if open == "("
    );
    assert_matches!(
        parse("3)"),
        Err(ParseError::DelimiterMismatch(DelimiterIssue::ExtraClose(close))) if close == ")"
    );
    assert_matches!(parse("sin()"), Err(ParseError::EmptyGroup { open }) if open == "(");
    assert_matches!(parse("()"), Err(ParseError::EmptyGroup { .. }));
}

#[test]
fn missing_operands() {
    assert_matches!(parse(""), Err(ParseError::MissingOperand { .. }));
    assert_matches!(parse("3 +"), Err(ParseError::MissingOperand { .. }));
    assert_matches!(parse("* 3"), Err(ParseError::MissingOperand { .. }));
    // an armed angle bracket with buffered content has no relational reading
    assert_matches!(parse("<x, y"), Err(ParseError::MissingOperand { .. }));
}

#[test]
fn lexical_errors_report_offsets() {
    assert_matches!(
        parse("1 @ 2"),
        Err(ParseError::Lexical { found, offset: 2 }) if found == "@"
    );
}

#[test]
fn rendering_is_a_fixpoint() {
    for input in [
        "3+4*2",
        "(3+4)*2",
        "2^3^2",
        "-x^2",
        "sin -x^2 + 1",
        "x < y <= z",
        "<x, y>",
        "|x+y|",
        "{x | x > 0}",
        "(f+g)(x)",
        "arcsin(x)",
        "x!+y!",
    ] {
        // implicit applications re-render with explicit parentheses, so the
        // fixpoint is on the rendered text, not the tree
        let text = parse(input).unwrap().to_string();
        assert_eq!(
            parse(&text).unwrap().to_string(),
            text,
            "rendering {input:?} drifted"
        );
    }
}

#[test]
fn json_round_trips_every_variant() {
    let mut parser = default_grammar();
    for input in [
        "x",
        "3.14",
        "1+2+3",
        "-x",
        "x!",
        "x < y",
        "x < y <= z",
        "<x, y>",
        "sin x",
        "f(x)",
        "(f+g)(x)",
        "sin + x", // keeps a bare funcname leaf in the tree
    ] {
        let tree = parser.parse(input).unwrap();
        let json = tree.to_json();
        let decoded = parser.node_from_json(&json).unwrap();
        assert_eq!(decoded, tree, "json for {input:?} drifted");
    }
}

#[test]
fn numeric_text_survives_json() {
    let mut parser = default_grammar();
    let tree = parser.parse("1.50").unwrap();
    let json = tree.to_json();
    assert_eq!(json["value"], "1.50");
    assert_eq!(parser.node_from_json(&json).unwrap().to_string(), "1.50");
}
