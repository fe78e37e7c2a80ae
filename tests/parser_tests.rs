use sindi::{parse, parse_str, tokenize, Ast, BinOp, Parser};

fn id(name: &str) -> Ast {
    Ast::ident(name)
}

fn num(text: &str) -> Ast {
    Ast::num(text)
}

fn bin(op: BinOp, lhs: Ast, rhs: Ast) -> Ast {
    Ast::binary(op, lhs, rhs)
}

#[test]
fn mul_binds_tighter_than_add() {
    assert_eq!(
        parse_str("a + b * c").unwrap(),
        bin(BinOp::Add, id("a"), bin(BinOp::Mul, id("b"), id("c")))
    );
}

#[test]
fn parentheses_override() {
    assert_eq!(
        parse_str("(a + b) * c").unwrap(),
        bin(BinOp::Mul, bin(BinOp::Add, id("a"), id("b")), id("c"))
    );
}

#[test]
fn subtraction_is_left_associative() {
    assert_eq!(
        parse_str("a - b - c").unwrap(),
        bin(BinOp::Sub, bin(BinOp::Sub, id("a"), id("b")), id("c"))
    );
}

#[test]
fn power_is_right_associative() {
    assert_eq!(
        parse_str("2 ** 3 ** 2").unwrap(),
        bin(BinOp::Pow, num("2"), bin(BinOp::Pow, num("3"), num("2")))
    );
}

#[test]
fn unary_minus_binds_tighter_than_mul() {
    assert_eq!(
        parse_str("-a * b").unwrap(),
        bin(BinOp::Mul, Ast::Neg(Box::new(id("a"))), id("b"))
    );
}

#[test]
fn and_binds_tighter_than_or() {
    assert_eq!(
        parse_str("a || b && c").unwrap(),
        bin(BinOp::Or, id("a"), bin(BinOp::And, id("b"), id("c")))
    );
}

#[test]
fn not_applies_to_the_whole_relation() {
    assert_eq!(
        parse_str("!a < b").unwrap(),
        Ast::not(bin(BinOp::Lt, id("a"), id("b")))
    );
    assert_eq!(
        parse_str("!!paused").unwrap(),
        Ast::not(Ast::not(id("paused")))
    );
}

#[test]
fn bitwise_operators_sit_between_relations_and_arithmetic() {
    assert_eq!(
        parse_str("x & m == 0").unwrap(),
        bin(BinOp::Eq, bin(BinOp::BitAnd, id("x"), id("m")), num("0"))
    );
    assert_eq!(
        parse_str("a | b ^ c & d").unwrap(),
        bin(
            BinOp::BitOr,
            id("a"),
            bin(BinOp::BitXor, id("b"), bin(BinOp::BitAnd, id("c"), id("d")))
        )
    );
}

#[test]
fn boolean_literals() {
    assert_eq!(
        parse_str("a == true").unwrap(),
        bin(BinOp::Eq, id("a"), Ast::Bool(true))
    );
}

#[test]
fn calls_indexes_and_members() {
    assert_eq!(
        parse_str("f(x, y + 1)").unwrap(),
        Ast::call("f", vec![id("x"), bin(BinOp::Add, id("y"), num("1"))])
    );
    assert_eq!(
        parse_str("balances[msg.sender].amount").unwrap(),
        Ast::Member {
            base: Box::new(Ast::Index {
                base: Box::new(id("balances")),
                index: Box::new(id("msg.sender")),
            }),
            field: "amount".to_string(),
        }
    );
    assert_eq!(parse_str("owner()").unwrap(), Ast::call("owner", Vec::new()));
    assert_eq!(
        parse_str("token.balanceOf(a) > 0").unwrap(),
        bin(
            BinOp::Gt,
            Ast::call("token.balanceOf", vec![id("a")]),
            num("0")
        )
    );
}

#[test]
fn nested_index() {
    assert_eq!(
        parse_str("allowance[a][b]").unwrap(),
        Ast::Index {
            base: Box::new(Ast::Index {
                base: Box::new(id("allowance")),
                index: Box::new(id("a")),
            }),
            index: Box::new(id("b")),
        }
    );
}

#[test]
fn parse_over_token_slice_matches_parse_str() {
    let toks = tokenize("x + 1 > y").unwrap();
    let from_fn = parse(&toks).unwrap();
    let from_parser = Parser::new(&toks).parse().unwrap();
    assert_eq!(from_fn, from_parser);
    assert_eq!(from_fn, parse_str("x + 1 > y").unwrap());
}

#[test]
fn display_round_trips_minimal_parentheses() {
    for text in [
        "a + b * c",
        "(a + b) * c",
        "a - (b - c)",
        "a < b && c",
        "(a || b) && c",
        "2 ** 3 ** 2",
        "(2 ** 3) ** 2",
        "-a * b",
        "balances[msg.sender].amount >= 1e18",
        "f(x, y) != 0",
        "!paused",
    ] {
        let ast = parse_str(text).unwrap();
        assert_eq!(ast.to_string(), text);
        assert_eq!(parse_str(&ast.to_string()).unwrap(), ast);
    }
}

#[test]
fn redundant_parentheses_are_dropped() {
    assert_eq!(parse_str("((a)) + (b * c)").unwrap().to_string(), "a + b * c");
}
