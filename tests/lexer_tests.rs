use num_bigint::BigInt;
use num_rational::BigRational;
use sindi::{literal_value, tokenize, LexError, TokenKind};

fn lexemes(text: &str) -> Vec<String> {
    tokenize(text)
        .unwrap()
        .into_iter()
        .map(|t| t.lexeme)
        .collect()
}

fn ratio(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

#[test]
fn splits_operators_and_operands() {
    let toks = tokenize("a>=1&&b").unwrap();
    let kinds: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Operator,
            TokenKind::Number,
            TokenKind::Operator,
            TokenKind::Identifier,
        ]
    );
    assert_eq!(lexemes("a>=1&&b"), vec!["a", ">=", "1", "&&", "b"]);
}

#[test]
fn longest_operator_wins() {
    assert_eq!(lexemes("a**2"), vec!["a", "**", "2"]);
    assert_eq!(lexemes("a<=b||c!=d"), vec!["a", "<=", "b", "||", "c", "!=", "d"]);
    assert_eq!(lexemes("!a"), vec!["!", "a"]);
}

#[test]
fn records_byte_positions() {
    let toks = tokenize("  x <= 10").unwrap();
    assert_eq!(toks[0].pos, 2);
    assert_eq!(toks[1].pos, 4);
    assert_eq!(toks[2].pos, 7);
}

#[test]
fn dotted_paths_are_one_identifier() {
    assert_eq!(lexemes("msg.sender == owner"), vec!["msg.sender", "==", "owner"]);
    assert_eq!(
        lexemes("MarketplaceLib.isFinalized(x)"),
        vec!["MarketplaceLib.isFinalized", "(", "x", ")"]
    );
}

#[test]
fn member_access_after_index_is_a_dot_token() {
    let toks = tokenize("balances[a].amount").unwrap();
    let kinds: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::LBracket,
            TokenKind::Identifier,
            TokenKind::RBracket,
            TokenKind::Dot,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn call_arguments_use_commas() {
    let toks = tokenize("f(a, b)").unwrap();
    assert_eq!(toks[3].kind, TokenKind::Comma);
}

#[test]
fn number_forms_are_single_tokens() {
    for text in ["1e18", "0.5", ".5", "1_000", "0xff", "2.5e-4", "3E+2"] {
        let toks = tokenize(text).unwrap();
        assert_eq!(toks.len(), 1, "{text}");
        assert_eq!(toks[0].kind, TokenKind::Number, "{text}");
        assert_eq!(toks[0].lexeme, text);
    }
}

#[test]
fn literal_values_are_exact() {
    assert_eq!(
        literal_value("1e18"),
        Some(BigRational::from_integer(BigInt::from(10u64).pow(18)))
    );
    assert_eq!(literal_value("0x10"), Some(ratio(16, 1)));
    assert_eq!(literal_value("1_000"), Some(ratio(1000, 1)));
    assert_eq!(literal_value("0.5"), Some(ratio(1, 2)));
    assert_eq!(literal_value(".5"), Some(ratio(1, 2)));
    assert_eq!(literal_value("2.5e-4"), Some(ratio(1, 4000)));
    assert_eq!(literal_value("1.5e3"), Some(ratio(1500, 1)));
}

#[test]
fn out_of_range_exponents_are_not_evaluated() {
    assert!(literal_value("1e4096").is_some());
    assert_eq!(literal_value("1e4097"), None);
    assert_eq!(literal_value("1e30000000"), None);
    assert_eq!(literal_value("1.5e-2147483648"), None);
    assert_eq!(literal_value("1e2147483647"), None);
    // Still a well-formed token.
    assert_eq!(tokenize("x > 1e30000000").unwrap().len(), 3);
}

#[test]
fn lone_equals_is_rejected() {
    match tokenize("a = b").unwrap_err() {
        LexError::UnexpectedChar { ch, pos } => {
            assert_eq!(ch, '=');
            assert_eq!(pos, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn unknown_character_reports_position() {
    match tokenize("a # b").unwrap_err() {
        LexError::UnexpectedChar { ch, pos } => {
            assert_eq!(ch, '#');
            assert_eq!(pos, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn number_glued_to_identifier_is_rejected() {
    match tokenize("x > 12abc").unwrap_err() {
        LexError::BadNumber { text, pos } => {
            assert_eq!(text, "12abc");
            assert_eq!(pos, 4);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn member_access_on_a_number_is_rejected() {
    match tokenize("1.foo").unwrap_err() {
        LexError::BadNumber { text, pos } => {
            assert_eq!(text, "1");
            assert_eq!(pos, 0);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn exponent_needs_digits() {
    assert!(matches!(
        tokenize("1e").unwrap_err(),
        LexError::BadNumber { .. }
    ));
    assert!(matches!(
        tokenize("0x").unwrap_err(),
        LexError::BadNumber { .. }
    ));
}

#[test]
fn whitespace_only_input_has_no_tokens() {
    assert!(tokenize(" \t\n ").unwrap().is_empty());
}
