use sindi::{parse_str, to_formula, to_symbolic, ConversionError, LexError, SindiError, Sort};

#[test]
fn chained_relations_are_a_syntax_error() {
    let err = parse_str("a < b < c").unwrap_err();
    match err {
        SindiError::Syntax(e) => {
            assert_eq!(e.pos, 6);
            assert_eq!(e.found, "'<'");
            assert!(e.expected.contains("relations do not chain"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn missing_operand_at_end_of_input() {
    match parse_str("a +").unwrap_err() {
        SindiError::Syntax(e) => {
            assert_eq!(e.found, "end of input");
            assert_eq!(e.expected, "operand");
            assert_eq!(e.pos, 3);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn unclosed_parenthesis() {
    match parse_str("(a + b").unwrap_err() {
        SindiError::Syntax(e) => {
            assert_eq!(e.expected, "')'");
            assert_eq!(e.found, "end of input");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn trailing_operand() {
    match parse_str("a b").unwrap_err() {
        SindiError::Syntax(e) => {
            assert_eq!(e.pos, 2);
            assert_eq!(e.expected, "end of input");
            assert_eq!(e.found, "'b'");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn empty_input() {
    assert!(matches!(
        parse_str("").unwrap_err(),
        SindiError::Syntax(_)
    ));
}

#[test]
fn lex_errors_surface_through_parse_str() {
    match parse_str("a @ b").unwrap_err() {
        SindiError::Lex(LexError::UnexpectedChar { ch, pos }) => {
            assert_eq!(ch, '@');
            assert_eq!(pos, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn syntax_error_message_names_position() {
    let msg = parse_str("a b").unwrap_err().to_string();
    assert_eq!(
        msg,
        "syntax error at position 2: expected end of input, found 'b'"
    );
}

#[test]
fn boolean_in_arithmetic_is_a_sort_mismatch() {
    let ast = parse_str("(a && b) + 1 > 0").unwrap();
    match to_formula(&ast).unwrap_err() {
        ConversionError::SortMismatch { node, expected } => {
            assert_eq!(node, "a && b");
            assert_eq!(expected, Sort::Int);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn number_as_predicate_is_a_sort_mismatch() {
    let ast = parse_str("5 && a").unwrap();
    match to_symbolic(&ast).unwrap_err() {
        ConversionError::SortMismatch { node, expected } => {
            assert_eq!(node, "5");
            assert_eq!(expected, Sort::Bool);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn sort_mismatch_message() {
    let ast = parse_str("(a && b) + 1 > 0").unwrap();
    let err: SindiError = to_formula(&ast).unwrap_err().into();
    assert_eq!(
        err.to_string(),
        "conversion error: 'a && b' cannot be used as an integer"
    );
}

#[test]
fn unsupported_constructs_are_recorded_not_fatal() {
    let ast = parse_str("(x & y) > 0").unwrap();
    let conv = to_formula(&ast).unwrap();
    assert_eq!(conv.issues.len(), 1);
    match &conv.issues[0] {
        ConversionError::Unsupported { node, .. } => assert_eq!(node, "x & y"),
        other => panic!("unexpected issue: {:?}", other),
    }
}

fn too_deep(err: SindiError) -> bool {
    matches!(err, SindiError::Syntax(e) if e.expected.contains("nesting too deep"))
}

#[test]
fn deep_nesting_is_a_syntax_error() {
    let parens = format!("{}x{} > 0", "(".repeat(20_000), ")".repeat(20_000));
    assert!(too_deep(parse_str(&parens).unwrap_err()));

    let nots = format!("{}paused", "!".repeat(20_000));
    assert!(too_deep(parse_str(&nots).unwrap_err()));

    let negs = format!("{}x > 0", "-".repeat(20_000));
    assert!(too_deep(parse_str(&negs).unwrap_err()));

    let calls = format!("{}x{} > 0", "f(".repeat(20_000), ")".repeat(20_000));
    assert!(too_deep(parse_str(&calls).unwrap_err()));
}

#[test]
fn moderate_nesting_still_parses() {
    let parens = format!("{}x{} > 0", "(".repeat(100), ")".repeat(100));
    assert_eq!(parse_str(&parens).unwrap().to_string(), "x > 0");
}

#[test]
fn deep_nesting_becomes_an_error_verdict() {
    let deep = format!("{}x{}", "(".repeat(20_000), ")".repeat(20_000));
    match sindi::compare(&deep, "x") {
        sindi::Verdict::Error(reason) => assert!(reason.contains("nesting too deep")),
        other => panic!("unexpected verdict: {:?}", other),
    }
}
